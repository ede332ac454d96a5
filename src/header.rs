//! Template meta-headers.
//!
//! An evaluated template may start with a block of `!!keyword value` lines.
//! The block ends at the first line that is not a directive; that line and
//! everything after it is the template body.

use crate::engine::Engine;
use crate::error::{Result, ScaffoldError};
use minijinja::Value;
use regex::Regex;
use std::io::{BufRead, Cursor, Read};
use std::sync::LazyLock;

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^!!([a-z_-]+)(?:[ \t]+(.*))?$").expect("header directive pattern is valid")
});

/// A literal substring rewrite applied to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReplace {
    pub old: String,
    pub new: String,
}

/// Custom expression delimiters for the content stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub left: String,
    pub right: String,
}

/// A compiled `if`/`ifor` gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    expression: String,
    source: String,
}

impl Condition {
    /// Wraps `expression` in an `if` block and checks that it compiles.
    pub fn parse(expression: &str) -> std::result::Result<Self, minijinja::Error> {
        let source = format!("{{% if {expression} %}}X{{% endif %}}");
        minijinja::Environment::new().template_from_str(&source)?;
        Ok(Self {
            expression: expression.to_string(),
            source,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluates the condition against `ctx`.
    pub fn evaluate(&self, engine: &Engine, ctx: &Value) -> std::result::Result<bool, minijinja::Error> {
        Ok(!engine.render_condition(&self.source, ctx)?.is_empty())
    }
}

/// Meta-information about a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub filename: Option<String>,
    pub path_replace: Vec<PathReplace>,
    pub delimiters: Option<Delimiters>,
    pub if_not_exists: bool,
    /// `!!if` gates, all of which must pass
    pub conditions: Vec<Condition>,
    /// `!!ifor` gates, at least one of which must pass
    pub any_conditions: Vec<Condition>,
    pub generator_commands: Vec<String>,
    pub remove_if_empty: bool,
    pub no_go_generate: bool,
}

impl Header {
    /// Returns whether the template should be rendered for `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `ScaffoldError::Condition` if a gate fails to evaluate, for
    /// instance when it references a value missing from the context.
    pub fn passes(&self, engine: &Engine, ctx: &Value, path: &str) -> Result<bool> {
        for condition in &self.conditions {
            let ok = condition
                .evaluate(engine, ctx)
                .map_err(|source| ScaffoldError::Condition {
                    directive: "if",
                    path: path.to_string(),
                    source,
                })?;
            if !ok {
                return Ok(false);
            }
        }

        if self.any_conditions.is_empty() {
            return Ok(true);
        }

        for condition in &self.any_conditions {
            let ok = condition
                .evaluate(engine, ctx)
                .map_err(|source| ScaffoldError::Condition {
                    directive: "ifor",
                    path: path.to_string(),
                    source,
                })?;
            if ok {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Parses the directive block at the start of `reader`.
///
/// Returns the body (the first non-directive line followed by the unread rest
/// of `reader`) and the decoded header. A last line without a trailing newline
/// is never treated as a directive.
///
/// # Errors
///
/// - `ScaffoldError::UnknownDirective` for an unrecognized keyword.
/// - `ScaffoldError::MalformedDirective` for a directive with a bad argument.
/// - `ScaffoldError::InvalidCondition` for an `if`/`ifor` that does not compile.
/// - `ScaffoldError::Io` if reading fails.
pub fn parse_headers<R: BufRead>(mut reader: R) -> Result<(impl Read, Header)> {
    let mut header = Header::default();
    let mut line = Vec::new();
    let mut line_number = 0;

    loop {
        line.clear();
        reader.read_until(b'\n', &mut line)?;
        if line.last() != Some(&b'\n') {
            break;
        }

        line_number += 1;

        let Some((keyword, value)) = parse_directive(&line) else {
            break;
        };
        apply_directive(&mut header, &keyword, value, line_number)?;
    }

    Ok((Cursor::new(line).chain(reader), header))
}

fn parse_directive(line: &[u8]) -> Option<(String, Option<String>)> {
    let line = std::str::from_utf8(line).ok()?.trim();
    let captures = HEADER_REGEX.captures(line)?;
    let keyword = captures.get(1)?.as_str().to_string();
    let value = captures
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty());
    Some((keyword, value))
}

fn apply_directive(
    header: &mut Header,
    keyword: &str,
    value: Option<String>,
    line: usize,
) -> Result<()> {
    let malformed = |message: &str| ScaffoldError::MalformedDirective {
        directive: keyword.to_string(),
        line,
        message: message.to_string(),
    };

    match keyword {
        "filename" => header.filename = value,
        "pathreplace" => {
            let [old, new] = two_tokens(value.as_deref())
                .ok_or_else(|| malformed("it requires 2 values"))?;
            header.path_replace.push(PathReplace { old, new });
        }
        "delimiters" => {
            let [left, right] = two_tokens(value.as_deref())
                .ok_or_else(|| malformed("it requires a left and a right delimiter"))?;
            header.delimiters = Some(Delimiters { left, right });
        }
        "if" | "ifor" => {
            let expression = value.ok_or_else(|| malformed("it requires an expression"))?;
            let condition =
                Condition::parse(&expression).map_err(|source| ScaffoldError::InvalidCondition {
                    directive: keyword.to_string(),
                    line,
                    source,
                })?;
            if keyword == "if" {
                header.conditions.push(condition);
            } else {
                header.any_conditions.push(condition);
            }
        }
        "if-not-exists" => header.if_not_exists = true,
        "generator-command" => {
            let command = value.ok_or_else(|| malformed("it requires a command line"))?;
            header.generator_commands.push(command);
        }
        "remove-if-empty" => header.remove_if_empty = true,
        "no-go-generate" => header.no_go_generate = true,
        _ => {
            return Err(ScaffoldError::UnknownDirective {
                keyword: keyword.to_string(),
                line,
            });
        }
    }

    Ok(())
}

fn two_tokens(value: Option<&str>) -> Option<[String; 2]> {
    let mut tokens = value?.split_whitespace();
    let first = tokens.next()?;
    let second = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    Some([first.to_string(), second.to_string()])
}
