//! Helpers exposed to templates.
//!
//! Every helper is a plain Rust function; [`register`] wires them into a
//! MiniJinja environment as global functions and, for the single-string
//! helpers, as filters too (`{{ name | to_go_name }}`).

use crate::engine::EngineConfig;
use crate::error::Result;
use minijinja::value::Rest;
use minijinja::{Environment, Error, ErrorKind, Value};
use regex::{NoExpand, Regex};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

static PATH_VARS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[ ]*[\w\-]+[ ]*\}").expect("path variable pattern is valid"));

fn header_message(generator_name: &str, message: &str) -> String {
    format!("Code generated by {generator_name}\n\n{message}")
}

/// Header for files whose code regions survive regeneration.
pub fn code_section_file_header(generator_name: &str) -> String {
    header_message(
        generator_name,
        "Modifications in code regions will be lost during regeneration!",
    )
}

/// Header for files generated once and then owned by the developer.
pub fn fully_editable_file_header(generator_name: &str) -> String {
    header_message(generator_name, "You CAN edit this file !")
}

/// Header for files that are entirely regenerated.
pub fn non_editable_file_header(generator_name: &str) -> String {
    header_message(generator_name, "DO NOT EDIT.")
}

/// Prefixes every line of `input` with `comment_chars` and a space, without
/// leaving trailing spaces on empty lines.
pub fn comment_lines(input: &str, comment_chars: &str) -> String {
    format!("{comment_chars} {input}")
        .replace('\n', &format!("\n{comment_chars} "))
        .replace(" \n", "\n")
}

pub fn to_go_comment(input: &str) -> String {
    comment_lines(input, "//")
}

pub fn to_yaml_comment(input: &str) -> String {
    comment_lines(input, "#")
}

pub fn to_markdown_quote(input: &str) -> String {
    comment_lines(input, ">")
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(s: &str) -> String {
    crate::naming::camelize(s)
}

pub fn to_slash(path: &str) -> String {
    path.replace('\\', "/")
}

/// Builds a map from a flat `key, value, key, value` list.
///
/// Returns `None` for an odd number of items.
pub fn to_map(items: &[String]) -> Option<BTreeMap<String, String>> {
    if items.len() % 2 != 0 {
        return None;
    }
    Some(
        items
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect(),
    )
}

/// Replaces `{var_name}` in `path` with `value`, if present.
///
/// # Errors
///
/// Returns `ScaffoldError::Regex` if the variable name yields an invalid pattern.
pub fn replace_path_var(var_name: &str, value: &str, path: &str) -> Result<String> {
    let pattern = format!(r"^(.*)\{{[ ]*{}[ ]*\}}(.*)$", regex::escape(var_name));
    let regex = Regex::new(&pattern)?;

    Ok(match regex.captures(path) {
        Some(captures) => format!("{}{value}{}", &captures[1], &captures[2]),
        None => path.to_string(),
    })
}

/// Replaces every `{var}` in `path` with `value`.
pub fn replace_path_vars(value: &str, path: &str) -> String {
    PATH_VARS_REGEX.replace_all(path, NoExpand(value)).into_owned()
}

/// Lexically computes `target` relative to `base`.
///
/// Returns `None` when one path is absolute and the other is not, or when
/// `base` climbs above the common prefix with `..`.
pub fn rel(base: &str, target: &str) -> Option<String> {
    let base_abs = base.starts_with('/');
    if base_abs != target.starts_with('/') {
        return None;
    }

    let base = clean_components(base);
    let target = clean_components(target);
    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    if base[common..].contains(&"..") {
        return None;
    }

    let parts: Vec<&str> = std::iter::repeat_n("..", base.len() - common)
        .chain(target[common..].iter().copied())
        .collect();

    if parts.is_empty() {
        Some(".".to_string())
    } else {
        Some(parts.join("/"))
    }
}

fn clean_components(path: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." if out.last().is_some_and(|last| *last != "..") => {
                out.pop();
            }
            _ => out.push(part),
        }
    }
    out
}

/// Whether `index` designates the last item of `seq`.
pub fn is_last(index: usize, seq: &Value) -> Option<bool> {
    seq.len().map(|len| index + 1 == len)
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

fn add_string_helper<F>(env: &mut Environment<'static>, name: &'static str, f: F)
where
    F: Fn(&str) -> String + Clone + Send + Sync + 'static,
{
    let filter = f.clone();
    env.add_filter(name, move |s: String| filter(&s));
    env.add_function(name, move |s: String| f(&s));
}

/// Registers the helper library on `env`.
pub fn register(env: &mut Environment<'static>, config: &EngineConfig) {
    let naming = Arc::new(config.naming.clone());

    let n = Arc::clone(&naming);
    add_string_helper(env, "to_go_name", move |s| n.to_go_name(s));
    let n = Arc::clone(&naming);
    add_string_helper(env, "to_var_name", move |s| n.to_var_name(s));
    let n = Arc::clone(&naming);
    add_string_helper(env, "to_file_name", move |s| n.to_file_name(s));
    let n = Arc::clone(&naming);
    add_string_helper(env, "to_command_name", move |s| n.to_command_name(s));
    let n = Arc::clone(&naming);
    add_string_helper(env, "to_go_package_name", move |s| n.to_go_package_name(s));
    let n = Arc::clone(&naming);
    add_string_helper(env, "to_human_name_title", move |s| n.to_human_name_title(s));

    add_string_helper(env, "capitalize", capitalize);
    add_string_helper(env, "to_go_comment", to_go_comment);
    add_string_helper(env, "to_yaml_comment", to_yaml_comment);
    add_string_helper(env, "to_markdown_quote", to_markdown_quote);
    add_string_helper(env, "to_slash", to_slash);

    let yaml = |value: Value| -> std::result::Result<String, Error> {
        serde_yaml::to_string(&value)
            .map_err(|e| invalid("failed to serialize value to YAML").with_source(e))
    };
    env.add_filter("to_yaml", yaml);
    env.add_function("to_yaml", yaml);

    let name = config.generator_name.clone();
    env.add_function("code_section_file_header", move || {
        code_section_file_header(&name)
    });
    let name = config.generator_name.clone();
    env.add_function("fully_editable_file_header", move || {
        fully_editable_file_header(&name)
    });
    let name = config.generator_name.clone();
    env.add_function("non_editable_file_header", move || {
        non_editable_file_header(&name)
    });

    env.add_function("to_map", |items: Rest<String>| {
        to_map(&items)
            .map(|map| Value::from_serialize(&map))
            .ok_or_else(|| {
                invalid("odd number of values in to_map call, expected a list of key-value pairs")
            })
    });

    env.add_function(
        "replace_path_var",
        |var_name: String, value: Value, path: String| {
            replace_path_var(&var_name, &value.to_string(), &path)
                .map_err(|e| invalid(e.to_string()))
        },
    );
    env.add_function("replace_path_vars", |value: Value, path: String| {
        replace_path_vars(&value.to_string(), &path)
    });

    env.add_function("rel", |base: String, target: String| {
        rel(&base, &target)
            .ok_or_else(|| invalid(format!("can't make {target} relative to {base}")))
    });

    env.add_function("is_last", |index: usize, seq: Value| {
        is_last(index, &seq).ok_or_else(|| invalid("is_last expects a sequence"))
    });
}
