//! The render pass.
//!
//! Templates are processed one at a time, in the order given: the output path
//! is rendered and filtered, conditions are evaluated, the content is rendered
//! and, when the output file already exists, its protected regions are carried
//! over into the fresh content before it is written.

use crate::engine::Engine;
use crate::error::{Result, ScaffoldError};
use crate::fs_utils::{ensure_parent_dir, read_existing, remove_if_exists, resolve_output_path};
use crate::placeholder;
use crate::template::Template;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use minijinja::Value;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output files with this suffix get `goimports` and `go generate` follow-ups.
pub const GO_SOURCE_SUFFIX: &str = ".go";

/// Result of a render pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    /// Absolute paths of every written or preserved file, sorted
    pub generated: Vec<PathBuf>,
    /// Follow-up commands in emission order; never executed here
    pub commands: Vec<Vec<String>>,
}

/// Renders `templates` under `root`.
///
/// When `patterns` is not empty, only templates whose rendered relative path
/// matches at least one glob are rendered. `*` does not match `/`.
///
/// Any error aborts the pass; files written before the failure stay on disk.
///
/// # Errors
///
/// - `ScaffoldError::Pattern` for an invalid glob.
/// - `ScaffoldError::RenderName` / `ScaffoldError::RenderContent` when a
///   template fails to render.
/// - `ScaffoldError::Condition` when an `if`/`ifor` gate fails to evaluate.
/// - `ScaffoldError::PathTraversal` when a rendered path leaves `root`.
/// - `ScaffoldError::GeneratorCommand` / `ScaffoldError::GeneratorCommandSplit`
///   for a broken follow-up command.
/// - `ScaffoldError::Io` for filesystem failures.
pub fn render(
    engine: &Engine,
    templates: &[Template],
    root: &Path,
    ctx: &Value,
    patterns: &[String],
) -> Result<RenderOutput> {
    let filter = build_filter(patterns)?;
    let mut output = RenderOutput::default();

    for template in templates {
        let header = template.header();

        let rel = template
            .name()
            .render(engine, ctx)
            .map_err(|source| ScaffoldError::RenderName {
                path: template.path().to_string(),
                source,
            })?;

        if filter.as_ref().is_some_and(|f| !f.is_match(&rel)) {
            debug!(template = template.path(), path = %rel, "skipped, no pattern matched");
            continue;
        }

        if !header.passes(engine, ctx, template.path())? {
            debug!(template = template.path(), "skipped, condition not met");
            continue;
        }

        let path = resolve_output_path(root, &rel)?;
        ensure_parent_dir(&path)?;

        let existing = read_existing(&path)?;
        if existing.is_some() && header.if_not_exists {
            debug!(path = %path.display(), "kept existing file");
            output.generated.push(path);
            continue;
        }

        let rendered = template
            .content()
            .render(engine, ctx)
            .map_err(|source| ScaffoldError::RenderContent {
                path: template.path().to_string(),
                source,
            })?;

        // Only output with regions is merged, and then always LF-normalized
        let data = if placeholder::find_all(&rendered).is_empty() {
            rendered
        } else {
            match existing {
                Some(existing) => {
                    debug!(path = %path.display(), "merging code regions");
                    placeholder::find_and_replace_all(&existing, &rendered)
                }
                None => placeholder::normalize_line_endings(&rendered),
            }
        };

        if data.is_empty() && header.remove_if_empty {
            if remove_if_exists(&path)? {
                info!(path = %path.display(), "removed empty file");
            }
            continue;
        }

        fs::write(&path, &data)?;
        info!(path = %path.display(), bytes = data.len(), "wrote file");
        output.generated.push(path);

        output
            .commands
            .extend(template.render_generator_commands(engine, ctx)?);

        if rel.ends_with(GO_SOURCE_SUFFIX) {
            let target = format!("./{rel}");
            output.commands.push(vec![
                "goimports".to_string(),
                "-l".to_string(),
                "-w".to_string(),
                target.clone(),
            ]);
            if !header.no_go_generate {
                output
                    .commands
                    .push(vec!["go".to_string(), "generate".to_string(), target]);
            }
        }
    }

    output
        .generated
        .sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

    Ok(output)
}

fn build_filter(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| ScaffoldError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|source| ScaffoldError::Pattern {
            pattern: patterns.join(", "),
            source,
        })
}
