use crate::engine::Engine;
use crate::error::{Result, ScaffoldError};
use crate::header::{Delimiters, Header, PathReplace, parse_headers};
use minijinja::Value;
use std::io::Read;

/// Suffix marking a source file as an evaluated template
pub const TEMPLATE_SUFFIX: &str = ".template";

/// How the relative output path of a template is produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateName {
    /// The relative path, used as is
    Raw { rel_path: String },
    /// A filename expression and/or directory rewrites
    Evaluated {
        rel_path: String,
        filename: Option<String>,
        path_replace: Vec<PathReplace>,
    },
}

impl TemplateName {
    /// Renders the relative output path.
    ///
    /// # Errors
    ///
    /// Returns the evaluator error if the filename or directory expression fails.
    pub fn render(&self, engine: &Engine, ctx: &Value) -> std::result::Result<String, minijinja::Error> {
        let (rel_path, filename, path_replace) = match self {
            TemplateName::Raw { rel_path } => return Ok(rel_path.clone()),
            TemplateName::Evaluated {
                rel_path,
                filename,
                path_replace,
            } => (rel_path, filename, path_replace),
        };

        let (dir, base) = split_path(rel_path);
        let filename = match filename {
            Some(source) => engine.render_str(source, None, ctx)?,
            None => base.to_string(),
        };

        let mut dir = dir.to_string();
        for r in path_replace {
            dir = dir.replace(&r.old, &r.new);
        }
        let dir = engine.render_str(&dir, None, ctx)?;

        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            Ok(filename)
        } else {
            Ok(format!("{dir}/{filename}"))
        }
    }
}

/// How the bytes of a template's output are produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateContent {
    /// Copied verbatim
    Raw(Vec<u8>),
    /// Rendered through the engine
    Evaluated {
        source: String,
        delimiters: Option<Delimiters>,
    },
}

impl TemplateContent {
    /// Renders the output bytes.
    ///
    /// # Errors
    ///
    /// Returns the evaluator error if the body fails to render.
    pub fn render(&self, engine: &Engine, ctx: &Value) -> std::result::Result<Vec<u8>, minijinja::Error> {
        match self {
            TemplateContent::Raw(data) => Ok(data.clone()),
            TemplateContent::Evaluated { source, delimiters } => Ok(engine
                .render_str(source, delimiters.as_ref(), ctx)?
                .into_bytes()),
        }
    }
}

/// A file to render, loaded from a pack
#[derive(Debug, Clone)]
pub struct Template {
    path: String,
    name: TemplateName,
    content: TemplateContent,
    header: Header,
}

impl Template {
    /// Loads a template from its pack-relative `path` and raw bytes.
    ///
    /// Paths ending in [`TEMPLATE_SUFFIX`] are parsed for headers and rendered;
    /// the suffix is removed from the output path. Anything else is copied
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ScaffoldError::Load` wrapping the read, header or UTF-8 error.
    pub fn load<R: Read>(path: &str, mut reader: R) -> Result<Template> {
        Self::load_inner(path, &mut reader).map_err(|e| ScaffoldError::loading(path, e))
    }

    fn load_inner<R: Read>(path: &str, reader: &mut R) -> Result<Template> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        let Some(rel_path) = path.strip_suffix(TEMPLATE_SUFFIX) else {
            return Ok(Template {
                path: path.to_string(),
                name: TemplateName::Raw {
                    rel_path: path.to_string(),
                },
                content: TemplateContent::Raw(data),
                header: Header::default(),
            });
        };

        let (mut body, header) = parse_headers(data.as_slice())?;
        let mut source = Vec::new();
        body.read_to_end(&mut source)?;
        let source = String::from_utf8(source)?;

        let name = if header.filename.is_some() || !header.path_replace.is_empty() {
            TemplateName::Evaluated {
                rel_path: rel_path.to_string(),
                filename: header.filename.clone(),
                path_replace: header.path_replace.clone(),
            }
        } else {
            TemplateName::Raw {
                rel_path: rel_path.to_string(),
            }
        };

        let content = TemplateContent::Evaluated {
            source,
            delimiters: header.delimiters.clone(),
        };

        Ok(Template {
            path: path.to_string(),
            name,
            content,
            header,
        })
    }

    /// The pack-relative source path, including any template suffix
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &TemplateName {
        &self.name
    }

    pub fn content(&self) -> &TemplateContent {
        &self.content
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Renders every `generator-command` directive into an argument vector.
    ///
    /// # Errors
    ///
    /// - `ScaffoldError::GeneratorCommand` if a command fails to render.
    /// - `ScaffoldError::GeneratorCommandSplit` if the rendered line has
    ///   unbalanced quotes.
    pub fn render_generator_commands(&self, engine: &Engine, ctx: &Value) -> Result<Vec<Vec<String>>> {
        let mut commands = Vec::new();

        for command in &self.header.generator_commands {
            let line = engine
                .render_str(command, None, ctx)
                .map_err(|source| ScaffoldError::GeneratorCommand {
                    path: self.path.clone(),
                    command: command.clone(),
                    source,
                })?;

            let argv = shell_words::split(&line).map_err(|source| {
                ScaffoldError::GeneratorCommandSplit {
                    path: self.path.clone(),
                    command: command.clone(),
                    source,
                }
            })?;

            if !argv.is_empty() {
                commands.push(argv);
            }
        }

        Ok(commands)
    }
}

/// Splits a `/`-separated path into its directory (with trailing slash) and
/// final component.
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => path.split_at(i + 1),
        None => ("", path),
    }
}
