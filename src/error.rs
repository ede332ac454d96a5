use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scaffold operations
#[derive(Error, Debug)]
pub enum ScaffoldError {
    /// IO error when reading templates or writing output files
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A `!!keyword` line whose keyword is not a known directive
    #[error("unknown template meta-header `{keyword}` on line {line}")]
    UnknownDirective { keyword: String, line: usize },

    /// A known directive with an unusable argument
    #[error("failed to parse `{directive}` header on line {line}: {message}")]
    MalformedDirective {
        directive: String,
        line: usize,
        message: String,
    },

    /// An `if`/`ifor` expression that does not compile
    #[error("failed to parse conditional `{directive}` header on line {line}: {source}")]
    InvalidCondition {
        directive: String,
        line: usize,
        source: minijinja::Error,
    },

    /// Any failure while loading a single template source
    #[error("loading template from {path}: {source}")]
    Load {
        path: String,
        source: Box<ScaffoldError>,
    },

    /// Template body is not valid UTF-8
    #[error("template body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Name stage evaluation failure
    #[error("rendering name for template `{path}`: {source}")]
    RenderName {
        path: String,
        source: minijinja::Error,
    },

    /// Content stage evaluation failure
    #[error("rendering content for template `{path}`: {source}")]
    RenderContent {
        path: String,
        source: minijinja::Error,
    },

    /// `if`/`ifor` evaluation failure
    #[error("failed to evaluate header `{directive}` condition in `{path}`: {source}")]
    Condition {
        directive: &'static str,
        path: String,
        source: minijinja::Error,
    },

    /// Generator command evaluation failure
    #[error("in template {path}: failed to render generator command ({command}): {source}")]
    GeneratorCommand {
        path: String,
        command: String,
        source: minijinja::Error,
    },

    /// Rendered generator command with broken shell quoting
    #[error("in template {path}: failed to split generator command ({command}): {source}")]
    GeneratorCommandSplit {
        path: String,
        command: String,
        source: shell_words::ParseError,
    },

    /// Invalid glob pattern supplied by the caller
    #[error("matching pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },

    /// Rendered output path escapes the output root
    #[error("Path traversal detected (rendered path escapes the output directory): {path}")]
    PathTraversal { path: PathBuf },

    /// No provider could resolve the requested pack
    #[error("no such pack \"{name}\" found in: {searched}")]
    PackNotFound { name: String, searched: String },

    /// Regex compilation error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// `WalkDir` error when traversing a pack directory
    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ScaffoldError {
    /// Attaches the template source path to an error raised while loading it.
    pub fn loading(path: impl Into<String>, source: ScaffoldError) -> Self {
        ScaffoldError::Load {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScaffoldError::UnknownDirective {
            keyword: "foo".to_string(),
            line: 2,
        };
        assert_eq!(format!("{err}"), "unknown template meta-header `foo` on line 2");

        let err = ScaffoldError::MalformedDirective {
            directive: "pathreplace".to_string(),
            line: 1,
            message: "it requires 2 values".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "failed to parse `pathreplace` header on line 1: it requires 2 values"
        );

        let err = ScaffoldError::PathTraversal {
            path: PathBuf::from("../etc/passwd"),
        };
        assert!(format!("{err}").contains("Path traversal detected"));

        let err = ScaffoldError::PackNotFound {
            name: "go/service".to_string(),
            searched: "/a, /b".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "no such pack \"go/service\" found in: /a, /b"
        );
    }

    #[test]
    fn test_loading_wraps_source() {
        let inner = ScaffoldError::UnknownDirective {
            keyword: "bar".to_string(),
            line: 3,
        };
        let err = ScaffoldError::loading("x.txt.template", inner);
        assert_eq!(
            format!("{err}"),
            "loading template from x.txt.template: unknown template meta-header `bar` on line 3"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err: ScaffoldError = io_err.into();
        assert!(matches!(err, ScaffoldError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: ScaffoldError = json_err.into();
        assert!(matches!(err, ScaffoldError::Json(_)));
    }
}
