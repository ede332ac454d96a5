//! # scaffold
//!
//! A code-scaffolding library and CLI tool that renders template packs into a
//! source tree. Files can be regenerated at any time: hand-written code placed
//! inside protected regions of a previously generated file is carried over
//! into the new version.
//!
//! ## Features
//!
//! - Template packs loaded from filesystem roots or bundled in the binary
//! - Per-template `!!` meta-headers: output filename, path rewrites, custom
//!   delimiters, conditions, follow-up commands
//! - Protected regions delimited by `// region CODE_REGION(id)` and
//!   `// endregion` (also `#` and `#pragma ` comment styles)
//! - Follow-up commands (`goimports`, `go generate`, custom) returned to the
//!   caller, never executed
//! - Security: rendered paths cannot escape the output directory
//!
//! ## Usage
//!
//! ### As a Library
//!
//! ```no_run
//! use scaffold::{Engine, load_pack, render, template_roots};
//! use minijinja::context;
//! use std::path::Path;
//!
//! let pack = load_pack(&template_roots(), "go", "service")?;
//! let templates = pack.load_templates()?;
//! let ctx = context! { name => "billing" };
//!
//! let output = render(&Engine::default(), &templates, Path::new("out"), &ctx, &[])?;
//! for path in &output.generated {
//!     println!("{}", path.display());
//! }
//! # Ok::<(), scaffold::ScaffoldError>(())
//! ```
//!
//! ### As a CLI Tool
//!
//! ```bash
//! # Render the go/service pack into ./billing
//! scaffold --kind go --pack service --context billing.yaml --output billing
//!
//! # Only regenerate the handlers
//! scaffold --kind go --pack service --context billing.yaml --output billing \
//!     --pattern 'internal/**/*.go'
//! ```

pub mod engine;
pub mod error;
pub mod fs_utils;
pub mod functions;
pub mod header;
pub mod locations;
pub mod naming;
pub mod pack;
pub mod placeholder;
pub mod render;
pub mod template;

// Re-export main types and functions for convenience
pub use engine::{Engine, EngineConfig};
pub use error::{Result, ScaffoldError};
pub use header::{Header, parse_headers};
pub use locations::template_roots;
pub use naming::Naming;
pub use pack::{BundledFile, Pack, PackLoader, PackProvider, load_pack};
pub use placeholder::{CodeSectionMark, Placeholder, RegionMatcher};
pub use render::{RenderOutput, render};
pub use template::{Template, TemplateContent, TemplateName};
