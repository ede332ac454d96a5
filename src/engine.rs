//! Expression evaluation.
//!
//! All template expressions (names, contents, conditions, generator commands)
//! go through one MiniJinja environment configured with the helper library
//! from [`crate::functions`].

use crate::functions;
use crate::header::Delimiters;
use crate::naming::Naming;
use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};

/// Name embedded in the generated file headers.
pub const DEFAULT_GENERATOR_NAME: &str = "scaffold";

/// Configuration for the expression engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name used by the `*_file_header` helpers
    pub generator_name: String,
    /// Case conversion rules used by the naming helpers
    pub naming: Naming,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generator_name: DEFAULT_GENERATOR_NAME.to_string(),
            naming: Naming::default(),
        }
    }
}

/// Renders template sources against a context.
///
/// Undefined values are errors, trailing newlines are kept and nothing is
/// auto-escaped.
#[derive(Debug, Clone)]
pub struct Engine {
    env: Environment<'static>,
    /// Same environment, but an undefined value tested for truth is false
    conditions: Environment<'static>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        functions::register(&mut env, &config);

        let mut conditions = env.clone();
        conditions.set_undefined_behavior(UndefinedBehavior::SemiStrict);

        Self { env, conditions }
    }

    /// Renders a condition source. A missing value is falsy there, while
    /// attribute access on it or printing it is still an error.
    ///
    /// # Errors
    ///
    /// Returns the evaluator error for syntax errors or invalid lookups.
    pub fn render_condition(&self, source: &str, ctx: &Value) -> Result<String, minijinja::Error> {
        self.conditions.render_str(source, ctx)
    }

    /// Renders `source` with the default `{{ }}` variable delimiters or with
    /// `delimiters` in their place. Statement and comment delimiters stay
    /// `{% %}` and `{# #}`.
    ///
    /// # Errors
    ///
    /// Returns the evaluator error for syntax errors, undefined values or
    /// failing helpers.
    pub fn render_str(
        &self,
        source: &str,
        delimiters: Option<&Delimiters>,
        ctx: &Value,
    ) -> Result<String, minijinja::Error> {
        let Some(delimiters) = delimiters else {
            return self.env.render_str(source, ctx);
        };

        let syntax = SyntaxConfig::builder()
            .variable_delimiters(delimiters.left.clone(), delimiters.right.clone())
            .build()?;
        let mut env = self.env.clone();
        env.set_syntax(syntax);
        env.render_str(source, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_render_keeps_trailing_newline() {
        let engine = Engine::default();
        let ctx = context! { name => "world" };
        assert_eq!(
            engine.render_str("Hello {{ name }}!\n", None, &ctx).unwrap(),
            "Hello world!\n"
        );
    }

    #[test]
    fn test_render_does_not_escape() {
        let engine = Engine::default();
        let ctx = context! { html => "<b>&</b>" };
        assert_eq!(engine.render_str("{{ html }}", None, &ctx).unwrap(), "<b>&</b>");
    }

    #[test]
    fn test_render_undefined_is_error() {
        let engine = Engine::default();
        let ctx = context! {};
        assert!(engine.render_str("{{ missing }}", None, &ctx).is_err());
    }

    #[test]
    fn test_render_condition_missing_value_is_false() {
        let engine = Engine::default();
        let ctx = context! { enabled => true };
        let source = "{% if missing %}X{% endif %}";
        assert_eq!(engine.render_condition(source, &ctx).unwrap(), "");
        assert_eq!(
            engine
                .render_condition("{% if enabled %}X{% endif %}", &ctx)
                .unwrap(),
            "X"
        );
        assert!(
            engine
                .render_condition("{% if missing.field %}X{% endif %}", &ctx)
                .is_err()
        );
        // Content rendering stays strict
        assert!(engine.render_str(source, None, &ctx).is_err());
    }

    #[test]
    fn test_render_custom_delimiters() {
        let engine = Engine::default();
        let ctx = context! { name => "world" };
        let delimiters = Delimiters {
            left: "<<<".to_string(),
            right: ">>>".to_string(),
        };
        assert_eq!(
            engine
                .render_str("<<< name >>> {{ kept }}", Some(&delimiters), &ctx)
                .unwrap(),
            "world {{ kept }}"
        );
    }

    #[test]
    fn test_generator_name() {
        let engine = Engine::new(EngineConfig {
            generator_name: "acme".to_string(),
            ..EngineConfig::default()
        });
        let out = engine
            .render_str("{{ fully_editable_file_header() }}", None, &context! {})
            .unwrap();
        assert!(out.starts_with("Code generated by acme"));
    }
}
