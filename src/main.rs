use clap::{Parser, ValueEnum};
use minijinja::Value;
use scaffold::locations::ENV_TEMPLATE_ROOT;
use scaffold::naming::Naming;
use scaffold::{Engine, EngineConfig, RenderOutput, Result, load_pack, render, template_roots};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

const LONG_HELP: &str = r#"
Packs:
  A pack is a directory <root>/<kind>/<name>. Roots are searched in order:
  every --template-root, every entry of SCAFFOLD_TEMPLATE_ROOT, then
  <install prefix>/templates.

Template headers (first lines of a *.template file):
  !!filename <expr>           - Output file name
  !!pathreplace <old> <new>   - Rewrite the output directory
  !!delimiters <left> <right> - Custom variable delimiters
  !!if <expr>                 - Render only if every `if` holds
  !!ifor <expr>               - Render only if one `ifor` holds
  !!if-not-exists             - Never overwrite an existing file
  !!remove-if-empty           - Delete the output when it renders empty
  !!generator-command <cmd>   - Queue a follow-up command
  !!no-go-generate            - Do not queue `go generate`

Protected regions:
  // region CODE_REGION(name)
  ...kept across regenerations...
  // endregion

Examples:
  # Render a pack with a YAML context
  scaffold --kind go --pack service --context service.yaml --output ./billing
  # Only regenerate matching files
  scaffold --kind go --pack service --context service.yaml -p 'cmd/*.go'
  # Read the context from stdin and report as JSON
  cat ctx.json | scaffold --pack docs --context - --format json
"#;

/// Render template packs into source trees.
#[derive(Parser, Debug)]
#[command(
    name = "scaffold",
    version,
    about = "Render template packs into source trees, preserving hand-edited code regions.",
    after_long_help = LONG_HELP
)]
struct Cli {
    /// Name of the pack to render
    #[arg(long, value_name = "NAME")]
    pack: String,

    /// Kind of the pack (first path component under a template root)
    #[arg(short, long, value_name = "KIND", default_value = "")]
    kind: String,

    /// Extra template root, searched before the default ones (repeatable)
    #[arg(short = 'r', long = "template-root", value_name = "DIR", action = clap::ArgAction::Append)]
    template_roots: Vec<PathBuf>,

    /// YAML or JSON file with the template context. Use '-' for stdin.
    #[arg(short, long, value_name = "FILE")]
    context: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Only render files whose output path matches a glob (repeatable)
    #[arg(short, long = "pattern", value_name = "GLOB", action = clap::ArgAction::Append)]
    patterns: Vec<String>,

    /// Name written in generated file headers
    #[arg(long, value_name = "NAME", env = "SCAFFOLD_GENERATOR_NAME", default_value = scaffold::engine::DEFAULT_GENERATOR_NAME)]
    generator_name: String,

    /// Report format
    #[arg(short = 'f', long, value_enum, default_value = "plain")]
    format: OutputFormat,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    /// Generated paths, then follow-up commands
    Plain,
    /// JSON object for scripting
    Json,
}

fn main() {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        if matches!(e, scaffold::ScaffoldError::PackNotFound { .. }) {
            eprintln!("Use --template-root or the `{ENV_TEMPLATE_ROOT}` environment variable to add a root.");
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut roots = cli.template_roots.clone();
    roots.extend(template_roots());
    debug!(?roots, "template roots");

    let pack = load_pack(&roots, &cli.kind, &cli.pack)?;
    info!(pack = pack.name(), "loading pack");
    let templates = pack.load_templates()?;

    let ctx = match &cli.context {
        Some(path) => read_context(path)?,
        None => minijinja::context! {},
    };

    let engine = Engine::new(EngineConfig {
        generator_name: cli.generator_name.clone(),
        naming: Naming::default(),
    });

    let output = render(&engine, &templates, &cli.output, &ctx, &cli.patterns)?;
    info!(
        generated = output.generated.len(),
        commands = output.commands.len(),
        "render complete"
    );

    if !cli.quiet {
        report(&output, cli.format)?;
    }
    Ok(())
}

/// Reads the template context. `.json` files are parsed as JSON, anything
/// else (including stdin) as YAML, which also accepts JSON.
fn read_context(path: &Path) -> Result<Value> {
    let content = if path == Path::new("-") {
        info!("Reading context from stdin...");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        info!(path = %path.display(), "reading context");
        std::fs::read_to_string(path)?
    };

    if path.extension().is_some_and(|ext| ext == "json") {
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Ok(Value::from_serialize(&value))
    } else {
        let value: serde_yaml::Value = serde_yaml::from_str(&content)?;
        Ok(Value::from_serialize(&value))
    }
}

fn report(output: &RenderOutput, format: OutputFormat) -> Result<()> {
    let mut stdout = io::stdout().lock();

    match format {
        OutputFormat::Plain => {
            for path in &output.generated {
                writeln!(stdout, "{}", path.display())?;
            }
            if !output.commands.is_empty() {
                writeln!(stdout, "\nFollow-up commands:")?;
                for command in &output.commands {
                    writeln!(stdout, "  {}", shell_words::join(command))?;
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(output)?;
            writeln!(stdout, "{json}")?;
        }
    }

    stdout.flush()?;
    Ok(())
}
