use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use waypost_config::{CommandConfig, RoutesConfig};
use waypost_console::{ArgvInput, InputSource, InputValue, StringInput};
use waypost_routing::{Condition, RequestContext};

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "waypost", version)]
#[command(about = "Parse console input against command definitions and match URLs against routes")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bind input tokens against a command definition.
    Parse(ParseArgs),
    /// Print the usage line of a command definition.
    Synopsis(SynopsisArgs),
    /// List completion values for an argument or option.
    Suggest(SuggestArgs),
    /// Match a path against a route table.
    Match(MatchArgs),
    /// Print the compiled matcher tables of a route table.
    Dump(DumpArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Command definition file (.yaml, .yml or .json).
    #[arg(long)]
    definition: PathBuf,
    /// Join the tokens into one string and tokenize it shell-style.
    #[arg(long)]
    string: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Input tokens, after `--`.
    #[arg(last = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct SynopsisArgs {
    /// Command definition file (.yaml, .yml or .json).
    #[arg(long)]
    definition: PathBuf,
    /// Collapse all options into `[options]`.
    #[arg(long)]
    short: bool,
}

#[derive(Debug, Args)]
struct SuggestArgs {
    /// Command definition file (.yaml, .yml or .json).
    #[arg(long)]
    definition: PathBuf,
    /// Argument to complete.
    #[arg(long, conflicts_with = "option", required_unless_present = "option")]
    argument: Option<String>,
    /// Option to complete.
    #[arg(long)]
    option: Option<String>,
    /// Text typed so far.
    #[arg(default_value = "")]
    partial: String,
}

#[derive(Debug, Args)]
struct MatchArgs {
    /// Route table file (.yaml, .yml or .json).
    #[arg(long)]
    routes: PathBuf,
    /// Request method.
    #[arg(long, default_value = "GET")]
    method: String,
    /// Request host.
    #[arg(long, default_value = "localhost")]
    host: String,
    /// Request scheme.
    #[arg(long, default_value = "http")]
    scheme: String,
    /// Route condition expression to treat as satisfied (repeatable).
    #[arg(long = "allow-condition", value_name = "EXPR")]
    allow_conditions: Vec<String>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Path to match, e.g. `/blog/hello`.
    path: String,
}

#[derive(Debug, Args)]
struct DumpArgs {
    /// Route table file (.yaml, .yml or .json).
    #[arg(long)]
    routes: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Synopsis(args) => run_synopsis(args),
        Command::Suggest(args) => run_suggest(args),
        Command::Match(args) => run_match(args),
        Command::Dump(args) => run_dump(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn print_output<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<(), String> {
    let output = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("Failed to serialize output: {e}"))?,
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("Failed to serialize output: {e}"))?
        }
    };
    println!("{}", output.trim_end());
    Ok(())
}

fn load_command(path: &Path) -> Result<CommandConfig, String> {
    CommandConfig::load(path).map_err(|e| format!("Failed to load {}: {e}", path.display()))
}

fn load_routes(path: &Path) -> Result<RoutesConfig, String> {
    RoutesConfig::load(path).map_err(|e| format!("Failed to load {}: {e}", path.display()))
}

#[derive(Serialize)]
struct ParseOutput {
    command: String,
    arguments: IndexMap<String, InputValue>,
    options: IndexMap<String, InputValue>,
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let config = load_command(&args.definition)?;
    let definition = config.to_definition().map_err(|e| e.to_string())?;

    let source: Box<dyn InputSource> = if args.string {
        let line = args.tokens.join(" ");
        Box::new(StringInput::new(&line).map_err(|e| e.to_string())?)
    } else {
        Box::new(ArgvInput::new(args.tokens))
    };
    let input = source.parse(&definition).map_err(|e| e.to_string())?;
    info!(
        command = %config.name,
        arguments = input.given_arguments().len(),
        options = input.given_options().len(),
        "input bound"
    );

    let output = ParseOutput {
        command: config.name,
        arguments: input.arguments(),
        options: input.options(),
    };
    print_output(&output, args.format)
}

fn run_synopsis(args: SynopsisArgs) -> Result<(), String> {
    let config = load_command(&args.definition)?;
    let definition = config.to_definition().map_err(|e| e.to_string())?;
    let synopsis = definition.synopsis(args.short);
    println!("{}", format!("{} {synopsis}", config.name).trim_end());
    Ok(())
}

fn run_suggest(args: SuggestArgs) -> Result<(), String> {
    let config = load_command(&args.definition)?;
    let definition = config.to_definition().map_err(|e| e.to_string())?;

    let values = match (&args.argument, &args.option) {
        (Some(name), _) => definition
            .argument(name)
            .map_err(|e| e.to_string())?
            .complete(&args.partial),
        (None, Some(name)) => definition
            .option(name)
            .map_err(|e| e.to_string())?
            .complete(&args.partial),
        (None, None) => return Err("either --argument or --option is required".to_string()),
    };
    for value in values {
        println!("{value}");
    }
    Ok(())
}

fn run_match(args: MatchArgs) -> Result<(), String> {
    let config = load_routes(&args.routes)?;
    let compiled = config.compile().map_err(|e| e.to_string())?;
    let context = RequestContext::new(&args.method, &args.host, &args.scheme);
    debug!(
        method = context.method(),
        host = context.host(),
        scheme = context.scheme(),
        path = %args.path,
        "matching"
    );

    let allowed = &args.allow_conditions;
    let checker = |condition: &Condition, _: &RequestContext, _: &IndexMap<String, String>| {
        allowed.iter().any(|expr| *expr == condition.expression)
    };
    let found = compiled
        .matcher()
        .with_conditions(&checker)
        .match_path(&args.path, &context)
        .map_err(|e| e.to_string())?;
    print_output(&found, args.format)
}

fn run_dump(args: DumpArgs) -> Result<(), String> {
    let config = load_routes(&args.routes)?;
    let compiled = config.compile().map_err(|e| e.to_string())?;
    print_output(&compiled.describe(), args.format)
}
