use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use schema_compose_core::{OrderedMap, SchemaValue};
use schema_compose_store::{ComposeConfig, DocumentStore, emit_component};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Output serialization for flattened schemas.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "schema-compose")]
#[command(about = "Flatten OpenAPI allOf compositions into single schemas")]
struct Cli {
    /// Path to a compose configuration YAML file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Use the legacy allOf merge algorithm (overrides the config file).
    #[arg(long, global = true)]
    old_merge_schemas: bool,
    /// Log merge steps to stderr (RUST_LOG takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Flatten the allOf of one component schema.
    Merge(MergeArgs),
    /// Flatten every component schema that uses allOf.
    MergeAll(MergeAllArgs),
    /// List the component schemas of a document.
    List(ListArgs),
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// Root OpenAPI document (JSON or YAML).
    #[arg(long)]
    document: PathBuf,
    /// Component schema name under components/schemas.
    #[arg(long)]
    schema: String,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct MergeAllArgs {
    /// Root OpenAPI document (JSON or YAML).
    #[arg(long)]
    document: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Root OpenAPI document (JSON or YAML).
    #[arg(long)]
    document: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(cli.config.as_deref(), cli.old_merge_schemas)?;
    match cli.command {
        Command::Merge(args) => run_merge(args, &config),
        Command::MergeAll(args) => run_merge_all(args, &config),
        Command::List(args) => run_list(args, &config),
    }
}

fn load_config(path: Option<&Path>, old_merge_schemas: bool) -> Result<ComposeConfig, String> {
    let mut config = match path {
        Some(path) => ComposeConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => ComposeConfig::default(),
    };
    if old_merge_schemas {
        config.compatibility.old_merge_schemas = true;
    }
    Ok(config)
}

fn open_store(document: &Path, config: &ComposeConfig) -> Result<DocumentStore, String> {
    DocumentStore::open_with(document, &config.documents)
        .map_err(|err| format!("Failed to load '{}': {err}", document.display()))
}

fn run_merge(args: MergeArgs, config: &ComposeConfig) -> Result<(), String> {
    let store = open_store(&args.document, config)?;
    let generated = emit_component(&store, &args.schema, &config.merge_options())
        .map_err(|err| format!("{}: {err}", args.schema))?;

    println!("{}", render(&generated.schema, args.format)?);
    Ok(())
}

fn run_merge_all(args: MergeAllArgs, config: &ComposeConfig) -> Result<(), String> {
    let store = open_store(&args.document, config)?;
    let options = config.merge_options();
    let names = store.composed_components();
    debug!(count = names.len(), "Merging composed components");

    let results: Vec<_> = names
        .par_iter()
        .map(|name| (*name, emit_component(&store, name, &options)))
        .collect();

    let mut merged: OrderedMap<String, SchemaValue> = OrderedMap::new();
    let mut failed = 0usize;
    for (name, result) in results {
        match result {
            Ok(generated) => {
                merged.insert(name.to_string(), generated.schema);
            }
            Err(err) => {
                warn!(schema = name, error = %err, "Merge failed");
                eprintln!("{name}: {err}");
                failed += 1;
            }
        }
    }

    println!("{}", render(&merged, args.format)?);

    if failed > 0 {
        return Err(format!("{failed} schema(s) failed to merge"));
    }
    Ok(())
}

fn run_list(args: ListArgs, config: &ComposeConfig) -> Result<(), String> {
    let store = open_store(&args.document, config)?;
    for name in store.component_names() {
        let composed = store
            .component(name)
            .is_some_and(|schema| !schema.all_of.is_empty());
        if composed {
            println!("{name}\tallOf");
        } else {
            println!("{name}");
        }
    }
    Ok(())
}

fn render<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| format!("Failed to serialize output: {err}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|err| format!("Failed to serialize output: {err}"))
        }
    }
}
