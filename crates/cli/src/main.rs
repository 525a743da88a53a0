use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use voicetree_graph::{
    add_or_update_node, render_ascii_tree, reverse_graph, traversal_entries, ContextAssembler,
    Graph, GraphError, LinkIndex, NodeId,
};
use voicetree_indexer::{
    load_vault, GraphStore, IndexerError, MarkdownDiskWriter, VaultConfig, VaultScanner,
    VaultSnapshot, VaultWatcher, VaultWatcherConfig,
};
use voicetree_protocol::{serialize_json, serialize_json_pretty, ErrorEnvelope};

mod report;

use report::{LoadReport, ResolveReport};

#[derive(Parser)]
#[command(name = "voicetree")]
#[command(about = "Markdown vault as a self-healing note graph", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the vault and print graph statistics
    Load(LoadArgs),

    /// Print the graph as an ASCII tree
    Tree(TreeArgs),

    /// Print nodes in traversal order
    Order(OrderArgs),

    /// Assemble the context window around a note
    Context(ContextArgs),

    /// Show which note a link token resolves to
    Resolve(ResolveArgs),

    /// Keep the graph in sync with the vault and print every applied update
    Watch(WatchArgs),
}

impl Commands {
    fn json_output(&self) -> bool {
        match self {
            Self::Load(args) => args.json,
            Self::Tree(_) => false,
            Self::Order(args) => args.json,
            Self::Context(args) => args.json,
            Self::Resolve(args) => args.json,
            Self::Watch(args) => args.json,
        }
    }
}

#[derive(Args)]
struct VaultArgs {
    /// Vault directory (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,
}

#[derive(Args)]
struct LoadArgs {
    #[command(flatten)]
    vault: VaultArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TreeArgs {
    #[command(flatten)]
    vault: VaultArgs,

    /// Walk incoming edges instead of outgoing ones
    #[arg(long)]
    reverse: bool,
}

#[derive(Args)]
struct OrderArgs {
    #[command(flatten)]
    vault: VaultArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ContextArgs {
    /// Start note: a node id or any link token that resolves to one
    node: String,

    #[command(flatten)]
    vault: VaultArgs,

    /// Distance budget (overrides config and environment)
    #[arg(long)]
    max_distance: Option<f64>,

    /// Save the context as a note next to the start note (other notes are
    /// never rewritten)
    #[arg(long)]
    write: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ResolveArgs {
    /// Link tokens as written inside `[[...]]`
    #[arg(required = true)]
    tokens: Vec<String>,

    /// Vault directory
    #[arg(long, default_value = ".")]
    vault: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    vault: VaultArgs,

    /// Output one JSON object per update
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON parsing
    let json_output = cli.command.json_output();
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let result = match cli.command {
        Commands::Load(args) => run_load(args),
        Commands::Tree(args) => run_tree(args),
        Commands::Order(args) => run_order(args),
        Commands::Context(args) => run_context(args),
        Commands::Resolve(args) => run_resolve(args),
        Commands::Watch(args) => run_watch(args).await,
    };

    match result {
        Err(err) if json_output => {
            println!("{}", serialize_json(&error_envelope(&err))?);
            std::process::exit(1);
        }
        other => other,
    }
}

fn load_config(path: &Path) -> Result<VaultConfig> {
    VaultConfig::load(path).with_context(|| format!("Invalid vault {}", path.display()))
}

fn load_snapshot(config: &VaultConfig) -> Result<VaultSnapshot> {
    load_vault(config).with_context(|| format!("Failed to load vault {}", config.root.display()))
}

fn run_load(args: LoadArgs) -> Result<()> {
    let config = load_config(&args.vault.path)?;
    let snapshot = load_snapshot(&config)?;
    let report = LoadReport {
        root: &snapshot.root,
        load: snapshot.stats,
        graph: snapshot.graph.stats(),
    };

    if args.json {
        println!("{}", serialize_json_pretty(&report)?);
    } else {
        print!("{}", report::render_load_summary(&report));
    }
    Ok(())
}

fn run_tree(args: TreeArgs) -> Result<()> {
    let config = load_config(&args.vault.path)?;
    let snapshot = load_snapshot(&config)?;
    let graph = if args.reverse {
        reverse_graph(&snapshot.graph)
    } else {
        snapshot.graph
    };
    print!("{}", render_ascii_tree(&graph));
    Ok(())
}

fn run_order(args: OrderArgs) -> Result<()> {
    let config = load_config(&args.vault.path)?;
    let snapshot = load_snapshot(&config)?;
    let entries = traversal_entries(&snapshot.graph);

    if args.json {
        println!("{}", serialize_json_pretty(&entries)?);
    } else {
        print!("{}", report::render_order(&entries));
    }
    Ok(())
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextOutput<'a> {
    start_id: &'a str,
    max_distance: f64,
    node_ids: &'a [NodeId],
    text: &'a str,
    written: Option<NodeId>,
}

fn run_context(args: ContextArgs) -> Result<()> {
    let mut config = load_config(&args.vault.path)?;
    if let Some(max_distance) = args.max_distance {
        config = config.with_max_distance(max_distance);
        config.validate()?;
    }
    let snapshot = load_snapshot(&config)?;
    let start_id = resolve_start(&snapshot.graph, &args.node)?;

    let context = ContextAssembler::new(&snapshot.graph)
        .with_max_distance(config.context.max_distance)
        .assemble(&start_id)
        .with_context(|| format!("Failed to assemble context for {start_id}"))?;

    let written = if args.write {
        let context_id = context_node_id(&start_id);
        let node = context.clone().into_context_node(context_id.clone());
        // Only the new note is written. Notes it heals are left as authored
        // on disk and pick up the link on the next load or watch event.
        let delta: Vec<_> = add_or_update_node(node, &snapshot.graph)
            .into_iter()
            .take(1)
            .collect();
        let writer = MarkdownDiskWriter::new(&snapshot.root);
        let mut store = GraphStore::from_snapshot(snapshot);
        store
            .commit(&delta, &writer)
            .with_context(|| format!("Failed to write {context_id}"))?;
        log::info!("Wrote context note {context_id}");
        Some(context_id)
    } else {
        None
    };

    if args.json {
        let output = ContextOutput {
            start_id: &context.start_id,
            max_distance: config.context.max_distance,
            node_ids: &context.node_ids,
            text: &context.text,
            written,
        };
        println!("{}", serialize_json_pretty(&output)?);
    } else {
        print!("{}", context.text);
    }
    Ok(())
}

/// Exact node id first, then the same resolution links go through.
fn resolve_start(graph: &Graph, token: &str) -> Result<NodeId> {
    if graph.contains(token) {
        return Ok(token.to_string());
    }
    match LinkIndex::from_graph(graph).resolve_detailed(token) {
        Some(resolution) => {
            if resolution.is_ambiguous() {
                log::warn!(
                    "`{token}` is ambiguous, using {} (also matches: {})",
                    resolution.target,
                    resolution.ambiguous_with.join(", ")
                );
            }
            Ok(resolution.target)
        }
        None => Err(GraphError::NodeNotFound(token.to_string()).into()),
    }
}

/// `felix/1.md` -> `felix/1_context.md`
fn context_node_id(start_id: &str) -> NodeId {
    let (dir, file) = match start_id.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, start_id),
    };
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    match dir {
        Some(dir) => format!("{dir}/{stem}_context.md"),
        None => format!("{stem}_context.md"),
    }
}

fn run_resolve(args: ResolveArgs) -> Result<()> {
    let config = load_config(&args.vault)?;
    let snapshot = load_snapshot(&config)?;
    let index = LinkIndex::from_graph(&snapshot.graph);

    let resolutions: Vec<_> = args
        .tokens
        .iter()
        .map(|token| index.resolve_detailed(token))
        .collect();
    let reports: Vec<_> = args
        .tokens
        .iter()
        .zip(&resolutions)
        .map(|(token, resolution)| ResolveReport::new(token, resolution.as_ref()))
        .collect();

    if args.json {
        println!("{}", serialize_json_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", report::render_resolution(report));
        }
    }
    Ok(())
}

async fn run_watch(args: WatchArgs) -> Result<()> {
    let config = load_config(&args.vault.path)?;
    let snapshot = load_snapshot(&config)?;
    let scanner = VaultScanner::with_excludes(&snapshot.root, &config.vault.exclude)?;
    let watcher_config = VaultWatcherConfig {
        notify_poll_interval: config.poll_interval(),
    };
    let watcher = VaultWatcher::start(GraphStore::from_snapshot(snapshot), scanner, watcher_config)
        .context("Failed to start vault watcher")?;
    let mut updates = watcher.subscribe_updates();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Stopping watcher");
                break;
            }
            update = updates.recv() => match update {
                Ok(update) if args.json => println!("{}", serialize_json(&update)?),
                Ok(update) => println!(
                    "[{}] {:?} {} ({} node changes, {} nodes)",
                    update.sequence,
                    update.kind,
                    update.node_id,
                    update.delta.len(),
                    update.node_count
                ),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Output fell behind, skipped {skipped} updates");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    watcher.shutdown().await?;
    Ok(())
}

fn error_envelope(err: &anyhow::Error) -> ErrorEnvelope {
    let message = format!("{err:#}");
    for cause in err.chain() {
        if let Some(graph_err) = cause.downcast_ref::<GraphError>() {
            return graph_error_envelope(graph_err, message);
        }
        if let Some(indexer_err) = cause.downcast_ref::<IndexerError>() {
            return match indexer_err {
                IndexerError::Graph(graph_err) => graph_error_envelope(graph_err, message),
                IndexerError::Config(_) => ErrorEnvelope::new("invalid_config", message),
                IndexerError::InvalidPath(_) => ErrorEnvelope::new("invalid_path", message)
                    .with_hint("pass an existing vault directory"),
                IndexerError::Write(_) => ErrorEnvelope::new("write_failed", message),
                IndexerError::Watch(_) => ErrorEnvelope::new("watch_failed", message),
                IndexerError::Io(_) | IndexerError::Other(_) => {
                    ErrorEnvelope::new("internal", message)
                }
            };
        }
    }
    ErrorEnvelope::new("internal", message)
}

fn graph_error_envelope(err: &GraphError, message: String) -> ErrorEnvelope {
    match err {
        GraphError::NodeNotFound(_) => ErrorEnvelope::new("node_not_found", message)
            .with_hint("run `voicetree order` to list node ids"),
        GraphError::InvalidPath(_) => ErrorEnvelope::new("invalid_path", message),
        GraphError::Serialization(_) | GraphError::Other(_) => {
            ErrorEnvelope::new("internal", message)
        }
    }
}
