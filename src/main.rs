use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use docsync_cache::{
    CacheDecisionEngine, CacheKey, CacheStatus, CacheStore, Decision, DecisionKind, FsCacheStore,
};
use docsync_core::{DocsyncConfig, OutputFormat, CONFIG_FILE_NAME};
use docsync_graph::ProjectAnalysis;
use docsync_history::impact::ChangeImpact;
use docsync_history::recency::RecentChanges;

#[derive(Parser)]
#[command(
    name = "docsync",
    version,
    about = "Keep generated codebase documentation fresh",
    long_about = "docsync decides when cached codebase documentation has gone stale and\n\
                   which files matter most when regenerating it.\n\n\
                   Examples:\n  \
                     docsync check                  Decide how to refresh the cached docs\n  \
                     docsync record full --artifact docs.md\n  \
                     docsync rank --top 10          Most relevant files with previews\n  \
                     docsync graph                  Structurally central files\n  \
                     docsync status                 Show the cache state"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: <path>/.docsync.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project root (default: current directory)
    #[arg(long, global = true, default_value = ".")]
    path: PathBuf,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create a .docsync.toml with default settings
    Init,
    /// Decide how the cached documentation must be refreshed
    #[command(long_about = "Decide how the cached documentation must be refreshed.\n\n\
        Compares the revision the cached artifact describes with the current one and\n\
        classifies the change as NO_OP, MICRO, PARTIAL or FULL.\n\n\
        Examples:\n  docsync check\n  docsync check --force --format json")]
    Check {
        /// Always answer FULL
        #[arg(long)]
        force: bool,
    },
    /// Record that the cached documentation was refreshed
    #[command(long_about = "Record that the cached documentation was refreshed.\n\n\
        Stores the artifact (when given) and stamps the cache metadata with the\n\
        current revision. A FULL update also refreshes the diff baseline.\n\n\
        Examples:\n  docsync record full --artifact docs/CODEBASE.md\n  docsync record partial")]
    Record {
        /// Kind of update performed: no-op, micro, partial or full
        kind: DecisionKind,

        /// Generated documentation to store in the cache
        #[arg(long)]
        artifact: Option<PathBuf>,
    },
    /// Rank files by relevance for documentation
    Rank {
        /// Number of files to select (default: rank.top_k)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Show the most central files of the import graph
    Graph {
        /// Number of files to show
        #[arg(long, default_value = "20")]
        top: usize,
    },
    /// Show the state of the cache
    Status,
    /// Remove the cache directory
    Clear,
}

const DEFAULT_CONFIG: &str = r#"# docsync configuration
# Every value below is the built-in default.

[index]
# max_file_size = 1048576
# scan_bytes = 8192
# batch_size = 10
# ignore_patterns = ["dist/**", "*.min.js"]

[impact]
# api_patterns = ["api/", "routes/", "controllers/", "endpoints/", "handlers/", "openapi", "swagger", "graphql", ".proto", "/index."]
# manifest_patterns = ["package.json", "Cargo.toml", "go.mod", "requirements.txt"]
# config_patterns = ["config", ".env", "docker", ".yml", ".yaml"]
# many_modules_threshold = 3

[thresholds]
# full_min_files = 10
# full_min_lines = 500
# api_min_files = 2
# many_modules_min_lines = 100
# max_single_file_lines = 1000
# partial_max_files = 5
# partial_single_file_lines = 200

[rank]
# top_k = 15
# history_window = 30
# preview_lines = 100

[rank.weights]
# recency = 50.0
# fan_in = 10.0
# complexity = 5.0
# centrality = 8.0
# file_type = 7.0

[cache]
# dir = ".docsync"
# history_limit = 20
"#;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<DocsyncConfig> {
    match &cli.config {
        Some(path) => DocsyncConfig::from_file(path).into_diagnostic(),
        None => DocsyncConfig::discover(&cli.path).into_diagnostic(),
    }
}

async fn analyze(root: &Path, config: &DocsyncConfig) -> Result<ProjectAnalysis> {
    let spinner = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new_spinner();
        if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
            pb.set_style(style);
        }
        pb.set_message("Indexing project...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let analysis = docsync_graph::analyze_project(root, config)
        .await
        .inspect_err(|_e| {
            if let Some(pb) = &spinner {
                pb.finish_with_message("Failed");
            }
        })
        .into_diagnostic()?;

    if let Some(pb) = spinner {
        pb.finish_with_message(format!(
            "Indexed {} files, {} imports",
            analysis.index.len(),
            analysis.graph.edge_count()
        ));
    }
    Ok(analysis)
}

fn print_decision(decision: &Decision, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(decision).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("## Update: `{}`\n", decision.kind);
            println!("{}\n", decision.reason);
            if let Some(impact) = &decision.impact {
                print_impact_markdown(impact);
            }
        }
        OutputFormat::Text => {
            println!("{}  {}", decision.kind, decision.reason);
            if let Some(impact) = &decision.impact {
                print_impact_text(impact);
            }
        }
    }
    Ok(())
}

fn flags(impact: &ChangeImpact) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if impact.touches_api {
        flags.push("api");
    }
    if impact.touches_dependency_manifest {
        flags.push("dependencies");
    }
    if impact.touches_configuration {
        flags.push("configuration");
    }
    if impact.touches_many_modules {
        flags.push("cross-module");
    }
    flags
}

fn print_impact_text(impact: &ChangeImpact) {
    if !impact.available {
        println!("\n  change impact unavailable");
        return;
    }
    println!(
        "\n  {} files, {} lines, largest {} lines, {} modules",
        impact.file_count,
        impact.total_lines,
        impact.max_lines_in_one_file,
        impact.modules_touched
    );
    let flags = flags(impact);
    if !flags.is_empty() {
        println!("  touches: {}", flags.join(", "));
    }
    for file in &impact.files {
        println!("    +{:<5} -{:<5} {}", file.added, file.deleted, file.path);
    }
}

fn print_impact_markdown(impact: &ChangeImpact) {
    if !impact.available {
        println!("_Change impact unavailable._");
        return;
    }
    println!("| Files | Lines | Largest file | Modules |");
    println!("|------:|------:|-------------:|--------:|");
    println!(
        "| {} | {} | {} | {} |\n",
        impact.file_count,
        impact.total_lines,
        impact.max_lines_in_one_file,
        impact.modules_touched
    );
    let flags = flags(impact);
    if !flags.is_empty() {
        println!("**Touches:** {}\n", flags.join(", "));
    }
    for file in &impact.files {
        println!("- `{}` (+{} -{})", file.path, file.added, file.deleted);
    }
}

fn print_status(status: &CacheStatus, dir: &Path, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(status).into_diagnostic()?);
        return Ok(());
    }

    let yes_no = |b: bool| if b { "yes" } else { "no" };
    let time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    };
    let rows = [
        ("cache dir", dir.display().to_string()),
        ("metadata", status.metadata.to_string()),
        ("artifact", yes_no(status.artifact_present).to_string()),
        ("baseline", yes_no(status.baseline_present).to_string()),
        ("revision", status.last_hash.clone().unwrap_or_else(|| "none".into())),
        ("created", time(status.created_at)),
        ("last updated", time(status.last_updated)),
        ("last full", time(status.last_full_analysis)),
        ("updates", status.updates.to_string()),
        (
            "last update",
            status.last_update.map_or_else(|| "none".into(), |k| k.to_string()),
        ),
    ];

    if format == OutputFormat::Markdown {
        println!("| | |\n|---|---|");
        for (label, value) in rows {
            println!("| {label} | `{value}` |");
        }
    } else {
        for (label, value) in rows {
            println!("  {label:<14} {value}");
        }
    }
    Ok(())
}

fn print_graph(analysis: &ProjectAnalysis, top: usize, format: OutputFormat) -> Result<()> {
    let graph = &analysis.graph;
    let entries: Vec<serde_json::Value> = analysis
        .centrality
        .top(top)
        .into_iter()
        .map(|(path, score)| {
            serde_json::json!({
                "path": path,
                "centrality": score,
                "fanIn": graph.fan_in(path),
                "fanOut": graph.fan_out(path),
            })
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "nodes": graph.node_count(),
                "edges": graph.edge_count(),
                "unresolved": graph.unresolved(),
                "files": entries,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("| Score | In | Out | File |");
            println!("|------:|---:|----:|------|");
            for e in &entries {
                println!(
                    "| {} | {} | {} | `{}` |",
                    e["centrality"], e["fanIn"], e["fanOut"],
                    e["path"].as_str().unwrap_or_default()
                );
            }
        }
        OutputFormat::Text => {
            println!(
                "{} files, {} imports, {} unresolved\n",
                graph.node_count(),
                graph.edge_count(),
                graph.unresolved()
            );
            println!("{:>5} {:>4} {:>4}  FILE", "SCORE", "IN", "OUT");
            for (path, score) in analysis.centrality.top(top) {
                println!(
                    "{score:>5} {:>4} {:>4}  {path}",
                    graph.fan_in(path),
                    graph.fan_out(path)
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = &cli.command else {
        println!("docsync {}: run `docsync --help` for commands", env!("CARGO_PKG_VERSION"));
        return Ok(());
    };

    if let Command::Init = command {
        let path = cli.path.join(CONFIG_FILE_NAME);
        if path.exists() {
            miette::bail!(
                help = "edit the existing file or delete it first",
                "{} already exists",
                path.display()
            );
        }
        std::fs::write(&path, DEFAULT_CONFIG).into_diagnostic()?;
        println!("Created {} with default configuration", path.display());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let root = cli.path.as_path();
    if !root.is_dir() {
        miette::bail!("{} is not a directory", root.display());
    }
    debug!(root = %root.display(), format = %cli.format, cache = %config.cache.dir, "configuration loaded");

    let store = FsCacheStore::for_project(root, &config.cache);
    let history = docsync_history::open_history(root);
    let engine = CacheDecisionEngine::new(&store, history.as_ref(), &config);

    match command {
        Command::Init => {}
        Command::Check { force } => {
            let decision = engine.decide(*force);
            print_decision(&decision, cli.format)?;
        }
        Command::Record { kind, artifact } => {
            let current = history.current_revision().map_err(|e| {
                miette::miette!(
                    help = "record needs a git repository with at least one commit",
                    "cannot determine the current revision: {e}"
                )
            })?;

            // Decide before the new artifact lands so the impact describes this update.
            let decided = engine.decide(false);
            let decision = Decision {
                kind: *kind,
                impact: decided.impact,
                reason: if decided.kind == *kind {
                    decided.reason
                } else {
                    format!("recorded as {kind}; engine suggested {}", decided.kind)
                },
            };

            if let Some(path) = artifact {
                let content = std::fs::read(path).into_diagnostic()?;
                store.write(CacheKey::Artifact, &content).into_diagnostic()?;
            }

            let meta = engine.record(&decision, &current).into_diagnostic()?;
            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&meta).into_diagnostic()?);
                }
                _ => println!(
                    "Recorded {} at {}",
                    decision.kind,
                    meta.last_hash.as_deref().unwrap_or("unknown")
                ),
            }
        }
        Command::Rank { top } => {
            let analysis = analyze(root, &config).await?;
            let recent = RecentChanges::collect(history.as_ref(), config.rank.history_window);
            let k = top.unwrap_or(config.rank.top_k);
            let files = docsync_select::select_files(root, &analysis, &recent, &config.rank, k)
                .await
                .into_diagnostic()?;
            if files.is_empty() && cli.format == OutputFormat::Text {
                println!("No files found");
            } else {
                let out = docsync_select::output::render(&files, cli.format).into_diagnostic()?;
                println!("{out}");
            }
        }
        Command::Graph { top } => {
            let analysis = analyze(root, &config).await?;
            print_graph(&analysis, *top, cli.format)?;
        }
        Command::Status => {
            print_status(&engine.status(), store.dir(), cli.format)?;
        }
        Command::Clear => {
            store.clear().into_diagnostic()?;
            println!("Removed {}", store.dir().display());
        }
    }

    Ok(())
}
