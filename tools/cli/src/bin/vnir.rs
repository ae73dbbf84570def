use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use visual_novel_ir::{
    ConverterConfig, GraphStats, IrGraph, RoundTripConverter, StoryGraph, VisualGraph,
    GRAPH_SCHEMA_VERSION,
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about = "Visual novel script and IR converter")]
struct Cli {
    /// Converter configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a script into IR graph JSON.
    ToIr {
        script: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a script into visual graph JSON.
    ToVisual {
        script: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Recompute node positions with the layered layout.
        #[arg(long, default_value_t = false)]
        layout: bool,
    },
    /// Generate script text from IR (or visual, with --visual) graph JSON.
    ToText {
        graph: PathBuf,
        #[arg(long, default_value_t = false)]
        visual: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report structural problems in an IR graph JSON file.
    Validate {
        graph: PathBuf,
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Round-trip every `.nms` script under a path and report differences.
    Check { path: PathBuf },
    /// Print the Graphviz DOT form of a script's IR.
    Dot {
        script: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the JSON Schema of a graph document.
    Schema {
        #[arg(value_enum)]
        kind: SchemaKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaKind {
    Ir,
    Visual,
    Story,
}

#[derive(Serialize)]
struct ValidationReport {
    schema_version: String,
    graph: String,
    valid: bool,
    issues: Vec<String>,
    stats: GraphStats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => ConverterConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => ConverterConfig::default(),
    };
    let converter = RoundTripConverter::new(config);

    match cli.command {
        Command::ToIr { script, output } => {
            let graph = converter.text_to_ir(&read(&script)?)?;
            emit(output.as_deref(), &graph.to_json()?)
        }
        Command::ToVisual {
            script,
            output,
            layout,
        } => {
            let mut visual = converter.text_to_visual_graph(&read(&script)?)?;
            if layout {
                visual.auto_layout_with(&converter.config().layout);
            }
            emit(output.as_deref(), &visual.to_json()?)
        }
        Command::ToText {
            graph,
            visual,
            output,
        } => {
            let raw = read(&graph)?;
            let text = if visual {
                let visual = VisualGraph::from_json(&raw).context("parse visual graph")?;
                converter.visual_graph_to_text(&visual)?
            } else {
                let graph = IrGraph::from_json(&raw).context("parse ir graph")?;
                converter.ir_to_text(&graph)?
            };
            emit(output.as_deref(), &text)
        }
        Command::Validate { graph, format } => validate_graph(&graph, format),
        Command::Check { path } => check_scripts(&converter, &path),
        Command::Dot { script, output } => {
            let graph = converter.text_to_ir(&read(&script)?)?;
            emit(output.as_deref(), &graph.to_dot())
        }
        Command::Schema { kind } => {
            let schema = match kind {
                SchemaKind::Ir => IrGraph::json_schema(),
                SchemaKind::Visual => VisualGraph::json_schema(),
                SchemaKind::Story => StoryGraph::json_schema(),
            };
            emit(None, &serde_json::to_string_pretty(&schema)?)
        }
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn emit(output: Option<&Path>, payload: &str) -> Result<()> {
    let Some(output) = output else {
        println!("{payload}");
        return Ok(());
    };
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, payload).with_context(|| format!("write {}", output.display()))?;
    info!(path = %output.display(), "wrote output");
    Ok(())
}

fn validate_graph(path: &Path, format: ReportFormat) -> Result<()> {
    let graph = IrGraph::from_json(&read(path)?).context("parse ir graph")?;
    let issues = graph.validate();
    let report = ValidationReport {
        schema_version: GRAPH_SCHEMA_VERSION.to_string(),
        graph: graph.name().to_string(),
        valid: issues.is_empty(),
        issues,
        stats: graph.stats(),
    };
    match format {
        ReportFormat::Text => {
            for issue in &report.issues {
                println!("{issue}");
            }
            println!(
                "{}: {} node(s), {} connection(s), {} issue(s)",
                report.graph,
                report.stats.total_nodes,
                report.stats.connection_count,
                report.issues.len()
            );
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
    }
    if !report.valid {
        bail!("{} has {} issue(s)", path.display(), report.issues.len());
    }
    Ok(())
}

fn check_scripts(converter: &RoundTripConverter, root: &Path) -> Result<()> {
    let mut checked = 0usize;
    let mut failed = 0usize;
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                failed += 1;
                warn!(error = %err, "cannot read directory entry");
                println!("FAIL {err}");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() || path.extension().and_then(|ext| ext.to_str()) != Some("nms") {
            continue;
        }
        checked += 1;
        let source = read(path)?;
        let issues = match converter.round_trip(&source) {
            Ok(text) => converter.validate_conversion(&source, &text),
            Err(err) => vec![err.to_string()],
        };
        if issues.is_empty() {
            debug!(path = %path.display(), "round trip ok");
            println!("ok   {}", path.display());
        } else {
            failed += 1;
            warn!(path = %path.display(), issues = issues.len(), "round trip failed");
            println!("FAIL {}", path.display());
            for issue in issues {
                println!("     {issue}");
            }
        }
    }
    println!("{checked} script(s) checked, {failed} failed");
    if failed > 0 {
        bail!("{failed} script(s) failed the round trip");
    }
    Ok(())
}
