mod scan;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing::info;

use callgrapher::trace::init_tracing;
use callgrapher::{
    AnalysisConfig, CallGraph, CallGraphAlgorithm, ClassHierarchyAnalysis, ClassPath,
    MethodAllocationOracle, MethodSignature, PointsToRefinedRta, RapidTypeAnalysis,
    StaticPointsTo, WorklistOrder, find_main_method,
};

use crate::scan::scan_inputs;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    Cha,
    Rta,
    PointsTo,
}

/// CLI arguments for callgrapher execution.
#[derive(Parser, Debug)]
#[command(
    name = "callgrapher",
    about = "Deterministic call graph construction for JVM program models.",
    version
)]
struct Cli {
    /// Program model: a JSON file or a directory of JSON files.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    #[arg(long, value_name = "PATH")]
    classpath: Vec<PathBuf>,
    #[arg(long, value_enum, default_value_t = Algorithm::Cha)]
    algorithm: Algorithm,
    /// Entry point signature; the unique `main` method is used when absent.
    #[arg(long = "entry-point", value_name = "SIGNATURE")]
    entry_points: Vec<String>,
    /// JSON map from method signature to allocated classes, for `points-to`.
    #[arg(long = "points-to", value_name = "PATH")]
    points_to: Option<PathBuf>,
    #[arg(long)]
    lenient: bool,
    #[arg(long, value_enum, default_value_t = WorklistOrder::Fifo)]
    worklist_order: WorklistOrder,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if !cli.input.exists() {
        anyhow::bail!("input not found: {}", cli.input.display());
    }
    for entry in &cli.classpath {
        if !entry.exists() {
            anyhow::bail!("classpath entry not found: {}", entry.display());
        }
    }
    if cli.points_to.is_some() && cli.algorithm != Algorithm::PointsTo {
        anyhow::bail!("--points-to requires --algorithm points-to");
    }

    let started_at = Instant::now();
    let scan = scan_inputs(&cli.input, &cli.classpath)?;
    let class_path = ClassPath::new(scan.classes).context("failed to build class path")?;
    info!(
        files = scan.file_count,
        classes = class_path.len(),
        "loaded program"
    );

    let mut config = AnalysisConfig::default().with_worklist_order(cli.worklist_order);
    if cli.lenient {
        config = config.lenient();
    }
    let entry_points = entry_points(&cli.entry_points, &class_path)?;
    let (algorithm_id, graph) =
        build_graph(cli.algorithm, cli.points_to.as_deref(), &class_path, config, &entry_points)?;

    let report = build_report(algorithm_id, &entry_points, &graph);
    let mut writer = output_writer(cli.output.as_deref())?;
    serde_json::to_writer_pretty(&mut writer, &report)
        .context("failed to serialize call graph output")?;
    writer
        .write_all(b"\n")
        .context("failed to write call graph output")?;

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} classes={} methods={} edges={}",
            started_at.elapsed().as_millis(),
            class_path.len(),
            graph.method_count(),
            graph.edge_count()
        );
    }

    Ok(())
}

fn entry_points(requested: &[String], class_path: &ClassPath) -> Result<Vec<MethodSignature>> {
    if requested.is_empty() {
        return Ok(vec![find_main_method(class_path)?]);
    }
    requested
        .iter()
        .map(|text| {
            text.parse::<MethodSignature>()
                .with_context(|| format!("invalid entry point {text}"))
        })
        .collect()
}

fn build_graph(
    algorithm: Algorithm,
    points_to: Option<&Path>,
    class_path: &ClassPath,
    config: AnalysisConfig,
    entry_points: &[MethodSignature],
) -> Result<(&'static str, CallGraph)> {
    let context = class_path.context(config);
    match algorithm {
        Algorithm::Cha => run_algorithm(&mut ClassHierarchyAnalysis::new(context), entry_points),
        Algorithm::Rta => run_algorithm(&mut RapidTypeAnalysis::new(context), entry_points),
        Algorithm::PointsTo => match points_to {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let oracle = StaticPointsTo::from_json(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                run_algorithm(&mut PointsToRefinedRta::new(context, &oracle), entry_points)
            }
            None => {
                let oracle = MethodAllocationOracle::new(class_path);
                run_algorithm(&mut PointsToRefinedRta::new(context, &oracle), entry_points)
            }
        },
    }
}

fn run_algorithm(
    algorithm: &mut dyn CallGraphAlgorithm,
    entry_points: &[MethodSignature],
) -> Result<(&'static str, CallGraph)> {
    let metadata = algorithm.metadata();
    let graph = algorithm
        .build(entry_points)
        .with_context(|| format!("{} failed", metadata.name))?;
    Ok((metadata.id, graph))
}

fn build_report(
    algorithm_id: &str,
    entry_points: &[MethodSignature],
    graph: &CallGraph,
) -> serde_json::Value {
    json!({
        "algorithm": algorithm_id,
        "entry_points": entry_points,
        "method_count": graph.method_count(),
        "edge_count": graph.edge_count(),
        "graph": graph,
    })
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}
