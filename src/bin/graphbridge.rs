//! GraphBridge CLI: mine cross-domain edges between two knowledge graphs.
//!
//! Usage:
//!   graphbridge pair <SOURCE_ID> <TARGET_ID> --source-graph a.json --target-graph b.json
//!   graphbridge batch --pairs pairs.json ...
//!   graphbridge sample <random|keyword|theme> ...
//!   graphbridge cartesian ...
//!   graphbridge roundtable --topic "..." ...

use clap::{Args, Parser, Subcommand};
use graphbridge::chatroom::sampling;
use graphbridge::discussion::{render_report, DriftDetector};
use graphbridge::store::EdgeStore;
use graphbridge::{
    BatchSummary, CancellationToken, CartesianRun, Config, ContextBuilder, FocusThemes,
    KnowledgeGraph, NodePairChatroom, OpenAiGenerator, PairOutcome, Personas, ProgressStore,
    RoundTable, RunStatus, TextGenerator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "graphbridge",
    version,
    about = "Multi-agent discussions that mine cross-domain edges between two knowledge graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command
#[derive(Args, Clone)]
struct GraphArgs {
    /// Source graph file ({nodes, edges} JSON)
    #[arg(long)]
    source_graph: PathBuf,
    /// Target graph file ({nodes, edges} JSON)
    #[arg(long)]
    target_graph: PathBuf,
    /// Name of the source graph, as recorded in the edge file
    #[arg(long, default_value = "physics")]
    source_name: String,
    /// Name of the target graph, as recorded in the edge file
    #[arg(long, default_value = "math")]
    target_name: String,
    /// Config file (default: ./graphbridge.yaml, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discuss a single node pair
    Pair {
        source_id: String,
        target_id: String,
        /// Neighbourhood depth for each node's context
        #[arg(long)]
        depth: Option<usize>,
        #[command(flatten)]
        graphs: GraphArgs,
    },
    /// Discuss every pair listed in a JSON file of [source_id, target_id] pairs
    Batch {
        #[arg(long)]
        pairs: PathBuf,
        #[arg(long)]
        depth: Option<usize>,
        #[command(flatten)]
        graphs: GraphArgs,
    },
    /// Choose pairs by a sampling strategy, then print or discuss them
    Sample {
        #[command(subcommand)]
        strategy: SampleStrategy,
        /// Discuss the sampled pairs instead of printing them
        #[arg(long, global = true)]
        run: bool,
        #[arg(long, global = true)]
        depth: Option<usize>,
    },
    /// Discuss the full cross product, resuming from the progress file
    Cartesian {
        #[arg(long)]
        depth: Option<usize>,
        /// Pairs between progress checkpoints
        #[arg(long)]
        checkpoint_every: Option<usize>,
        #[command(flatten)]
        graphs: GraphArgs,
    },
    /// Multi-round discussion over focus lists of both graphs
    Roundtable {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value_t = 3)]
        rounds: usize,
        /// Theme narrowing the source focus list (repeatable)
        #[arg(long = "source-theme")]
        source_themes: Vec<String>,
        /// Theme narrowing the target focus list (repeatable)
        #[arg(long = "target-theme")]
        target_themes: Vec<String>,
        /// Score extracted edges with the evaluator persona
        #[arg(long)]
        score: bool,
        /// Write the transcript here as JSON
        #[arg(long)]
        export: Option<PathBuf>,
        /// Write the markdown evaluation report here (with --score)
        #[arg(long)]
        report: Option<PathBuf>,
        /// Append extracted edges to this file [default: the configured edge file]
        #[arg(long)]
        edges: Option<PathBuf>,
        #[command(flatten)]
        graphs: GraphArgs,
    },
}

#[derive(Subcommand)]
enum SampleStrategy {
    /// Uniform sample of the cross product
    Random {
        #[arg(long)]
        count: usize,
        /// Seed for a reproducible sample
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        graphs: GraphArgs,
    },
    /// Pairs where a keyword occurs in both nodes
    Keyword {
        #[arg(long = "keyword", required = true)]
        keywords: Vec<String>,
        #[arg(long, default_value_t = 50)]
        max_pairs: usize,
        #[command(flatten)]
        graphs: GraphArgs,
    },
    /// Pairs whose nodes match the given themes
    Theme {
        #[arg(long = "source-theme", required = true)]
        source_themes: Vec<String>,
        #[arg(long = "target-theme", required = true)]
        target_themes: Vec<String>,
        #[command(flatten)]
        graphs: GraphArgs,
    },
}

impl SampleStrategy {
    fn graphs(&self) -> &GraphArgs {
        match self {
            Self::Random { graphs, .. } | Self::Keyword { graphs, .. } | Self::Theme { graphs, .. } => {
                graphs
            }
        }
    }
}

/// Loaded graphs, config and generator for one command
struct Session {
    config: Config,
    generator: Option<Arc<dyn TextGenerator>>,
    source: Arc<KnowledgeGraph>,
    target: Arc<KnowledgeGraph>,
    source_path: String,
    target_path: String,
}

impl Session {
    fn depth(&self, flag: Option<usize>) -> usize {
        flag.unwrap_or(self.config.discussion.context_depth)
    }

    fn generator(&self) -> Result<Arc<dyn TextGenerator>, String> {
        self.generator
            .clone()
            .ok_or_else(|| "no generator configured".to_string())
    }

    fn chatroom(&self) -> Result<NodePairChatroom, String> {
        let store = EdgeStore::new(self.config.output.edges_path());
        let chatroom = NodePairChatroom::new(
            self.generator()?,
            self.source.clone(),
            self.target.clone(),
            store,
            Personas::default(),
        )
        .with_context_builder(
            ContextBuilder::new().neighbor_limit(self.config.discussion.neighbor_limit),
        )
        .with_drift_detector(DriftDetector::new(
            self.config.discussion.min_response_chars,
        ));
        chatroom
            .initialize_store(&self.source_path, &self.target_path)
            .map_err(|e| format!("Failed to initialize edge file: {}", e))?;
        Ok(chatroom)
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, String> {
    Config::load(path).map_err(|e| e.to_string())
}

fn load_graph(name: &str, path: &Path) -> Result<Arc<KnowledgeGraph>, String> {
    let graph = KnowledgeGraph::load(name, path)
        .map_err(|e| format!("Failed to load {} graph from {}: {}", name, path.display(), e))?;
    tracing::info!(
        graph = name,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(Arc::new(graph))
}

/// Open graphs and the generator; `live` requires an API key.
fn open_session(args: &GraphArgs, config: Config, live: bool) -> Result<Session, String> {
    config.validate(live).map_err(|e| e.to_string())?;
    let source = load_graph(&args.source_name, &args.source_graph)?;
    let target = load_graph(&args.target_name, &args.target_graph)?;
    let generator: Option<Arc<dyn TextGenerator>> = if live {
        let generator = OpenAiGenerator::new(config.llm.clone())
            .map_err(|e| format!("Failed to create generator: {}", e))?;
        Some(Arc::new(generator))
    } else {
        None
    };
    Ok(Session {
        config,
        generator,
        source,
        target,
        source_path: args.source_graph.display().to_string(),
        target_path: args.target_graph.display().to_string(),
    })
}

fn init_logging(config_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "Processed {} pairs: {} accepted, {} rejected, {} no edge, {} off topic, {} invalid, {} failed",
        summary.processed,
        summary.accepted,
        summary.rejected,
        summary.no_edge,
        summary.off_topic,
        summary.invalid,
        summary.failed
    );
    for edge in &summary.edges {
        println!("  {} --[{}]--> {}", edge.source, edge.label, edge.target);
    }
}

async fn cmd_pair(session: &Session, source_id: &str, target_id: &str, depth: Option<usize>) -> i32 {
    let chatroom = match session.chatroom() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match chatroom
        .discuss_pair(source_id, target_id, session.depth(depth))
        .await
    {
        Ok(PairOutcome::Accepted(edge)) => {
            println!(
                "Accepted: {} --[{}]--> {}",
                edge.source, edge.label, edge.target
            );
            println!("Saved to {}", chatroom.store().path().display());
            0
        }
        Ok(PairOutcome::Rejected { edge, reason }) => {
            println!(
                "Rejected: {} --[{}]--> {} ({})",
                edge.source, edge.label, edge.target, reason
            );
            0
        }
        Ok(PairOutcome::NoEdge) => {
            println!("No edge found between '{}' and '{}'", source_id, target_id);
            0
        }
        Ok(PairOutcome::OffTopic { correction }) => {
            println!("Discussion drifted off topic; moderator said: {}", correction);
            0
        }
        Ok(PairOutcome::InvalidEdge(edge)) => {
            println!(
                "Dropped edge with unknown endpoints: {} -> {}",
                edge.source, edge.target
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_batch(session: &Session, pairs: &[(String, String)], depth: Option<usize>) -> i32 {
    let chatroom = match session.chatroom() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let summary = chatroom.batch_discuss(pairs, session.depth(depth)).await;
    print_summary(&summary);
    0
}

fn read_pairs(path: &Path) -> Result<Vec<(String, String)>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("'{}' is not a list of [source, target] pairs: {}", path.display(), e))
}

fn sample_pairs(session: &Session, strategy: &SampleStrategy) -> Vec<(String, String)> {
    match strategy {
        SampleStrategy::Random { count, seed, .. } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(*seed),
                None => StdRng::from_entropy(),
            };
            sampling::random_sample(&session.source, &session.target, *count, &mut rng)
        }
        SampleStrategy::Keyword {
            keywords,
            max_pairs,
            ..
        } => sampling::keyword_sample(&session.source, &session.target, keywords, *max_pairs),
        SampleStrategy::Theme {
            source_themes,
            target_themes,
            ..
        } => sampling::theme_sample(&session.source, &session.target, source_themes, target_themes),
    }
}

async fn cmd_sample(
    session: &Session,
    strategy: &SampleStrategy,
    run: bool,
    depth: Option<usize>,
) -> i32 {
    let pairs = sample_pairs(session, strategy);
    if pairs.is_empty() {
        println!("No pairs matched.");
        return 0;
    }
    if !run {
        println!("{:<32}  {:<32}", "SOURCE", "TARGET");
        println!("{}", "-".repeat(66));
        for (source, target) in &pairs {
            println!("{:<32}  {:<32}", source, target);
        }
        println!("{} pairs", pairs.len());
        return 0;
    }
    cmd_batch(session, &pairs, depth).await
}

async fn cmd_cartesian(session: &Session, depth: Option<usize>, checkpoint_every: Option<usize>) -> i32 {
    let chatroom = match session.chatroom() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let pairs = sampling::cartesian(&session.source, &session.target);
    let cancel = CancellationToken::new();
    let watcher = cancel.cancel_on_ctrl_c();

    let progress = ProgressStore::new(session.config.output.progress_path());
    let run = CartesianRun::new(&chatroom, progress)
        .with_depth(session.depth(depth))
        .with_checkpoint_every(checkpoint_every.unwrap_or(session.config.run.checkpoint_every))
        .with_cancellation(cancel);

    let result = run.run(&pairs).await;
    watcher.abort();

    match result {
        Ok(report) => {
            println!(
                "Processed {} pairs ({} skipped, {} failed); {} accepted now, {} of {} pairs valid overall",
                report.processed,
                report.skipped,
                report.failed,
                report.accepted,
                report.total_valid,
                report.total_pairs
            );
            match report.status {
                RunStatus::Completed => 0,
                RunStatus::Interrupted => {
                    println!("Interrupted; run again to resume.");
                    130
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

struct RoundtableArgs {
    topic: String,
    rounds: usize,
    focus: FocusThemes,
    score: bool,
    export: Option<PathBuf>,
    report: Option<PathBuf>,
    edges: Option<PathBuf>,
}

async fn cmd_roundtable(session: &Session, args: RoundtableArgs) -> i32 {
    let generator = match session.generator() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut table = RoundTable::new(
        args.topic,
        generator,
        session.source.clone(),
        session.target.clone(),
        Personas::default(),
    )
    .with_transcript_cap(session.config.discussion.transcript_cap);
    if args.score {
        table = table.with_scoring();
    }

    let report = match table.discuss(args.rounds, &args.focus).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!(
        "{} rounds ({} moderated): {} edges, {} dropped",
        report.rounds,
        report.moderated_rounds.len(),
        report.edges.len(),
        report.dropped
    );
    for edge in &report.edges {
        println!("  {} --[{}]--> {}", edge.source, edge.label, edge.target);
    }

    let store = EdgeStore::new(
        args.edges.unwrap_or_else(|| session.config.output.edges_path()),
    );
    match table.save_edges(&store, &report.edges, &session.source_path, &session.target_path) {
        Ok(total) => println!(
            "Edges saved to {} ({} in file)",
            store.path().display(),
            total
        ),
        Err(e) => {
            eprintln!("Error: cannot save edges: {}", e);
            return 1;
        }
    }

    if let Some(path) = &args.export {
        if let Err(e) = table.export_transcript(path) {
            eprintln!("Error: cannot export transcript: {}", e);
            return 1;
        }
        println!("Transcript written to {}", path.display());
    }

    if !report.scored.is_empty() {
        let markdown = render_report(&report.scored);
        match &args.report {
            Some(path) => {
                if let Err(e) = std::fs::write(path, markdown) {
                    eprintln!("Error: cannot write report '{}': {}", path.display(), e);
                    return 1;
                }
                println!("Report written to {}", path.display());
            }
            None => println!("\n{}", markdown),
        }
    }
    0
}

fn main() {
    let cli = Cli::parse();

    let graphs = match &cli.command {
        Commands::Pair { graphs, .. }
        | Commands::Batch { graphs, .. }
        | Commands::Cartesian { graphs, .. }
        | Commands::Roundtable { graphs, .. } => graphs.clone(),
        Commands::Sample { strategy, .. } => strategy.graphs().clone(),
    };

    let config = match load_config(graphs.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(config.log_level.as_deref());

    // Printing sampled pairs needs no generator.
    let live = !matches!(&cli.command, Commands::Sample { run: false, .. });
    let session = match open_session(&graphs, config, live) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async {
        match cli.command {
            Commands::Pair {
                source_id,
                target_id,
                depth,
                ..
            } => cmd_pair(&session, &source_id, &target_id, depth).await,
            Commands::Batch { pairs, depth, .. } => match read_pairs(&pairs) {
                Ok(pairs) => cmd_batch(&session, &pairs, depth).await,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            },
            Commands::Sample {
                strategy,
                run,
                depth,
            } => cmd_sample(&session, &strategy, run, depth).await,
            Commands::Cartesian {
                depth,
                checkpoint_every,
                ..
            } => cmd_cartesian(&session, depth, checkpoint_every).await,
            Commands::Roundtable {
                topic,
                rounds,
                source_themes,
                target_themes,
                score,
                export,
                report,
                edges,
                ..
            } => {
                let args = RoundtableArgs {
                    topic,
                    rounds,
                    focus: FocusThemes {
                        source: source_themes,
                        target: target_themes,
                    },
                    score,
                    export,
                    report,
                    edges,
                };
                cmd_roundtable(&session, args).await
            }
        }
    });
    std::process::exit(code);
}
