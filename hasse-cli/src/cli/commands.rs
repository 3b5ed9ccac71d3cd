//! Command implementations and argument parsing for the `hasse` CLI.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use hasse_core::{
    AverageLinkage, CoverageRule, DEFAULT_CUT_HEIGHT, DEFAULT_EPS, DensityClusterer, EpisodeFamily,
    ExecutionStrategy, ExhaustiveSearch, GraphView, Hasse, HasseBuilder, HasseError, MatrixFamily,
    MatrixSource, NodeId, PosetAnalysis,
};
use hasse_providers_json::{
    EpisodeOptions, JsonProviderError, load_episodes, load_path_table, load_universe,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

use super::report::{
    AnalyzeReport, AverageReport, ClusterReport, DensityReport, ExecutionSummary,
    ExhaustiveReport, GreedyReport, OutputFormat, Report,
};

const DEFAULT_FRACTION: f64 = 0.85;
const DEFAULT_MAX_SIZE: usize = 4;
const DEFAULT_COMBINATION_LIMIT: u64 = 100_000_000;
const DEFAULT_MIN_SAMPLES: NonZeroUsize = NonZeroUsize::MIN;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "hasse",
    about = "Analyse dominance posets of relation matrices."
)]
pub struct Cli {
    /// Emit a JSON document instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Format requested for the rendered report.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build the Hasse diagram and report per-node coverage.
    Analyze(PosetArgs),
    /// Agglomerate entities by graph distance over the Hasse diagram.
    Cluster(ClusterCommand),
    /// Search for nodes covering a share of the entities.
    #[command(subcommand)]
    Cover(CoverCommand),
    /// Cluster flattened matrices without the poset.
    #[command(subcommand)]
    Baseline(BaselineCommand),
}

/// Inputs shared by every poset command.
#[derive(Debug, Args, Clone)]
pub struct PosetArgs {
    /// JSON file holding the universe of relation matrices.
    pub universe: PathBuf,

    /// Entities to attach; defaults to the universe itself.
    #[command(flatten)]
    pub entities: EntityArgs,

    /// Direction in which attached entities propagate.
    #[arg(long, value_enum, default_value_t = RuleArg::Descendants)]
    pub rule: RuleArg,

    /// Execution strategy for the analysis kernels.
    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    pub strategy: StrategyArg,
}

/// Entity file options.
#[derive(Debug, Args, Clone)]
pub struct EntityArgs {
    /// JSON file holding the entities.
    #[arg(long)]
    pub entities: Option<PathBuf>,

    /// Layout of the entity file.
    #[arg(long, value_enum, default_value_t = EntityFormat::Matrices)]
    pub format: EntityFormat,

    /// Clear the diagonal of episode matrices after loading.
    #[arg(long)]
    pub strip_diagonal: bool,
}

/// Layouts accepted for entity files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityFormat {
    /// A list of matrices, or a map of relation count to matrices.
    Matrices,
    /// A list of `{ "M_c": matrix, "P": positions }` records.
    Episodes,
}

impl EntityFormat {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Matrices => "matrices",
            Self::Episodes => "episodes",
        }
    }
}

/// Coverage rule selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuleArg {
    /// Entities count towards the nodes above their match.
    Descendants,
    /// Entities count towards their match and the nodes below it.
    Ancestors,
}

impl From<RuleArg> for CoverageRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Descendants => Self::Descendants,
            RuleArg::Ancestors => Self::Ancestors,
        }
    }
}

/// Execution strategy selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Pick sequential or parallel execution per workload.
    Auto,
    /// Run on the calling thread.
    Sequential,
    /// Always use the thread pool.
    Parallel,
}

impl From<StrategyArg> for ExecutionStrategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Auto => Self::Auto,
            StrategyArg::Sequential => Self::Sequential,
            StrategyArg::Parallel => Self::Parallel,
        }
    }
}

/// Options accepted by the `cluster` command.
#[derive(Debug, Args, Clone)]
pub struct ClusterCommand {
    /// Poset inputs.
    #[command(flatten)]
    pub poset: PosetArgs,

    /// Measure distances over the undirected Hasse diagram.
    #[arg(long)]
    pub undirected: bool,

    /// Precomputed shortest-path table to use instead.
    #[arg(long, conflicts_with = "undirected")]
    pub paths: Option<PathBuf>,

    /// Stop after this many merges.
    #[arg(long)]
    pub iteration_cap: Option<usize>,
}

/// Set-cover searches.
#[derive(Debug, Subcommand, Clone)]
pub enum CoverCommand {
    /// Pick the node adding the most coverage until the target is met.
    Greedy(CoverArgs),
    /// Enumerate every node combination up to a size bound.
    Exhaustive(ExhaustiveArgs),
}

/// Options shared by both cover searches.
#[derive(Debug, Args, Clone)]
pub struct CoverArgs {
    /// Poset inputs.
    #[command(flatten)]
    pub poset: PosetArgs,

    /// Share of the entities the cover must reach.
    #[arg(long, default_value_t = DEFAULT_FRACTION)]
    pub fraction: f64,

    /// Node identifiers never picked.
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<usize>,

    /// Also skip nodes that cover every entity.
    #[arg(long)]
    pub exclude_universal: bool,
}

/// Options accepted by `cover exhaustive`.
#[derive(Debug, Args, Clone)]
pub struct ExhaustiveArgs {
    /// Shared cover options.
    #[command(flatten)]
    pub cover: CoverArgs,

    /// Largest combination size.
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
    pub max_size: usize,

    /// Refuse searches enumerating more combinations than this.
    #[arg(long, default_value_t = DEFAULT_COMBINATION_LIMIT)]
    pub limit: u64,

    /// Keep only combinations of pairwise incomparable nodes.
    #[arg(long)]
    pub antichains: bool,

    /// Drop combinations containing a smaller qualifying one.
    #[arg(long)]
    pub minimal: bool,
}

/// Flat clustering baselines.
#[derive(Debug, Subcommand, Clone)]
pub enum BaselineCommand {
    /// Density-based clustering under L1 distance.
    Density(DensityArgs),
    /// Average-linkage clustering cut at a height.
    Average(AverageArgs),
}

/// Input options for the baselines.
#[derive(Debug, Args, Clone)]
pub struct BaselineInput {
    /// JSON file holding the matrices to cluster.
    pub input: PathBuf,

    /// Layout of the input file.
    #[arg(long, value_enum, default_value_t = EntityFormat::Matrices)]
    pub format: EntityFormat,

    /// Clear the diagonal of episode matrices after loading.
    #[arg(long)]
    pub strip_diagonal: bool,

    /// Execution strategy for distance computations.
    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    pub strategy: StrategyArg,
}

/// Options accepted by `baseline density`.
#[derive(Debug, Args, Clone)]
pub struct DensityArgs {
    /// Input options.
    #[command(flatten)]
    pub input: BaselineInput,

    /// Neighbourhood radius.
    #[arg(long, default_value_t = DEFAULT_EPS)]
    pub eps: f64,

    /// Neighbours, the point included, that make a core point.
    #[arg(long, default_value_t = DEFAULT_MIN_SAMPLES)]
    pub min_samples: NonZeroUsize,
}

/// Options accepted by `baseline average`.
#[derive(Debug, Args, Clone)]
pub struct AverageArgs {
    /// Input options.
    #[command(flatten)]
    pub input: BaselineInput,

    /// Height at which the dendrogram is cut.
    #[arg(long, default_value_t = DEFAULT_CUT_HEIGHT)]
    pub cut_height: f64,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// An input file could not be loaded.
    #[error(transparent)]
    Provider(#[from] JsonProviderError),
    /// Core analysis failed.
    #[error(transparent)]
    Core(#[from] HasseError),
}

impl CliError {
    /// Core error behind this failure, if any.
    #[must_use]
    pub fn core(&self) -> Option<&HasseError> {
        match self {
            Self::Core(core) | Self::Provider(JsonProviderError::Core(core)) => Some(core),
            Self::Provider(_) => None,
        }
    }
}

/// Entities loaded for a command.
#[derive(Debug, Clone)]
pub(super) enum Entities {
    Matrices(MatrixFamily),
    Episodes(EpisodeFamily),
}

impl Entities {
    pub(super) fn source(&self) -> &dyn MatrixSource {
        match self {
            Self::Matrices(family) => family,
            Self::Episodes(family) => family,
        }
    }

    pub(super) fn episodes(&self) -> Option<&EpisodeFamily> {
        match self {
            Self::Matrices(_) => None,
            Self::Episodes(family) => Some(family),
        }
    }
}

struct Prepared {
    hasse: Hasse,
    universe: MatrixFamily,
    entities: Entities,
    analysis: PosetAnalysis,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading an input or running the analysis fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clap::Parser;
/// # use hasse_cli::cli::{Cli, Report, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "[[[0, 1], [0, 0]], [[0, 0], [0, 0]]]")?;
/// let cli = Cli::try_parse_from(["hasse", "analyze", &file.path().display().to_string()])?;
/// let summary = run_cli(cli)?;
/// let Report::Analyze(report) = summary.report else {
///     unreachable!("analyze produces an analyze report");
/// };
/// assert_eq!(report.hasse_edges, vec![(0, 1)]);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    let summary = match cli.command {
        Command::Analyze(args) => {
            span.record("command", "analyze");
            run_analyze(&args)?
        }
        Command::Cluster(command) => {
            span.record("command", "cluster");
            run_cluster(&command)?
        }
        Command::Cover(CoverCommand::Greedy(args)) => {
            span.record("command", "cover greedy");
            run_greedy(&args)?
        }
        Command::Cover(CoverCommand::Exhaustive(args)) => {
            span.record("command", "cover exhaustive");
            run_exhaustive(&args)?
        }
        Command::Baseline(BaselineCommand::Density(args)) => {
            span.record("command", "baseline density");
            run_density(&args)?
        }
        Command::Baseline(BaselineCommand::Average(args)) => {
            span.record("command", "baseline average");
            run_average(&args)?
        }
    };
    info!(data_source = summary.data_source.as_str(), "command completed");
    Ok(summary)
}

#[instrument(
    name = "cli.prepare",
    err,
    skip(args, builder),
    fields(
        universe = %args.universe.display(),
        rule = field::Empty,
        entities = field::Empty,
    ),
)]
fn prepare(args: &PosetArgs, builder: HasseBuilder) -> Result<Prepared, CliError> {
    let hasse = builder
        .with_coverage_rule(args.rule.into())
        .with_execution_strategy(args.strategy.into())
        .build()?;
    let universe = load_universe(&args.universe)?;
    let entities = match &args.entities.entities {
        Some(path) => load_entities(path, args.entities.format, args.entities.strip_diagonal)?,
        None => Entities::Matrices(universe.clone()),
    };
    let span = Span::current();
    span.record("rule", field::debug(args.rule));
    span.record("entities", entities.source().name());
    let analysis = hasse.analyze_with_entities(&universe, entities.source())?;
    Ok(Prepared {
        hasse,
        universe,
        entities,
        analysis,
    })
}

#[instrument(
    name = "cli.load_entities",
    err,
    skip(path, format),
    fields(path = %path.display(), format = format.as_str()),
)]
pub(super) fn load_entities(
    path: &Path,
    format: EntityFormat,
    strip_diagonal: bool,
) -> Result<Entities, CliError> {
    let entities = match format {
        EntityFormat::Matrices => Entities::Matrices(load_universe(path)?),
        EntityFormat::Episodes => {
            let options = EpisodeOptions::new().with_strip_diagonal(strip_diagonal);
            Entities::Episodes(load_episodes(path, options)?)
        }
    };
    info!(entities = entities.source().len(), "entities loaded");
    Ok(entities)
}

fn run_analyze(args: &PosetArgs) -> Result<ExecutionSummary, CliError> {
    let prepared = prepare(args, HasseBuilder::new())?;
    Ok(ExecutionSummary {
        data_source: prepared.universe.name().to_owned(),
        report: Report::Analyze(AnalyzeReport::new(&prepared.analysis)),
    })
}

#[instrument(
    name = "cli.cluster",
    err,
    skip(command),
    fields(paths = field::Empty, iteration_cap = ?command.iteration_cap),
)]
fn run_cluster(command: &ClusterCommand) -> Result<ExecutionSummary, CliError> {
    let prepared = prepare(
        &command.poset,
        HasseBuilder::new().with_iteration_cap(command.iteration_cap),
    )?;
    let reduced = prepared.analysis.reduced();
    let span = Span::current();
    let paths = match &command.paths {
        Some(path) => {
            span.record("paths", "table");
            Some(load_path_table(reduced, path)?)
        }
        None if command.undirected => {
            span.record("paths", "undirected");
            Some(prepared.analysis.shortest_paths(GraphView::Undirected))
        }
        None => {
            span.record("paths", "directed");
            None
        }
    };
    let clustering = prepared.hasse.cluster(&prepared.analysis, paths.as_ref())?;
    let report = ClusterReport::new(&clustering, prepared.entities.episodes())?;
    Ok(ExecutionSummary {
        data_source: prepared.universe.name().to_owned(),
        report: Report::Cluster(report),
    })
}

fn excluded(args: &CoverArgs, analysis: &PosetAnalysis) -> Result<Vec<NodeId>, CliError> {
    let node_count = analysis.reduced().node_count();
    if let Some(&node) = args.exclude.iter().find(|&&node| node >= node_count) {
        warn!(node, node_count, "excluded node is not in the poset");
        return Err(HasseError::UnknownNode { node, node_count }.into());
    }
    let mut nodes: Vec<NodeId> = args.exclude.iter().copied().map(NodeId::new).collect();
    if args.exclude_universal {
        nodes.extend(analysis.index().universal_nodes());
    }
    nodes.sort_unstable();
    nodes.dedup();
    Ok(nodes)
}

fn run_greedy(args: &CoverArgs) -> Result<ExecutionSummary, CliError> {
    let prepared = prepare(&args.poset, HasseBuilder::new())?;
    let excluded = excluded(args, &prepared.analysis)?;
    let cover = prepared
        .hasse
        .greedy_cover(&prepared.analysis, args.fraction, &excluded)?;
    Ok(ExecutionSummary {
        data_source: prepared.universe.name().to_owned(),
        report: Report::Greedy(GreedyReport::new(&cover)),
    })
}

fn run_exhaustive(args: &ExhaustiveArgs) -> Result<ExecutionSummary, CliError> {
    let prepared = prepare(&args.cover.poset, HasseBuilder::new())?;
    let excluded = excluded(&args.cover, &prepared.analysis)?;
    let search = ExhaustiveSearch::new(args.max_size)
        .with_combination_limit(Some(u128::from(args.limit)))
        .with_antichains_only(args.antichains)
        .with_minimal_only(args.minimal);
    let cover = prepared.hasse.exhaustive_cover(
        &prepared.analysis,
        args.cover.fraction,
        &excluded,
        &search,
    )?;
    Ok(ExecutionSummary {
        data_source: prepared.universe.name().to_owned(),
        report: Report::Exhaustive(ExhaustiveReport::new(&cover)),
    })
}

fn run_density(args: &DensityArgs) -> Result<ExecutionSummary, CliError> {
    let input = &args.input;
    let entities = load_entities(&input.input, input.format, input.strip_diagonal)?;
    let clustering = DensityClusterer::new(args.eps, args.min_samples)?
        .with_execution_strategy(input.strategy.into())
        .cluster(entities.source())?;
    let report = DensityReport::new(
        &clustering,
        args.eps,
        args.min_samples.get(),
        entities.episodes(),
    )?;
    Ok(ExecutionSummary {
        data_source: entities.source().name().to_owned(),
        report: Report::Density(report),
    })
}

fn run_average(args: &AverageArgs) -> Result<ExecutionSummary, CliError> {
    let input = &args.input;
    let entities = load_entities(&input.input, input.format, input.strip_diagonal)?;
    let dendrogram = AverageLinkage::new()
        .with_execution_strategy(input.strategy.into())
        .linkage(entities.source())?;
    let flat = dendrogram.cut(args.cut_height)?;
    let report = AverageReport::new(&dendrogram, &flat, args.cut_height, entities.episodes())?;
    Ok(ExecutionSummary {
        data_source: entities.source().name().to_owned(),
        report: Report::Average(report),
    })
}
