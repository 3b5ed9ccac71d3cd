//! Command reports and their text and JSON renderings.

use std::io::{self, Write};

use hasse_core::{
    ClusterId, ClusteringResult, CoverageCombo, Dendrogram, DensityClustering, EntityId,
    EpisodeFamily, ExhaustiveCover, GraphClustering, GreedyCover, HasseError, NodeId,
    PosetAnalysis, RelationMatrix,
};
use serde::Serialize;

/// How [`render_summary`] formats a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned, human-readable text.
    #[default]
    Text,
    /// A single pretty-printed JSON document.
    Json,
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    /// Name of the universe or entity source the command read.
    pub data_source: String,
    /// Command-specific results.
    pub report: Report,
}

/// Results of one command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Report {
    /// Output of `hasse analyze`.
    Analyze(AnalyzeReport),
    /// Output of `hasse cluster`.
    Cluster(ClusterReport),
    /// Output of `hasse cover greedy`.
    Greedy(GreedyReport),
    /// Output of `hasse cover exhaustive`.
    Exhaustive(ExhaustiveReport),
    /// Output of `hasse baseline density`.
    Density(DensityReport),
    /// Output of `hasse baseline average`.
    Average(AverageReport),
}

/// Shape of the poset and per-node coverage.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeReport {
    /// Distinct matrices in the universe.
    pub nodes: usize,
    /// Edges of the full dominance graph.
    pub dominance_edges: usize,
    /// Edges of the Hasse diagram.
    pub hasse_edges: Vec<(usize, usize)>,
    /// Nodes with no incoming Hasse edge.
    pub roots: Vec<usize>,
    /// Entities attached to the poset.
    pub entities: usize,
    /// Nodes that cover every entity.
    pub universal: Vec<usize>,
    /// Coverage statistics, one row per node.
    pub stats: Vec<NodeRow>,
}

/// Coverage statistics of one node.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NodeRow {
    /// Node identifier.
    pub node: usize,
    /// Entities matched directly to the node.
    pub direct: usize,
    /// Entities covered by the node.
    pub covered: usize,
    /// Nodes strictly below the node.
    pub descendants: usize,
}

impl AnalyzeReport {
    pub(super) fn new(analysis: &PosetAnalysis) -> Self {
        let reduced = analysis.reduced();
        let index = analysis.index();
        Self {
            nodes: reduced.node_count(),
            dominance_edges: analysis.dominance().edge_count(),
            hasse_edges: reduced
                .edges()
                .into_iter()
                .map(|(from, to)| (from.get(), to.get()))
                .collect(),
            roots: ids(reduced.roots()),
            entities: index.entity_count(),
            universal: ids(index.universal_nodes()),
            stats: index
                .node_stats()
                .into_iter()
                .map(|stats| NodeRow {
                    node: stats.node.get(),
                    direct: stats.direct,
                    covered: stats.covered,
                    descendants: stats.descendants,
                })
                .collect(),
        }
    }
}

/// Merge history and final clusters of graph-distance clustering.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    /// Stable code describing why merging stopped.
    pub status: &'static str,
    /// Merge steps in order.
    pub merges: Vec<MergeRow>,
    /// Clusters active when merging stopped.
    pub clusters: Vec<ClusterRow>,
    /// Final cluster label of every entity, numbered by first appearance.
    pub labels: Vec<u64>,
}

/// One merge of graph-distance clustering.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MergeRow {
    /// Lower cluster identifier.
    pub left: u64,
    /// Higher cluster identifier.
    pub right: u64,
    /// Bridge distance.
    pub distance: u32,
    /// Entities in the merged cluster.
    pub size: usize,
    /// Node representing the merged cluster.
    pub representative: usize,
}

/// One final cluster.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterRow {
    /// Cluster identifier.
    pub id: u64,
    /// Representative node, when the clusterer tracks one.
    pub representative: Option<usize>,
    /// Member entities in ascending order.
    pub members: Vec<usize>,
    /// Consensus relation of the members, for episode inputs.
    pub consensus: Option<Vec<Vec<u32>>>,
}

impl ClusterReport {
    pub(super) fn new(
        clustering: &GraphClustering,
        episodes: Option<&EpisodeFamily>,
    ) -> Result<Self, HasseError> {
        let merges = clustering
            .linkage()
            .iter()
            .map(|record| MergeRow {
                left: record.left.get(),
                right: record.right.get(),
                distance: record.distance,
                size: record.size,
                representative: record.representative.get(),
            })
            .collect();
        let clusters = clustering
            .active()
            .map(|record| {
                cluster_row(record.id(), Some(record.representative()), record.members(), episodes)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            status: clustering.status().as_str(),
            merges,
            clusters,
            labels: labels(&clustering.assignments()),
        })
    }
}

/// Greedy set-cover picks.
#[derive(Debug, Clone, Serialize)]
pub struct GreedyReport {
    /// Stable code describing whether the target was met.
    pub status: &'static str,
    /// Entities the cover was measured against.
    pub universe: usize,
    /// Entities the cover had to reach.
    pub min_required: usize,
    /// Picks in order.
    pub steps: Vec<GreedyRow>,
    /// Final covered share of the universe.
    pub share: f64,
}

/// One greedy pick.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GreedyRow {
    /// Chosen node.
    pub node: usize,
    /// Entities newly covered.
    pub gained: usize,
    /// Entities covered so far.
    pub covered: usize,
    /// `covered` as a share of the universe.
    pub share: f64,
}

impl GreedyReport {
    pub(super) fn new(cover: &GreedyCover) -> Self {
        Self {
            status: cover.status().as_str(),
            universe: cover.target().universe(),
            min_required: cover.target().min_required(),
            steps: cover
                .steps()
                .iter()
                .map(|step| GreedyRow {
                    node: step.node.get(),
                    gained: step.gained,
                    covered: step.covered,
                    share: step.share,
                })
                .collect(),
            share: cover.share(),
        }
    }
}

/// Qualifying and best combinations of an exhaustive search.
#[derive(Debug, Clone, Serialize)]
pub struct ExhaustiveReport {
    /// Stable code describing whether anything qualified.
    pub status: &'static str,
    /// Entities the search had to reach.
    pub min_required: usize,
    /// Combinations enumerated.
    pub searched: u128,
    /// Qualifying combinations by size, then lexicographically.
    pub qualified: Vec<ComboRow>,
    /// Generalization edges between positions in `qualified`.
    pub generalizations: Vec<(usize, usize)>,
    /// Qualifying combinations nothing else generalizes.
    pub best: Vec<ComboRow>,
}

/// One combination of nodes with its coverage.
#[derive(Debug, Clone, Serialize)]
pub struct ComboRow {
    /// Member nodes in ascending order.
    pub nodes: Vec<usize>,
    /// Entities covered by the union.
    pub covered: usize,
}

impl ExhaustiveReport {
    pub(super) fn new(cover: &ExhaustiveCover) -> Self {
        let row = |combo: &CoverageCombo| ComboRow {
            nodes: combo.nodes().iter().map(|node| node.get()).collect(),
            covered: combo.covered(),
        };
        Self {
            status: cover.status().as_str(),
            min_required: cover.target().min_required(),
            searched: cover.searched(),
            qualified: cover.qualified().iter().map(row).collect(),
            generalizations: cover.generalizations().to_vec(),
            best: cover.best().map(row).collect(),
        }
    }
}

/// Density-based clusters of flattened matrices.
#[derive(Debug, Clone, Serialize)]
pub struct DensityReport {
    /// Neighbourhood radius used.
    pub eps: f64,
    /// Core-point threshold used.
    pub min_samples: usize,
    /// Label of every entity; `None` marks noise.
    pub labels: Vec<Option<u64>>,
    /// Noise entities.
    pub noise: Vec<usize>,
    /// Clusters with their members.
    pub clusters: Vec<ClusterRow>,
}

impl DensityReport {
    pub(super) fn new(
        clustering: &DensityClustering,
        eps: f64,
        min_samples: usize,
        episodes: Option<&EpisodeFamily>,
    ) -> Result<Self, HasseError> {
        let clusters = (0..clustering.cluster_count())
            .map(|id| {
                let id = ClusterId::new(id as u64);
                cluster_row(id, None, &clustering.members(id), episodes)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            eps,
            min_samples,
            labels: clustering
                .labels()
                .iter()
                .map(|label| label.map(ClusterId::get))
                .collect(),
            noise: clustering.noise().iter().map(|entity| entity.get()).collect(),
            clusters,
        })
    }
}

/// Average-linkage dendrogram cut into flat clusters.
#[derive(Debug, Clone, Serialize)]
pub struct AverageReport {
    /// Height the dendrogram was cut at.
    pub cut_height: f64,
    /// Agglomeration steps in order.
    pub steps: Vec<StepRow>,
    /// Flat label of every entity.
    pub labels: Vec<u64>,
    /// Flat clusters with their members.
    pub clusters: Vec<ClusterRow>,
}

/// One agglomeration step.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StepRow {
    /// Lower identifier of the merged pair.
    pub left: usize,
    /// Higher identifier of the merged pair.
    pub right: usize,
    /// Average distance between the pair.
    pub height: f64,
    /// Points in the merged cluster.
    pub size: usize,
}

impl AverageReport {
    pub(super) fn new(
        dendrogram: &Dendrogram,
        flat: &ClusteringResult,
        cut_height: f64,
        episodes: Option<&EpisodeFamily>,
    ) -> Result<Self, HasseError> {
        let clusters = (0..flat.cluster_count())
            .map(|id| {
                let id = ClusterId::new(id as u64);
                cluster_row(id, None, &flat.members(id), episodes)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            cut_height,
            steps: dendrogram
                .steps()
                .iter()
                .map(|step| StepRow {
                    left: step.left,
                    right: step.right,
                    height: step.height,
                    size: step.size,
                })
                .collect(),
            labels: labels(flat),
            clusters,
        })
    }
}

fn ids(nodes: Vec<NodeId>) -> Vec<usize> {
    nodes.into_iter().map(NodeId::get).collect()
}

fn labels(result: &ClusteringResult) -> Vec<u64> {
    result.assignments().iter().map(|id| id.get()).collect()
}

fn cluster_row(
    id: ClusterId,
    representative: Option<NodeId>,
    members: &[EntityId],
    episodes: Option<&EpisodeFamily>,
) -> Result<ClusterRow, HasseError> {
    let mut members: Vec<usize> = members.iter().map(|entity| entity.get()).collect();
    members.sort_unstable();
    let consensus = match episodes {
        Some(family) if !members.is_empty() => Some(to_rows(
            &family.consensus(members.iter().copied())?,
        )),
        _ => None,
    };
    Ok(ClusterRow {
        id: id.get(),
        representative: representative.map(NodeId::get),
        members,
        consensus,
    })
}

fn to_rows(matrix: &RelationMatrix) -> Vec<Vec<u32>> {
    matrix.rows().map(<[u32]>::to_vec).collect()
}

/// Renders `summary` to `writer`.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use hasse_cli::cli::{
/// #     ExecutionSummary, GreedyReport, OutputFormat, Report, render_summary,
/// # };
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     data_source: "demo".into(),
///     report: Report::Greedy(GreedyReport {
///         status: "SATISFIED",
///         universe: 4,
///         min_required: 3,
///         steps: Vec::new(),
///         share: 0.0,
///     }),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, OutputFormat::Json, &mut buffer)?;
/// let value: serde_json::Value = serde_json::from_slice(&buffer)?;
/// assert_eq!(value["report"]["command"], "greedy");
/// # Ok(())
/// # }
/// ```
pub fn render_summary(
    summary: &ExecutionSummary,
    format: OutputFormat,
    mut writer: impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, summary)?;
            writeln!(writer)
        }
        OutputFormat::Text => {
            writeln!(writer, "data source: {}", summary.data_source)?;
            match &summary.report {
                Report::Analyze(report) => render_analyze(report, writer),
                Report::Cluster(report) => render_cluster(report, writer),
                Report::Greedy(report) => render_greedy(report, writer),
                Report::Exhaustive(report) => render_exhaustive(report, writer),
                Report::Density(report) => render_density(report, writer),
                Report::Average(report) => render_average(report, writer),
            }
        }
    }
}

fn render_analyze(report: &AnalyzeReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "nodes: {}", report.nodes)?;
    writeln!(writer, "dominance edges: {}", report.dominance_edges)?;
    writeln!(writer, "hasse edges: {}", report.hasse_edges.len())?;
    for (from, to) in &report.hasse_edges {
        writeln!(writer, "  {from} -> {to}")?;
    }
    writeln!(writer, "roots: {}", join(&report.roots))?;
    writeln!(writer, "entities: {}", report.entities)?;
    writeln!(writer, "universal nodes: {}", join(&report.universal))?;
    writeln!(writer, "node\tdirect\tcovered\tdescendants")?;
    for row in &report.stats {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            row.node, row.direct, row.covered, row.descendants
        )?;
    }
    Ok(())
}

fn render_cluster(report: &ClusterReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "status: {}", report.status)?;
    writeln!(writer, "merges: {}", report.merges.len())?;
    for merge in &report.merges {
        writeln!(
            writer,
            "  {} + {} at {} -> size {} (node {})",
            merge.left, merge.right, merge.distance, merge.size, merge.representative
        )?;
    }
    render_clusters(&report.clusters, &mut writer)?;
    writeln!(writer, "labels: {}", join(&report.labels))
}

fn render_greedy(report: &GreedyReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "status: {}", report.status)?;
    writeln!(
        writer,
        "target: {} of {} entities",
        report.min_required, report.universe
    )?;
    writeln!(writer, "node\tgained\tcovered\tshare")?;
    for step in &report.steps {
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.4}",
            step.node, step.gained, step.covered, step.share
        )?;
    }
    writeln!(writer, "share: {:.4}", report.share)
}

fn render_exhaustive(report: &ExhaustiveReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "status: {}", report.status)?;
    writeln!(writer, "target: {} entities", report.min_required)?;
    writeln!(writer, "searched: {}", report.searched)?;
    writeln!(writer, "qualified: {}", report.qualified.len())?;
    writeln!(writer, "best: {}", report.best.len())?;
    for combo in &report.best {
        writeln!(writer, "  [{}] covers {}", join(&combo.nodes), combo.covered)?;
    }
    Ok(())
}

fn render_density(report: &DensityReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(
        writer,
        "eps: {} min samples: {}",
        report.eps, report.min_samples
    )?;
    render_clusters(&report.clusters, &mut writer)?;
    writeln!(writer, "noise: {}", join(&report.noise))
}

fn render_average(report: &AverageReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "cut height: {}", report.cut_height)?;
    writeln!(writer, "steps: {}", report.steps.len())?;
    for step in &report.steps {
        writeln!(
            writer,
            "  {} + {} at {:.4} -> size {}",
            step.left, step.right, step.height, step.size
        )?;
    }
    render_clusters(&report.clusters, &mut writer)?;
    writeln!(writer, "labels: {}", join(&report.labels))
}

fn render_clusters(clusters: &[ClusterRow], mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "clusters: {}", clusters.len())?;
    for cluster in clusters {
        match cluster.representative {
            Some(node) => writeln!(
                writer,
                "  {} (node {node}): {}",
                cluster.id,
                join(&cluster.members)
            )?,
            None => writeln!(writer, "  {}: {}", cluster.id, join(&cluster.members))?,
        }
        for row in cluster.consensus.iter().flatten() {
            writeln!(writer, "    {}", join(row))?;
        }
    }
    Ok(())
}

fn join<T: ToString>(values: &[T]) -> String {
    if values.is_empty() {
        return "-".to_owned();
    }
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
