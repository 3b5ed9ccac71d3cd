//! Structural invariants of dominance graphs and their reductions.
//!
//! - **Antisymmetry**: deduplication leaves no 2-cycles and no self-loops.
//! - **Soundness**: every dominance edge joins a dominating matrix to a
//!   dominated one, and every dominated pair has an edge.
//! - **Idempotence**: reducing a reduced graph changes nothing.
//! - **Closure preservation**: reduction never changes a descendant set.
//! - **Reflexivity**: every node reaches itself.

use proptest::test_runner::{TestCaseError, TestCaseResult};

use crate::{
    ExecutionStrategy, MatrixFamily, PosetGraph, PosetGraphBuilder, ReachabilityIndex,
    TransitiveReducer,
};

use super::types::PosetFixture;

fn build(fixture: &PosetFixture, strategy: ExecutionStrategy) -> Result<PosetGraph, TestCaseError> {
    let family = MatrixFamily::try_new("property", fixture.matrices.clone())
        .map_err(|e| TestCaseError::fail(format!("fixture family invalid: {e}")))?;
    PosetGraphBuilder::new()
        .with_execution_strategy(strategy)
        .build(&family)
        .map_err(|e| {
            TestCaseError::fail(format!(
                "build failed: {e} (shape={:?}, matrices={})",
                fixture.shape,
                fixture.matrices.len(),
            ))
        })
}

fn reduce(graph: &PosetGraph) -> Result<PosetGraph, TestCaseError> {
    TransitiveReducer::new()
        .reduce(graph)
        .map_err(|e| TestCaseError::fail(format!("reduction failed: {e}")))
}

/// Runs every structural check for `fixture`.
pub(super) fn run_structural_property(fixture: &PosetFixture) -> TestCaseResult {
    let graph = build(fixture, ExecutionStrategy::Auto)?;
    validate_antisymmetry(&graph)?;
    validate_dominance_soundness(&graph)?;

    let reduced = reduce(&graph)?;
    let twice = reduce(&reduced)?;
    if reduced.edges() != twice.edges() {
        return Err(TestCaseError::fail(format!(
            "reduction not idempotent: {} edges became {}",
            reduced.edge_count(),
            twice.edge_count(),
        )));
    }

    let full = ReachabilityIndex::new(&graph);
    let hasse = ReachabilityIndex::new(&reduced);
    for node in graph.nodes() {
        if !hasse.reaches(node, node) {
            return Err(TestCaseError::fail(format!("node {node} does not reach itself")));
        }
        if full.closed_descendants(node) != hasse.closed_descendants(node) {
            return Err(TestCaseError::fail(format!(
                "descendants of node {node} changed under reduction"
            )));
        }
    }
    Ok(())
}

/// Sequential and automatic scheduling must agree edge for edge.
pub(super) fn run_strategy_agreement_property(fixture: &PosetFixture) -> TestCaseResult {
    let sequential = build(fixture, ExecutionStrategy::Sequential)?;
    let auto = build(fixture, ExecutionStrategy::Auto)?;
    if sequential.edges() != auto.edges() {
        return Err(TestCaseError::fail(format!(
            "edge sets differ between strategies (shape={:?})",
            fixture.shape
        )));
    }
    Ok(())
}

fn validate_antisymmetry(graph: &PosetGraph) -> TestCaseResult {
    for (from, to) in graph.edges() {
        if from == to {
            return Err(TestCaseError::fail(format!("self-loop at node {from}")));
        }
        if graph.has_edge(to, from) {
            return Err(TestCaseError::fail(format!(
                "2-cycle between nodes {from} and {to}"
            )));
        }
    }
    Ok(())
}

fn validate_dominance_soundness(graph: &PosetGraph) -> TestCaseResult {
    for a in graph.nodes() {
        for b in graph.nodes() {
            if a == b {
                continue;
            }
            let (Some(ma), Some(mb)) = (graph.matrix(a), graph.matrix(b)) else {
                return Err(TestCaseError::fail("node without matrix"));
            };
            if ma.dominates(mb) != graph.has_edge(a, b) {
                return Err(TestCaseError::fail(format!(
                    "edge {a} -> {b} disagrees with dominance ({})",
                    ma.dominates(mb)
                )));
            }
        }
    }
    Ok(())
}
