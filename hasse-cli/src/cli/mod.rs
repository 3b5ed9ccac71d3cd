//! Command-line interface for the hasse analysis pipeline.
//!
//! Commands load a universe of relation matrices (and optionally a separate
//! entity file) through the JSON provider, run one stage of the core library
//! and return a report that renders as text or JSON.

mod commands;
mod report;

pub use commands::{
    AverageArgs, BaselineCommand, BaselineInput, Cli, CliError, ClusterCommand, Command,
    CoverArgs, CoverCommand, DensityArgs, EntityArgs, EntityFormat, ExhaustiveArgs, PosetArgs,
    RuleArg, StrategyArg, run_cli,
};
pub use report::{
    AnalyzeReport, AverageReport, ClusterReport, ClusterRow, ComboRow, DensityReport,
    ExecutionSummary, ExhaustiveReport, GreedyReport, GreedyRow, MergeRow, NodeRow, OutputFormat,
    Report, StepRow, render_summary,
};

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;
