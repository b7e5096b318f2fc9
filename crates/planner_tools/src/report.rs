//! Human readable transcripts and JSON reports of runs.

use std::fmt::Write as _;

use planner_core::math::format_clock;
use planner_core::optimize::{OptimizeReport, TargetLog};
use planner_core::race::Race;
use planner_core::simulation::BuildOrderRun;
use planner_core::timeline::Event;
use serde::Serialize;

use crate::error::Result;

/// Time-stamped transcript of a run, one line per event.
///
/// ```text
///  0:00  12  SCV
///  0:12  13  SCV
/// ```
#[must_use]
pub fn transcript(run: &BuildOrderRun) -> String {
    let mut out = String::new();
    for event in &run.events {
        let _ = writeln!(
            out,
            "{:>5}  {:>3}  {}",
            format_clock(event.start),
            event.supply,
            event.name
        );
    }
    match &run.error {
        Some(error) => {
            let _ = writeln!(out, "error: {error}");
        }
        None => {
            let _ = writeln!(out, "done at {}", run.clock());
        }
    }
    out
}

/// Optimizer log lines followed by the transcript of the result.
#[must_use]
pub fn optimize_summary(report: &OptimizeReport) -> String {
    let mut out = String::new();
    for log in &report.logs {
        let _ = writeln!(out, "{log}");
    }
    if !report.complete {
        let _ = writeln!(out, "search cancelled after {} evaluations", report.evaluations);
    }
    out.push('\n');
    out.push_str(&transcript(&report.run));
    out
}

/// JSON report of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    /// Race.
    pub race: Race,
    /// Terminal frame.
    pub frame: u32,
    /// Terminal game clock.
    pub clock: String,
    /// Whether every action executed.
    pub valid: bool,
    /// Error message of the failing action.
    pub error: Option<String>,
    /// Timeline.
    pub events: &'a [Event],
    /// Optimizer log lines, when the run came from the optimizer.
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub logs: &'a [TargetLog],
}

impl<'a> RunReport<'a> {
    /// Report of a plain simulation.
    #[must_use]
    pub fn new(run: &'a BuildOrderRun) -> Self {
        Self {
            race: run.race,
            frame: run.frame,
            clock: run.clock(),
            valid: run.is_valid(),
            error: run.error.as_ref().map(ToString::to_string),
            events: &run.events,
            logs: &[],
        }
    }

    /// Report of an optimizer result.
    #[must_use]
    pub fn optimized(report: &'a OptimizeReport) -> Self {
        Self {
            logs: &report.logs,
            ..Self::new(&report.run)
        }
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_core::optimize::{Optimizer, Target, Unbounded};
    use planner_test_utils::fixtures::{build_order, terran_logic};

    #[test]
    fn test_transcript_lines() {
        let logic = terran_logic();
        let run = logic.simulated_build_order(&build_order(&logic, &["SCV", "SupplyDepot"]));
        let text = transcript(&run);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], " 0:00   12  SCV");
        assert!(lines[1].ends_with("SupplyDepot"));
        assert!(lines[2].starts_with("done at "));
    }

    #[test]
    fn test_transcript_reports_error() {
        let logic = terran_logic();
        let run = logic.simulated_build_order(&build_order(&logic, &["Marine"]));
        let text = transcript(&run);
        assert!(text.lines().last().unwrap().starts_with("error: "));
    }

    #[test]
    fn test_json_report() {
        let logic = terran_logic();
        let run = logic.simulated_build_order(&build_order(&logic, &["SCV"]));
        let json = RunReport::new(&run).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["valid"], true);
        assert_eq!(value["events"][0]["name"], "SCV");
        assert!(value.get("logs").is_none());
    }

    #[test]
    fn test_optimize_summary_lists_targets() {
        let logic = terran_logic();
        let actions = build_order(&logic, &["SCV", "SupplyDepot"]);
        let report = Optimizer::new(&logic).optimize(&actions, &[Target::Fastest], &[], &mut Unbounded);
        let text = optimize_summary(&report);
        assert!(text.starts_with("fastest: "));

        let json = RunReport::optimized(&report).to_json().unwrap();
        assert!(json.contains("\"logs\""));
    }
}
