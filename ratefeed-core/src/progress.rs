//! Human-readable progress for a refresh run.
//!
//! Diagnostics go through `tracing`; this trait only drives the progress and
//! summary lines a person reads on stdout.

use crate::currency::CurrencyCode;
use crate::driver::{Pipeline, PipelineResult, RunOutcome};
use crate::fetch::FetchError;

/// Callbacks fired by the driver as a run advances.
pub trait RefreshProgress {
    /// Called before a pipeline starts fetching.
    fn on_phase_start(&self, pipeline: Pipeline);

    /// Called once per currency code with the rounded price or the failure.
    fn on_quote(&self, code: CurrencyCode, result: &Result<f64, FetchError>);

    /// Called when a pipeline finishes, successfully or not.
    fn on_pipeline_complete(&self, pipeline: Pipeline, result: &PipelineResult);

    /// Called once after both pipelines.
    fn on_summary(&self, outcome: &RunOutcome);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl RefreshProgress for StdoutProgress {
    fn on_phase_start(&self, pipeline: Pipeline) {
        match pipeline {
            Pipeline::Currency => println!("Fetching currencies..."),
            Pipeline::Bond => println!("Fetching bond yield..."),
        }
    }

    fn on_quote(&self, code: CurrencyCode, result: &Result<f64, FetchError>) {
        match result {
            Ok(price) => println!("  OK: {code} {price}"),
            Err(e) => println!("  FAIL: {code}: {e}"),
        }
    }

    fn on_pipeline_complete(&self, pipeline: Pipeline, result: &PipelineResult) {
        match result {
            Ok(report) => println!("Updated {}", report.path.display()),
            Err(e) => println!("{pipeline} update skipped: {e}"),
        }
    }

    fn on_summary(&self, outcome: &RunOutcome) {
        println!();
        print!("{}", format_summary(outcome));
    }
}

/// The closing summary block, one line per pipeline.
pub fn format_summary(outcome: &RunOutcome) -> String {
    let status = |ok: bool| if ok { "SUCCESS" } else { "FAILED" };
    format!(
        "=== Refresh Result ===\n{:<10}{}\n{:<10}{}\n",
        format!("{}:", Pipeline::Currency),
        status(outcome.currency),
        format!("{}:", Pipeline::Bond),
        status(outcome.bond),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Captures callbacks for assertions.
    #[derive(Default)]
    pub(crate) struct RecordingProgress {
        pub phases: RefCell<Vec<Pipeline>>,
        pub quotes: RefCell<Vec<(CurrencyCode, bool)>>,
        pub completed: RefCell<Vec<(Pipeline, bool)>>,
        pub summary: RefCell<Option<RunOutcome>>,
    }

    impl RefreshProgress for RecordingProgress {
        fn on_phase_start(&self, pipeline: Pipeline) {
            self.phases.borrow_mut().push(pipeline);
        }

        fn on_quote(&self, code: CurrencyCode, result: &Result<f64, FetchError>) {
            self.quotes.borrow_mut().push((code, result.is_ok()));
        }

        fn on_pipeline_complete(&self, pipeline: Pipeline, result: &PipelineResult) {
            self.completed.borrow_mut().push((pipeline, result.is_ok()));
        }

        fn on_summary(&self, outcome: &RunOutcome) {
            *self.summary.borrow_mut() = Some(*outcome);
        }
    }

    #[test]
    fn summary_names_each_pipeline() {
        let summary = format_summary(&RunOutcome {
            currency: false,
            bond: true,
        });
        assert_eq!(
            summary,
            "=== Refresh Result ===\nCurrency: FAILED\nBond:     SUCCESS\n"
        );
    }
}
