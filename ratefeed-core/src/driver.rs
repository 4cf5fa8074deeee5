//! Refresh driver: currency pipeline, then bond pipeline, then summary.
//!
//! The two pipelines share nothing but the configuration. Each one is run
//! under a guard that turns any error or panic into a FAILED status, so one
//! failing never stops the other.

use chrono::{DateTime, Utc};
use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Once;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::RefreshConfig;
use crate::fetch::{fetch_rates, fetch_yield, FetchError, QuoteSource, YieldSource};
use crate::patch::{
    inspect_bond_file, inspect_currency_file, patch_bond_file, patch_currency_file,
    ArtifactStatus, PatchError, PatchOutcome, PatchReport,
};
use crate::progress::RefreshProgress;

/// One fetch-then-patch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Currency,
    Bond,
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pipeline::Currency => f.write_str("Currency"),
            Pipeline::Bond => f.write_str("Bond"),
        }
    }
}

/// Why a pipeline did not update its artifact.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no currency rates fetched")]
    NoRates,

    #[error("no bond yield fetched")]
    NoYield,

    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] FetchError),

    #[error("artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("pipeline panicked: {0}")]
    Panicked(String),
}

pub type PipelineResult = Result<PatchReport, RefreshError>;

/// Independent success flags, combined only for the summary and exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub currency: bool,
    pub bond: bool,
}

impl RunOutcome {
    pub fn all_failed(&self) -> bool {
        !self.currency && !self.bond
    }

    /// 0 if at least one pipeline succeeded, 1 if both failed.
    pub fn exit_code(&self) -> u8 {
        if self.all_failed() {
            1
        } else {
            0
        }
    }
}

/// Fetch all configured rates and patch the currency page.
///
/// An empty mapping never reaches the patcher, so a total outage leaves the
/// page as it was.
pub fn run_currency_pipeline(
    config: &RefreshConfig,
    quotes: &dyn QuoteSource,
    progress: &dyn RefreshProgress,
    now: DateTime<Utc>,
) -> PipelineResult {
    let rates = fetch_rates(quotes, &config.currencies, progress);
    if rates.is_empty() {
        return Err(RefreshError::NoRates);
    }

    match patch_currency_file(&config.currency_file, &rates, now)? {
        PatchOutcome::Updated(report) => Ok(report),
        PatchOutcome::Missing => Err(RefreshError::MissingArtifact(config.currency_file.clone())),
    }
}

/// Fetch the latest yield and patch the bond page.
pub fn run_bond_pipeline(
    config: &RefreshConfig,
    yields: &dyn YieldSource,
    now: DateTime<Utc>,
) -> PipelineResult {
    let value = fetch_yield(yields).ok_or(RefreshError::NoYield)?;

    match patch_bond_file(&config.bond_file, value, now)? {
        PatchOutcome::Updated(report) => Ok(report),
        PatchOutcome::Missing => Err(RefreshError::MissingArtifact(config.bond_file.clone())),
    }
}

/// Run both pipelines in order against ready-made sources.
pub fn run_refresh(
    config: &RefreshConfig,
    quotes: &dyn QuoteSource,
    yields: &dyn YieldSource,
    progress: &dyn RefreshProgress,
    now: DateTime<Utc>,
) -> RunOutcome {
    run_refresh_with(config, |_| Ok(quotes), |_| Ok(yields), progress, now)
}

/// Run both pipelines in order, building each source inside its own pipeline.
///
/// A source that fails to build fails only the pipeline that needs it.
pub fn run_refresh_with<Q, Y, CQ, CY>(
    config: &RefreshConfig,
    connect_quotes: CQ,
    connect_yields: CY,
    progress: &dyn RefreshProgress,
    now: DateTime<Utc>,
) -> RunOutcome
where
    Q: QuoteSource,
    Y: YieldSource,
    CQ: FnOnce(&RefreshConfig) -> Result<Q, FetchError>,
    CY: FnOnce(&RefreshConfig) -> Result<Y, FetchError>,
{
    progress.on_phase_start(Pipeline::Currency);
    let currency = guarded(Pipeline::Currency, progress, || {
        let quotes = connect_quotes(config)?;
        run_currency_pipeline(config, &quotes, progress, now)
    });

    progress.on_phase_start(Pipeline::Bond);
    let bond = guarded(Pipeline::Bond, progress, || {
        let yields = connect_yields(config)?;
        run_bond_pipeline(config, &yields, now)
    });

    let outcome = RunOutcome { currency, bond };
    progress.on_summary(&outcome);
    outcome
}

/// Marker status of both artifacts, read-only.
pub fn inspect_artifacts(
    config: &RefreshConfig,
) -> Result<Vec<(Pipeline, PathBuf, ArtifactStatus)>, PatchError> {
    Ok(vec![
        (
            Pipeline::Currency,
            config.currency_file.clone(),
            inspect_currency_file(&config.currency_file)?,
        ),
        (
            Pipeline::Bond,
            config.bond_file.clone(),
            inspect_bond_file(&config.bond_file)?,
        ),
    ])
}

thread_local! {
    static IN_GUARD: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

// Panics inside a guarded pipeline go to the log; all others reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_GUARD.with(Cell::get) {
                debug!(panic = %info, "guarded pipeline panicked");
            } else {
                default_hook(info);
            }
        }));
    });
}

fn guarded<F>(pipeline: Pipeline, progress: &dyn RefreshProgress, run: F) -> bool
where
    F: FnOnce() -> PipelineResult,
{
    install_quiet_hook();
    IN_GUARD.with(|g| g.set(true));
    let caught = panic::catch_unwind(AssertUnwindSafe(run));
    IN_GUARD.with(|g| g.set(false));

    let result = caught
        .unwrap_or_else(|payload| Err(RefreshError::Panicked(panic_message(payload.as_ref()))));

    if let Err(e) = &result {
        error!(%pipeline, error = %e, "pipeline failed");
    }
    progress.on_pipeline_complete(pipeline, &result);
    result.is_ok()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyCode;
    use crate::fetch::FetchError;
    use crate::progress::tests::RecordingProgress;
    use chrono::TimeZone;
    use std::fs;

    struct NoQuotes;

    impl QuoteSource for NoQuotes {
        fn name(&self) -> &str {
            "none"
        }

        fn quote(&self, code: CurrencyCode) -> Result<f64, FetchError> {
            Err(FetchError::NetworkUnreachable(format!("offline ({code})")))
        }
    }

    struct PanickingQuotes;

    impl QuoteSource for PanickingQuotes {
        fn name(&self) -> &str {
            "panicking"
        }

        fn quote(&self, _code: CurrencyCode) -> Result<f64, FetchError> {
            panic!("quote source exploded")
        }
    }

    struct FixedYield(f64);

    impl YieldSource for FixedYield {
        fn name(&self) -> &str {
            "fixed"
        }

        fn latest_yield(&self) -> Result<f64, FetchError> {
            Ok(self.0)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 7, 15, 5, 0).unwrap()
    }

    fn config_in(dir: &std::path::Path) -> RefreshConfig {
        RefreshConfig::default().rooted_at(dir)
    }

    #[test]
    fn exit_code_is_nonzero_only_when_both_fail() {
        let both = RunOutcome {
            currency: false,
            bond: false,
        };
        let partial = RunOutcome {
            currency: true,
            bond: false,
        };
        assert_eq!(both.exit_code(), 1);
        assert_eq!(partial.exit_code(), 0);
    }

    #[test]
    fn empty_rates_do_not_touch_currency_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let page = "<span id=\"lastUpdated\">old</span> const CURRENT = {\n EUR: 1.0\n};";
        fs::write(&config.currency_file, page).unwrap();

        let result =
            run_currency_pipeline(&config, &NoQuotes, &RecordingProgress::default(), now());

        assert!(matches!(result, Err(RefreshError::NoRates)));
        assert_eq!(fs::read_to_string(&config.currency_file).unwrap(), page);
    }

    #[test]
    fn missing_bond_page_is_a_failure_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let result = run_bond_pipeline(&config, &FixedYield(2.5), now());

        assert!(matches!(result, Err(RefreshError::MissingArtifact(_))));
    }

    #[test]
    fn panic_in_one_pipeline_does_not_stop_the_other() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(
            &config.bond_file,
            "<span id=\"lastUpdated\"></span>\nconst CURRENT_YIELD = 2.1;",
        )
        .unwrap();
        let progress = RecordingProgress::default();

        let outcome = run_refresh(&config, &PanickingQuotes, &FixedYield(2.456), &progress, now());

        assert_eq!(
            outcome,
            RunOutcome {
                currency: false,
                bond: true
            }
        );
        assert_eq!(
            *progress.completed.borrow(),
            vec![(Pipeline::Currency, false), (Pipeline::Bond, true)]
        );
        assert!(fs::read_to_string(&config.bond_file)
            .unwrap()
            .contains("const CURRENT_YIELD = 2.46;"));
    }

    #[test]
    fn currency_client_build_failure_leaves_bond_pipeline_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = RefreshConfig {
            user_agent: "bad\nagent".into(),
            ..config_in(dir.path())
        };
        fs::write(
            &config.bond_file,
            "<span id=\"lastUpdated\">x</span> const CURRENT_YIELD = 2.1;",
        )
        .unwrap();
        let progress = RecordingProgress::default();

        let outcome = run_refresh_with(
            &config,
            crate::fetch::YahooQuotes::new,
            |_| Ok(FixedYield(2.456)),
            &progress,
            now(),
        );

        assert_eq!(
            outcome,
            RunOutcome {
                currency: false,
                bond: true
            }
        );
        assert!(progress.quotes.borrow().is_empty());
        assert_eq!(
            *progress.completed.borrow(),
            vec![(Pipeline::Currency, false), (Pipeline::Bond, true)]
        );
        assert_eq!(
            fs::read_to_string(&config.bond_file).unwrap(),
            "<span id=\"lastUpdated\">February 07, 2026 at 03:05 PM GMT</span> const CURRENT_YIELD = 2.46;"
        );
    }

    #[test]
    fn yield_source_build_failure_is_a_bond_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let progress = RecordingProgress::default();

        let outcome = run_refresh_with(
            &config,
            |_| Ok(NoQuotes),
            |_| Err::<FixedYield, _>(FetchError::Client("no TLS backend".into())),
            &progress,
            now(),
        );

        assert!(outcome.all_failed());
        assert_eq!(progress.quotes.borrow().len(), CurrencyCode::ALL.len());
        assert_eq!(
            *progress.completed.borrow(),
            vec![(Pipeline::Currency, false), (Pipeline::Bond, false)]
        );
    }

    #[test]
    fn guard_flag_is_cleared_after_a_panic() {
        let ok = guarded(Pipeline::Currency, &RecordingProgress::default(), || {
            panic!("boom")
        });

        assert!(!ok);
        assert!(!IN_GUARD.with(Cell::get));
    }

    #[test]
    fn phases_run_currency_then_bond() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let progress = RecordingProgress::default();

        let outcome = run_refresh(&config, &NoQuotes, &FixedYield(2.0), &progress, now());

        assert!(outcome.all_failed());
        assert_eq!(
            *progress.phases.borrow(),
            vec![Pipeline::Currency, Pipeline::Bond]
        );
        assert_eq!(*progress.summary.borrow(), Some(outcome));
    }

    #[test]
    fn inspect_reports_each_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(&config.currency_file, "<span id=\"lastUpdated\">x</span>").unwrap();

        let statuses = inspect_artifacts(&config).unwrap();

        assert_eq!(statuses[0].0, Pipeline::Currency);
        assert_eq!(
            statuses[0].2,
            ArtifactStatus::Present {
                assignment: false,
                timestamp: true
            }
        );
        assert_eq!(statuses[1].2, ArtifactStatus::Missing);
    }

    #[test]
    fn panic_payloads_are_readable() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
    }
}
