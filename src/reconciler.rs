//! One compare-and-update cycle.

use crate::config::Config;
use crate::detector::IpDetector;
use crate::error::{DdnsError, ErrorKind, Result};
use crate::linode::{Action, LinodeClient, ProviderApi, ResourceRecord, UpdateRequest};
use crate::locator::RecordLocator;
use crate::trace;
use std::fmt;
use std::time::Duration;

/// Exit code when the record already matched.
pub const EXIT_NO_CHANGE: u8 = 0;
/// Exit code when the record was updated.
pub const EXIT_UPDATED: u8 = 1;
/// Exit code when anything failed.
pub const EXIT_FAILED: u8 = 2;

/// Result of a run, printed as the single status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoChangeNeeded,
    Updated { old: String, new: String },
    Failed { kind: ErrorKind, message: String },
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::NoChangeNeeded => EXIT_NO_CHANGE,
            RunOutcome::Updated { .. } => EXIT_UPDATED,
            RunOutcome::Failed { .. } => EXIT_FAILED,
        }
    }
}

impl From<DdnsError> for RunOutcome {
    fn from(err: DdnsError) -> Self {
        RunOutcome::Failed {
            kind: err.kind(),
            message: single_line(&err.to_string()),
        }
    }
}

/// Collapse all whitespace runs, newlines included, into single spaces.
fn single_line(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::NoChangeNeeded => write!(f, "OK"),
            RunOutcome::Updated { old, new } => write!(f, "OK {} -> {}", old, new),
            RunOutcome::Failed { kind, message } => write!(f, "FAIL {}: {}", kind, message),
        }
    }
}

/// Where the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingRecord,
    ResolvingIp,
    Comparing,
    Updating,
    Done,
}

/// Drives locator, detector and client through one reconciliation.
pub struct Reconciler<'a> {
    api: &'a dyn ProviderApi,
    detector: &'a IpDetector,
}

impl<'a> Reconciler<'a> {
    pub fn new(api: &'a dyn ProviderApi, detector: &'a IpDetector) -> Self {
        Self { api, detector }
    }

    /// Run once; every failure ends up in [`RunOutcome::Failed`].
    pub async fn run(&self, config: &Config) -> RunOutcome {
        let mut stage = Stage::ResolvingRecord;
        match self.reconcile(config, &mut stage).await {
            Ok(outcome) => {
                tracing::debug!(stage = ?Stage::Done, "{}", outcome);
                outcome
            }
            Err(err) => {
                tracing::warn!(stage = ?stage, kind = %err.kind(), "Reconciliation failed: {}", err);
                err.into()
            }
        }
    }

    async fn reconcile(&self, config: &Config, stage: &mut Stage) -> Result<RunOutcome> {
        tracing::debug!(stage = ?stage, "Locating record for {}", config.domain_name);
        let record = RecordLocator::new(self.api).locate(config).await?;

        *stage = Stage::ResolvingIp;
        tracing::debug!(stage = ?stage, "Fetching public IP");
        let observed = self.detector.current_public_ip().await?;

        *stage = Stage::Comparing;
        tracing::debug!(stage = ?stage, "Record {} vs observed {}", record.target, observed);
        if record.target == observed {
            tracing::info!("{} already points at {}", config.domain_name, observed);
            return Ok(RunOutcome::NoChangeNeeded);
        }

        *stage = Stage::Updating;
        self.update(&record, &observed).await?;
        tracing::info!(
            "Updated {} from {} to {}",
            config.domain_name,
            record.target,
            observed
        );
        Ok(RunOutcome::Updated {
            old: record.target,
            new: observed,
        })
    }

    async fn update(&self, record: &ResourceRecord, target: &str) -> Result<()> {
        let request = UpdateRequest::retarget(record, target);
        self.api
            .execute(Action::ResourceUpdate, request.params())
            .await?;
        Ok(())
    }
}

/// Build the HTTP collaborators for `config` and reconcile once.
pub async fn run_once(config: &Config) -> RunOutcome {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("linode-ddns/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => return DdnsError::from(e).into(),
    };

    let trace = trace::for_debug(config.debug);
    let api = LinodeClient::new(client.clone(), config, trace.clone());
    let detector = IpDetector::new(client, config.ip_endpoint.clone(), trace);
    Reconciler::new(&api, &detector).run(config).await
}
