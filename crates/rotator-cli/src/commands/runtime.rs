//! Shared wiring for every subcommand: configuration, logging, the HTTP
//! client and the archive store.

use clap::Args;
use rotator_core::logging_facility;
use rotator_core::{CollectionId, ExError};
use rotator_remote::{BearerSession, ClientEvent, HttpCollectionClient};
use rotator_store::ArchiveStore;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{access_token, CollectionRef, RotatorConfig};

pub struct Runtime {
    pub config: RotatorConfig,
    pub client: HttpCollectionClient,
    pub store: ArchiveStore,
}

impl Runtime {
    pub fn load(config_path: &Path) -> Result<Self, ExError> {
        let config = RotatorConfig::load(config_path)?;
        logging_facility::init(config.logging_profile()?);

        let token = access_token()?;
        let client =
            HttpCollectionClient::new(config.client_config(), Box::new(BearerSession::new(token)))?
                .with_event_sink(Arc::new(report_client_event));
        let store = ArchiveStore::new(config.archive.directory.clone());

        Ok(Self {
            config,
            client,
            store,
        })
    }

    pub fn collection(&self, reference: CollectionRef) -> Result<CollectionId, ExError> {
        Ok(self.config.collection(reference)?)
    }
}

fn report_client_event(event: &ClientEvent) {
    match event {
        ClientEvent::AwaitingRateLimit {
            endpoint,
            resume_at,
        } => eprintln!("Rate limited on {}; waiting until {}", endpoint, resume_at),
        ClientEvent::RateLimitCleared { endpoint } => {
            eprintln!("Rate limit on {} cleared; resuming", endpoint)
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RepeatArgs {
    /// Number of times to run the operation
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// Seconds to wait between runs
    #[arg(long, default_value_t = 0)]
    pub interval_secs: u64,
}

/// Run `iteration` the requested number of times.
///
/// A failed run is reported and the loop continues. With a single run its
/// error is returned as is; otherwise the caller gets a summary error.
pub fn run_repeated<F>(op: &str, repeat: &RepeatArgs, mut iteration: F) -> Result<(), Box<dyn Error>>
where
    F: FnMut(u32) -> Result<(), Box<dyn Error>>,
{
    let total = repeat.repeat.max(1);
    if total == 1 {
        return iteration(1);
    }

    let mut failed = 0;
    for run in 1..=total {
        if let Err(e) = iteration(run) {
            failed += 1;
            tracing::error!(op, run, error = %e, "Run failed");
            eprintln!("Run {}/{} failed: {}", run, total, e);
        }
        if run < total && repeat.interval_secs > 0 {
            std::thread::sleep(Duration::from_secs(repeat.interval_secs));
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} runs of {} failed", failed, total, op).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(n: u32) -> RepeatArgs {
        RepeatArgs {
            repeat: n,
            interval_secs: 0,
        }
    }

    #[test]
    fn test_single_run_returns_its_error() {
        let err = run_repeated("rotate", &repeat(1), |_| Err("boom".into())).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_failed_run_does_not_stop_the_loop() {
        let mut seen = Vec::new();
        let err = run_repeated("shuffle", &repeat(3), |run| {
            seen.push(run);
            if run == 2 {
                Err("second run failed".into())
            } else {
                Ok(())
            }
        })
        .unwrap_err();

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(err.to_string(), "1 of 3 runs of shuffle failed");
    }

    #[test]
    fn test_zero_repeat_runs_once() {
        let mut runs = 0;
        run_repeated("rotate", &repeat(0), |_| {
            runs += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(runs, 1);
    }
}
