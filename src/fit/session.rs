//! Background fit sessions.
//!
//! A [`FitController`] owns at most one running fit. The fit runs on its own
//! thread and reports through an `mpsc` channel; cancellation is cooperative
//! and polled once per outer iteration, so an iteration in flight always
//! finishes first.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::domain::{CurveResult, FitParameter, ModelVariant, ObservedSeries};
use crate::error::AppError;
use crate::fit::fitter::run_fit;

/// Shared cancel flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one fit needs; moved into the worker thread.
#[derive(Debug, Clone)]
pub struct FitJob {
    pub variant: ModelVariant,
    pub parameters: Vec<FitParameter>,
    pub observed: ObservedSeries,
    /// Pressure vs. derivative balance in `[0, 1]`; 1 fits pressure only.
    pub weight: f64,
    pub config: EngineConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStatus {
    Converged,
    Cancelled,
    MaxIterReached,
    /// No trial step improved the fit and the damping hit its cap.
    Stalled,
}

impl FitStatus {
    pub fn display_name(self) -> &'static str {
        match self {
            FitStatus::Converged => "converged",
            FitStatus::Cancelled => "cancelled",
            FitStatus::MaxIterReached => "max iterations reached",
            FitStatus::Stalled => "stalled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    pub status: FitStatus,
    pub iterations: usize,
    pub mse: f64,
    pub parameters: Vec<FitParameter>,
    /// Final curve at the full observed time resolution.
    pub curve: CurveResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FitEvent {
    Started {
        samples: usize,
        free_parameters: usize,
    },
    /// Percent of the iteration budget used so far.
    Progress(u8),
    /// An accepted step.
    Iteration {
        iteration: usize,
        mse: f64,
        parameters: Vec<FitParameter>,
        curve: CurveResult,
    },
    Finished(FitOutcome),
}

struct RunningFit {
    cancel: CancelToken,
    handle: JoinHandle<FitOutcome>,
}

/// Idle ⇄ Running lifecycle around [`run_fit`].
#[derive(Default)]
pub struct FitController {
    running: Option<RunningFit>,
}

impl FitController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    /// Spawn the fit; events arrive on the returned receiver.
    pub fn start(&mut self, job: FitJob) -> Result<Receiver<FitEvent>, AppError> {
        if self.running.is_some() {
            return Err(AppError::new(
                2,
                "A fit is already active; stop or join it before starting another.",
            ));
        }
        if job.observed.is_empty() {
            return Err(AppError::new(3, "No observed data to fit."));
        }
        if !job.parameters.iter().any(FitParameter::is_free) {
            return Err(AppError::new(2, "No parameter is marked for fitting."));
        }

        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let handle = std::thread::Builder::new()
            .name("pta-fit".to_string())
            .spawn(move || {
                run_fit(&job, &worker_cancel, &mut |event| {
                    // A dropped receiver only means nobody is listening.
                    let _ = tx.send(event);
                })
            })
            .map_err(|e| AppError::new(4, format!("Failed to spawn fit thread: {e}")))?;

        info!("Fit started");
        self.running = Some(RunningFit { cancel, handle });
        Ok(rx)
    }

    /// Request cancellation; takes effect at the next iteration boundary.
    pub fn stop(&self) {
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }

    /// Wait for the running fit and return to idle.
    pub fn join(&mut self) -> Option<FitOutcome> {
        let running = self.running.take()?;
        match running.handle.join() {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                warn!("Fit thread panicked");
                None
            }
        }
    }
}

impl Drop for FitController {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            let _ = running.handle.join();
        }
    }
}
