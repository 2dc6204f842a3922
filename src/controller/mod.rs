pub mod sample;
pub mod source;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

pub use sample::{QueryCount, Sample, Topology, TopologyReading};
pub use source::{FetchError, HttpEndpoint, MeasurementEndpoint};

use crate::metrics::RunSummary;

/// Rounds per run. Fixed, not configurable.
pub const ROUNDS: u32 = 5;

// ─── Public types ────────────────────────────────────────────────

/// What to measure on the next run. Survives across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub global: bool,
    pub regional: bool,
    pub query_count: QueryCount,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            global: true,
            regional: false,
            query_count: QueryCount::One,
        }
    }
}

impl Selection {
    pub fn toggle(&mut self, topology: Topology) {
        match topology {
            Topology::Global => self.global = !self.global,
            Topology::Regional => self.regional = !self.regional,
        }
    }

    pub fn any_topology(&self) -> bool {
        self.global || self.regional
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Pending,
    /// A round failed; no later round was dispatched.
    Failed { round: u32, error: String },
}

/// Everything a renderer needs, published after every mutation.
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub selection: Selection,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartRejected {
    #[error("a run is already in progress")]
    AlreadyRunning,
    #[error("select at least one topology before starting")]
    NoTopologySelected,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("round {round} failed: {source}")]
    Round {
        round: u32,
        #[source]
        source: FetchError,
    },
}

// ─── Controller ──────────────────────────────────────────────────

/// Owns the selection, the run status and the sample list.
/// The sample list is only ever appended to by the run loop.
pub struct Controller {
    endpoint: Arc<dyn MeasurementEndpoint>,
    inner: Mutex<Inner>,
    updates: watch::Sender<RunSnapshot>,
}

struct Inner {
    selection: Selection,
    status: RunStatus,
    samples: Vec<Sample>,
    run_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
}

impl Inner {
    fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.run_id,
            started_at: self.started_at,
            status: self.status.clone(),
            selection: self.selection,
            samples: self.samples.clone(),
        }
    }
}

impl Controller {
    pub fn new(endpoint: Arc<dyn MeasurementEndpoint>) -> Self {
        let inner = Inner {
            selection: Selection::default(),
            status: RunStatus::Idle,
            samples: Vec::with_capacity(ROUNDS as usize),
            run_id: None,
            started_at: None,
        };
        let (updates, _) = watch::channel(inner.snapshot());
        Self {
            endpoint,
            inner: Mutex::new(inner),
            updates,
        }
    }

    pub fn selection(&self) -> Selection {
        self.inner.lock().selection
    }

    #[cfg(test)]
    pub fn status(&self) -> RunStatus {
        self.inner.lock().status.clone()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.inner.lock().samples.clone()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.inner.lock().snapshot()
    }

    /// Receiver that sees every state published from now on.
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.updates.subscribe()
    }

    pub fn toggle_topology(&self, topology: Topology) -> Selection {
        self.mutate(|inner| {
            inner.selection.toggle(topology);
            inner.selection
        })
    }

    pub fn set_query_count(&self, query_count: QueryCount) -> Selection {
        self.mutate(|inner| {
            inner.selection.query_count = query_count;
            inner.selection
        })
    }

    /// Atomically checks the start guard, clears the sample list and
    /// flips the status to pending. Returns the selection the run uses.
    pub fn begin(&self) -> Result<Selection, StartRejected> {
        self.mutate(|inner| {
            if inner.status == RunStatus::Pending {
                return Err(StartRejected::AlreadyRunning);
            }
            if !inner.selection.any_topology() {
                return Err(StartRejected::NoTopologySelected);
            }
            let run_id = Uuid::new_v4();
            inner.samples.clear();
            inner.status = RunStatus::Pending;
            inner.run_id = Some(run_id);
            inner.started_at = Some(Utc::now());
            info!(
                %run_id,
                global = inner.selection.global,
                regional = inner.selection.regional,
                queries = %inner.selection.query_count,
                "run started"
            );
            Ok(inner.selection)
        })
    }

    /// Runs the fixed rounds for a run already opened with [`begin`](Self::begin).
    pub async fn execute(&self, selection: Selection) -> Result<(), RunError> {
        for round in 1..=ROUNDS {
            match self.fetch_round(round, &selection).await {
                Ok(sample) => {
                    debug!(round, ?sample, "round complete");
                    self.mutate(|inner| inner.samples.push(sample));
                }
                Err(source) => {
                    error!(round, error = %source, "round failed, run aborted");
                    self.mutate(|inner| {
                        inner.status = RunStatus::Failed {
                            round,
                            error: source.to_string(),
                        }
                    });
                    return Err(RunError::Round { round, source });
                }
            }
        }

        let samples = self.mutate(|inner| {
            inner.status = RunStatus::Idle;
            inner.samples.clone()
        });

        let summary = RunSummary::from_samples(&samples);
        for (topology, stats) in summary.iter() {
            info!(
                %topology,
                processing_p50_us = stats.processing.p50,
                end_to_end_p50_us = stats.end_to_end.p50,
                cold_starts = stats.cold_starts,
                "run finished"
            );
        }
        Ok(())
    }

    /// `begin`, then `execute` on a spawned task. The outcome is also
    /// reflected in the published status.
    pub fn spawn_run(self: &Arc<Self>) -> Result<JoinHandle<Result<(), RunError>>, StartRejected> {
        let selection = self.begin()?;
        let controller = Arc::clone(self);
        Ok(tokio::spawn(async move { controller.execute(selection).await }))
    }

    /// `begin` followed by `execute` on the current task.
    #[cfg(test)]
    pub async fn start_run(&self) -> Result<(), RunError> {
        let selection = self.begin().expect("start guard");
        self.execute(selection).await
    }

    /// One round: both requests concurrently when both topologies are
    /// selected, the first failure fails the round.
    async fn fetch_round(&self, round: u32, selection: &Selection) -> Result<Sample, FetchError> {
        let queries = selection.query_count;
        let (global, regional) = match (selection.global, selection.regional) {
            (true, true) => {
                let (g, r) = tokio::try_join!(
                    self.fetch_topology_sample(Topology::Global, queries),
                    self.fetch_topology_sample(Topology::Regional, queries),
                )?;
                (Some(g), Some(r))
            }
            (true, false) => (Some(self.fetch_topology_sample(Topology::Global, queries).await?), None),
            (false, true) => (None, Some(self.fetch_topology_sample(Topology::Regional, queries).await?)),
            (false, false) => (None, None),
        };

        Ok(Sample {
            fetch_num: round,
            global,
            regional,
        })
    }

    /// Times one request from just before dispatch to the parsed body.
    pub async fn fetch_topology_sample(
        &self,
        topology: Topology,
        queries: QueryCount,
    ) -> Result<TopologyReading, FetchError> {
        let t0 = Instant::now();
        let report = self.endpoint.query(topology, queries).await?;
        let end_to_end_ms = t0.elapsed().as_secs_f64() * 1000.0;

        Ok(TopologyReading {
            processing_time_ms: report.duration,
            cold_start: report.is_cold_start,
            end_to_end_ms,
        })
    }

    /// Apply `f` under the lock, then publish the resulting state.
    fn mutate<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut inner = self.inner.lock();
        let out = f(&mut inner);
        self.updates.send_replace(inner.snapshot());
        out
    }
}

// ─── Tests ───────────────────────────────────────────────────────
