//! The query engine: selection state, searches and result publication.
//!
//! Every search is tagged with a sequence number when it is issued. A
//! response is only published if no newer search has been issued in the
//! meantime, so a slow response can never overwrite a newer board. Late
//! responses are dropped rather than cancelled.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::digitraffic::convert_live_trains;
use crate::domain::StationCode;
use crate::stations::StationDirectory;

use super::config::EngineConfig;
use super::error::{SearchError, SelectionError};
use super::query::{QueryResult, arrange};
use super::source::TrainSource;

/// The stations the user has picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub reference: Option<StationCode>,
    pub destination: Option<StationCode>,
}

/// What happened to a search that got a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The result is now the current board.
    Published(Arc<QueryResult>),
    /// A newer search was issued first; the response was dropped.
    Superseded { seq: u64 },
}

#[derive(Debug, Default)]
struct EngineState {
    selection: Selection,
    /// Sequence number of the most recently issued search.
    latest_issued: u64,
}

/// Live departure board engine.
///
/// Owns the current selection, the published board and the refresh task.
/// Consumers read the board through [`QueryEngine::subscribe`] or
/// [`QueryEngine::current_result`].
pub struct QueryEngine<S> {
    source: S,
    directory: StationDirectory,
    config: EngineConfig,
    state: Mutex<EngineState>,
    published: watch::Sender<Option<Arc<QueryResult>>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: TrainSource> QueryEngine<S> {
    /// Create an engine with nothing selected and nothing published.
    pub fn new(source: S, directory: StationDirectory, config: EngineConfig) -> Self {
        let (published, _) = watch::channel(None);

        Self {
            source,
            directory,
            config,
            state: Mutex::new(EngineState::default()),
            published,
            refresh_task: Mutex::new(None),
        }
    }

    /// Fetch, filter and order the trains at `reference`, and publish them.
    ///
    /// Both codes must be known to the station directory and must differ;
    /// otherwise nothing is fetched. On a network failure the previous
    /// board stays published.
    pub async fn search(
        &self,
        reference: &StationCode,
        destination: Option<&StationCode>,
    ) -> Result<SearchOutcome, SearchError> {
        self.validate(reference, destination).await?;

        let seq = self.issue();
        debug!(%reference, ?destination, seq, "searching");

        let raw = self
            .source
            .live_trains(reference, &self.config.window)
            .await
            .map_err(|source| {
                warn!(%reference, seq, error = %source, "live train request failed");
                SearchError::Feed {
                    station: reference.clone(),
                    source,
                }
            })?;

        let trains = arrange(convert_live_trains(&raw, reference), destination);

        let result = QueryResult {
            seq,
            reference: reference.clone(),
            destination: destination.cloned(),
            trains,
            received_at: Utc::now(),
        };

        Ok(self.publish(result))
    }

    /// Search again with the current selection.
    pub async fn refresh(&self) -> Result<SearchOutcome, SearchError> {
        let selection = self.selection();
        let reference = selection.reference.ok_or(SelectionError::NoReference)?;
        self.search(&reference, selection.destination.as_ref()).await
    }

    /// Select the departure station and search.
    pub async fn select_reference(
        &self,
        code: StationCode,
    ) -> Result<SearchOutcome, SearchError> {
        self.ensure_known(&code).await?;

        {
            // Compare against the destination as it is now, not as it was
            // before the directory lookup
            let mut state = self.lock_state();
            if state.selection.destination.as_ref() == Some(&code) {
                return Err(SelectionError::SameStation(code).into());
            }
            state.selection.reference = Some(code);
        }

        self.refresh().await
    }

    /// Select or clear the destination station, and search if a departure
    /// station is selected.
    pub async fn select_destination(
        &self,
        code: Option<StationCode>,
    ) -> Result<Option<SearchOutcome>, SearchError> {
        if let Some(dest) = &code {
            self.ensure_known(dest).await?;
        }

        let has_reference = {
            let mut state = self.lock_state();
            if let Some(dest) = &code
                && state.selection.reference.as_ref() == Some(dest)
            {
                return Err(SelectionError::SameStation(dest.clone()).into());
            }
            state.selection.destination = code;
            state.selection.reference.is_some()
        };

        if !has_reference {
            return Ok(None);
        }
        self.refresh().await.map(Some)
    }

    /// Select both stations at once and search.
    ///
    /// Used when a board is opened directly for a station pair. A missing
    /// destination clears any previous one.
    pub async fn select(
        &self,
        reference: StationCode,
        destination: Option<StationCode>,
    ) -> Result<SearchOutcome, SearchError> {
        self.validate(&reference, destination.as_ref()).await?;

        self.lock_state().selection = Selection {
            reference: Some(reference),
            destination,
        };
        self.refresh().await
    }

    /// Returns the current selection.
    pub fn selection(&self) -> Selection {
        self.lock_state().selection.clone()
    }

    /// Display names of the selected stations.
    pub async fn selection_names(&self) -> (Option<String>, Option<String>) {
        let selection = self.selection();
        let from = match &selection.reference {
            Some(code) => Some(self.directory.lookup(code).await),
            None => None,
        };
        let to = match &selection.destination {
            Some(code) => Some(self.directory.lookup(code).await),
            None => None,
        };
        (from, to)
    }

    /// Returns the train source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the station directory the engine validates against.
    pub fn directory(&self) -> &StationDirectory {
        &self.directory
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the current board, if any search has completed.
    pub fn current_result(&self) -> Option<Arc<QueryResult>> {
        self.published.borrow().clone()
    }

    /// Subscribe to board updates.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<QueryResult>>> {
        self.published.subscribe()
    }

    /// Stop the periodic refresh, if running.
    pub fn stop_refresh(&self) {
        if let Some(handle) = self.lock_refresh_task().take() {
            handle.abort();
            debug!("refresh stopped");
        }
    }

    /// Returns true while the periodic refresh task is running.
    pub fn is_refreshing(&self) -> bool {
        self.lock_refresh_task()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn validate(
        &self,
        reference: &StationCode,
        destination: Option<&StationCode>,
    ) -> Result<(), SelectionError> {
        self.ensure_known(reference).await?;

        if let Some(dest) = destination {
            if dest == reference {
                return Err(SelectionError::SameStation(reference.clone()));
            }
            self.ensure_known(dest).await?;
        }

        Ok(())
    }

    async fn ensure_known(&self, code: &StationCode) -> Result<(), SelectionError> {
        if self.directory.contains(code).await {
            Ok(())
        } else {
            Err(SelectionError::UnknownStation(code.clone()))
        }
    }

    /// Allocate the next sequence number.
    fn issue(&self) -> u64 {
        let mut state = self.lock_state();
        state.latest_issued += 1;
        state.latest_issued
    }

    /// Publish `result` unless a newer search has been issued.
    fn publish(&self, result: QueryResult) -> SearchOutcome {
        let state = self.lock_state();
        let seq = result.seq;

        if seq != state.latest_issued {
            debug!(seq, latest = state.latest_issued, "dropping superseded response");
            return SearchOutcome::Superseded { seq };
        }

        let result = Arc::new(result);
        info!(
            station = %result.reference,
            seq,
            count = result.len(),
            "published board"
        );
        self.published.send_replace(Some(Arc::clone(&result)));
        SearchOutcome::Published(result)
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        // State is always left consistent, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_refresh_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.refresh_task.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: TrainSource + 'static> QueryEngine<S> {
    /// Start refreshing the board every `refresh_interval`.
    ///
    /// Ticks are skipped while no departure station is selected. The task
    /// holds only a weak reference, so it ends when the engine is dropped.
    /// Calling this while already refreshing restarts the cadence.
    pub fn start_refresh(self: &Arc<Self>) {
        let engine = Arc::downgrade(self);
        let period = self.config.refresh_interval;

        let handle = tokio::spawn(refresh_loop(engine, period));

        if let Some(previous) = self.lock_refresh_task().replace(handle) {
            previous.abort();
        }
        info!(period_secs = period.as_secs(), "refresh started");
    }
}

impl<S> Drop for QueryEngine<S> {
    fn drop(&mut self) {
        let task = self.refresh_task.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

async fn refresh_loop<S: TrainSource>(engine: Weak<QueryEngine<S>>, period: std::time::Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // First tick is immediate, skip it

    loop {
        interval.tick().await;

        let Some(engine) = engine.upgrade() else {
            return;
        };

        if engine.selection().reference.is_none() {
            continue;
        }

        // Errors are already logged; the next tick retries
        if let Ok(SearchOutcome::Superseded { seq }) = engine.refresh().await {
            debug!(seq, "scheduled refresh superseded");
        }
    }
}
