//! The dashboard store: one context object reconciling the repository
//! snapshot, the status feed and per-repository analysis fetches.
//!
//! Every mutation is a single critical section over [`DashboardState`], so a
//! reader never observes a half-applied update. The lock is never held across
//! a network call. Nothing here returns an error to presentation: outcomes are
//! written to `message`/`error` or logged, and announced as [`StoreEvent`]s.

use std::sync::{Arc, Weak};

use shared::{
    domain::{AnalysisId, RepositoryId, RepositoryStatus},
    protocol::{AnalysisResult, Repository, StatusPatch},
};
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, error, info, warn};

use crate::{
    selection::{ComparisonSelection, ToggleOutcome},
    transport::{FeedCloser, FeedEvent, RepositoryApi, StatusFeed},
};

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Contents of the submission field.
    pub repo_url: String,
    pub message: String,
    pub error: String,
    pub repositories: Vec<Repository>,
    pub selected_repository: Option<Repository>,
    /// Analyses of the selected repository, newest first.
    pub analysis_results: Vec<AnalysisResult>,
    pub comparison: ComparisonSelection,
    pub is_loading: bool,
}

impl DashboardState {
    pub fn active_repository_id(&self) -> Option<RepositoryId> {
        self.selected_repository.as_ref().map(|repo| repo.id)
    }

    pub fn repository(&self, id: RepositoryId) -> Option<&Repository> {
        self.repositories.iter().find(|repo| repo.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    RepositoriesReplaced {
        count: usize,
    },
    RepositoryStatusChanged {
        repository_id: RepositoryId,
        status: RepositoryStatus,
    },
    ActiveRepositoryChanged(Option<RepositoryId>),
    AnalysisResultsReplaced {
        repository_id: Option<RepositoryId>,
        count: usize,
    },
    ComparisonChanged(Vec<AnalysisId>),
    LoadingChanged(bool),
    MessagesChanged,
    InputChanged,
    LoadFailed(String),
    FeedClosed,
    FeedError(String),
}

#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub event_buffer: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { event_buffer: 256 }
    }
}

/// A repository url accepted for submission. Blank input never becomes one,
/// which is what keeps empty submissions from reaching the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionUrl(String);

impl SubmissionUrl {
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

struct InflightFetch {
    repository_id: RepositoryId,
    generation: u64,
    abort: AbortHandle,
}

#[derive(Default)]
struct FetchSlot {
    next_generation: u64,
    inflight: Option<InflightFetch>,
}

#[derive(Default)]
struct FeedLifecycle {
    opened: bool,
    torn_down: bool,
    closer: Option<FeedCloser>,
    drain_task: Option<JoinHandle<()>>,
}

pub struct DashboardStore {
    api: Arc<dyn RepositoryApi>,
    state: Mutex<DashboardState>,
    events: broadcast::Sender<StoreEvent>,
    analysis_fetch: Mutex<FetchSlot>,
    feed: Mutex<FeedLifecycle>,
}

impl DashboardStore {
    pub(crate) fn new(api: Arc<dyn RepositoryApi>, options: StoreOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(options.event_buffer.max(1));
        Arc::new(Self {
            api,
            state: Mutex::new(DashboardState::default()),
            events,
            analysis_fetch: Mutex::new(FetchSlot::default()),
            feed: Mutex::new(FeedLifecycle::default()),
        })
    }

    /// Builds the store, opens the status feed and loads the first
    /// repository snapshot. Both happen once per store.
    pub async fn create(
        api: Arc<dyn RepositoryApi>,
        feed: Arc<dyn StatusFeed>,
        options: StoreOptions,
    ) -> Arc<Self> {
        let store = Self::new(api, options);
        tokio::join!(
            store.open_status_feed(feed.as_ref()),
            store.load_repositories()
        );
        info!("dashboard store ready");
        store
    }

    /// Closes the status feed and abandons any in-flight analysis fetch.
    /// Calls after the first are no-ops.
    pub async fn teardown(&self) {
        let (closer, drain_task) = {
            let mut lifecycle = self.feed.lock().await;
            if lifecycle.torn_down {
                return;
            }
            lifecycle.torn_down = true;
            (lifecycle.closer.take(), lifecycle.drain_task.take())
        };

        if let Some(closer) = closer {
            closer.close().await;
        }
        if let Some(task) = drain_task {
            task.abort();
        }
        if let Some(fetch) = self.analysis_fetch.lock().await.inflight.take() {
            fetch.abort.abort();
        }
        info!("dashboard store torn down");
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Borrowed access for one render pass.
    pub async fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        let state = self.state.lock().await;
        f(&state)
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.lock().await.clone()
    }

    pub async fn set_repo_url(&self, text: impl Into<String>) {
        self.state.lock().await.repo_url = text.into();
        self.emit(StoreEvent::InputChanged);
    }

    pub async fn load_repositories(&self) {
        self.set_loading(true).await;
        match self.api.list_repositories().await {
            Ok(repositories) => {
                let count = repositories.len();
                self.state.lock().await.repositories = repositories;
                info!(count, "repository snapshot loaded");
                self.emit(StoreEvent::RepositoriesReplaced { count });
            }
            Err(err) => {
                error!(%err, "failed to load repositories");
                self.emit(StoreEvent::LoadFailed(format!(
                    "failed to load repositories: {err}"
                )));
            }
        }
        self.set_loading(false).await;
    }

    /// Replaces the analysis collection with the history of `repository_id`.
    ///
    /// A failed fetch empties the collection rather than leaving another
    /// repository's results on screen. A response that settles after the
    /// user moved to another repository is discarded.
    pub async fn load_analysis_results(&self, repository_id: RepositoryId) {
        self.set_loading(true).await;
        let results = match self.api.list_analysis_results(repository_id).await {
            Ok(results) => results,
            Err(err) => {
                error!(repository_id = repository_id.0, %err, "failed to load analysis results");
                self.emit(StoreEvent::LoadFailed(format!(
                    "failed to load analysis results for repository {repository_id}: {err}"
                )));
                Vec::new()
            }
        };

        let count = results.len();
        let applied = {
            let mut state = self.state.lock().await;
            if state.active_repository_id() == Some(repository_id) {
                state.analysis_results = results;
                true
            } else {
                false
            }
        };
        if applied {
            debug!(repository_id = repository_id.0, count, "analysis results replaced");
            self.emit(StoreEvent::AnalysisResultsReplaced {
                repository_id: Some(repository_id),
                count,
            });
        } else {
            debug!(
                repository_id = repository_id.0,
                "discarding analysis results for inactive repository"
            );
        }
        self.set_loading(false).await;
    }

    pub async fn submit_repository(&self, url: SubmissionUrl) {
        {
            let mut state = self.state.lock().await;
            state.message.clear();
            state.error.clear();
        }
        self.emit(StoreEvent::MessagesChanged);
        self.set_loading(true).await;

        match self.api.create_repository(url.as_str()).await {
            Ok(created) => {
                info!(repository_id = created.id.0, url = %created.url, status = %created.status, "repository submitted");
                {
                    let mut state = self.state.lock().await;
                    state.message = format!(
                        "Analysis request submitted for: {}. Status: {}",
                        created.url, created.status
                    );
                    state.repo_url.clear();
                }
                self.emit(StoreEvent::MessagesChanged);
                self.emit(StoreEvent::InputChanged);
                self.load_repositories().await;
            }
            Err(err) => {
                warn!(url = url.as_str(), %err, "repository submission failed");
                self.state.lock().await.error = err.user_message();
                self.emit(StoreEvent::MessagesChanged);
            }
        }
        self.set_loading(false).await;
    }

    /// Submits whatever is in the submission field. Returns `false` without
    /// sending anything when the field is blank.
    pub async fn submit_input(&self) -> bool {
        let raw = self.state.lock().await.repo_url.clone();
        match SubmissionUrl::new(&raw) {
            Some(url) => {
                self.submit_repository(url).await;
                true
            }
            None => false,
        }
    }

    /// Makes `repository` the active one. The comparison selection is always
    /// reset. Selecting a repository (again, or anew) refetches its analysis
    /// history; selecting nothing empties it without a request.
    pub async fn select_repository(self: &Arc<Self>, repository: Option<Repository>) {
        let repository_id = repository.as_ref().map(|repo| repo.id);
        {
            let mut state = self.state.lock().await;
            state.selected_repository = repository;
            state.comparison.clear();
            if repository_id.is_none() {
                state.analysis_results.clear();
            }
        }
        self.emit(StoreEvent::ActiveRepositoryChanged(repository_id));
        self.emit(StoreEvent::ComparisonChanged(Vec::new()));

        match repository_id {
            Some(id) => self.run_analysis_fetch(id).await,
            None => {
                if self.cancel_analysis_fetch().await {
                    self.set_loading(false).await;
                }
                self.emit(StoreEvent::AnalysisResultsReplaced {
                    repository_id: None,
                    count: 0,
                });
            }
        }
    }

    /// Updates the status of a held repository. Patches for ids not in the
    /// current snapshot are dropped. Returns whether anything changed.
    pub async fn apply_status_patch(
        &self,
        repository_id: RepositoryId,
        status: RepositoryStatus,
    ) -> bool {
        let changed = {
            let mut state = self.state.lock().await;
            let found = match state
                .repositories
                .iter_mut()
                .find(|repo| repo.id == repository_id)
            {
                Some(repo) => {
                    repo.status = status.clone();
                    true
                }
                None => false,
            };
            if found {
                if let Some(selected) = state
                    .selected_repository
                    .as_mut()
                    .filter(|repo| repo.id == repository_id)
                {
                    selected.status = status.clone();
                }
            }
            found
        };

        if changed {
            if status.is_terminal() {
                info!(repository_id = repository_id.0, %status, "repository analysis finished");
            } else {
                debug!(repository_id = repository_id.0, %status, "repository status patched");
            }
            self.emit(StoreEvent::RepositoryStatusChanged {
                repository_id,
                status,
            });
        } else {
            debug!(
                repository_id = repository_id.0,
                "ignoring status patch for unknown repository"
            );
        }
        changed
    }

    pub async fn toggle_comparison_selection(&self, analysis_id: AnalysisId) -> ToggleOutcome {
        let (outcome, ids) = {
            let mut state = self.state.lock().await;
            let outcome = state.comparison.toggle(analysis_id);
            (outcome, state.comparison.ids().to_vec())
        };
        if outcome.changed() {
            self.emit(StoreEvent::ComparisonChanged(ids));
        }
        outcome
    }

    async fn open_status_feed(self: &Arc<Self>, feed: &dyn StatusFeed) {
        let mut lifecycle = self.feed.lock().await;
        if lifecycle.opened || lifecycle.torn_down {
            return;
        }
        lifecycle.opened = true;

        match feed.open().await {
            Ok(subscription) => {
                let (inbound, closer) = subscription.into_parts();
                lifecycle.closer = Some(closer);
                lifecycle.drain_task = Some(self.spawn_feed_drain(inbound));
                info!("status feed opened");
            }
            Err(err) => {
                error!(%err, "status feed unavailable");
                self.emit(StoreEvent::FeedError(err.to_string()));
            }
        }
    }

    // Single consumer of the inbound queue: patches apply one at a time in
    // arrival order.
    fn spawn_feed_drain(self: &Arc<Self>, mut inbound: mpsc::Receiver<FeedEvent>) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = inbound.recv().await {
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.handle_feed_event(event).await;
            }
            debug!("status feed drained");
        })
    }

    pub(crate) async fn handle_feed_event(&self, event: FeedEvent) {
        match event {
            FeedEvent::Frame(text) => match StatusPatch::from_frame(&text) {
                Ok(patch) => {
                    self.apply_status_patch(patch.id, patch.status).await;
                }
                Err(err) => {
                    warn!(%err, frame = %text, "dropping malformed status frame");
                }
            },
            FeedEvent::Closed => {
                info!("status feed disconnected");
                self.emit(StoreEvent::FeedClosed);
            }
            FeedEvent::Error(reason) => {
                error!(%reason, "status feed error");
                self.emit(StoreEvent::FeedError(reason));
            }
        }
    }

    // Runs the fetch as its own task so a newer selection can abort it.
    async fn run_analysis_fetch(self: &Arc<Self>, repository_id: RepositoryId) {
        let (task, generation) = {
            let mut slot = self.analysis_fetch.lock().await;
            if let Some(previous) = slot.inflight.take() {
                debug!(
                    repository_id = previous.repository_id.0,
                    "aborting superseded analysis fetch"
                );
                previous.abort.abort();
            }
            let generation = slot.next_generation;
            slot.next_generation += 1;

            let store = Arc::clone(self);
            let task =
                tokio::spawn(async move { store.load_analysis_results(repository_id).await });
            slot.inflight = Some(InflightFetch {
                repository_id,
                generation,
                abort: task.abort_handle(),
            });
            (task, generation)
        };

        if let Err(err) = task.await {
            if err.is_cancelled() {
                debug!(repository_id = repository_id.0, "analysis fetch superseded");
            } else {
                error!(repository_id = repository_id.0, %err, "analysis fetch task failed");
            }
        }

        let mut slot = self.analysis_fetch.lock().await;
        if slot
            .inflight
            .as_ref()
            .is_some_and(|fetch| fetch.generation == generation)
        {
            slot.inflight = None;
        }
    }

    async fn cancel_analysis_fetch(&self) -> bool {
        match self.analysis_fetch.lock().await.inflight.take() {
            Some(fetch) => {
                fetch.abort.abort();
                true
            }
            None => false,
        }
    }

    async fn set_loading(&self, loading: bool) {
        let changed = {
            let mut state = self.state.lock().await;
            let changed = state.is_loading != loading;
            state.is_loading = loading;
            changed
        };
        if changed {
            self.emit(StoreEvent::LoadingChanged(loading));
        }
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
