//! Adapters for the analysis backend: request/response calls over reqwest
//! and the push-only status feed over a websocket.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use shared::{
    domain::RepositoryId,
    error::ApiErrorBody,
    protocol::{
        analysis_path, AnalysisResult, AnalysisResultsPayload, CreateRepositoryRequest,
        Repository, REPOSITORIES_PATH,
    },
};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info};

use crate::{config::status_feed_url, error::TransportError};

#[async_trait]
pub trait RepositoryApi: Send + Sync {
    async fn list_repositories(&self) -> Result<Vec<Repository>, TransportError>;

    async fn create_repository(&self, url: &str) -> Result<Repository, TransportError>;

    /// Analysis history of one repository, newest first.
    ///
    /// The first element is treated as the latest run; callers never
    /// re-sort the collection.
    async fn list_analysis_results(
        &self,
        repository_id: RepositoryId,
    ) -> Result<Vec<AnalysisResult>, TransportError>;
}

pub struct HttpRepositoryApi {
    http: Client,
    server_url: String,
}

impl HttpRepositoryApi {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            http,
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    async fn check(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let status_text = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string());
        let detail = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail_text().map(str::to_string));
        Err(TransportError::Status {
            status: status.as_u16(),
            status_text,
            detail,
        })
    }
}

#[async_trait]
impl RepositoryApi for HttpRepositoryApi {
    async fn list_repositories(&self) -> Result<Vec<Repository>, TransportError> {
        let response = self
            .http
            .get(format!("{}{REPOSITORIES_PATH}", self.server_url))
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(TransportError::from_reqwest)
    }

    async fn create_repository(&self, url: &str) -> Result<Repository, TransportError> {
        let response = self
            .http
            .post(format!("{}{REPOSITORIES_PATH}", self.server_url))
            .json(&CreateRepositoryRequest {
                url: url.to_string(),
            })
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(TransportError::from_reqwest)
    }

    async fn list_analysis_results(
        &self,
        repository_id: RepositoryId,
    ) -> Result<Vec<AnalysisResult>, TransportError> {
        let response = self
            .http
            .get(format!("{}{}", self.server_url, analysis_path(repository_id)))
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;
        let payload: AnalysisResultsPayload = Self::check(response)
            .await?
            .json()
            .await
            .map_err(TransportError::from_reqwest)?;
        Ok(payload.into_results())
    }
}

/// What the status feed hands to its consumer, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Raw text frame; decoding is the consumer's job.
    Frame(String),
    Closed,
    Error(String),
}

/// An open status feed: the ordered inbound queue plus the means to close it.
pub struct StatusSubscription {
    events: mpsc::Receiver<FeedEvent>,
    closer: FeedCloser,
}

impl StatusSubscription {
    pub fn new(
        events: mpsc::Receiver<FeedEvent>,
        shutdown: oneshot::Sender<()>,
        reader: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            closer: FeedCloser {
                shutdown: Some(shutdown),
                reader: Some(reader),
            },
        }
    }

    /// A subscription whose producer is owned elsewhere; closing it only
    /// stops consumption.
    pub fn detached(events: mpsc::Receiver<FeedEvent>) -> Self {
        Self {
            events,
            closer: FeedCloser {
                shutdown: None,
                reader: None,
            },
        }
    }

    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }

    pub fn into_parts(self) -> (mpsc::Receiver<FeedEvent>, FeedCloser) {
        (self.events, self.closer)
    }
}

pub struct FeedCloser {
    shutdown: Option<oneshot::Sender<()>>,
    reader: Option<JoinHandle<()>>,
}

impl FeedCloser {
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.await;
        }
    }
}

#[async_trait]
pub trait StatusFeed: Send + Sync {
    async fn open(&self) -> Result<StatusSubscription, TransportError>;
}

pub struct WebSocketStatusFeed {
    url: String,
    queue_capacity: usize,
}

impl WebSocketStatusFeed {
    pub fn new(url: impl Into<String>, queue_capacity: usize) -> Self {
        Self {
            url: url.into(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn for_server(server_url: &str, queue_capacity: usize) -> Result<Self, TransportError> {
        Ok(Self::new(status_feed_url(server_url)?, queue_capacity))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StatusFeed for WebSocketStatusFeed {
    async fn open(&self) -> Result<StatusSubscription, TransportError> {
        let (mut ws, _) = connect_async(self.url.as_str()).await.map_err(|err| {
            TransportError::Network(format!("failed to connect websocket {}: {err}", self.url))
        })?;
        info!(url = %self.url, "status feed connected");

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let url = self.url.clone();

        let reader = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        let _ = ws.close(None).await;
                        debug!(%url, "status feed closed locally");
                        break;
                    }
                    msg = ws.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(FeedEvent::Frame(text)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            let _ = tx.send(FeedEvent::Closed).await;
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            let _ = tx.send(FeedEvent::Error(format!(
                                "websocket receive failed: {err}"
                            ))).await;
                            let _ = tx.send(FeedEvent::Closed).await;
                            break;
                        }
                    }
                }
            }
        });

        Ok(StatusSubscription::new(rx, shutdown_tx, reader))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
