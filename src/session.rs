//! Dashboard session lifecycle.
//!
//! A [`Session`] drives one fetch-decode cycle at a time and publishes its
//! state through a `tokio::sync::watch` channel. Each transition replaces
//! the whole state value.
//!
//! ```text
//! Idle --start()--> Loading --ok--> Loaded
//!                          \--err--> Failed
//! Loaded / Failed --start()--> Loading   (explicit reload)
//! ```

use crate::client::{AnalysisClient, FetchError};
use crate::contract::{check_ordering, decode, AnalysisPayload};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Message shown to the user for every failed fetch.
pub const FAILURE_MESSAGE: &str = "Failed to fetch analysis data";

/// Observable state of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Not started yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The payload was fetched and decoded.
    Loaded(Arc<AnalysisPayload>),
    /// The fetch or decode failed.
    Failed {
        /// User-facing message.
        message: String,
        /// Underlying cause, for logs and diagnostics only.
        cause: String,
    },
}

impl SessionState {
    /// Loaded and Failed end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Loaded(_) | SessionState::Failed { .. })
    }

    pub fn payload(&self) -> Option<&AnalysisPayload> {
        match self {
            SessionState::Loaded(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Loaded(_) => "loaded",
            SessionState::Failed { .. } => "failed",
        }
    }
}

/// Where a session reads its payload from.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    /// The analysis endpoint.
    Http(AnalysisClient),
    /// A payload saved to disk.
    File(PathBuf),
}

impl PayloadSource {
    async fn load(&self) -> Result<AnalysisPayload, FetchError> {
        match self {
            PayloadSource::Http(client) => client.fetch().await,
            PayloadSource::File(path) => {
                debug!("Reading payload from {}", path.display());
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| FetchError::Io {
                        path: path.clone(),
                        source,
                    })?;
                Ok(decode(&bytes)?)
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            PayloadSource::Http(client) => client.url().to_string(),
            PayloadSource::File(path) => path.display().to_string(),
        }
    }
}

/// Owner of the dashboard state.
pub struct Session {
    source: PayloadSource,
    state: Arc<watch::Sender<SessionState>>,
}

impl Session {
    /// Create an idle session. Nothing is fetched until [`start`](Self::start).
    pub fn new(source: PayloadSource) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            source,
            state: Arc::new(state),
        }
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Begin a fetch.
    ///
    /// Does nothing while a fetch is already in flight. From a terminal
    /// state this starts a new session. Returns whether a fetch was issued.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut issued = false;
        self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Loading) {
                return false;
            }
            *state = SessionState::Loading;
            issued = true;
            true
        });

        if !issued {
            debug!("Fetch already in flight, ignoring start");
            return false;
        }

        info!("Loading analysis from {}", self.source.describe());
        let source = self.source.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let next = match source.load().await {
                Ok(payload) => {
                    for warning in check_ordering(&payload) {
                        warn!("Unexpected ordering: {}", warning);
                    }
                    SessionState::Loaded(Arc::new(payload))
                }
                Err(e) => {
                    log_failure(&e);
                    SessionState::Failed {
                        message: FAILURE_MESSAGE.to_string(),
                        cause: e.to_string(),
                    }
                }
            };
            debug!("Session is now {}", next.label());
            state.send_replace(next);
        });

        true
    }

    /// Wait until the session reaches a terminal state and return it.
    ///
    /// Returns `Idle` immediately if the session was never started.
    pub async fn settled(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        if matches!(*rx.borrow(), SessionState::Idle) {
            return SessionState::Idle;
        }
        let settled = match rx.wait_for(SessionState::is_terminal).await {
            Ok(state) => state.clone(),
            Err(_) => self.current_state(),
        };
        settled
    }
}

fn log_failure(e: &FetchError) {
    match e {
        FetchError::Decode(d) => {
            error!(kind = %d.kind, path = %d.path, "Payload rejected: {}", d.detail)
        }
        other => error!("Fetch failed: {}", other),
    }
}
