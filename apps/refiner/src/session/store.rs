//! In-memory session store.
//!
//! Every state change happens under the write lock; the lock is released
//! before the pipeline runs, so a long refinement never blocks other sessions.
//! Sessions older than the TTL are evicted, except while `Processing`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::Document;
use crate::errors::AppError;
use crate::refine::pipeline::RenderedLetter;
use crate::session::{Session, SessionError, SessionEvent, SessionState, SessionView};

/// How long an abandoned session is kept when no TTL is configured.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Interval of the background eviction sweep.
const CLEANUP_INTERVAL_SECS: u64 = 300;

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL_SECS)
    }
}

impl SessionStore {
    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX / 1000)),
        }
    }

    /// Registers a parsed upload as a new `Uploaded` session.
    pub async fn create(&self, file_name: String, document: Document) -> Result<SessionView, AppError> {
        self.evict_expired(Utc::now()).await;

        let session = Session::uploaded(file_name, document)?;
        let view = session.view();
        info!(
            session_id = %session.id,
            "Letter uploaded: {} ({} paragraphs)",
            session.file_name,
            session.document.len()
        );
        self.sessions.write().await.insert(session.id, session);
        Ok(view)
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, AppError> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).map(Session::view).ok_or_else(|| not_found(id))
    }

    /// `Uploaded → Processing`. Returns the document to refine.
    pub async fn begin_run(&self, id: Uuid) -> Result<Document, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.apply(SessionEvent::Run)?;
        session.error = None;
        Ok(session.document.clone())
    }

    /// `Processing → Done`.
    pub async fn complete(&self, id: Uuid, letter: RenderedLetter) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.apply(SessionEvent::Succeed)?;
        session.letter = Some(letter);
        info!(session_id = %id, "Letter refined");
        Ok(session.view())
    }

    /// `Processing → Failed`, keeping the error for display.
    pub async fn fail(&self, id: Uuid, error: &AppError) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.apply(SessionEvent::Fail)?;
        session.error = Some(SessionError::from(error));
        Ok(session.view())
    }

    /// The rendered `.docx`; only available once `Done`.
    pub async fn download(&self, id: Uuid) -> Result<Vec<u8>, AppError> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or_else(|| not_found(id))?;
        session
            .letter
            .as_ref()
            .map(|l| l.docx.clone())
            .ok_or_else(|| {
                AppError::InvalidTransition(format!(
                    "the refined letter is not available while the letter is {}",
                    session.state
                ))
            })
    }

    /// Back to `Idle`: the session is discarded.
    pub async fn reset(&self, id: Uuid) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.apply(SessionEvent::Reset)?;
        sessions.remove(&id);
        info!(session_id = %id, "Session reset");
        Ok(())
    }
}

impl SessionStore {
    /// Drops sessions created more than the TTL before `now`.
    /// A session in `Processing` is kept until its run settles.
    ///
    /// Returns the number of sessions evicted.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = now.checked_sub_signed(self.ttl) else {
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, session| {
            let keep = session.created_at > cutoff || session.state == SessionState::Processing;
            if !keep {
                debug!(session_id = %id, file_name = %session.file_name, "Evicted expired session");
            }
            keep
        });

        let count = before - sessions.len();
        if count > 0 {
            info!(count = count, "Evicted expired letter sessions");
        }
        count
    }

    /// Runs `evict_expired` every few minutes for the life of the process.
    pub fn start_cleanup_task(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(CLEANUP_INTERVAL_SECS));

            loop {
                interval.tick().await;
                self.evict_expired(Utc::now()).await;
            }
        })
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
