// Presentation layer: one session per uploaded letter.
// Idle → Uploaded → Processing → Done | Failed, plus Reset back to Idle.
// No cancellation once Processing has started.

pub mod handlers;
pub mod store;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::document::Document;
use crate::errors::AppError;
use crate::refine::pipeline::RenderedLetter;
use crate::refine::ParagraphChange;

pub use store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Uploaded,
    Processing,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Upload,
    Run,
    Succeed,
    Fail,
    Reset,
}

impl SessionState {
    /// Applies `event`, or returns `InvalidTransition` naming both.
    pub fn on(self, event: SessionEvent) -> Result<SessionState, AppError> {
        use crate::session::{SessionEvent as E, SessionState as S};

        match (self, event) {
            (S::Idle, E::Upload) => Ok(S::Uploaded),
            (S::Uploaded, E::Run) => Ok(S::Processing),
            (S::Processing, E::Succeed) => Ok(S::Done),
            (S::Processing, E::Fail) => Ok(S::Failed),
            (S::Processing, E::Reset) => Err(AppError::InvalidTransition(
                "refinement is in progress and cannot be cancelled".to_string(),
            )),
            (_, E::Reset) => Ok(S::Idle),
            (state, event) => Err(AppError::InvalidTransition(format!(
                "cannot {event} while the letter is {state}"
            ))),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Uploaded => "uploaded",
            SessionState::Processing => "processing",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionEvent::Upload => "upload",
            SessionEvent::Run => "run refinement",
            SessionEvent::Succeed => "finish refinement",
            SessionEvent::Fail => "fail refinement",
            SessionEvent::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// The error a failed run ended with, kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionError {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for SessionError {
    fn from(e: &AppError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub state: SessionState,
    pub document: Document,
    pub letter: Option<RenderedLetter>,
    pub error: Option<SessionError>,
}

impl Session {
    /// A freshly uploaded letter. Starts at `Idle` and takes the upload transition.
    pub fn uploaded(file_name: String, document: Document) -> Result<Self, AppError> {
        Ok(Self {
            id: Uuid::new_v4(),
            file_name,
            created_at: Utc::now(),
            state: SessionState::Idle.on(SessionEvent::Upload)?,
            document,
            letter: None,
            error: None,
        })
    }

    pub fn apply(&mut self, event: SessionEvent) -> Result<(), AppError> {
        self.state = self.state.on(event)?;
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        let report = self.letter.as_ref().map(|l| l.result.changes());
        SessionView {
            session_id: self.id,
            state: self.state,
            file_name: self.file_name.clone(),
            created_at: self.created_at,
            paragraph_count: self.document.len(),
            original_text: self.document.to_text(),
            refined_text: self.letter.as_ref().map(|l| l.result.refined_text()),
            summary: report.as_ref().map(|r| r.summary.clone()),
            changes: report.map(|r| r.changes).unwrap_or_default(),
            error: self.error.clone(),
        }
    }
}

/// What the UI renders for a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: SessionState,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub paragraph_count: usize,
    pub original_text: String,
    pub refined_text: Option<String>,
    pub summary: Option<String>,
    pub changes: Vec<ParagraphChange>,
    pub error: Option<SessionError>,
}
