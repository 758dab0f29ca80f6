//! Axum route handlers for the letter workflow.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::{read_docx, write_docx, DOCX_MIME};
use crate::errors::AppError;
use crate::session::SessionView;
use crate::state::AppState;

pub const DOWNLOAD_FILE_NAME: &str = "refined_letter.docx";

/// POST /api/v1/letters
///
/// Multipart upload, field `file`. Parses the letter and opens an `Uploaded` session.
/// Accepted even when the provider is not configured.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("letter.docx").to_string();
        if !file_name.to_lowercase().ends_with(".docx") {
            return Err(AppError::Validation(format!(
                "'{file_name}' is not a .docx file"
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;

        let document = read_docx(&bytes)?;
        let view = state.sessions.create(file_name, document).await?;
        return Ok(Json(view));
    }

    Err(AppError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}

/// GET /api/v1/letters/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.view(id).await?))
}

/// POST /api/v1/letters/:id/refine
///
/// Runs Grammar → Tone → Coherence → Review and renders the `.docx`.
/// Blocks until the whole chain finishes. The first failing stage's error is
/// stored on the session and returned verbatim.
///
/// The run itself is a spawned task: a dropped request still settles the
/// session in `Done` or `Failed`.
pub async fn handle_refine(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    // Checked before the session moves to Processing: no network call, no state change.
    let pipeline = state.pipeline()?.clone();

    let document = state.sessions.begin_run(id).await?;
    info!(session_id = %id, "Refinement started");

    let sessions = state.sessions.clone();
    let run = tokio::spawn(async move {
        match pipeline.refine_letter(&document, write_docx).await {
            Ok(letter) => sessions.complete(id, letter).await,
            Err(e) => {
                warn!(session_id = %id, "Refinement failed: {e}");
                sessions.fail(id, &e).await?;
                Err(e)
            }
        }
    });

    match run.await {
        Ok(outcome) => outcome.map(Json),
        Err(join_error) => {
            let e = AppError::Internal(anyhow::anyhow!("refinement task aborted: {join_error}"));
            state.sessions.fail(id, &e).await?;
            Err(e)
        }
    }
}

/// GET /api/v1/letters/:id/download
pub async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let bytes = state.sessions.download(id).await?;
    let disposition = format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\"");

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// DELETE /api/v1/letters/:id
///
/// "Process new document": discards the session.
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.reset(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
