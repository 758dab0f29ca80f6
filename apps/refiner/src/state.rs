use crate::config::Config;
use crate::errors::AppError;
use crate::refine::Pipeline;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    /// `None` when the provider key is missing; runs then fail before any network call.
    pub pipeline: Option<Pipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Option<Pipeline>) -> Self {
        Self {
            sessions: SessionStore::with_ttl(config.session_ttl_secs),
            config,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> Result<&Pipeline, AppError> {
        match &self.pipeline {
            Some(pipeline) => Ok(pipeline),
            None => Err(self
                .config
                .require_api_key()
                .err()
                .unwrap_or_else(|| {
                    AppError::Configuration("LLM provider is not configured".to_string())
                })),
        }
    }
}
