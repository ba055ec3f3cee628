//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use crate::config::Settings;
use crate::services::GeminiSearchTool;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Cheaply cloneable; the search tool and its client pool are built once
/// here and shared by every request for the lifetime of the server.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// The `gemini_search` tool
    pub search: Arc<GeminiSearchTool>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings) -> Self {
        let settings = Arc::new(settings);

        tracing::debug!("Creating Gemini search tool");
        let search = Arc::new(GeminiSearchTool::from_config(&settings.gemini));

        tracing::info!("Application state initialized successfully");

        Self {
            settings,
            search,
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
