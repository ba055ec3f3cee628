//! Google Gemini API schema definitions
//!
//! This module contains Rust structures for the subset of the Gemini REST API
//! used by the search tool: a single-turn `generateContent` request with the
//! built-in Google Search tool, and the response shapes it can produce.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Types
// ============================================================================

/// Gemini API request body for generateContent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// The content of the conversation
    pub contents: Vec<GeminiContent>,

    /// Generation configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,

    /// Tools available to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GeminiRequest {
    /// Single user turn with Google Search grounding enabled
    pub fn grounded_search(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            contents: vec![GeminiContent::user(prompt)],
            generation_config: Some(GenerationConfig {
                temperature: Some(temperature),
            }),
            tools: Some(vec![Tool::google_search()]),
        }
    }
}

/// Content block containing role and parts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Role: "user" or "model"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Content parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl GeminiContent {
    /// Create a user content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }
}

/// A part of the content
///
/// Only text parts matter here; other part kinds deserialize with `text` unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Set on parts carrying the model's reasoning rather than its answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }

    /// Non-empty answer text, if any
    fn answer_text(&self) -> Option<&str> {
        if self.thought == Some(true) {
            return None;
        }
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Temperature (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Built-in Google Search grounding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

impl Tool {
    pub fn google_search() -> Self {
        Self {
            google_search: Some(GoogleSearch::default()),
        }
    }
}

/// Marker object enabling the Google Search tool (serialized as `{}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSearch {}

// ============================================================================
// Response Types
// ============================================================================

/// Gemini API response for generateContent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Generated candidates
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Feedback on the prompt, present when it was blocked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,

    /// Usage metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,

    /// Model version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

/// A candidate response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content; absent when generation was stopped early
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<GeminiContent>,

    /// Finish reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    /// Search grounding details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,

    /// Index of this candidate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

impl Candidate {
    fn text_parts(&self) -> impl Iterator<Item = &str> {
        self.content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(Part::answer_text)
    }
}

/// Prompt feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Grounding metadata attached by the Google Search tool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    /// Queries the model issued
    #[serde(default)]
    pub web_search_queries: Vec<String>,

    /// Retrieved sources
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// A single grounding source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

/// Web page used for grounding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Usage metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: i32,
    #[serde(default)]
    pub candidates_token_count: i32,
    #[serde(default)]
    pub total_token_count: i32,
}

// ============================================================================
// Response Text Resolution
// ============================================================================

/// The closed set of shapes a generateContent response can take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape<'a> {
    /// The first candidate carries answer text
    Text(String),
    /// Answer text only appears in later candidates
    ScatteredText(Vec<&'a str>),
    /// The prompt or every candidate was blocked
    Blocked(String),
    /// Nothing usable came back
    Empty,
}

impl GeminiResponse {
    /// Classify the response
    pub fn shape(&self) -> ResponseShape<'_> {
        if let Some(first) = self.candidates.first() {
            let text: String = first.text_parts().collect();
            if !text.is_empty() {
                return ResponseShape::Text(text);
            }
        }

        let scattered: Vec<&str> = self
            .candidates
            .iter()
            .flat_map(Candidate::text_parts)
            .collect();
        if !scattered.is_empty() {
            return ResponseShape::ScatteredText(scattered);
        }

        let block_reason = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
            .or_else(|| {
                self.candidates
                    .iter()
                    .filter_map(|c| c.finish_reason.as_deref())
                    .find(|r| is_blocking_finish_reason(r))
                    .map(str::to_string)
            });

        match block_reason {
            Some(reason) => ResponseShape::Blocked(reason),
            None => ResponseShape::Empty,
        }
    }

    /// Best-effort answer text
    ///
    /// Prefers the concatenated text of the first candidate, then falls back to
    /// every candidate's text parts joined by newlines.
    pub fn resolve_text(&self) -> Option<String> {
        match self.shape() {
            ResponseShape::Text(text) => Some(text),
            ResponseShape::ScatteredText(parts) => Some(parts.join("\n")),
            ResponseShape::Blocked(_) | ResponseShape::Empty => None,
        }
    }

    /// Sources cited by the search grounding, as (title, uri) pairs
    pub fn grounding_sources(&self) -> Vec<(String, String)> {
        self.candidates
            .iter()
            .filter_map(|c| c.grounding_metadata.as_ref())
            .flat_map(|m| m.grounding_chunks.iter())
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                let uri = web.uri.clone()?;
                let title = web.title.clone().unwrap_or_else(|| uri.clone());
                Some((title, uri))
            })
            .collect()
    }
}

fn is_blocking_finish_reason(reason: &str) -> bool {
    matches!(
        reason,
        finish_reason::SAFETY
            | finish_reason::RECITATION
            | finish_reason::BLOCKLIST
            | finish_reason::PROHIBITED_CONTENT
    )
}

// ============================================================================
// Error Types
// ============================================================================

/// Gemini API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiError {
    /// Error details
    pub error: GeminiErrorDetail,
}

/// Gemini error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiErrorDetail {
    /// Error code
    pub code: i32,

    /// Error message
    pub message: String,

    /// Error status
    #[serde(default)]
    pub status: String,
}

// ============================================================================
// Constants
// ============================================================================

/// Gemini models
pub mod models {
    pub const GEMINI_2_0_FLASH: &str = "gemini-2.0-flash";
}

/// Finish reasons
pub mod finish_reason {
    pub const SAFETY: &str = "SAFETY";
    pub const RECITATION: &str = "RECITATION";
    pub const BLOCKLIST: &str = "BLOCKLIST";
    pub const PROHIBITED_CONTENT: &str = "PROHIBITED_CONTENT";
}

// ============================================================================
// Tests
// ============================================================================
