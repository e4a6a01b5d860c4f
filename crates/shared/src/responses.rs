//! Response bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntryDto {
    pub id: i64,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroPromptResponse {
    pub user_entry: HistoryEntryDto,
    pub ai_entry: HistoryEntryDto,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RollbackResponse {
    pub deleted: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StartRunResponse {
    pub run_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImportTemplateResponse {
    pub template_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateHeroResponse {
    pub hero_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummaryDto {
    pub id: i64,
    pub template_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub primary_hero_id: Option<i64>,
    pub is_waiting_ai: bool,
    pub rollback_min_history_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSummaryDto {
    pub id: i64,
    pub author: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
}
