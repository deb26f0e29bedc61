use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::DebateRound;

// -- Debate lifecycle -------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StartDebateRequest {
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct ContinueDebateRequest {
    pub mention: String,
}

/// Shared response shape of `start_debate` and `continue_debate`: the full
/// history so far plus the current PRD state. `round` and `done` are only
/// present on newer backend revisions.
#[derive(Debug, Clone, Deserialize)]
pub struct DebateStateResponse {
    #[serde(default)]
    pub history: Vec<DebateRound>,
    #[serde(default)]
    pub prd_state: Value,
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub done: Option<bool>,
}

// -- Chat -------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LlmChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AgentChatRequest {
    pub agent: String,
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub answer: String,
}

// -- Persistence ------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SaveDebateResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadDebateResponse {
    #[serde(default)]
    pub history: Vec<DebateRound>,
    #[serde(default)]
    pub prd_state: Value,
    #[serde(default)]
    pub round_number: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListSessionsResponse {
    #[serde(default)]
    pub sessions: Vec<String>,
}

// -- PRD --------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PrdTextResponse {
    #[serde(default)]
    pub text: String,
}
