use serde_json::Value;

use crate::api::{DebateStateResponse, LoadDebateResponse};
use crate::message::DebateRound;

/// Explicit client-side session state. The old web client kept this in
/// module-level globals (`debateStarted`, `currentRound`, `userMessages`);
/// here every handler takes and returns this struct, and rendering is a pure
/// function of it.
#[derive(Debug, Clone, Default)]
pub struct DebateSession {
    pub topic: String,
    /// Ordered rounds; displayed round number = index + 1.
    pub history: Vec<DebateRound>,
    pub prd_state: Value,
    /// Server-reported round counter (falls back to history length).
    pub round: u32,
    /// Set when the backend reports the debate has concluded.
    pub done: bool,
    /// Mentions the user has directed at rounds so far.
    pub mentions: Vec<String>,
}

impl DebateSession {
    /// Fresh session from a `start_debate` response.
    pub fn start(topic: &str, response: DebateStateResponse) -> Self {
        let round = response.round.unwrap_or(response.history.len() as u32);
        DebateSession {
            topic: topic.to_string(),
            history: response.history,
            prd_state: response.prd_state,
            round,
            done: response.done.unwrap_or(false),
            mentions: Vec::new(),
        }
    }

    /// Absorb a `continue_debate` response. The backend returns the full
    /// history each time, so prior state is replaced, not appended to.
    pub fn apply_round(&mut self, mention: &str, response: DebateStateResponse) {
        if !mention.is_empty() {
            self.mentions.push(mention.to_string());
        }
        self.round = response.round.unwrap_or(response.history.len() as u32);
        self.history = response.history;
        self.prd_state = response.prd_state;
        self.done = response.done.unwrap_or(false);
    }

    /// Rebuild a session from a saved-session load.
    pub fn from_loaded(session_id: &str, response: LoadDebateResponse) -> Self {
        let round = response
            .round_number
            .unwrap_or(response.history.len() as u32);
        DebateSession {
            topic: format!("session {session_id}"),
            history: response.history,
            prd_state: response.prd_state,
            round,
            done: false,
            mentions: Vec::new(),
        }
    }

    pub fn round_count(&self) -> usize {
        self.history.len()
    }
}
