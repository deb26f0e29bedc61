use thiserror::Error;

/// Failure taxonomy for one client action. Malformed agent payloads are not
/// represented here — those degrade to empty text inside the renderer and
/// never cross this boundary. Every variant is per-action and recoverable by
/// retrying the user action; nothing is fatal to the process.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport failure before a response arrived.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server-reported application error: an `error` field inside a 200.
    #[error("server error: {message}")]
    Api { message: String },

    /// Non-OK HTTP status, with the server-provided message when there is
    /// one and a generic fallback otherwise.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response was 200 but did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}
