use thiserror::Error;

/// Errors produced at the transport boundary.
///
/// The session store converts these into user-facing outcomes; API modules
/// surface them unchanged so callers can branch on the failure class.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or protocol failure before a response body was obtained.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status. `message` carries the
    /// envelope message when the body had one, otherwise the raw body text.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A 2xx response whose body did not match the expected shape.
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The endpoint returned a success envelope with no `data` payload where
    /// one was required.
    #[error("response envelope carried no data")]
    MissingData,
}

impl ApiError {
    /// The message shown to a person, preferring what the server said.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
