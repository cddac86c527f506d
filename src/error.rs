use std::error::Error;
use std::fmt;

/// Failure taxonomy of the synchronization client.
///
/// `Server` carries an application-level rejection message verbatim;
/// `Precondition` is a locally detected rejection for which no request was
/// sent. The remaining variants are transport/decode/filesystem failures
/// whose detail goes to the log, not the user.
#[derive(Debug)]
pub enum ClientError {
    Transport(reqwest::Error),
    Decode(serde_json::Error),
    Server(String),
    Precondition(String),
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Transport(err) => write!(f, "transport failure: {err}"),
            ClientError::Decode(err) => write!(f, "could not decode response: {err}"),
            ClientError::Server(message) => write!(f, "{message}"),
            ClientError::Precondition(message) => write!(f, "{message}"),
            ClientError::Io(err) => write!(f, "i/o failure: {err}"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::Transport(err) => Some(err),
            ClientError::Decode(err) => Some(err),
            ClientError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err)
    }
}

impl ClientError {
    /// Messages in these variants are meant for the user as-is; everything
    /// else is summarized behind a generic localized notification.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            ClientError::Server(message) | ClientError::Precondition(message) => Some(message),
            _ => None,
        }
    }
}
