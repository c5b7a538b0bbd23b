use thiserror::Error;

/// Errors that can occur while delivering alerts or handling credentials.
#[derive(Debug, Error)]
pub enum MailerError {
    /// Failed to build the SMTP transport
    #[error("SMTP transport error: {0}")]
    Transport(String),

    /// Failed to send an alert message
    #[error("failed to send alert: {0}")]
    Send(String),

    /// Failed to build an alert message
    #[error("failed to build message: {0}")]
    BuildMessage(String),

    /// Invalid email address
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// The delivery contract requires at least one recipient address
    #[error("no recipient addresses supplied")]
    NoRecipients,

    /// Credential store file is not valid JSON
    #[error("credential store error: {0}")]
    Store(String),

    /// IO error reading or writing the credential store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
