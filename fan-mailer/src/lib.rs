pub mod error;
pub mod secrets;
pub mod session;

pub use error::MailerError;
pub use session::{login_with_retries, LoginOutcome, MailSession, SmtpConfig};
