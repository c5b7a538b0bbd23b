use crate::error::MailerError;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::info;
use secrecy::{ExposeSecret, SecretString};
use std::env;

const ALERT_SUBJECT: &str = "Flood Forecast Alert";

/// Connection settings for the alert delivery account.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Sender address, also used as the login name.
    pub username: String,
    password: SecretString,
}

impl SmtpConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Read configuration from `FAN_SMTP_HOST`, `FAN_SMTP_PORT`,
    /// `FAN_SMTP_USERNAME` and `FAN_SMTP_PASSWORD`.
    pub fn from_env() -> Result<Self, MailerError> {
        let host = env::var("FAN_SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let port = env::var("FAN_SMTP_PORT")
            .unwrap_or_else(|_| "465".to_string())
            .parse::<u16>()
            .map_err(|e| MailerError::Transport(format!("invalid FAN_SMTP_PORT: {e}")))?;
        let username = env::var("FAN_SMTP_USERNAME")
            .map_err(|_| MailerError::Transport("FAN_SMTP_USERNAME not set".to_string()))?;
        let password = env::var("FAN_SMTP_PASSWORD")
            .map_err(|_| MailerError::Transport("FAN_SMTP_PASSWORD not set".to_string()))?;
        Ok(Self::new(host, port, username, password))
    }

    fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Result of one login attempt, an explicit state machine rather than
/// exception-driven control flow.
pub enum LoginOutcome {
    Success(MailSession),
    /// The server permanently rejected the credentials; the caller should
    /// re-prompt rather than retry the same pair.
    InvalidCredentials,
    /// Anything else: DNS, TLS, connectivity.
    Failed(String),
}

/// An authenticated SMTP session owned by the delivery layer.
///
/// The engine hands completed alert bodies to this object and never sees
/// credentials or transport state.
pub struct MailSession {
    transport: SmtpTransport,
    from_address: String,
}

impl MailSession {
    /// Build a TLS relay transport for the configured account. Does not
    /// touch the network until a send or login attempt.
    pub fn connect(config: &SmtpConfig) -> Result<Self, MailerError> {
        let creds = Credentials::new(config.username.clone(), config.password().to_string());
        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| MailerError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(creds)
            .build();
        info!("created SMTP session for {} via {}", config.username, config.host);
        Ok(Self {
            transport,
            from_address: config.username.clone(),
        })
    }

    /// Attempt to open and verify a session, classifying the outcome.
    pub fn login(config: &SmtpConfig) -> LoginOutcome {
        let session = match Self::connect(config) {
            Ok(session) => session,
            Err(e) => return LoginOutcome::Failed(e.to_string()),
        };
        match session.transport.test_connection() {
            Ok(true) => LoginOutcome::Success(session),
            Ok(false) => LoginOutcome::Failed("connection test failed".to_string()),
            // Permanent SMTP rejections on connect are authentication
            // failures; everything transient stays retryable as-is.
            Err(e) if e.is_permanent() => LoginOutcome::InvalidCredentials,
            Err(e) => LoginOutcome::Failed(e.to_string()),
        }
    }

    /// Send one alert body to a non-empty list of recipient addresses.
    pub fn send(&self, recipients: &[String], body: &str) -> Result<(), MailerError> {
        if recipients.is_empty() {
            return Err(MailerError::NoRecipients);
        }

        let from = self
            .from_address
            .parse()
            .map_err(|e| MailerError::InvalidAddress(format!("from {}: {e}", self.from_address)))?;
        let mut builder = Message::builder().from(from).subject(ALERT_SUBJECT);
        for recipient in recipients {
            let address = recipient
                .parse()
                .map_err(|e| MailerError::InvalidAddress(format!("to {recipient}: {e}")))?;
            builder = builder.to(address);
        }
        let message = builder
            .body(body.to_string())
            .map_err(|e| MailerError::BuildMessage(e.to_string()))?;

        self.transport
            .send(&message)
            .map_err(|e| MailerError::Send(e.to_string()))?;
        info!("alert sent to {} address(es)", recipients.len());
        Ok(())
    }
}

/// Drive login attempts through a bounded re-prompt loop.
///
/// The attempt closure performs one login (typically prompting for
/// credentials and calling [`MailSession::login`]). `InvalidCredentials`
/// triggers another prompt up to `max_attempts`; `Success` and `Failed`
/// end the loop immediately.
pub fn login_with_retries<F>(max_attempts: u32, mut attempt: F) -> LoginOutcome
where
    F: FnMut(u32) -> LoginOutcome,
{
    let mut outcome = LoginOutcome::Failed("no login attempts made".to_string());
    for n in 1..=max_attempts {
        outcome = attempt(n);
        match outcome {
            LoginOutcome::InvalidCredentials => continue,
            _ => return outcome,
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::{login_with_retries, LoginOutcome, MailSession, SmtpConfig};

    #[test]
    fn test_send_requires_recipients() {
        let config = SmtpConfig::new("localhost", 2525, "alerts@example.org", "pw");
        let session = MailSession::connect(&config).unwrap();
        assert!(matches!(
            session.send(&[], "body"),
            Err(crate::MailerError::NoRecipients)
        ));
    }

    #[test]
    fn test_retry_loop_reprompts_on_invalid_credentials() {
        let mut attempts = Vec::new();
        let outcome = login_with_retries(3, |n| {
            attempts.push(n);
            LoginOutcome::InvalidCredentials
        });
        assert_eq!(attempts, vec![1, 2, 3]);
        assert!(matches!(outcome, LoginOutcome::InvalidCredentials));
    }

    #[test]
    fn test_retry_loop_stops_on_success() {
        let mut calls = 0;
        let config = SmtpConfig::new("localhost", 2525, "alerts@example.org", "pw");
        let outcome = login_with_retries(3, |n| {
            calls += 1;
            if n == 2 {
                LoginOutcome::Success(MailSession::connect(&config).unwrap())
            } else {
                LoginOutcome::InvalidCredentials
            }
        });
        assert_eq!(calls, 2);
        assert!(matches!(outcome, LoginOutcome::Success(_)));
    }

    #[test]
    fn test_retry_loop_does_not_retry_hard_failures() {
        let mut calls = 0;
        let outcome = login_with_retries(3, |_| {
            calls += 1;
            LoginOutcome::Failed("relay unreachable".to_string())
        });
        assert_eq!(calls, 1);
        assert!(matches!(outcome, LoginOutcome::Failed(_)));
    }
}
