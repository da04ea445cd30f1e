//! Mail delivery settings.
//!
//! Nothing here is hardcoded: the binary fills [`MailConfig`] from command line
//! flags or `SMARTDRIVE_*` environment variables.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_RELAY_HOST: &str = "smtp.gmail.com";

/// Implicit TLS (SMTPS) port.
pub const DEFAULT_RELAY_PORT: u16 = 465;

pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a sender address was given without a sender credential")]
    MissingCredential,
    #[error("a sender credential was given without a sender address")]
    MissingSenderAddress,
    #[error("relay host must not be empty")]
    EmptyRelayHost,
    #[error("relay port must be non-zero")]
    ZeroPort,
    #[error("SMTP timeout must be non-zero")]
    ZeroTimeout,
}

/// Sender identity and relay used by [`crate::notify::SmtpNotifier`].
#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub sender_address: String,
    pub sender_credential: String,
    pub relay_host: String,
    pub relay_port: u16,
    pub timeout: Duration,
}

impl MailConfig {
    /// Creates a configuration for the default relay.
    pub fn new(sender_address: impl Into<String>, sender_credential: impl Into<String>) -> Self {
        Self {
            sender_address: sender_address.into(),
            sender_credential: sender_credential.into(),
            relay_host: DEFAULT_RELAY_HOST.to_owned(),
            relay_port: DEFAULT_RELAY_PORT,
            timeout: DEFAULT_SMTP_TIMEOUT,
        }
    }

    /// Sets the relay host and port and returns the updated configuration.
    pub fn with_relay(mut self, host: impl Into<String>, port: u16) -> Self {
        self.relay_host = host.into();
        self.relay_port = port;
        self
    }

    /// Sets the SMTP timeout and returns the updated configuration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the relay settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay_host.trim().is_empty() {
            return Err(ConfigError::EmptyRelayHost);
        }
        if self.relay_port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Assembles a configuration from optional sender settings.
    ///
    /// Returns `Ok(None)` when neither sender address nor credential is set, in
    /// which case reports are still generated but cannot be mailed.
    pub fn from_parts(
        sender_address: Option<String>,
        sender_credential: Option<String>,
        relay_host: impl Into<String>,
        relay_port: u16,
        timeout: Duration,
    ) -> Result<Option<Self>, ConfigError> {
        let present = |value: Option<String>| value.filter(|value| !value.trim().is_empty());

        let config = match (present(sender_address), present(sender_credential)) {
            (None, None) => return Ok(None),
            (Some(_), None) => return Err(ConfigError::MissingCredential),
            (None, Some(_)) => return Err(ConfigError::MissingSenderAddress),
            (Some(address), Some(credential)) => MailConfig::new(address, credential)
                .with_relay(relay_host, relay_port)
                .with_timeout(timeout),
        };

        config.validate()?;
        Ok(Some(config))
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("sender_address", &self.sender_address)
            .field("sender_credential", &"<redacted>")
            .field("relay_host", &self.relay_host)
            .field("relay_port", &self.relay_port)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(
        address: Option<&str>,
        credential: Option<&str>,
    ) -> Result<Option<MailConfig>, ConfigError> {
        MailConfig::from_parts(
            address.map(str::to_owned),
            credential.map(str::to_owned),
            DEFAULT_RELAY_HOST,
            DEFAULT_RELAY_PORT,
            DEFAULT_SMTP_TIMEOUT,
        )
    }

    #[test]
    fn no_sender_means_no_mail() {
        assert_eq!(parts(None, None), Ok(None));
        assert_eq!(parts(Some("  "), Some("")), Ok(None));
    }

    #[test]
    fn half_configured_sender_is_an_error() {
        assert_eq!(
            parts(Some("reports@example.com"), None),
            Err(ConfigError::MissingCredential)
        );
        assert_eq!(parts(None, Some("secret")), Err(ConfigError::MissingSenderAddress));
    }

    #[test]
    fn complete_sender_uses_relay_defaults() {
        let config = parts(Some("reports@example.com"), Some("secret")).unwrap().unwrap();
        assert_eq!(config.relay_host, DEFAULT_RELAY_HOST);
        assert_eq!(config.relay_port, 465);
        assert_eq!(config.timeout, DEFAULT_SMTP_TIMEOUT);
    }

    #[test]
    fn invalid_relay_settings_are_rejected() {
        let config = MailConfig::new("a@example.com", "pw");
        assert_eq!(
            config.clone().with_relay("", 465).validate(),
            Err(ConfigError::EmptyRelayHost)
        );
        assert_eq!(
            config.clone().with_relay("smtp.example.com", 0).validate(),
            Err(ConfigError::ZeroPort)
        );
        assert_eq!(
            config.with_timeout(Duration::ZERO).validate(),
            Err(ConfigError::ZeroTimeout)
        );
    }

    #[test]
    fn debug_output_hides_the_credential() {
        let rendered = format!("{:?}", MailConfig::new("a@example.com", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
