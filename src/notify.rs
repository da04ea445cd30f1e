//! Mailing the finished report.

use lettre::address::AddressError;
use lettre::message::header::{ContentType, ContentTypeErr};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{info, warn};
use thiserror::Error;

use crate::config::MailConfig;
use crate::report::{PDF_CONTENT_TYPE, PDF_FILE_NAME};

pub const SUBJECT: &str = "SmartDrive Report";

const BODY: &str = "Hello,

Please find attached your smart driving report.
Thank you for using SmartDrive!
";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Email settings not completed")]
    NotConfigured,
    #[error("invalid {role} address '{address}'")]
    Address {
        role: &'static str,
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("invalid attachment content type")]
    ContentType(#[source] ContentTypeErr),
    #[error("failed to compose message")]
    Compose(#[source] lettre::error::Error),
    #[error("failed to set up connection to relay {host}:{port}")]
    Relay {
        host: String,
        port: u16,
        #[source]
        source: lettre::transport::smtp::Error,
    },
    #[error("relay did not accept the message")]
    Delivery(#[source] BoxError),
}

/// Delivers a report to a recipient.
pub trait Notifier {
    fn send(&self, recipient: &str, report: &[u8]) -> Result<(), SendError>;
}

fn mailbox(role: &'static str, address: &str) -> Result<Mailbox, SendError> {
    address.trim().parse().map_err(|source| SendError::Address {
        role,
        address: address.to_owned(),
        source,
    })
}

/// Builds the report message: a short plain-text body plus the PDF attachment.
pub fn compose_message(
    sender: &str,
    recipient: &str,
    report: &[u8],
) -> Result<Message, SendError> {
    let content_type = ContentType::parse(PDF_CONTENT_TYPE).map_err(SendError::ContentType)?;

    Message::builder()
        .from(mailbox("sender", sender)?)
        .to(mailbox("recipient", recipient)?)
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_owned()))
                .singlepart(
                    Attachment::new(PDF_FILE_NAME.to_owned()).body(report.to_vec(), content_type),
                ),
        )
        .map_err(SendError::Compose)
}

/// Hands a composed message to any lettre transport.
pub fn deliver<T>(transport: &T, message: &Message) -> Result<(), SendError>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    transport
        .send(message)
        .map(|_| ())
        .map_err(|err| SendError::Delivery(Box::new(err)))
}

/// Sends reports through an authenticated SMTPS relay.
///
/// A fresh transport is opened per send; nothing is pooled between
/// submissions.
#[derive(Clone, Debug)]
pub struct SmtpNotifier {
    config: MailConfig,
}

impl SmtpNotifier {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    fn transport(&self) -> Result<SmtpTransport, SendError> {
        let config = &self.config;
        let builder = SmtpTransport::relay(&config.relay_host).map_err(|source| {
            SendError::Relay {
                host: config.relay_host.clone(),
                port: config.relay_port,
                source,
            }
        })?;

        Ok(builder
            .port(config.relay_port)
            .credentials(Credentials::new(
                config.sender_address.clone(),
                config.sender_credential.clone(),
            ))
            .timeout(Some(config.timeout))
            .build())
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, recipient: &str, report: &[u8]) -> Result<(), SendError> {
        let message = compose_message(&self.config.sender_address, recipient, report)?;
        let transport = self.transport()?;

        match deliver(&transport, &message) {
            Ok(()) => {
                info!(
                    "report mailed via {}:{}",
                    self.config.relay_host, self.config.relay_port
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "mail delivery via {}:{} failed: {err}",
                    self.config.relay_host, self.config.relay_port
                );
                Err(err)
            }
        }
    }
}
