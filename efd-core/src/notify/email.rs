use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::NotifySection;

use super::{attachment_name, Notifier, NotifierError, NotifyResult};

pub const USERNAME_ENV: &str = "EFD_SMTP_USERNAME";
pub const PASSWORD_ENV: &str = "EFD_SMTP_PASSWORD";

#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl SmtpCredentials {
    pub fn from_env() -> NotifyResult<Self> {
        let read = |key: &str| {
            std::env::var(key)
                .map_err(|_| NotifierError::Configuration(format!("{key} is not set")))
        };
        Ok(Self {
            username: read(USERNAME_ENV)?,
            password: read(PASSWORD_ENV)?,
        })
    }
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sends run summaries over SMTP with STARTTLS.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    server: String,
    port: u16,
    timeout: Duration,
    from: Mailbox,
    to: Vec<Mailbox>,
    credentials: SmtpCredentials,
}

impl EmailNotifier {
    /// Returns `Ok(None)` when no recipient is configured.
    pub fn from_config(
        section: &NotifySection,
        credentials: SmtpCredentials,
    ) -> NotifyResult<Option<Self>> {
        if !section.enabled() {
            return Ok(None);
        }
        let to = section
            .active_recipients()
            .map(str::parse)
            .collect::<Result<Vec<Mailbox>, _>>()?;
        let sender = section
            .sender
            .clone()
            .unwrap_or_else(|| credentials.username.clone());
        Ok(Some(Self {
            server: section.smtp_server.clone(),
            port: section.smtp_port,
            timeout: Duration::from_secs(section.smtp_timeout_seconds),
            from: sender.trim().parse()?,
            to,
            credentials,
        }))
    }

    fn build_message(
        &self,
        subject: &str,
        body: &str,
        attachments: Vec<(String, Vec<u8>)>,
    ) -> NotifyResult<Message> {
        let builder = self
            .to
            .iter()
            .fold(Message::builder().from(self.from.clone()), |builder, to| {
                builder.to(to.clone())
            })
            .subject(subject);
        if attachments.is_empty() {
            return Ok(builder
                .header(ContentType::TEXT_PLAIN)
                .body(body.to_string())?);
        }

        let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(body.to_string()));
        let json = ContentType::parse("application/json")
            .map_err(|err| NotifierError::Configuration(err.to_string()))?;
        for (name, bytes) in attachments {
            multipart = multipart.singlepart(Attachment::new(name).body(bytes, json.clone()));
        }
        Ok(builder.multipart(multipart)?)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, subject: &str, body: &str, attachments: &[PathBuf]) -> NotifyResult<()> {
        let mut loaded = Vec::with_capacity(attachments.len());
        for path in attachments {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| NotifierError::Attachment {
                    path: path.clone(),
                    source,
                })?;
            info!(path = %path.display(), "attached file");
            loaded.push((attachment_name(path), bytes));
        }
        let message = self.build_message(subject, body, loaded)?;

        let mailer = SmtpTransport::starttls_relay(&self.server)?
            .port(self.port)
            .credentials(Credentials::new(
                self.credentials.username.clone(),
                self.credentials.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build();

        // lettre's SmtpTransport blocks; keep it off the runtime threads.
        tokio::task::spawn_blocking(move || mailer.send(&message)).await??;
        info!(recipients = self.to.len(), "notification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SmtpCredentials {
        SmtpCredentials {
            username: "scraper@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn missing_recipients_disable_email() {
        let notifier = EmailNotifier::from_config(&NotifySection::default(), credentials()).unwrap();
        assert!(notifier.is_none());
    }

    #[test]
    fn sender_defaults_to_smtp_username() {
        let section = NotifySection {
            recipients: vec!["ops@example.com".to_string()],
            ..NotifySection::default()
        };
        let notifier = EmailNotifier::from_config(&section, credentials())
            .unwrap()
            .unwrap();
        assert_eq!(notifier.from.email.to_string(), "scraper@example.com");
        assert_eq!(notifier.port, 587);
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let section = NotifySection {
            recipients: vec!["ops@example.com".to_string(), "not an address".to_string()],
            ..NotifySection::default()
        };
        assert!(matches!(
            EmailNotifier::from_config(&section, credentials()),
            Err(NotifierError::Address(_))
        ));
    }

    #[test]
    fn debug_output_redacts_password() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn every_recipient_is_addressed() {
        let section = NotifySection {
            recipients: vec![
                "ops@example.com".to_string(),
                " ".to_string(),
                "desk@example.com".to_string(),
            ],
            ..NotifySection::default()
        };
        let notifier = EmailNotifier::from_config(&section, credentials())
            .unwrap()
            .unwrap();
        let message = notifier.build_message("subject", "body", Vec::new()).unwrap();
        let to: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(|address| address.to_string())
            .collect();
        assert_eq!(to, vec!["ops@example.com", "desk@example.com"]);
    }

    #[tokio::test]
    async fn missing_attachment_fails_before_connecting() {
        let section = NotifySection {
            recipients: vec!["ops@example.com".to_string()],
            ..NotifySection::default()
        };
        let notifier = EmailNotifier::from_config(&section, credentials())
            .unwrap()
            .unwrap();
        let err = notifier
            .send("subject", "body", &[PathBuf::from("/nonexistent/report.json")])
            .await
            .unwrap_err();
        assert!(matches!(err, NotifierError::Attachment { .. }));
    }
}
