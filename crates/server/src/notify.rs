use crate::config::EmailConfig;
use async_trait::async_trait;
use database::entities::students;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use log::{info, warn};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Outbound message channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str)
    -> Result<(), NotificationError>;
}

/// Plain-text mail over SMTP with STARTTLS
pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(recipient.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotificationError::Build(e.to_string()))?;

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
            .port(self.config.smtp_port);
        if let (Some(user), Some(password)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport = transport.credentials(Credentials::new(user.clone(), password.clone()));
        }

        transport.build().send(email).await?;
        info!("Sent \"{subject}\" to {recipient}");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        info!("Mail to {recipient}: {subject}\n{body}");
        Ok(())
    }
}

fn welcome_message(student: &students::Model) -> (String, String) {
    let subject = format!("Welcome to Student Management System, {}!", student.first_name);
    let body = format!(
        "Welcome to Student Management System!\n\
         \n\
         Your account has been successfully created.\n\
         \n\
         Account Details:\n\
         - Name: {}\n\
         - Email: {}\n\
         - Registration No: {}\n\
         - Username/Email: {}\n",
        student.full_name(),
        student.email,
        student.reg_no,
        student.email,
    );
    (subject, body)
}

/// Sends the welcome mail within `limit`; failures are logged and reported as `false`
pub async fn send_welcome(notifier: &dyn Notifier, limit: Duration, student: &students::Model) -> bool {
    let (subject, body) = welcome_message(student);

    let outcome = match tokio::time::timeout(limit, notifier.send(&student.email, &subject, &body)).await {
        Ok(result) => result,
        Err(_) => Err(NotificationError::Timeout(limit)),
    };

    match outcome {
        Ok(()) => true,
        Err(err) => {
            warn!("Welcome email to {} not sent: {err}", student.email);
            false
        }
    }
}
