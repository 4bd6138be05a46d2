//! Outbound email via async SMTP.
//!
//! The mailer is fire-and-forget from the request path: handlers call the
//! `send_*` helpers, which spawn the delivery and log failures instead of
//! surfacing them to the user.

use lettre::{
    message::{header::ContentType, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::{SmtpConfig, DEV_SMTP_HOST, DEV_SMTP_PORT};
use crate::models::user;

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),
}

/// Async SMTP mailer with a development fallback.
///
/// When SMTP is disabled and the environment is not production, delivery
/// goes to the local mail-catcher (MailHog / Mailpit) on 127.0.0.1:1025
/// with no TLS and no credentials.
#[derive(Clone)]
pub struct Mailer {
    smtp: SmtpConfig,
    site_name: String,
    production: bool,
}

impl Mailer {
    pub fn new(smtp: SmtpConfig, site_name: String, production: bool) -> Self {
        Mailer {
            smtp,
            site_name,
            production,
        }
    }

    /// Send one message and wait for the SMTP exchange to finish.
    pub async fn send(
        &self,
        recipient: &str,
        subject: &str,
        plain_text: &str,
        html: Option<&str>,
    ) -> Result<(), MailError> {
        let builder = Message::builder()
            .from(self.smtp.username.parse()?)
            .to(recipient.parse()?)
            .subject(subject);

        let email = match html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                plain_text.to_string(),
                html.to_string(),
            ))?,
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(plain_text.to_string())?,
        };

        let transport = self.transport()?;
        transport.send(email).await?;

        tracing::info!(to = recipient, subject, "Email sent");
        Ok(())
    }

    /// Queue a message without awaiting delivery. Failures are logged.
    pub fn send_detached(&self, recipient: String, subject: String, plain_text: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(err) = mailer.send(&recipient, &subject, &plain_text, None).await {
                tracing::error!(to = %recipient, "Failed to send email: {err}");
            }
        });
    }

    /// Email-verification message with the confirmation link.
    pub fn send_verification_email(&self, user: &user::Model, verification_link: &str) {
        let subject = format!("Confirm your email address for {}", self.site_name);
        let body = format!(
            "Dear {},\n\n\
             To confirm your email address, please follow the link:\n\
             {}\n\n\
             Thank you for registering at {}!\n",
            user.first_name, verification_link, self.site_name
        );
        self.send_detached(user.email.clone(), subject, body);
    }

    /// Notification that the email address has been confirmed.
    pub fn send_email_confirmed(&self, user: &user::Model) {
        let subject = format!("Your email address at {} is confirmed", self.site_name);
        let body = format!(
            "Dear {},\n\n\
             Your email address has been confirmed. Welcome to {}!\n",
            user.first_name, self.site_name
        );
        self.send_detached(user.email.clone(), subject, body);
    }

    /// Password-reset message with the reset link.
    pub fn send_reset_password(&self, user: &user::Model, reset_link: &str) {
        let subject = format!("Reset your password at {}", self.site_name);
        let body = format!(
            "Dear {},\n\n\
             To reset your password, please follow the link:\n\
             {}\n\n\
             If you did not request this, you can ignore this message.\n",
            user.first_name, reset_link
        );
        self.send_detached(user.email.clone(), subject, body);
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        if self.smtp.enabled || self.production {
            let mut builder = if self.smtp.use_tls {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp.host)?
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.host)?
            }
            .port(self.smtp.port);

            if !self.smtp.password.is_empty() {
                builder = builder.credentials(Credentials::new(
                    self.smtp.username.clone(),
                    self.smtp.password.clone(),
                ));
            }

            Ok(builder.build())
        } else {
            // Development mail-catcher: plaintext, no auth
            Ok(
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(DEV_SMTP_HOST)
                    .port(DEV_SMTP_PORT)
                    .build(),
            )
        }
    }
}
