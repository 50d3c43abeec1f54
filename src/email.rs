use anyhow::{Context, Result};
use askama::Template;
use campushub_core::{contact::ContactMessage, partner::PartnerRequest};
use lettre::{
    Message, SmtpTransport, Transport,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{info, warn};

use crate::config::EmailConfig;

/// Sends association-inbox notifications over SMTP. Delivery is best
/// effort: an unreachable relay is logged and the request that
/// triggered the email still succeeds.
#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from: String,
    inbox: String,
    base_url: String,
    skip_sending: bool,
}

#[derive(Template)]
#[template(path = "emails/contact-message.html")]
struct ContactMessageHtmlTemplate<'a> {
    message: &'a ContactMessage,
}

#[derive(Template)]
#[template(path = "emails/contact-message.txt")]
struct ContactMessageTextTemplate<'a> {
    message: &'a ContactMessage,
}

#[derive(Template)]
#[template(path = "emails/partner-request.html")]
struct PartnerRequestHtmlTemplate<'a> {
    request: &'a PartnerRequest,
    review_url: &'a str,
}

#[derive(Template)]
#[template(path = "emails/partner-request.txt")]
struct PartnerRequestTextTemplate<'a> {
    request: &'a PartnerRequest,
    review_url: &'a str,
}

impl EmailService {
    /// Create a new email service from configuration
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let mailer = if config.smtp_username.is_empty() || config.smtp_password.is_empty() {
            info!(
                smtp_host = %config.smtp_host,
                smtp_port = config.smtp_port,
                "SMTP credentials not configured, using unauthenticated connection (e.g., MailDev)"
            );
            // Use builder_dangerous for unauthenticated SMTP (e.g., MailDev)
            SmtpTransport::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build()
        } else {
            info!(
                smtp_host = %config.smtp_host,
                smtp_port = config.smtp_port,
                from = %config.from_email,
                "Email service initialized with authentication and TLS"
            );
            // SmtpTransport::relay() uses STARTTLS by default, which is
            // what most relays on port 587 expect.
            let creds =
                Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());
            SmtpTransport::relay(&config.smtp_host)?
                .port(config.smtp_port)
                .credentials(creds)
                .build()
        };

        Ok(Self {
            mailer,
            from: format!("{} <{}>", config.from_name, config.from_email),
            inbox: config.inbox_email.clone(),
            base_url: config.base_url.clone(),
            skip_sending: false,
        })
    }

    /// Create a mock email service for testing. Templates still render,
    /// but no SMTP connection is ever made.
    pub fn new_mock(config: &EmailConfig) -> Self {
        let mailer = SmtpTransport::builder_dangerous("localhost")
            .port(1025)
            .build();

        info!(
            from = %config.from_email,
            "Mock email service initialized (SMTP calls skipped)"
        );

        Self {
            mailer,
            from: format!("{} <{}>", config.from_name, config.from_email),
            inbox: config.inbox_email.clone(),
            base_url: config.base_url.clone(),
            skip_sending: true,
        }
    }

    /// Forward a contact form submission to the association inbox.
    pub async fn send_contact_notification(&self, message: &ContactMessage) -> Result<()> {
        let html = ContactMessageHtmlTemplate { message }
            .render()
            .context("Failed to render contact notification (html)")?;
        let text = ContactMessageTextTemplate { message }
            .render()
            .context("Failed to render contact notification (text)")?;

        self.deliver(
            format!("Contact form: {}", message.subject),
            &message.email,
            html,
            text,
        )
    }

    /// Tell the committee a partnership request is waiting for review.
    pub async fn send_partner_request_notification(&self, request: &PartnerRequest) -> Result<()> {
        let review_url = format!("{}/admin/partners", self.base_url);
        let html = PartnerRequestHtmlTemplate {
            request,
            review_url: &review_url,
        }
        .render()
        .context("Failed to render partner request notification (html)")?;
        let text = PartnerRequestTextTemplate {
            request,
            review_url: &review_url,
        }
        .render()
        .context("Failed to render partner request notification (text)")?;

        self.deliver(
            format!("Partnership request from {}", request.org_name),
            &request.email,
            html,
            text,
        )
    }

    fn deliver(&self, subject: String, reply_to: &str, html: String, text: String) -> Result<()> {
        let email = Message::builder()
            .from(self.from.parse().context("Failed to parse from address")?)
            .to(self.inbox.parse().context("Failed to parse inbox address")?)
            .reply_to(reply_to.parse().context("Failed to parse reply-to address")?)
            .subject(&subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .context("Failed to build notification email")?;

        if self.skip_sending {
            info!(subject = %subject, "Mock email service: skipping SMTP send");
            return Ok(());
        }

        match self.mailer.send(&email) {
            Ok(_) => {
                info!(subject = %subject, to = %self.inbox, "Notification email sent");
                Ok(())
            }
            Err(e) => {
                // The form submission already succeeded; losing the
                // notification must not fail the request.
                warn!(error = %e, subject = %subject, "Failed to send notification email");
                Ok(())
            }
        }
    }
}
