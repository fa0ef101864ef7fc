use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error (status {status}): {body}")]
    ApiError { status: u16, body: String },
}

#[derive(Clone)]
pub struct EmailConfig {
    pub scw_secret_key: String,
    pub scw_project_id: String,
    pub scw_region: String,
    pub sender_email: String,
    pub sender_name: String,
}

impl EmailConfig {
    pub fn from_env() -> Option<Self> {
        let scw_secret_key = std::env::var("SCW_SECRET_KEY").ok()?;
        let scw_project_id = std::env::var("SCW_DEFAULT_PROJECT_ID").ok()?;
        let sender_email = std::env::var("SCW_SENDER_EMAIL").ok()?;

        Some(Self {
            scw_secret_key,
            scw_project_id,
            scw_region: std::env::var("SCW_REGION").unwrap_or_else(|_| "fr-par".to_string()),
            sender_email,
            sender_name: std::env::var("SCW_SENDER_NAME")
                .unwrap_or_else(|_| "Reservation Bear".to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// A fully rendered message, ready for the transport.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub attachment: Option<Attachment>,
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    client: reqwest::Client,
}

// ── Shared HTML layout ──────────────────────────────────────────────

/// Builds the full HTML email wrapped in the branded layout shell.
pub(crate) fn wrap_in_layout(heading: &str, accent_icon: &str, body_html: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{heading}</title>
</head>
<body style="margin:0;padding:0;background-color:#faf7f2;color:#3f3f46;font-family:Georgia,'Times New Roman',serif;-webkit-text-size-adjust:100%;-ms-text-size-adjust:100%;">

<table role="presentation" width="100%" cellpadding="0" cellspacing="0" border="0" style="background-color:#faf7f2;">
<tr><td align="center" style="padding:32px 16px 48px;">

  <table role="presentation" width="560" cellpadding="0" cellspacing="0" border="0" style="max-width:560px;background-color:#ffffff;border:1px solid #e7e1d8;border-top:3px solid #b45309;">

    <tr><td align="center" style="padding:32px 40px 0;">
      <div style="font-size:40px;line-height:1;margin-bottom:12px;">{accent_icon}</div>
      <h1 style="margin:0;font-size:26px;font-weight:normal;color:#b45309;letter-spacing:1px;">{heading}</h1>
    </td></tr>

    <tr><td style="padding:28px 40px 0;">
      {body_html}
    </td></tr>

    <tr><td align="center" style="padding:20px 40px 36px;">
      <p style="margin:0;font-family:Arial,Helvetica,sans-serif;font-size:11px;color:#a1a1aa;line-height:1.6;letter-spacing:0.5px;">
        Table reservations<br>
        &copy; Reservation Bear
      </p>
    </td></tr>

  </table>

</td></tr>
</table>

</body>
</html>"##
    )
}

/// Builds a styled CTA button.
pub(crate) fn cta_button(href: &str, label: &str) -> String {
    format!(
        r#"<table role="presentation" cellpadding="0" cellspacing="0" border="0" style="margin:8px auto 22px;">
<tr><td align="center" style="background-color:#b45309;border-radius:4px;">
  <a href="{href}" target="_blank" style="display:inline-block;padding:14px 40px;font-family:Arial,Helvetica,sans-serif;font-size:14px;font-weight:bold;color:#ffffff;text-decoration:none;letter-spacing:1px;text-transform:uppercase;">{label}</a>
</td></tr>
</table>"#
    )
}

/// Builds a body paragraph.
pub(crate) fn paragraph(text: &str) -> String {
    format!(
        r#"<p style="margin:0 0 18px;font-size:16px;line-height:1.7;color:#3f3f46;">{text}</p>"#
    )
}

/// Builds a muted/secondary paragraph.
pub(crate) fn muted_paragraph(text: &str) -> String {
    format!(
        r#"<p style="margin:0 0 18px;font-family:Arial,Helvetica,sans-serif;font-size:13px;line-height:1.6;color:#71717a;">{text}</p>"#
    )
}

/// Wraps text in an accent bold span.
pub(crate) fn highlight(text: &str) -> String {
    format!(r#"<strong style="color:#b45309;">{text}</strong>"#)
}

// ── EmailService implementation ─────────────────────────────────────

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, email: &OutgoingEmail) -> serde_json::Value {
        let mut body = json!({
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name,
            },
            "to": [{
                "email": email.to_email,
                "name": email.to_name,
            }],
            "subject": email.subject,
            "html": email.html,
            "text": email.text,
            "project_id": self.config.scw_project_id,
        });

        if let Some(attachment) = &email.attachment {
            body["attachments"] = json!([{
                "name": attachment.name,
                "type": attachment.content_type,
                "content": BASE64.encode(&attachment.content),
            }]);
        }

        body
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let url = format!(
            "https://api.scaleway.com/transactional-email/v1alpha1/regions/{}/emails",
            self.config.scw_region
        );

        let response = self
            .client
            .post(&url)
            .header("X-Auth-Token", &self.config.scw_secret_key)
            .json(&self.request_body(email))
            .send()
            .await
            .map_err(|e| EmailError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::ApiError { status, body });
        }

        info!("Email sent to {} ({})", email.to_email, email.subject);
        Ok(())
    }
}

// ── Fire-and-forget helper ──────────────────────────────────────────

/// Fire-and-forget email helper. Logs errors but never fails.
pub fn spawn_email(email_service: Option<&EmailService>, email: OutgoingEmail) {
    let Some(email_service) = email_service.cloned() else {
        info!(
            "Mail transport not configured, dropping '{}' to {}",
            email.subject, email.to_email
        );
        return;
    };

    tokio::spawn(async move {
        if let Err(e) = email_service.send(&email).await {
            warn!("Failed to send email to {}: {}", email.to_email, e);
        }
    });
}
