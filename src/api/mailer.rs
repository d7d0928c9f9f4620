//! Email delivery abstraction and the Mailgun sender.
//!
//! The default sender for local dev is `LogMailer`, which logs the message
//! and returns `Ok(())`. `MailgunMailer` posts to the Mailgun HTTP API.

use crate::APP_USER_AGENT;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::info;

/// Email delivery abstraction used by the login flow.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error so the caller can surface the
    /// failure to the requesting user.
    async fn send(&self, to: &str, subject: &str, text: &str, html: &str) -> Result<()>;
}

/// Local dev sender that logs the login link instead of emailing it.
#[derive(Clone, Debug)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, text: &str, _html: &str) -> Result<()> {
        info!(to, subject, body = text, "email send stub");
        Ok(())
    }
}

pub struct MailgunMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    from: String,
}

impl MailgunMailer {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(domain: String, api_key: SecretString, from: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("https://api.mailgun.net/v3/{domain}/messages"),
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, to: &str, subject: &str, text: &str, html: &str) -> Result<()> {
        let form = [
            ("from", self.from.as_str()),
            ("to", to),
            ("subject", subject),
            ("text", text),
            ("html", html),
        ];
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(self.api_key.expose_secret()))
            .form(&form)
            .send()
            .await
            .context("Mailgun request failed")?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(anyhow!("Mailgun returned {status}"))
        }
    }
}

/// `From` header in the `Title <addr>` form.
#[must_use]
pub fn from_header(site_title: &str, from_email: &str) -> String {
    format!("{site_title} <{from_email}>")
}

/// Subject plus text and HTML bodies for the login email.
#[must_use]
pub fn login_email(site_title: &str, verify_url: &str) -> (String, String, String) {
    let subject = format!("Your login link for {site_title}");

    let text = format!(
        "Welcome to {site_title}\n\n\
         Click the link below to log in:\n\
         {verify_url}\n\n\
         This link expires in 15 minutes.\n\
         If you didn't request this link, you can safely ignore this email.\n"
    );

    let html = format!(
        r#"<html>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h2>Welcome to {site_title}</h2>
    <p>Click the link below to log in:</p>
    <p>
      <a href="{verify_url}"
         style="background-color: #007bff; color: white; padding: 12px 24px;
                text-decoration: none; border-radius: 4px; display: inline-block;">
        Log In
      </a>
    </p>
    <p style="color: #666; font-size: 12px;">
      Or paste this link in your browser: <br/>
      {verify_url}
    </p>
    <p style="color: #999; font-size: 12px;">
      This link expires in 15 minutes. If you didn't request this link, you can
      safely ignore this email.
    </p>
  </body>
</html>
"#
    );

    (subject, text, html)
}
