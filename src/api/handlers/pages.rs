//! Server-rendered pages for the login flow.
//!
//! The protected site itself is static; only these few auth pages are
//! rendered by the gateway, so they are built inline rather than through a
//! template engine.

use axum::response::Html;

const STYLE: &str = "font-family: -apple-system, Arial, sans-serif; max-width: 28rem; \
                     margin: 4rem auto; padding: 0 1rem; line-height: 1.6; color: #333;";

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{title}</title>
  </head>
  <body style="{STYLE}">
{body}
  </body>
</html>
"#
    ))
}

/// The login form. Posts the email to the magic link endpoint.
#[must_use]
pub(crate) fn login_page(site_title: &str) -> Html<String> {
    let site_title = escape_html(site_title);
    let body = format!(
        r#"    <h1>{site_title}</h1>
    <p>Enter your email address and we will send you a login link.</p>
    <form method="post" action="/auth/request-link">
      <input type="email" name="email" placeholder="you@example.com" required
             autofocus style="padding: 0.5rem; width: 100%; box-sizing: border-box;" />
      <button type="submit" style="margin-top: 0.75rem; padding: 0.5rem 1.5rem;">
        Send login link
      </button>
    </form>"#
    );
    page(&format!("Log in - {site_title}"), &body)
}

/// Shown after a magic link was issued.
#[must_use]
pub(crate) fn check_email_page(email: &str) -> Html<String> {
    let email = escape_html(email);
    let body = format!(
        r#"    <h1>Check your email</h1>
    <p>We sent a login link to <strong>{email}</strong>.</p>
    <p>The link expires in 15 minutes. You can close this page.</p>"#
    );
    page("Check your email", &body)
}

/// Generic error page with a link back to the login form.
#[must_use]
pub(crate) fn error_page(message: &str) -> Html<String> {
    let message = escape_html(message);
    let body = format!(
        r#"    <h1>Something went wrong</h1>
    <p>{message}</p>
    <p><a href="/auth/login">Back to login</a></p>"#
    );
    page("Error", &body)
}

/// Minimal HTML escaping for text interpolated into the pages above.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
