//! # Lychgate
//!
//! `lychgate` gates a statically generated note garden behind passwordless
//! ("magic link") email authentication.
//!
//! ## Flow
//!
//! 1. A visitor submits their email on `/auth/login`.
//! 2. A single-use, time-limited token is persisted and a verification link is
//!    mailed out. Issuance succeeds even when delivery fails; the token simply
//!    goes unused and a resend mints a fresh one.
//! 3. Following the link consumes the token atomically and mints a session,
//!    carried as an opaque `HttpOnly` cookie.
//! 4. Every other request passes the session guard, which refreshes the
//!    sliding-window timeout on each authenticated request.
//!
//! Sessions expire on two independent axes: a sliding inactivity timeout
//! (default 7 days, enforced lazily at validation) and an absolute age ceiling
//! (default 30 days since creation, enforced by `lychgate sweep`). The ceiling
//! is a deliberate hard cap on session lifetime, so a daily visitor is still
//! logged out once their session is old enough.
//!
//! Identity is the email address itself; there is no account table. Any
//! address that completes verification is a valid identity.

pub mod api;
pub mod cli;
pub mod discovery;
pub mod store;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
