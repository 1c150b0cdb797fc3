//! Outbound email
//!
//! The `Mailer` trait is the seam for delivery. The default adapter
//! only logs the message; deployments wire a real SMTP sender behind
//! the same trait. Delivery failures are logged and never bubble up to
//! request handlers, a dropped email must not fail a registration.

pub mod templates;

use async_trait::async_trait;
use tracing::info;

use crate::domain::DomainResult;

/// Outbound mail delivery seam
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an HTML email
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> DomainResult<()>;
}

/// Mailer that logs instead of delivering. Useful for development and
/// as the default when no SMTP relay is configured.
pub struct TracingMailer {
    from: String,
}

impl TracingMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> DomainResult<()> {
        info!(
            from = %self.from,
            to = %to,
            subject = %subject,
            body_bytes = html_body.len(),
            "Email dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    //! Capturing mailer for tests

    use std::sync::Mutex;

    use super::*;

    /// Record of a sent message
    #[derive(Debug, Clone)]
    pub struct SentEmail {
        pub to: String,
        pub subject: String,
        pub html_body: String,
    }

    /// Mailer that stores every message for later assertions
    #[derive(Default)]
    pub struct CapturingMailer {
        sent: Mutex<Vec<SentEmail>>,
    }

    impl CapturingMailer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<SentEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for CapturingMailer {
        async fn send(&self, to: &str, subject: &str, html_body: &str) -> DomainResult<()> {
            self.sent.lock().unwrap().push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                html_body: html_body.to_string(),
            });
            Ok(())
        }
    }
}
