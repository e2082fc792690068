use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .context("build smtp transport")?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();
        let from = cfg.from.parse().context("parse smtp from address")?;
        Ok(Self { transport, from })
    }
}

fn reset_body(reset_url: &str) -> String {
    format!(
        "To reset your password, visit the following link:\n\
         {reset_url}\n\n\
         If you did not make this request then simply ignore this email \
         and no changes will be made.\n"
    )
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("parse recipient address")?)
            .subject("Password Reset Request")
            .body(reset_body(reset_url))
            .context("build reset email")?;

        self.transport
            .send(message)
            .await
            .context("send reset email")?;
        info!(%to, "password reset email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_body_contains_link_and_disclaimer() {
        let body = reset_body("http://localhost:8080/reset_password/abc123");
        assert!(body.contains("http://localhost:8080/reset_password/abc123"));
        assert!(body.contains("simply ignore this email"));
    }
}
