use anyhow::Result;
use lettre::message::header::MessageId;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use uuid::Uuid;

pub struct OutboundMail<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub cc: Option<&'a str>,
    pub bcc: Option<&'a str>,
    pub subject: &'a str,
    pub body: &'a str,
}

/// Build the outbound message with an explicit Message-Id
/// (`<uuid>@<sender-domain>`). Returns the message and its id so the caller
/// can report it.
pub fn build_email(mail: &OutboundMail<'_>) -> Result<(Message, String)> {
    let from_mb: Mailbox = mail.from.parse()?;
    let domain = mail.from.split('@').nth(1).unwrap_or("localhost");
    let message_id = format!("{}@{}", Uuid::new_v4(), domain);

    let mut builder = Message::builder()
        .from(from_mb)
        .subject(mail.subject)
        .header(MessageId::from(message_id.clone()));

    for addr in mail.to.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        builder = builder.to(addr.parse()?);
    }
    if let Some(cc) = mail.cc {
        for addr in cc.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            builder = builder.cc(addr.parse()?);
        }
    }
    if let Some(bcc) = mail.bcc {
        for addr in bcc.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            builder = builder.bcc(addr.parse()?);
        }
    }

    let message = builder.body(mail.body.to_string())?;
    Ok((message, message_id))
}

/// Hand the message to the configured relay. The per-request sender
/// credential is optional; a local Postfix typically trusts the connector
/// without auth.
pub fn send(
    host: &str,
    port: u16,
    credentials: Option<(&str, &str)>,
    message: &Message,
) -> Result<()> {
    let mut builder = match SmtpTransport::relay(host) {
        Ok(b) => b,
        Err(_) => SmtpTransport::builder_dangerous(host),
    };

    builder = builder.port(port).timeout(Some(Duration::from_secs(20)));

    if let Some((username, password)) = credentials {
        // Trim whitespace that may sneak in from copied passwords
        let clean_password: String = password.chars().filter(|c| !c.is_whitespace()).collect();
        builder = builder
            .authentication(vec![Mechanism::Plain, Mechanism::Login])
            .credentials(Credentials::new(username.to_string(), clean_password));
    }

    let mailer = builder.build();
    match mailer.send(message) {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, "SMTP send failed");
            Err(e.into())
        }
    }
}
