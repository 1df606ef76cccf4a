//! Fenced email block embedded in assistant replies.
//!
//! ```text
//! ```EMAIL_TO_SEND
//! TO: <address>
//! SUBJECT: <text>
//! CC: <comma-separated addresses, optional>
//! BODY:
//! <HTML, rest of the block>
//! ```END_EMAIL
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, info};

use super::email::EmailSender;

static BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```EMAIL_TO_SEND\s*\n(.*?)\n```END_EMAIL").expect("valid block pattern"));
static TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^TO:[ \t]*(.+)$").expect("valid TO pattern"));
static SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^SUBJECT:[ \t]*(.+)$").expect("valid SUBJECT pattern"));
static CC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^CC:[ \t]*(.*)$").expect("valid CC pattern"));
static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^BODY:\s*\n(.+)").expect("valid BODY pattern"));

/// Annotation appended when a block is present but incomplete.
pub const PARSE_FAILURE: &str = "⚠️ Could not parse email format";

/// An email extracted from a send block.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub cc: Vec<String>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    MissingField(&'static str),
}

/// Inner text of the first send block in `text`, if any.
pub fn find_block(text: &str) -> Option<&str> {
    BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn field(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse the inner text of a send block.
pub fn parse_block(block: &str) -> Result<OutgoingEmail, BlockError> {
    let to = field(&TO, block).ok_or(BlockError::MissingField("TO"))?;
    let subject = field(&SUBJECT, block).ok_or(BlockError::MissingField("SUBJECT"))?;
    let body = field(&BODY, block).ok_or(BlockError::MissingField("BODY"))?;

    let cc = field(&CC, block)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|address| address.contains('@'))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(OutgoingEmail {
        to,
        subject,
        cc,
        body,
    })
}

/// Send the email described in `reply`, if it carries a send block.
///
/// Returns the annotation to append to the reply; `None` when there is no
/// block. Sender failures are folded into the annotation.
pub async fn deliver_email_block(reply: &str, sender: &dyn EmailSender) -> Option<String> {
    let block = find_block(reply)?;

    let email = match parse_block(block) {
        Ok(email) => email,
        Err(BlockError::MissingField(name)) => {
            error!("Email block is missing {}", name);
            return Some(PARSE_FAILURE.to_string());
        }
    };

    info!("Sending email to {} ({} cc)", email.to, email.cc.len());

    let result = if email.cc.is_empty() {
        sender.send(&email.to, &email.subject, &email.body).await
    } else {
        sender
            .send_with_cc(&email.to, &email.subject, &email.body, &email.cc)
            .await
    };

    Some(match result {
        Ok(result) if result.success => format!("✅ {}", result.message),
        Ok(result) => format!("❌ {}", result.message),
        Err(e) => {
            error!("Failed to send email: {}", e);
            format!("❌ Failed to send email: {}", e)
        }
    })
}
