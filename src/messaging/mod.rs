//! Messaging module - side-effect senders the agents relay to.
//!
//! - [`sms`]: Twilio SMS delivery behind the [`SmsProvider`] trait
//! - [`email`]: Microsoft Graph mail delivery behind the [`EmailSender`] trait
//! - [`email_block`]: extraction of the fenced send block from assistant replies
//!
//! Senders never fail a conversation: provider errors are folded into the
//! returned result so the caller can report them.

pub mod email;
pub mod email_block;
pub mod sms;

pub use email::{EmailResult, EmailSender, GraphEmailSender};
pub use email_block::{deliver_email_block, find_block, parse_block, BlockError, OutgoingEmail};
pub use sms::{ProviderMessage, SmsProvider, SmsResult, SmsSender, TwilioSmsProvider, MAX_SMS_CHARS};
