//! Agent profiles.
//!
//! Each profile plugs into [`FoundryAgent`](crate::agent::FoundryAgent):
//! - [`SmsProfile`] texts people through the `send_sms` function
//! - [`EmailProfile`] drafts mail and sends approved drafts from its replies

mod email;
mod sms;

pub use email::{EmailProfile, BING_CONNECTION, EMAIL_AGENT_NAME};
pub use sms::{SmsProfile, SMS_AGENT_NAME};
