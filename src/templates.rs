//! Agent instruction templates.
//!
//! Templates are embedded at compile time from the `templates/` directory.
//! `{now}` is replaced with the creation timestamp when an agent is defined.

use chrono::{DateTime, Local};

/// Email composition and sending agent
pub const EMAIL_AGENT: &str = include_str!("../templates/email_agent.md");

/// SMS notification agent
pub const SMS_AGENT: &str = include_str!("../templates/sms_agent.md");

const NOW: &str = "{now}";

/// Fill the timestamp placeholder of `template`.
pub fn render(template: &str, now: DateTime<Local>) -> String {
    template.replace(NOW, &now.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_templates_have_placeholder() {
        assert!(EMAIL_AGENT.contains(NOW));
        assert!(SMS_AGENT.contains(NOW));
    }

    #[test]
    fn test_email_template_documents_block() {
        assert!(EMAIL_AGENT.contains("```EMAIL_TO_SEND"));
        assert!(EMAIL_AGENT.contains("```END_EMAIL"));
    }

    #[test]
    fn test_render_inserts_timestamp() {
        let now = Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 0).unwrap();
        let text = render(SMS_AGENT, now);

        assert!(text.contains("2026-03-14 09:26"));
        assert!(!text.contains(NOW));
    }
}
