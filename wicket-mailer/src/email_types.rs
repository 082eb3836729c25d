use askama::Template;

use crate::templates::{MagicLinkTemplate, MagicLinkTextTemplate};
use crate::{Email, MailerError};

/// The sign-in link message sent by the email provider.
pub struct MagicLinkEmail;

impl MagicLinkEmail {
    pub fn build(from: &str, to: &str, link: &str, app_name: &str) -> Result<Email, MailerError> {
        let html_body = MagicLinkTemplate { app_name, link }.render()?;
        let text_body = MagicLinkTextTemplate { app_name, link }.render()?;

        Email::builder()
            .from(from)
            .to(to)
            .subject(format!("Sign in to {app_name}"))
            .text_body(text_body)
            .html_body(html_body)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_link_email_contains_link() {
        let link = "https://app.example.com/api/auth/callback/email?token=abc";
        let email =
            MagicLinkEmail::build("noreply@example.com", "a@x.com", link, "Example").unwrap();

        assert_eq!(email.to, "a@x.com");
        assert_eq!(email.subject, "Sign in to Example");
        assert!(email.text_body.contains(link));
        assert!(email.text_body.starts_with("Sign in to Example"));

        let html = email.html_body.as_deref().unwrap();
        assert!(html.contains("<h1>Sign in to Example</h1>"));
        assert!(html.contains("token=abc"));
    }

    #[test]
    fn test_html_body_escapes_link_and_app_name() {
        let link = r#"https://x.test/?a=1"><img src=x onerror=alert(1)>"#;
        let email = MagicLinkEmail::build(
            "noreply@example.com",
            "a@x.com",
            link,
            "<script>alert(1)</script>",
        )
        .unwrap();

        let html = email.html_body.as_deref().unwrap();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img"));
        assert!(!html.contains(r#""><"#));
        assert!(html.contains("&lt;script&gt;") || html.contains("&#60;script&#62;"));

        // The plain-text part is not HTML and carries the link verbatim.
        assert!(email.text_body.contains(link));
    }
}
