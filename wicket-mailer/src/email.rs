use crate::MailerError;
use serde::{Deserialize, Serialize};

/// A single outbound message.
///
/// Sign-in mail always goes to exactly one recipient, so there is no cc/bcc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

impl Email {
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }

    /// Convert into a `lettre` message ready for any transport.
    pub(crate) fn into_message(self) -> Result<lettre::Message, MailerError> {
        use lettre::message::{MultiPart, SinglePart};

        let builder = lettre::Message::builder()
            .from(self.from.parse()?)
            .to(self.to.parse()?)
            .subject(self.subject);

        let message = match self.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(self.text_body, html))?,
            None => builder.singlepart(SinglePart::plain(self.text_body))?,
        };

        Ok(message)
    }
}

#[derive(Debug, Default)]
pub struct EmailBuilder {
    to: Option<String>,
    from: Option<String>,
    subject: Option<String>,
    text_body: Option<String>,
    html_body: Option<String>,
}

impl EmailBuilder {
    pub fn to<S: Into<String>>(mut self, email: S) -> Self {
        self.to = Some(email.into());
        self
    }

    pub fn from<S: Into<String>>(mut self, email: S) -> Self {
        self.from = Some(email.into());
        self
    }

    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn text_body<S: Into<String>>(mut self, text: S) -> Self {
        self.text_body = Some(text.into());
        self
    }

    pub fn html_body<S: Into<String>>(mut self, html: S) -> Self {
        self.html_body = Some(html.into());
        self
    }

    pub fn build(self) -> Result<Email, MailerError> {
        let required = |value: Option<String>, name: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| MailerError::Builder(format!("{name} is required")))
        };

        Ok(Email {
            to: required(self.to, "Recipient")?,
            from: required(self.from, "From address")?,
            subject: required(self.subject, "Subject")?,
            text_body: required(self.text_body, "Text body")?,
            html_body: self.html_body,
        })
    }
}
