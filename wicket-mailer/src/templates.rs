//! Compiled email templates. HTML output is escaped by askama.
use askama::Template;

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Sign in to {{ app_name }}</title>
</head>
<body style="font-family: sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1>Sign in to {{ app_name }}</h1>
    <p>Use the button below to sign in. The link can only be used once.</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{{ link }}" style="background-color: #3b82f6; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px;">Sign in</a>
    </p>
    <p>Or paste this URL into your browser:</p>
    <p style="word-break: break-all; font-family: monospace;">{{ link }}</p>
    <p>If you did not request this email you can safely ignore it.</p>
</body>
</html>"#,
    ext = "html"
)]
pub struct MagicLinkTemplate<'a> {
    pub app_name: &'a str,
    pub link: &'a str,
}

#[derive(Template)]
#[template(
    source = "Sign in to {{ app_name }}

Use the link below to sign in. It can only be used once.

{{ link }}

If you did not request this email you can safely ignore it.
",
    ext = "txt"
)]
pub struct MagicLinkTextTemplate<'a> {
    pub app_name: &'a str,
    pub link: &'a str,
}
