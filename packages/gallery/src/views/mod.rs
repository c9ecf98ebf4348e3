//! Server-rendered HTML pages.

mod admin;
mod guest;

pub use admin::{admin_page, login_page};
pub use guest::{IndexView, index_page};

use crate::utils::flash::Flash;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn flash_banner(flash: &Flash) -> String {
    let mut out = String::new();
    if let Some(message) = flash.message.as_deref().filter(|m| !m.is_empty()) {
        out.push_str(&format!(
            r#"<p class="flash flash-ok">{}</p>"#,
            escape_html(message)
        ));
    }
    if let Some(error) = flash.error.as_deref().filter(|e| !e.is_empty()) {
        out.push_str(&format!(
            r#"<p class="flash flash-error">{}</p>"#,
            escape_html(error)
        ));
    }
    out
}
