//! Minimal HTML for the three pages.

use crate::gateway::{Page, Status};

/// Render `page` with an optional pending status.
#[must_use]
pub fn render(page: Page, status: Option<&Status>) -> String {
    let (title, body) = match page {
        Page::Login => ("Login", login_body()),
        Page::Register => ("Register", register_body()),
        Page::Home => ("Home", home_body()),
    };

    let flash = status.map_or_else(String::new, |status| {
        format!(
            r#"<p class="flash {}">{}</p>"#,
            status.category.as_str(),
            escape(&status.message)
        )
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
{flash}
{body}
</body>
</html>
"#
    )
}

fn login_body() -> String {
    format!(
        r#"<form method="post" action="{login}">
<label>Username <input type="text" name="username" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Login</button>
</form>
<p>No account? <a href="{register}">Register</a></p>"#,
        login = Page::Login.path(),
        register = Page::Register.path(),
    )
}

fn register_body() -> String {
    format!(
        r#"<form method="post" action="{register}">
<label>Username <input type="text" name="username" required></label>
<label>Password <input type="password" name="password" required></label>
<label>Confirm password <input type="password" name="confirm-password" required></label>
<button type="submit">Register</button>
</form>
<p>Already registered? <a href="{login}">Login</a></p>"#,
        register = Page::Register.path(),
        login = Page::Login.path(),
    )
}

fn home_body() -> String {
    "<p>Welcome.</p>".to_string()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
