//! HTML entity escaping.

/// Replace the five HTML-significant characters with entities.
///
/// Not idempotent: escaping an already escaped string escapes its `&` again,
/// so `&lt;` becomes `&amp;lt;`. Callers escape exactly once, at the point of
/// interpolation.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape user or model text before it is shown as markup.
pub fn sanitize_for_display(text: &str) -> String {
    escape_html(text)
}
