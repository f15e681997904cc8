/// Escape a value for use inside a double-quoted HTML attribute.
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Stylesheet reference for the document head.
pub fn stylesheet_tag(href: &str) -> String {
    format!(r#"<link rel="stylesheet" href="{}" />"#, escape_attribute(href))
}

/// ES module script reference for the document head.
pub fn module_script_tag(src: &str) -> String {
    format!(
        r#"<script type="module" src="{}"></script>"#,
        escape_attribute(src)
    )
}
