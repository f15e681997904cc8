//! Injection of resolved asset tags into template markup.

use std::sync::OnceLock;

use regex::Regex;

fn head_close_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)</head\s*>").expect("invalid head regex"))
}

/// Insert `tags` into `template` just before the first closing head tag.
///
/// The tags are joined with newlines and followed by one newline. Templates without a
/// closing head tag get the block prepended instead. No other byte of the template changes,
/// and an empty tag list returns the template unchanged.
pub fn inject_tags(template: &str, tags: &[String]) -> String {
    if tags.is_empty() {
        return template.to_string();
    }

    let block = format!("{}\n", tags.join("\n"));
    let insert_at = head_close_pattern()
        .find(template)
        .map(|found| found.start())
        .unwrap_or(0);

    let mut document = String::with_capacity(template.len() + block.len());
    document.push_str(&template[..insert_at]);
    document.push_str(&block);
    document.push_str(&template[insert_at..]);
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> Vec<String> {
        vec![
            r#"<link rel="stylesheet" href="/x.css" />"#.to_string(),
            r#"<script type="module" src="/a.js"></script>"#.to_string(),
        ]
    }

    #[test]
    fn inserts_before_closing_head() {
        let template = "<!DOCTYPE html>\n<html>\n<head>\n<title>T</title>\n</head>\n<body></body>\n</html>\n";

        let document = inject_tags(template, &tags());
        assert_eq!(
            document,
            "<!DOCTYPE html>\n<html>\n<head>\n<title>T</title>\n<link rel=\"stylesheet\" href=\"/x.css\" />\n<script type=\"module\" src=\"/a.js\"></script>\n</head>\n<body></body>\n</html>\n"
        );
    }

    #[test]
    fn preserves_every_other_byte() {
        let template = "<html><HEAD><meta charset=\"utf-8\"></HEAD ><body>\r\n  </head> again</body></html>";

        let document = inject_tags(template, &tags());
        let block = format!("{}\n", tags().join("\n"));
        let position = template.find("</HEAD").unwrap();

        assert_eq!(&document[..position], &template[..position]);
        assert_eq!(&document[position..position + block.len()], block);
        assert_eq!(&document[position + block.len()..], &template[position..]);
    }

    #[test]
    fn prepends_when_no_head_exists() {
        let template = "<div id=\"app\"></div>";
        let document = inject_tags(template, &tags());
        assert_eq!(
            document,
            format!("{}\n<div id=\"app\"></div>", tags().join("\n"))
        );
    }

    #[test]
    fn is_deterministic_and_ignores_empty_tag_lists() {
        let template = "<head></head>";
        assert_eq!(inject_tags(template, &tags()), inject_tags(template, &tags()));
        assert_eq!(inject_tags(template, &[]), template);
    }
}
