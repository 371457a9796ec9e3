/// Tag helpers
pub mod tags {
    use std::collections::HashSet;

    /// Case-insensitive dedup that keeps the first-seen casing and order.
    pub fn unique_tags<'a, I>(tags: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for tag in tags {
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            if seen.insert(tag.to_lowercase()) {
                result.push(tag.to_string());
            }
        }
        result
    }

    /// True when `allowed` is empty or shares a tag with `tags`, ignoring case.
    pub fn matches_any(tags: &[String], allowed: &[String]) -> bool {
        if allowed.is_empty() {
            return true;
        }
        let allowed: HashSet<String> = allowed.iter().map(|t| t.to_lowercase()).collect();
        tags.iter().any(|t| allowed.contains(&t.to_lowercase()))
    }
}

/// Text processing utilities
pub mod text {
    /// Cuts `text` to roughly `max_chars` characters, backing off to the last
    /// space when one sits in the second half, and appends "...".
    pub fn truncate_summary(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }

        let cut = text
            .char_indices()
            .nth(max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len());
        let mut truncated = &text[..cut];
        if let Some(space) = truncated.rfind(' ') {
            if space > cut / 2 {
                truncated = &truncated[..space];
            }
        }
        format!("{}...", truncated)
    }

    /// Trimmed, or None when nothing is left.
    pub fn non_empty(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// URL utilities
pub mod url {
    use url::Url;

    /// Resolves `href` against `base` when it is relative.
    pub fn resolve(base: &str, href: &str) -> String {
        match Url::parse(href) {
            // Absolute links are kept verbatim; identifiers hash the original text
            Ok(_) => href.to_string(),
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)
                .and_then(|b| b.join(href))
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            Err(_) => href.to_string(),
        }
    }
}
