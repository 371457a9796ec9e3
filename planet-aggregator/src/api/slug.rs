/// Used when a key slugs down to nothing ("日本語", "!!!").
pub const FALLBACK_SLUG: &str = "untitled";

/// URL-safe slug: lowercase, spaces to hyphens, anything outside `[a-z0-9-]`
/// dropped, hyphen runs collapsed, ends trimmed.
///
/// Distinct inputs can share a slug ("fast.ai" and "fastai"); the later file
/// simply replaces the earlier one.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.to_lowercase().chars() {
        let c = if c == ' ' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

/// [`slugify`], falling back to [`FALLBACK_SLUG`] for file names.
pub fn path_slug(input: &str) -> String {
    let slug = slugify(input);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}
