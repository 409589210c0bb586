//! URL slugs for display names and puzzle titles.
//!
//! Slugs are lowercase ASCII letters, digits and single hyphens, with no
//! leading or trailing hyphen. They are derived for display and never
//! stored.

/// Derive a slug from `value`, or return `fallback` when nothing survives.
pub fn slugify(value: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_hyphen = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}
