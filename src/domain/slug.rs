//! URL slug derivation for titled records.

/// Derive a slug from a title.
///
/// Lower-cases the title, drops everything except ASCII word characters,
/// whitespace and hyphens, collapses runs of whitespace, underscores and
/// hyphens into a single hyphen and trims hyphens from both ends. Titles made
/// only of non-ASCII characters therefore produce an empty slug.
///
/// Slugs are derived once at creation time and are not checked for
/// uniqueness across records.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else if ch == '_' || ch == '-' || ch.is_whitespace() {
            pending_separator = true;
        }
    }

    slug
}
