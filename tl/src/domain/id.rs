//! ID generation
//!
//! IDs use the format: `{6-char-hex}-{type}-{slug}`
//! Example: `019430-loop-add-oauth-login`

/// Maximum number of characters kept from the title slug
const MAX_SLUG_LEN: usize = 40;

/// Generate an ID from a type and a title
///
/// The hex prefix comes from a v7 UUID, so two IDs generated for the same
/// title still differ.
pub fn generate_id(domain_type: &str, title: &str) -> String {
    let uuid = uuid::Uuid::now_v7();
    let simple = uuid.simple().to_string();
    // v7 UUIDs share their leading timestamp bits, so take the random tail
    let hex_suffix = &simple[simple.len() - 6..];
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", hex_suffix, domain_type)
    } else {
        format!("{}-{}-{}", hex_suffix, domain_type, slug)
    }
}

/// Slugify a title for use in IDs
fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    slug.chars()
        .take(MAX_SLUG_LEN)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Add OAuth Login"), "add-oauth-login");
        assert_eq!(slugify("Don't   panic!"), "dont-panic");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "word ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_generate_id_format() {
        let id = generate_id("loop", "Build the thing");
        let parts: Vec<&str> = id.splitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 6);
        assert_eq!(parts[1], "loop");
        assert_eq!(parts[2], "build-the-thing");
    }

    #[test]
    fn test_generate_id_without_slug() {
        let id = generate_id("task", "!!!");
        assert!(id.ends_with("-task"));
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id("loop", "same title");
        let b = generate_id("loop", "same title");
        assert_ne!(a, b);
    }
}
