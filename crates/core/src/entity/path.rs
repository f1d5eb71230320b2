//! Storage path layout for copied-in files.

use uuid::Uuid;

/// Generate a collision-free path for a new file.
///
/// Format: `{prefix}/{uuid}/{sanitized_filename}`
#[must_use]
pub fn generate_path(prefix: &str, filename: &str) -> String {
    format!(
        "{}/{}/{}",
        prefix.trim_matches('/'),
        Uuid::new_v4(),
        sanitize_filename(filename)
    )
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
/// Directory components are dropped.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("invoice.pdf"), "invoice.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("test@#$%.doc"), "test____.doc");
        assert_eq!(sanitize_filename("日本語.pdf"), "___.pdf");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\a.png"), "a.png");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_generate_path_layout() {
        let path = generate_path("/documents/", "a.png");
        let parts: Vec<&str> = path.split('/').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "documents");
        assert!(Uuid::parse_str(parts[1]).is_ok());
        assert_eq!(parts[2], "a.png");
    }

    #[test]
    fn test_generate_path_unique() {
        assert_ne!(generate_path("documents", "a.png"), generate_path("documents", "a.png"));
    }

    proptest! {
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);

            prop_assert!(!sanitized.is_empty());
            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized filename: {}", c);
            }
        }

        #[test]
        fn prop_generated_path_stays_under_prefix(
            prefix in "[a-z]{1,10}(/[a-z]{1,10}){0,2}",
            filename in ".*",
        ) {
            let path = generate_path(&prefix, &filename);
            let prefix_with_slash = format!("{prefix}/");

            prop_assert!(path.starts_with(&prefix_with_slash));
            prop_assert!(!path.split('/').any(|segment| segment == ".." || segment.is_empty()));
        }
    }
}
