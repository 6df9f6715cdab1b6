//! Filesystem-safe path segments
//!
//! Every filename, tag name and plugin id that becomes part of a path on
//! disk passes through [`sanitize_filename`] first. Composed paths are then
//! checked against the ceilings below with [`crate::fs::check_path_len`].

/// Longest sanitized segment
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Longest composed path accepted for any artifact on disk
pub const MAX_PATH_LEN: usize = 260;

/// Longest directory path, leaving room for a file name below it
pub const MAX_DIR_LEN: usize = 200;

/// Longest scratch extraction directory
pub const MAX_SCRATCH_DIR_LEN: usize = 230;

/// Replacement for inputs that sanitize to nothing
pub const PLACEHOLDER: &str = "unnamed_file";

fn is_allowed(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b' ')
}

/// Normalize an arbitrary string into a single safe path segment.
///
/// Keeps ASCII alphanumerics, `.`, `-`, `_` and space; every other byte
/// (path separators included) becomes `_`. Results longer than
/// [`MAX_FILE_NAME_LEN`] are truncated, keeping the extension after the last
/// `.` when there is one. Never fails and never returns an empty string.
///
/// # Example
///
/// ```rust
/// use plughub_core::sanitize::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
/// assert_eq!(sanitize_filename(""), "unnamed_file");
/// ```
pub fn sanitize_filename(input: &str) -> String {
    // Output is pure ASCII, so byte and char lengths agree below.
    let mut safe: String = input
        .bytes()
        .map(|b| if is_allowed(b) { b as char } else { '_' })
        .collect();

    if safe.len() > MAX_FILE_NAME_LEN {
        safe = match safe.rfind('.') {
            Some(dot) if dot > 0 && safe.len() - dot < MAX_FILE_NAME_LEN => {
                let extension = &safe[dot..];
                let keep = MAX_FILE_NAME_LEN - extension.len();
                format!("{}{}", &safe[..keep.min(dot)], extension)
            }
            _ => safe[..MAX_FILE_NAME_LEN].to_string(),
        };
    }

    if safe.is_empty() {
        return PLACEHOLDER.to_string();
    }

    safe
}

/// Whether `segment` can be joined onto a directory without leaving it.
///
/// The segment must already be in sanitized form and must not be `.` or `..`.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && sanitize_filename(segment) == segment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sanitized(out: &str) {
        assert!(!out.is_empty());
        assert!(out.len() <= MAX_FILE_NAME_LEN);
        assert!(out.bytes().all(is_allowed), "unexpected byte in {:?}", out);
    }

    #[test]
    fn test_keeps_allowed_characters() {
        assert_eq!(sanitize_filename("My Plugin-1.0_x.zip"), "My Plugin-1.0_x.zip");
    }

    #[test]
    fn test_replaces_separators() {
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_filename("bin/demo.so"), "bin_demo.so");
    }

    #[test]
    fn test_replaces_other_bytes_per_byte() {
        assert_eq!(sanitize_filename("a:b*c?"), "a_b_c_");
        // 'é' is two bytes in UTF-8
        assert_eq!(sanitize_filename("é"), "__");
    }

    #[test]
    fn test_empty_becomes_placeholder() {
        assert_eq!(sanitize_filename(""), PLACEHOLDER);
    }

    #[test]
    fn test_all_separators() {
        let out = sanitize_filename("////");
        assert_eq!(out, "____");
        assert_sanitized(&out);
    }

    #[test]
    fn test_truncates_preserving_extension() {
        let input = format!("{}.zip", "a".repeat(300));
        let out = sanitize_filename(&input);
        assert_eq!(out.len(), MAX_FILE_NAME_LEN);
        assert!(out.ends_with(".zip"));
        assert_sanitized(&out);
    }

    #[test]
    fn test_truncates_without_extension() {
        let out = sanitize_filename(&"b".repeat(400));
        assert_eq!(out.len(), MAX_FILE_NAME_LEN);
    }

    #[test]
    fn test_truncates_leading_dot_name() {
        let out = sanitize_filename(&format!(".{}", "c".repeat(400)));
        assert_eq!(out.len(), MAX_FILE_NAME_LEN);
        assert!(out.starts_with('.'));
    }

    #[test]
    fn test_truncates_oversized_extension() {
        let out = sanitize_filename(&format!("x.{}", "d".repeat(400)));
        assert_eq!(out.len(), MAX_FILE_NAME_LEN);
        assert!(out.starts_with("x."));
    }

    #[test]
    fn test_totality_over_mixed_inputs() {
        let long_unicode = "ü".repeat(300);
        let inputs = [
            "",
            "/",
            "\\\\",
            "..",
            "\0\n\t",
            "emoji 🚀 name.dll",
            long_unicode.as_str(),
        ];
        for input in inputs {
            assert_sanitized(&sanitize_filename(input));
        }
    }

    #[test]
    fn test_idempotent() {
        for input in ["v1.2.0", "a/b c.zip", &"z".repeat(500)] {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn test_is_safe_segment() {
        assert!(is_safe_segment("v1.2.0"));
        assert!(is_safe_segment("demo_v1.2.0_1700000000.zip"));
        assert!(!is_safe_segment(""));
        assert!(!is_safe_segment("."));
        assert!(!is_safe_segment(".."));
        assert!(!is_safe_segment("a/b"));
        assert!(!is_safe_segment("a\\b"));
    }
}
