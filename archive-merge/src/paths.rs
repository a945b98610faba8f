//! Path handling between archive layout and local layout
//!
//! The export server always packs everything below a fixed top-level folder:
//! ```text
//! rrread/
//! ├── <source>/
//! │   └── <title>.md
//! └── <title>.md
//! ```
//! Locally that folder can be renamed by the user, so the first segment is
//! swapped for the configured root before the entry is written.

/// Top-level folder used by the export archive
pub const ARCHIVE_ROOT: &str = "rrread";

/// Normalizes a store-relative path
///
/// Backslashes become forward slashes, non-breaking spaces become plain
/// spaces, empty and `.` segments are dropped and `..` pops the previous
/// segment. A `..` that cannot be resolved is kept so the store can reject it.
pub fn normalize_path(path: &str) -> String {
    let cleaned = path.replace('\\', "/").replace(['\u{00A0}', '\u{202F}'], " ");

    let mut segments: Vec<&str> = Vec::new();
    for segment in cleaned.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Maps an archive path onto the local store
///
/// Only a leading [`ARCHIVE_ROOT`] segment is replaced; `rrreader/x.md` is not
/// touched. The result is normalized.
pub fn translate(archive_path: &str, configured_root: &str) -> String {
    let substituted = match archive_path.split_once('/') {
        Some((first, rest)) if first == ARCHIVE_ROOT => format!("{}/{}", configured_root, rest),
        None if archive_path == ARCHIVE_ROOT => configured_root.to_string(),
        _ => archive_path.to_string(),
    };
    normalize_path(&substituted)
}

/// Returns the containing directory of a normalized path, or `None` for a
/// path directly below the store root
pub fn parent_dir(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => Some(dir),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_replaces_root() {
        assert_eq!(translate("rrread/a.md", "Notes"), "Notes/a.md");
        assert_eq!(translate("rrread/sub/b.md", "Notes"), "Notes/sub/b.md");
    }

    #[test]
    fn test_translate_only_whole_segment() {
        assert_eq!(translate("rrreader/a.md", "Notes"), "rrreader/a.md");
        assert_eq!(translate("other/rrread/a.md", "Notes"), "other/rrread/a.md");
    }

    #[test]
    fn test_translate_nested_root() {
        assert_eq!(
            translate("rrread/kindle/book.md", "Reading/Highlights/"),
            "Reading/Highlights/kindle/book.md"
        );
    }

    #[test]
    fn test_translate_is_stable() {
        let once = translate("rrread//sub/./b.md", "Notes");
        assert_eq!(once, "Notes/sub/b.md");
        assert_eq!(translate("rrread//sub/./b.md", "Notes"), once);
        assert_eq!(translate(&once, "Notes"), once);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a//b///c.md"), "a/b/c.md");
        assert_eq!(normalize_path("/a/./b/"), "a/b");
        assert_eq!(normalize_path("a/b/../c.md"), "a/c.md");
        assert_eq!(normalize_path("a\\b\\c.md"), "a/b/c.md");
        assert_eq!(normalize_path("my\u{00A0}notes/x.md"), "my notes/x.md");
        assert_eq!(normalize_path("../escape.md"), "../escape.md");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("root/sub/new/file.md"), Some("root/sub/new"));
        assert_eq!(parent_dir("Notes/a.md"), Some("Notes"));
        assert_eq!(parent_dir("a.md"), None);
    }
}
