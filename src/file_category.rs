//! Extension to category lookup.
//!
//! The configuration maps each category to its extensions; the organizer needs
//! the opposite direction. `CategoryIndex` is that inverted view, built once and
//! never changed afterwards.
//!
//! # Examples
//!
//! ```
//! use janitor::config::Config;
//! use janitor::file_category::CategoryIndex;
//!
//! let index = CategoryIndex::from_mapping(&Config::default().folders);
//! assert_eq!(index.category_for("holiday.JPG"), Some("Pictures"));
//! assert_eq!(index.category_for("notes.unknown"), None);
//! ```

use crate::config::CategoryMapping;
use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path};
use tracing::warn;

/// Maps a lowercase, dot-prefixed extension to its category name.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    extension_map: HashMap<String, String>,
}

impl CategoryIndex {
    /// Builds the index from a category mapping.
    ///
    /// An extension listed under several categories ends up in the one visited
    /// last. Categories are visited in name order, so the result is stable, but
    /// such a mapping is a misconfiguration and callers should not rely on it.
    ///
    /// Categories that are not a single plain folder name (absolute paths, `..`,
    /// names containing a separator) are dropped with a warning, so their files
    /// stay where they are.
    ///
    /// # Arguments
    ///
    /// * `mapping` - Category name to the extensions that belong to it
    pub fn from_mapping(mapping: &CategoryMapping) -> Self {
        let mut index = Self::default();
        for (category, extensions) in mapping {
            if !is_valid_category(category) {
                warn!(
                    "Ignoring category '{}': must be a single folder name inside the target directory",
                    category
                );
                continue;
            }
            for ext in extensions {
                index.add_extension_mapping(ext, category);
            }
        }
        index
    }

    /// Adds an extension to category mapping, replacing any previous one.
    ///
    /// Blank extensions are ignored.
    pub fn add_extension_mapping(&mut self, ext: &str, category: &str) {
        if let Some(ext) = normalize_extension(ext) {
            self.extension_map.insert(ext, category.to_string());
        }
    }

    /// Looks up the category of an extension, in any case, with or without the dot.
    pub fn extension_to_category(&self, ext: &str) -> Option<&str> {
        let ext = normalize_extension(ext)?;
        self.extension_map.get(&ext).map(String::as_str)
    }

    /// Looks up the category for a file name by its extension.
    pub fn category_for(&self, file_name: &str) -> Option<&str> {
        let ext = extension_of(file_name)?;
        self.extension_map.get(&ext).map(String::as_str)
    }

    /// Distinct category names present in the index, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.extension_map.values().map(String::as_str).collect()
    }

    /// Number of distinct extensions known to the index.
    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    /// Returns true if no extension maps to a category.
    ///
    /// # Example
    ///
    /// ```
    /// use janitor::config::CategoryMapping;
    /// use janitor::file_category::CategoryIndex;
    ///
    /// let index = CategoryIndex::from_mapping(&CategoryMapping::new());
    /// assert!(index.is_empty());
    /// assert_eq!(index.len(), 0);
    /// ```
    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }
}

/// Returns the lowercased extension of a file name, including the leading dot.
///
/// The extension starts at the last `.` of the name, so `archive.tar.gz` yields
/// `.gz` and `.bashrc` yields `.bashrc`. A name without a dot has none.
///
/// ```
/// use janitor::file_category::extension_of;
///
/// assert_eq!(extension_of("Movie.MP4").as_deref(), Some(".mp4"));
/// assert_eq!(extension_of("archive.tar.gz").as_deref(), Some(".gz"));
/// assert_eq!(extension_of("Makefile"), None);
/// ```
pub fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rfind('.')
        .map(|idx| file_name[idx..].to_lowercase())
}

/// Returns true if `category` names exactly one folder directly below the target.
///
/// ```
/// use janitor::file_category::is_valid_category;
///
/// assert!(is_valid_category("Pictures"));
/// assert!(!is_valid_category("/tmp/elsewhere"));
/// assert!(!is_valid_category("../up"));
/// assert!(!is_valid_category("a/b"));
/// ```
pub fn is_valid_category(category: &str) -> bool {
    let mut components = Path::new(category).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Trims, lowercases and dot-prefixes a configured extension.
fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim();
    if ext.is_empty() || ext == "." {
        return None;
    }
    let ext = ext.to_lowercase();
    if ext.starts_with('.') {
        Some(ext)
    } else {
        Some(format!(".{}", ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn mapping(entries: &[(&str, &[&str])]) -> CategoryMapping {
        entries
            .iter()
            .map(|(category, exts)| {
                (
                    category.to_string(),
                    exts.iter().map(|e| e.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.jpg").as_deref(), Some(".jpg"));
        assert_eq!(extension_of("b.PDF").as_deref(), Some(".pdf"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(extension_of(".bashrc").as_deref(), Some(".bashrc"));
        assert_eq!(extension_of("trailing.").as_deref(), Some("."));
        assert_eq!(extension_of("README"), None);
    }

    #[test]
    fn test_index_inverts_mapping() {
        let index = CategoryIndex::from_mapping(&mapping(&[
            ("Pictures", &[".jpg", ".png"]),
            ("Documents", &[".pdf"]),
        ]));

        assert_eq!(index.len(), 3);
        assert_eq!(index.extension_to_category(".jpg"), Some("Pictures"));
        assert_eq!(index.extension_to_category(".png"), Some("Pictures"));
        assert_eq!(index.extension_to_category(".pdf"), Some("Documents"));
        assert_eq!(index.extension_to_category(".txt"), None);
    }

    #[test]
    fn test_configured_extensions_are_normalized() {
        let index = CategoryIndex::from_mapping(&mapping(&[("Videos", &[".MP4", "mkv", " .Mov "])]));

        assert_eq!(index.category_for("clip.mp4"), Some("Videos"));
        assert_eq!(index.category_for("clip.mkv"), Some("Videos"));
        assert_eq!(index.category_for("clip.MOV"), Some("Videos"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let index = CategoryIndex::from_mapping(&Config::default().folders);

        assert_eq!(index.category_for("photo.JPG"), Some("Pictures"));
        assert_eq!(index.category_for("photo.JpEg"), Some("Pictures"));
        assert_eq!(index.extension_to_category("PDF"), Some("Documents"));
    }

    #[test]
    fn test_blank_extensions_are_ignored() {
        let index = CategoryIndex::from_mapping(&mapping(&[("Misc", &["", "  ", "."])]));
        assert!(index.is_empty());
        assert_eq!(index.category_for("file."), None);
    }

    #[test]
    fn test_duplicate_extension_maps_to_one_category() {
        let index = CategoryIndex::from_mapping(&mapping(&[
            ("Alpha", &[".dup"]),
            ("Beta", &[".dup"]),
        ]));

        assert_eq!(index.len(), 1);
        let winner = index.category_for("x.dup").unwrap();
        assert!(winner == "Alpha" || winner == "Beta");
    }

    #[test]
    fn test_escaping_categories_are_dropped() {
        let index = CategoryIndex::from_mapping(&mapping(&[
            ("/tmp/outside", &[".jpg"]),
            ("..", &[".png"]),
            ("../up", &[".gif"]),
            ("a/b", &[".bmp"]),
            ("Documents", &[".pdf"]),
        ]));

        assert_eq!(index.len(), 1);
        assert_eq!(index.category_for("a.jpg"), None);
        assert_eq!(index.category_for("a.png"), None);
        assert_eq!(index.category_for("a.gif"), None);
        assert_eq!(index.category_for("a.bmp"), None);
        assert_eq!(index.category_for("a.pdf"), Some("Documents"));
    }

    #[test]
    fn test_is_valid_category() {
        assert!(is_valid_category("Videos"));
        assert!(is_valid_category("My Music"));
        assert!(!is_valid_category(""));
        assert!(!is_valid_category("."));
        assert!(!is_valid_category(".."));
        assert!(!is_valid_category("/abs"));
        assert!(!is_valid_category("x/../y"));
    }

    #[test]
    fn test_categories_lists_distinct_names() {
        let index = CategoryIndex::from_mapping(&mapping(&[
            ("Pictures", &[".jpg", ".png"]),
            ("Documents", &[".pdf"]),
        ]));
        let categories: Vec<_> = index.categories().into_iter().collect();
        assert_eq!(categories, vec!["Documents", "Pictures"]);
    }
}
