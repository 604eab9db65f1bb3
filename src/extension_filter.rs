//! Extension allow-list filtering.
//!
//! Files are kept when their extension appears in the allow-list, compared
//! case-insensitively. An empty allow-list keeps everything.

use crate::models::MediaFile;
use std::collections::HashSet;

/// Extensions treated as photos or videos when nothing else is configured.
pub const MEDIA_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "mp4"];

/// A compiled, lower-cased extension allow-list.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    allowed: HashSet<String>,
}

impl ExtensionFilter {
    pub fn new<S: AsRef<str>>(allowed: &[S]) -> Self {
        Self {
            allowed: allowed
                .iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Filter over [`MEDIA_EXTENSIONS`].
    pub fn media() -> Self {
        Self::new(&MEDIA_EXTENSIONS)
    }

    /// Returns `true` if no extensions were given, i.e. the filter is a no-op.
    pub fn is_pass_through(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn matches(&self, file: &MediaFile) -> bool {
        self.is_pass_through() || self.allowed.contains(&file.ext.to_lowercase())
    }

    /// Keeps the matching files, preserving their order.
    pub fn apply(&self, files: Vec<MediaFile>) -> Vec<MediaFile> {
        if self.is_pass_through() {
            return files;
        }
        files.into_iter().filter(|file| self.matches(file)).collect()
    }
}

/// Returns the files whose extension is in `allowed`, in their original
/// order. An empty `allowed` returns every file.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use mediasort::extension_filter::filter_by_extensions;
/// use mediasort::models::MediaFile;
///
/// let files = vec![
///     MediaFile::new("a", "JPG", "/tmp", Utc::now()),
///     MediaFile::new("b", "txt", "/tmp", Utc::now()),
/// ];
/// let kept = filter_by_extensions(files, &["jpg"]);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].ext, "JPG");
/// ```
pub fn filter_by_extensions<S: AsRef<str>>(files: Vec<MediaFile>, allowed: &[S]) -> Vec<MediaFile> {
    ExtensionFilter::new(allowed).apply(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn files(exts: &[&str]) -> Vec<MediaFile> {
        exts.iter()
            .enumerate()
            .map(|(i, ext)| MediaFile::new(format!("file{}", i), *ext, "/tmp", Utc::now()))
            .collect()
    }

    fn exts(files: &[MediaFile]) -> Vec<&str> {
        files.iter().map(|f| f.ext.as_str()).collect()
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let kept = filter_by_extensions(files(&["JPG", "txt"]), &["jpg"]);
        assert_eq!(exts(&kept), vec!["JPG"]);

        let kept = filter_by_extensions(files(&["jpg", "Mp4"]), &["JPG", "MP4"]);
        assert_eq!(exts(&kept), vec!["jpg", "Mp4"]);
    }

    #[test]
    fn test_filter_preserves_order() {
        let kept = filter_by_extensions(
            files(&["png", "txt", "jpeg", "doc", "mp4", "png"]),
            &MEDIA_EXTENSIONS,
        );
        assert_eq!(exts(&kept), vec!["png", "jpeg", "mp4", "png"]);
        assert_eq!(kept[0].name, "file0");
        assert_eq!(kept[3].name, "file5");
    }

    #[test]
    fn test_empty_allow_list_passes_everything_through() {
        let empty: [&str; 0] = [];
        let kept = filter_by_extensions(files(&["png", "txt", ""]), &empty);
        assert_eq!(exts(&kept), vec!["png", "txt", ""]);
        assert!(ExtensionFilter::new(&empty).is_pass_through());
    }

    #[test]
    fn test_file_without_extension_is_dropped_by_non_empty_list() {
        let kept = filter_by_extensions(files(&["", "jpg"]), &["jpg"]);
        assert_eq!(exts(&kept), vec!["jpg"]);
    }

    #[test]
    fn test_media_filter() {
        let filter = ExtensionFilter::media();
        assert!(!filter.is_pass_through());
        let kept = filter.apply(files(&["gif", "JPEG"]));
        assert_eq!(exts(&kept), vec!["JPEG"]);
    }
}
