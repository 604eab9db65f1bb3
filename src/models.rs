/// Core data types shared by the scanner, the timestamp inferencer and the
/// destination resolver.
///
/// Values here are plain data: files and directories are built during a scan
/// and never mutated afterwards, and sessions are owned by a key/value store.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single file found in a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// The file name without its final extension segment.
    pub name: String,
    /// The extension exactly as found on disk, without the leading dot.
    pub ext: String,
    /// The directory containing the file.
    pub dir_path: PathBuf,
    /// The on-disk modification time, used when the name carries no timestamp.
    pub created_at: DateTime<Utc>,
}

impl MediaFile {
    /// Creates a file from an already split name and extension.
    pub fn new(
        name: impl Into<String>,
        ext: impl Into<String>,
        dir_path: impl Into<PathBuf>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            ext: ext.into(),
            dir_path: dir_path.into(),
            created_at,
        }
    }

    /// Creates a file from a full file name such as `IMG_0001.jpg`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use mediasort::models::MediaFile;
    ///
    /// let file = MediaFile::from_file_name("holiday.beach.JPG", "/photos", Utc::now());
    /// assert_eq!(file.name, "holiday.beach");
    /// assert_eq!(file.ext, "JPG");
    /// ```
    pub fn from_file_name(
        file_name: &str,
        dir_path: impl Into<PathBuf>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (name, ext) = split_name_and_extension(file_name);
        Self::new(name, ext, dir_path, created_at)
    }

    /// Returns the name and extension joined back together.
    pub fn name_with_ext(&self) -> String {
        if self.ext.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.ext)
        }
    }

    /// Returns the full path of the file on disk.
    pub fn full_path(&self) -> PathBuf {
        self.dir_path.join(self.name_with_ext())
    }
}

/// A directory found during a scan, optionally with a count of the media
/// files it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub name: String,
    /// The parent directory.
    pub dir_path: PathBuf,
    pub file_count: Option<usize>,
}

impl Directory {
    pub fn new(name: impl Into<String>, dir_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir_path: dir_path.into(),
            file_count: None,
        }
    }

    pub fn full_path(&self) -> PathBuf {
        self.dir_path.join(&self.name)
    }
}

/// Binds an opaque token to the directory a user wants catalogued and the
/// working directory this run writes into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identifier used as the key in the session store.
    pub token: String,
    /// The user's source directory.
    pub base_dir: PathBuf,
    /// Per-run working directory, relative to `base_dir`.
    pub sub_dir: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Returns `base_dir/sub_dir`, the root of everything this run writes.
    pub fn full_dir(&self) -> PathBuf {
        self.base_dir.join(&self.sub_dir)
    }

    /// Returns the source directory as a path.
    pub fn base_path(&self) -> &Path {
        &self.base_dir
    }
}

/// Splits a file name into its stem and extension.
///
/// Only the last `.`-separated segment is treated as the extension, so
/// interior dots stay with the stem. A name without any `.` has an empty
/// extension.
///
/// # Examples
///
/// ```
/// use mediasort::models::split_name_and_extension;
///
/// assert_eq!(split_name_and_extension("noExt"), ("noExt".to_string(), String::new()));
/// assert_eq!(
///     split_name_and_extension("june_brown.plays.cotton"),
///     ("june_brown.plays".to_string(), "cotton".to_string())
/// );
/// ```
pub fn split_name_and_extension(file_name: &str) -> (String, String) {
    match file_name.rsplit_once('.') {
        Some((name, ext)) => (name.to_string(), ext.to_string()),
        None => (file_name.to_string(), String::new()),
    }
}
