/// Destination path computation for the two catalog strategies.
///
/// Nothing here touches the disk. By-date destinations look like
/// `base/sub/by-date/<ext>/<YYYY-MM-DD>` and by-tag destinations look like
/// `base/sub/by-tag/<tag>`. Without a session there is nowhere to put a file,
/// which is reported as an empty path.
use crate::models::{MediaFile, Session};
use crate::timestamp::TimestampInferencer;
use std::path::{Component, Path, PathBuf};

pub const SUB_DIR_BY_DATE: &str = "by-date";
pub const SUB_DIR_BY_TAG: &str = "by-tag";

/// Format of the per-day directory name.
pub const DATE_DIR_FORMAT: &str = "%Y-%m-%d";

/// How a file is sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStrategy {
    /// By the capture date recovered from the file name.
    ByDate,
    /// Under a caller-chosen tag, which may contain `/` to nest.
    ByTag(String),
}

/// Computes where a file should be catalogued.
#[derive(Debug, Clone, Default)]
pub struct DestinationResolver {
    inferencer: TimestampInferencer,
}

impl DestinationResolver {
    pub fn new(inferencer: TimestampInferencer) -> Self {
        Self { inferencer }
    }

    /// Resolves the destination directory for `file`.
    ///
    /// Returns an empty path when `session` is `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use mediasort::destination::{CatalogStrategy, DestinationResolver};
    /// use mediasort::models::{MediaFile, Session};
    /// use std::path::PathBuf;
    ///
    /// let session = Session {
    ///     token: "t".into(),
    ///     base_dir: PathBuf::from("/base/dir"),
    ///     sub_dir: "subdir".into(),
    ///     created_at: Utc::now(),
    /// };
    /// let file = MediaFile::new("20180526140029", "jpg", "/base/dir", Utc::now());
    /// let resolver = DestinationResolver::default();
    ///
    /// assert_eq!(
    ///     resolver.resolve(&CatalogStrategy::ByDate, &file, Some(&session)),
    ///     PathBuf::from("/base/dir/subdir/by-date/jpg/2018-05-26")
    /// );
    /// assert_eq!(
    ///     resolver.resolve(&CatalogStrategy::ByTag("hello/world//".into()), &file, Some(&session)),
    ///     PathBuf::from("/base/dir/subdir/by-tag/hello/world")
    /// );
    /// assert_eq!(resolver.resolve(&CatalogStrategy::ByDate, &file, None), PathBuf::new());
    /// ```
    pub fn resolve(
        &self,
        strategy: &CatalogStrategy,
        file: &MediaFile,
        session: Option<&Session>,
    ) -> PathBuf {
        match strategy {
            CatalogStrategy::ByDate => self.by_date(file, session),
            CatalogStrategy::ByTag(tag) => Self::by_tag(session, tag),
        }
    }

    /// `base/sub/by-date/<ext>/<YYYY-MM-DD>` for the file's inferred date.
    pub fn by_date(&self, file: &MediaFile, session: Option<&Session>) -> PathBuf {
        let Some(session) = session else {
            return PathBuf::new();
        };

        let date = self.inferencer.infer(file).format(DATE_DIR_FORMAT).to_string();
        join_cleaned(
            &session.base_dir,
            &[&session.sub_dir, SUB_DIR_BY_DATE, &file.ext, &date],
        )
    }

    /// `base/sub/by-tag/<tag>`.
    pub fn by_tag(session: Option<&Session>, tag: &str) -> PathBuf {
        let Some(session) = session else {
            return PathBuf::new();
        };

        join_cleaned(&session.base_dir, &[&session.sub_dir, SUB_DIR_BY_TAG, tag])
    }

    /// `base/sub/by-tag`, the directory that holds every tag.
    pub fn tag_root(session: &Session) -> PathBuf {
        Self::by_tag(Some(session), "")
    }
}

/// Appends each segment to `base` and cleans the result.
///
/// Segments are always treated as relative, so a leading `/` in a tag does
/// not replace the base. Empty segments are skipped.
fn join_cleaned(base: &Path, segments: &[&str]) -> PathBuf {
    let mut joined = base.to_path_buf();

    for segment in segments {
        for component in Path::new(segment).components() {
            match component {
                Component::Prefix(_) | Component::RootDir => {}
                other => joined.push(other.as_os_str()),
            }
        }
    }

    clean_path(&joined)
}

/// Lexically normalises a path: drops `.` components, resolves `..` against
/// the preceding component and removes duplicate or trailing separators.
///
/// `..` at the root stays at the root; leading `..` of a relative path are
/// kept.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }

    cleaned
}
