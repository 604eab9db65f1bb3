/// Catalog runs: sorting a session's files by date or by tag.
///
/// [`Cataloger`] ties the scanner, the extension filter and the destination
/// resolver together. A by-date run handles every media file in the base
/// directory in one pass; tagging handles one file at a time.
use crate::destination::{CatalogStrategy, DestinationResolver};
use crate::error::{CatalogError, CatalogResult};
use crate::extension_filter::ExtensionFilter;
use crate::file_system::{ContentInfo, FileSystem, FileSystemAgent, TransferMode};
use crate::models::{Directory, MediaFile, Session};
use log::info;
use std::path::{Component, Path, PathBuf};

/// A file together with the directory it is (or would be) catalogued into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub file: MediaFile,
    pub dest_dir: PathBuf,
}

/// Outcome of a completed by-date run.
#[derive(Debug, Clone, Default)]
pub struct CatalogReport {
    pub transfers: Vec<Transfer>,
    /// The session's working directory everything was written under.
    pub output_dir: PathBuf,
}

impl CatalogReport {
    pub fn file_count(&self) -> usize {
        self.transfers.len()
    }

    /// Number of files per destination directory, relative to `output_dir`,
    /// sorted by directory.
    pub fn counts_by_destination(&self) -> Vec<(String, usize)> {
        count_by_destination(&self.transfers, &self.output_dir)
    }
}

/// What is waiting in a session's base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSummary {
    pub pending: usize,
    pub output_dir: PathBuf,
}

/// State of the by-tag workflow for a session.
#[derive(Debug, Clone)]
pub struct TagQueue {
    /// Media files still in the base directory.
    pub pending: usize,
    /// The file to tag next, if any remain.
    pub next: Option<MediaFile>,
    /// Existing tags, named by their path under `by-tag`, with the number
    /// of media files filed directly under each.
    pub tags: Vec<Directory>,
}

pub struct Cataloger<'a, F: FileSystem + ?Sized> {
    agent: FileSystemAgent<'a, F>,
    resolver: DestinationResolver,
    extensions: ExtensionFilter,
    transfer: TransferMode,
}

impl<'a, F: FileSystem + ?Sized> Cataloger<'a, F> {
    /// Creates a cataloger that copies media files with the default
    /// extension allow-list.
    pub fn new(agent: FileSystemAgent<'a, F>, resolver: DestinationResolver) -> Self {
        Self {
            agent,
            resolver,
            extensions: ExtensionFilter::media(),
            transfer: TransferMode::Copy,
        }
    }

    pub fn with_extensions(mut self, extensions: ExtensionFilter) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_transfer_mode(mut self, transfer: TransferMode) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn transfer_mode(&self) -> TransferMode {
        self.transfer
    }

    /// Lists the media files waiting in the session's base directory.
    pub fn media_files(&self, session: &Session) -> CatalogResult<Vec<MediaFile>> {
        self.agent
            .files_by_extension(session.base_path(), &self.extensions)
    }

    /// Finds a media file in the base directory by its full file name.
    pub fn find_media_file(&self, session: &Session, file_name: &str) -> CatalogResult<MediaFile> {
        self.media_files(session)?
            .into_iter()
            .find(|file| file.name_with_ext() == file_name)
            .ok_or_else(|| {
                CatalogError::NotFound(
                    session.base_dir.join(file_name).display().to_string(),
                )
            })
    }

    /// Sniffs the content type of a media file in the base directory.
    pub fn content_info(&self, session: &Session, file_name: &str) -> CatalogResult<(MediaFile, ContentInfo)> {
        let file = self.find_media_file(session, file_name)?;
        let info = self.agent.content_info(&file)?;
        Ok((file, info))
    }

    /// Counts the media files still waiting to be catalogued.
    pub fn summary(&self, session: &Session) -> CatalogResult<CatalogSummary> {
        Ok(CatalogSummary {
            pending: self.media_files(session)?.len(),
            output_dir: session.full_dir(),
        })
    }

    /// Computes the by-date destination of every media file without
    /// transferring anything.
    pub fn plan_by_date(&self, session: &Session) -> CatalogResult<Vec<Transfer>> {
        self.media_files(session)?
            .into_iter()
            .map(|file| {
                let dest_dir = self.destination(&CatalogStrategy::ByDate, &file, session)?;
                Ok(Transfer { file, dest_dir })
            })
            .collect()
    }

    /// Catalogues every media file in the base directory by date.
    ///
    /// `on_transfer` is called after each file is transferred. The run stops
    /// at the first failure; files already handled stay where they were put.
    pub fn catalog_by_date<P>(&self, session: &Session, mut on_transfer: P) -> CatalogResult<CatalogReport>
    where
        P: FnMut(&Transfer),
    {
        let planned = self.plan_by_date(session)?;
        let mut report = CatalogReport {
            transfers: Vec::with_capacity(planned.len()),
            output_dir: session.full_dir(),
        };

        for transfer in planned {
            self.agent
                .process_file(&transfer.file, &transfer.dest_dir, self.transfer)?;
            on_transfer(&transfer);
            report.transfers.push(transfer);
        }

        info!(
            "catalogued {} files by date into {}",
            report.file_count(),
            report.output_dir.display()
        );
        Ok(report)
    }

    /// Returns the next file to tag and the tags created so far.
    pub fn tag_queue(&self, session: &Session) -> CatalogResult<TagQueue> {
        let files = self.media_files(session)?;

        let tag_root = DestinationResolver::tag_root(session);
        let mut tags = Vec::new();
        if self.agent.file_system().is_directory(&tag_root) {
            self.collect_tags(&tag_root, &tag_root, &mut tags)?;
        }

        Ok(TagQueue {
            pending: files.len(),
            next: files.into_iter().next(),
            tags,
        })
    }

    /// Catalogues one file from the base directory under `tag`.
    ///
    /// # Errors
    ///
    /// * Missing field if `file_name` or `tag` is blank
    /// * Validation error if `tag` contains `..`
    /// * Not found if `file_name` is not a media file in the base directory
    pub fn catalog_by_tag(&self, session: &Session, file_name: &str, tag: &str) -> CatalogResult<Transfer> {
        if file_name.trim().is_empty() {
            return Err(CatalogError::missing_field("file_name"));
        }
        validate_tag(tag)?;

        let file = self.find_media_file(session, file_name)?;
        let dest_dir = self.destination(&CatalogStrategy::ByTag(tag.to_string()), &file, session)?;
        self.agent.process_file(&file, &dest_dir, self.transfer)?;

        Ok(Transfer { file, dest_dir })
    }

    /// Walks the tag tree below `dir`, depth first in name order.
    ///
    /// A directory is listed as a tag when it holds media files directly or
    /// has no sub-directories; an intermediate directory such as `trips` in
    /// `trips/alps` is skipped unless it holds files itself. Names are paths
    /// relative to `root`.
    fn collect_tags(&self, root: &Path, dir: &Path, tags: &mut Vec<Directory>) -> CatalogResult<()> {
        for found in self.agent.directories_with_file_count(dir, &self.extensions)? {
            let path = found.full_path();
            let position = tags.len();
            self.collect_tags(root, &path, tags)?;

            let has_nested = tags.len() > position;
            let file_count = found.file_count.unwrap_or(0);
            if file_count > 0 || !has_nested {
                let name = path.strip_prefix(root).unwrap_or(path.as_path());
                let mut tag = Directory::new(name.to_string_lossy(), root);
                tag.file_count = Some(file_count);
                tags.insert(position, tag);
            }
        }
        Ok(())
    }

    fn destination(
        &self,
        strategy: &CatalogStrategy,
        file: &MediaFile,
        session: &Session,
    ) -> CatalogResult<PathBuf> {
        let dest_dir = self.resolver.resolve(strategy, file, Some(session));
        if dest_dir.as_os_str().is_empty() {
            return Err(CatalogError::Validation(format!(
                "cannot classify {}",
                file.name_with_ext()
            )));
        }
        Ok(dest_dir)
    }
}

/// Rejects blank tags and tags that try to climb out of the tag directory.
pub fn validate_tag(tag: &str) -> CatalogResult<()> {
    let has_name = Path::new(tag)
        .components()
        .any(|c| matches!(c, Component::Normal(_)));
    if tag.trim().is_empty() || !has_name {
        return Err(CatalogError::missing_field("tag"));
    }

    if Path::new(tag)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(CatalogError::Validation(format!(
            "tag must not contain '..': {}",
            tag
        )));
    }

    Ok(())
}

/// Groups transfers by destination directory relative to `root`.
pub fn count_by_destination(transfers: &[Transfer], root: &Path) -> Vec<(String, usize)> {
    let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();

    for transfer in transfers {
        let relative = transfer
            .dest_dir
            .strip_prefix(root)
            .unwrap_or(transfer.dest_dir.as_path());
        *counts
            .entry(relative.to_string_lossy().to_string())
            .or_insert(0) += 1;
    }

    counts.into_iter().collect()
}
