/// File system boundary: listing directories and copying or moving files.
///
/// The [`FileSystem`] trait is the only place the crate performs disk I/O on
/// media files. [`OsFileSystem`] implements it on top of `std::fs`, and
/// [`FileSystemAgent`] layers filtering and counting on top of any
/// implementation.
use crate::config::CompiledFilters;
use crate::error::{CatalogError, CatalogResult};
use crate::extension_filter::ExtensionFilter;
use crate::models::{Directory, MediaFile};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Whether a catalogued file keeps its original.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Duplicate the file and leave the original in place.
    #[default]
    Copy,
    /// Duplicate the file, then delete the original.
    Move,
}

impl TransferMode {
    /// Past tense, for reporting a finished transfer.
    pub fn verb(&self) -> &'static str {
        match self {
            TransferMode::Copy => "Copied",
            TransferMode::Move => "Moved",
        }
    }

    /// Present tense, for describing a transfer that has not happened.
    pub fn action(&self) -> &'static str {
        match self {
            TransferMode::Copy => "copy",
            TransferMode::Move => "move",
        }
    }
}

/// Disk operations needed to catalogue files.
pub trait FileSystem {
    /// Returns `true` if `path` exists and is a directory.
    fn is_directory(&self, path: &Path) -> bool;

    /// Lists the files directly inside `path`, without recursing.
    fn files_in_directory(&self, path: &Path) -> CatalogResult<Vec<MediaFile>>;

    /// Lists the directories directly inside `path`, without recursing.
    fn directories_in_directory(&self, path: &Path) -> CatalogResult<Vec<Directory>>;

    fn read_contents(&self, file: &MediaFile) -> CatalogResult<Vec<u8>>;

    /// Copies `file` into `dest_dir`, creating it if needed, and returns the
    /// path of the copy. The source is left untouched.
    fn copy(&self, file: &MediaFile, dest_dir: &Path) -> CatalogResult<PathBuf>;

    /// Copies `file` into `dest_dir`, then removes the source.
    ///
    /// If the removal fails the copy is kept.
    fn move_file(&self, file: &MediaFile, dest_dir: &Path) -> CatalogResult<PathBuf>;
}

/// [`FileSystem`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    fn read_dir_sorted(path: &Path) -> CatalogResult<Vec<(String, fs::Metadata)>> {
        let read_error = |source| CatalogError::ReadDirectory {
            path: path.to_path_buf(),
            source,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            // Follow symlinks so a linked photo counts as a file.
            let Ok(metadata) = fs::metadata(entry.path()) else {
                continue;
            };
            entries.push((entry.file_name().to_string_lossy().to_string(), metadata));
        }

        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(entries)
    }
}

impl FileSystem for OsFileSystem {
    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn files_in_directory(&self, path: &Path) -> CatalogResult<Vec<MediaFile>> {
        let files: Vec<MediaFile> = Self::read_dir_sorted(path)?
            .into_iter()
            .filter(|(_, metadata)| metadata.is_file())
            .map(|(file_name, metadata)| {
                let created_at = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                MediaFile::from_file_name(&file_name, path, created_at)
            })
            .collect();

        debug!("{} files in {}", files.len(), path.display());
        Ok(files)
    }

    fn directories_in_directory(&self, path: &Path) -> CatalogResult<Vec<Directory>> {
        Ok(Self::read_dir_sorted(path)?
            .into_iter()
            .filter(|(_, metadata)| metadata.is_dir())
            .map(|(name, _)| Directory::new(name, path))
            .collect())
    }

    fn read_contents(&self, file: &MediaFile) -> CatalogResult<Vec<u8>> {
        let path = file.full_path();
        fs::read(&path).map_err(|source| CatalogError::ReadFile { path, source })
    }

    fn copy(&self, file: &MediaFile, dest_dir: &Path) -> CatalogResult<PathBuf> {
        let source_path = file.full_path();
        if !source_path.is_file() {
            return Err(CatalogError::NotFound(source_path.display().to_string()));
        }

        fs::create_dir_all(dest_dir).map_err(|source| CatalogError::DirectoryCreationFailed {
            path: dest_dir.to_path_buf(),
            source,
        })?;

        let destination = dest_dir.join(file.name_with_ext());
        fs::copy(&source_path, &destination).map_err(|source| CatalogError::CopyFailed {
            from: source_path.clone(),
            to: destination.clone(),
            source,
        })?;

        Ok(destination)
    }

    fn move_file(&self, file: &MediaFile, dest_dir: &Path) -> CatalogResult<PathBuf> {
        let destination = self.copy(file, dest_dir)?;

        let source_path = file.full_path();
        fs::remove_file(&source_path).map_err(|source| CatalogError::RemoveFailed {
            path: source_path,
            source,
        })?;

        Ok(destination)
    }
}

/// Type information sniffed from a file's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    pub mime_type: String,
    pub size: usize,
}

/// Higher-level file operations on top of a [`FileSystem`].
pub struct FileSystemAgent<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    filters: CompiledFilters,
}

impl<'a, F: FileSystem + ?Sized> FileSystemAgent<'a, F> {
    /// Creates an agent that hides dot-files and applies no other scan filter.
    pub fn new(fs: &'a F) -> Self {
        Self {
            fs,
            filters: CompiledFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn file_system(&self) -> &F {
        self.fs
    }

    /// Lists the files in `dir` that pass the scan filters and the extension
    /// allow-list, in file-name order.
    pub fn files_by_extension(
        &self,
        dir: &Path,
        extensions: &ExtensionFilter,
    ) -> CatalogResult<Vec<MediaFile>> {
        let files = self
            .fs
            .files_in_directory(dir)?
            .into_iter()
            .filter(|file| self.filters.should_include(&file.full_path()))
            .collect();

        Ok(extensions.apply(files))
    }

    /// Lists the sub-directories of `dir`, each with the number of allowed
    /// files directly inside it.
    pub fn directories_with_file_count(
        &self,
        dir: &Path,
        extensions: &ExtensionFilter,
    ) -> CatalogResult<Vec<Directory>> {
        let mut dirs = self.fs.directories_in_directory(dir)?;

        for directory in &mut dirs {
            let files = self.files_by_extension(&directory.full_path(), extensions)?;
            directory.file_count = Some(files.len());
        }

        Ok(dirs)
    }

    /// Copies or moves `file` into `dest_dir`.
    pub fn process_file(
        &self,
        file: &MediaFile,
        dest_dir: &Path,
        mode: TransferMode,
    ) -> CatalogResult<PathBuf> {
        let destination = match mode {
            TransferMode::Copy => self.fs.copy(file, dest_dir)?,
            TransferMode::Move => self.fs.move_file(file, dest_dir)?,
        };

        info!(
            "{} {} -> {}",
            mode.verb(),
            file.full_path().display(),
            destination.display()
        );
        Ok(destination)
    }

    /// Reads `file` and detects its MIME type from the contents.
    pub fn content_info(&self, file: &MediaFile) -> CatalogResult<ContentInfo> {
        let contents = self.fs.read_contents(file).map_err(|e| match e {
            CatalogError::ReadFile { ref source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                CatalogError::NotFound(file.full_path().display().to_string())
            }
            other => other,
        })?;

        let mime_type = match infer::get(&contents) {
            Some(kind) => kind.mime_type().to_string(),
            None if std::str::from_utf8(&contents).is_ok() => {
                "text/plain; charset=utf-8".to_string()
            }
            None => "application/octet-stream".to_string(),
        };

        Ok(ContentInfo {
            mime_type,
            size: contents.len(),
        })
    }
}
