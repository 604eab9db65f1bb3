//! mediasort - sort photos and videos by the timestamp in their filename or
//! by a user-chosen tag.
//!
//! The classification core is [`timestamp`] (capture time from a file name),
//! [`extension_filter`] (which files count as media) and [`destination`]
//! (where a file goes). [`catalog`] drives those against the disk through
//! [`file_system`], and [`session`] keeps track of which directory a run is
//! working on.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod destination;
pub mod error;
pub mod extension_filter;
pub mod file_system;
pub mod models;
pub mod output;
pub mod session;
pub mod store;
pub mod timestamp;

pub use catalog::{CatalogReport, CatalogSummary, Cataloger, TagQueue, Transfer};
pub use config::{CompiledFilters, Config, ConfigError};
pub use destination::{CatalogStrategy, DestinationResolver};
pub use error::{CatalogError, CatalogResult, ErrorKind};
pub use extension_filter::{ExtensionFilter, filter_by_extensions};
pub use file_system::{FileSystem, FileSystemAgent, OsFileSystem, TransferMode};
pub use models::{Directory, MediaFile, Session};
pub use session::SessionAgent;
pub use store::{InMemoryStore, JsonFileStore, KeyValStore};
pub use timestamp::{TimestampInferencer, infer_timestamp};

pub use cli::{Cli, run_cli};
