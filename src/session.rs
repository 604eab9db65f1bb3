/// Session creation and lookup.
///
/// A session records which directory the user wants catalogued and the
/// working sub-directory this run writes into. Sessions are stored as JSON
/// under their token in a [`KeyValStore`].
use crate::error::{CatalogError, CatalogResult};
use crate::file_system::FileSystem;
use crate::models::Session;
use crate::store::KeyValStore;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};
use std::fmt::Display;
use std::path::PathBuf;
use uuid::Uuid;

pub const DEFAULT_SUB_DIR_PREFIX: &str = "processed";

/// Store key holding the token of the most recently created session.
pub const LATEST_SESSION_KEY: &str = "latest";

/// Timestamp format appended to the sub-directory prefix.
const SUB_DIR_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub struct SessionAgent<'a, S: KeyValStore + ?Sized, F: FileSystem + ?Sized> {
    store: &'a S,
    fs: &'a F,
    sub_dir_prefix: String,
}

impl<'a, S: KeyValStore + ?Sized, F: FileSystem + ?Sized> SessionAgent<'a, S, F> {
    pub fn new(store: &'a S, fs: &'a F) -> Self {
        Self {
            store,
            fs,
            sub_dir_prefix: DEFAULT_SUB_DIR_PREFIX.to_string(),
        }
    }

    pub fn with_sub_dir_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sub_dir_prefix = prefix.into();
        self
    }

    /// Creates and stores a session for `dir_path`.
    ///
    /// The working sub-directory is named after `timestamp`, e.g.
    /// `processed20180526140029`.
    ///
    /// # Errors
    ///
    /// * Missing field if `dir_path` is empty
    /// * Validation error if `dir_path` is not a directory
    /// * Store errors from writing the session
    pub fn new_session<Tz>(&self, dir_path: &str, timestamp: &DateTime<Tz>) -> CatalogResult<Session>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if dir_path.is_empty() {
            return Err(CatalogError::missing_field("directory"));
        }

        let base_dir = PathBuf::from(dir_path);
        if !self.fs.is_directory(&base_dir) {
            return Err(CatalogError::Validation(format!(
                "not a directory: {}",
                dir_path
            )));
        }

        let session = Session {
            token: Uuid::new_v4().to_string(),
            base_dir,
            sub_dir: format!(
                "{}{}",
                self.sub_dir_prefix,
                timestamp.format(SUB_DIR_TIMESTAMP_FORMAT)
            ),
            created_at: timestamp.with_timezone(&Utc),
        };

        let json = serde_json::to_string(&session)
            .map_err(|e| CatalogError::Store(format!("failed to encode session: {}", e)))?;
        self.store.write(&session.token, json)?;
        self.store.write(LATEST_SESSION_KEY, session.token.clone())?;

        info!(
            "created session {} for {}",
            session.token,
            session.base_dir.display()
        );
        Ok(session)
    }

    /// Loads the session stored under `token`.
    pub fn session_from_token(&self, token: &str) -> CatalogResult<Session> {
        let json = self.store.read(token)?;
        serde_json::from_str(&json).map_err(|e| {
            CatalogError::Store(format!("token {} does not hold a session: {}", token, e))
        })
    }

    /// Loads the most recently created session.
    pub fn latest_session(&self) -> CatalogResult<Session> {
        let token = self
            .store
            .read(LATEST_SESSION_KEY)
            .map_err(|_| CatalogError::NotFound("no session has been started".to_string()))?;
        debug!("using latest session {}", token);
        self.session_from_token(&token)
    }

    /// Checks that the session's base directory is still a directory.
    pub fn validate(&self, session: &Session) -> CatalogResult<()> {
        if self.fs.is_directory(&session.base_dir) {
            Ok(())
        } else {
            Err(CatalogError::Validation(format!(
                "not a directory: {}",
                session.base_dir.display()
            )))
        }
    }
}
