//! Integration tests for mediasort
//!
//! These tests drive the command line entry point against real directories,
//! checking where files end up on disk.
//!
//! Test categories:
//! 1. Sessions
//! 2. Cataloguing by date
//! 3. Cataloguing by tag
//! 4. Configuration
//! 5. Error scenarios

use chrono::{DateTime, Utc};
use clap::Parser;
use mediasort::OsFileSystem;
use mediasort::cli::{Cli, run_cli};
use mediasort::config::Config;
use mediasort::error::{CatalogError, CatalogResult, ErrorKind};
use mediasort::models::Session;
use mediasort::session::SessionAgent;
use mediasort::store::JsonFileStore;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary workspace holding a photo directory, a session store and an
/// optional configuration file.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("photos")).expect("Failed to create photos directory");
        TestFixture { temp_dir }
    }

    /// The directory sessions are started on.
    fn photos(&self) -> PathBuf {
        self.temp_dir.path().join("photos")
    }

    fn store_path(&self) -> PathBuf {
        self.temp_dir.path().join("state").join("sessions.json")
    }

    /// Create a file with content in the photo directory.
    fn create_file(&self, name: &str, content: &[u8]) {
        let mut file = File::create(self.photos().join(name)).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_file(name, JPEG_HEADER);
        }
    }

    /// Write a configuration file and return its path.
    fn write_config(&self, toml: &str) -> PathBuf {
        let path = self.temp_dir.path().join("config.toml");
        fs::write(&path, toml).expect("Failed to write config");
        path
    }

    /// Run the CLI with the default configuration.
    fn run(&self, args: &[&str]) -> CatalogResult<()> {
        self.run_with_config(args, &Config::default())
    }

    fn run_with_config(&self, args: &[&str], config: &Config) -> CatalogResult<()> {
        let store = self.store_path();
        let mut argv = vec!["mediasort", "--store", store.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("arguments should parse");
        run_cli(&cli, config)
    }

    /// Start a session on the photo directory and return it.
    fn start(&self) -> Session {
        let photos = self.photos();
        self.run(&["start", photos.to_str().unwrap()])
            .expect("start should succeed");
        self.latest_session()
    }

    fn latest_session(&self) -> Session {
        let store = JsonFileStore::open(self.store_path()).expect("store should open");
        SessionAgent::new(&store, &OsFileSystem)
            .latest_session()
            .expect("a session should exist")
    }

    fn assert_file_exists(&self, path: &Path) {
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, path: &Path) {
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn assert_photo_exists(&self, name: &str) {
        self.assert_file_exists(&self.photos().join(name));
    }

    fn assert_photo_not_exists(&self, name: &str) {
        self.assert_file_not_exists(&self.photos().join(name));
    }
}

// ============================================================================
// Test Data
// ============================================================================

/// JPEG file header (minimal)
const JPEG_HEADER: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, // JPEG SOI and APP0 marker
    0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, // JFIF signature
    0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
];

/// PNG file header (minimal, just enough to be detected as PNG)
const PNG_HEADER: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
];

// ============================================================================
// Test Suite 1: Sessions
// ============================================================================

#[test]
fn test_start_persists_session() {
    let fixture = TestFixture::new();
    let session = fixture.start();

    assert_eq!(session.base_dir, fixture.photos());
    assert!(session.sub_dir.starts_with("processed"));
    assert_eq!(session.sub_dir.len(), "processed".len() + 14);
    assert!(fixture.store_path().exists());
}

#[test]
fn test_explicit_session_token_is_used() {
    let fixture = TestFixture::new();
    fixture.create_files(&["20180526140029.jpg"]);
    let first = fixture.start();

    let other = fixture.temp_dir.path().join("other");
    fs::create_dir(&other).unwrap();
    fixture.run(&["start", other.to_str().unwrap()]).unwrap();
    assert_eq!(fixture.latest_session().base_dir, other);

    fixture
        .run(&["by-date", "--session", first.token.as_str()])
        .unwrap();
    fixture.assert_file_exists(
        &first
            .full_dir()
            .join("by-date/jpg/2018-05-26/20180526140029.jpg"),
    );
}

#[test]
fn test_session_directory_removed_later() {
    let fixture = TestFixture::new();
    fixture.start();
    fs::remove_dir(fixture.photos()).unwrap();

    let err = fixture.run(&["summary"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ============================================================================
// Test Suite 2: Cataloguing by date
// ============================================================================

#[test]
fn test_by_date_copies_every_layout() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        "20180526140029.jpg",
        "20180526_150000.jpg",
        "20190202-101010.mp4",
        "Screenshot_20200303-111111.jpeg",
        "Screenshot_20200304-121212_Maps.jpeg",
        "Screenshot 2021-01-02 at 10.11.12.jpg",
    ]);
    fixture.create_file("Screenshot_20220505_101010.png", PNG_HEADER);
    fixture.create_file("readme.txt", b"not a photo");
    let session = fixture.start();

    fixture.run(&["by-date"]).unwrap();

    let out = session.full_dir().join("by-date");
    fixture.assert_file_exists(&out.join("jpg/2018-05-26/20180526140029.jpg"));
    fixture.assert_file_exists(&out.join("jpg/2018-05-26/20180526_150000.jpg"));
    fixture.assert_file_exists(&out.join("mp4/2019-02-02/20190202-101010.mp4"));
    fixture.assert_file_exists(&out.join("jpeg/2020-03-03/Screenshot_20200303-111111.jpeg"));
    fixture.assert_file_exists(&out.join("jpeg/2020-03-04/Screenshot_20200304-121212_Maps.jpeg"));
    fixture.assert_file_exists(&out.join("jpg/2021-01-02/Screenshot 2021-01-02 at 10.11.12.jpg"));
    fixture.assert_file_exists(&out.join("png/2022-05-05/Screenshot_20220505_101010.png"));
    assert!(!out.join("txt").exists());

    // Copy mode leaves the originals alone.
    fixture.assert_photo_exists("20180526140029.jpg");
    fixture.assert_photo_exists("readme.txt");
}

#[test]
fn test_by_date_falls_back_to_modification_time() {
    let fixture = TestFixture::new();
    fixture.create_files(&["holiday.jpg", "2018052614002.jpg"]);
    let session = fixture.start();

    let date_of = |name: &str| {
        let modified = fs::metadata(fixture.photos().join(name))
            .unwrap()
            .modified()
            .unwrap();
        DateTime::<Utc>::from(modified).format("%Y-%m-%d").to_string()
    };
    let holiday_date = date_of("holiday.jpg");
    let short_date = date_of("2018052614002.jpg");

    fixture.run(&["by-date"]).unwrap();

    let jpg = session.full_dir().join("by-date/jpg");
    fixture.assert_file_exists(&jpg.join(holiday_date).join("holiday.jpg"));
    fixture.assert_file_exists(&jpg.join(short_date).join("2018052614002.jpg"));
}

#[test]
fn test_by_date_dry_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&["20180526140029.jpg"]);
    let session = fixture.start();

    fixture.run(&["by-date", "--dry-run", "--move"]).unwrap();

    assert!(!session.full_dir().exists());
    fixture.assert_photo_exists("20180526140029.jpg");
}

#[test]
fn test_by_date_move_removes_originals() {
    let fixture = TestFixture::new();
    fixture.create_files(&["20180526140029.jpg", "20180527140029.jpg"]);
    let session = fixture.start();

    fixture.run(&["by-date", "--move"]).unwrap();

    fixture.assert_photo_not_exists("20180526140029.jpg");
    fixture.assert_photo_not_exists("20180527140029.jpg");
    let jpg = session.full_dir().join("by-date/jpg");
    fixture.assert_file_exists(&jpg.join("2018-05-26/20180526140029.jpg"));
    fixture.assert_file_exists(&jpg.join("2018-05-27/20180527140029.jpg"));

    // Nothing left to do on a second run.
    fixture.run(&["by-date"]).unwrap();
}

#[test]
fn test_by_date_stops_at_first_failure() {
    let fixture = TestFixture::new();
    fixture.create_file("20180526140029.jpg", JPEG_HEADER);
    fixture.create_file("20190101120000.png", PNG_HEADER);
    fixture.create_file("20200101120000.jpg", JPEG_HEADER);
    let session = fixture.start();

    // A plain file where the png date tree should go.
    let by_date = session.full_dir().join("by-date");
    fs::create_dir_all(&by_date).unwrap();
    fs::write(by_date.join("png"), "in the way").unwrap();

    let err = fixture.run(&["by-date", "--move"]).unwrap_err();
    assert!(matches!(err, CatalogError::DirectoryCreationFailed { .. }));
    assert_eq!(err.kind(), ErrorKind::Internal);

    fixture.assert_file_exists(&by_date.join("jpg/2018-05-26/20180526140029.jpg"));
    fixture.assert_photo_not_exists("20180526140029.jpg");
    fixture.assert_photo_exists("20190101120000.png");
    fixture.assert_photo_exists("20200101120000.jpg");
    assert!(!by_date.join("jpg/2020-01-01").exists());
}

// ============================================================================
// Test Suite 3: Cataloguing by tag
// ============================================================================

#[test]
fn test_by_tag_workflow() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.jpg", "c.jpg"]);
    let session = fixture.start();
    let by_tag = session.full_dir().join("by-tag");

    fixture.run(&["by-tag"]).unwrap();

    fixture.run(&["by-tag", "a.jpg", "beach", "--move"]).unwrap();
    fixture.run(&["by-tag", "b.jpg", "trips//alps/", "--move"]).unwrap();
    fixture.run(&["by-tag", "c.jpg", "beach"]).unwrap();

    fixture.assert_file_exists(&by_tag.join("beach/a.jpg"));
    fixture.assert_file_exists(&by_tag.join("trips/alps/b.jpg"));
    fixture.assert_file_exists(&by_tag.join("beach/c.jpg"));
    fixture.assert_photo_not_exists("a.jpg");
    fixture.assert_photo_not_exists("b.jpg");
    fixture.assert_photo_exists("c.jpg");

    fixture.run(&["by-tag"]).unwrap();
}

#[test]
fn test_by_tag_rejects_bad_input() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    fixture.create_file("notes.txt", b"text");
    let session = fixture.start();

    let kind = |args: &[&str]| fixture.run(args).unwrap_err().kind();
    assert_eq!(kind(&["by-tag", "a.jpg"]), ErrorKind::BadRequest);
    assert_eq!(kind(&["by-tag", "a.jpg", " "]), ErrorKind::BadRequest);
    assert_eq!(kind(&["by-tag", "a.jpg", "../../outside"]), ErrorKind::Validation);
    assert_eq!(kind(&["by-tag", "missing.jpg", "beach"]), ErrorKind::NotFound);
    assert_eq!(kind(&["by-tag", "notes.txt", "beach"]), ErrorKind::NotFound);

    fixture.assert_photo_exists("a.jpg");
    assert!(!session.full_dir().exists());
}

#[test]
fn test_absolute_tag_stays_inside_session() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let session = fixture.start();

    fixture.run(&["by-tag", "a.jpg", "/etc"]).unwrap();
    fixture.assert_file_exists(&session.full_dir().join("by-tag/etc/a.jpg"));
}

// ============================================================================
// Test Suite 4: Configuration
// ============================================================================

#[test]
fn test_config_layouts_extensions_and_filters() {
    let fixture = TestFixture::new();
    let config_path = fixture.write_config(
        r#"
[catalog]
extensions = ["jpg", "heic"]
transfer = "move"
sub_dir_prefix = "sorted-"
timestamp_layouts = ["PXL_%Y%m%d_%H%M%S"]

[filters.exclude]
filenames = ["20180526140029.jpg"]
"#,
    );
    let config = Config::load(Some(&config_path)).unwrap();

    fixture.create_files(&[
        "PXL_20210304_050607.heic",
        "20180526140029.jpg",
        "20180527140029.jpg",
        "20180528140029.png",
    ]);
    let photos = fixture.photos();
    fixture
        .run_with_config(&["start", photos.to_str().unwrap()], &config)
        .unwrap();
    let session = fixture.latest_session();
    assert!(session.sub_dir.starts_with("sorted-"));

    fixture.run_with_config(&["by-date"], &config).unwrap();

    let out = session.full_dir().join("by-date");
    fixture.assert_file_exists(&out.join("heic/2021-03-04/PXL_20210304_050607.heic"));
    fixture.assert_file_exists(&out.join("jpg/2018-05-27/20180527140029.jpg"));
    fixture.assert_photo_not_exists("PXL_20210304_050607.heic");
    // Excluded by name and by extension.
    fixture.assert_photo_exists("20180526140029.jpg");
    fixture.assert_photo_exists("20180528140029.png");
}

#[test]
fn test_invalid_config_is_validation_error() {
    let fixture = TestFixture::new();
    let config_path = fixture.write_config("[catalog]\ntimestamp_layouts = [\"%Q\"]\n");

    let err = CatalogError::from(Config::load(Some(&config_path)).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.kind().exit_code(), 4);
}

#[test]
fn test_missing_config_is_not_found() {
    let fixture = TestFixture::new();
    let missing = fixture.temp_dir.path().join("nope.toml");

    let err = CatalogError::from(Config::load(Some(&missing)).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ============================================================================
// Test Suite 5: Error scenarios
// ============================================================================

#[test]
fn test_start_errors() {
    let fixture = TestFixture::new();

    let err = fixture.run(&["start", ""]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(err.kind().exit_code(), 2);

    let missing = fixture.temp_dir.path().join("missing");
    let err = fixture.run(&["start", missing.to_str().unwrap()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_commands_before_start() {
    let fixture = TestFixture::new();

    let cases: [&[&str]; 4] = [&["summary"], &["by-date"], &["by-tag"], &["show", "a.jpg"]];
    for args in cases {
        let err = fixture.run(args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{:?}", args);
        assert_eq!(err.kind().exit_code(), 3);
    }
}

#[test]
fn test_show_reports_content_type() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.png", PNG_HEADER);
    fixture.start();

    fixture.run(&["show", "photo.png"]).unwrap();
    let err = fixture.run(&["show", "other.png"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_corrupt_store_is_internal_error() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.store_path().parent().unwrap()).unwrap();
    fs::write(fixture.store_path(), "{ not json").unwrap();

    let err = fixture.run(&["summary"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}
