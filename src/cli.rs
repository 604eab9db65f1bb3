//! Command-line interface for mediasort.
//!
//! A run starts with `mediasort start <DIR>`, which records a session in the
//! session store. Later commands pick that session up (or the one named with
//! `--session`) and catalogue its files by date or by tag.

use crate::catalog::{Cataloger, count_by_destination};
use crate::config::Config;
use crate::destination::DestinationResolver;
use crate::error::{CatalogError, CatalogResult};
use crate::file_system::{FileSystem, FileSystemAgent, OsFileSystem, TransferMode};
use crate::models::Session;
use crate::output::{OutputFormatter, pluralize};
use crate::session::SessionAgent;
use crate::store::{JsonFileStore, KeyValStore};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::debug;
use std::path::{Path, PathBuf};

/// Session store used when `--store` is not given.
pub const DEFAULT_STORE_FILE: &str = ".mediasort_sessions.json";

#[derive(Debug, Parser)]
#[command(
    name = "mediasort",
    version,
    about = "Sort photos and videos by the timestamp in their name or by tag"
)]
pub struct Cli {
    /// Configuration file (defaults to ./.mediasortrc.toml, then
    /// ~/.config/mediasort/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON file sessions are kept in
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    /// Log filter, e.g. `debug` or `mediasort=trace`
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a session for a directory of photos and videos
    Start {
        directory: String,
    },
    /// Show how many media files are waiting in the session directory
    Summary {
        /// Session token (defaults to the latest session)
        #[arg(long)]
        session: Option<String>,
    },
    /// Catalogue every media file by the date it was taken
    ByDate {
        #[arg(long)]
        session: Option<String>,
        /// Show where files would go without touching them
        #[arg(long)]
        dry_run: bool,
        /// Remove originals after copying
        #[arg(long = "move")]
        move_files: bool,
    },
    /// Tag one file, or show the next file to tag and the existing tags
    ByTag {
        #[arg(long)]
        session: Option<String>,
        file: Option<String>,
        tag: Option<String>,
        #[arg(long = "move")]
        move_files: bool,
    },
    /// Print the detected content type and size of a media file
    Show {
        #[arg(long)]
        session: Option<String>,
        file: String,
    },
}

/// Runs the parsed command against the session store named by `cli.store`.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use mediasort::cli::{Cli, run_cli};
/// use mediasort::config::Config;
///
/// let cli = Cli::parse_from(["mediasort", "start", "/home/user/Pictures"]);
/// if let Err(e) = run_cli(&cli, &Config::default()) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli, config: &Config) -> CatalogResult<()> {
    let store = JsonFileStore::open(&cli.store)?;
    let fs = OsFileSystem;
    let sessions =
        SessionAgent::new(&store, &fs).with_sub_dir_prefix(config.catalog.sub_dir_prefix.as_str());

    match &cli.command {
        Commands::Start { directory } => {
            let session = sessions.new_session(directory, &Local::now())?;
            OutputFormatter::success(&format!("Started session for {}", directory));
            OutputFormatter::plain(&format!("Token:       {}", session.token));
            OutputFormatter::plain(&format!("Working dir: {}", session.full_dir().display()));
            Ok(())
        }
        Commands::Summary { session } => {
            let session = load_session(&sessions, session.as_deref())?;
            let cataloger = build_cataloger(&fs, config, false)?;
            let summary = cataloger.summary(&session)?;

            OutputFormatter::header(&format!("Session {}", session.token));
            OutputFormatter::plain(&format!("Directory:   {}", session.base_dir.display()));
            OutputFormatter::plain(&format!("Working dir: {}", summary.output_dir.display()));
            OutputFormatter::info(&format!(
                "{} media {} waiting to be catalogued",
                summary.pending,
                pluralize(summary.pending)
            ));
            Ok(())
        }
        Commands::ByDate {
            session,
            dry_run,
            move_files,
        } => {
            let session = load_session(&sessions, session.as_deref())?;
            let cataloger = build_cataloger(&fs, config, *move_files)?;
            if *dry_run {
                plan_by_date(&cataloger, &session)
            } else {
                catalog_by_date(&cataloger, &session)
            }
        }
        Commands::ByTag {
            session,
            file,
            tag,
            move_files,
        } => {
            let session = load_session(&sessions, session.as_deref())?;
            let cataloger = build_cataloger(&fs, config, *move_files)?;
            match (file.as_deref(), tag.as_deref()) {
                (None, None) => show_tag_queue(&cataloger, &session),
                (Some(file), Some(tag)) => {
                    let transfer = cataloger.catalog_by_tag(&session, file, tag)?;
                    OutputFormatter::success(&format!(
                        "{} {} to {}",
                        cataloger.transfer_mode().verb(),
                        file,
                        transfer.dest_dir.display()
                    ));
                    if cataloger.transfer_mode() == TransferMode::Copy {
                        OutputFormatter::warning(&format!(
                            "{} is still in {} and stays next in the tag queue; use --move to take it out",
                            file,
                            session.base_dir.display()
                        ));
                    }
                    Ok(())
                }
                (Some(_), None) => Err(CatalogError::missing_field("tag")),
                (None, Some(_)) => Err(CatalogError::missing_field("file_name")),
            }
        }
        Commands::Show { session, file } => {
            let session = load_session(&sessions, session.as_deref())?;
            let cataloger = build_cataloger(&fs, config, false)?;
            let (media, info) = cataloger.content_info(&session, file)?;

            OutputFormatter::header(&media.name_with_ext());
            OutputFormatter::plain(&format!("Type: {}", info.mime_type));
            OutputFormatter::plain(&format!("Size: {} bytes", info.size));
            Ok(())
        }
    }
}

/// Loads the session named by `token`, or the latest one, and checks that its
/// directory is still there.
fn load_session<S, F>(sessions: &SessionAgent<'_, S, F>, token: Option<&str>) -> CatalogResult<Session>
where
    S: KeyValStore + ?Sized,
    F: FileSystem + ?Sized,
{
    let session = match token {
        Some(token) => sessions.session_from_token(token)?,
        None => sessions.latest_session()?,
    };
    sessions.validate(&session)?;
    debug!("loaded session {} for {}", session.token, session.base_dir.display());
    Ok(session)
}

fn build_cataloger<'a>(
    fs: &'a OsFileSystem,
    config: &Config,
    move_files: bool,
) -> CatalogResult<Cataloger<'a, OsFileSystem>> {
    let agent = FileSystemAgent::new(fs).with_filters(config.compile_filters()?);
    let resolver = DestinationResolver::new(config.inferencer()?);
    let transfer = if move_files {
        TransferMode::Move
    } else {
        config.catalog.transfer
    };

    Ok(Cataloger::new(agent, resolver)
        .with_extensions(config.extension_filter())
        .with_transfer_mode(transfer))
}

fn plan_by_date<F: FileSystem + ?Sized>(cataloger: &Cataloger<'_, F>, session: &Session) -> CatalogResult<()> {
    let output_dir = session.full_dir();
    let plan = cataloger.plan_by_date(session)?;
    if plan.is_empty() {
        OutputFormatter::info("No media files waiting to be catalogued.");
        return Ok(());
    }

    OutputFormatter::dry_run_notice(&dry_run_banner(cataloger.transfer_mode(), plan.len()));
    for transfer in &plan {
        OutputFormatter::plain(&format!(
            " - {} → {}",
            transfer.file.name_with_ext(),
            relative_to(&transfer.dest_dir, &output_dir).display()
        ));
    }

    OutputFormatter::summary_table(
        "Destination",
        &count_by_destination(&plan, &output_dir),
        plan.len(),
    );
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(())
}

fn catalog_by_date<F: FileSystem + ?Sized>(cataloger: &Cataloger<'_, F>, session: &Session) -> CatalogResult<()> {
    let pending = cataloger.summary(session)?.pending;
    if pending == 0 {
        OutputFormatter::info("No media files waiting to be catalogued.");
        return Ok(());
    }

    OutputFormatter::info(&format!("Cataloguing {} by date", session.base_dir.display()));
    let pb = OutputFormatter::create_progress_bar(pending as u64);
    let result = cataloger.catalog_by_date(session, |transfer| {
        pb.set_message(transfer.file.name_with_ext());
        pb.inc(1);
    });

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            pb.abandon_with_message("stopped");
            return Err(e);
        }
    };
    pb.finish_with_message("done");

    OutputFormatter::summary_table(
        "Destination",
        &report.counts_by_destination(),
        report.file_count(),
    );
    OutputFormatter::success(&format!(
        "{} {} {} into {}",
        cataloger.transfer_mode().verb(),
        report.file_count(),
        pluralize(report.file_count()),
        report.output_dir.display()
    ));
    Ok(())
}

fn show_tag_queue<F: FileSystem + ?Sized>(cataloger: &Cataloger<'_, F>, session: &Session) -> CatalogResult<()> {
    let queue = cataloger.tag_queue(session)?;

    match &queue.next {
        Some(file) => OutputFormatter::info(&format!(
            "Next: {} ({} {} left)",
            file.name_with_ext(),
            queue.pending,
            pluralize(queue.pending)
        )),
        None => OutputFormatter::success("Every media file has been tagged."),
    }

    if queue.tags.is_empty() {
        OutputFormatter::plain("No tags yet.");
        return Ok(());
    }

    let rows: Vec<(String, usize)> = queue
        .tags
        .iter()
        .map(|dir| (dir.name.clone(), dir.file_count.unwrap_or(0)))
        .collect();
    let total = rows.iter().map(|(_, count)| count).sum();
    OutputFormatter::summary_table("Tag", &rows, total);
    Ok(())
}

fn dry_run_banner(mode: TransferMode, count: usize) -> String {
    format!("Would {} {} {}:", mode.action(), count, pluralize(count))
}

fn relative_to<'p>(path: &'p Path, root: &Path) -> &'p Path {
    path.strip_prefix(root).unwrap_or(path)
}
