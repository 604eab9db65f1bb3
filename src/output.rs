//! Terminal output for the command line tool.
//!
//! Everything the user is meant to read goes through [`OutputFormatter`];
//! diagnostics go through `log` instead.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Prints styled messages, tables and progress bars.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mediasort::output::OutputFormatter;
    /// OutputFormatter::success("Catalogued 12 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mediasort::output::OutputFormatter;
    /// OutputFormatter::error("not a directory: /tmp/photos.zip");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for `total` file transfers.
    ///
    /// ```no_run
    /// use mediasort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(3);
    /// pb.inc(1);
    /// pb.finish_with_message("done");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a two-column table of file counts, one row per entry, followed
    /// by a total row.
    ///
    /// Rows are printed in the order given.
    pub fn summary_table(label: &str, rows: &[(String, usize)], total_files: usize) {
        Self::header("SUMMARY");

        let width = rows
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(label.len());

        println!("{:<width$} | {}", label.bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));

        for (name, count) in rows {
            println!(
                "{:<width$} | {} {}",
                name,
                count.to_string().green(),
                pluralize(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            pluralize(total_files),
            width = width
        );
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

/// "file" or "files" depending on `count`.
pub fn pluralize(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
