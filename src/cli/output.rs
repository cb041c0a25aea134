//! Terminal output for batchbench
//!
//! Styled messages go to stderr so that stdout carries only the report.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print the final report to stdout, even in quiet mode
    pub fn report(&self, text: &str) {
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("✔").green(), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        // Errors are always shown, even in quiet mode
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Print a header/title
    pub fn header(&self, title: &str) {
        println!("\n{}", style(title).bold().underlined());
    }

    /// Print a category header
    pub fn category(&self, category: &str) {
        println!("\n{}", style(category).bold().cyan());
    }

    /// Print a key-value pair
    pub fn key_value(&self, key: &str, value: &str, highlight: bool) {
        let styled_value = if highlight {
            style(value).green().bold()
        } else {
            style(value).white()
        };
        println!("  {:<22} {}", style(key).dim(), styled_value);
    }

    /// Create a progress bar on stderr; hidden in quiet mode
    pub fn progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message(message.to_string());
        pb
    }
}
