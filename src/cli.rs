//! Command-line interface definitions for AI Newswire.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Paths can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for the AI Newswire aggregator.
///
/// # Examples
///
/// ```sh
/// # Aggregate the built-in seed sources into ./out
/// ai_newswire -o ./out
///
/// # Use a custom source list and also mine search engines for new sources
/// ai_newswire -o ./out --sources sources.yaml --discover
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for JSON snapshots
    #[arg(short, long)]
    pub output_dir: String,

    /// Optional path to a YAML source list (defaults to the built-in seeds)
    #[arg(short, long, env = "NEWSWIRE_SOURCES")]
    pub sources: Option<String>,

    /// Optional path to a YAML configuration file
    #[arg(short, long, env = "NEWSWIRE_CONFIG")]
    pub config: Option<String>,

    /// Also mine search engines for candidate new sources
    #[arg(long)]
    pub discover: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(&[
            "ai_newswire",
            "--output-dir",
            "./out",
            "--sources",
            "./sources.yaml",
        ]);

        assert_eq!(cli.output_dir, "./out");
        assert_eq!(cli.sources.as_deref(), Some("./sources.yaml"));
        assert!(!cli.discover);
    }

    #[test]
    fn test_cli_short_flags_and_discover() {
        let cli = Cli::parse_from(&["ai_newswire", "-o", "/tmp/out", "--discover"]);

        assert_eq!(cli.output_dir, "/tmp/out");
        assert!(cli.sources.is_none());
        assert!(cli.discover);
    }
}
