//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Parse a similarity threshold in `0.0..=1.0`.
fn parse_threshold(value: &str) -> Result<f32, String> {
    let threshold: f32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(format!("{threshold} is not in 0.0..=1.0"))
    }
}

/// Retrieval-augmented question answering over local documents
#[derive(Parser, Debug)]
#[command(
    name = "ragline",
    version = env!("CARGO_PKG_VERSION"),
    about = "Index documents and answer questions from them",
    long_about = "Index documents into a local vector store and answer questions with the \
                  closest passages, optionally synthesized by a language model.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ ragline init\n  $ ragline index notes.txt data.csv\n  $ ragline ask \"What did the cat do?\" --n-best 3\n  $ ragline ask \"Summarize the notes\" --use-llm"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .ragline directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Load, chunk, embed and store documents
    #[command(about = "Add documents to the vector store")]
    Index {
        /// Files to index (txt, csv; other formats need an extractor)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Answer a question from indexed documents
    #[command(
        about = "Answer a question with the closest passages",
        after_help = "Examples:\n  ragline ask \"what is a chunk?\"\n  ragline ask \"what is a chunk?\" --top-k 10 --n-best 5 --threshold 0.8\n  ragline ask \"what is a chunk?\" --use-llm --json"
    )]
    Ask {
        /// The question
        query: String,

        /// Candidates fetched from the store (overrides config)
        #[arg(short = 'k', long, value_parser = clap::value_parser!(u16).range(1..=20))]
        top_k: Option<u16>,

        /// Answers returned (overrides config)
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=10))]
        n_best: Option<u16>,

        /// Maximum distance a candidate may have (overrides config)
        #[arg(short, long, value_parser = parse_threshold)]
        threshold: Option<f32>,

        /// Prepend a synthesized answer from the language model
        #[arg(long)]
        use_llm: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show vector store statistics
    #[command(about = "Show the number of stored chunks")]
    Stats {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "ragline", "ask", "what sat?", "-k", "8", "--n-best", "2", "--threshold", "0.75",
            "--use-llm",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask {
                query,
                top_k,
                n_best,
                threshold,
                use_llm,
                json,
            } => {
                assert_eq!(query, "what sat?");
                assert_eq!(top_k, Some(8));
                assert_eq!(n_best, Some(2));
                assert_eq!(threshold, Some(0.75));
                assert!(use_llm);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ask_ranges_enforced() {
        assert!(Cli::try_parse_from(["ragline", "ask", "q", "--top-k", "21"]).is_err());
        assert!(Cli::try_parse_from(["ragline", "ask", "q", "--top-k", "0"]).is_err());
        assert!(Cli::try_parse_from(["ragline", "ask", "q", "--n-best", "11"]).is_err());
        assert!(Cli::try_parse_from(["ragline", "ask", "q", "--threshold", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["ragline", "ask", "q", "--threshold", "abc"]).is_err());
    }

    #[test]
    fn test_index_requires_files() {
        assert!(Cli::try_parse_from(["ragline", "index"]).is_err());
        let cli = Cli::try_parse_from(["ragline", "--config", "x.toml", "index", "a.txt", "b.csv"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Index { files } if files.len() == 2));
    }
}
