//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// litmeta - Extract bibliographic metadata from PDF documents with an LLM.
#[derive(Debug, Parser)]
#[command(name = "litmeta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (file names only)
    Quiet,
}

/// Results file format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ResultsFormatArg {
    /// Comma-separated values
    Csv,
    /// JSON array of records
    Json,
}

/// Provider options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ProviderArg {
    /// Google Gemini
    Gemini,
    /// OpenAI-compatible chat completions
    Openai,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract metadata from PDF documents
    Extract(ExtractArgs),

    /// List the available metadata fields
    Fields,

    /// Print the prompt that would be sent
    Prompt(PromptArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// PDF files or directories containing them
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Fields to extract (comma-separated; defaults from config)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Seconds to wait between documents and base retry delay
    #[arg(short, long)]
    pub delay: Option<f64>,

    /// Attempts per document
    #[arg(short, long)]
    pub max_attempts: Option<u32>,

    /// Write the results table to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Format of the results file
    #[arg(long, value_enum)]
    pub output_format: Option<ResultsFormatArg>,

    /// Directory for error-log CSV files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// LLM provider
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model name
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

/// Arguments for the prompt command.
#[derive(Debug, Parser)]
pub struct PromptArgs {
    /// Fields to include (comma-separated; defaults from config)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<ResultsFormatArg> for crate::config::ResultsFormat {
    fn from(format: ResultsFormatArg) -> Self {
        match format {
            ResultsFormatArg::Csv => crate::config::ResultsFormat::Csv,
            ResultsFormatArg::Json => crate::config::ResultsFormat::Json,
        }
    }
}

impl From<ProviderArg> for crate::config::ProviderKind {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Gemini => crate::config::ProviderKind::Gemini,
            ProviderArg::Openai => crate::config::ProviderKind::OpenAi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from([
            "litmeta",
            "extract",
            "a.pdf",
            "papers/",
            "--fields",
            "title,year",
            "--max-attempts",
            "5",
            "--temperature",
            "0.3",
        ]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.fields, vec!["title", "year"]);
                assert_eq!(args.max_attempts, Some(5));
                assert_eq!(args.temperature, Some(0.3));
                assert!(args.output.is_none());
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_extract_requires_files() {
        assert!(Cli::try_parse_from(["litmeta", "extract"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["litmeta", "fields", "-vv", "--no-color"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Command::Fields));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["litmeta", "fields", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["litmeta", "config", "init", "--force"]);
        match cli.command {
            Command::Config(args) => assert!(matches!(args.action, ConfigAction::Init { force: true })),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_provider_conversion() {
        let kind: crate::config::ProviderKind = ProviderArg::Openai.into();
        assert_eq!(kind, crate::config::ProviderKind::OpenAi);
    }
}
