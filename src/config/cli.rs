use crate::config::toml_config::AppConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "profile-dedupe")]
#[command(about = "Split CSV exports and merge duplicate CDP profiles through the vendor API")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Fabricate results without any network call
    #[arg(long, global = true, conflicts_with = "live")]
    pub dry_run: bool,

    /// Send real requests even if the config or DRY_RUN says otherwise
    #[arg(long, global = true)]
    pub live: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Split a CSV into fixed-size chunk files
    Chunk {
        /// CSV file to split
        input: PathBuf,

        /// Output files are named {prefix}_part{n}.csv
        #[arg(long)]
        output_prefix: Option<String>,

        /// Maximum data rows per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Clear identities on child profiles and mark them not-to-keep
    Identity {
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Regex matched against file names in the input directory
        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        result_summary: Option<PathBuf>,
    },

    /// Mark winner profiles to-keep through the bulk events API
    Bulk {
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Regex matched against file names in the input directory
        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        result_summary: Option<PathBuf>,

        #[arg(long)]
        batch_size: Option<usize>,
    },
}

impl Cli {
    /// Command-line flags take precedence over file and environment settings.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if self.dry_run {
            config.run.dry_run = true;
        }
        if self.live {
            config.run.dry_run = false;
        }

        match &self.command {
            Command::Chunk {
                output_prefix,
                chunk_size,
                ..
            } => {
                if let Some(prefix) = output_prefix {
                    config.chunk.output_prefix = prefix.clone();
                }
                if let Some(size) = chunk_size {
                    config.chunk.size = *size;
                }
            }
            Command::Identity {
                input_dir,
                pattern,
                result_summary,
            } => {
                if let Some(dir) = input_dir {
                    config.identity.input_dir = dir.clone();
                }
                if let Some(pattern) = pattern {
                    config.identity.file_pattern = pattern.clone();
                }
                if let Some(path) = result_summary {
                    config.identity.result_summary = path.clone();
                }
            }
            Command::Bulk {
                input_dir,
                pattern,
                result_summary,
                batch_size,
            } => {
                if let Some(dir) = input_dir {
                    config.bulk.input_dir = dir.clone();
                }
                if let Some(pattern) = pattern {
                    config.bulk.file_pattern = pattern.clone();
                }
                if let Some(path) = result_summary {
                    config.bulk.result_summary = path.clone();
                }
                if let Some(size) = batch_size {
                    config.bulk.batch_size = *size;
                }
            }
        }
    }

    /// Chunking never talks to the API, so it needs no credentials.
    pub fn needs_api(&self) -> bool {
        !matches!(self.command, Command::Chunk { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_flags_override_config() {
        let cli = Cli::parse_from([
            "profile-dedupe",
            "chunk",
            "winners.csv",
            "--chunk-size",
            "10",
            "--output-prefix",
            "out/winners",
        ]);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);

        assert!(!cli.needs_api());
        assert_eq!(config.chunk.size, 10);
        assert_eq!(config.chunk.output_prefix, "out/winners");
    }

    #[test]
    fn test_live_overrides_configured_dry_run() {
        let cli = Cli::parse_from(["profile-dedupe", "--live", "bulk", "--batch-size", "5"]);
        let mut config = AppConfig::default();
        config.run.dry_run = true;
        cli.apply_to(&mut config);

        assert!(!config.run.dry_run);
        assert_eq!(config.bulk.batch_size, 5);
    }

    #[test]
    fn test_dry_run_and_live_conflict() {
        assert!(Cli::try_parse_from(["profile-dedupe", "--dry-run", "--live", "identity"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["profile-dedupe", "identity", "--dry-run", "--pattern", "x"]);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);

        assert!(config.run.dry_run);
        assert_eq!(config.identity.file_pattern, "x");
    }
}
