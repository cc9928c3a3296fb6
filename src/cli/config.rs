use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::naming::NamingStrategy;
use crate::pipeline::processor::ProcessConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "flow-anchor",
    version,
    about = "Turn recorded UI interactions into test identifiers and Playwright tests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: flow-anchor.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Identifier naming strategy
    #[arg(long, value_enum, global = true)]
    pub strategy: Option<NamingStrategy>,

    /// Project root that anchors and output paths are relative to
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the identifier insertions a session would make
    Plan {
        /// Recorded session (JSON)
        #[arg(long)]
        session: PathBuf,

        /// Output format: console, json
        #[arg(long, value_enum, default_value_t = PlanFormat::Console)]
        format: PlanFormat,
    },

    /// Print source diffs and the test files that would be generated
    Preview {
        /// Recorded session (JSON)
        #[arg(long)]
        session: PathBuf,
    },

    /// Write identifiers into source and generate test scripts
    Apply {
        /// Recorded session (JSON)
        #[arg(long)]
        session: PathBuf,

        /// Overwrite sources without keeping backups
        #[arg(long)]
        no_backup: bool,
    },

    /// Only generate test scripts, leaving sources untouched
    Generate {
        /// Recorded session (JSON)
        #[arg(long)]
        session: PathBuf,
    },

    /// Restore files from backups written by `apply`
    Rollback {
        /// Backup file paths
        #[arg(required = true)]
        backups: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    Console,
    Json,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `flow-anchor.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub backups: BackupsConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default)]
    pub strategy: NamingStrategy,

    #[serde(default = "default_attribute")]
    pub attribute: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            strategy: NamingStrategy::default(),
            attribute: default_attribute(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    #[serde(default = "default_test_dir")]
    pub test_dir: PathBuf,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            source_dir: default_source_dir(),
            test_dir: default_test_dir(),
            backup_dir: default_backup_dir(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for BackupsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JournalConfig {
    /// JSONL run journal; disabled when unset
    pub path: Option<PathBuf>,
}

// Serde default helpers
fn default_attribute() -> String { "data-testid".to_string() }
fn default_project_root() -> PathBuf { PathBuf::from(".") }
fn default_source_dir() -> PathBuf { PathBuf::from("src") }
fn default_test_dir() -> PathBuf { PathBuf::from("tests/e2e") }
fn default_backup_dir() -> PathBuf { PathBuf::from(".flow-anchor/backups") }
fn default_base_url() -> String { "http://localhost:3000".to_string() }
fn default_true() -> bool { true }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("flow-anchor.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Resolve processing settings: CLI > config file > defaults.
pub fn build_process_config(cli: &Cli, config: &AppConfig) -> ProcessConfig {
    ProcessConfig {
        strategy: cli.strategy.unwrap_or(config.naming.strategy),
        attribute: config.naming.attribute.clone(),
        project_root: cli
            .project_root
            .clone()
            .unwrap_or_else(|| config.paths.project_root.clone()),
        source_dir: config.paths.source_dir.clone(),
        test_dir: config.paths.test_dir.clone(),
        backup_dir: config.paths.backup_dir.clone(),
        base_url: config.paths.base_url.clone(),
    }
}
