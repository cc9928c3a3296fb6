use std::path::{Path, PathBuf};

use clap::Parser;
use flow_anchor::cli::commands::load_session;
use flow_anchor::cli::config::{
    build_process_config, load_config, AppConfig, Cli, Commands, PlanFormat,
};
use flow_anchor::error::EngineError;
use flow_anchor::naming::NamingStrategy;

mod common;
use crate::common::fixtures::{login_interactions, session_with, LOGIN_FILE};

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_plan_minimal() {
    let cli = Cli::parse_from(["flow-anchor", "plan", "--session", "s.json"]);
    match cli.command {
        Commands::Plan { session, format } => {
            assert_eq!(session, PathBuf::from("s.json"));
            assert_eq!(format, PlanFormat::Console);
        }
        _ => panic!("Expected Plan command"),
    }
}

#[test]
fn cli_parse_plan_json() {
    let cli = Cli::parse_from(["flow-anchor", "plan", "--session", "s.json", "--format", "json"]);
    match cli.command {
        Commands::Plan { format, .. } => assert_eq!(format, PlanFormat::Json),
        _ => panic!("Expected Plan command"),
    }
}

#[test]
fn cli_parse_apply_no_backup() {
    let cli = Cli::parse_from(["flow-anchor", "apply", "--session", "s.json", "--no-backup"]);
    match cli.command {
        Commands::Apply { session, no_backup } => {
            assert_eq!(session, PathBuf::from("s.json"));
            assert!(no_backup);
        }
        _ => panic!("Expected Apply command"),
    }

    let cli = Cli::parse_from(["flow-anchor", "apply", "--session", "s.json"]);
    assert!(matches!(cli.command, Commands::Apply { no_backup: false, .. }));
}

#[test]
fn cli_parse_preview_and_generate() {
    let cli = Cli::parse_from(["flow-anchor", "preview", "--session", "a.json"]);
    assert!(matches!(cli.command, Commands::Preview { .. }));

    let cli = Cli::parse_from(["flow-anchor", "generate", "--session", "a.json"]);
    assert!(matches!(cli.command, Commands::Generate { .. }));
}

#[test]
fn cli_parse_rollback_paths() {
    let cli = Cli::parse_from(["flow-anchor", "rollback", "bk/a.tsx", "bk/b.tsx"]);
    match cli.command {
        Commands::Rollback { backups } => {
            assert_eq!(backups, vec![PathBuf::from("bk/a.tsx"), PathBuf::from("bk/b.tsx")]);
        }
        _ => panic!("Expected Rollback command"),
    }
}

#[test]
fn cli_rollback_requires_a_path() {
    assert!(Cli::try_parse_from(["flow-anchor", "rollback"]).is_err());
}

#[test]
fn cli_parse_global_flags() {
    let cli = Cli::parse_from([
        "flow-anchor",
        "-vv",
        "--strategy",
        "hierarchical",
        "--project-root",
        "/work/app",
        "plan",
        "--session",
        "s.json",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.strategy, Some(NamingStrategy::Hierarchical));
    assert_eq!(cli.project_root, Some(PathBuf::from("/work/app")));
}

#[test]
fn cli_rejects_unknown_strategy() {
    assert!(Cli::try_parse_from([
        "flow-anchor",
        "--strategy",
        "random",
        "plan",
        "--session",
        "s.json"
    ])
    .is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_load_missing_file() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    // Should return defaults without error
    assert_eq!(config.naming.strategy, NamingStrategy::ComponentAction);
    assert_eq!(config.paths.test_dir, PathBuf::from("tests/e2e"));
}

#[test]
fn config_default_values() {
    let config = AppConfig::default();
    assert_eq!(config.naming.strategy, NamingStrategy::ComponentAction);
    assert_eq!(config.naming.attribute, "data-testid");
    assert_eq!(config.paths.project_root, PathBuf::from("."));
    assert_eq!(config.paths.source_dir, PathBuf::from("src"));
    assert_eq!(config.paths.test_dir, PathBuf::from("tests/e2e"));
    assert_eq!(config.paths.backup_dir, PathBuf::from(".flow-anchor/backups"));
    assert_eq!(config.paths.base_url, "http://localhost:3000");
    assert!(config.backups.enabled);
    assert!(config.journal.path.is_none());
}

#[test]
fn config_partial_yaml() {
    let yaml = r#"
naming:
  strategy: descriptive
paths:
  base_url: "https://staging.example.com"
backups:
  enabled: false
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.naming.strategy, NamingStrategy::Descriptive);
    // Other naming fields get defaults
    assert_eq!(config.naming.attribute, "data-testid");
    assert_eq!(config.paths.base_url, "https://staging.example.com");
    assert_eq!(config.paths.source_dir, PathBuf::from("src"));
    assert!(!config.backups.enabled);
}

#[test]
fn config_malformed_yaml_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flow-anchor.yaml");
    std::fs::write(&path, "naming: [not, a, map\n").unwrap();
    let config = load_config(path.to_str());
    assert_eq!(config.naming.attribute, "data-testid");
}

#[test]
fn config_yaml_roundtrip() {
    let config = AppConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed.naming.strategy, config.naming.strategy);
    assert_eq!(parsed.paths.backup_dir, config.paths.backup_dir);
}

// ============================================================================
// Builder / Helper Tests
// ============================================================================

#[test]
fn cli_flags_override_config() {
    let mut config = AppConfig::default();
    config.naming.strategy = NamingStrategy::Descriptive;
    config.paths.project_root = PathBuf::from("/from/config");

    let cli = Cli::parse_from(["flow-anchor", "plan", "--session", "s.json"]);
    let resolved = build_process_config(&cli, &config);
    assert_eq!(resolved.strategy, NamingStrategy::Descriptive);
    assert_eq!(resolved.project_root, PathBuf::from("/from/config"));

    let cli = Cli::parse_from([
        "flow-anchor",
        "--strategy",
        "component-action",
        "--project-root",
        "/from/cli",
        "plan",
        "--session",
        "s.json",
    ]);
    let resolved = build_process_config(&cli, &config);
    assert_eq!(resolved.strategy, NamingStrategy::ComponentAction);
    assert_eq!(resolved.project_root, PathBuf::from("/from/cli"));
    assert_eq!(resolved.attribute, "data-testid");
}

#[test]
fn load_session_reads_wire_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let session = session_with("Login flow", login_interactions(LOGIN_FILE));
    std::fs::write(&path, serde_json::to_string_pretty(&session).unwrap()).unwrap();

    let loaded = load_session(&path).unwrap();
    assert_eq!(loaded, session);
}

#[test]
fn load_session_errors() {
    let missing = load_session(Path::new("no/such/session.json")).unwrap_err();
    assert!(matches!(missing, EngineError::ReadFailure { .. }));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ \"id\": 1 }").unwrap();
    let bad = load_session(&path).unwrap_err();
    assert!(matches!(bad, EngineError::Config { .. }));
}
