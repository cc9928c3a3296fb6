use clap::Parser;
use flow_anchor::cli::commands::{cmd_apply, cmd_generate, cmd_plan, cmd_preview, cmd_rollback};
use flow_anchor::cli::config::{build_process_config, load_config, Cli, Commands};
use flow_anchor::pipeline::processor::SessionProcessor;
use flow_anchor::trace::logger::RunJournal;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());

    // Resolve processing settings: CLI > config > defaults
    let process_config = build_process_config(&cli, &config);
    let mut processor = SessionProcessor::new(process_config);
    if let Some(path) = &config.journal.path {
        processor = processor.with_journal(RunJournal::open(path));
    }

    let ok = match &cli.command {
        Commands::Plan { session, format } => cmd_plan(&processor, session, *format)?,
        Commands::Preview { session } => cmd_preview(&processor, session)?,
        Commands::Apply { session, no_backup } => {
            cmd_apply(&processor, session, config.backups.enabled && !no_backup)?
        }
        Commands::Generate { session } => cmd_generate(&processor, session)?,
        Commands::Rollback { backups } => cmd_rollback(&processor, backups)?,
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise -v raises the level from warn.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
