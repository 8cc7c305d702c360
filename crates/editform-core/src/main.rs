use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use editform_core::memory::{InMemoryRecordService, RecordingAlerts, RecordingExit, RecordingGuard};
use editform_core::test_harness::{run_simulator, SimRecord, SimulatorConfig};
use editform_core::{Collaborators, EditSessionController, RecordId, SessionConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("editform-sim")
        .version(editform_core::VERSION)
        .about("Edit session controller simulator")
        .subcommand_required(true)
        .subcommand(
            Command::new("simulate")
                .about("Drive a session through random edits, saves and exits")
                .arg(
                    Arg::new("operations")
                        .long("operations")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("modal")
                        .long("modal")
                        .action(ArgAction::SetTrue)
                        .help("Host the form in an overlay"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(std::path::PathBuf))
                        .help("TOML session configuration"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("title")
                .about("Print the page title for a record")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .default_value("0")
                        .value_parser(value_parser!(u64))
                        .help("Record identifier (0 for a new record)"),
                )
                .arg(
                    Arg::new("description")
                        .long("description")
                        .help("Record-type description"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let mut session = match args.get_one::<std::path::PathBuf>("config") {
                Some(path) => SessionConfig::load(path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SimulatorConfig::default().session,
            };
            if args.get_flag("modal") {
                session = session.modal(true);
            }

            let config = SimulatorConfig {
                seed: *args.get_one::<u64>("seed").context("missing seed")?,
                operations: *args.get_one::<u64>("operations").context("missing operations")?,
                stop_on_first_violation: args.get_flag("stop-on-violation"),
                session,
            };

            let report = run_simulator(config).await;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.generate_text());
            }

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("title", args)) => {
            let id = *args.get_one::<u64>("id").context("missing id")?;
            let mut service = InMemoryRecordService::<SimRecord>::new();
            if let Some(description) = args.get_one::<String>("description") {
                service = service.with_description(description.clone());
            }
            if id != 0 {
                service = service.with_record(id, SimRecord::default());
            }

            let session = EditSessionController::new(
                Arc::new(service),
                SessionConfig::new().with_record_id(RecordId(id)),
                Collaborators::new(
                    Arc::new(RecordingGuard::new()),
                    Arc::new(RecordingAlerts::new()),
                    Arc::new(RecordingExit::new()),
                ),
            );
            session.load(true).await?;
            println!("{}", session.page_title());
        }
        _ => {}
    }

    Ok(())
}
