use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing_subscriber::EnvFilter;

use wayfinder::config::ServiceConfig;
use wayfinder::console::{ConsoleMap, ConsoleVoice};
use wayfinder::directions::RouteComputer;
use wayfinder::geocode::GeocodeResolver;
use wayfinder::net::{HttpDirections, HttpGeocoder};
use wayfinder::session::{self, RouteSession, SessionEvent};
use wayfinder::voice::parse_command;

fn main() {
    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    let _guard = rt.enter();

    let config_path = std::env::var("WAYFINDER_CONFIG").ok().map(PathBuf::from);
    let config = ServiceConfig::load(config_path).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    });

    let geocoder = Arc::new(HttpGeocoder::new(&config).unwrap_or_else(|err| {
        eprintln!("Failed to initialise geocoding client: {err}");
        std::process::exit(1);
    }));
    let directions = Arc::new(HttpDirections::new(&config).unwrap_or_else(|err| {
        eprintln!("Failed to initialise directions client: {err}");
        std::process::exit(1);
    }));

    let (events_tx, events_rx) = session::event_channel();
    let mut session = RouteSession::new(
        GeocodeResolver::new(geocoder),
        RouteComputer::new(directions),
        ConsoleMap::new(),
        Some(ConsoleVoice),
        events_tx.clone(),
        config.request_timeout,
    );

    println!("wayfinder — walking directions console");
    println!(
        "commands: set source <place> | set destination <place> | get path | start route | end route | clear | quit"
    );
    session.announce_ready();

    // The session only holds a weak sender, so once the input task finishes
    // and drops `events_tx` the loop drains and exits.
    rt.block_on(async move {
        tokio::spawn(read_commands(events_tx));
        session::run_session(session, events_rx).await;
    });
}

/// Stand-in for the host bridge: spoken-style command lines from stdin.
async fn read_commands(events: UnboundedSender<SessionEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match trimmed.to_ascii_lowercase().as_str() {
                    "quit" | "exit" => break,
                    "clear" => {
                        if events.send(SessionEvent::ClearRoute).is_err() {
                            break;
                        }
                    }
                    _ => {
                        let command = parse_command(trimmed);
                        if events.send(SessionEvent::Command(command)).is_err() {
                            break;
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "failed to read command input");
                break;
            }
        }
    }
}
