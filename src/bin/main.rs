use nb_core::config::RankerConfig;
use nb_core::protocol::parse_command;
use nb_core::session::Session;
use nb_core::Result;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    // Logs go to stderr; stdout carries protocol replies only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
}

fn load_config() -> Result<RankerConfig> {
    match std::env::args().nth(1) {
        Some(path) => RankerConfig::from_file(Path::new(&path)),
        None => Ok(RankerConfig::default()),
    }
}

fn main() -> io::Result<()> {
    init_logging();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "could not load config");
            std::process::exit(2);
        }
    };
    info!(model = %config.model_path.display(), "sparse naive Bayes engine starting");

    let mut session = match Session::open(&config) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "could not open saved state");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let input = line?;
        if input.trim().is_empty() {
            continue;
        }
        let outcome = parse_command(&input).and_then(|command| session.handle(command, &mut stdout));
        match outcome {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                error!(command = %input, error = %e, "command failed");
                writeln!(stdout, "ERROR {}", e)?;
            }
        }
        stdout.flush()?;
    }

    info!("shutting down");
    Ok(())
}
