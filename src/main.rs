#![crate_name = "zmachine"]
#[macro_use]
extern crate log;

use std::env;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use zm::config::Config;
use zm::error::RuntimeError;
use zm::files;
use zm::machine::{self, Machine, Turn};

fn initialize_config() -> Config {
    if let Some(filename) = files::config_file("config.yml") {
        match File::open(&filename) {
            Ok(f) => match Config::try_from(f) {
                Ok(config) => config,
                Err(e) => {
                    info!(target: "app::state", "Error parsing configuration from {:?}: {}", filename, e);
                    Config::default()
                }
            },
            Err(e) => {
                info!(target: "app::state", "Error reading configuration from {:?}: {}", filename, e);
                Config::default()
            }
        }
    } else {
        Config::default()
    }
}

fn initialize_logging(config: &Config, story: &str) {
    if config.logging() {
        if let Some(filename) = files::config_file("log4rs.yml") {
            if log4rs::init_file(filename, Default::default()).is_ok() {
                log_mdc::insert("instruction_count", format!("{:8x}", 0));
            }

            info!(target: "app::instruction", "Start instruction log for '{}'", story);
            info!(target: "app::object", "Start object log for '{}'", story);
            info!(target: "app::state", "Start state log for '{}'", story);
            info!(target: "app::stream", "Start stream log for '{}'", story);
            info!(target: "app::state", "Configuration: {:?}", config);
        }
    }
}

/// Persist the save state after a turn, or remove it when the story quit
fn store_turn(story: &Path, turn: &Turn, config: &Config) -> Result<(), RuntimeError> {
    let path = files::save_path(story, config)?;
    match turn.save() {
        Some(save) => files::write_atomic(&path, save),
        None => files::remove(&path),
    }
}

fn start(story: &Path, config: &Config) -> Result<Turn, RuntimeError> {
    let turn = machine::start(files::read_file(story)?, config)?;
    store_turn(story, &turn, config)?;
    Ok(turn)
}

fn resume(story: &Path, command: &str, config: &Config) -> Result<Turn, RuntimeError> {
    let save = files::read_file(&files::save_path(story, config)?)?;
    let turn = machine::resume(files::read_file(story)?, &save, command, config)?;
    store_turn(story, &turn, config)?;
    Ok(turn)
}

fn play(story: &Path, config: &Config) -> Result<(), RuntimeError> {
    let mut machine = Machine::new(files::read_file(story)?, config)?;
    let mut turn = machine.start()?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", turn.output());
        let _ = io::stdout().flush();
        if turn.halted() {
            return Ok(());
        }

        match lines.next() {
            Some(Ok(line)) => turn = machine.resume(line.trim_end())?,
            Some(Err(e)) => {
                error!(target: "app::stream", "Error reading input: {}", e);
                return Ok(());
            }
            None => return Ok(()),
        }
    }
}

fn usage() -> ExitCode {
    eprintln!("Usage:");
    eprintln!("  zmachine start STORY");
    eprintln!("  zmachine continue STORY COMMAND");
    eprintln!("  zmachine play STORY");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let (command, story) = match (args.get(1), args.get(2)) {
        (Some(c), Some(s)) => (c.as_str(), Path::new(s)),
        _ => return usage(),
    };

    let config = initialize_config();
    initialize_logging(&config, &story.to_string_lossy());

    let result = match (command, args.get(3)) {
        ("start", None) => start(story, &config).map(|t| print!("{}", t.output())),
        ("continue", Some(input)) => {
            resume(story, input, &config).map(|t| print!("{}", t.output()))
        }
        ("play", None) => play(story, &config),
        _ => return usage(),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(target: "app::state", "{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
