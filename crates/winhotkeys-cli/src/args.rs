use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_BINDINGS: [&str; 3] = ["ctrl+shift+z", "ctrl+shift+y", "ctrl+shift+alt+win+r"];

#[derive(Parser, Debug)]
#[command(name = "winhotkeys")]
#[command(about = "Bind global hotkeys and print a line whenever one fires")]
#[command(version)]
pub struct Cli {
    #[arg(
        short = 'b',
        long = "bind",
        help = "Hotkey to bind, e.g. ctrl+shift+z (repeatable)",
        value_name = "KEYS"
    )]
    pub bindings: Vec<String>,

    #[arg(
        short = 't',
        long,
        default_value_t = 7,
        help = "Seconds to listen before exiting",
        value_name = "SECS"
    )]
    pub timeout: u64,

    #[arg(
        short = 'c',
        long,
        help = "Path to a JSON manager configuration",
        value_name = "PATH"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Set the global log level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[arg(
        long,
        help = "Use the in-process simulated platform and synthesize one press per binding"
    )]
    pub simulate: bool,
}

impl Cli {
    pub fn bindings(&self) -> Vec<String> {
        if self.bindings.is_empty() {
            DEFAULT_BINDINGS.iter().map(|b| b.to_string()).collect()
        } else {
            self.bindings.clone()
        }
    }

    pub fn should_simulate(&self) -> bool {
        self.simulate || cfg!(not(target_os = "windows"))
    }
}

pub fn parse_level(level: &str) -> log::LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}
