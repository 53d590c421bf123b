mod args;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{
    Context,
    Result,
};
use clap::Parser;
use log::info;
use winhotkeys::{
    Hotkey,
    HotkeyManager,
    ManagerConfig,
    Platform,
    SimulatedPlatform,
};

use crate::args::{
    Cli,
    parse_level,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .as_deref()
        .map(parse_level)
        .unwrap_or(log::LevelFilter::Warn);
    env_logger::Builder::new().filter_level(level).init();

    let config = load_config(cli.config.as_deref())?;
    let bindings = cli.bindings();

    if cli.should_simulate() {
        let platform = Arc::new(SimulatedPlatform::new());
        let manager = HotkeyManager::with_shared_platform(Arc::clone(&platform), config)?;
        let hotkeys = bind_all(&manager, &bindings)?;
        for hotkey in &hotkeys {
            platform.press(hotkey.modifiers(), hotkey.keycode());
        }
        wait_and_shutdown(manager, cli.timeout);
        return Ok(());
    }

    #[cfg(target_os = "windows")]
    {
        let manager = HotkeyManager::with_platform(winhotkeys::DefaultPlatform::new(), config)?;
        bind_all(&manager, &bindings)?;
        wait_and_shutdown(manager, cli.timeout);
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ManagerConfig> {
    let Some(path) = path else {
        return Ok(ManagerConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    ManagerConfig::from_json_str(&json)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

fn bind_all<P: Platform>(manager: &HotkeyManager<P>, bindings: &[String]) -> Result<Vec<Hotkey>> {
    manager.start_listening();

    bindings
        .iter()
        .map(|binding| {
            let label = binding.clone();
            let hotkey = manager
                .register(binding, move || println!("{label}"))
                .with_context(|| format!("Failed to bind {binding}"))?;
            println!("{hotkey}");
            Ok(hotkey)
        })
        .collect()
}

fn wait_and_shutdown<P: Platform>(manager: HotkeyManager<P>, timeout: u64) {
    info!("Listening for {} seconds", timeout);
    thread::sleep(Duration::from_secs(timeout));
    println!("Timeout reached");
    manager.shutdown();
}
