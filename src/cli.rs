// Command-line interface
//
// Runtime flags for the TUI plus a `config` subcommand for managing the
// TOML file without opening it by hand:
// - config --show: print the effective (merged) configuration
// - config --reset: rewrite the file with defaults
// - config --edit: open the file in $EDITOR
// - config --update: rewrite the file with the current structure, keeping user values
// - config --path: print where the file lives

use crate::config::{Config, VERSION};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// sleepscope - track and browse sleep quality from the terminal
#[derive(Parser)]
#[command(name = "sleepscope")]
#[command(version = VERSION)]
#[command(about = "Terminal sleep quality tracker", long_about = None)]
pub struct Cli {
    /// Override the database path for this run
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Demo mode: seed and mutate synthetic nights
    #[arg(long)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Refresh config file structure, keeping user values
        #[arg(long)]
        update: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Handle CLI subcommands. Returns true if a command was handled (exit after).
pub fn handle_cli(cli: &Cli) -> bool {
    let Some(Commands::Config {
        show,
        reset,
        edit,
        update,
        path,
    }) = &cli.command
    else {
        return false; // No subcommand: run the TUI
    };

    match (*path, *show, *reset, *edit, *update) {
        (true, ..) => config_path(),
        (_, true, ..) => config_show(),
        (_, _, true, ..) => config_reset(),
        (_, _, _, true, _) => config_edit(),
        (_, _, _, _, true) => config_update(),
        _ => {
            // Bare `config`: list what the flags do
            println!("Usage: sleepscope config [--show|--reset|--edit|--update|--path]");
            println!();
            println!("Options:");
            println!("  --show    Show effective configuration");
            println!("  --reset   Reset config file to defaults");
            println!("  --edit    Open config file in $EDITOR");
            println!("  --update  Refresh config file structure, keeping user values");
            println!("  --path    Show config file path");
        }
    }
    true
}

/// Bail out when the platform gives us nowhere to put a config file
fn require_config_path() -> PathBuf {
    match Config::config_path() {
        Some(path) => path,
        None => {
            eprintln!("Error: no home directory, so no config file location");
            std::process::exit(1);
        }
    }
}

fn config_path() {
    println!("{}", require_config_path().display());
}

fn config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());
    println!();

    let path = require_config_path();
    if path.exists() {
        println!("# Source: {}", path.display());
    } else {
        println!("# Source: built-in defaults (no config file yet)");
    }
}

fn config_reset() {
    let path = require_config_path();

    if path.exists() {
        eprint!("Overwrite existing config at {}? [y/N] ", path.display());
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err()
            || !answer.trim().eq_ignore_ascii_case("y")
        {
            println!("Left existing config untouched.");
            return;
        }
    }

    // Config::default().to_toml() is the single source of the file format
    if let Err(e) = Config::default().save() {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}

fn config_edit() {
    let path = require_config_path();

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
    }

    // $EDITOR, then $VISUAL, then something that exists everywhere
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Editing {} ({})", path.display(), editor);

    match Command::new(&editor).arg(&path).status() {
        Ok(s) if s.success() => {}
        Ok(s) => {
            eprintln!("{} exited with {}", editor, s);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Could not launch '{}': {}", editor, e);
            eprintln!("Point $EDITOR at an editor you have installed");
            std::process::exit(1);
        }
    }
}

/// Rewrite the config file in the current format, carrying user values
/// over. Options added since the file was written get their defaults;
/// options the user already set keep their values (from_env merges the
/// file over the defaults before we serialize it back out).
fn config_update() {
    let path = require_config_path();

    if !path.exists() {
        // Nothing to merge; a fresh template is the updated structure
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
        return;
    }

    // Keep the old file around in case the merge loses something
    let backup_path = path.with_extension("toml.bak");
    match std::fs::copy(&path, &backup_path) {
        Ok(_) => println!("Backup written: {}", backup_path.display()),
        Err(e) => eprintln!("Warning: backup failed, continuing anyway: {}", e),
    }

    let merged = Config::from_env();
    if let Err(e) = merged.save() {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config updated in place: {}", path.display());
    println!("Your values were preserved.");
}
