#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

mod adfs;
mod aws;
mod cli;
mod client;
mod config;
mod error;
mod login;
mod resolve;
mod roles;
mod saml;
mod ui;

use std::process;

use clap::Parser;
use crossterm::style::Stylize;
use log::LevelFilter;

use cli::{Cli, Commands};

fn setup_logger(verbosity: u8) -> Result<(), fern::InitError> {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for("awsaml", level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logger(cli.verbose) {
        eprintln!("Could not set up logging: {}", e);
    }

    let config_file = cli.config.as_deref();
    let res = match cli.command {
        Commands::Configure => config::interactive_create(config_file, cli.skip_password_manager),
        Commands::Login(ref args) => login::command(args, config_file, cli.skip_password_manager),
        Commands::Roles(ref args) => roles::command(args, config_file, cli.skip_password_manager),
    };

    if let Err(e) = res {
        debug!("main.error kind={:?}", e.kind);
        println!("\n{}", e.to_string().red());

        if let Some(roles) = e.available_roles() {
            ui::print_available_roles(roles);
        }

        process::exit(1);
    }
}
