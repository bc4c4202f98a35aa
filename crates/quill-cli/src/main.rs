//! Quill CLI - encrypted notes with a single-account vault
//!
//! This is the command-line interface for Quill. It provides a
//! user-friendly interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod helpers;
mod output;
mod session;

use clap::Parser;
use quill_core::VERSION;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{account, misc, notes};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    match &cli.command {
        Some(Commands::Setup(args)) => account::handle_setup(&ctx, args),
        Some(Commands::Login(args)) => account::handle_login(&ctx, args),
        Some(Commands::Logout) => account::handle_logout(&ctx),
        Some(Commands::Add(args)) => notes::handle_add(&ctx, args),
        Some(Commands::List(args)) => notes::handle_list(&ctx, args),
        Some(Commands::Show(args)) => notes::handle_show(&ctx, args),
        Some(Commands::Edit(args)) => notes::handle_edit(&ctx, args),
        Some(Commands::Rm(args)) => notes::handle_rm(&ctx, args),
        Some(Commands::Status) => account::handle_status(&ctx),
        Some(Commands::Completions(args)) => misc::handle_completions(args.shell),
        None => {
            print_quickstart();
            Ok(())
        }
    }
}

/// Route diagnostics to stderr so stdout stays parseable.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_quickstart() {
    println!("Quill v{}", VERSION);
    println!("\nQuickstart:");
    println!("  export QUILL_SETUP_TOKEN=<pre-shared token>");
    println!("  quill setup --email you@example.com");
    println!("  quill login");
    println!("  quill add \"First note\" --content \"Hello\"");
    println!("\nRun `quill --help` for full usage.");
}
