//! Command-line interface definitions using clap.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use quill_core::VERSION;

/// Quill - encrypted notes with a single-account vault
#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the vault database
    #[arg(short, long, global = true, env = "QUILL_VAULT")]
    pub vault: Option<String>,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the vault and its single account
    Setup(SetupArgs),
    /// Start a session for the vault account
    Login(LoginArgs),
    /// End the current session
    Logout,
    /// Add a new note
    Add(AddArgs),
    /// List notes, most recently updated first
    List(ListArgs),
    /// Show a single note
    Show(ShowArgs),
    /// Edit an existing note
    Edit(EditArgs),
    /// Delete a note
    Rm(RmArgs),
    /// Show vault and session state
    Status,
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `setup` command
#[derive(Args)]
pub struct SetupArgs {
    /// Email address for the vault account
    #[arg(long, env = "QUILL_EMAIL")]
    pub email: Option<String>,

    /// Setup token matching the vault's configured value
    #[arg(long, value_name = "TOKEN")]
    pub setup_token: Option<String>,

    /// Fail instead of prompting for missing values
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `login` command
#[derive(Args)]
pub struct LoginArgs {
    /// Email address of the vault account
    #[arg(long, env = "QUILL_EMAIL")]
    pub email: Option<String>,

    /// Fail instead of prompting for missing values
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Note title
    #[arg(value_name = "TITLE")]
    pub title: String,

    /// Note content (skips editor and stdin)
    #[arg(long)]
    pub content: Option<String>,

    /// Tag for the note (repeatable)
    #[arg(short, long, value_name = "TAG")]
    pub tag: Vec<String>,

    /// Fail instead of opening an editor for content
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Only list notes carrying this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Maximum number of notes to list
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format (table, plain)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Note ID
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Note ID
    #[arg(value_name = "ID")]
    pub id: String,

    /// New note title
    #[arg(long)]
    pub title: Option<String>,

    /// New note content (skips editor and stdin)
    #[arg(long)]
    pub content: Option<String>,

    /// Replacement tag for the note (repeatable)
    #[arg(short, long, value_name = "TAG")]
    pub tag: Vec<String>,

    /// Remove all tags from the note
    #[arg(long, conflicts_with = "tag")]
    pub clear_tags: bool,

    /// Fail instead of opening an editor for content
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `rm` command
#[derive(Args)]
pub struct RmArgs {
    /// Note ID
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}
