//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Clinic records backend: patients, providers and treatment trees over REST
#[derive(Parser, Debug)]
#[command(name = "clinic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config file layered over the global one
    #[arg(long, global = true, env = "CLINIC_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the REST server
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Apply a bulk upload document to the store
    Upload {
        /// JSON document with providers, patients and treatments
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show a patient and their treatments
    Patient { id: String },

    /// Show a provider and the treatments they administer
    Provider { id: String },

    /// Show one treatment with its follow-ups
    Treatment {
        provider_id: String,
        treatment_id: String,
        /// Print as an indented tree instead of JSON
        #[arg(long)]
        tree: bool,
    },

    /// Remove all records
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create global config template
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
