use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stowage",
    about = "Inspect and edit file-backed stores",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store directory, overriding the config file
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Provider configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the value stored under a key
    Get(KeyArgs),
    /// Store a JSON value under a key
    Put(PutArgs),
    /// Empty a value store
    Clear(KeyArgs),
    /// Delete a value store and its file
    Delete(KeyArgs),
    /// Read and modify list stores
    List(ListArgs),
    /// Run a scripted session on the dino stores and print every event
    Demo(DemoArgs),
    /// List the keys stored under the root directory
    Keys,
}

#[derive(Args)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub key: String,
    /// JSON document
    pub value: String,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(subcommand)]
    pub action: ListAction,
}

#[derive(Subcommand)]
pub enum ListAction {
    /// Print the list (empty if nothing is stored)
    Get { key: String },
    /// Replace the whole list with a JSON array
    Put { key: String, values: String },
    /// Append a JSON value
    Add { key: String, value: String },
    /// Remove the first element equal to a JSON value
    Remove { key: String, value: String },
    /// Remove the element at an index
    RemoveAt { key: String, index: usize },
    /// Replace the first element whose field matches, or append
    Upsert {
        key: String,
        value: String,
        /// Object field used to find the element to replace
        #[arg(long)]
        by: String,
    },
    /// Empty the list
    Clear { key: String },
    /// Delete the list store and its file
    Delete { key: String },
}

#[derive(Args)]
pub struct DemoArgs {
    /// Leave the stores on disk instead of deleting them at the end
    #[arg(long)]
    pub keep: bool,
}
