//! CLI argument definitions for appkit.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use appkit_store::{AppId, ComponentId, ComponentRef};
use clap::{Args, Parser, Subcommand};

/// appkit -- manage the components of your apps.
#[derive(Parser)]
#[command(
    name = "appkit",
    version,
    about = "appkit -- manage app components",
    long_about = "Inspect and edit the components (pages, post lists, add-on screens) \
                  stored for each app."
)]
pub struct Cli {
    /// Configuration file to read.
    #[arg(long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and initialize the database.
    Setup,

    /// Show current storage status.
    Status,

    /// Manage the components of an app.
    Components {
        /// The app whose components are managed.
        #[arg(long, short)]
        app: AppId,

        #[command(subcommand)]
        action: ComponentAction,
    },
}

/// Actions on an app's components.
#[derive(Subcommand)]
pub enum ComponentAction {
    /// List all components of the app.
    List,
    /// Show one component.
    Show {
        /// Component slug, or numeric id.
        target: ComponentRef,
    },
    /// Add a new component.
    Add {
        #[arg(long)]
        slug: String,
        /// Component type name.
        #[arg(long = "type")]
        kind: String,
        #[command(flatten)]
        fields: ComponentFields,
    },
    /// Update an existing component in place.
    Update {
        id: ComponentId,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[command(flatten)]
        fields: ComponentFields,
    },
    /// Delete a component by id.
    Delete { id: ComponentId },
    /// Check whether a component exists and print its id.
    Exists {
        /// Component slug, or numeric id.
        target: ComponentRef,
        /// Ignore this component id while matching.
        #[arg(long)]
        except: Option<ComponentId>,
    },
    /// Report components whose type is not known.
    Check {
        /// Known component types. Defaults to `[components] known_types`.
        #[arg(long = "known-type")]
        known_types: Vec<String>,
    },
}

/// Optional fields shared by `add` and `update`.
#[derive(Args)]
pub struct ComponentFields {
    /// Human-readable label.
    #[arg(long)]
    pub label: Option<String>,
    /// Type-specific options as a JSON object.
    #[arg(long)]
    pub options: Option<String>,
}
