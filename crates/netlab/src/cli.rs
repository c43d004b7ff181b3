//! Clap derive structures for the `netlab` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Depends on clap alone so the build script can render man pages from it.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netlab -- cable up a network on the command line and see what can reach what
#[derive(Debug, Parser)]
#[command(
    name = "netlab",
    version,
    about = "Build network topologies and test reachability from the command line",
    long_about = "Model hosts, servers, switches and routers in a project file, cable\n\
        their interfaces together, assign IPv4 addresses, then ping and trace\n\
        between devices to see how packets would be delivered.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Project file to operate on
    #[arg(long, short = 'p', env = "NETLAB_PROJECT", global = true)]
    pub project: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "NETLAB_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add, inspect and remove devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Configure interface addresses
    #[command(alias = "if")]
    Iface(IfaceArgs),

    /// Configure a host or server default gateway
    #[command(alias = "gw")]
    Gateway(GatewayArgs),

    /// Cable two interfaces together
    Connect(ConnectArgs),

    /// Remove the cable between two interfaces
    Disconnect(CableArgs),

    /// List every cable in the project
    Links,

    /// Test reachability between two devices
    Ping(PathArgs),

    /// Show the devices a packet visits between two devices
    Trace(PathArgs),

    /// Show the routing table of a device
    Routes {
        /// Device ID or name
        device: String,
    },

    /// Create, inspect and validate project files
    Project(ProjectArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// End host (alias: pc, laptop)
    #[value(alias = "pc", alias = "laptop")]
    Host,
    /// Server
    Server,
    /// Layer-2 switch
    Switch,
    /// Router
    Router,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List,

    /// Show a device and its interfaces
    Get {
        /// Device ID or name
        device: String,
    },

    /// Add a device with its default interfaces
    Add {
        /// Kind of device
        kind: KindArg,

        /// Display name [default: generated from the kind]
        #[arg(long, short = 'n')]
        name: Option<String>,

        /// Canvas X coordinate
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        x: f64,

        /// Canvas Y coordinate
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        y: f64,
    },

    /// Rename a device
    Rename {
        /// Device ID or name
        device: String,

        /// New display name
        name: String,
    },

    /// Move a device on the canvas
    Move {
        /// Device ID or name
        device: String,

        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Remove a device and every cable attached to it
    #[command(alias = "rm")]
    Remove {
        /// Device ID or name
        device: String,
    },
}

// ── Interfaces ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct IfaceArgs {
    #[command(subcommand)]
    pub command: IfaceCommand,
}

#[derive(Debug, Subcommand)]
pub enum IfaceCommand {
    /// List the interfaces of a device
    #[command(alias = "ls")]
    List {
        /// Device ID or name
        device: String,
    },

    /// Assign an IPv4 address and mask to an interface
    Set {
        /// Device ID or name
        device: String,

        /// Interface name (e.g. FastEthernet0/0)
        interface: String,

        /// Dotted-decimal address
        address: String,

        /// Dotted-decimal subnet mask
        mask: String,
    },

    /// Remove the address from an interface
    Clear {
        /// Device ID or name
        device: String,

        /// Interface name
        interface: String,
    },
}

// ── Gateway ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GatewayArgs {
    #[command(subcommand)]
    pub command: GatewayCommand,
}

#[derive(Debug, Subcommand)]
pub enum GatewayCommand {
    /// Set the default gateway
    Set {
        /// Device ID or name
        device: String,

        /// Dotted-decimal gateway address
        address: String,
    },

    /// Clear the default gateway
    Clear {
        /// Device ID or name
        device: String,
    },
}

// ── Cabling ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CableArgs {
    /// First end, as DEVICE:INTERFACE
    pub a: String,

    /// Second end, as DEVICE:INTERFACE
    pub b: String,
}

#[derive(Debug, Args)]
pub struct ConnectArgs {
    #[command(flatten)]
    pub ends: CableArgs,

    /// Save immediately instead of waiting for the link to come up
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Debug, Args)]
pub struct PathArgs {
    /// Source device ID or name
    pub source: String,

    /// Destination device ID or name
    pub target: String,
}

// ── Project ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create an empty project file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Summarize the project file
    Show,

    /// Check a project file without modifying it
    Validate,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
