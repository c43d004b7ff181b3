//! Command dispatch: bridges CLI args -> the core `Lab` -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod iface;
pub mod links;
pub mod ping;
pub mod project;
pub mod util;

use std::path::PathBuf;

use tracing::debug;

use netlab_core::Lab;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output::Painter;

/// Everything a project-bound handler needs: the opened lab, where to save
/// it, and the resolved output settings.
pub struct Session<'a> {
    pub global: &'a GlobalOpts,
    pub output: OutputFormat,
    pub painter: Painter,
    pub lab: Lab,
    pub project: PathBuf,
}

impl<'a> Session<'a> {
    pub fn open(global: &'a GlobalOpts, cfg: &Config) -> Result<Self, CliError> {
        let project = config::resolve_project(global, cfg)?;
        if !project.exists() {
            return Err(CliError::ProjectMissing {
                path: project.display().to_string(),
            });
        }
        let lab = Lab::open(config::lab_config(cfg)?, &project)?;
        Ok(Self {
            global,
            output: config::resolve_output(global, cfg),
            painter: Painter::new(config::resolve_color(global, cfg)),
            lab,
            project,
        })
    }

    pub fn save(&self) -> Result<(), CliError> {
        self.lab.save(&self.project)?;
        debug!(path = %self.project.display(), "project saved");
        Ok(())
    }

    pub fn quiet(&self) -> bool {
        self.global.quiet
    }
}

/// Dispatch a project-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(args, session),
        Command::Iface(args) => iface::handle(args, session),
        Command::Gateway(args) => iface::handle_gateway(args, session),
        Command::Connect(args) => links::connect(&args, session).await,
        Command::Disconnect(args) => links::disconnect(&args, session),
        Command::Links => links::list(session),
        Command::Ping(args) => ping::ping(&args, session).await,
        Command::Trace(args) => ping::trace(&args, session).await,
        Command::Routes { device } => ping::routes(&device, session).await,
        Command::Project(_) | Command::Config(_) | Command::Completions(_) => Err(
            CliError::Internal("command must be handled before opening a project".into()),
        ),
    }
}
