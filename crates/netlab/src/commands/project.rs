//! Project file handlers. These work on the file directly rather than an
//! opened session, so they can create or diagnose a broken project.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use netlab_core::{DeviceKind, Lab, LinkState, ProjectFile, Topology};

use crate::cli::{GlobalOpts, ProjectArgs, ProjectCommand};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ProjectSummary {
    path: String,
    version: u32,
    saved_at: Option<DateTime<Utc>>,
    hosts: usize,
    servers: usize,
    switches: usize,
    routers: usize,
    cables: usize,
    cables_up: usize,
}

fn summarize(path: String, file: &ProjectFile, topology: &Topology) -> ProjectSummary {
    let count = |kind: DeviceKind| topology.devices().filter(|d| d.kind == kind).count();
    let links = topology.links();
    ProjectSummary {
        path,
        version: file.version,
        saved_at: file.saved_at,
        hosts: count(DeviceKind::Host),
        servers: count(DeviceKind::Server),
        switches: count(DeviceKind::Switch),
        routers: count(DeviceKind::Router),
        cables: links.len(),
        cables_up: links.iter().filter(|l| l.state == LinkState::Up).count(),
    }
}

fn detail(s: &ProjectSummary) -> String {
    let saved = s.saved_at.map_or_else(
        || "-".into(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    [
        format!("Project:  {}", s.path),
        format!("Format:   v{}", s.version),
        format!("Saved:    {saved}"),
        format!(
            "Devices:  {} host(s), {} server(s), {} switch(es), {} router(s)",
            s.hosts, s.servers, s.switches, s.routers
        ),
        format!("Cables:   {} ({} up)", s.cables, s.cables_up),
    ]
    .join("\n")
}

pub fn handle(args: ProjectArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let path = config::resolve_project(global, cfg)?;
    let display = path.display().to_string();

    match args.command {
        ProjectCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::FileExists { path: display });
            }
            Lab::new(config::lab_config(cfg)?).save(&path)?;
            output::notice(&format!("Created {display}"), global.quiet);
            Ok(())
        }

        ProjectCommand::Show | ProjectCommand::Validate => {
            if !path.exists() {
                return Err(CliError::ProjectMissing { path: display });
            }
            let file = ProjectFile::load(&path)?;
            let topology = file.clone().into_topology()?;
            let summary = summarize(display, &file, &topology);

            if matches!(args.command, ProjectCommand::Validate) {
                output::notice(
                    &format!(
                        "{} is valid: {} device(s), {} cable(s)",
                        summary.path,
                        topology.len(),
                        summary.cables
                    ),
                    global.quiet,
                );
                return Ok(());
            }

            let out = output::render_single(
                config::resolve_output(global, cfg),
                &summary,
                detail,
                |s| s.path.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
