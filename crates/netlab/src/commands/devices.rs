//! Device command handlers.

use tabled::Tabled;

use netlab_core::{Device, DeviceKind, Position};

use crate::cli::{DevicesArgs, DevicesCommand, KindArg};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Addresses")]
    addresses: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Cabled")]
    cabled: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        let cabled = d.interfaces.iter().filter(|i| i.is_connected()).count();
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            kind: d.kind.to_string(),
            addresses: d
                .addresses()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            gateway: d.default_gateway.map(|g| g.to_string()).unwrap_or_default(),
            cabled: format!("{cabled}/{}", d.interfaces.len()),
        }
    }
}

fn detail(session: &Session<'_>, d: &Device) -> String {
    let topology = session.lab.snapshot();
    let mut lines = vec![
        format!("ID:       {}", d.id),
        format!("Name:     {}", d.name),
        format!("Type:     {} ({})", d.kind.label(), d.kind),
        format!("Position: {:.1}, {:.1}", d.position.x, d.position.y),
    ];
    if d.kind.is_endpoint() {
        lines.push(format!(
            "Gateway:  {}",
            util::or_dash(d.default_gateway.map(|g| g.to_string()))
        ));
    }
    lines.push("Interfaces:".into());
    for iface in &d.interfaces {
        let peer = iface.peer.as_ref().map_or_else(
            || session.painter.dim("unplugged"),
            |p| {
                let state = if iface.is_up() {
                    session.painter.good("up")
                } else {
                    session.painter.bad("down")
                };
                format!("{} ({state})", util::endpoint_label(&topology, p))
            },
        );
        lines.push(format!(
            "  {:<18} {:<9} {:<18} {peer}",
            iface.name,
            iface.media.to_string(),
            util::or_dash(iface.ip.map(|ip| ip.to_string())),
        ));
    }
    lines.join("\n")
}

fn kind(arg: KindArg) -> DeviceKind {
    match arg {
        KindArg::Host => DeviceKind::Host,
        KindArg::Server => DeviceKind::Server,
        KindArg::Switch => DeviceKind::Switch,
        KindArg::Router => DeviceKind::Router,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: DevicesArgs, session: &Session<'_>) -> Result<(), CliError> {
    let lab = &session.lab;
    match args.command {
        DevicesCommand::List => {
            let devices = lab.devices();
            let out = output::render_list(
                session.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, session.quiet());
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let device = util::resolve_device(lab, &device)?;
            let out = output::render_single(
                session.output,
                &device,
                |d| detail(session, d),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, session.quiet());
            Ok(())
        }

        DevicesCommand::Add { kind: k, name, x, y } => {
            let device = lab.add_device(kind(k), name, Position::new(x, y))?;
            session.save()?;
            output::notice(
                &format!("Added {} {} (id {})", device.kind, device.name, device.id),
                session.quiet(),
            );
            let out = output::render_single(
                session.output,
                &device,
                |d| d.id.to_string(),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, session.quiet());
            Ok(())
        }

        DevicesCommand::Rename { device, name } => {
            let device = util::resolve_device(lab, &device)?;
            lab.rename_device(device.id, name.clone())?;
            session.save()?;
            output::notice(&format!("Renamed {} to {name}", device.name), session.quiet());
            Ok(())
        }

        DevicesCommand::Move { device, x, y } => {
            let device = util::resolve_device(lab, &device)?;
            lab.move_device(device.id, Position::new(x, y))?;
            session.save()?;
            Ok(())
        }

        DevicesCommand::Remove { device } => {
            let device = util::resolve_device(lab, &device)?;
            let cables = device.interfaces.iter().filter(|i| i.is_connected()).count();
            let prompt = format!(
                "Remove {} and its {cables} cable(s)? This cannot be undone.",
                device.name
            );
            if !util::confirm(&prompt, "devices remove", session.global.yes)? {
                return Ok(());
            }
            lab.remove_device(device.id)?;
            session.save()?;
            output::notice(&format!("Removed {}", device.name), session.quiet());
            Ok(())
        }
    }
}
