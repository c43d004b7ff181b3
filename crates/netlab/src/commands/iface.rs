//! Interface addressing and default gateway handlers.

use serde::Serialize;
use tabled::Tabled;

use netlab_core::{Interface, Topology};

use crate::cli::{GatewayArgs, GatewayCommand, IfaceArgs, IfaceCommand};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Interface")]
    name: String,
    #[tabled(rename = "Media")]
    media: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Cabled To")]
    peer: String,
    #[tabled(rename = "Link")]
    state: String,
}

impl InterfaceRow {
    fn new(topology: &Topology, iface: &Interface) -> Self {
        Self {
            name: iface.name.clone(),
            media: iface.media.to_string(),
            address: iface.ip.map(|ip| ip.to_string()).unwrap_or_default(),
            peer: iface
                .peer
                .as_ref()
                .map(|p| util::endpoint_label(topology, p))
                .unwrap_or_default(),
            state: if iface.is_connected() {
                iface.link_state.to_string()
            } else {
                String::new()
            },
        }
    }
}

/// Gateway as emitted by structured output formats.
#[derive(Serialize)]
struct GatewayView {
    device: String,
    gateway: Option<String>,
}

pub fn handle(args: IfaceArgs, session: &Session<'_>) -> Result<(), CliError> {
    let lab = &session.lab;
    match args.command {
        IfaceCommand::List { device } => {
            let device = util::resolve_device(lab, &device)?;
            let topology = lab.snapshot();
            let out = output::render_list(
                session.output,
                &device.interfaces,
                |i| InterfaceRow::new(&topology, i),
                |i| i.name.clone(),
            )?;
            output::print_output(&out, session.quiet());
            Ok(())
        }

        IfaceCommand::Set {
            device,
            interface,
            address,
            mask,
        } => {
            let device = util::resolve_device(lab, &device)?;
            let ip = lab.set_interface_address(device.id, &interface, &address, &mask)?;
            session.save()?;
            if let Some(ip) = ip {
                output::notice(
                    &format!("{} {interface}: {ip} (network {})", device.name, ip.network()),
                    session.quiet(),
                );
            }
            Ok(())
        }

        IfaceCommand::Clear { device, interface } => {
            let device = util::resolve_device(lab, &device)?;
            lab.set_interface_address(device.id, &interface, "", "")?;
            session.save()?;
            output::notice(
                &format!("{} {interface}: address cleared", device.name),
                session.quiet(),
            );
            Ok(())
        }
    }
}

pub fn handle_gateway(args: GatewayArgs, session: &Session<'_>) -> Result<(), CliError> {
    let lab = &session.lab;
    let (device, view) = match args.command {
        GatewayCommand::Set { device, address } => {
            let device = util::resolve_device(lab, &device)?;
            lab.set_default_gateway(device.id, &address)?;
            (device, Some(address))
        }
        GatewayCommand::Clear { device } => {
            let device = util::resolve_device(lab, &device)?;
            lab.clear_default_gateway(device.id)?;
            (device, None)
        }
    };
    session.save()?;

    let view = GatewayView {
        device: device.name,
        gateway: view,
    };
    let out = output::render_single(
        session.output,
        &view,
        |v| {
            format!(
                "{}: default gateway {}",
                v.device,
                v.gateway.as_deref().unwrap_or("cleared")
            )
        },
        |v| v.gateway.clone().unwrap_or_default(),
    )?;
    output::print_output(&out, session.quiet());
    Ok(())
}
