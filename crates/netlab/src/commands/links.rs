//! Cabling handlers: connect, disconnect, list.

use tabled::Tabled;
use tracing::debug;

use netlab_core::{Link, LinkState, Topology};

use crate::cli::{CableArgs, ConnectArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::{Session, util};

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "End A")]
    a: String,
    #[tabled(rename = "End B")]
    b: String,
    #[tabled(rename = "Media")]
    media: String,
    #[tabled(rename = "State")]
    state: String,
}

impl LinkRow {
    fn new(topology: &Topology, painter: Painter, link: &Link) -> Self {
        let media = if link.media_mismatch() {
            painter.bad(&format!("{}/{} (mismatch)", link.media.0, link.media.1))
        } else {
            link.media.0.to_string()
        };
        let state = match link.state {
            LinkState::Up => painter.good("up"),
            LinkState::Down => painter.bad("down"),
        };
        Self {
            a: util::endpoint_label(topology, link.key.first()),
            b: util::endpoint_label(topology, link.key.second()),
            media,
            state,
        }
    }
}

pub fn list(session: &Session<'_>) -> Result<(), CliError> {
    let topology = session.lab.snapshot();
    let links = topology.links();
    let out = output::render_list(
        session.output,
        &links,
        |l| LinkRow::new(&topology, session.painter, l),
        |l| l.key.to_string(),
    )?;
    output::print_output(&out, session.quiet());
    Ok(())
}

pub async fn connect(args: &ConnectArgs, session: &Session<'_>) -> Result<(), CliError> {
    let lab = &session.lab;
    let ends = &args.ends;
    let (a, iface_a) = util::resolve_endpoint(lab, &ends.a)?;
    let (b, iface_b) = util::resolve_endpoint(lab, &ends.b)?;

    if !lab.connect(a, &iface_a, b, &iface_b)? {
        return Err(CliError::Conflict {
            message: format!("{} or {} is already cabled", ends.a, ends.b),
        });
    }

    if args.no_wait {
        output::notice("Cable connected; link negotiating", session.quiet());
    } else {
        debug!(settle = ?lab.config().settle_delay, "waiting for link negotiation");
        lab.settled().await;
        output::notice(
            &format!("Cable connected; {} <-> {} is up", ends.a, ends.b),
            session.quiet(),
        );
    }
    session.save()
}

pub fn disconnect(args: &CableArgs, session: &Session<'_>) -> Result<(), CliError> {
    let lab = &session.lab;
    let (a, iface_a) = util::resolve_endpoint(lab, &args.a)?;
    let (b, iface_b) = util::resolve_endpoint(lab, &args.b)?;

    if !lab.disconnect(a, &iface_a, b, &iface_b)? {
        return Err(CliError::NotFound {
            resource_type: "cable".into(),
            identifier: format!("{} <-> {}", args.a, args.b),
            list_command: "links".into(),
        });
    }
    session.save()?;
    output::notice("Cable removed", session.quiet());
    Ok(())
}
