//! Reachability handlers: ping, trace, routes.

use tabled::Tabled;
use tracing::debug;

use netlab_core::{Hop, PingReport, RouteEntry, RouteVia, TraceReport};

use crate::cli::PathArgs;
use crate::error::CliError;
use crate::output;

use super::{Session, util};

/// With gating on, links saved mid-negotiation must come up before a
/// query means anything.
async fn await_links(session: &Session<'_>) {
    let lab = &session.lab;
    if lab.config().link_state_gates_routing && lab.pending_links() > 0 {
        debug!(pending = lab.pending_links(), "waiting for links before querying");
        lab.settled().await;
    }
}

fn hops_line(hops: Option<&[Hop]>) -> String {
    hops.map_or_else(
        || "-".into(),
        |hops| {
            hops.iter()
                .map(|h| h.name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        },
    )
}

fn failure_code(report: &PingReport) -> String {
    report
        .failure
        .map_or_else(|| "ok".into(), |f| format!("{f:?}"))
}

fn unreachable(args: &PathArgs, report: &PingReport) -> Result<(), CliError> {
    match report.failure {
        Some(failure) => Err(CliError::Unreachable {
            source_device: args.source.clone(),
            target_device: args.target.clone(),
            failure,
        }),
        None => Ok(()),
    }
}

pub async fn ping(args: &PathArgs, session: &Session<'_>) -> Result<(), CliError> {
    let source = util::resolve_device(&session.lab, &args.source)?;
    let target = util::resolve_device(&session.lab, &args.target)?;
    await_links(session).await;

    let report = session.lab.test_connectivity(source.id, target.id);
    let out = output::render_single(
        session.output,
        &report,
        |r| {
            if r.success {
                r.message.clone()
            } else {
                session.painter.bad(&r.message)
            }
        },
        failure_code,
    )?;
    output::print_output(&out, session.quiet());
    unreachable(args, &report)
}

pub async fn trace(args: &PathArgs, session: &Session<'_>) -> Result<(), CliError> {
    let source = util::resolve_device(&session.lab, &args.source)?;
    let target = util::resolve_device(&session.lab, &args.target)?;
    await_links(session).await;

    let trace = session.lab.trace(source.id, target.id);
    let out = output::render_single(
        session.output,
        &trace,
        |t: &TraceReport| {
            let status = if t.report.success {
                session.painter.good("reachable")
            } else {
                session.painter.bad(&failure_code(&t.report))
            };
            [
                format!("Status:   {status}"),
                format!("Route:    {}", hops_line(t.route.as_deref())),
                format!("Physical: {}", hops_line(t.physical.as_deref())),
            ]
            .join("\n")
        },
        |t| {
            t.route
                .iter()
                .flatten()
                .map(|h| h.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, session.quiet());
    unreachable(args, &trace.report)
}

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Via")]
    via: String,
}

impl From<&RouteEntry> for RouteRow {
    fn from(r: &RouteEntry) -> Self {
        Self {
            network: format!("{}/{}", r.network, r.prefix_length),
            via: match &r.via {
                RouteVia::Connected { interface } => format!("connected, {interface}"),
                RouteVia::Gateway { address } => format!("via {address}"),
            },
        }
    }
}

pub async fn routes(device: &str, session: &Session<'_>) -> Result<(), CliError> {
    let device = util::resolve_device(&session.lab, device)?;
    await_links(session).await;

    let table = session.lab.routing_table(device.id).unwrap_or_default();
    let out = output::render_list(
        session.output,
        &table,
        |r| RouteRow::from(r),
        |r| format!("{}/{}", r.network, r.prefix_length),
    )?;
    output::print_output(&out, session.quiet());
    Ok(())
}
