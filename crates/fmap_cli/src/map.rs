//! `fmap map`: load a project, place it, and report the result.
//!
//! 1. Find and load `fmap.toml`
//! 2. Register every entity with a [`MappingSession`]
//! 3. Run the placement pipeline
//! 4. Render diagnostics and the placement report

use std::fmt::Write as _;

use fmap_core::{MappingReport, MappingWeights};
use fmap_diagnostics::Severity;
use log::info;

use crate::pipeline::{build_session, load_project, render_diagnostics};
use crate::{GlobalArgs, MapArgs, ReportFormat};

/// Runs the `fmap map` command.
///
/// Returns exit code 0 if the placement succeeded, 1 if it was aborted or
/// left groups unmapped while a full mapping is required.
pub fn run(args: &MapArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;

    if !global.quiet {
        eprintln!("     Mapping {}", config.project.name);
    }

    let mut session = build_session(&config)?;
    if let Some(w) = args.io_weight {
        session.set_weights(MappingWeights::new(w)?);
    }
    info!(
        "placing with I/O weight {:.2}",
        session.weights().io_weight()
    );

    let placed = session.do_mapping();
    let report = session.report()?;
    let diagnostics = session.diagnostics().diagnostics();
    let require_full = config.mapping.require_full_mapping && !args.allow_partial;
    let complete = session.verify_full_mapping();

    match args.format {
        ReportFormat::Text => {
            render_diagnostics(&diagnostics, global.color);
            print!("{}", render_report(&report));
        }
        ReportFormat::Json => {
            let json = serde_json::json!({
                "project": config.project.name,
                "success": placed,
                "report": report,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    let warnings = session.diagnostics().count(Severity::Warning);
    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "      Result: {} of {} group(s) placed, {} warning(s)",
            report.groups.len() - report.unmapped_groups.len(),
            report.groups.len(),
            warnings
        );
    }

    if !placed {
        return Ok(1);
    }
    if require_full {
        if let Err(e) = complete {
            eprintln!("error: {e}");
            return Ok(1);
        }
    }
    Ok(0)
}

/// Formats a placement report as aligned text tables.
pub fn render_report(report: &MappingReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Groups:");
    for g in &report.groups {
        let target = g
            .fpga
            .as_ref()
            .map_or_else(|| "(unmapped)".to_string(), |f| f.to_string());
        let members: Vec<&str> = g.members.iter().map(|m| m.as_str()).collect();
        let _ = writeln!(out, "  {:<20} -> {:<12} [{}]", g.group, target, members.join(", "));
    }

    let _ = writeln!(out, "FPGAs:");
    for f in &report.fpgas {
        let _ = writeln!(
            out,
            "  {:<20} {:<10} {:>6.1}% used",
            f.fpga,
            f.architecture,
            f.utilization * 100.0
        );
        for (name, total) in f.total.iter() {
            let _ = writeln!(out, "      {name:<10} {:>8} / {total}", f.used.get(name));
        }
    }

    if !report.links.is_empty() {
        let _ = writeln!(out, "Links:");
        for l in &report.links {
            let _ = writeln!(
                out,
                "  {:<20} {} -> {}  {} connection(s), load {:.2}",
                l.link,
                l.source,
                l.sink,
                l.connections.len(),
                l.load
            );
        }
    }

    for c in &report.unrouted_connections {
        let _ = writeln!(out, "unrouted: {c}");
    }
    let _ = writeln!(
        out,
        "Average utilization: {:.1}%",
        report.average_utilization * 100.0
    );
    out
}
