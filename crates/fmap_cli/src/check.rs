//! `fmap check`: load and validate a project without placing it.
//!
//! Beyond parsing, this registers every entity (catching dangling references
//! and bad densities or speeds) and warns about components that no FPGA in
//! the platform can host and FPGA pairs with no link path between them.

use fmap_core::{MappingSession, Subsystems};
use log::warn;

use crate::pipeline::{build_session, load_project};
use crate::GlobalArgs;

/// Problems found by [`inspect`] that do not prevent loading.
#[derive(Debug, Default, PartialEq)]
pub struct CheckFindings {
    /// Components whose architecture list matches no FPGA.
    pub homeless_components: Vec<String>,
    /// Number of disconnected FPGA islands.
    pub fpga_islands: usize,
    /// Number of connected component islands.
    pub component_islands: usize,
}

/// Runs the `fmap check` command.
///
/// Returns exit code 0 if the project loads, 1 if some component can be
/// placed on no FPGA at all.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;
    let session = build_session(&config)?;
    let findings = inspect(&session)?;

    for c in &findings.homeless_components {
        eprintln!("error: component '{c}' supports no architecture present in the platform");
    }
    if findings.fpga_islands > 1 {
        warn!(
            "platform splits into {} unlinked FPGA islands",
            findings.fpga_islands
        );
    }

    if !global.quiet {
        let reg = session.registry();
        eprintln!(
            "     Checked {}: {} component(s) in {} island(s), {} FPGA(s) in {} island(s), {} link(s)",
            config.project.name,
            reg.components().len(),
            findings.component_islands,
            reg.fpgas().len(),
            findings.fpga_islands,
            reg.links().len()
        );
    }

    Ok(if findings.homeless_components.is_empty() {
        0
    } else {
        1
    })
}

/// Collects the non-fatal problems of a loaded session.
pub fn inspect(session: &MappingSession) -> Result<CheckFindings, Box<dyn std::error::Error>> {
    let reg = session.registry();
    let homeless_components = reg
        .components()
        .values()
        .filter(|c| {
            !reg
                .fpgas()
                .values()
                .any(|f| c.architectures.allows(&f.architecture))
        })
        .map(|c| c.id.to_string())
        .collect();

    let subsystems = Subsystems::build(reg)?;
    Ok(CheckFindings {
        homeless_components,
        fpga_islands: subsystems.fpga_island_count(),
        component_islands: subsystems.component_island_count(),
    })
}
