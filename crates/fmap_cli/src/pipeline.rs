//! Shared pipeline helpers for CLI commands.
//!
//! Project file discovery, loading a [`ProjectConfig`] into a
//! [`MappingSession`], and diagnostic rendering.

use std::path::{Path, PathBuf};

use fmap_config::{ComponentDef, ProjectConfig, CONFIG_FILE_NAME};
use fmap_core::{
    Cluster, Component, Connection, Fpga, Group, Link, MappingResult, MappingSession,
    MappingWeights,
};
use fmap_diagnostics::{Diagnostic, DiagnosticRenderer, TerminalRenderer};
use log::debug;

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing
/// `fmap.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project file (or its directory) from global CLI args.
///
/// `--config` wins; otherwise walks up from the current directory.
pub fn resolve_project(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match global.config {
        Some(ref path) => Ok(PathBuf::from(path)),
        None => find_project_root(&std::env::current_dir()?),
    }
}

/// Loads and validates the project file named by the global args.
pub fn load_project(global: &GlobalArgs) -> Result<ProjectConfig, Box<dyn std::error::Error>> {
    let path = resolve_project(global)?;
    debug!("loading project from {}", path.display());
    Ok(fmap_config::load_config(&path)?)
}

fn component_from_def(def: &ComponentDef) -> Component {
    let mut component = Component::new(def.id.as_str(), def.resources.clone())
        .with_architectures(def.architectures.iter().cloned());
    if let Some(name) = &def.name {
        component = component.with_name(name.as_str());
    }
    if let Some(group) = &def.group {
        component = component.in_group(group.as_str());
    }
    for core in &def.cores {
        component = component.with_core(core.name.as_str(), core.interface);
    }
    component
}

/// Registers every entity of `config` with a fresh session.
///
/// Entities are loaded in dependency order: clusters, FPGAs, links, groups,
/// components, then connections. The first rejected entity aborts the load.
pub fn build_session(config: &ProjectConfig) -> MappingResult<MappingSession> {
    let mut session =
        MappingSession::with_weights(MappingWeights::new(config.mapping.io_weight)?);

    for def in &config.clusters {
        let mut cluster = Cluster::new(def.id.as_str());
        if let Some(name) = &def.name {
            cluster = cluster.with_name(name.as_str());
        }
        session.add_cluster(cluster)?;
    }

    for def in &config.fpgas {
        let mut fpga = Fpga::new(def.id.as_str(), def.architecture.as_str(), def.resources.clone())
            .with_overhead(def.overhead.clone());
        if let Some(name) = &def.name {
            fpga = fpga.with_name(name.as_str());
        }
        if let Some(cluster) = &def.cluster {
            fpga = fpga.in_cluster(cluster.as_str());
        }
        for required in &def.required {
            fpga = fpga.with_required(component_from_def(required));
        }
        session.add_fpga(fpga)?;
    }

    for def in &config.links {
        session.add_link(Link::new(
            def.id.as_str(),
            def.source.as_str(),
            def.sink.as_str(),
            def.speed,
            def.bidirectional,
        ))?;
    }

    for def in &config.groups {
        let mut group = Group::new(def.id.as_str());
        if let Some(name) = &def.name {
            group = group.with_name(name.as_str());
        }
        session.add_group(group)?;
    }

    for def in &config.components {
        session.add_component(component_from_def(def))?;
    }

    for def in &config.connections {
        session.add_connection(
            Connection::new(
                def.id.as_str(),
                def.source.as_str(),
                def.sink.as_str(),
                def.density,
            )
            .with_cores(def.source_core.clone(), def.sink_core.clone()),
        )?;
    }

    debug!(
        "loaded {} component(s), {} FPGA(s), {} link(s)",
        session.registry().components().len(),
        session.registry().fpgas().len(),
        session.registry().links().len()
    );
    Ok(session)
}

/// Prints diagnostics to stderr in terminal format.
pub fn render_diagnostics(diagnostics: &[Diagnostic], color: bool) {
    let renderer = TerminalRenderer::new(color);
    for diag in diagnostics {
        eprint!("{}", renderer.render(diag));
    }
}
