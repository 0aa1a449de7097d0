//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::HashSet;
use std::path::Path;

/// The file name looked up when a directory is given to [`load_config`].
pub const CONFIG_FILE_NAME: &str = "fmap.toml";

/// Loads and validates a project file.
///
/// `path` may name the file itself or a directory containing `fmap.toml`.
pub fn load_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a project file from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks required fields and value ranges.
///
/// Cross-references (a link naming an unknown FPGA, ...) are left to the
/// engine, which reports them with entity-specific errors on load.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    let w = config.mapping.io_weight;
    if !(0.0..=1.0).contains(&w) {
        return Err(ConfigError::invalid(
            "mapping.io_weight",
            format!("must be within [0, 1], got {w}"),
        ));
    }

    let ids = config
        .clusters
        .iter()
        .map(|c| ("cluster", c.id.as_str()))
        .chain(config.fpgas.iter().map(|f| ("fpga", f.id.as_str())))
        .chain(config.links.iter().map(|l| ("link", l.id.as_str())))
        .chain(config.groups.iter().map(|g| ("group", g.id.as_str())))
        .chain(config.components.iter().map(|c| ("component", c.id.as_str())))
        .chain(config.connections.iter().map(|c| ("connection", c.id.as_str())));
    for (section, id) in ids {
        if id.is_empty() {
            return Err(ConfigError::MissingField(format!("{section}.id")));
        }
    }

    for component in &config.components {
        let mut seen = HashSet::new();
        for core in &component.cores {
            if !seen.insert(core.name.as_str()) {
                return Err(ConfigError::invalid(
                    format!("component.{}.core", component.id),
                    format!("core '{}' declared twice", core.name),
                ));
            }
        }
    }
    Ok(())
}
