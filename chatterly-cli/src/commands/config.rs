use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use shared::config::ClientConfig;

/// Generates a configuration file in the specified format.
///
/// # Arguments
/// * `format` - The format of the configuration file ("yaml" or "json").
/// * `output` - Destination; defaults to `chatterly.<format>` in the current directory.
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(format: &str, output: Option<&Path>) -> Result<()> {
    let config = ClientConfig::with_defaults();
    let (serialized, default_name) = match format {
        "yaml" => (config.to_yaml()?, "chatterly.yaml"),
        "json" => (config.to_json()?, "chatterly.json"),
        _ => bail!("Unsupported format. Use 'yaml' or 'json'."),
    };

    let path = output.map_or_else(|| PathBuf::from(default_name), Path::to_path_buf);
    fs::write(&path, serialized.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!(
        "Configuration file '{}' generated successfully.",
        path.display()
    );
    Ok(())
}
