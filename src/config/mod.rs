mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Largest texel data alignment accepted in a config file.
pub const MAX_TEXTURE_DATA_ALIGNMENT: u32 = 4096;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./spforge.toml", "~/.config/spforge/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let alignment = config.output.texture_data_alignment;
    if !alignment.is_power_of_two() || !(4..=MAX_TEXTURE_DATA_ALIGNMENT).contains(&alignment) {
        anyhow::bail!(
            "texture_data_alignment must be a power of two between 4 and {}, got {}",
            MAX_TEXTURE_DATA_ALIGNMENT,
            alignment
        );
    }

    if config.update.material_extensions.is_empty() {
        anyhow::bail!("update.material_extensions cannot be empty");
    }

    if config.update.texture_extensions.is_empty() {
        anyhow::bail!("update.texture_extensions cannot be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.output.wrap_volume);
        assert_eq!(config.output.texture_data_alignment, 16);
        assert_eq!(config.update.material_extensions, vec!["matl"]);
        assert!(!config.update.follow_links);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[output]\nwrap_volume = false\n").unwrap();
        assert!(!config.output.wrap_volume);
        assert_eq!(config.output.texture_data_alignment, 16);
        assert_eq!(config.update, UpdateConfig::default());
    }

    #[test]
    fn test_rejects_bad_alignment() {
        for alignment in [0, 2, 12, 8192] {
            let mut config = Config::default();
            config.output.texture_data_alignment = alignment;
            assert!(validate_config(&config).is_err(), "alignment {alignment}");
        }
    }

    #[test]
    fn test_rejects_empty_extensions() {
        let mut config = Config::default();
        config.update.texture_extensions.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_matches_extension() {
        let update = UpdateConfig::default();
        assert!(update.matches_extension("MATL"));
        assert!(update.matches_extension("sptx"));
        assert!(!update.matches_extension("tga"));
    }

    #[test]
    fn test_save_options() {
        let output = OutputConfig {
            wrap_volume: false,
            texture_data_alignment: 64,
        };
        let options = output.save_options();
        assert!(!options.wrap_volume);
        assert_eq!(options.texture_data_alignment, 64);
    }
}
