use serde::{Deserialize, Serialize};
use spforge_assets::SaveOptions;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub update: UpdateConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Wrap saved records in the volume resource envelope
    #[serde(default = "default_wrap_volume")]
    pub wrap_volume: bool,

    /// Physical alignment of texel data in saved textures
    #[serde(default = "default_texture_data_alignment")]
    pub texture_data_alignment: u32,
}

fn default_wrap_volume() -> bool {
    true
}

fn default_texture_data_alignment() -> u32 {
    16
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            wrap_volume: default_wrap_volume(),
            texture_data_alignment: default_texture_data_alignment(),
        }
    }
}

impl OutputConfig {
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            wrap_volume: self.wrap_volume,
            texture_data_alignment: u64::from(self.texture_data_alignment),
            resource_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpdateConfig {
    /// File extensions treated as materials (without the dot)
    #[serde(default = "default_material_extensions")]
    pub material_extensions: Vec<String>,

    /// File extensions treated as textures (without the dot)
    #[serde(default = "default_texture_extensions")]
    pub texture_extensions: Vec<String>,

    #[serde(default)]
    pub follow_links: bool,
}

fn default_material_extensions() -> Vec<String> {
    vec!["matl".to_string()]
}

fn default_texture_extensions() -> Vec<String> {
    vec!["sptx".to_string()]
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            material_extensions: default_material_extensions(),
            texture_extensions: default_texture_extensions(),
            follow_links: false,
        }
    }
}

impl UpdateConfig {
    /// Whether `ext` names a material or texture file.
    pub fn matches_extension(&self, ext: &str) -> bool {
        self.material_extensions
            .iter()
            .chain(&self.texture_extensions)
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}
