//! spforge-assets: typed records stored in ucfb chunk files.
//!
//! Each record type has a schema: an ordered list of child chunks under the
//! record's own chunk, led by a `VER_` chunk. Decoding peeks the version,
//! rewinds and hands the chunk to the decoder for that version, so files
//! written by every earlier release stay readable. Encoding always writes
//! the current version.
//!
//! # Modules
//!
//! - `material` - Material records (`matl`, versions 1.0.0 to 3.0.0)
//! - `texture` - Texture records (`sptx`, versions 1.0.0 and 2.0.0)
//! - `rendertype` - Game rendertype names
//! - `volume` - The "volume resource" envelope some assets are shipped in
//! - `file` - Loading and saving complete asset files

pub mod error;
pub mod file;
pub mod material;
pub mod rendertype;
pub mod texture;
pub mod volume;

pub use error::{Error, Result};
pub use file::{
    decode_material, decode_texture, detect_asset, encode_material, encode_texture,
    load_material, load_texture, read_asset_header, save_material, save_texture, AssetHeader,
    AssetKind, AssetVersion, SaveOptions,
};
pub use material::{Material, MaterialVersion};
pub use rendertype::Rendertype;
pub use texture::{DxgiFormat, Subresource, Texture, TextureInfo, TextureType, TextureVersion};
pub use volume::VolumeResourceType;
