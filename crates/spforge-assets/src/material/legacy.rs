//! Decoders for material versions 1.0.0 and 2.0.0.
//!
//! Neither version stored a name, and both stored the overridden rendertype
//! by name. 1.0.0 files also lack the `TXSM` chunk.

use spforge_ucfb::Reader;

use super::{
    expect_version, read_constants, read_string_child, read_texture_slots, Material,
    MaterialVersion, ORTP, RTYP, TXSM,
};
use crate::error::Result;
use crate::rendertype::Rendertype;

/// Name given to materials from versions that did not store one.
pub const LEGACY_MATERIAL_NAME: &str = "OldUnnamedMaterial";

pub(super) fn read_v2(mut matl: Reader<'_>) -> Result<Material> {
    expect_version(&mut matl, MaterialVersion::V2_0_0)?;

    let rendertype = read_string_child(&mut matl, RTYP)?;
    let overridden_rendertype = read_string_child(&mut matl, ORTP)?.parse::<Rendertype>()?;
    let constants = read_constants(&mut matl)?;
    matl.read_child_strict(TXSM)?;
    let textures = read_texture_slots(&mut matl)?;

    Ok(unnamed(rendertype, overridden_rendertype, constants, textures))
}

pub(super) fn read_v1(mut matl: Reader<'_>) -> Result<Material> {
    expect_version(&mut matl, MaterialVersion::V1_0_0)?;

    let rendertype = read_string_child(&mut matl, RTYP)?;
    let overridden_rendertype = read_string_child(&mut matl, ORTP)?.parse::<Rendertype>()?;
    let constants = read_constants(&mut matl)?;
    if matl.read_child_strict_optional(TXSM)?.is_some() {
        tracing::debug!("ignoring texture size mappings in 1.0.0 material");
    }
    let textures = read_texture_slots(&mut matl)?;

    Ok(unnamed(rendertype, overridden_rendertype, constants, textures))
}

fn unnamed(
    rendertype: String,
    overridden_rendertype: Rendertype,
    constants: [f32; super::CONSTANT_COUNT],
    textures: Vec<String>,
) -> Material {
    tracing::warn!(name = LEGACY_MATERIAL_NAME, "material predates names, using default");

    Material {
        name: LEGACY_MATERIAL_NAME.to_string(),
        rendertype,
        overridden_rendertype,
        constants,
        textures,
    }
}
