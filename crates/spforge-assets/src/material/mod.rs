//! Material records.
//!
//! Layout of the current (3.0.0) `matl` chunk:
//!
//! | Chunk | Contents |
//! |-------|----------|
//! | `VER_` | `u32` version |
//! | `NAME` | string |
//! | `RTYP` | string, the material's own rendertype |
//! | `ORTP` | `u32` [`Rendertype`] being overridden |
//! | `CNST` | 32 × `f32` constant buffer |
//! | `TXSM` | 8 × `i32` texture size mappings, unused |
//! | `TX04`..`TX11` | one string per texture slot |

mod legacy;

use spforge_ucfb::{ChunkWrite, Magic, Reader, StrictReader};

use crate::error::{Error, Result};
use crate::rendertype::Rendertype;

pub const MATL: Magic = Magic::new(*b"matl");
pub const RTYP: Magic = Magic::new(*b"RTYP");
pub const ORTP: Magic = Magic::new(*b"ORTP");
pub const CNST: Magic = Magic::new(*b"CNST");
pub const TXSM: Magic = Magic::new(*b"TXSM");

/// Chunks holding the texture slots, in slot order.
pub const TEXTURE_SLOTS: [Magic; TEXTURE_SLOT_COUNT] = [
    Magic::new(*b"TX04"),
    Magic::new(*b"TX05"),
    Magic::new(*b"TX06"),
    Magic::new(*b"TX07"),
    Magic::new(*b"TX08"),
    Magic::new(*b"TX09"),
    Magic::new(*b"TX10"),
    Magic::new(*b"TX11"),
];

pub const TEXTURE_SLOT_COUNT: usize = 8;
pub const CONSTANT_COUNT: usize = 32;

/// Texture size mappings written to current files. Readers ignore them.
const UNUSED_SIZE_MAPPINGS: [i32; TEXTURE_SLOT_COUNT] = [-1; TEXTURE_SLOT_COUNT];

const RECORD: &str = "material";

/// A material.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub name: String,
    /// The material's own rendertype (e.g. `normal_ext`).
    pub rendertype: String,
    /// Game rendertype the material replaces.
    pub overridden_rendertype: Rendertype,
    #[cfg_attr(feature = "serialize", serde(default = "zeroed_constants"))]
    pub constants: [f32; CONSTANT_COUNT],
    /// Texture names by slot, without trailing empty slots.
    #[cfg_attr(feature = "serialize", serde(default))]
    pub textures: Vec<String>,
}

#[cfg(feature = "serialize")]
fn zeroed_constants() -> [f32; CONSTANT_COUNT] {
    [0.0; CONSTANT_COUNT]
}

impl Material {
    /// Create a material with zeroed constants and no textures.
    pub fn new(
        name: impl Into<String>,
        rendertype: impl Into<String>,
        overridden_rendertype: Rendertype,
    ) -> Self {
        Self {
            name: name.into(),
            rendertype: rendertype.into(),
            overridden_rendertype,
            constants: [0.0; CONSTANT_COUNT],
            textures: Vec::new(),
        }
    }

    /// Check the record can be written.
    pub fn validate(&self) -> Result<()> {
        if self.textures.len() > TEXTURE_SLOT_COUNT {
            return Err(Error::invalid_record(
                RECORD,
                format!(
                    "{} textures given, only {TEXTURE_SLOT_COUNT} slots exist",
                    self.textures.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Material schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum MaterialVersion {
    V1_0_0 = 0,
    V2_0_0 = 1,
    V3_0_0 = 2,
}

/// Decodes one version's layout of a `matl` chunk.
type Decoder = for<'a> fn(Reader<'a>) -> Result<Material>;

impl MaterialVersion {
    pub const CURRENT: Self = Self::V3_0_0;

    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::V1_0_0),
            1 => Some(Self::V2_0_0),
            2 => Some(Self::V3_0_0),
            _ => None,
        }
    }

    pub fn to_raw(self) -> u32 {
        self as u32
    }

    pub fn is_current(self) -> bool {
        self == Self::CURRENT
    }

    fn decoder(self) -> Decoder {
        match self {
            Self::V3_0_0 => read_v3,
            Self::V2_0_0 => legacy::read_v2,
            Self::V1_0_0 => legacy::read_v1,
        }
    }
}

impl std::fmt::Display for MaterialVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::V1_0_0 => "1.0.0",
            Self::V2_0_0 => "2.0.0",
            Self::V3_0_0 => "3.0.0",
        };
        f.write_str(text)
    }
}

/// Read the version tag of a `matl` chunk without consuming anything.
pub fn peek_version(matl: Reader<'_>) -> Result<MaterialVersion> {
    let mut matl = StrictReader::new(matl, MATL)?;
    matl.reset_head();

    let raw = matl.read_child_strict(Magic::VER_)?.read::<u32>()?;
    MaterialVersion::from_raw(raw).ok_or(Error::UnknownVersion {
        record: RECORD,
        version: raw,
    })
}

/// Decode a `matl` chunk of any known version.
pub fn read_material(matl: Reader<'_>) -> Result<Material> {
    let version = peek_version(matl)?;
    tracing::debug!(%version, "decoding material");

    let mut matl = matl;
    matl.reset_head();
    (version.decoder())(matl)
}

/// Write `material` as the contents of an open `matl` chunk.
pub fn write_material_body<W: ChunkWrite + ?Sized>(matl: &mut W, material: &Material) -> Result<()> {
    material.validate()?;

    matl.with_child(Magic::VER_, |c| c.write(&MaterialVersion::CURRENT.to_raw()))?;
    matl.with_child(Magic::NAME, |c| c.write(material.name.as_str()))?;
    matl.with_child(RTYP, |c| c.write(material.rendertype.as_str()))?;
    matl.with_child(ORTP, |c| c.write(&material.overridden_rendertype.to_raw()))?;
    matl.with_child(CNST, |c| c.write(&material.constants))?;
    matl.with_child(TXSM, |c| c.write(&UNUSED_SIZE_MAPPINGS))?;

    for (i, slot) in TEXTURE_SLOTS.into_iter().enumerate() {
        let texture = material.textures.get(i).map_or("", String::as_str);
        matl.with_child(slot, |c| c.write(texture))?;
    }

    Ok(())
}

/// Write `material` as a `matl` child of `parent`.
pub fn write_material<W: ChunkWrite + ?Sized>(parent: &mut W, material: &Material) -> Result<()> {
    parent.with_child(MATL, |matl| write_material_body(matl, material))
}

fn read_v3(mut matl: Reader<'_>) -> Result<Material> {
    expect_version(&mut matl, MaterialVersion::V3_0_0)?;

    let name = read_string_child(&mut matl, Magic::NAME)?;
    let rendertype = read_string_child(&mut matl, RTYP)?;
    let overridden_rendertype = Rendertype::try_from_raw(matl.read_child_strict(ORTP)?.read()?)?;
    let constants = read_constants(&mut matl)?;
    matl.read_child_strict(TXSM)?;
    let textures = read_texture_slots(&mut matl)?;

    Ok(Material {
        name,
        rendertype,
        overridden_rendertype,
        constants,
        textures,
    })
}

pub(crate) fn expect_version(matl: &mut Reader<'_>, expected: MaterialVersion) -> Result<()> {
    let raw = matl.read_child_strict(Magic::VER_)?.read::<u32>()?;
    if raw != expected.to_raw() {
        return Err(Error::invalid_record(
            RECORD,
            format!("expected version {expected}, found {raw}"),
        ));
    }
    Ok(())
}

pub(crate) fn read_string_child(matl: &mut Reader<'_>, magic: Magic) -> Result<String> {
    Ok(matl.read_child_strict(magic)?.read_string()?.into_owned())
}

pub(crate) fn read_constants(matl: &mut Reader<'_>) -> Result<[f32; CONSTANT_COUNT]> {
    Ok(matl.read_child_strict(CNST)?.read()?)
}

pub(crate) fn read_texture_slots(matl: &mut Reader<'_>) -> Result<Vec<String>> {
    let slots = TEXTURE_SLOTS
        .into_iter()
        .map(|slot| read_string_child(matl, slot))
        .collect::<Result<Vec<_>>>()?;

    Ok(trim_texture_slots(slots))
}

/// Drop trailing empty slots. Empty slots before a named one are kept.
pub fn trim_texture_slots(mut slots: Vec<String>) -> Vec<String> {
    while slots.last().is_some_and(|s| s.is_empty()) {
        slots.pop();
    }
    slots
}
