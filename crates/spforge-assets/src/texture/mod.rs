//! Texture records.
//!
//! Layout of the current (2.0.0) `sptx` chunk:
//!
//! | Chunk | Contents |
//! |-------|----------|
//! | `NAME` | string |
//! | `VER_` | `u32` version |
//! | `INFO` | type, width, height, depth, array size, mip count, DXGI format (7 × `u32`) |
//! | `DATA` | one `SUB_` chunk per subresource |
//!
//! Subresources are ordered mip-major within each array slice
//! (`mip + slice * mip_count`). Each `SUB_` holds the row pitch, slice
//! pitch and byte length as `u32`s, then a `u32` count of padding bytes
//! placing the texels on an alignment boundary, the padding and the texels.

mod format;
mod legacy;

use bytemuck::{Pod, Zeroable};
use spforge_ucfb::{Alignment, ChunkWrite, Magic, Reader, StrictReader};

use crate::error::{Error, Result};

pub use format::DxgiFormat;
pub use legacy::{map_legacy_format, swap_ati2_blocks, D3dFormat};

pub const SPTX: Magic = Magic::new(*b"sptx");
pub(crate) const SUB_: Magic = Magic::new(*b"SUB_");

/// Default physical alignment of texel data.
pub const DEFAULT_DATA_ALIGNMENT: u64 = 16;

const RECORD: &str = "texture";

/// Dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[repr(u32)]
pub enum TextureType {
    Texture1d = 0,
    Texture1dArray = 1,
    Texture2d = 2,
    Texture2dArray = 3,
    Texture3d = 4,
    TextureCube = 5,
    TextureCubeArray = 6,
}

impl TextureType {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Texture1d),
            1 => Some(Self::Texture1dArray),
            2 => Some(Self::Texture2d),
            3 => Some(Self::Texture2dArray),
            4 => Some(Self::Texture3d),
            5 => Some(Self::TextureCube),
            6 => Some(Self::TextureCubeArray),
            _ => None,
        }
    }

    pub fn to_raw(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Texture1d => "1d",
            Self::Texture1dArray => "1d array",
            Self::Texture2d => "2d",
            Self::Texture2dArray => "2d array",
            Self::Texture3d => "3d",
            Self::TextureCube => "cube",
            Self::TextureCubeArray => "cube array",
        }
    }

    fn is_cube(self) -> bool {
        matches!(self, Self::TextureCube | Self::TextureCubeArray)
    }
}

impl std::fmt::Display for TextureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape and format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureInfo {
    #[cfg_attr(feature = "serialize", serde(rename = "type"))]
    pub texture_type: TextureType,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
    pub mip_count: u32,
    pub format: DxgiFormat,
}

/// `INFO` chunk as stored.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct RawTextureInfo {
    texture_type: u32,
    width: u32,
    height: u32,
    depth: u32,
    array_size: u32,
    mip_count: u32,
    format: DxgiFormat,
}

impl TextureInfo {
    /// A single 2D texture.
    pub fn texture_2d(width: u32, height: u32, mip_count: u32, format: DxgiFormat) -> Self {
        Self {
            texture_type: TextureType::Texture2d,
            width,
            height,
            depth: 1,
            array_size: 1,
            mip_count,
            format,
        }
    }

    /// Number of subresources (`array_size * mip_count`).
    pub fn subresource_count(&self) -> Result<usize> {
        self.array_size
            .checked_mul(self.mip_count)
            .map(|count| count as usize)
            .ok_or_else(|| Error::invalid_record(RECORD, "subresource count overflows"))
    }

    /// Check the dimensions agree with the texture type.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| Err(Error::invalid_record(RECORD, reason));

        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return fail("dimensions must be non-zero");
        }
        if self.mip_count == 0 || self.array_size == 0 {
            return fail("mip count and array size must be non-zero");
        }

        match self.texture_type {
            TextureType::Texture1d | TextureType::Texture1dArray
                if self.height != 1 || self.depth != 1 =>
            {
                fail("1d textures must have a height and depth of 1")
            }
            TextureType::Texture2d
            | TextureType::Texture2dArray
            | TextureType::TextureCube
            | TextureType::TextureCubeArray
                if self.depth != 1 =>
            {
                fail("2d and cube textures must have a depth of 1")
            }
            TextureType::Texture3d if self.array_size != 1 => {
                fail("3d textures must have an array size of 1")
            }
            ty if ty.is_cube() && self.array_size % 6 != 0 => {
                fail("cube textures need an array size that is a multiple of 6")
            }
            _ => {
                self.subresource_count()?;
                Ok(())
            }
        }
    }

    fn to_raw(self) -> RawTextureInfo {
        RawTextureInfo {
            texture_type: self.texture_type.to_raw(),
            width: self.width,
            height: self.height,
            depth: self.depth,
            array_size: self.array_size,
            mip_count: self.mip_count,
            format: self.format,
        }
    }

    fn from_raw(raw: RawTextureInfo) -> Result<Self> {
        let texture_type = TextureType::from_raw(raw.texture_type).ok_or_else(|| {
            Error::invalid_record(RECORD, format!("unknown texture type {}", raw.texture_type))
        })?;

        Ok(Self {
            texture_type,
            width: raw.width,
            height: raw.height,
            depth: raw.depth,
            array_size: raw.array_size,
            mip_count: raw.mip_count,
            format: raw.format,
        })
    }
}

/// One mip level of one array slice.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Subresource {
    pub row_pitch: u32,
    pub slice_pitch: u32,
    pub data: Vec<u8>,
}

/// A texture and its texel data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Texture {
    pub name: String,
    pub info: TextureInfo,
    pub subresources: Vec<Subresource>,
}

impl Texture {
    /// Subresource for `mip` of array slice `slice`.
    pub fn subresource(&self, mip: u32, slice: u32) -> Option<&Subresource> {
        if mip >= self.info.mip_count || slice >= self.info.array_size {
            return None;
        }
        self.subresources
            .get(mip as usize + slice as usize * self.info.mip_count as usize)
    }

    /// Total texel bytes across all subresources.
    pub fn data_size(&self) -> usize {
        self.subresources.iter().map(|s| s.data.len()).sum()
    }

    /// Check the record can be written.
    pub fn validate(&self) -> Result<()> {
        self.info.validate()?;

        let expected = self.info.subresource_count()?;
        if self.subresources.len() != expected {
            return Err(Error::invalid_record(
                RECORD,
                format!(
                    "{} subresources given, {} × {} requires {expected}",
                    self.subresources.len(),
                    self.info.array_size,
                    self.info.mip_count
                ),
            ));
        }
        Ok(())
    }
}

/// Texture schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum TextureVersion {
    V1_0_0 = 0,
    V2_0_0 = 1,
}

type Decoder = for<'a> fn(Reader<'a>) -> Result<Texture>;

impl TextureVersion {
    pub const CURRENT: Self = Self::V2_0_0;

    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::V1_0_0),
            1 => Some(Self::V2_0_0),
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
            Self::V2_0_0 => read_v2,
            Self::V1_0_0 => legacy::read_v1,
        }
    }
}

impl std::fmt::Display for TextureVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::V1_0_0 => "1.0.0",
            Self::V2_0_0 => "2.0.0",
        })
    }
}

/// Read the version tag of an `sptx` chunk without consuming anything.
///
/// The tag follows the name, so this searches the children for `VER_`.
pub fn peek_version(sptx: Reader<'_>) -> Result<TextureVersion> {
    let mut sptx = StrictReader::new(sptx, SPTX)?;
    sptx.reset_head();

    let raw = sptx.skip_to_child(Magic::VER_)?.read::<u32>()?;
    TextureVersion::from_raw(raw).ok_or(Error::UnknownVersion {
        record: RECORD,
        version: raw,
    })
}

/// Decode an `sptx` chunk of any known version.
pub fn read_texture(sptx: Reader<'_>) -> Result<Texture> {
    let version = peek_version(sptx)?;
    tracing::debug!(%version, "decoding texture");

    let mut sptx = sptx;
    sptx.reset_head();
    (version.decoder())(sptx)
}

/// Write `texture` as the contents of an open `sptx` chunk.
///
/// Texel data is placed on a multiple of `data_alignment` bytes from the
/// start of the sink.
pub fn write_texture_body<W: ChunkWrite + ?Sized>(
    sptx: &mut W,
    texture: &Texture,
    data_alignment: u64,
) -> Result<()> {
    texture.validate()?;

    sptx.with_child(Magic::NAME, |c| c.write(texture.name.as_str()))?;
    sptx.with_child(Magic::VER_, |c| c.write(&TextureVersion::CURRENT.to_raw()))?;
    sptx.with_child(Magic::INFO, |c| {
        c.write_pod(&texture.info.to_raw(), Alignment::Aligned)
    })?;

    sptx.with_child(Magic::DATA, |data| {
        for subresource in &texture.subresources {
            let len = u32::try_from(subresource.data.len()).map_err(|_| {
                Error::invalid_record(RECORD, "subresource larger than 4 GiB")
            })?;

            data.with_child(SUB_, |sub| {
                sub.write(&(subresource.row_pitch, subresource.slice_pitch, len))?;
                sub.write_at_alignment(data_alignment, &subresource.data)
            })?;
        }
        Ok::<_, Error>(())
    })
}

/// Write `texture` as an `sptx` child of `parent`.
pub fn write_texture<W: ChunkWrite + ?Sized>(
    parent: &mut W,
    texture: &Texture,
    data_alignment: u64,
) -> Result<()> {
    parent.with_child(SPTX, |sptx| write_texture_body(sptx, texture, data_alignment))
}

fn read_v2(mut sptx: Reader<'_>) -> Result<Texture> {
    let name = sptx.read_child_strict(Magic::NAME)?.read_string()?.into_owned();
    expect_version(&mut sptx, TextureVersion::V2_0_0)?;

    let info = TextureInfo::from_raw(sptx.read_child_strict(Magic::INFO)?.read()?)?;
    info.validate()?;
    let count = info.subresource_count()?;

    // Grows per chunk read, so a corrupt count fails on overrun.
    let mut data = sptx.read_child_strict(Magic::DATA)?;
    let mut subresources = Vec::new();
    for _ in 0..count {
        subresources.push(read_subresource(&mut data)?);
    }

    Ok(Texture {
        name,
        info,
        subresources,
    })
}

fn read_subresource(data: &mut Reader<'_>) -> Result<Subresource> {
    let mut sub = data.read_child_strict(SUB_)?;

    let (row_pitch, slice_pitch, len) = sub.read_multi::<(u32, u32, u32)>()?;
    let padding = sub.read::<u32>()?;
    sub.consume_unaligned(padding as usize)?;
    let data = sub.read_bytes_unaligned(len as usize)?.to_vec();

    Ok(Subresource {
        row_pitch,
        slice_pitch,
        data,
    })
}

pub(crate) fn expect_version(sptx: &mut Reader<'_>, expected: TextureVersion) -> Result<()> {
    let raw = sptx.read_child_strict(Magic::VER_)?.read::<u32>()?;
    if raw != expected.to_raw() {
        return Err(Error::invalid_record(
            RECORD,
            format!("expected version {expected}, found {raw}"),
        ));
    }
    Ok(())
}
