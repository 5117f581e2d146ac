//! Version 1.0.0 textures.
//!
//! These predate DXGI formats and texture arrays: a single 2D mip chain in a
//! Direct3D 9 format, followed by a sampler block the current format no
//! longer stores.

use bytemuck::{Pod, Zeroable};
use spforge_ucfb::{Magic, Reader};

use super::format::DxgiFormat;
use super::{expect_version, Subresource, Texture, TextureInfo, TextureVersion, RECORD};
use crate::error::{Error, Result};

const SAMP: Magic = Magic::new(*b"SAMP");
const MIPS: Magic = Magic::new(*b"MIPS");
const MIP_: Magic = Magic::new(*b"MIP_");

/// A Direct3D 9 surface format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct D3dFormat(pub u32);

impl D3dFormat {
    pub const A8R8G8B8: Self = Self(21);
    pub const X8R8G8B8: Self = Self(22);
    pub const A8B8G8R8: Self = Self(32);
    pub const X8B8G8R8: Self = Self(33);
    pub const A16B16G16R16F: Self = Self(113);
    pub const DXT1: Self = Self::fourcc(*b"DXT1");
    pub const DXT2: Self = Self::fourcc(*b"DXT2");
    pub const DXT3: Self = Self::fourcc(*b"DXT3");
    pub const DXT4: Self = Self::fourcc(*b"DXT4");
    pub const DXT5: Self = Self::fourcc(*b"DXT5");
    pub const ATI1: Self = Self::fourcc(*b"ATI1");
    pub const ATI2: Self = Self::fourcc(*b"ATI2");

    const fn fourcc(code: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(code))
    }
}

/// `INFO` chunk of a 1.0.0 texture.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct LegacyTextureInfo {
    reserved: u32,
    width: i32,
    height: i32,
    mip_count: i32,
    format: D3dFormat,
}

/// `SAMP` chunk of a 1.0.0 texture. Only `srgb` affects decoding.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct SamplerInfo {
    address_u: u32,
    address_v: u32,
    address_w: u32,
    mag_filter: u32,
    min_filter: u32,
    mip_filter: u32,
    mip_lod_bias: f32,
    srgb: u32,
}

/// Map a Direct3D 9 format to its DXGI equivalent.
pub fn map_legacy_format(format: D3dFormat, srgb: bool) -> Result<DxgiFormat> {
    let pick = |linear, gamma| if srgb { gamma } else { linear };

    let mapped = match format {
        D3dFormat::A8R8G8B8 => pick(DxgiFormat::B8G8R8A8_UNORM, DxgiFormat::B8G8R8A8_UNORM_SRGB),
        D3dFormat::X8R8G8B8 => pick(DxgiFormat::B8G8R8X8_UNORM, DxgiFormat::B8G8R8X8_UNORM_SRGB),
        D3dFormat::A8B8G8R8 | D3dFormat::X8B8G8R8 => {
            pick(DxgiFormat::R8G8B8A8_UNORM, DxgiFormat::R8G8B8A8_UNORM_SRGB)
        }
        D3dFormat::A16B16G16R16F => DxgiFormat::R16G16B16A16_FLOAT,
        D3dFormat::DXT1 => pick(DxgiFormat::BC1_UNORM, DxgiFormat::BC1_UNORM_SRGB),
        D3dFormat::DXT2 | D3dFormat::DXT3 => pick(DxgiFormat::BC2_UNORM, DxgiFormat::BC2_UNORM_SRGB),
        D3dFormat::DXT4 | D3dFormat::DXT5 => pick(DxgiFormat::BC3_UNORM, DxgiFormat::BC3_UNORM_SRGB),
        D3dFormat::ATI1 => DxgiFormat::BC4_UNORM,
        D3dFormat::ATI2 => DxgiFormat::BC5_UNORM,
        other => return Err(Error::UnsupportedFormat(other.0)),
    };

    Ok(mapped)
}

/// Swap the 8-byte halves of every 16-byte block, turning ATI2 data into BC5.
///
/// A trailing partial block is left untouched.
pub fn swap_ati2_blocks(data: &mut [u8]) {
    for block in data.chunks_exact_mut(16) {
        let (first, second) = block.split_at_mut(8);
        first.swap_with_slice(second);
    }
}

pub(super) fn read_v1(mut sptx: Reader<'_>) -> Result<Texture> {
    let name = sptx.read_child_strict(Magic::NAME)?.read_string()?.into_owned();
    expect_version(&mut sptx, TextureVersion::V1_0_0)?;

    let info: LegacyTextureInfo = sptx.read_child_strict(Magic::INFO)?.read()?;
    if info.reserved != 0 {
        return Err(Error::invalid_record(
            RECORD,
            format!("reserved value in texture {name:?} is non-zero"),
        ));
    }

    let (width, height, mip_count) = match (
        u32::try_from(info.width),
        u32::try_from(info.height),
        u32::try_from(info.mip_count),
    ) {
        (Ok(w), Ok(h), Ok(m)) if w > 0 && h > 0 && m > 0 => (w, h, m),
        _ => {
            return Err(Error::invalid_record(
                RECORD,
                format!(
                    "texture {name:?} has invalid dimensions {}x{} with {} mips",
                    info.width, info.height, info.mip_count
                ),
            ))
        }
    };

    let max_mip_count = u32::BITS - width.max(height).leading_zeros();
    if mip_count > max_mip_count {
        return Err(Error::invalid_record(
            RECORD,
            format!(
                "texture {name:?} claims {mip_count} mips, a {width}x{height} chain has at most {max_mip_count}"
            ),
        ));
    }

    let sampler: SamplerInfo = sptx.read_child_strict(SAMP)?.read()?;
    let format = map_legacy_format(info.format, sampler.srgb != 0)?;
    let fix_block_layout = format == DxgiFormat::BC5_UNORM;

    tracing::debug!(%name, legacy_format = info.format.0, %format, "converting legacy texture");

    let mut mips = sptx.read_child_strict(MIPS)?;
    let mut subresources = Vec::new();

    for level in 0..mip_count {
        let mut mip = mips.read_child_strict(MIP_)?;
        let len = mip.size();
        let mut data = mip.read_bytes_unaligned(len)?.to_vec();

        let mip_width = width.checked_shr(level).unwrap_or(0).max(1);
        let mip_height = height.checked_shr(level).unwrap_or(0).max(1);
        let (row_pitch, slice_pitch) = format.pitch(mip_width, mip_height).ok_or_else(|| {
            Error::invalid_record(RECORD, format!("cannot compute pitch for texture {name:?}"))
        })?;

        if fix_block_layout {
            swap_ati2_blocks(&mut data);
        }

        subresources.push(Subresource {
            row_pitch,
            slice_pitch,
            data,
        });
    }

    Ok(Texture {
        name,
        info: TextureInfo::texture_2d(width, height, mip_count, format),
        subresources,
    })
}
