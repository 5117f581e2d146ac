//! DXGI pixel formats used by texture records.

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// Numeric `DXGI_FORMAT` value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[repr(transparent)]
pub struct DxgiFormat(pub u32);

impl DxgiFormat {
    pub const UNKNOWN: Self = Self(0);
    pub const R16G16B16A16_FLOAT: Self = Self(10);
    pub const R8G8B8A8_UNORM: Self = Self(28);
    pub const R8G8B8A8_UNORM_SRGB: Self = Self(29);
    pub const BC1_UNORM: Self = Self(71);
    pub const BC1_UNORM_SRGB: Self = Self(72);
    pub const BC2_UNORM: Self = Self(74);
    pub const BC2_UNORM_SRGB: Self = Self(75);
    pub const BC3_UNORM: Self = Self(77);
    pub const BC3_UNORM_SRGB: Self = Self(78);
    pub const BC4_UNORM: Self = Self(80);
    pub const BC5_UNORM: Self = Self(83);
    pub const B8G8R8A8_UNORM: Self = Self(87);
    pub const B8G8R8X8_UNORM: Self = Self(88);
    pub const B8G8R8A8_UNORM_SRGB: Self = Self(91);
    pub const B8G8R8X8_UNORM_SRGB: Self = Self(93);

    /// Name of the formats this crate knows about.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::UNKNOWN => "UNKNOWN",
            Self::R16G16B16A16_FLOAT => "R16G16B16A16_FLOAT",
            Self::R8G8B8A8_UNORM => "R8G8B8A8_UNORM",
            Self::R8G8B8A8_UNORM_SRGB => "R8G8B8A8_UNORM_SRGB",
            Self::BC1_UNORM => "BC1_UNORM",
            Self::BC1_UNORM_SRGB => "BC1_UNORM_SRGB",
            Self::BC2_UNORM => "BC2_UNORM",
            Self::BC2_UNORM_SRGB => "BC2_UNORM_SRGB",
            Self::BC3_UNORM => "BC3_UNORM",
            Self::BC3_UNORM_SRGB => "BC3_UNORM_SRGB",
            Self::BC4_UNORM => "BC4_UNORM",
            Self::BC5_UNORM => "BC5_UNORM",
            Self::B8G8R8A8_UNORM => "B8G8R8A8_UNORM",
            Self::B8G8R8X8_UNORM => "B8G8R8X8_UNORM",
            Self::B8G8R8A8_UNORM_SRGB => "B8G8R8A8_UNORM_SRGB",
            Self::B8G8R8X8_UNORM_SRGB => "B8G8R8X8_UNORM_SRGB",
            _ => return None,
        };
        Some(name)
    }

    fn layout(self) -> Option<Layout> {
        match self {
            Self::R8G8B8A8_UNORM
            | Self::R8G8B8A8_UNORM_SRGB
            | Self::B8G8R8A8_UNORM
            | Self::B8G8R8X8_UNORM
            | Self::B8G8R8A8_UNORM_SRGB
            | Self::B8G8R8X8_UNORM_SRGB => Some(Layout::Pixel(4)),
            Self::R16G16B16A16_FLOAT => Some(Layout::Pixel(8)),
            Self::BC1_UNORM | Self::BC1_UNORM_SRGB | Self::BC4_UNORM => Some(Layout::Block(8)),
            Self::BC2_UNORM
            | Self::BC2_UNORM_SRGB
            | Self::BC3_UNORM
            | Self::BC3_UNORM_SRGB
            | Self::BC5_UNORM => Some(Layout::Block(16)),
            _ => None,
        }
    }

    /// Whether the format is block compressed.
    pub fn is_compressed(self) -> bool {
        matches!(self.layout(), Some(Layout::Block(_)))
    }

    /// Row and slice pitch of a `width` × `height` image in this format.
    ///
    /// Block compressed rows cover four pixel rows. Returns `None` for
    /// formats this crate has no layout for.
    pub fn pitch(self, width: u32, height: u32) -> Option<(u32, u32)> {
        let (row, rows) = match self.layout()? {
            Layout::Pixel(bytes) => (width.max(1).checked_mul(bytes)?, height.max(1)),
            Layout::Block(bytes) => (
                width.max(1).div_ceil(4).checked_mul(bytes)?,
                height.max(1).div_ceil(4),
            ),
        };
        Some((row, row.checked_mul(rows)?))
    }
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    /// Bytes per pixel.
    Pixel(u32),
    /// Bytes per 4x4 block.
    Block(u32),
}

impl fmt::Display for DxgiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "DXGI_FORMAT({})", self.0),
        }
    }
}

impl fmt::Debug for DxgiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DxgiFormat({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncompressed_pitch() {
        assert_eq!(DxgiFormat::B8G8R8A8_UNORM.pitch(16, 8), Some((64, 512)));
        assert_eq!(DxgiFormat::R16G16B16A16_FLOAT.pitch(2, 2), Some((16, 32)));
    }

    #[test]
    fn test_block_pitch() {
        assert_eq!(DxgiFormat::BC1_UNORM.pitch(16, 16), Some((32, 128)));
        assert_eq!(DxgiFormat::BC3_UNORM.pitch(16, 16), Some((64, 256)));
        // Mips smaller than a block still take a whole block.
        assert_eq!(DxgiFormat::BC5_UNORM.pitch(1, 1), Some((16, 16)));
        assert_eq!(DxgiFormat::BC4_UNORM.pitch(0, 0), Some((8, 8)));
    }

    #[test]
    fn test_unknown_format() {
        assert_eq!(DxgiFormat(999).pitch(4, 4), None);
        assert_eq!(DxgiFormat(999).to_string(), "DXGI_FORMAT(999)");
        assert_eq!(DxgiFormat::BC2_UNORM_SRGB.to_string(), "BC2_UNORM_SRGB");
        assert!(DxgiFormat::BC2_UNORM.is_compressed());
        assert!(!DxgiFormat::R8G8B8A8_UNORM.is_compressed());
    }
}
