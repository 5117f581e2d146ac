//! The volume resource envelope.
//!
//! Some assets are shipped disguised as a one-level L8 volume texture so the
//! game's loader will carry them. The record bytes sit in the level's `BODY`
//! chunk, and the resource type plus a packed copy of the body size sit in
//! the fields the game reads as the texture's format, width and height.
//!
//! ```text
//! tex_
//! ├── NAME  "_SP_RES_<name>"
//! ├── INFO  1, 50 (format count, L8)
//! └── FMT_
//!     ├── INFO  50, type u16, packed size [u16; 2], 1u16, 1795u32
//!     └── FACE
//!         └── LVL_
//!             ├── INFO  0, size
//!             └── BODY  record bytes
//! ```

use std::fmt;

use spforge_ucfb::{ChunkWrite, Magic, Reader};

use crate::error::{Error, Result};

pub const TEX_: Magic = Magic::new(*b"tex_");
const FMT_: Magic = Magic::new(*b"FMT_");
const FACE: Magic = Magic::new(*b"FACE");
const LVL_: Magic = Magic::new(*b"LVL_");

const NAME_PREFIX: &str = "_SP_RES_";
const FORMAT_L8: u32 = 50;
const VOLUME_TEXTURE_ID: u32 = 1795;
const RECORD: &str = "volume resource";

/// Largest body the packed size fields can describe.
pub const MAX_RESOURCE_SIZE: usize = (1 << 30) - 1;

/// What a volume resource carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum VolumeResourceType {
    Shader = 2048,
    Texture = 4096,
    Material = 8192,
}

impl VolumeResourceType {
    pub fn from_raw(value: u16) -> Option<Self> {
        match value {
            2048 => Some(Self::Shader),
            4096 => Some(Self::Texture),
            8192 => Some(Self::Material),
            _ => None,
        }
    }

    pub fn to_raw(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for VolumeResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shader => "shader",
            Self::Texture => "texture",
            Self::Material => "material",
        })
    }
}

/// A decoded envelope. `data` borrows the `BODY` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeResource<'a> {
    pub name: String,
    pub resource_type: VolumeResourceType,
    pub data: &'a [u8],
}

/// Split `size` into its low and high 15 bits.
pub fn pack_size(size: usize) -> Result<[u16; 2]> {
    if size > MAX_RESOURCE_SIZE {
        return Err(Error::ResourceTooLarge {
            size,
            limit: MAX_RESOURCE_SIZE,
        });
    }
    Ok([(size & 0x7fff) as u16, (size >> 15) as u16])
}

pub fn unpack_size(packed: [u16; 2]) -> usize {
    packed[0] as usize | (packed[1] as usize) << 15
}

/// Write `data` wrapped in a `tex_` envelope as a child of `parent`.
pub fn write_volume_resource<W: ChunkWrite + ?Sized>(
    parent: &mut W,
    name: &str,
    resource_type: VolumeResourceType,
    data: &[u8],
) -> Result<()> {
    let packed = pack_size(data.len())?;
    // pack_size bounds the length well below u32::MAX.
    let size = data.len() as u32;

    parent.with_child(TEX_, |tex| {
        tex.with_child(Magic::NAME, |c| c.write(&format!("{NAME_PREFIX}{name}")))?;
        tex.with_child(Magic::INFO, |c| c.write(&(1u32, FORMAT_L8)))?;

        tex.with_child(FMT_, |fmt| {
            fmt.with_child(Magic::INFO, |c| {
                c.write(&FORMAT_L8)?;
                c.write_unaligned(&(resource_type.to_raw(), packed, 1u16, VOLUME_TEXTURE_ID))
            })?;

            fmt.with_child(FACE, |face| {
                face.with_child(LVL_, |lvl| {
                    lvl.with_child(Magic::INFO, |c| c.write(&(0u32, size)))?;
                    lvl.with_child(Magic::BODY, |c| c.write(data))
                })
            })
        })
    })?;

    Ok(())
}

/// Read a `tex_` envelope.
pub fn read_volume_resource<'a>(tex: Reader<'a>) -> Result<VolumeResource<'a>> {
    let mut tex = spforge_ucfb::StrictReader::new(tex, TEX_)?;
    tex.reset_head();

    let full_name = tex.read_child_strict(Magic::NAME)?.read_string()?;
    let name = full_name
        .strip_prefix(NAME_PREFIX)
        .unwrap_or(&full_name[..])
        .to_owned();
    tex.read_child_strict(Magic::INFO)?;

    let mut fmt = tex.read_child_strict(FMT_)?;
    let mut info = fmt.read_child_strict(Magic::INFO)?;
    info.read::<u32>()?;
    let raw_type = info.read_unaligned::<u16>()?;
    let packed = info.read_unaligned::<[u16; 2]>()?;

    let resource_type = VolumeResourceType::from_raw(raw_type).ok_or_else(|| {
        Error::invalid_record(RECORD, format!("unknown resource type {raw_type}"))
    })?;

    let mut lvl = fmt
        .read_child_strict(FACE)?
        .read_child_strict(LVL_)?
        .into_inner();
    let (_, size) = lvl.read_child_strict(Magic::INFO)?.read_multi::<(u32, u32)>()?;
    let size = size as usize;

    if unpack_size(packed) != size {
        return Err(Error::invalid_record(
            RECORD,
            format!(
                "packed size {} disagrees with level size {size}",
                unpack_size(packed)
            ),
        ));
    }

    let data = lvl.read_child_strict(Magic::BODY)?.read_bytes_unaligned(size)?;
    tracing::debug!(%name, %resource_type, size, "read volume resource");

    Ok(VolumeResource {
        name,
        resource_type,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spforge_ucfb::Writer;

    fn envelope(data: &[u8]) -> Vec<u8> {
        let mut writer = Writer::new(Vec::new(), Magic::UCFB).unwrap();
        write_volume_resource(&mut writer, "rock", VolumeResourceType::Material, data).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_pack_size() {
        assert_eq!(pack_size(0).unwrap(), [0, 0]);
        assert_eq!(pack_size(0x7fff).unwrap(), [0x7fff, 0]);
        assert_eq!(pack_size(0x8000).unwrap(), [0, 1]);
        assert_eq!(unpack_size(pack_size(123_456).unwrap()), 123_456);
        assert_eq!(unpack_size(pack_size(MAX_RESOURCE_SIZE).unwrap()), MAX_RESOURCE_SIZE);
        assert!(matches!(
            pack_size(MAX_RESOURCE_SIZE + 1),
            Err(Error::ResourceTooLarge { .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let body: Vec<u8> = (0..=6).collect();
        let bytes = envelope(&body);

        let mut root = Reader::new(&bytes).unwrap();
        let resource = read_volume_resource(root.read_child().unwrap()).unwrap();

        assert_eq!(resource.name, "rock");
        assert_eq!(resource.resource_type, VolumeResourceType::Material);
        assert_eq!(resource.data, &body[..]);
    }

    #[test]
    fn test_layout() {
        let bytes = envelope(&[1, 2, 3, 4]);
        let mut root = Reader::new(&bytes).unwrap();
        let mut tex = root.read_child_strict(TEX_).unwrap();

        assert_eq!(
            tex.read_child_strict(Magic::NAME).unwrap().read_string().unwrap(),
            "_SP_RES_rock"
        );
        assert_eq!(
            tex.read_child_strict(Magic::INFO)
                .unwrap()
                .read_multi::<(u32, u32)>()
                .unwrap(),
            (1, 50)
        );

        let mut fmt = tex.read_child_strict(FMT_).unwrap();
        let info = fmt.read_child_strict(Magic::INFO).unwrap();
        assert_eq!(info.size(), 16);
        assert_eq!(
            info.payload(),
            &[50, 0, 0, 0, 0x00, 0x20, 4, 0, 0, 0, 1, 0, 0x03, 0x07, 0, 0]
        );
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let mut bytes = envelope(&[9; 8]);
        let mut root = Reader::new(&bytes).unwrap();
        let mut tex = root.read_child_strict(TEX_).unwrap();
        let mut fmt = tex.skip_to_child(FMT_).unwrap();
        let info = fmt.read_child_strict(Magic::INFO).unwrap();

        // Packed lower size field follows the format and type marker.
        let at = info.payload().as_ptr() as usize - bytes.as_ptr() as usize + 6;
        bytes[at] = 7;

        let mut root = Reader::new(&bytes).unwrap();
        let err = read_volume_resource(root.read_child().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut writer = Writer::new(Vec::new(), Magic::UCFB).unwrap();
        write_volume_resource(&mut writer, "x", VolumeResourceType::Shader, &[0]).unwrap();
        let mut bytes = writer.finish().unwrap();

        let at = {
            let mut root = Reader::new(&bytes).unwrap();
            let mut fmt = root.read_child().unwrap().skip_to_child(FMT_).unwrap();
            let info = fmt.read_child_strict(Magic::INFO).unwrap();
            info.payload().as_ptr() as usize - bytes.as_ptr() as usize + 4
        };
        bytes[at + 1] = 0x09;

        let mut root = Reader::new(&bytes).unwrap();
        let err = read_volume_resource(root.read_child().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }));
    }
}
