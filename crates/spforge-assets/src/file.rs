//! Complete asset files.
//!
//! An asset file is a `ucfb` root chunk holding a single record chunk. It
//! comes in two forms:
//!
//! - plain: `ucfb { matl | sptx }`
//! - enveloped: `ucfb { tex_ { .. BODY { matl | sptx } } }`, see
//!   [`volume`](crate::volume)
//!
//! Loading accepts either. Saving writes to a temporary file beside the
//! destination and renames it into place once the root chunk has been
//! closed, so a failed save never leaves a truncated asset behind.

use std::fmt;
use std::io::BufWriter;
use std::path::Path;

use spforge_ucfb::{ChunkWrite, Magic, Reader, Sink, StreamSink, StrictReader, Writer};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::material::{self, Material, MaterialVersion, MATL};
use crate::texture::{self, Texture, TextureVersion, DEFAULT_DATA_ALIGNMENT, SPTX};
use crate::volume::{read_volume_resource, write_volume_resource, VolumeResourceType, TEX_};

/// Record type held by an asset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Material,
    Texture,
    Unknown(Magic),
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Material => f.write_str("material"),
            Self::Texture => f.write_str("texture"),
            Self::Unknown(magic) => write!(f, "unknown ({magic})"),
        }
    }
}

/// Schema version of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetVersion {
    Material(MaterialVersion),
    Texture(TextureVersion),
}

impl AssetVersion {
    pub fn is_current(self) -> bool {
        match self {
            Self::Material(version) => version.is_current(),
            Self::Texture(version) => version.is_current(),
        }
    }
}

impl fmt::Display for AssetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Material(version) => write!(f, "{version}"),
            Self::Texture(version) => write!(f, "{version}"),
        }
    }
}

/// What an asset file holds, read without decoding the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHeader {
    pub kind: AssetKind,
    /// Set when the record is wrapped in a volume resource envelope.
    pub envelope: Option<VolumeResourceType>,
    /// Envelope resource name, without the `_SP_RES_` prefix.
    pub resource_name: Option<String>,
    /// `None` for unknown record kinds.
    pub version: Option<AssetVersion>,
}

/// Options for encoding asset files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// Wrap the record in a volume resource envelope.
    pub wrap_volume: bool,
    /// Physical alignment of texel data, relative to the record chunk.
    pub texture_data_alignment: u64,
    /// Envelope resource name. Defaults to the record's own name.
    pub resource_name: Option<String>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            wrap_volume: true,
            texture_data_alignment: DEFAULT_DATA_ALIGNMENT,
            resource_name: None,
        }
    }
}

struct Record<'a> {
    chunk: Reader<'a>,
    envelope: Option<VolumeResourceType>,
    resource_name: Option<String>,
}

/// Find the record chunk inside an asset file.
fn resolve_record(bytes: &[u8]) -> Result<Record<'_>> {
    let mut root = StrictReader::new(Reader::new(bytes)?, Magic::UCFB)?;
    let first = root.read_child()?;

    if first.magic() != TEX_ {
        return Ok(Record {
            chunk: first,
            envelope: None,
            resource_name: None,
        });
    }

    let resource = read_volume_resource(first)?;
    let chunk = Reader::new(resource.data)?;

    let expected = match chunk.magic() {
        MATL => Some(VolumeResourceType::Material),
        SPTX => Some(VolumeResourceType::Texture),
        _ => None,
    };
    if expected.is_some_and(|expected| expected != resource.resource_type) {
        tracing::warn!(
            name = %resource.name,
            envelope = %resource.resource_type,
            record = %chunk.magic(),
            "volume resource type does not match its record"
        );
    }

    Ok(Record {
        chunk,
        envelope: Some(resource.resource_type),
        resource_name: Some(resource.name),
    })
}

/// Identify the record in an asset file and read its version.
pub fn read_asset_header(bytes: &[u8]) -> Result<AssetHeader> {
    let record = resolve_record(bytes)?;

    let (kind, version) = match record.chunk.magic() {
        MATL => (
            AssetKind::Material,
            Some(AssetVersion::Material(material::peek_version(record.chunk)?)),
        ),
        SPTX => (
            AssetKind::Texture,
            Some(AssetVersion::Texture(texture::peek_version(record.chunk)?)),
        ),
        other => (AssetKind::Unknown(other), None),
    };

    Ok(AssetHeader {
        kind,
        envelope: record.envelope,
        resource_name: record.resource_name,
        version,
    })
}

/// Identify the record in an asset file.
pub fn detect_asset(bytes: &[u8]) -> Result<AssetKind> {
    let record = resolve_record(bytes)?;
    Ok(match record.chunk.magic() {
        MATL => AssetKind::Material,
        SPTX => AssetKind::Texture,
        other => AssetKind::Unknown(other),
    })
}

pub fn decode_material(bytes: &[u8]) -> Result<Material> {
    let record = resolve_record(bytes)?;
    expect_kind(&record, MATL)?;
    material::read_material(record.chunk)
}

pub fn decode_texture(bytes: &[u8]) -> Result<Texture> {
    let record = resolve_record(bytes)?;
    expect_kind(&record, SPTX)?;
    texture::read_texture(record.chunk)
}

fn expect_kind(record: &Record<'_>, magic: Magic) -> Result<()> {
    match record.chunk.magic() {
        found if found == magic => Ok(()),
        MATL | SPTX => Err(spforge_ucfb::Error::MagicMismatch {
            expected: magic,
            found: record.chunk.magic(),
        }
        .into()),
        other => Err(Error::UnknownAsset(other)),
    }
}

#[derive(Clone, Copy)]
enum RecordRef<'r> {
    Material(&'r Material),
    Texture(&'r Texture),
}

impl<'r> RecordRef<'r> {
    fn magic(self) -> Magic {
        match self {
            Self::Material(_) => MATL,
            Self::Texture(_) => SPTX,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Material(_) => "material",
            Self::Texture(_) => "texture",
        }
    }

    fn resource_name(self) -> &'r str {
        match self {
            Self::Material(m) => &m.name,
            Self::Texture(t) => &t.name,
        }
    }

    fn resource_type(self) -> VolumeResourceType {
        match self {
            Self::Material(_) => VolumeResourceType::Material,
            Self::Texture(_) => VolumeResourceType::Texture,
        }
    }

    fn write_body<W: ChunkWrite + ?Sized>(self, chunk: &mut W, options: &SaveOptions) -> Result<()> {
        match self {
            Self::Material(m) => material::write_material_body(chunk, m),
            Self::Texture(t) => texture::write_texture_body(chunk, t, options.texture_data_alignment),
        }
    }
}

fn write_asset<S: Sink>(sink: S, record: RecordRef<'_>, options: &SaveOptions) -> Result<S> {
    let mut root = Writer::new(sink, Magic::UCFB)?;
    let resource_name = options
        .resource_name
        .as_deref()
        .unwrap_or(record.resource_name());

    if options.wrap_volume {
        let mut standalone = Writer::new(Vec::new(), record.magic())?;
        record.write_body(&mut standalone, options)?;
        let body = standalone.finish()?;

        write_volume_resource(&mut root, resource_name, record.resource_type(), &body)?;
    } else {
        root.with_child(record.magic(), |chunk| record.write_body(chunk, options))?;
    }

    tracing::debug!(
        record = record.name(),
        name = resource_name,
        wrapped = options.wrap_volume,
        "encoded asset"
    );
    Ok(root.finish()?)
}

pub fn encode_material(material: &Material, options: &SaveOptions) -> Result<Vec<u8>> {
    write_asset(Vec::new(), RecordRef::Material(material), options)
}

pub fn encode_texture(texture: &Texture, options: &SaveOptions) -> Result<Vec<u8>> {
    write_asset(Vec::new(), RecordRef::Texture(texture), options)
}

fn save(path: &Path, record: RecordRef<'_>, options: &SaveOptions) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let sink = StreamSink::new(BufWriter::new(temp.as_file_mut()))?;
        write_asset(sink, record, options)?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!(path = %path.display(), record = record.name(), "saved asset");
    Ok(())
}

/// Save `material`, replacing any existing file at `path`.
pub fn save_material(path: impl AsRef<Path>, material: &Material, options: &SaveOptions) -> Result<()> {
    let path = path.as_ref();
    save(path, RecordRef::Material(material), options).map_err(|e| e.at_path(path))
}

/// Save `texture`, replacing any existing file at `path`.
pub fn save_texture(path: impl AsRef<Path>, texture: &Texture, options: &SaveOptions) -> Result<()> {
    let path = path.as_ref();
    save(path, RecordRef::Texture(texture), options).map_err(|e| e.at_path(path))
}

pub fn load_material(path: impl AsRef<Path>) -> Result<Material> {
    let path = path.as_ref();
    std::fs::read(path)
        .map_err(Error::from)
        .and_then(|bytes| decode_material(&bytes))
        .map_err(|e| e.at_path(path))
}

pub fn load_texture(path: impl AsRef<Path>) -> Result<Texture> {
    let path = path.as_ref();
    std::fs::read(path)
        .map_err(Error::from)
        .and_then(|bytes| decode_texture(&bytes))
        .map_err(|e| e.at_path(path))
}
