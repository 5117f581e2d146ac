//! Batch migration of asset files.
//!
//! Walks a directory, decodes every material and texture file and re-saves
//! the ones stored with an older schema version. Files keep their form: an
//! enveloped file stays enveloped, a plain one stays plain.

use anyhow::{Context, Result};
use spforge_assets::{
    decode_material, decode_texture, read_asset_header, save_material, save_texture, AssetHeader,
    AssetKind,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    /// Already at the current version.
    Current,
    /// Re-saved at the current version (or would be, on a dry run).
    Updated { from: String },
    /// Not a material or texture.
    Skipped,
}

/// Counts from a batch update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub files_found: usize,
    pub files_updated: usize,
    pub files_current: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    /// Paths that were (or would be) rewritten.
    pub updated: Vec<PathBuf>,
}

/// Update every asset under `dir`.
///
/// Failures on individual files are logged and counted; the walk continues.
pub fn update_directory(dir: &Path, config: &Config, dry_run: bool) -> Result<UpdateSummary> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {:?}", dir);
    }

    info!("Updating assets in {:?}", dir);
    let mut summary = UpdateSummary::default();

    for entry in WalkDir::new(dir)
        .follow_links(config.update.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }

        let is_asset = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| config.update.matches_extension(ext));
        if !is_asset {
            continue;
        }

        summary.files_found += 1;

        match update_file(path, config, dry_run) {
            Ok(UpdateAction::Current) => summary.files_current += 1,
            Ok(UpdateAction::Updated { from }) => {
                let verb = if dry_run { "Would update" } else { "Updated" };
                info!("{} {:?} from version {}", verb, path, from);
                summary.files_updated += 1;
                summary.updated.push(path.to_path_buf());
            }
            Ok(UpdateAction::Skipped) => {
                warn!("Skipping {:?}: not a material or texture", path);
                summary.files_skipped += 1;
            }
            Err(e) => {
                warn!("Failed to update {:?}: {:#}", path, e);
                summary.files_failed += 1;
            }
        }
    }

    info!(
        "Update complete: {} found, {} updated, {} current, {} skipped, {} failed",
        summary.files_found,
        summary.files_updated,
        summary.files_current,
        summary.files_skipped,
        summary.files_failed
    );
    Ok(summary)
}

/// Update a single asset file.
pub fn update_file(path: &Path, config: &Config, dry_run: bool) -> Result<UpdateAction> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let header = read_asset_header(&bytes).with_context(|| format!("Failed to parse {:?}", path))?;

    let version = match header.version {
        Some(version) if version.is_current() => {
            debug!("{:?} is current ({})", path, version);
            return Ok(UpdateAction::Current);
        }
        Some(version) => version.to_string(),
        None => return Ok(UpdateAction::Skipped),
    };

    if !dry_run {
        rewrite(path, &bytes, &header, config)?;
    }

    Ok(UpdateAction::Updated { from: version })
}

fn rewrite(path: &Path, bytes: &[u8], header: &AssetHeader, config: &Config) -> Result<()> {
    let mut options = config.output.save_options();
    options.wrap_volume = header.envelope.is_some();
    // Legacy records carry no name of their own; keep the envelope's.
    options.resource_name = header.resource_name.clone();

    match header.kind {
        AssetKind::Material => {
            let material = decode_material(bytes)?;
            save_material(path, &material, &options)?;
        }
        AssetKind::Texture => {
            let texture = decode_texture(bytes)?;
            save_texture(path, &texture, &options)?;
        }
        AssetKind::Unknown(magic) => anyhow::bail!("Cannot rewrite '{}' chunk", magic),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spforge_assets::material::{MaterialVersion, CNST, MATL, ORTP, RTYP, TEXTURE_SLOTS, TXSM};
    use spforge_assets::volume::write_volume_resource;
    use spforge_assets::{load_material, Material, Rendertype, SaveOptions, VolumeResourceType};
    use spforge_ucfb::{ChunkWrite, Magic, Writer};
    use tempfile::TempDir;

    fn legacy_material() -> Vec<u8> {
        let mut writer = Writer::new(Vec::new(), Magic::UCFB).unwrap();
        writer
            .with_child(MATL, |matl| {
                matl.with_child(Magic::VER_, |c| c.write(&MaterialVersion::V2_0_0.to_raw()))?;
                matl.with_child(RTYP, |c| c.write("normal_ext"))?;
                matl.with_child(ORTP, |c| c.write("normal"))?;
                matl.with_child(CNST, |c| c.write(&[0f32; 32]))?;
                matl.with_child(TXSM, |c| c.write(&[-1i32; 8]))?;
                for slot in TEXTURE_SLOTS {
                    matl.with_child(slot, |c| c.write("tex"))?;
                }
                Ok::<_, spforge_ucfb::Error>(())
            })
            .unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_update_directory() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.matl");
        let new = dir.path().join("new.matl");
        let junk = dir.path().join("junk.matl");
        std::fs::write(&old, legacy_material()).unwrap();
        save_material(
            &new,
            &Material::new("new", "normal_ext", Rendertype::Normal),
            &SaveOptions::default(),
        )
        .unwrap();
        std::fs::write(&junk, b"not a chunk").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"ignored").unwrap();

        let config = Config::default();

        let summary = update_directory(dir.path(), &config, true).unwrap();
        assert_eq!(summary.files_found, 3);
        assert_eq!(summary.files_updated, 1);
        assert_eq!(summary.files_current, 1);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(std::fs::read(&old).unwrap(), legacy_material());

        let summary = update_directory(dir.path(), &config, false).unwrap();
        assert_eq!(summary.updated, vec![old.clone()]);

        let migrated = load_material(&old).unwrap();
        assert_eq!(migrated.name, "OldUnnamedMaterial");
        assert_eq!(migrated.overridden_rendertype, Rendertype::Normal);

        let summary = update_directory(dir.path(), &config, false).unwrap();
        assert_eq!(summary.files_current, 2);
        assert_eq!(summary.files_updated, 0);
    }

    #[test]
    fn test_update_keeps_plain_form() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.matl");
        std::fs::write(&old, legacy_material()).unwrap();

        update_file(&old, &Config::default(), false).unwrap();

        let header = read_asset_header(&std::fs::read(&old).unwrap()).unwrap();
        assert_eq!(header.kind, AssetKind::Material);
        assert_eq!(header.envelope, None);
        assert!(header.version.unwrap().is_current());
    }

    #[test]
    fn test_update_keeps_envelope_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rock.matl");

        // Skip the ucfb header; the rest is the matl chunk.
        let legacy = legacy_material();
        let mut writer = Writer::new(Vec::new(), Magic::UCFB).unwrap();
        write_volume_resource(&mut writer, "rock", VolumeResourceType::Material, &legacy[8..])
            .unwrap();
        std::fs::write(&path, writer.finish().unwrap()).unwrap();

        let action = update_file(&path, &Config::default(), false).unwrap();
        assert_eq!(action, UpdateAction::Updated { from: "2.0.0".to_string() });

        let header = read_asset_header(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(header.envelope, Some(VolumeResourceType::Material));
        assert_eq!(header.resource_name.as_deref(), Some("rock"));
        assert!(header.version.unwrap().is_current());
        assert_eq!(load_material(&path).unwrap().name, "OldUnnamedMaterial");
    }

    #[test]
    fn test_update_requires_directory() {
        let err = update_directory(Path::new("/nonexistent/assets"), &Config::default(), true);
        assert!(err.is_err());
    }
}
