//! CLI end-to-end tests
//!
//! Tests for the spforge command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use spforge_assets::{
    load_material, read_asset_header, save_texture, DxgiFormat, SaveOptions, Subresource,
    Texture, TextureInfo,
};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the spforge binary
#[allow(deprecated)]
fn spforge_cmd() -> Command {
    Command::cargo_bin("spforge").unwrap()
}

const ROCK_DESCRIPTION: &str = r#"
name = "rock"
rendertype = "normal_ext"
overridden_rendertype = "normal"
textures = ["rock_diffuse", "rock_normal"]
"#;

fn write_texture(path: &Path) {
    let texture = Texture {
        name: "checker".to_string(),
        info: TextureInfo::texture_2d(4, 4, 2, DxgiFormat::R8G8B8A8_UNORM),
        subresources: vec![
            Subresource {
                row_pitch: 16,
                slice_pitch: 64,
                data: vec![0xaa; 64],
            },
            Subresource {
                row_pitch: 8,
                slice_pitch: 16,
                data: vec![0x55; 16],
            },
        ],
    };
    save_texture(path, &texture, &SaveOptions::default()).unwrap();
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = spforge_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = spforge_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("spforge"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = spforge_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("spforge "));
}

#[test]
fn test_cli_material_build_and_show() {
    let dir = tempdir().unwrap();
    let description = dir.path().join("rock.toml");
    let output = dir.path().join("rock.matl");
    fs::write(&description, ROCK_DESCRIPTION).unwrap();

    spforge_cmd()
        .args(["material", "build"])
        .arg(&description)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote material 'rock'"));

    let material = load_material(&output).unwrap();
    assert_eq!(material.textures, vec!["rock_diffuse", "rock_normal"]);

    spforge_cmd()
        .args(["material", "show"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: rock"))
        .stdout(predicate::str::contains("Rendertype: normal_ext"))
        .stdout(predicate::str::contains("Version: 3.0.0"))
        .stdout(predicate::str::contains("volume resource (material)"))
        .stdout(predicate::str::contains("[1] rock_normal"));
}

#[test]
fn test_cli_material_show_json() {
    let dir = tempdir().unwrap();
    let description = dir.path().join("rock.toml");
    let output = dir.path().join("rock.matl");
    fs::write(&description, ROCK_DESCRIPTION).unwrap();

    spforge_cmd()
        .args(["material", "build"])
        .arg(&description)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let out = spforge_cmd()
        .args(["material", "show", "--json"])
        .arg(&output)
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["name"], "rock");
    assert_eq!(json["overridden_rendertype"], "normal");
    assert_eq!(json["constants"].as_array().unwrap().len(), 32);
}

#[test]
fn test_cli_material_build_respects_config() {
    let dir = tempdir().unwrap();
    let description = dir.path().join("rock.toml");
    let config = dir.path().join("spforge.toml");
    let output = dir.path().join("rock.matl");
    fs::write(&description, ROCK_DESCRIPTION).unwrap();
    fs::write(&config, "[output]\nwrap_volume = false\n").unwrap();

    spforge_cmd()
        .arg("--config")
        .arg(&config)
        .args(["material", "build"])
        .arg(&description)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let header = read_asset_header(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(header.envelope, None);
}

#[test]
fn test_cli_material_build_rejects_unknown_rendertype() {
    let dir = tempdir().unwrap();
    let description = dir.path().join("bad.toml");
    let output = dir.path().join("bad.matl");
    fs::write(
        &description,
        "name = \"bad\"\nrendertype = \"normal\"\noverridden_rendertype = \"shiny\"\n",
    )
    .unwrap();

    spforge_cmd()
        .args(["material", "build"])
        .arg(&description)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse material description"));

    assert!(!output.exists());
}

#[test]
fn test_cli_texture_show() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checker.sptx");
    write_texture(&path);

    spforge_cmd()
        .args(["texture", "show"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: checker"))
        .stdout(predicate::str::contains("Size: 4x4x1"))
        .stdout(predicate::str::contains("Format: R8G8B8A8_UNORM"))
        .stdout(predicate::str::contains("Data: 80 bytes"))
        .stdout(predicate::str::contains("[slice 0 mip 1] 16 bytes, pitch 8/16"));
}

#[test]
fn test_cli_texture_show_json_omits_texels() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checker.sptx");
    write_texture(&path);

    let out = spforge_cmd()
        .args(["texture", "show", "--json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["name"], "checker");
    assert_eq!(json["version"], "2.0.0");
    assert_eq!(json["info"]["mip_count"], 2);
    assert_eq!(json["subresources"][0]["size"], 64);
    assert!(json["subresources"][0].get("data").is_none());
}

#[test]
fn test_cli_texture_show_on_material_fails() {
    let dir = tempdir().unwrap();
    let description = dir.path().join("rock.toml");
    let output = dir.path().join("rock.matl");
    fs::write(&description, ROCK_DESCRIPTION).unwrap();

    spforge_cmd()
        .args(["material", "build"])
        .arg(&description)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    spforge_cmd()
        .args(["texture", "show"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode texture"));
}

#[test]
fn test_cli_inspect() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checker.sptx");
    write_texture(&path);

    spforge_cmd()
        .arg("inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ucfb"))
        .stdout(predicate::str::contains("tex_"))
        .stdout(predicate::str::contains("BODY"));

    let out = spforge_cmd()
        .args(["inspect", "--json", "--max-depth", "1"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["magic"], "ucfb");
    assert_eq!(json["children"][0]["magic"], "tex_");
    assert!(json["children"][0]["children"].as_array().unwrap().is_empty());
}

#[test]
fn test_cli_inspect_nonexistent_file() {
    let mut cmd = spforge_cmd();
    cmd.args(["inspect", "/nonexistent/file.matl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_inspect_not_ucfb() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("junk.matl");
    fs::write(&path, b"RIFF\x04\0\0\0WAVE").unwrap();

    spforge_cmd()
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}

#[test]
fn test_cli_update_dry_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checker.sptx");
    write_texture(&path);
    let before = fs::read(&path).unwrap();

    spforge_cmd()
        .arg("update")
        .arg(dir.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN] Would update 0 files"))
        .stdout(predicate::str::contains("1 found, 1 already current"));

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_cli_update_requires_directory() {
    let mut cmd = spforge_cmd();
    cmd.args(["update", "/nonexistent/assets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a directory"));
}

#[test]
fn test_cli_validate_default() {
    let mut cmd = spforge_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("Texture data alignment: 16"));
}

#[test]
fn test_cli_validate_good_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("spforge.toml");
    fs::write(
        &config,
        "[output]\ntexture_data_alignment = 256\n\n[update]\nmaterial_extensions = [\"matl\", \"mat\"]\n",
    )
    .unwrap();

    spforge_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Texture data alignment: 256"))
        .stdout(predicate::str::contains("Material extensions: matl, mat"));
}

#[test]
fn test_cli_validate_bad_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("spforge.toml");
    fs::write(&config, "[output]\ntexture_data_alignment = 24\n").unwrap();

    spforge_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("power of two"));
}
