mod cli;

use spforge::{config, inspect, update};
use spforge_assets::{
    decode_material, decode_texture, read_asset_header, save_material, AssetHeader, Material,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, MaterialCommands, TextureCommands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "spforge=trace,spforge_ucfb=trace,spforge_assets=trace".to_string()
        } else {
            "spforge=info,spforge_assets=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect {
            file,
            max_depth,
            json,
        } => inspect_file(&file, max_depth, json),
        Commands::Material(MaterialCommands::Show { file, json }) => show_material(&file, json),
        Commands::Material(MaterialCommands::Build {
            description,
            output,
        }) => build_material(&description, &output, cli.config.as_deref()),
        Commands::Texture(TextureCommands::Show { file, json }) => show_texture(&file, json),
        Commands::Update { dir, dry_run } => update_assets(&dir, cli.config.as_deref(), dry_run),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("spforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn read_file(file: &Path) -> Result<Vec<u8>> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }
    std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))
}

fn describe_form(header: &AssetHeader) -> String {
    match header.envelope {
        Some(kind) => format!("volume resource ({})", kind),
        None => "plain".to_string(),
    }
}

fn inspect_file(file: &Path, max_depth: Option<usize>, json: bool) -> Result<()> {
    let bytes = read_file(file)?;
    let tree = inspect::chunk_tree(&bytes, max_depth)
        .with_context(|| format!("Failed to parse {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print!("{}", inspect::render_tree(&tree));
    }

    Ok(())
}

fn show_material(file: &Path, json: bool) -> Result<()> {
    let bytes = read_file(file)?;
    let header = read_asset_header(&bytes).with_context(|| format!("Failed to parse {:?}", file))?;
    let material =
        decode_material(&bytes).with_context(|| format!("Failed to decode material {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&material)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    if let Some(version) = header.version {
        println!("Version: {}", version);
    }
    println!("Form: {}", describe_form(&header));
    println!("Name: {}", material.name);
    println!("Rendertype: {}", material.rendertype);
    println!("Overrides: {}", material.overridden_rendertype);

    println!("\nConstants:");
    for (i, row) in material.constants.chunks(4).enumerate() {
        println!(
            "  [{:2}] {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            i * 4,
            row[0],
            row[1],
            row[2],
            row[3]
        );
    }

    println!("\nTextures: {}", material.textures.len());
    for (i, texture) in material.textures.iter().enumerate() {
        if texture.is_empty() {
            println!("  [{}] (empty)", i);
        } else {
            println!("  [{}] {}", i, texture);
        }
    }

    Ok(())
}

fn build_material(description: &Path, output: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let content = std::fs::read_to_string(description)
        .with_context(|| format!("Failed to read material description: {:?}", description))?;
    let material: Material = toml::from_str(&content)
        .with_context(|| format!("Failed to parse material description: {:?}", description))?;
    material.validate()?;

    save_material(output, &material, &config.output.save_options())?;

    println!("Wrote material '{}' to {}", material.name, output.display());
    Ok(())
}

fn show_texture(file: &Path, json: bool) -> Result<()> {
    let bytes = read_file(file)?;
    let header = read_asset_header(&bytes).with_context(|| format!("Failed to parse {:?}", file))?;
    let texture =
        decode_texture(&bytes).with_context(|| format!("Failed to decode texture {:?}", file))?;
    let info = &texture.info;

    if json {
        let subresources: Vec<_> = texture
            .subresources
            .iter()
            .map(|s| {
                serde_json::json!({
                    "row_pitch": s.row_pitch,
                    "slice_pitch": s.slice_pitch,
                    "size": s.data.len(),
                })
            })
            .collect();
        let value = serde_json::json!({
            "name": texture.name,
            "version": header.version.map(|v| v.to_string()),
            "info": info,
            "subresources": subresources,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    if let Some(version) = header.version {
        println!("Version: {}", version);
    }
    println!("Form: {}", describe_form(&header));
    println!("Name: {}", texture.name);
    println!("Type: {}", info.texture_type);
    println!("Size: {}x{}x{}", info.width, info.height, info.depth);
    println!("Array size: {}", info.array_size);
    println!("Mips: {}", info.mip_count);
    println!("Format: {}", info.format);
    println!("Data: {} bytes", texture.data_size());

    println!("\nSubresources: {}", texture.subresources.len());
    for slice in 0..info.array_size {
        for mip in 0..info.mip_count {
            if let Some(sub) = texture.subresource(mip, slice) {
                println!(
                    "  [slice {} mip {}] {} bytes, pitch {}/{}",
                    slice,
                    mip,
                    sub.data.len(),
                    sub.row_pitch,
                    sub.slice_pitch
                );
            }
        }
    }

    Ok(())
}

fn update_assets(dir: &Path, config_path: Option<&Path>, dry_run: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let summary = update::update_directory(dir, &config, dry_run)?;

    if dry_run {
        println!("[DRY RUN] Would update {} files", summary.files_updated);
    } else {
        println!("Updated {} files", summary.files_updated);
    }
    for path in &summary.updated {
        println!("  {}", path.display());
    }
    println!(
        "{} found, {} already current, {} skipped, {} failed",
        summary.files_found, summary.files_current, summary.files_skipped, summary.files_failed
    );

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Wrap volume: {}", config.output.wrap_volume);
    println!(
        "  Texture data alignment: {}",
        config.output.texture_data_alignment
    );
    println!(
        "  Material extensions: {}",
        config.update.material_extensions.join(", ")
    );
    println!(
        "  Texture extensions: {}",
        config.update.texture_extensions.join(", ")
    );
    println!("  Follow links: {}", config.update.follow_links);

    Ok(())
}
