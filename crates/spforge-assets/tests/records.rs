use proptest::prelude::*;
use spforge_assets::material::{read_material, write_material, MATL, TEXTURE_SLOT_COUNT};
use spforge_assets::texture::{read_texture, write_texture, SPTX};
use spforge_assets::{
    decode_material, decode_texture, encode_material, encode_texture, DxgiFormat, Material,
    Rendertype, SaveOptions, Subresource, Texture, TextureInfo, TextureType,
};
use spforge_ucfb::{Magic, Reader, Writer};

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_.]{0,23}"
}

fn material_strategy() -> impl Strategy<Value = Material> {
    (
        name_strategy(),
        name_strategy(),
        prop::sample::select(Rendertype::ALL),
        prop::array::uniform32(-1000.0f32..1000.0),
        prop::collection::vec(prop_oneof![Just(String::new()), name_strategy()], 0..=8),
    )
        .prop_map(|(name, rendertype, overridden, constants, mut textures)| {
            while textures.last().is_some_and(String::is_empty) {
                textures.pop();
            }
            Material {
                name,
                rendertype,
                overridden_rendertype: overridden,
                constants,
                textures,
            }
        })
}

fn texture_strategy() -> impl Strategy<Value = Texture> {
    (name_strategy(), 1u32..=4, 1u32..=3, 0usize..3).prop_flat_map(|(name, mips, slices, kind)| {
        let texture_type = [
            TextureType::Texture1dArray,
            TextureType::Texture2dArray,
            TextureType::Texture2d,
        ][kind];
        let array_size = if texture_type == TextureType::Texture2d { 1 } else { slices };
        let height = if texture_type == TextureType::Texture1dArray { 1 } else { 8 };
        let count = (array_size * mips) as usize;

        prop::collection::vec(prop::collection::vec(any::<u8>(), 1..48), count).prop_map(
            move |payloads| Texture {
                name: name.clone(),
                info: TextureInfo {
                    texture_type,
                    width: 8,
                    height,
                    depth: 1,
                    array_size,
                    mip_count: mips,
                    format: DxgiFormat::R8G8B8A8_UNORM,
                },
                subresources: payloads
                    .into_iter()
                    .map(|data| Subresource {
                        row_pitch: data.len() as u32,
                        slice_pitch: data.len() as u32,
                        data,
                    })
                    .collect(),
            },
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn materials_survive_both_file_forms(material in material_strategy(), wrap in any::<bool>()) {
        let options = SaveOptions { wrap_volume: wrap, ..SaveOptions::default() };
        let bytes = encode_material(&material, &options).unwrap();
        prop_assert_eq!(decode_material(&bytes).unwrap(), material);
    }

    #[test]
    fn textures_survive_any_data_alignment(texture in texture_strategy(), shift in 2u32..9) {
        let options = SaveOptions {
            wrap_volume: false,
            texture_data_alignment: 1 << shift,
            resource_name: None,
        };
        let bytes = encode_texture(&texture, &options).unwrap();
        prop_assert_eq!(decode_texture(&bytes).unwrap(), texture);
    }
}

#[test]
fn scenario_material_with_single_texture() {
    let mut material = Material::new("foo", "normal", Rendertype::Normal);
    material.textures = vec![String::new(); TEXTURE_SLOT_COUNT];
    material.textures[0] = "foo.tex".into();

    let mut writer = Writer::new(Vec::new(), Magic::UCFB).unwrap();
    write_material(&mut writer, &material).unwrap();
    let bytes = writer.finish().unwrap();

    let mut root = Reader::new(&bytes).unwrap();
    let decoded = read_material(*root.read_child_strict(MATL).unwrap()).unwrap();

    assert_eq!(decoded.rendertype, "normal");
    assert_eq!(decoded.textures, vec!["foo.tex".to_string()]);
}

#[test]
fn scenario_two_mip_texture() {
    let texture = Texture {
        name: "mips".into(),
        info: TextureInfo::texture_2d(1, 4, 2, DxgiFormat::R8G8B8A8_UNORM),
        subresources: vec![
            Subresource {
                row_pitch: 4,
                slice_pitch: 16,
                data: (0..16).collect(),
            },
            Subresource {
                row_pitch: 4,
                slice_pitch: 16,
                data: (16..32).collect(),
            },
        ],
    };

    let mut writer = Writer::new(Vec::new(), Magic::UCFB).unwrap();
    write_texture(&mut writer, &texture, 16).unwrap();
    let bytes = writer.finish().unwrap();

    let mut root = Reader::new(&bytes).unwrap();
    let decoded = read_texture(*root.read_child_strict(SPTX).unwrap()).unwrap();

    assert_eq!(decoded.subresources.len(), 2);
    assert_eq!(decoded.subresource(0, 0).unwrap().data, (0..16).collect::<Vec<u8>>());
    assert_eq!(decoded.subresource(1, 0).unwrap().data, (16..32).collect::<Vec<u8>>());
    assert!(decoded.subresources.iter().all(|s| s.row_pitch == 4));
}

#[test]
fn material_json_uses_rendertype_names() {
    let material = Material::new("rock", "normal_ext", Rendertype::Terrain2);
    let json = serde_json::to_value(&material).unwrap();

    assert_eq!(json["overridden_rendertype"], "Terrain2");
    assert_eq!(json["rendertype"], "normal_ext");

    let back: Material = serde_json::from_value(json).unwrap();
    assert_eq!(back, material);
}
