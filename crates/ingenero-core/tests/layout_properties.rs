use approx::assert_relative_eq;
use ingenero_core::math::{Mat4, Vec3, Vec4};
use ingenero_core::renderer::layout::{
    populate_light_block, try_populate_light_block, DeferredLightBlock, ForwardLightBlock,
    GBufferEncoding, GBuffers, LightBlock, Material, MaterialFlags, MaterialStruct,
    ModelMatrices, PerLightData, SurfaceSample, UniformStaging, AMBIENT_DISABLED,
    AMBIENT_ENABLED,
};
use ingenero_core::renderer::{
    select_layout, CapacityPolicy, DrawDispatcher, DrawIndexedPrimitives, IndexFormat,
    LayoutError, LayoutSettings, Light, LightFalloff, PrimitiveTopology, ShadingMode,
    MAX_LIGHTS,
};
use std::mem::size_of;

fn numbered_lights(count: usize) -> Vec<PerLightData> {
    (0..count)
        .map(|i| {
            PerLightData::point(
                Vec3::new(i as f32, 0.0, -1.0),
                Vec3::splat(0.5),
                LightFalloff::QUADRATIC,
            )
        })
        .collect()
}

#[test]
fn forward_block_is_thirty_one_entries_larger_than_deferred() {
    let entry = size_of::<PerLightData>();
    assert_eq!(entry, 48);
    assert_eq!(
        size_of::<ForwardLightBlock>() - size_of::<DeferredLightBlock>(),
        31 * entry
    );
    assert_eq!(select_layout(ShadingMode::ACTIVE).size, size_of::<LightBlock>());
    assert_eq!(select_layout(ShadingMode::ACTIVE).capacity, MAX_LIGHTS);
}

#[test]
fn overflowing_lights_are_truncated_in_order() {
    let lights = numbered_lights(MAX_LIGHTS + 8);
    let block = populate_light_block(&lights, Vec4::ZERO);
    assert_eq!(block.lights(), &lights[..MAX_LIGHTS]);
    assert!(block.light(MAX_LIGHTS).is_none());

    let err = try_populate_light_block(&lights, Vec4::ZERO).unwrap_err();
    assert_eq!(
        err,
        LayoutError::CapacityExceeded {
            capacity: MAX_LIGHTS,
            requested: MAX_LIGHTS + 8,
        }
    );
}

#[test]
fn light_block_bytes_survive_staging() {
    let lights = numbered_lights(MAX_LIGHTS);
    let block = populate_light_block(&lights, Vec4::new(0.1, 0.1, 0.1, 0.0));

    let mut staging = UniformStaging::new::<LightBlock>(256, "lights").unwrap();
    staging.push(&block).unwrap();
    staging.push(&block).unwrap();
    assert_eq!(staging.offset_of(1).map(|offset| offset % 256), Some(0));

    let restored: LightBlock = staging.read_at(1).unwrap();
    assert_eq!(restored.as_bytes(), block.as_bytes());
}

#[test]
fn scene_lights_pack_with_reject_policy_until_full() {
    let settings = LayoutSettings {
        hdr_max_intensity: 2.0,
        capacity_policy: CapacityPolicy::Reject,
        ..LayoutSettings::default()
    };
    let mut scene = vec![Light::ambient(Vec3::ONE, 0.4)];
    scene.extend((0..MAX_LIGHTS).map(|i| {
        Light::point(Vec3::new(0.0, i as f32, 0.0), LightFalloff::LINEAR, Vec3::ONE, 1.0)
    }));

    let block = LightBlock::from_scene_lights(&scene, &Mat4::IDENTITY, &settings).unwrap();
    assert_relative_eq!(block.ambient_intensity.x, 0.2);
    assert_eq!(block.ambient_intensity.w, 0.0);
    assert_relative_eq!(block.lights()[0].intensity.x, 0.5);

    scene.push(Light::directional(Vec3::Y, Vec3::ONE, 1.0));
    assert!(LightBlock::from_scene_lights(&scene, &Mat4::IDENTITY, &settings).is_err());

    scene.pop();
    scene.push(Light::directional(Vec3::Y, Vec3::ONE, 1.0).with_enabled(false));
    assert!(LightBlock::from_scene_lights(&scene, &Mat4::IDENTITY, &settings).is_ok());
}

#[test]
fn material_flag_word_and_ambient_sentinel() {
    let material = Material {
        flags: MaterialFlags::DIFFUSE_MAP | MaterialFlags::NORMAL_MAP,
        ..Material::default()
    };
    let packed = material.to_struct(1.0);
    assert_eq!(size_of::<MaterialStruct>(), 64);
    assert_eq!(packed.flags, 0b1_0010);
    assert_eq!(packed.ambient_colour.w.to_bits(), AMBIENT_ENABLED.to_bits());
    assert!(packed.use_ambient());

    let disabled = Material {
        use_ambient: false,
        ..material
    }
    .to_struct(1.0);
    assert_eq!(disabled.ambient_colour.w.to_bits(), AMBIENT_DISABLED.to_bits());
    assert!(!disabled.use_ambient());
    assert_eq!(&packed.as_bytes()[16..], &disabled.as_bytes()[16..]);
}

#[test]
fn singular_model_transform_is_rejected() {
    let flattened = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
    assert_eq!(
        ModelMatrices::new(flattened, Mat4::IDENTITY).unwrap_err(),
        LayoutError::DegenerateTransform
    );
    assert!(ModelMatrices::new(Mat4::IDENTITY, Mat4::IDENTITY).is_ok());
}

#[test]
fn standard_gbuffer_keeps_colour_exact() {
    let sample = SurfaceSample {
        diffuse: Vec4::new(0.25, 0.5, 0.75, 1.0),
        normal: Vec3::new(0.0, 0.0, 1.0),
        specular: Vec4::new(0.5, 0.5, 0.5, 0.25),
        light: Vec4::new(0.1, 0.2, 0.3, 1.0),
    };
    let decoded = GBuffers::encode(&sample).decode();
    assert_eq!(decoded.diffuse, sample.diffuse);
    assert_eq!(decoded.light, sample.light);
    assert_relative_eq!(decoded.normal.z, 1.0);
    assert_relative_eq!(decoded.specular.w, 0.25);
}

#[derive(Default)]
struct RecordingDispatcher {
    issued: Vec<DrawIndexedPrimitives>,
}

impl DrawDispatcher for RecordingDispatcher {
    fn draw_indexed_primitives(&mut self, draw: &DrawIndexedPrimitives) {
        self.issued.push(*draw);
    }
}

#[test]
fn deferred_pass_draws_one_volume_per_light() {
    let scene: Vec<Light> = (0..5)
        .map(|i| {
            Light::point(
                Vec3::new(i as f32, 0.0, -5.0),
                LightFalloff::QUADRATIC,
                Vec3::ONE,
                1.0,
            )
        })
        .collect();

    // Geometry indices come first; the shared light volume follows them.
    let geometry = DrawIndexedPrimitives::triangles(3_000, IndexFormat::Uint32);
    let volume = DrawIndexedPrimitives {
        index_buffer_offset: geometry.index_bytes(),
        ..DrawIndexedPrimitives::light_volume()
    };

    let mut dispatcher = RecordingDispatcher::default();
    dispatcher.draw_indexed_primitives(&geometry);
    for (i, light) in scene.iter().enumerate() {
        let transform = light.volume_to_camera_transform(&Mat4::IDENTITY, 1.0).unwrap();
        // Unit falloff reaches 1/256 of full brightness at sqrt(255).
        assert_relative_eq!(transform.get_row(0).x, 255.0f32.sqrt(), max_relative = 1e-5);
        assert_relative_eq!(transform.get_row(0).w, i as f32);
        dispatcher.draw_indexed_primitives(&volume);
    }

    assert_eq!(dispatcher.issued.len(), 1 + scene.len());
    assert_eq!(dispatcher.issued[0], geometry);
    for draw in &dispatcher.issued[1..] {
        assert_eq!(draw.topology, PrimitiveTopology::TriangleList);
        assert_eq!(draw.index_count, DrawIndexedPrimitives::LIGHT_VOLUME_INDEX_COUNT);
        assert_eq!(draw.index_format, IndexFormat::Uint16);
        assert_eq!(draw.index_buffer_offset, 12_000);
        assert_eq!(draw.index_bytes(), 120);
    }
}
