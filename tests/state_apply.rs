//! Binding, locking and diffing render state through a real device.

mod backend;

use backend::TestBackend;
use kestrel::{
    graphics::{
        backend::{
            recording::{BackendCall, CallLog},
            BlendTarget, Capabilities,
        },
        Blend, BlendState, Color, CullMode, DepthStencilState, FillMode, GraphicsDeviceManager,
        PrimitiveType, RasterizerState, SamplerState, StateLifecycle, TextureFilter,
    },
    Error,
};

/// Manager with a created device and the call log of that device, cleared after a first forced draw.
fn setup() -> (TestBackend, GraphicsDeviceManager, CallLog) {
    let mut platform = TestBackend::new();
    let mut graphics = GraphicsDeviceManager::default();
    graphics.create_device(&mut platform).unwrap();

    graphics
        .device_mut()
        .unwrap()
        .draw_primitives(PrimitiveType::TriangleList, 0, 1)
        .unwrap();
    let log = platform.last_log();
    log.clear();

    (platform, graphics, log)
}

#[test]
fn binding_twice_is_a_no_op() {
    let (_platform, mut graphics, _log) = setup();
    let device = graphics.device_mut().unwrap();

    let mut state = RasterizerState::new();
    state.set_cull_mode(CullMode::None).unwrap();

    assert!(state.bind_to_graphics_device(device).unwrap());
    let lifecycle = state.lifecycle();
    assert!(!state.bind_to_graphics_device(device).unwrap());

    assert_eq!(state.lifecycle(), lifecycle);
    assert_eq!(state.cull_mode(), CullMode::None);
    assert_eq!(device.resources().len(), 1);
}

#[test]
fn bound_state_is_locked() {
    let (_platform, mut graphics, _log) = setup();
    let device = graphics.device_mut().unwrap();

    let mut blend = BlendState::new();
    blend.set_color_source_blend(Blend::SourceAlpha).unwrap();
    device.set_blend_state(&mut blend).unwrap();

    assert!(matches!(
        blend.set_color_source_blend(Blend::Zero),
        Err(Error::BoundStateModified { .. })
    ));
    assert!(blend.target_mut(1).is_err());
    assert_eq!(blend.color_source_blend(), Blend::SourceAlpha);

    let mut sampler = SamplerState::new();
    device.set_sampler_state(0, &mut sampler).unwrap();
    assert!(sampler.set_filter(TextureFilter::Point).is_err());
    assert_eq!(sampler.filter(), SamplerState::new().filter());
}

#[test]
fn other_device_rejects_bound_state() {
    let (_platform, mut first, _log) = setup();
    let (_other_platform, mut second, _other_log) = setup();

    let mut state = DepthStencilState::new();
    state
        .bind_to_graphics_device(first.device_mut().unwrap())
        .unwrap();
    let first_id = first.graphics_device().unwrap().id();

    assert!(matches!(
        state.bind_to_graphics_device(second.device_mut().unwrap()),
        Err(Error::BoundToOtherDevice { .. })
    ));
    assert_eq!(state.lifecycle().device(), Some(first_id));
}

#[test]
fn presets_are_immutable_and_never_bound() {
    let (_platform, mut graphics, log) = setup();
    let device = graphics.device_mut().unwrap();

    let mut blend = BlendState::ADDITIVE;
    assert!(matches!(
        blend.set_blend_factor(Color::BLACK),
        Err(Error::DefaultStateModified { .. })
    ));
    assert!(matches!(
        blend.bind_to_graphics_device(device),
        Err(Error::DefaultStateBound { .. })
    ));

    let mut rasterizer = RasterizerState::CULL_NONE;
    assert!(rasterizer.set_fill_mode(FillMode::WireFrame).is_err());
    assert!(rasterizer.bind_to_graphics_device(device).is_err());

    let mut depth_stencil = DepthStencilState::NONE;
    assert!(depth_stencil.set_stencil_enable(true).is_err());

    let mut sampler = SamplerState::POINT_CLAMP;
    assert!(sampler.set_max_anisotropy(2).is_err());

    // Using a preset doesn't bind it
    device.set_rasterizer_state(&mut rasterizer).unwrap();
    device.draw_primitives(PrimitiveType::TriangleList, 0, 1).unwrap();
    assert!(matches!(rasterizer.lifecycle(), StateLifecycle::Preset(_)));
    assert_eq!(log.count(|call| *call == BackendCall::CullMode(CullMode::None)), 1);
}

#[test]
fn only_changed_fields_are_applied() {
    let (_platform, mut graphics, log) = setup();
    let device = graphics.device_mut().unwrap();

    // Same values as the current preset, nothing to do
    let mut same = RasterizerState::new();
    device.set_rasterizer_state(&mut same).unwrap();
    device.draw_primitives(PrimitiveType::TriangleList, 0, 1).unwrap();
    assert_eq!(log.state_calls(), 0);
    log.clear();

    let mut read_only = DepthStencilState::DEPTH_READ;
    device.set_depth_stencil_state(&mut read_only).unwrap();
    device.draw_primitives(PrimitiveType::TriangleList, 0, 1).unwrap();
    assert_eq!(log.state_calls(), 1);
    assert_eq!(
        log.take(),
        [
            BackendCall::DepthWriteEnabled(false),
            BackendCall::DrawPrimitives {
                primitive_type: PrimitiveType::TriangleList,
                vertex_start: 0,
                primitive_count: 1
            }
        ]
    );

    // Applying the same state again changes nothing
    device.set_depth_stencil_state(&mut read_only).unwrap();
    device.draw_primitives(PrimitiveType::TriangleList, 0, 1).unwrap();
    assert_eq!(log.state_calls(), 0);
}

#[test]
fn reset_forces_every_field() {
    let (_platform, mut graphics, log) = setup();
    let device = graphics.device_mut().unwrap();

    let parameters = device.presentation_parameters().clone();
    device.reset(parameters).unwrap();
    log.clear();

    device.draw_primitives(PrimitiveType::TriangleList, 0, 1).unwrap();

    // Every category is applied, including fields that already match
    assert_eq!(log.count(|call| matches!(call, BackendCall::CullMode(_))), 1);
    assert_eq!(
        log.count(|call| *call == BackendCall::DepthTestEnabled(true)),
        1
    );
    assert_eq!(
        log.count(|call| *call == BackendCall::BlendEnabled(BlendTarget::All, false)),
        1
    );
    assert_eq!(
        log.count(|call| matches!(call, BackendCall::SamplerFilter { .. })),
        device.context().sampler_slots()
    );
}

#[test]
fn unsupported_state_fails_at_draw() {
    let mut platform = TestBackend::new();
    platform.state_mut().capabilities = Capabilities::MINIMAL;
    let mut graphics = GraphicsDeviceManager::default();
    graphics.create_device(&mut platform).unwrap();
    let device = graphics.device_mut().unwrap();

    let mut wireframe = RasterizerState::new();
    wireframe.set_fill_mode(FillMode::WireFrame).unwrap();
    device.set_rasterizer_state(&mut wireframe).unwrap();

    assert!(matches!(
        device.draw_primitives(PrimitiveType::TriangleList, 0, 1),
        Err(Error::NotSupported(_))
    ));
    assert_eq!(
        platform
            .last_log()
            .count(|call| matches!(call, BackendCall::DrawPrimitives { .. })),
        0
    );
}
