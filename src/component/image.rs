//! Image：纯色或带纹理的 UI 四边形
//!
//! # 生命周期
//!
//! - 构造：拓扑固定为三角形带，四个角默认白色
//! - `on_enable`：分配常量缓冲区，把几何缓冲绑定到共享的四边形数据
//! - `render`：按纹理状态选择材质与顶点格式，懒创建顶点缓冲，上传常量块，提交绘制
//! - `on_disable`：释放常量缓冲区和顶点缓冲区，重新启用时再分配
//!
//! 纹理只借用（`Rc`），由外部资源系统管理生命周期。

use std::rc::{Rc, Weak};

use tracing::{debug, error, trace};

use crate::core::error::{Result, StateError};
use crate::core::math::{Color, Matrix4};
use crate::geometry::{
    GeometryBuffer, VertexBufferPolicy, QUAD_POSITIONS, QUAD_TOPOLOGY, QUAD_UVS, QUAD_VERTEX_COUNT,
};
use crate::renderer::{BufferDescriptor, ConstantBlock, GraphicsDevice, MaterialKind, MaterialProvider};

use super::component::{UiBehaviour, UiElement};
use super::transform::TransformSource;

/// 纹理在像素阶段的绑定槽位
const TEXTURE_SLOT: u32 = 0;

pub struct Image<D: GraphicsDevice> {
    element: UiElement,
    mesh: GeometryBuffer<D>,
    constant_buffer: Option<D::Buffer>,
    colors: [Color; QUAD_VERTEX_COUNT],
    texture: Option<Rc<D::Texture>>,
    owner: Weak<dyn MaterialProvider<D>>,
    transform: Rc<dyn TransformSource>,
    policy: VertexBufferPolicy,
}

impl<D: GraphicsDevice> Image<D> {
    pub fn new(
        name: impl Into<String>,
        owner: Weak<dyn MaterialProvider<D>>,
        transform: Rc<dyn TransformSource>,
    ) -> Self {
        Self {
            element: UiElement::new(name),
            mesh: GeometryBuffer::new(QUAD_TOPOLOGY),
            constant_buffer: None,
            colors: [Color::WHITE; QUAD_VERTEX_COUNT],
            texture: None,
            owner,
            transform,
            policy: VertexBufferPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: VertexBufferPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> VertexBufferPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: VertexBufferPolicy) {
        self.policy = policy;
    }

    /// 四个角使用同一颜色
    pub fn set_color(&mut self, color: Color) {
        self.set_corner_colors([color; QUAD_VERTEX_COUNT]);
    }

    /// 分别设置四个角的颜色，顺序与四边形顶点一致
    ///
    /// 已有顶点缓冲时，下一次渲染把新数据写入原缓冲，不重建。
    pub fn set_corner_colors(&mut self, colors: [Color; QUAD_VERTEX_COUNT]) {
        self.colors = colors;
        self.mesh.set_colors(&self.colors);
    }

    pub fn colors(&self) -> &[Color; QUAD_VERTEX_COUNT] {
        &self.colors
    }

    pub fn set_texture(&mut self, texture: Option<Rc<D::Texture>>) {
        self.texture = texture;
    }

    pub fn texture(&self) -> Option<&Rc<D::Texture>> {
        self.texture.as_ref()
    }

    pub fn set_transform(&mut self, transform: Rc<dyn TransformSource>) {
        self.transform = transform;
    }

    pub fn mesh(&self) -> &GeometryBuffer<D> {
        &self.mesh
    }

    pub fn constant_buffer(&self) -> Option<&D::Buffer> {
        self.constant_buffer.as_ref()
    }

    /// 当前纹理状态对应的材质类型
    pub fn material_kind(&self) -> MaterialKind {
        if self.texture.is_some() {
            MaterialKind::Textured
        } else {
            MaterialKind::Flat
        }
    }

    /// 本帧的常量块：world 取自 Transform，view 为单位阵
    pub fn constant_block(&self, projection: &Matrix4) -> ConstantBlock {
        ConstantBlock::new(
            &self.transform.local_to_world_matrix(),
            &Matrix4::identity(),
            projection,
        )
    }
}

impl<D: GraphicsDevice> UiBehaviour<D> for Image<D> {
    fn element(&self) -> &UiElement {
        &self.element
    }

    fn element_mut(&mut self) -> &mut UiElement {
        &mut self.element
    }

    fn on_enable(&mut self, device: &mut D) -> Result<()> {
        self.element.on_enable();

        let desc = BufferDescriptor::constant::<ConstantBlock>()
            .with_name(format!("{} constants", self.element.name()));
        let buffer = match device.create_buffer(&desc, None) {
            Ok(buffer) => buffer,
            Err(e) => {
                error!(element = %self.element.name(), error = %e, "Failed to create constant buffer");
                self.on_disable();
                return Err(e);
            }
        };
        debug!(element = %self.element.name(), size = desc.size, "Constant buffer created");
        self.constant_buffer = Some(buffer);

        self.mesh.bind(&QUAD_POSITIONS, &QUAD_UVS, &self.colors);
        Ok(())
    }

    fn on_disable(&mut self) {
        self.constant_buffer = None;
        self.mesh.release();
        self.element.on_disable();
    }

    fn render(&mut self, device: &mut D, projection: &Matrix4) -> Result<()> {
        let constant_buffer = match &self.constant_buffer {
            Some(buffer) if self.element.is_enabled() => buffer,
            _ => {
                error!(element = %self.element.name(), "Image rendered while not enabled");
                return Err(StateError::NotEnabled(self.element.name().to_string()).into());
            }
        };
        let owner = match self.owner.upgrade() {
            Some(owner) => owner,
            None => {
                error!(element = %self.element.name(), "Image owner has been dropped");
                return Err(StateError::OwnerDropped(self.element.name().to_string()).into());
            }
        };

        self.element.render(device)?;

        let kind = self.material_kind();
        let outcome = self.mesh.ensure_buffer(device, kind.vertex_format(), self.policy)?;
        trace!(element = %self.element.name(), ?kind, ?outcome, "Vertex buffer ready");

        owner.material(kind).set_for_render(device)?;
        if let Some(texture) = &self.texture {
            device.bind_pixel_stage_texture(TEXTURE_SLOT, texture)?;
        }

        device.bind_vertex_stage_constant(ConstantBlock::SLOT, constant_buffer)?;

        let block = self.constant_block(projection);
        device.update_buffer(constant_buffer, bytemuck::bytes_of(&block))?;

        self.mesh.render(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::component::{Canvas, Transform};
    use crate::core::math::matrix;
    use crate::core::DistUiError;
    use crate::gfx::recording::{DeviceCall, RecordedPipeline, RecordedTexture, RecordingDevice};
    use crate::renderer::{
        BufferUsageType, ClipRect, Material, MemoryType, PrimitiveTopology, VertexFormat,
    };

    struct Fixture {
        device: RecordingDevice,
        canvas: Rc<Canvas<RecordingDevice>>,
        transform: Rc<RefCell<Transform>>,
    }

    impl Fixture {
        fn new() -> Self {
            let canvas = Canvas::new(
                "hud",
                Material::new("ui-flat", MaterialKind::Flat, RecordedPipeline::new("ui-flat")),
                Material::new(
                    "ui-textured",
                    MaterialKind::Textured,
                    RecordedPipeline::new("ui-textured"),
                ),
                800,
                600,
            );
            Self {
                device: RecordingDevice::new(),
                canvas,
                transform: Rc::new(RefCell::new(Transform::rect(10.0, 10.0, 64.0, 32.0))),
            }
        }

        fn image(&self) -> Image<RecordingDevice> {
            let source: Rc<dyn TransformSource> = self.transform.clone();
            self.canvas.create_image("logo", source)
        }
    }

    fn texture() -> Rc<RecordedTexture> {
        Rc::new(RecordedTexture::new("checker", 8, 8))
    }

    fn constant_uploads(device: &RecordingDevice, image: &Image<RecordingDevice>) -> Vec<ConstantBlock> {
        let id = image.constant_buffer().unwrap().id();
        device
            .uploads_to(id)
            .into_iter()
            .map(|bytes| ConstantBlock::from_bytes(bytes).unwrap())
            .collect()
    }

    #[test]
    fn test_new_image_defaults() {
        let fx = Fixture::new();
        let image = fx.image();

        assert!(!image.is_enabled());
        assert_eq!(image.colors(), &[Color::WHITE; 4]);
        assert!(image.texture().is_none());
        assert!(image.constant_buffer().is_none());
        assert_eq!(image.mesh().topology(), PrimitiveTopology::TriangleStrip);
        assert_eq!(image.material_kind(), MaterialKind::Flat);
    }

    #[test]
    fn test_enable_allocates_constant_buffer() {
        let mut fx = Fixture::new();
        let mut image = fx.image();

        image.on_enable(&mut fx.device).unwrap();

        assert!(image.is_enabled());
        let buffer = image.constant_buffer().unwrap();
        assert_eq!(buffer.size(), 192);
        match &fx.device.calls()[0] {
            DeviceCall::CreateBuffer { desc, contents, .. } => {
                assert_eq!(desc.size, 192);
                assert_eq!(desc.usage, BufferUsageType::Constant);
                assert_eq!(desc.memory_type, MemoryType::DeviceDefault);
                assert!(contents.is_none());
            }
            other => panic!("unexpected call {:?}", other),
        }
        assert!(std::ptr::eq(image.mesh().positions(), &QUAD_POSITIONS[..]));
        assert!(std::ptr::eq(image.mesh().uvs(), &QUAD_UVS[..]));
        // 顶点缓冲在首次渲染时才创建
        assert!(!image.mesh().has_buffer());
    }

    #[test]
    fn test_enable_failure_leaves_image_unrenderable() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        fx.device.fail_next_buffer_creation();

        let err = image.on_enable(&mut fx.device).unwrap_err();
        assert!(err.is_graphics());
        assert!(!image.is_enabled());
        assert!(image.constant_buffer().is_none());

        let err = image.render(&mut fx.device, &Matrix4::identity()).unwrap_err();
        assert!(matches!(err, DistUiError::State(StateError::NotEnabled(_))));
        assert_eq!(fx.device.draw_count(), 0);

        // 重新启用后恢复
        image.on_enable(&mut fx.device).unwrap();
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();
        assert_eq!(fx.device.draw_count(), 1);
    }

    #[test]
    fn test_render_before_enable_fails_loudly() {
        let mut fx = Fixture::new();
        let mut image = fx.image();

        let err = image.render(&mut fx.device, &Matrix4::identity()).unwrap_err();

        assert!(matches!(err, DistUiError::State(StateError::NotEnabled(_))));
        assert!(fx.device.calls().is_empty());
    }

    #[test]
    fn test_untextured_uses_flat_material_and_color_format() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.on_enable(&mut fx.device).unwrap();

        image.render(&mut fx.device, &Matrix4::identity()).unwrap();

        assert_eq!(fx.device.pipelines_set(), vec!["ui-flat"]);
        assert_eq!(image.mesh().vertex_format(), Some(VertexFormat::PositionColor));
        assert!(!fx
            .device
            .calls()
            .iter()
            .any(|call| matches!(call, DeviceCall::BindPixelStageTexture { .. })));
    }

    #[test]
    fn test_textured_uses_texture_material_and_uv_format() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.set_texture(Some(texture()));
        image.on_enable(&mut fx.device).unwrap();

        image.render(&mut fx.device, &Matrix4::identity()).unwrap();

        assert_eq!(fx.device.pipelines_set(), vec!["ui-textured"]);
        assert_eq!(
            image.mesh().vertex_format(),
            Some(VertexFormat::PositionTexcoordColor)
        );
        assert!(fx.device.calls().contains(&DeviceCall::BindPixelStageTexture {
            slot: 0,
            texture: "checker".to_string(),
        }));
    }

    #[test]
    fn test_render_call_order() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.element_mut().set_clip_rect(Some(ClipRect::new(0, 0, 400, 300)));
        image.on_enable(&mut fx.device).unwrap();
        let cb = image.constant_buffer().unwrap().id();
        fx.device.take_calls();

        image.render(&mut fx.device, &Matrix4::identity()).unwrap();

        let calls = fx.device.calls();
        assert_eq!(calls.len(), 7);
        assert_eq!(calls[0], DeviceCall::SetClipRect(Some(ClipRect::new(0, 0, 400, 300))));
        let vb = match &calls[1] {
            DeviceCall::CreateBuffer { id, desc, .. } => {
                assert_eq!(desc.usage, BufferUsageType::Vertex);
                *id
            }
            other => panic!("unexpected call {:?}", other),
        };
        assert_eq!(calls[2], DeviceCall::SetPipeline { name: "ui-flat".to_string() });
        assert_eq!(calls[3], DeviceCall::BindVertexStageConstant { slot: 0, id: cb });
        assert!(matches!(&calls[4], DeviceCall::UpdateBuffer { id, data } if *id == cb && data.len() == 192));
        assert_eq!(calls[5], DeviceCall::SetVertexBuffer { id: vb, stride: 28 });
        assert_eq!(
            calls[6],
            DeviceCall::Draw {
                topology: PrimitiveTopology::TriangleStrip,
                vertex_count: 4
            }
        );
    }

    #[test]
    fn test_two_frames_with_moving_transform() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.on_enable(&mut fx.device).unwrap();
        let projection = matrix::ui_orthographic(800.0, 600.0);

        image.render(&mut fx.device, &projection).unwrap();
        fx.transform.borrow_mut().set_position_xyz(300.0, 200.0, 0.0);
        image.render(&mut fx.device, &projection).unwrap();

        assert_eq!(fx.device.draw_count(), 2);
        let vertex_buffers = fx
            .device
            .created_buffers()
            .into_iter()
            .filter(|(_, desc)| desc.usage == BufferUsageType::Vertex)
            .count();
        assert_eq!(vertex_buffers, 1);

        let uploads = constant_uploads(&fx.device, &image);
        assert_eq!(uploads.len(), 2);
        assert_ne!(uploads[0].world, uploads[1].world);
        assert_eq!(
            uploads[1].world_matrix(),
            fx.transform.borrow().local_to_world_matrix()
        );
        for block in &uploads {
            assert_eq!(block.view_matrix(), Matrix4::identity());
            assert_eq!(block.projection_matrix(), projection);
        }
    }

    #[test]
    fn test_texture_toggle_rebuilds_by_default() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.on_enable(&mut fx.device).unwrap();
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();
        let first = image.mesh().buffer().unwrap().id();

        image.set_texture(Some(texture()));
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();

        assert_eq!(
            image.mesh().vertex_format(),
            Some(VertexFormat::PositionTexcoordColor)
        );
        assert!(!fx.device.is_live(first));
        assert_eq!(fx.device.pipelines_set(), vec!["ui-flat", "ui-textured"]);

        // 去掉纹理后再切回纯色格式
        image.set_texture(None);
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();
        assert_eq!(image.mesh().vertex_format(), Some(VertexFormat::PositionColor));
        // 常量缓冲 + 当前顶点缓冲
        assert_eq!(fx.device.live_buffer_count(), 2);
    }

    #[test]
    fn test_texture_toggle_keeps_stale_buffer_under_keep_first() {
        let mut fx = Fixture::new();
        let mut image = fx.image().with_policy(VertexBufferPolicy::KeepFirst);
        image.on_enable(&mut fx.device).unwrap();
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();
        let first = image.mesh().buffer().unwrap().id();

        image.set_texture(Some(texture()));
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();

        // 旧行为：材质切换了，顶点缓冲仍是纯色格式
        assert_eq!(fx.device.pipelines_set(), vec!["ui-flat", "ui-textured"]);
        assert_eq!(image.mesh().vertex_format(), Some(VertexFormat::PositionColor));
        assert_eq!(image.mesh().buffer().unwrap().id(), first);
        assert!(fx
            .device
            .calls()
            .contains(&DeviceCall::SetVertexBuffer { id: first, stride: 28 }));
    }

    #[test]
    fn test_repeated_renders_create_vertex_buffer_once() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.set_texture(Some(texture()));
        image.on_enable(&mut fx.device).unwrap();

        for _ in 0..5 {
            image.render(&mut fx.device, &Matrix4::identity()).unwrap();
        }

        assert_eq!(fx.device.created_buffers().len(), 2);
        assert_eq!(fx.device.draw_count(), 5);
    }

    #[test]
    fn test_color_change_reuploads_vertices() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.on_enable(&mut fx.device).unwrap();
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();
        let vb = image.mesh().buffer().unwrap().id();

        image.set_color(Color::RED);
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();

        assert_eq!(fx.device.created_buffers().len(), 2);
        let uploads = fx.device.uploads_to(vb);
        assert_eq!(uploads.len(), 1);
        let first_vertex: crate::renderer::VertexPC = bytemuck::pod_read_unaligned(&uploads[0][..28]);
        assert_eq!(first_vertex.color, Color::RED.to_array());
    }

    #[test]
    fn test_disable_releases_and_reenable_reallocates() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.on_enable(&mut fx.device).unwrap();
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();
        let first_cb = image.constant_buffer().unwrap().id();
        assert_eq!(fx.device.live_buffer_count(), 2);

        image.on_disable();

        assert!(!image.is_enabled());
        assert_eq!(fx.device.live_buffer_count(), 0);
        assert!(image.render(&mut fx.device, &Matrix4::identity()).is_err());

        image.on_enable(&mut fx.device).unwrap();
        let second_cb = image.constant_buffer().unwrap().id();
        assert_ne!(first_cb, second_cb);

        image.render(&mut fx.device, &Matrix4::identity()).unwrap();
        assert_eq!(fx.device.live_buffer_count(), 2);
    }

    #[test]
    fn test_enable_is_idempotent_for_geometry() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.on_enable(&mut fx.device).unwrap();
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();

        image.on_enable(&mut fx.device).unwrap();
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();

        let vertex_buffers = fx
            .device
            .created_buffers()
            .into_iter()
            .filter(|(_, desc)| desc.usage == BufferUsageType::Vertex)
            .count();
        assert_eq!(vertex_buffers, 1);
        // 旧常量缓冲被替换后释放
        assert_eq!(fx.device.live_buffer_count(), 2);
    }

    #[test]
    fn test_failed_reenable_is_not_renderable() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.on_enable(&mut fx.device).unwrap();
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();
        assert_eq!(fx.device.draw_count(), 1);

        fx.device.fail_next_buffer_creation();
        let err = image.on_enable(&mut fx.device).unwrap_err();
        assert!(err.is_graphics());
        assert!(!image.is_enabled());
        // 失败时旧的常量缓冲和顶点缓冲一并释放
        assert!(image.constant_buffer().is_none());
        assert!(!image.mesh().has_buffer());
        assert_eq!(fx.device.live_buffer_count(), 0);

        let err = image.render(&mut fx.device, &Matrix4::identity()).unwrap_err();
        assert!(matches!(err, DistUiError::State(StateError::NotEnabled(_))));
        assert_eq!(fx.device.draw_count(), 1);
    }

    #[test]
    fn test_set_transform_switches_world_source() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.on_enable(&mut fx.device).unwrap();

        let fixed = matrix::translation(120.0, 80.0, 0.0);
        image.set_transform(Rc::new(fixed));
        image.render(&mut fx.device, &Matrix4::identity()).unwrap();

        let uploads = constant_uploads(&fx.device, &image);
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].world_matrix(), fixed);
    }

    #[test]
    fn test_owner_dropped() {
        let mut fx = Fixture::new();
        let mut image = fx.image();
        image.on_enable(&mut fx.device).unwrap();

        let Fixture { mut device, canvas, .. } = fx;
        drop(canvas);

        let err = image.render(&mut device, &Matrix4::identity()).unwrap_err();
        assert!(matches!(err, DistUiError::State(StateError::OwnerDropped(_))));
        assert_eq!(device.draw_count(), 0);
    }

    #[test]
    fn test_constant_block_is_fresh() {
        let fx = Fixture::new();
        let image = fx.image();
        let projection = matrix::ui_orthographic(640.0, 480.0);

        let before = image.constant_block(&projection);
        fx.transform.borrow_mut().add_position(crate::core::Vector3::new(5.0, 0.0, 0.0));
        let after = image.constant_block(&projection);

        assert_ne!(before.world, after.world);
        assert_eq!(after.view_matrix(), Matrix4::identity());
    }
}
