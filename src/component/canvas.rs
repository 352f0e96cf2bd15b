//! Canvas：UI 树的根节点
//!
//! 持有纯色和纹理两种默认材质，并为子元素提供像素空间的正交投影。
//! 子元素只保存指向 Canvas 的弱引用。

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::core::error::Result;
use crate::core::math::{matrix, Matrix4};
use crate::renderer::{GraphicsDevice, Material, MaterialKind, MaterialProvider};

use super::component::UiBehaviour;
use super::image::Image;
use super::transform::TransformSource;

pub struct Canvas<D: GraphicsDevice> {
    name: String,
    default_material: Material<D>,
    default_texture_material: Material<D>,
    size: Cell<(u32, u32)>,
}

impl<D: GraphicsDevice> Canvas<D> {
    /// 创建 Canvas
    ///
    /// `flat` 必须是纯色材质，`textured` 必须是纹理材质。
    pub fn new(
        name: impl Into<String>,
        flat: Material<D>,
        textured: Material<D>,
        width: u32,
        height: u32,
    ) -> Rc<Self> {
        debug_assert_eq!(flat.kind(), MaterialKind::Flat);
        debug_assert_eq!(textured.kind(), MaterialKind::Textured);

        let canvas = Rc::new(Self {
            name: name.into(),
            default_material: flat,
            default_texture_material: textured,
            size: Cell::new((width, height)),
        });
        debug!(canvas = %canvas.name, width, height, "Canvas created");
        canvas
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (u32, u32) {
        self.size.get()
    }

    /// 窗口尺寸变化
    pub fn resize(&self, width: u32, height: u32) {
        debug!(canvas = %self.name, width, height, "Canvas resized");
        self.size.set((width, height));
    }

    /// 当前尺寸下的像素空间正交投影
    pub fn projection(&self) -> Matrix4 {
        let (width, height) = self.size.get();
        matrix::ui_orthographic(width.max(1) as f32, height.max(1) as f32)
    }

    /// 创建属于本 Canvas 的 Image
    pub fn create_image(
        self: &Rc<Self>,
        name: impl Into<String>,
        transform: Rc<dyn TransformSource>,
    ) -> Image<D> {
        let owner: Weak<Self> = Rc::downgrade(self);
        let owner: Weak<dyn MaterialProvider<D>> = owner;
        Image::new(name, owner, transform)
    }

    /// 按顺序绘制所有已启用的元素，未启用的跳过
    pub fn render_elements(
        &self,
        device: &mut D,
        elements: &mut [&mut dyn UiBehaviour<D>],
    ) -> Result<()> {
        let projection = self.projection();
        for element in elements.iter_mut() {
            if !element.is_enabled() {
                trace!(element = %element.name(), "Skipping disabled element");
                continue;
            }
            element.render(device, &projection)?;
        }
        Ok(())
    }
}

impl<D: GraphicsDevice> MaterialProvider<D> for Canvas<D> {
    fn default_material(&self) -> &Material<D> {
        &self.default_material
    }

    fn default_texture_material(&self) -> &Material<D> {
        &self.default_texture_material
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::component::Transform;
    use crate::core::math::Vector4;
    use crate::gfx::recording::{RecordedPipeline, RecordingDevice};

    fn canvas() -> Rc<Canvas<RecordingDevice>> {
        Canvas::new(
            "hud",
            Material::new("ui-flat", MaterialKind::Flat, RecordedPipeline::new("ui-flat")),
            Material::new(
                "ui-textured",
                MaterialKind::Textured,
                RecordedPipeline::new("ui-textured"),
            ),
            800,
            600,
        )
    }

    #[test]
    fn test_materials() {
        let canvas = canvas();
        assert_eq!(canvas.default_material().name(), "ui-flat");
        assert_eq!(canvas.default_texture_material().name(), "ui-textured");
        assert_eq!(canvas.material(MaterialKind::Textured).kind(), MaterialKind::Textured);
    }

    #[test]
    fn test_projection_follows_resize() {
        let canvas = canvas();
        canvas.resize(400, 200);

        let p = canvas.projection() * Vector4::new(400.0, 200.0, 0.0, 1.0);
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!((p.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_render_elements_skips_disabled() {
        let mut device = RecordingDevice::new();
        let canvas = canvas();
        let transform: Rc<dyn TransformSource> = Rc::new(RefCell::new(Transform::rect(0.0, 0.0, 10.0, 10.0)));

        let mut shown = canvas.create_image("shown", Rc::clone(&transform));
        let mut hidden = canvas.create_image("hidden", transform);
        shown.on_enable(&mut device).unwrap();

        let mut elements: [&mut dyn UiBehaviour<RecordingDevice>; 2] = [&mut shown, &mut hidden];
        canvas.render_elements(&mut device, &mut elements).unwrap();

        assert_eq!(device.draw_count(), 1);
    }
}
