//! 材质
//!
//! 材质封装一条渲染管线（着色器 + 管线状态）。UI 层只有两种默认材质：
//! 纯色材质和纹理材质，由所属的 Canvas 通过 `MaterialProvider` 提供。

use tracing::trace;

use crate::core::error::Result;
use super::backend_trait::GraphicsDevice;
use super::vertex::VertexFormat;

/// 材质类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// 纯色，只使用顶点颜色
    Flat,
    /// 纹理采样乘以顶点颜色
    Textured,
}

impl MaterialKind {
    /// 此类材质要求的顶点格式
    pub fn vertex_format(&self) -> VertexFormat {
        match self {
            MaterialKind::Flat => VertexFormat::PositionColor,
            MaterialKind::Textured => VertexFormat::PositionTexcoordColor,
        }
    }
}

/// 材质
pub struct Material<D: GraphicsDevice> {
    name: String,
    kind: MaterialKind,
    pipeline: D::Pipeline,
}

impl<D: GraphicsDevice> Material<D> {
    pub fn new(name: impl Into<String>, kind: MaterialKind, pipeline: D::Pipeline) -> Self {
        Self {
            name: name.into(),
            kind,
            pipeline,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn pipeline(&self) -> &D::Pipeline {
        &self.pipeline
    }

    /// 绑定本材质的管线状态，之后的绘制都使用它
    pub fn set_for_render(&self, device: &mut D) -> Result<()> {
        trace!(material = %self.name, kind = ?self.kind, "Binding material");
        device.set_pipeline(&self.pipeline)
    }
}

/// 默认材质提供者
///
/// UI 树中拥有元素的节点实现此 trait，元素在渲染时通过它解析材质。
pub trait MaterialProvider<D: GraphicsDevice> {
    /// 纯色材质
    fn default_material(&self) -> &Material<D>;

    /// 纹理材质
    fn default_texture_material(&self) -> &Material<D>;

    /// 按类型取材质
    fn material(&self, kind: MaterialKind) -> &Material<D> {
        match kind {
            MaterialKind::Flat => self.default_material(),
            MaterialKind::Textured => self.default_texture_material(),
        }
    }
}
