//! 几何缓冲
//!
//! 保存拓扑、顶点属性数组，以及按需创建的 GPU 顶点缓冲区。
//!
//! 顶点缓冲区的状态是一个带标签的变体：不存在，或者以某种顶点格式存在。
//! 每次 `ensure_buffer` 都会把需要的格式与当前标签比较，而不只是检查“是否存在”。

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::core::error::{Result, StateError};
use crate::core::math::Color;
use crate::renderer::{BufferDescriptor, GraphicsDevice, PrimitiveTopology, VertexFormat};

/// 已有顶点缓冲的格式与所需格式不一致时的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VertexBufferPolicy {
    /// 释放旧缓冲，按新格式重建
    #[default]
    Rebuild,
    /// 保留首次创建的缓冲，只记录警告
    ///
    /// 对应“首帧之后纹理不再变化”的旧约定，纹理切换后绘制使用的是错误格式的数据。
    KeepFirst,
}

/// 顶点缓冲区状态
pub enum VertexBufferState<B> {
    Absent,
    Built { format: VertexFormat, buffer: B },
}

impl<B> VertexBufferState<B> {
    pub fn format(&self) -> Option<VertexFormat> {
        match self {
            VertexBufferState::Absent => None,
            VertexBufferState::Built { format, .. } => Some(*format),
        }
    }
}

/// `ensure_buffer` 做了什么
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// 之前没有缓冲，新建
    Created,
    /// 格式一致，什么也没做
    Reused,
    /// 格式一致，顶点数据（颜色）变了，覆盖写入已有缓冲
    Reuploaded,
    /// 格式不一致，丢弃旧缓冲后重建
    Rebuilt,
    /// 格式不一致，但策略要求保留旧缓冲
    KeptStale,
}

/// 几何缓冲
pub struct GeometryBuffer<D: GraphicsDevice> {
    topology: PrimitiveTopology,
    positions: &'static [[f32; 3]],
    uvs: &'static [[f32; 2]],
    colors: Vec<Color>,
    vertex_buffer: VertexBufferState<D::Buffer>,
    /// 顶点数据在缓冲创建或上次上传之后被修改过
    dirty: bool,
}

impl<D: GraphicsDevice> GeometryBuffer<D> {
    pub fn new(topology: PrimitiveTopology) -> Self {
        Self {
            topology,
            positions: &[],
            uvs: &[],
            colors: Vec::new(),
            vertex_buffer: VertexBufferState::Absent,
            dirty: false,
        }
    }

    /// 绑定顶点属性
    ///
    /// 位置和纹理坐标只借用，颜色复制一份。可以重复调用，内容相同时不会标记为脏。
    pub fn bind(
        &mut self,
        positions: &'static [[f32; 3]],
        uvs: &'static [[f32; 2]],
        colors: &[Color],
    ) {
        let geometry_changed = !std::ptr::eq(self.positions, positions)
            || !std::ptr::eq(self.uvs, uvs);
        self.positions = positions;
        self.uvs = uvs;
        self.set_colors(colors);
        if geometry_changed && self.has_buffer() {
            self.dirty = true;
        }
    }

    /// 替换颜色，位置和纹理坐标不受影响
    pub fn set_colors(&mut self, colors: &[Color]) {
        if self.colors != colors {
            self.colors = colors.to_vec();
            self.dirty = true;
        }
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn positions(&self) -> &'static [[f32; 3]] {
        self.positions
    }

    pub fn uvs(&self) -> &'static [[f32; 2]] {
        self.uvs
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    /// 当前顶点缓冲的格式，没有缓冲时为 `None`
    pub fn vertex_format(&self) -> Option<VertexFormat> {
        self.vertex_buffer.format()
    }

    pub fn has_buffer(&self) -> bool {
        matches!(self.vertex_buffer, VertexBufferState::Built { .. })
    }

    pub fn buffer(&self) -> Option<&D::Buffer> {
        match &self.vertex_buffer {
            VertexBufferState::Absent => None,
            VertexBufferState::Built { buffer, .. } => Some(buffer),
        }
    }

    /// 保证存在 `format` 格式的顶点缓冲
    pub fn ensure_buffer(
        &mut self,
        device: &mut D,
        format: VertexFormat,
        policy: VertexBufferPolicy,
    ) -> Result<EnsureOutcome> {
        match self.vertex_buffer.format() {
            None => {
                self.create(device, format)?;
                Ok(EnsureOutcome::Created)
            }
            Some(current) if current == format => {
                if self.dirty {
                    self.upload(device, current)?;
                    Ok(EnsureOutcome::Reuploaded)
                } else {
                    Ok(EnsureOutcome::Reused)
                }
            }
            Some(current) => match policy {
                VertexBufferPolicy::Rebuild => {
                    debug!(
                        from = current.name(),
                        to = format.name(),
                        "Vertex format changed, rebuilding vertex buffer"
                    );
                    self.release();
                    self.create(device, format)?;
                    Ok(EnsureOutcome::Rebuilt)
                }
                VertexBufferPolicy::KeepFirst => {
                    warn!(
                        current = current.name(),
                        required = format.name(),
                        "Keeping vertex buffer with stale format"
                    );
                    if self.dirty {
                        self.upload(device, current)?;
                    }
                    Ok(EnsureOutcome::KeptStale)
                }
            },
        }
    }

    /// 使用已绑定的拓扑和顶点缓冲提交绘制
    pub fn render(&self, device: &mut D) -> Result<()> {
        let (format, buffer) = match &self.vertex_buffer {
            VertexBufferState::Built { format, buffer } => (*format, buffer),
            VertexBufferState::Absent => {
                error!("Geometry render called without a vertex buffer");
                return Err(StateError::NoVertexBuffer.into());
            }
        };

        trace!(
            topology = ?self.topology,
            vertices = self.vertex_count(),
            format = format.name(),
            "Drawing geometry"
        );
        device.set_vertex_buffer(buffer, format.stride())?;
        device.draw(self.topology, self.vertex_count())
    }

    /// 释放顶点缓冲，返回之前是否存在
    pub fn release(&mut self) -> bool {
        let had_buffer = self.has_buffer();
        if had_buffer {
            debug!("Releasing vertex buffer");
        }
        self.vertex_buffer = VertexBufferState::Absent;
        had_buffer
    }

    fn create(&mut self, device: &mut D, format: VertexFormat) -> Result<()> {
        let bytes = format.interleave(self.positions, self.uvs, &self.colors);
        let desc = BufferDescriptor::vertex(bytes.len() as u64).with_name(format.name());

        debug!(
            format = format.name(),
            vertices = self.vertex_count(),
            bytes = bytes.len(),
            "Creating vertex buffer"
        );
        let buffer = device.create_buffer(&desc, Some(&bytes))?;

        self.vertex_buffer = VertexBufferState::Built { format, buffer };
        self.dirty = false;
        Ok(())
    }

    fn upload(&mut self, device: &mut D, format: VertexFormat) -> Result<()> {
        if let VertexBufferState::Built { buffer, .. } = &self.vertex_buffer {
            let bytes = format.interleave(self.positions, self.uvs, &self.colors);
            trace!(bytes = bytes.len(), "Re-uploading vertex data");
            device.update_buffer(buffer, &bytes)?;
        }
        self.dirty = false;
        Ok(())
    }
}
