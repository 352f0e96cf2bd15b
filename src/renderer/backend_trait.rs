//! 图形设备的统一接口
//!
//! UI 元素通过这个 trait 使用图形设备，而不是访问全局单例。
//! 设备句柄由调用方在渲染时显式传入，所有调用都发生在同一个渲染线程上。
//!
//! # 实现
//!
//! - `gfx::wgpu::WgpuDevice`：wgpu 后端，记录本帧命令并在 `flush` 时回放到 render pass
//! - `gfx::recording::RecordingDevice`：无头设备，记录所有调用，用于测试和帧捕获

use crate::core::error::Result;
use super::resource::{BufferDescriptor, ClipRect, PrimitiveTopology};

/// 统一的图形设备接口
///
/// 资源句柄（`Buffer`、`Pipeline`、`Texture`）归调用方所有，
/// 句柄被 drop 时底层资源随之释放。
pub trait GraphicsDevice: 'static {
    /// 缓冲区句柄
    type Buffer: 'static;
    /// 渲染管线句柄（材质绑定的着色器和管线状态）
    type Pipeline: 'static;
    /// 纹理句柄
    type Texture: 'static;

    /// 创建缓冲区
    ///
    /// `contents` 为 `None` 时缓冲区内容未初始化。
    /// 资源耗尽或描述符无效时返回 `GraphicsError::ResourceCreation`。
    fn create_buffer(
        &mut self,
        desc: &BufferDescriptor,
        contents: Option<&[u8]>,
    ) -> Result<Self::Buffer>;

    /// 整体覆盖写入缓冲区内容
    fn update_buffer(&mut self, buffer: &Self::Buffer, data: &[u8]) -> Result<()>;

    /// 把常量缓冲区绑定到顶点着色器阶段的指定槽位
    fn bind_vertex_stage_constant(&mut self, slot: u32, buffer: &Self::Buffer) -> Result<()>;

    /// 把纹理绑定到像素着色器阶段的指定槽位
    fn bind_pixel_stage_texture(&mut self, slot: u32, texture: &Self::Texture) -> Result<()>;

    /// 绑定渲染管线
    fn set_pipeline(&mut self, pipeline: &Self::Pipeline) -> Result<()>;

    /// 设置裁剪矩形，`None` 表示不裁剪
    fn set_clip_rect(&mut self, clip: Option<ClipRect>) -> Result<()>;

    /// 绑定顶点缓冲区
    fn set_vertex_buffer(&mut self, buffer: &Self::Buffer, stride: u32) -> Result<()>;

    /// 提交绘制
    fn draw(&mut self, topology: PrimitiveTopology, vertex_count: u32) -> Result<()>;
}
