//! 顶点数据定义
//!
//! UI 四边形使用两种顶点格式：
//!
//! - `VertexPC`：位置 + 颜色，用于纯色材质
//! - `VertexPTC`：位置 + 纹理坐标 + 颜色，用于纹理材质
//!
//! 两种结构都使用 `#[repr(C)]` 并实现 `Pod`，可以直接转成字节上传到 GPU。

use bytemuck::{Pod, Zeroable};
use crate::core::math::Color;

/// 位置 + 颜色顶点
///
/// # 内存布局
///
/// - `position`：偏移 0，12 字节
/// - `color`：偏移 12，16 字节
///
/// 总大小：28 字节
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPC {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// 位置 + 纹理坐标 + 颜色顶点
///
/// # 内存布局
///
/// - `position`：偏移 0，12 字节
/// - `texcoord`：偏移 12，8 字节
/// - `color`：偏移 20，16 字节
///
/// 总大小：36 字节
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPTC {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub color: [f32; 4],
}

impl VertexPC {
    pub fn new(position: [f32; 3], color: &Color) -> Self {
        Self {
            position,
            color: color.to_array(),
        }
    }
}

impl VertexPTC {
    pub fn new(position: [f32; 3], texcoord: [f32; 2], color: &Color) -> Self {
        Self {
            position,
            texcoord,
            color: color.to_array(),
        }
    }
}

/// 顶点格式
///
/// 顶点缓冲区一旦创建就绑定到某一种格式，格式变化时缓冲区不能复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// `VertexPC`
    PositionColor,
    /// `VertexPTC`
    PositionTexcoordColor,
}

impl VertexFormat {
    /// 单个顶点的字节跨度
    pub fn stride(&self) -> u32 {
        match self {
            VertexFormat::PositionColor => std::mem::size_of::<VertexPC>() as u32,
            VertexFormat::PositionTexcoordColor => std::mem::size_of::<VertexPTC>() as u32,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VertexFormat::PositionColor => "PositionColor",
            VertexFormat::PositionTexcoordColor => "PositionTexcoordColor",
        }
    }

    /// 按本格式交错排列顶点数据
    ///
    /// 三个切片按下标一一对应，长度取最短者。
    pub fn interleave(&self, positions: &[[f32; 3]], uvs: &[[f32; 2]], colors: &[Color]) -> Vec<u8> {
        match self {
            VertexFormat::PositionColor => {
                let vertices: Vec<VertexPC> = positions
                    .iter()
                    .zip(colors)
                    .map(|(p, c)| VertexPC::new(*p, c))
                    .collect();
                bytemuck::cast_slice(&vertices).to_vec()
            }
            VertexFormat::PositionTexcoordColor => {
                let vertices: Vec<VertexPTC> = positions
                    .iter()
                    .zip(uvs)
                    .zip(colors)
                    .map(|((p, uv), c)| VertexPTC::new(*p, *uv, c))
                    .collect();
                bytemuck::cast_slice(&vertices).to_vec()
            }
        }
    }
}
