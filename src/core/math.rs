//! 统一的数学库模块
//!
//! 基于 `nalgebra`，提供 UI 层使用的向量、矩阵和颜色类型。

pub use nalgebra::{
    Matrix4 as Mat4, UnitQuaternion,
    Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4,
};

// 类型别名，使用更简洁的名称
pub type Vector2 = Vec2<f32>;
pub type Vector3 = Vec3<f32>;
pub type Vector4 = Vec4<f32>;
pub type Matrix4 = Mat4<f32>;
pub type Quaternion = UnitQuaternion<f32>;

/// 颜色类型（RGBA，范围 0.0-1.0）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// 创建新的颜色
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 创建 RGB 颜色（alpha = 1.0）
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// 从整数值创建颜色（0-255）
    pub fn from_rgba_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// 转换为数组，直接写入顶点
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    // 预定义颜色
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const RED: Color = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const BLUE: Color = Color { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// 数学常量
pub mod constants {
    /// 角度转弧度的系数
    pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

    /// 浮点数比较的 epsilon
    pub const EPSILON: f32 = 1e-6;
}

/// 矩阵辅助函数
pub mod matrix {
    use super::*;

    /// 创建平移矩阵
    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// 创建缩放矩阵
    pub fn scaling(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
    }

    /// 创建 UI 像素空间的正交投影
    ///
    /// 原点在左上角，x 向右、y 向下，单位为像素。
    /// 深度映射到 wgpu 的 [0, 1] 裁剪范围：z ∈ [-1, 1] → [1, 0]。
    pub fn ui_orthographic(width: f32, height: f32) -> Matrix4 {
        Matrix4::new(
            2.0 / width, 0.0, 0.0, -1.0,
            0.0, -2.0 / height, 0.0, 1.0,
            0.0, 0.0, -0.5, 0.5,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// 检查两个矩阵是否近似相等
    pub fn approx_eq(a: &Matrix4, b: &Matrix4) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < constants::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_creation() {
        let color = Color::rgb(1.0, 0.5, 0.0);
        assert_eq!(color.r, 1.0);
        assert_eq!(color.a, 1.0);
        assert_eq!(Color::default(), Color::WHITE);
        assert_eq!(Color::from_rgba_u8(255, 0, 0, 255), Color::RED);
    }

    #[test]
    fn test_matrix_translation() {
        let mat = matrix::translation(1.0, 2.0, 3.0);
        let result = mat * Vector4::new(0.0, 0.0, 0.0, 1.0);

        assert!((result.x - 1.0).abs() < 1e-6);
        assert!((result.y - 2.0).abs() < 1e-6);
        assert!((result.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_ui_orthographic_corners() {
        let proj = matrix::ui_orthographic(800.0, 600.0);

        let top_left = proj * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((top_left.x + 1.0).abs() < 1e-6);
        assert!((top_left.y - 1.0).abs() < 1e-6);
        assert!((top_left.z - 0.5).abs() < 1e-6);

        let bottom_right = proj * Vector4::new(800.0, 600.0, 0.0, 1.0);
        assert!((bottom_right.x - 1.0).abs() < 1e-6);
        assert!((bottom_right.y + 1.0).abs() < 1e-6);
    }
}
