//! Transform 组件
//!
//! 管理 UI 元素的位置、旋转和缩放，并向渲染提供本地到世界矩阵。

use std::cell::{Cell, RefCell};

use crate::core::math::{constants::DEG_TO_RAD, Matrix4, Vector3};

/// 世界矩阵来源
///
/// 每次渲染调用一次，渲染方不缓存返回值。
pub trait TransformSource {
    fn local_to_world_matrix(&self) -> Matrix4;
}

/// Transform 组件
pub struct Transform {
    /// 位置
    position: Vector3,

    /// 欧拉角（度数）
    euler_angle: Vector3,

    /// 缩放
    scale: Vector3,

    /// 世界矩阵缓存
    world_matrix: Cell<Matrix4>,

    /// 世界矩阵是否需要更新
    world_dirty: Cell<bool>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::zeros(),
            euler_angle: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            world_matrix: Cell::new(Matrix4::identity()),
            world_dirty: Cell::new(true),
        }
    }

    /// 创建带位置的 Transform
    pub fn with_position(position: Vector3) -> Self {
        let mut transform = Self::new();
        transform.set_position(position);
        transform
    }

    /// 覆盖像素矩形的 Transform
    ///
    /// 单位四边形以原点为中心、边长为 1，
    /// 所以位置取矩形中心，缩放取矩形宽高。
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        let mut transform = Self::new();
        transform.set_position_xyz(x + width * 0.5, y + height * 0.5, 0.0);
        transform.set_scale_xyz(width, height, 1.0);
        transform
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn euler_angle(&self) -> Vector3 {
        self.euler_angle
    }

    pub fn scale(&self) -> Vector3 {
        self.scale
    }

    /// 设置位置
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.world_dirty.set(true);
    }

    /// 设置位置（分量形式）
    pub fn set_position_xyz(&mut self, x: f32, y: f32, z: f32) {
        self.set_position(Vector3::new(x, y, z));
    }

    /// 设置欧拉角（度数）
    pub fn set_euler_angle(&mut self, euler: Vector3) {
        self.euler_angle = euler;
        self.world_dirty.set(true);
    }

    /// 设置缩放
    pub fn set_scale(&mut self, scale: Vector3) {
        self.scale = scale;
        self.world_dirty.set(true);
    }

    /// 设置缩放（分量形式）
    pub fn set_scale_xyz(&mut self, x: f32, y: f32, z: f32) {
        self.set_scale(Vector3::new(x, y, z));
    }

    /// 添加位置偏移
    pub fn add_position(&mut self, offset: Vector3) {
        self.position += offset;
        self.world_dirty.set(true);
    }

    /// 添加旋转偏移（度数）
    pub fn add_euler_angle(&mut self, offset: Vector3) {
        self.euler_angle += offset;
        self.world_dirty.set(true);
    }

    fn compute_world_matrix(&self) -> Matrix4 {
        let pitch = self.euler_angle.x * DEG_TO_RAD;
        let yaw = self.euler_angle.y * DEG_TO_RAD;
        let roll = self.euler_angle.z * DEG_TO_RAD;

        let translation = Matrix4::new_translation(&self.position);

        let rotation_x = Matrix4::from_axis_angle(&Vector3::x_axis(), pitch);
        let rotation_y = Matrix4::from_axis_angle(&Vector3::y_axis(), yaw);
        let rotation_z = Matrix4::from_axis_angle(&Vector3::z_axis(), roll);
        let rotation = rotation_z * rotation_y * rotation_x;

        let scale = Matrix4::new_nonuniform_scaling(&self.scale);

        // T * R * S
        translation * rotation * scale
    }
}

impl TransformSource for Transform {
    fn local_to_world_matrix(&self) -> Matrix4 {
        if self.world_dirty.get() {
            self.world_matrix.set(self.compute_world_matrix());
            self.world_dirty.set(false);
        }
        self.world_matrix.get()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// 共享的可变 Transform：帧与帧之间修改，渲染时读取最新值
impl<T: TransformSource + ?Sized> TransformSource for RefCell<T> {
    fn local_to_world_matrix(&self) -> Matrix4 {
        self.borrow().local_to_world_matrix()
    }
}

/// 固定矩阵
impl TransformSource for Matrix4 {
    fn local_to_world_matrix(&self) -> Matrix4 {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::{matrix, Vector4};

    #[test]
    fn test_identity_by_default() {
        let transform = Transform::default();
        assert_eq!(transform.local_to_world_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_rect_maps_unit_quad() {
        let transform = Transform::rect(100.0, 50.0, 200.0, 80.0);
        let world = transform.local_to_world_matrix();

        let corner = world * Vector4::new(-0.5, -0.5, 0.0, 1.0);
        assert!((corner.x - 100.0).abs() < 1e-4);
        assert!((corner.y - 50.0).abs() < 1e-4);

        let corner = world * Vector4::new(0.5, 0.5, 0.0, 1.0);
        assert!((corner.x - 300.0).abs() < 1e-4);
        assert!((corner.y - 130.0).abs() < 1e-4);
    }

    #[test]
    fn test_cache_invalidated_on_change() {
        let mut transform = Transform::with_position(Vector3::new(1.0, 0.0, 0.0));
        let first = transform.local_to_world_matrix();

        transform.add_position(Vector3::new(2.0, 0.0, 0.0));
        let second = transform.local_to_world_matrix();

        assert_ne!(first, second);
        assert!(matrix::approx_eq(&second, &matrix::translation(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_rotation_z() {
        let mut transform = Transform::new();
        transform.set_euler_angle(Vector3::new(0.0, 0.0, 90.0));
        let p = transform.local_to_world_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);

        assert!(p.x.abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_refcell_source_reads_latest() {
        let shared = RefCell::new(Transform::new());
        let before = shared.local_to_world_matrix();

        shared.borrow_mut().set_position_xyz(5.0, 5.0, 0.0);
        let after = shared.local_to_world_matrix();

        assert_ne!(before, after);
    }
}
