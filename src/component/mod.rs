//! UI 组件模块
//!
//! 提供 UI 元素的基础能力与具体元素：
//! - `UiBehaviour` / `UiElement`：启用、禁用、渲染钩子
//! - `Transform`：位置、旋转、缩放
//! - `Canvas`：UI 根节点，持有默认材质
//! - `Image`：纯色或带纹理的四边形

mod component;
mod transform;
mod canvas;
mod image;

pub use component::{UiBehaviour, UiElement};
pub use transform::{Transform, TransformSource};
pub use canvas::Canvas;
pub use image::Image;
