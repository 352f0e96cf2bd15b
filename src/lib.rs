//! DistUi - DistRender 的 UI 层
//!
//! 在 wgpu 渲染管线之上绘制纯色或带纹理的四边形 UI 元素。
//! 元素从所属的 Canvas 解析材质，在启用时分配常量缓冲区，
//! 在首次绘制时按材质要求的顶点格式创建顶点缓冲区。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（数学、日志、配置、错误处理）
//! - `renderer`: 设备接口、缓冲区描述、顶点格式、常量块和材质
//! - `geometry`: 共享的四边形数据和几何缓冲
//! - `gfx`: 设备实现（wgpu、无头记录设备）
//! - `component`: UI 组件（Canvas、Image、Transform）
//!
//! # 使用示例
//!
//! ```no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use dist_ui::component::{Canvas, Transform, TransformSource, UiBehaviour};
//! use dist_ui::gfx::recording::{RecordedPipeline, RecordingDevice};
//! use dist_ui::renderer::{Material, MaterialKind};
//!
//! let mut device = RecordingDevice::new();
//! let canvas = Canvas::new(
//!     "hud",
//!     Material::new("ui-flat", MaterialKind::Flat, RecordedPipeline::new("ui-flat")),
//!     Material::new("ui-textured", MaterialKind::Textured, RecordedPipeline::new("ui-textured")),
//!     800,
//!     600,
//! );
//!
//! let transform: Rc<dyn TransformSource> =
//!     Rc::new(RefCell::new(Transform::rect(16.0, 16.0, 128.0, 32.0)));
//! let mut panel = canvas.create_image("panel", transform);
//!
//! panel.on_enable(&mut device)?;
//! panel.render(&mut device, &canvas.projection())?;
//! # Ok::<(), dist_ui::core::DistUiError>(())
//! ```

pub mod core;
pub mod renderer;
pub mod geometry;
pub mod gfx;
pub mod component;
