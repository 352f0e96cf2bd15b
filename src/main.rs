//! DistUi 演示程序
//!
//! 打开一个窗口，在 Canvas 上绘制两个 Image：
//! - banner：四角渐变的纯色条，左右移动
//! - logo：带纹理的方块，持续旋转
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件
//! cargo run
//!
//! # 指定纹理文件，旧的“保留首个顶点缓冲”行为
//! cargo run -- --texture assets/logo.png --keep-first
//! ```
//!
//! # 按键
//!
//! - `T`：切换 logo 的纹理（纹理材质 ↔ 纯色材质）
//! - `Space`：禁用 / 启用 banner
//! - `Esc`：退出

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, error, info};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use dist_ui::component::{Canvas, Image, Transform, UiBehaviour};
use dist_ui::core::{log, Color, Config, Vector3};
use dist_ui::gfx::wgpu::WgpuTexture;
use dist_ui::gfx::{WgpuContext, WgpuDevice};

/// 演示场景：一个 Canvas 和它的两个 Image
struct UiDemo {
    canvas: Rc<Canvas<WgpuDevice>>,
    banner: Image<WgpuDevice>,
    banner_transform: Rc<RefCell<Transform>>,
    logo: Image<WgpuDevice>,
    logo_transform: Rc<RefCell<Transform>>,
    logo_texture: Rc<WgpuTexture>,
}

impl UiDemo {
    fn new(device: &mut WgpuDevice, config: &Config, width: u32, height: u32) -> dist_ui::core::Result<Self> {
        let (flat, textured) = device.create_default_materials()?;
        let canvas = Canvas::new("main", flat, textured, width, height);
        let policy = config.ui.vertex_buffer_policy;

        let logo_texture = Rc::new(match &config.ui.texture {
            Some(path) => device.load_texture(path)?,
            None => device.create_texture("checkerboard", &checkerboard(64, 8))?,
        });

        let banner_transform = Rc::new(RefCell::new(Transform::rect(40.0, 40.0, 320.0, 64.0)));
        let mut banner = canvas
            .create_image("banner", banner_transform.clone())
            .with_policy(policy);
        banner.set_corner_colors([
            Color::rgb(0.9, 0.3, 0.2),
            Color::rgb(1.0, 0.6, 0.2),
            Color::rgb(0.2, 0.4, 0.9),
            Color::rgb(0.3, 0.8, 0.9),
        ]);

        let logo_transform = Rc::new(RefCell::new(Transform::rect(
            width as f32 * 0.5 - 96.0,
            height as f32 * 0.5 - 96.0,
            192.0,
            192.0,
        )));
        let mut logo = canvas
            .create_image("logo", logo_transform.clone())
            .with_policy(policy);
        logo.set_texture(Some(Rc::clone(&logo_texture)));

        banner.on_enable(device)?;
        logo.on_enable(device)?;

        Ok(Self {
            canvas,
            banner,
            banner_transform,
            logo,
            logo_transform,
            logo_texture,
        })
    }

    /// 按经过的时间更新动画
    fn update(&mut self, seconds: f32) {
        let (width, _) = self.canvas.size();
        let travel = (width as f32 - 400.0).max(0.0);
        let x = 40.0 + travel * 0.5 * (1.0 + seconds.sin());
        self.banner_transform
            .borrow_mut()
            .set_position_xyz(x + 160.0, 72.0, 0.0);

        self.logo_transform
            .borrow_mut()
            .set_euler_angle(Vector3::new(0.0, 0.0, seconds * 45.0));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.resize(width, height);
        self.logo_transform.borrow_mut().set_position_xyz(
            width as f32 * 0.5,
            height as f32 * 0.5,
            0.0,
        );
    }

    fn toggle_logo_texture(&mut self) {
        if self.logo.texture().is_some() {
            info!("Logo switched to flat material");
            self.logo.set_texture(None);
            self.logo.set_color(Color::rgb(0.9, 0.9, 0.3));
        } else {
            info!("Logo switched to textured material");
            self.logo.set_texture(Some(Rc::clone(&self.logo_texture)));
            self.logo.set_color(Color::WHITE);
        }
    }

    fn toggle_banner(&mut self, device: &mut WgpuDevice) -> dist_ui::core::Result<()> {
        if self.banner.is_enabled() {
            self.banner.on_disable();
        } else {
            self.banner.on_enable(device)?;
        }
        info!(enabled = self.banner.is_enabled(), "Banner toggled");
        Ok(())
    }

    /// 录制并提交一帧
    ///
    /// 元素渲染出错时，已记录的命令仍会提交，错误在呈现后返回。
    fn draw(
        &mut self,
        context: &mut WgpuContext,
        device: &mut WgpuDevice,
        clear: Color,
    ) -> dist_ui::core::Result<()> {
        let frame = context.acquire_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut elements: [&mut dyn UiBehaviour<WgpuDevice>; 2] = [&mut self.banner, &mut self.logo];
        let rendered = self.canvas.render_elements(device, &mut elements);

        device.flush(&view, context.size(), Some(clear))?;
        frame.present();
        rendered
    }
}

/// 生成棋盘格纹理
fn checkerboard(size: u32, cell: u32) -> image::RgbaImage {
    image::RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            image::Rgba([240, 240, 240, 255])
        } else {
            image::Rgba([40, 120, 200, 255])
        }
    })
}

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载配置文件（config.toml），应用命令行参数并验证
/// 2. 初始化日志系统
/// 3. 创建窗口、wgpu 上下文和设备
/// 4. 创建 Canvas 和 Image，启动主循环
fn main() -> anyhow::Result<()> {
    let mut config = Config::from_file_or_default("config.toml");
    config.apply_args(std::env::args());
    config.validate().context("Invalid configuration")?;

    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, config.logging.file_output, log_file);
    info!("DistUi starting...");
    info!(version = env!("CARGO_PKG_VERSION"), "Application initialized");
    info!(
        width = config.window.width,
        height = config.window.height,
        policy = ?config.ui.vertex_buffer_policy,
        "UI configuration"
    );

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window.width,
                config.window.height,
            ))
            .with_resizable(config.window.resizable)
            .build(&event_loop)
            .context("Failed to create window")?,
    );

    let mut context = WgpuContext::new(Arc::clone(&window), &config)?;
    let mut device = WgpuDevice::new(&context)?;
    let (width, height) = context.size();
    let mut demo = UiDemo::new(&mut device, &config, width, height)?;

    let c = config.graphics.clear_color;
    let clear = Color::new(c[0], c[1], c[2], c[3]);
    let start = Instant::now();

    info!("Entering main loop...");
    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down...");
                elwt.exit();
            }
            WindowEvent::Resized(size) => {
                debug!(width = size.width, height = size.height, "Window resized");
                if size.width > 0 && size.height > 0 {
                    context.reconfigure_surface(size.width, size.height);
                    demo.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Named(NamedKey::Escape) => elwt.exit(),
                Key::Named(NamedKey::Space) => {
                    if let Err(e) = demo.toggle_banner(&mut device) {
                        error!("Failed to toggle banner: {}", e);
                    }
                }
                Key::Character(ref s) if s.eq_ignore_ascii_case("t") => demo.toggle_logo_texture(),
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                demo.update(start.elapsed().as_secs_f32());
                if let Err(e) = demo.draw(&mut context, &mut device, clear) {
                    error!("Frame failed: {}", e);
                }
            }
            _ => {}
        },
        Event::AboutToWait => window.request_redraw(),
        _ => {}
    })?;

    Ok(())
}
