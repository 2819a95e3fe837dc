use std::{sync::Arc, time::Duration, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::ModifiersState,
    window::{Window, WindowId},
};

use crate::{
    camera::cursor_to_ndc,
    engine::{self, EditorState},
    interaction::{Modifiers, PointerButton, PointerPress},
    rendering::Renderer,
};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    title: String,
    renderer: Option<Renderer>,
    state: EditorState,
    mouse_pos: Vec2,
    modifiers: ModifiersState,
    imgui: Option<ImguiState>,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(title: String, state: EditorState) -> Self {
        Self {
            title,
            renderer: None,
            state,
            mouse_pos: Vec2::ZERO,
            modifiers: ModifiersState::empty(),
            imgui: None,
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn setup_imgui(window: &Window) -> ImguiState {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // Disable INI support because it's broken in the published version of imgui
        context.set_ini_filename(None);

        ImguiState { context, platform }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes().with_title(self.title.as_str());
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;

        let mut imgui = Self::setup_imgui(&window);
        let mut renderer =
            pollster::block_on(Renderer::new(Arc::new(window), &mut imgui.context))?;
        renderer.load_models(&self.state.models);

        self.imgui = Some(imgui);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn pointer_ndc(&self) -> Vec2 {
        let Some(renderer) = &self.renderer else {
            return Vec2::ZERO;
        };
        let resolution = Vec2::new(renderer.size.width as f32, renderer.size.height as f32);
        cursor_to_ndc(self.mouse_pos, resolution)
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers {
            shift: self.modifiers.shift_key(),
            ctrl: self.modifiers.control_key(),
            alt: self.modifiers.alt_key(),
        }
    }

    fn wants_mouse(&self) -> bool {
        self.imgui
            .as_ref()
            .is_some_and(|imgui| imgui.context.io().want_capture_mouse)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(imgui), Some(renderer)) = (self.imgui.as_mut(), self.renderer.as_mut()) else {
            return;
        };

        let now = Instant::now();
        imgui
            .context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        renderer.window.request_redraw();

        if let Err(err) = imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &renderer.window)
        {
            log::error!("Failed to prepare ImGui frame: {err}");
            return;
        }

        let ui = imgui.context.new_frame();
        imgui.platform.prepare_render(ui, &renderer.window);

        if let Err(err) = engine::update(&mut self.state, renderer, ui) {
            let err = err.context("Error during engine::update");
            self.fail(event_loop, err);
            return;
        }

        match renderer.render(&self.state.scene, &mut imgui.context) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.resize(renderer.size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }
    }

    fn shutdown(&mut self) {
        self.state.scene.teardown();
        if !self.state.scene.persistence().flush(FLUSH_TIMEOUT) {
            log::warn!("Some saves did not finish before exit");
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.renderer.is_none() || self.imgui.is_none() {
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(*new_size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_pos = Vec2::new(position.x as f32, position.y as f32);
                let ndc = self.pointer_ndc();
                self.state.scene.pointer_moved(ndc);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => Some(PointerButton::Primary),
                    MouseButton::Right => Some(PointerButton::Secondary),
                    MouseButton::Middle => Some(PointerButton::Middle),
                    _ => None,
                };

                match (state, button) {
                    (ElementState::Pressed, Some(button)) if !self.wants_mouse() => {
                        let press = PointerPress::new(button, self.modifiers());
                        self.state.scene.pointer_down(press);
                    }
                    (ElementState::Released, Some(_)) => self.state.scene.pointer_up(),
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !self.wants_mouse() => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 40.0,
                };
                self.state.scene.wheel(steps);
            }
            _ => (),
        }

        if let (Some(imgui), Some(renderer)) = (self.imgui.as_mut(), self.renderer.as_ref()) {
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                &renderer.window,
                &Event::WindowEvent { window_id, event },
            );
        }
    }
}

pub async fn run(title: String, state: EditorState) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(title, state);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
