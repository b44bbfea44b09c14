use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use log::{debug, error, info};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::{
    config::ViewerConfig,
    error::RenderError,
    gfx::{
        camera::CameraController,
        picking::{ObjectPicker, PickEvent},
        rendering::RenderEngine,
        scene::Scene,
        ui::{panel, UiManager},
    },
};

/// Extra widgets drawn after the built-in scene panel
pub type UiCallback = Box<dyn FnMut(&imgui::Ui, &mut Scene)>;

/// Windowed viewer around a [`Scene`].
///
/// Build the scene through [`ArborApp::scene_mut`], register a pick handler
/// with [`ArborApp::on_pick`] and hand control to [`ArborApp::run`].
pub struct ArborApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    controller: CameraController,
    picker: ObjectPicker,
    ui_callback: Option<UiCallback>,
    last_frame: Instant,
    failure: Option<RenderError>,
}

impl ArborApp {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create the event loop")?;
        let scene = Scene::from_config(&config);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                controller: CameraController::new(),
                picker: ObjectPicker::new(),
                ui_callback: None,
                last_frame: Instant::now(),
                failure: None,
            },
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.app_state.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.app_state.scene
    }

    /// Registers the handler run for every successful pick
    pub fn on_pick<F>(&mut self, callback: F)
    where
        F: FnMut(&PickEvent, &mut Scene) + 'static,
    {
        self.app_state.picker.on_pick(callback);
    }

    pub fn set_ui<F>(&mut self, ui_fn: F)
    where
        F: FnMut(&imgui::Ui, &mut Scene) + 'static,
    {
        self.app_state.ui_callback = Some(Box::new(ui_fn));
    }

    /// Runs the event loop until the window closes.
    ///
    /// Fails if the loop cannot start or the renderer could not be brought up.
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        self.app_state.scene.log_summary();
        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated abnormally")?;

        match self.app_state.failure.take() {
            Some(e) => Err(e).context("renderer failed"),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, e: RenderError) {
        error!("{e}");
        self.failure = Some(e);
        event_loop.exit();
    }

    fn pick_under_cursor(&mut self) {
        let Some(render_engine) = self.render_engine.as_ref() else {
            return;
        };
        let Some((x, y)) = self.controller.cursor() else {
            debug!("click before any cursor position was reported, nothing to pick");
            return;
        };
        let (width, height) = render_engine.get_surface_size();
        self.picker
            .pick_and_dispatch(&mut self.scene, x, y, width, height);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        let AppState {
            window,
            render_engine,
            ui_manager,
            scene,
            picker,
            ui_callback,
            ..
        } = self;
        let (Some(window), Some(render_engine)) = (window.as_ref(), render_engine.as_mut()) else {
            return;
        };

        scene.update(dt);
        render_engine.update(scene);

        let overlay = ui_manager.as_mut().map(|ui_manager| {
            move |device: &wgpu::Device,
                  queue: &wgpu::Queue,
                  encoder: &mut wgpu::CommandEncoder,
                  view: &wgpu::TextureView| {
                ui_manager.draw(device, queue, encoder, window, view, |ui| {
                    panel::viewer(ui, scene, picker.last_pick());
                    if let Some(callback) = ui_callback.as_mut() {
                        callback(ui, scene);
                    }
                });
            }
        });

        if let Err(e) = render_engine.render_frame(overlay) {
            self.fail(event_loop, e);
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let (width, height) = window.inner_size().into();
        let renderer = match pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            &self.config,
        )) {
            Ok(renderer) => renderer,
            Err(e) => {
                self.fail(event_loop, e);
                return;
            }
        };
        info!("window {width}x{height}, surface format {:?}", renderer.surface_format());

        self.scene.camera.set_aspect(width, height);

        if self.config.show_ui {
            let mut ui_manager = UiManager::new(
                renderer.device(),
                renderer.queue(),
                renderer.surface_format(),
                &window,
            );
            ui_manager.update_display_size(width, height);
            self.ui_manager = Some(ui_manager);
        }

        self.render_engine = Some(renderer);
        self.window = Some(window);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI gets first refusal on input
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_input(&window, window_id, &event) {
                self.controller.process_button(winit::event::MouseButton::Left, ElementState::Released);
                if let WindowEvent::CursorMoved { position, .. } = event {
                    self.controller.track_cursor(position.x, position.y);
                }
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key_code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyV => {
                    self.config.vsync = !self.config.vsync;
                    if let Some(render_engine) = self.render_engine.as_mut() {
                        render_engine.set_vsync(self.config.vsync);
                    }
                    info!("vsync {}", if self.config.vsync { "on" } else { "off" });
                }
                _ => {}
            },
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene.camera.set_aspect(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if self.controller.process_button(button, state) {
                    self.pick_under_cursor();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.controller
                    .process_cursor(position.x, position.y, &mut self.scene.camera);
            }
            WindowEvent::CursorLeft { .. } => self.controller.cursor_left(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
