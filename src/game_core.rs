use crate::game_timer::{format_caption, FrameStats, GameTimer};
use crate::graphics::{self, Context};
use crate::mesh;
use crate::ContextParams;

use log::{info, trace};
use thiserror::Error;

use winit::dpi::PhysicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::desktop::EventLoopExtDesktop;
use winit::window::WindowBuilder;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Graphics(#[from] graphics::Error),
    #[error(transparent)]
    Mesh(#[from] mesh::obj::Error),
}

/// Application hooks driven by `GameCore`.
pub trait GameApp {
    /// Creates GPU resources once the context exists.
    fn activate(&mut self, context: &mut Context) -> Result<(), graphics::Error>;
    fn deactivate(&mut self);
    fn update(&mut self, timer: &GameTimer, context: &Context);
    /// Records draw commands between `Context::clear` and `Context::present`.
    fn render(&mut self, context: &Context);

    fn on_mouse_down(&mut self, _button: MouseButton, _x: f32, _y: f32) {}
    fn on_mouse_up(&mut self, _button: MouseButton) {}
    fn on_mouse_move(&mut self, _x: f32, _y: f32) {}
    fn on_key_down(&mut self, _key: VirtualKeyCode) {}
    fn on_resize(&mut self, _width: u32, _height: u32) {}
}

pub struct GameCore<A: GameApp> {
    app: A,
}

impl<A: GameApp> GameCore<A> {
    pub fn new(app: A) -> Self {
        GameCore { app }
    }

    /// Opens the window and runs the frame loop until the window closes or an error occurs.
    pub fn run(mut self, params: &ContextParams) -> Result<(), Error> {
        let mut event_loop = EventLoop::new();
        let window = WindowBuilder::new()
            .with_title(&params.window_title)
            .with_inner_size(PhysicalSize::new(params.window_width, params.window_height))
            .with_min_inner_size(PhysicalSize::new(1, 1))
            .build(&event_loop)?;

        let mut context = Context::new(&window, params)?;
        info!("Rendering on '{}'.", context.adapter_info().description);

        let app = &mut self.app;
        app.activate(&mut context)?;

        let mut timer = GameTimer::new();
        let mut frame_stats = FrameStats::new();
        timer.reset();

        let mut focused = true;
        let mut minimized = false;
        let mut cursor = (0.0f32, 0.0f32);
        let mut result = Ok(());

        event_loop.run_return(|event, _, control_flow| {
            match event {
                Event::WindowEvent { event, window_id } if window_id == window.id() => {
                    match event {
                        WindowEvent::CloseRequested => {
                            info!("Window was closed, exiting.");
                            *control_flow = ControlFlow::Exit;
                        }
                        WindowEvent::KeyboardInput {
                            input:
                                KeyboardInput {
                                    state: ElementState::Pressed,
                                    virtual_keycode: Some(key),
                                    ..
                                },
                            ..
                        } => {
                            if key == VirtualKeyCode::Escape {
                                info!("Escape key pressed, exiting.");
                                *control_flow = ControlFlow::Exit;
                            } else {
                                app.on_key_down(key);
                            }
                        }
                        WindowEvent::Resized(size) => {
                            minimized = size.width == 0 || size.height == 0;
                            if !minimized {
                                trace!("Window resized to {}x{}.", size.width, size.height);
                                if let Err(e) = context.on_window_resized(size.width, size.height)
                                {
                                    result = Err(e.into());
                                    *control_flow = ControlFlow::Exit;
                                    return;
                                }
                                app.on_resize(size.width, size.height);
                            }
                            sync_timer(&mut timer, focused && !minimized);
                        }
                        WindowEvent::Focused(is_focused) => {
                            focused = is_focused;
                            sync_timer(&mut timer, focused && !minimized);
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            cursor = (position.x as f32, position.y as f32);
                            app.on_mouse_move(cursor.0, cursor.1);
                        }
                        WindowEvent::MouseInput { state, button, .. } => match state {
                            ElementState::Pressed => app.on_mouse_down(button, cursor.0, cursor.1),
                            ElementState::Released => app.on_mouse_up(button),
                        },
                        _ => {}
                    }
                }
                Event::MainEventsCleared => {
                    timer.tick();

                    let active = focused && !minimized;
                    *control_flow = frame_control_flow(*control_flow, active);
                    if !active {
                        return;
                    }

                    if let Some(sample) = frame_stats.record_frame(timer.total_time()) {
                        window.set_title(&format_caption(&params.window_title, sample));
                    }

                    if let Err(e) = Self::frame(app, &mut context, &timer) {
                        result = Err(e.into());
                        *control_flow = ControlFlow::Exit;
                    }
                }
                _ => {}
            }
        });

        self.app.deactivate();
        result
    }

    fn frame(app: &mut A, context: &mut Context, timer: &GameTimer) -> Result<(), graphics::Error> {
        app.update(timer, context);

        context.prepare()?;
        context.clear();
        app.render(context);
        context.present()
    }
}

/// Polls while the window is active and sleeps until the next event otherwise.
///
/// An exit request made earlier in the same iteration is kept.
fn frame_control_flow(current: ControlFlow, active: bool) -> ControlFlow {
    match current {
        ControlFlow::Exit => ControlFlow::Exit,
        _ if active => ControlFlow::Poll,
        _ => ControlFlow::Wait,
    }
}

/// Keeps the timer running only while the window is active.
fn sync_timer(timer: &mut GameTimer, active: bool) {
    if active {
        timer.start();
    } else {
        timer.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_window_waits_for_events() {
        assert_eq!(frame_control_flow(ControlFlow::Poll, false), ControlFlow::Wait);
        assert_eq!(frame_control_flow(ControlFlow::Wait, false), ControlFlow::Wait);
    }

    #[test]
    fn active_window_polls_again_after_a_pause() {
        assert_eq!(frame_control_flow(ControlFlow::Wait, true), ControlFlow::Poll);
        assert_eq!(frame_control_flow(ControlFlow::Poll, true), ControlFlow::Poll);
    }

    #[test]
    fn exit_request_is_kept() {
        assert_eq!(frame_control_flow(ControlFlow::Exit, true), ControlFlow::Exit);
        assert_eq!(frame_control_flow(ControlFlow::Exit, false), ControlFlow::Exit);
    }
}
