use std::path::PathBuf;
use std::time::Instant;

use glam::Vec4;
use glsandbox_core::abs::{BackgroundRenderer, ShaderProgram};
use glsandbox_core::gpu::Gpu;
use glsandbox_core::{FramebufferSize, GraphicsEngine};

use crate::app::App;
use crate::config::SandboxConfig;
use crate::input::{Action, KeyboardState};
use crate::scene::Scene;

mod app;
mod config;
mod input;
mod scene;

/// Environment variable holding the log level filter, e.g. `debug`.
const LOG_ENV: &str = "GLSANDBOX_LOG";

fn setup_logger() -> Result<(), log::SetLoggerError> {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|level| level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

fn main() {
    if let Err(e) = setup_logger() {
        eprintln!("Failed to set up logging: {}", e);
    }

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = SandboxConfig::load(config_path.as_deref())?;

    let mut app = App::new(
        &config.window.title,
        config.window.width,
        config.window.height,
        config.window.vsync,
    )?;

    let (width, height) = app.drawable_size();
    app.gl.viewport(0, 0, width, height);

    let size = FramebufferSize::new(width, height);
    let mut engine =
        GraphicsEngine::new(&app.gl, size, &config.engine).map_err(|e| e.to_string())?;

    let background = match &config.background_shader {
        Some(path) => {
            let shader = ShaderProgram::from_file(&app.gl, path).map_err(|e| e.to_string())?;
            Some(BackgroundRenderer::new(&app.gl, shader).map_err(|e| e.to_string())?)
        }
        None => None,
    };

    let mut scene = Scene::new(&config.object_texture, Vec4::from_array(config.clear_color));
    scene.populate(&mut engine)?;

    log::info!(
        "Controls: Tab select, arrows move, Q/E rotation speed, 1/2 object brightness, \
         3/4 background brightness, N quad, C cube, F face cube, Delete remove, R reset, Esc quit"
    );

    let mut keyboard = KeyboardState::default();
    let mut actions = Vec::new();
    let mut last_frame_time = Instant::now();

    'running: loop {
        let now = Instant::now();
        let delta_time = now.duration_since(last_frame_time).as_secs_f32();
        last_frame_time = now;

        keyboard.begin_frame();
        for event in app.event_pump.poll_iter() {
            match event {
                sdl2::event::Event::Quit { .. } => break 'running,
                sdl2::event::Event::Window {
                    win_event: sdl2::event::WindowEvent::SizeChanged(..),
                    ..
                } => {
                    // Event sizes are logical; the viewport needs pixels.
                    let (width, height) = app.window.drawable_size();
                    app.gl.viewport(0, 0, width as i32, height as i32);
                }
                sdl2::event::Event::KeyDown {
                    keycode: Some(keycode),
                    repeat: false,
                    ..
                } => {
                    keyboard.key_down(keycode);
                    actions.extend(Action::from_keycode(keycode));
                }
                sdl2::event::Event::KeyUp {
                    keycode: Some(keycode),
                    ..
                } => keyboard.key_up(keycode),
                _ => {}
            }
        }

        for action in actions.drain(..) {
            if !scene.apply(action, &mut engine)? {
                break 'running;
            }
        }
        scene.update(&keyboard, delta_time, engine.projection());

        engine.clear(scene.background_clear_color());
        if let Some(background) = &background {
            background
                .draw(scene.background_brightness)
                .map_err(|e| e.to_string())?;
        }
        scene.draw(&engine)?;

        app.window.gl_swap_window();
    }

    log::info!("Shutting down");
    Ok(())
}
