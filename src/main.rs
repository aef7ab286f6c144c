// What you SEE:
// • A white sketch surface in the top-left, a status strip along the bottom.
// • D arms the pen, E arms the eraser; hold Left Mouse to draw with it.
// • C clears everything, S saves a 3x PNG, U uploads (needs --endpoint).
// • Type an image path into the terminal to place it as the background. ESC quits.

use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use clap::Parser;
use minifb::Key;

use sketchpad::app::{App, Command};
use sketchpad::config::Config;
use sketchpad::draw::Drawer;
use sketchpad::input::{PointerTracker, spawn_stdin_paths};
use sketchpad::types::FrameBuffer;
use sketchpad::SketchError;

const KEYMAP: [(Key, Command); 5] = [
    (Key::D, Command::Draw),
    (Key::E, Command::Erase),
    (Key::C, Command::Clear),
    (Key::U, Command::Upload),
    (Key::S, Command::Save),
];

fn main() -> Result<(), SketchError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let mut app = App::new(&config)?;
    let mut drawer = Drawer::new("Sketch Pad", config.width, config.height)?;
    let picked: Receiver<PathBuf> = spawn_stdin_paths();
    let mut pointer = PointerTracker::new();

    let (w, h) = drawer.size();
    let mut frame = FrameBuffer::filled(w, h, 0);
    let mut dirty = true;

    log::info!("ready: D draw, E erase, C clear, U upload, S save; type an image path to load it");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        // 1) Viewport: a new window size means a new frame buffer, and maybe a new surface size.
        let (w, h) = drawer.size();
        if (w, h) != (frame.width, frame.height) {
            frame = FrameBuffer::filled(w, h, 0);
            app.handle(Command::Viewport(w, h))?;
            dirty = true;
        }

        // 2) Keys
        for (key, command) in &KEYMAP {
            if drawer.key_pressed_once(*key) {
                // a failed save/upload is logged; drawing carries on
                if let Err(e) = app.handle(command.clone()) {
                    log::error!("{command:?} failed: {e}");
                }
                dirty = true;
            }
        }

        // 3) Files typed on stdin
        while let Ok(path) = picked.try_recv() {
            app.handle(Command::OpenFile(path))?;
        }

        // 4) Pointer
        let bounds = app.surface().dimensions();
        if let Some(event) = pointer.update(drawer.left_mouse_down(), drawer.mouse_pos(), bounds) {
            app.handle(Command::Pointer(event))?;
        }

        // 5) Finished decodes / uploads
        if app.pump() || app.take_redraw() {
            dirty = true;
        }

        // 6) Repaint only when something changed; minifb still needs an update to pump events.
        if dirty {
            app.render_frame(&mut frame)?;
            dirty = false;
        }
        drawer.present(&frame)?;
    }

    Ok(())
}
