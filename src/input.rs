// Input adapters: polled mouse state -> pointer events, and file selection -> decoded images.
// Visual: nothing here draws; these feed the surface the same way a browser feeds a canvas.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::error::Result;
use crate::media::ImageSource;
use crate::types::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
}

/// Turns "is the button held, where is the cursor" samples into down/move/up.
#[derive(Debug, Default)]
pub struct PointerTracker {
    button: bool,    // raw button state at the previous sample
    capturing: bool, // a press started inside the surface and is still held
    last: Option<Point>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample. `pos` is surface-local; `None` when the cursor is outside the window.
    pub fn update(&mut self, button_down: bool, pos: Option<Point>, bounds: (u32, u32)) -> Option<PointerEvent> {
        let pressed_now = button_down && !self.button;
        let released_now = !button_down && self.button;
        self.button = button_down;

        if released_now && self.capturing {
            self.capturing = false;
            self.last = None;
            return Some(PointerEvent::Up);
        }

        let p = pos?;
        if pressed_now && inside(p, bounds) {
            self.capturing = true;
            self.last = Some(p);
            return Some(PointerEvent::Down(p));
        }

        if self.capturing && button_down && self.last != Some(p) {
            self.last = Some(p);
            return Some(PointerEvent::Move(p));
        }
        None
    }
}

fn inside(p: Point, (w, h): (u32, u32)) -> bool {
    p.x >= 0.0 && p.y >= 0.0 && p.x < w as f32 && p.y < h as f32
}

/// The adapter's "file input control". Cleared after every read and on clear,
/// so picking the same file again still triggers a load.
#[derive(Debug, Default)]
pub struct FileInput {
    selected: Option<PathBuf>,
}

impl FileInput {
    pub fn select(&mut self, path: PathBuf) {
        self.selected = Some(path);
    }

    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    pub fn reset(&mut self) {
        self.selected = None;
    }
}

/// Reads and decodes files off the window thread.
/// Results arrive in completion order, which is the order they join the scene.
pub struct FileLoader {
    tx: Sender<(PathBuf, Result<ImageSource>)>,
    rx: Receiver<(PathBuf, Result<ImageSource>)>,
}

impl FileLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn request(&self, path: PathBuf) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let source = ImageSource::from_path(&path);
            let _ = tx.send((path, source));
        });
    }

    pub fn poll(&self) -> Option<(PathBuf, Result<ImageSource>)> {
        self.rx.try_recv().ok()
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// One path per stdin line; blank lines are skipped.
pub fn spawn_stdin_paths() -> Receiver<PathBuf> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if tx.send(PathBuf::from(trimmed)).is_err() {
                break;
            }
        }
    });
    rx
}
