// The sketch pad as the window sees it: commands in, frames out.
// main.rs samples the window and turns keys/mouse into `Command`s; everything
// else (async file loads, uploads, HUD text) is handled here so it can be
// driven without a window.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, HUD_BAND, surface_size_for_viewport};
use crate::draw::{draw_text_5x7, fill_rows};
use crate::error::Result;
use crate::export;
use crate::input::{FileInput, FileLoader, PointerEvent};
use crate::raster;
use crate::surface::SceneSurface;
use crate::transport::{HttpGateway, Uploader};
use crate::types::FrameBuffer;

const BACKDROP: u32 = 0x0030_3030;
const HUD_BG: u32 = 0x0018_1818;
const HUD_FG: u32 = 0x00FF_FFFF;
const HUD_OK: u32 = 0x0066_DD66;
const HUD_ERR: u32 = 0x00FF_6655;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Draw,
    Erase,
    Clear,
    Upload,
    Save,
    Pointer(PointerEvent),
    Viewport(usize, usize),
    OpenFile(PathBuf),
}

pub struct App {
    surface: SceneSurface,
    uploader: Option<Uploader>,
    files: FileInput,
    loader: FileLoader,
    output: PathBuf,
    pixel_ratio: f32,
    viewport: (usize, usize),
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let uploader = match &config.endpoint {
            Some(url) => {
                let gateway = HttpGateway::new(url.clone(), config.upload_timeout())?;
                Some(Uploader::new(Arc::new(gateway)))
            }
            None => None,
        };
        let mut app = Self::with_uploader(config, uploader);
        if let Some(path) = &config.image {
            app.handle(Command::OpenFile(path.clone()))?;
        }
        Ok(app)
    }

    /// Build with an explicit uploader (or none).
    pub fn with_uploader(config: &Config, uploader: Option<Uploader>) -> Self {
        Self {
            surface: SceneSurface::new(config.surface()),
            uploader,
            files: FileInput::default(),
            loader: FileLoader::new(),
            output: config.output.clone(),
            pixel_ratio: config.pixel_ratio,
            viewport: (config.width, config.height),
        }
    }

    pub fn surface(&self) -> &SceneSurface {
        &self.surface
    }

    pub fn file_input(&self) -> &FileInput {
        &self.files
    }

    pub fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Draw => self.surface.set_draw_mode(),
            Command::Erase => self.surface.set_erase_mode(),
            Command::Clear => {
                self.surface.clear();
                self.files.reset();
            }
            Command::Pointer(PointerEvent::Down(p)) => self.surface.on_pointer_down(p),
            Command::Pointer(PointerEvent::Move(p)) => self.surface.on_pointer_move(p),
            Command::Pointer(PointerEvent::Up) => self.surface.on_pointer_up(),
            Command::Viewport(w, h) => {
                if self.viewport != (w, h) {
                    self.viewport = (w, h);
                    let (sw, sh) = surface_size_for_viewport(w, h);
                    self.surface.resize(sw, sh);
                }
            }
            Command::OpenFile(path) => {
                log::debug!("loading {}", path.display());
                self.files.select(path.clone());
                self.loader.request(path);
            }
            Command::Upload => match self.uploader.as_mut() {
                Some(uploader) => {
                    let raster = self.surface.rasterize(1.0)?;
                    uploader.submit(raster.to_data_uri());
                }
                None => log::warn!("upload requested but no endpoint is configured"),
            },
            Command::Save => {
                let raster = self.surface.rasterize(self.pixel_ratio)?;
                export::save_bytes(&self.output, raster.png())?;
            }
        }
        Ok(())
    }

    /// Apply finished background work. Returns true if anything changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;

        while let Some((path, loaded)) = self.loader.poll() {
            changed = true;
            // the same file may be picked again right away
            self.files.reset();
            let inserted = loaded.and_then(|source| self.surface.insert_image(source));
            if let Err(e) = inserted {
                log::warn!("could not use {}: {e}", path.display());
            }
        }

        if let Some(uploader) = self.uploader.as_mut() {
            while let Some(outcome) = uploader.poll() {
                changed = true;
                self.surface.record_upload(&outcome);
            }
        }
        changed
    }

    /// True once after the scene content or geometry changed.
    pub fn take_redraw(&mut self) -> bool {
        self.surface.take_redraw()
    }

    pub fn uploads_in_flight(&self) -> usize {
        self.uploader.as_ref().map_or(0, Uploader::in_flight)
    }

    /// Mode/help line and status line for the HUD.
    pub fn hud_lines(&self) -> (String, Option<(String, u32)>) {
        let mode = format!(
            "MODE: {} | D DRAW  E ERASE  C CLEAR  U UPLOAD  S SAVE  ESC QUIT",
            self.surface.mode().label()
        );
        let status = self.surface.status();
        let second = if let Some(msg) = status.error_message() {
            Some((msg.to_string(), HUD_ERR))
        } else if status.success() {
            Some(("Image was sent.".to_string(), HUD_OK))
        } else if self.uploads_in_flight() > 0 {
            Some(("Sending...".to_string(), HUD_FG))
        } else {
            None
        };
        (mode, second)
    }

    /// Paint the whole window: surface at the top-left, HUD band at the bottom.
    pub fn render_frame(&self, frame: &mut FrameBuffer) -> Result<()> {
        frame.pixels.fill(BACKDROP);
        let pixmap = self.surface.render(1.0)?;
        raster::present(&pixmap, frame);

        let band_top = frame.height.saturating_sub(HUD_BAND);
        fill_rows(frame, band_top, frame.height, HUD_BG);
        let (mode, status) = self.hud_lines();
        draw_text_5x7(frame, 6, band_top as i32 + 3, &mode, HUD_FG);
        if let Some((text, color)) = status {
            draw_text_5x7(frame, 6, band_top as i32 + 13, &text, color);
        }
        Ok(())
    }
}
