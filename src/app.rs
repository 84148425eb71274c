use anyhow::Result;
use eframe::egui;
use egui::TextureHandle;
use image::RgbaImage;
use log::{debug, warn};
use std::path::PathBuf;

use crate::config::{Config, ScaleMode};
use crate::image_util::{load_image_rgba, rgba_to_texture};
use crate::APP_NAME;

/// One entry of the viewer's image list.
#[derive(Debug)]
pub enum ImageSource {
    File(PathBuf),
    /// Already decoded, e.g. read from standard input.
    Decoded { name: String, rgba: RgbaImage },
}

impl ImageSource {
    fn name(&self) -> String {
        match self {
            ImageSource::File(path) => path.display().to_string(),
            ImageSource::Decoded { name, .. } => name.clone(),
        }
    }

    fn load(&self) -> Result<RgbaImage> {
        match self {
            ImageSource::File(path) => load_image_rgba(path),
            ImageSource::Decoded { rgba, .. } => Ok(rgba.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nav {
    Next,
    Prev,
    First,
    Last,
}

fn navigate(current: usize, len: usize, nav: Nav) -> usize {
    let last = len.saturating_sub(1);
    match nav {
        Nav::Next => (current + 1).min(last),
        Nav::Prev => current.saturating_sub(1),
        Nav::First => 0,
        Nav::Last => last,
    }
}

/// Scale factor for an image of `image` size shown in `avail` space.
fn display_scale(mode: ScaleMode, image: egui::Vec2, avail: egui::Vec2) -> f32 {
    if image.x <= 0.0 || image.y <= 0.0 {
        return 1.0;
    }
    let fit = (avail.x / image.x).min(avail.y / image.y);
    match mode {
        ScaleMode::Default => fit.min(1.0),
        ScaleMode::Fit => fit,
        ScaleMode::Real => 1.0,
    }
}

pub struct ViewerApp {
    sources: Vec<ImageSource>,
    index: usize,
    /// Index the texture (or error) below belongs to.
    loaded: Option<usize>,
    texture: Option<TextureHandle>,
    load_error: Option<String>,
    scale: ScaleMode,
    background: Option<egui::Color32>,
    show_info: bool,
    is_fullscreen: bool,
}

impl ViewerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: &Config,
        sources: Vec<ImageSource>,
    ) -> Self {
        Self {
            sources,
            index: 0,
            loaded: None,
            texture: None,
            load_error: None,
            scale: config.scale,
            background: config
                .background
                .map(|rgb| egui::Color32::from_rgb(rgb.r, rgb.g, rgb.b)),
            show_info: config.show_info,
            is_fullscreen: config.fullscreen,
        }
    }

    fn load_current(&mut self, ctx: &egui::Context) {
        let Some(source) = self.sources.get(self.index) else {
            return;
        };
        let name = source.name();
        debug!("Loading {name}");
        match source.load() {
            Ok(rgba) => {
                let tex_name = format!("{APP_NAME}_image_{}", self.index);
                self.texture = Some(rgba_to_texture(ctx, &tex_name, rgba));
                self.load_error = None;
            }
            Err(e) => {
                warn!("{e:#}");
                self.texture = None;
                self.load_error = Some(format!("Unable to load {name}"));
            }
        }
        self.loaded = Some(self.index);
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(format!("{APP_NAME}: {name}")));
    }

    fn info_line(&self) -> String {
        let name = self.sources.get(self.index).map(ImageSource::name).unwrap_or_default();
        let size = match &self.texture {
            Some(tex) => format!("{}x{}", tex.size()[0], tex.size()[1]),
            None => "?".to_string(),
        };
        format!("{}  |  {}  |  {}/{}", name, size, self.index + 1, self.sources.len())
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let input = ctx.input(|i| i.clone());
        let pressed = |keys: &[egui::Key]| keys.iter().any(|k| input.key_pressed(*k));

        let nav = if pressed(&[egui::Key::ArrowRight, egui::Key::Space, egui::Key::PageDown]) {
            Some(Nav::Next)
        } else if pressed(&[egui::Key::ArrowLeft, egui::Key::Backspace, egui::Key::PageUp]) {
            Some(Nav::Prev)
        } else if pressed(&[egui::Key::Home]) {
            Some(Nav::First)
        } else if pressed(&[egui::Key::End]) {
            Some(Nav::Last)
        } else {
            None
        };
        if let Some(nav) = nav {
            self.index = navigate(self.index, self.sources.len(), nav);
        }

        if pressed(&[egui::Key::I]) {
            self.show_info = !self.show_info;
        }
        if pressed(&[egui::Key::F]) {
            self.is_fullscreen = !self.is_fullscreen;
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.is_fullscreen));
        }
        if pressed(&[egui::Key::Escape, egui::Key::Q]) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_input(ctx);
        if self.loaded != Some(self.index) {
            self.load_current(ctx);
        }

        if self.show_info {
            egui::TopBottomPanel::top("info").show(ctx, |ui| {
                ui.label(self.info_line());
            });
        }

        let mut frame = egui::Frame::central_panel(&ctx.style());
        if let Some(color) = self.background {
            frame = frame.fill(color);
        }
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            if let Some(tex) = &self.texture {
                let tex_size = tex.size_vec2();
                let scale = display_scale(self.scale, tex_size, ui.available_size());
                let image = egui::Image::new(tex).fit_to_exact_size(tex_size * scale);
                if self.scale == ScaleMode::Real {
                    egui::ScrollArea::both().show(ui, |ui| ui.add(image));
                } else {
                    ui.centered_and_justified(|ui| ui.add(image));
                }
            } else if let Some(err) = &self.load_error {
                ui.centered_and_justified(|ui| ui.label(err));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_is_clamped() {
        assert_eq!(navigate(0, 3, Nav::Next), 1);
        assert_eq!(navigate(2, 3, Nav::Next), 2);
        assert_eq!(navigate(0, 3, Nav::Prev), 0);
        assert_eq!(navigate(2, 3, Nav::Prev), 1);
        assert_eq!(navigate(1, 3, Nav::First), 0);
        assert_eq!(navigate(1, 3, Nav::Last), 2);
        assert_eq!(navigate(0, 1, Nav::Next), 0);
    }

    #[test]
    fn scale_modes() {
        let big = egui::vec2(2000.0, 1000.0);
        let small = egui::vec2(100.0, 50.0);
        let window = egui::vec2(1000.0, 1000.0);

        assert_eq!(display_scale(ScaleMode::Default, big, window), 0.5);
        assert_eq!(display_scale(ScaleMode::Default, small, window), 1.0);
        assert_eq!(display_scale(ScaleMode::Fit, big, window), 0.5);
        assert_eq!(display_scale(ScaleMode::Fit, small, window), 10.0);
        assert_eq!(display_scale(ScaleMode::Real, big, window), 1.0);
        assert_eq!(display_scale(ScaleMode::Fit, egui::vec2(0.0, 0.0), window), 1.0);
    }

    #[test]
    fn decoded_source_loads_without_io() {
        let rgba = RgbaImage::new(4, 4);
        let source = ImageSource::Decoded {
            name: "stdin".to_string(),
            rgba,
        };
        assert_eq!(source.name(), "stdin");
        assert_eq!(source.load().unwrap().dimensions(), (4, 4));

        let missing = ImageSource::File(PathBuf::from("/nonexistent/a.png"));
        assert!(missing.load().is_err());
    }
}
