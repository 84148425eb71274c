use anyhow::{anyhow, bail, Context, Result};
use eframe::egui;
use log::info;
use std::io::Read;

use crate::app::{ImageSource, ViewerApp};
use crate::config::Config;
use crate::file_list::FileSet;
use crate::image_util::decode_bytes;
use crate::{Status, APP_NAME};

/// Entry point of the image viewer.
///
/// Blocks until the viewer exits. Returns `false` on failure; the viewer
/// reports its own errors.
pub trait Viewer {
    fn run(&mut self, config: &Config, files: &FileSet) -> bool;
}

/// Runs the viewer once and maps its result to the process status.
pub fn dispatch<V: Viewer + ?Sized>(viewer: &mut V, config: &Config, files: &FileSet) -> Status {
    if viewer.run(config, files) {
        Status::Success
    } else {
        Status::Failure
    }
}

/// Window based viewer built on eframe.
#[derive(Debug, Default)]
pub struct EguiViewer;

impl Viewer for EguiViewer {
    fn run(&mut self, config: &Config, files: &FileSet) -> bool {
        match run_window(config, files) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("{e:#}");
                false
            }
        }
    }
}

fn run_window(config: &Config, files: &FileSet) -> Result<()> {
    let sources = match files {
        FileSet::Stdin => vec![read_stdin()?],
        FileSet::List(list) => list.files().iter().cloned().map(ImageSource::File).collect(),
    };

    let mut viewport = egui::ViewportBuilder::default()
        .with_app_id(config.app_id())
        .with_title(APP_NAME)
        .with_fullscreen(config.fullscreen);
    if let Some(geometry) = config.geometry {
        viewport = viewport
            .with_position([geometry.x as f32, geometry.y as f32])
            .with_inner_size([geometry.width as f32, geometry.height as f32]);
    }
    if config.sway_wm {
        info!("Sway integration enabled");
    }

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    let config = config.clone();
    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, &config, sources)))),
    )
    .map_err(|e| anyhow!(e.to_string()))
    .context("Failed to run viewer window")
}

fn read_stdin() -> Result<ImageSource> {
    read_image(std::io::stdin().lock(), "stdin")
}

/// Reads a whole image stream and decodes it.
fn read_image(mut reader: impl Read, name: &str) -> Result<ImageSource> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read {name}"))?;
    if bytes.is_empty() {
        bail!("No data on {name}");
    }
    info!("Read {} bytes from {name}", bytes.len());
    let rgba = decode_bytes(&bytes, name)?;
    Ok(ImageSource::Decoded {
        name: name.to_string(),
        rgba,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    struct Fixed(bool);

    impl Viewer for Fixed {
        fn run(&mut self, _config: &Config, _files: &FileSet) -> bool {
            self.0
        }
    }

    #[test]
    fn empty_stream_is_rejected() {
        let err = read_image(Cursor::new(Vec::<u8>::new()), "stdin").unwrap_err();
        assert_eq!(err.to_string(), "No data on stdin");
    }

    #[test]
    fn undecodable_stream_is_rejected() {
        let err = read_image(Cursor::new(b"garbage".to_vec()), "stdin").unwrap_err();
        assert!(format!("{err:#}").contains("stdin"), "{err:#}");
    }

    #[test]
    fn png_stream_is_decoded() {
        let img: RgbaImage = ImageBuffer::from_pixel(5, 3, Rgba([0, 0, 255, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

        match read_image(Cursor::new(bytes), "stdin").unwrap() {
            ImageSource::Decoded { name, rgba } => {
                assert_eq!(name, "stdin");
                assert_eq!(rgba.dimensions(), (5, 3));
            }
            ImageSource::File(path) => panic!("unexpected file source {}", path.display()),
        }
    }

    #[test]
    fn dispatch_maps_result() {
        let cfg = Config::default();
        assert_eq!(dispatch(&mut Fixed(true), &cfg, &FileSet::Stdin), Status::Success);
        assert_eq!(dispatch(&mut Fixed(false), &cfg, &FileSet::Stdin), Status::Failure);
    }
}
