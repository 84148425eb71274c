use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use directories::ProjectDirs;
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::APP_NAME;

/// Initial image scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScaleMode {
    /// Fit to window, but never enlarge past 100%
    #[default]
    Default,
    /// Fit to window size
    Fit,
    /// Real image size
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

fn color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#?([[:xdigit:]]{6})$").expect("color pattern is valid"))
}

fn geometry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*$")
            .expect("geometry pattern is valid")
    })
}

/// Viewer configuration, filled from the config file and the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub fullscreen: bool,
    /// Integration with Sway WM
    pub sway_wm: bool,
    pub scale: ScaleMode,
    pub background: Option<Rgb>,
    pub geometry: Option<Geometry>,
    pub show_info: bool,
    pub app_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fullscreen: false,
            sway_wm: true,
            scale: ScaleMode::Default,
            background: None,
            geometry: None,
            show_info: false,
            app_id: None,
        }
    }
}

impl Config {
    /// Fullscreen mode excludes window manager integration.
    pub fn set_fullscreen(&mut self) {
        self.fullscreen = true;
        self.sway_wm = false;
    }

    pub fn set_scale(&mut self, value: &str) -> Result<()> {
        match <ScaleMode as ValueEnum>::from_str(value, false) {
            Ok(scale) => {
                self.scale = scale;
                Ok(())
            }
            Err(_) => {
                let names: Vec<String> = ScaleMode::value_variants()
                    .iter()
                    .filter_map(|v| v.to_possible_value())
                    .map(|v| v.get_name().to_string())
                    .collect();
                bail!("Invalid scale: {value}, expected one of: {}", names.join(", "))
            }
        }
    }

    /// Accepts `RRGGBB` with an optional leading `#`.
    pub fn set_background(&mut self, value: &str) -> Result<()> {
        let hex = color_regex()
            .captures(value)
            .and_then(|cap| cap.get(1))
            .ok_or_else(|| anyhow!("Invalid background color: {value}"))?;
        let rgb = u32::from_str_radix(hex.as_str(), 16)
            .with_context(|| format!("Invalid background color: {value}"))?;
        self.background = Some(Rgb {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        });
        Ok(())
    }

    /// Accepts `X,Y,W,H`; width and height must be positive.
    pub fn set_geometry(&mut self, value: &str) -> Result<()> {
        let cap = geometry_regex()
            .captures(value)
            .ok_or_else(|| anyhow!("Invalid window geometry: {value}"))?;
        let invalid = || format!("Invalid window geometry: {value}");
        let geometry = Geometry {
            x: cap[1].parse().with_context(invalid)?,
            y: cap[2].parse().with_context(invalid)?,
            width: cap[3].parse().with_context(invalid)?,
            height: cap[4].parse().with_context(invalid)?,
        };
        if geometry.width == 0 || geometry.height == 0 {
            bail!("Invalid window geometry: {value}");
        }
        self.geometry = Some(geometry);
        Ok(())
    }

    pub fn set_app_id(&mut self, value: &str) -> Result<()> {
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            bail!("Invalid window class: '{value}'");
        }
        self.app_id = Some(value.to_string());
        Ok(())
    }

    /// Window class, falling back to the application name.
    pub fn app_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or(APP_NAME)
    }

    /// Cross-field normalization, run once after the command line is parsed.
    pub fn check(&mut self) {
        let sway_available = std::env::var_os("SWAYSOCK").is_some();
        self.normalize(sway_available);
    }

    fn normalize(&mut self, sway_available: bool) {
        if self.fullscreen {
            self.sway_wm = false;
            if self.geometry.take().is_some() {
                warn!("Window geometry is ignored in full screen mode");
            }
        }
        if self.sway_wm && !sway_available {
            debug!("SWAYSOCK is not set, Sway integration disabled");
            self.sway_wm = false;
        }
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(sway) = file.sway {
            self.sway_wm = sway;
        }
        if file.fullscreen == Some(true) {
            self.set_fullscreen();
        }
        if let Some(info) = file.info {
            self.show_info = info;
        }
        let values: [(&str, Option<String>, fn(&mut Self, &str) -> Result<()>); 4] = [
            ("scale", file.scale, Self::set_scale),
            ("background", file.background, Self::set_background),
            ("geometry", file.geometry, Self::set_geometry),
            ("app_id", file.app_id, Self::set_app_id),
        ];
        for (key, value, setter) in values {
            if let Some(value) = value {
                if let Err(e) = setter(self, &value) {
                    warn!("Config key '{key}' ignored: {e}");
                }
            }
        }
    }

    pub fn from_toml_str(txt: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(txt).context("Failed to parse config TOML")?;
        let mut cfg = Self::default();
        cfg.apply_file(file);
        Ok(cfg)
    }
}

/// On-disk representation; values are validated by the `Config` setters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    fullscreen: Option<bool>,
    sway: Option<bool>,
    scale: Option<String>,
    background: Option<String>,
    geometry: Option<String>,
    info: Option<bool>,
    app_id: Option<String>,
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return Ok(Config::default());
    }
    let txt = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let cfg = Config::from_toml_str(&txt)?;
    debug!("Loaded config from {}", path.display());
    Ok(cfg)
}

pub fn config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(proj.config_dir().join("config.toml"))
}
