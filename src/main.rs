mod app;
mod cli;
mod config;
mod file_list;
mod image_util;
mod options;
mod viewer;

use log::{debug, info, warn, Level};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use crate::cli::{parse_cmdline, ParseOutcome};
use crate::config::{load_config, Config};
use crate::file_list::{select_files, FileSet};
use crate::viewer::{dispatch, EguiViewer, Viewer};

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log level (error, warn, info, debug, trace).
const LOG_ENV: &str = "SWAYVIEW_LOG";

/// Final state of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::FAILURE,
        }
    }
}

fn main() -> ExitCode {
    let log_level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::Warn);
    if let Err(e) = stderrlog::new()
        .module(module_path!())
        .verbosity(log_level as usize - 1)
        .init()
    {
        eprintln!("Unable to initialize logging: {e}");
    }

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    let cfg = load_config().unwrap_or_else(|e| {
        warn!("{e:#}");
        Config::default()
    });

    let status = run(
        cfg,
        &args,
        Path::new("."),
        &mut EguiViewer,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    );
    status.into()
}

/// Parses the command line, resolves the input files and starts the viewer.
///
/// `default_dir` is enumerated when no files are given.
fn run(
    mut cfg: Config,
    args: &[OsString],
    default_dir: &Path,
    viewer: &mut impl Viewer,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Status {
    let index = match parse_cmdline(args, &mut cfg, out, err) {
        ParseOutcome::ContinueAt(index) => index,
        ParseOutcome::ExitSuccess => return Status::Success,
        ParseOutcome::ExitFailure => return Status::Failure,
    };

    cfg.check();
    debug!("Configuration: {cfg:?}");

    let files = match select_files(&args[index..], default_dir) {
        Ok(files) => files,
        Err(e) => {
            let _ = writeln!(err, "{e}");
            return Status::Failure;
        }
    };
    match &files {
        FileSet::Stdin => info!("Reading image from stdin"),
        FileSet::List(list) => info!(
            "{} image file(s) from {} source(s), recursive: {}",
            list.files().len(),
            list.sources().len(),
            list.recursive()
        ),
    }

    dispatch(viewer, &cfg, &files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaleMode;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq)]
    enum Seen {
        Stdin,
        List {
            sources: Vec<PathBuf>,
            recursive: bool,
            files: Vec<PathBuf>,
        },
    }

    /// Records every dispatch instead of opening a window.
    struct FakeViewer {
        result: bool,
        calls: Vec<(Config, Seen)>,
    }

    impl FakeViewer {
        fn new(result: bool) -> Self {
            Self {
                result,
                calls: Vec::new(),
            }
        }
    }

    impl Viewer for FakeViewer {
        fn run(&mut self, config: &Config, files: &FileSet) -> bool {
            let seen = match files {
                FileSet::Stdin => Seen::Stdin,
                FileSet::List(list) => Seen::List {
                    sources: list.sources().to_vec(),
                    recursive: list.recursive(),
                    files: list.files().to_vec(),
                },
            };
            self.calls.push((config.clone(), seen));
            self.result
        }
    }

    struct Outcome {
        status: Status,
        viewer: FakeViewer,
        out: String,
        err: String,
    }

    fn run_in(dir: &Path, list: &[&str], viewer_result: bool) -> Outcome {
        let args: Vec<OsString> = list.iter().map(OsString::from).collect();
        run_with(dir, &args, viewer_result)
    }

    fn run_with(dir: &Path, args: &[OsString], viewer_result: bool) -> Outcome {
        let mut viewer = FakeViewer::new(viewer_result);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = run(Config::default(), args, dir, &mut viewer, &mut out, &mut err);
        Outcome {
            status,
            viewer,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn help_and_version_skip_everything() {
        let tmp = TempDir::new().unwrap();
        for flag in ["--help", "-h", "--version", "-v"] {
            let res = run_in(tmp.path(), &[flag], true);
            assert_eq!(res.status, Status::Success, "{flag}");
            assert!(res.viewer.calls.is_empty(), "{flag}");
            assert!(!res.out.is_empty(), "{flag}");
            assert!(res.err.is_empty(), "{flag}");
        }
    }

    #[test]
    fn unknown_option_fails() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.png");
        let res = run_in(tmp.path(), &["-x"], true);
        assert_eq!(res.status, Status::Failure);
        assert!(res.err.contains("-x"), "{}", res.err);
        assert!(res.viewer.calls.is_empty());
    }

    #[test]
    fn invalid_value_fails() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.png");
        let res = run_in(tmp.path(), &["--scale=huge"], true);
        assert_eq!(res.status, Status::Failure);
        assert!(res.err.contains("huge"), "{}", res.err);
        assert!(res.viewer.calls.is_empty());
    }

    #[test]
    fn empty_default_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let res = run_in(tmp.path(), &["-f"], true);
        assert_eq!(res.status, Status::Failure);
        assert!(res.err.contains("No image files found"), "{}", res.err);
        assert!(res.viewer.calls.is_empty());
    }

    #[test]
    fn default_directory_dispatch() {
        let tmp = TempDir::new().unwrap();
        let a = touch(tmp.path(), "a.png");
        let res = run_in(tmp.path(), &["--scale=fit", "--scale=real"], true);
        assert_eq!(res.status, Status::Success);
        assert_eq!(res.viewer.calls.len(), 1);
        let (cfg, seen) = &res.viewer.calls[0];
        assert_eq!(cfg.scale, ScaleMode::Real);
        assert_eq!(
            seen,
            &Seen::List {
                sources: vec![tmp.path().to_path_buf()],
                recursive: true,
                files: vec![a],
            }
        );
    }

    #[test]
    fn stdin_dispatch() {
        let tmp = TempDir::new().unwrap();
        let res = run_in(tmp.path(), &["-i", "-"], true);
        assert_eq!(res.status, Status::Success);
        assert_eq!(res.viewer.calls.len(), 1);
        let (cfg, seen) = &res.viewer.calls[0];
        assert!(cfg.show_info);
        assert_eq!(seen, &Seen::Stdin);
    }

    #[test]
    fn explicit_files_dispatch() {
        let tmp = TempDir::new().unwrap();
        let b = touch(tmp.path(), "b.png");
        let a = touch(tmp.path(), "a.png");
        let (b_arg, a_arg) = (b.display().to_string(), a.display().to_string());
        let res = run_in(tmp.path(), &["-f", &b_arg, &a_arg], true);
        assert_eq!(res.status, Status::Success);
        assert_eq!(res.viewer.calls.len(), 1);
        let (cfg, seen) = &res.viewer.calls[0];
        assert!(cfg.fullscreen);
        assert!(!cfg.sway_wm);
        assert_eq!(
            seen,
            &Seen::List {
                sources: vec![b.clone(), a.clone()],
                recursive: true,
                files: vec![b, a],
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_dispatch() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let odd = tmp.path().join(OsStr::from_bytes(b"caf\xe9.png"));
        fs::write(&odd, b"").unwrap();
        let b = touch(tmp.path(), "b.png");
        let args = vec![
            OsString::from("-i"),
            odd.clone().into_os_string(),
            b.clone().into_os_string(),
        ];
        let res = run_with(tmp.path(), &args, true);
        assert_eq!(res.status, Status::Success, "{}", res.err);
        assert_eq!(res.viewer.calls.len(), 1);
        let (cfg, seen) = &res.viewer.calls[0];
        assert!(cfg.show_info);
        assert_eq!(
            seen,
            &Seen::List {
                sources: vec![odd.clone(), b.clone()],
                recursive: true,
                files: vec![odd, b],
            }
        );
    }

    #[test]
    fn empty_explicit_list_fails() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.png").display().to_string();
        let res = run_in(tmp.path(), &[&missing], true);
        assert_eq!(res.status, Status::Failure);
        assert!(res.err.contains("Unable to compose file list"), "{}", res.err);
        assert!(res.viewer.calls.is_empty());
    }

    #[test]
    fn viewer_failure_is_reported_as_failure() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.png");
        let res = run_in(tmp.path(), &[], false);
        assert_eq!(res.status, Status::Failure);
        assert_eq!(res.viewer.calls.len(), 1);
        assert!(res.err.is_empty());
    }

    #[test]
    fn config_defaults_are_overridden() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.png");
        let cfg = Config::from_toml_str("scale = \"fit\"\ninfo = true\n").unwrap();
        let mut viewer = FakeViewer::new(true);
        let args = vec![OsString::from("-s"), OsString::from("real")];
        let status = run(cfg, &args, tmp.path(), &mut viewer, &mut Vec::<u8>::new(), &mut Vec::<u8>::new());
        assert_eq!(status, Status::Success);
        let (cfg, _) = &viewer.calls[0];
        assert_eq!(cfg.scale, ScaleMode::Real);
        assert!(cfg.show_info);
    }
}
