use log::{debug, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::image_util::is_supported;

/// Where the viewer takes its images from.
#[derive(Debug)]
pub enum FileSet {
    /// A single image read from standard input.
    Stdin,
    List(FileList),
}

/// Image files expanded from a set of input paths.
#[derive(Debug)]
pub struct FileList {
    sources: Vec<PathBuf>,
    recursive: bool,
    files: Vec<PathBuf>,
}

impl FileList {
    /// Expands `sources` in order. Directories contribute the image files
    /// they contain, other paths are taken as-is. Returns `None` if nothing
    /// was found.
    pub fn new<P: AsRef<Path>>(sources: &[P], recursive: bool) -> Option<Self> {
        let sources: Vec<PathBuf> = sources.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let mut files = Vec::new();
        for source in &sources {
            if source.is_dir() {
                scan_dir(source, recursive, &mut files);
            } else if source.exists() {
                files.push(source.clone());
            } else {
                warn!("Skipping {}: no such file or directory", source.display());
            }
        }
        debug!("{} file(s) from {} source(s)", files.len(), sources.len());
        if files.is_empty() {
            return None;
        }
        Some(Self {
            sources,
            recursive,
            files,
        })
    }

    /// Input paths the list was built from.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

fn scan_dir(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) {
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_supported(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping entry in {}: {e}", dir.display()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("No image files found in the current directory")]
    EmptyDirectory,
    #[error("Unable to compose file list from input args")]
    EmptyList,
}

/// Picks the input mode from the positional arguments: none means
/// `default_dir`, a single `-` means standard input, anything else is a
/// list of files and directories.
pub fn select_files(args: &[OsString], default_dir: &Path) -> Result<FileSet, SelectError> {
    const RECURSIVE: bool = true;
    match args {
        [] => FileList::new(&[default_dir], RECURSIVE)
            .map(FileSet::List)
            .ok_or(SelectError::EmptyDirectory),
        [single] if single == "-" => Ok(FileSet::Stdin),
        _ => FileList::new(args, RECURSIVE)
            .map(FileSet::List)
            .ok_or(SelectError::EmptyList),
    }
}
