use log::trace;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use thiserror::Error;

use crate::config::Config;
use crate::image_util::supported_formats;
use crate::options::{
    find_long, find_short, short_spec, usage, Arity, LongMatch, OptionId, OptionSpec, ShortSpec,
    OPTIONS,
};
use crate::{APP_NAME, APP_VERSION};

/// What the caller should do after the command line has been scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Options consumed; positional arguments start at this index.
    ContinueAt(usize),
    ExitSuccess,
    ExitFailure,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("Invalid argument: {0}")]
    Unknown(String),
    #[error("Missing value for argument: {0}")]
    MissingValue(String),
    #[error("Argument does not take a value: {0}")]
    UnexpectedValue(String),
    #[error("Ambiguous argument: {0}")]
    Ambiguous(String),
}

/// Option-scanning state, created fresh for every scan.
pub struct Scanner<'a> {
    args: &'a [OsString],
    table: &'static [OptionSpec],
    short_spec: ShortSpec,
    /// Index of the next token to examine.
    index: usize,
    /// Short option cluster being scanned and byte offset of its next character.
    cluster: Option<(&'a str, usize)>,
}

type Scanned<'a> = Result<(&'static OptionSpec, Option<&'a str>), ScanError>;

impl<'a> Scanner<'a> {
    pub fn new(args: &'a [OsString], table: &'static [OptionSpec]) -> Self {
        Self {
            args,
            table,
            short_spec: short_spec(table),
            index: 0,
            cluster: None,
        }
    }

    /// Index of the first token not consumed as an option.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the next option with its value, `None` once a positional
    /// argument, `--` or the end of the arguments is reached.
    pub fn next_option(&mut self) -> Option<Scanned<'a>> {
        if let Some((token, offset)) = self.cluster {
            return Some(self.next_short(token, offset));
        }
        let args = self.args;
        let raw = args.get(self.index)?;
        let Some(token) = raw.to_str() else {
            // positional arguments may be any path, options must be text
            if is_option_like(raw) {
                self.index += 1;
                return Some(Err(ScanError::Unknown(raw.to_string_lossy().into_owned())));
            }
            return None;
        };
        if token == "--" {
            self.index += 1;
            return None;
        }
        if let Some(long) = token.strip_prefix("--") {
            self.index += 1;
            return Some(self.long_option(token, long));
        }
        if token.len() > 1 && token.starts_with('-') {
            return Some(self.next_short(token, 1));
        }
        None
    }

    fn long_option(&mut self, token: &'a str, long: &'a str) -> Scanned<'a> {
        let (name, inline) = match long.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (long, None),
        };
        let opt = match find_long(self.table, name) {
            LongMatch::Found(opt) => opt,
            LongMatch::Ambiguous => return Err(ScanError::Ambiguous(token.to_string())),
            LongMatch::Unknown => return Err(ScanError::Unknown(token.to_string())),
        };
        match (opt.arity, inline) {
            (Arity::None, None) => Ok((opt, None)),
            (Arity::None, Some(_)) => Err(ScanError::UnexpectedValue(token.to_string())),
            (Arity::Required, Some(value)) => Ok((opt, Some(value))),
            (Arity::Required, None) => {
                let value = self.take_next(token)?;
                Ok((opt, Some(value)))
            }
        }
    }

    /// Handles the character at `offset` of the cluster `token`. Errors name
    /// the whole token, as typed.
    fn next_short(&mut self, token: &'a str, offset: usize) -> Scanned<'a> {
        let Some(c) = token[offset..].chars().next() else {
            self.end_cluster();
            return Err(ScanError::Unknown(token.to_string()));
        };
        let after = offset + c.len_utf8();
        let opt = match (self.short_spec.arity_of(c), find_short(self.table, c)) {
            (Some(_), Some(opt)) => opt,
            _ => {
                self.end_cluster();
                return Err(ScanError::Unknown(token.to_string()));
            }
        };
        match opt.arity {
            Arity::None => {
                if after < token.len() {
                    self.cluster = Some((token, after));
                } else {
                    self.end_cluster();
                }
                Ok((opt, None))
            }
            Arity::Required => {
                self.end_cluster();
                if after < token.len() {
                    Ok((opt, Some(&token[after..])))
                } else {
                    let value = self.take_next(token)?;
                    Ok((opt, Some(value)))
                }
            }
        }
    }

    fn end_cluster(&mut self) {
        self.cluster = None;
        self.index += 1;
    }

    /// Consumes the next token as an option value, whatever it looks like.
    fn take_next(&mut self, option: &str) -> Result<&'a str, ScanError> {
        let args = self.args;
        let Some(raw) = args.get(self.index) else {
            return Err(ScanError::MissingValue(option.to_string()));
        };
        self.index += 1;
        raw.to_str()
            .ok_or_else(|| ScanError::Unknown(raw.to_string_lossy().into_owned()))
    }
}

fn is_option_like(arg: &OsStr) -> bool {
    let bytes = arg.as_encoded_bytes();
    bytes.len() > 1 && bytes[0] == b'-'
}

/// Applies command line options to `cfg`.
///
/// `args` excludes the program name. Usage and version text go to `out`,
/// diagnostics to `err`.
pub fn parse_cmdline(
    args: &[OsString],
    cfg: &mut Config,
    out: &mut impl Write,
    err: &mut impl Write,
) -> ParseOutcome {
    let mut scanner = Scanner::new(args, OPTIONS);
    trace!(
        "Scanning {} argument(s), short options '{}'",
        args.len(),
        scanner.short_spec.as_str()
    );

    while let Some(next) = scanner.next_option() {
        let (opt, value) = match next {
            Ok(found) => found,
            Err(e) => {
                let _ = writeln!(err, "{e}");
                return ParseOutcome::ExitFailure;
            }
        };
        let value = value.unwrap_or_default();
        let applied = match opt.id {
            OptionId::Fullscreen => {
                cfg.set_fullscreen();
                Ok(())
            }
            OptionId::Scale => cfg.set_scale(value),
            OptionId::Background => cfg.set_background(value),
            OptionId::Geometry => cfg.set_geometry(value),
            OptionId::Info => {
                cfg.show_info = true;
                Ok(())
            }
            OptionId::Class => cfg.set_app_id(value),
            OptionId::NoSway => {
                cfg.sway_wm = false;
                Ok(())
            }
            OptionId::Version => {
                let _ = writeln!(out, "{APP_NAME} version {APP_VERSION}.");
                let _ = writeln!(out, "Supported formats: {}.", supported_formats().join(", "));
                return ParseOutcome::ExitSuccess;
            }
            OptionId::Help => {
                let _ = write!(out, "{}", usage(APP_NAME, OPTIONS));
                return ParseOutcome::ExitSuccess;
            }
        };
        if let Err(e) = applied {
            let _ = writeln!(err, "{e}");
            return ParseOutcome::ExitFailure;
        }
    }

    ParseOutcome::ContinueAt(scanner.index())
}
