#![forbid(unsafe_code)]

//! Command-line argument parsing.
//!
//! Parses args manually to keep the binary lean. Flags accept
//! `--flag value`, `--flag=value`, and short forms.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

pub const HELP_TEXT: &str = "\
inkgrid — render text as ASCII-art glyph shapes

USAGE:
    inkgrid --font <file> --size <size> --text <text> [--anti-alias]

SYNOPSIS
    inkgrid -f Arial.ttf -s 24 -t quux

OPTIONS:
    --font, -f <file>    The font file (TTF/OTF)
    --text, -t <text>    The string to render; embedded newlines start
                         a new block
    --size, -s <size>    The font size (positive integer)
    --anti-alias, -a     Keep grayscale coverage instead of 1-bit
    --help, -h           Show this help message

ENVIRONMENT VARIABLES:
    INKGRID_LOG          Log filter for diagnostics on stderr
                         (default: warn)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Font file to load.
    pub font: PathBuf,
    /// Text to render.
    pub text: String,
    /// Font size in pixels.
    pub size: u32,
    /// Whether grayscale coverage is kept.
    pub anti_alias: bool,
}

/// What the argument list asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print [`HELP_TEXT`] and exit successfully.
    Help,
    /// Run a render session.
    Run(Opts),
}

/// Argument errors, reported on stderr with exit code 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    UnknownFlag { flag: String },
    MissingValue { flag: &'static str },
    MissingRequired { flag: &'static str },
    InvalidSize { value: String },
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFlag { flag } => write!(f, "unknown argument: {}", flag),
            Self::MissingValue { flag } => write!(f, "missing value for {}", flag),
            Self::MissingRequired { flag } => write!(f, "missing required option {}", flag),
            Self::InvalidSize { value } => {
                write!(f, "size must be a positive integer, got '{}'", value)
            }
        }
    }
}

impl Error for UsageError {}

/// Parse the argument list (without the program name).
///
/// An empty list is a request for help.
pub fn parse(args: &[String]) -> Result<Invocation, UsageError> {
    if args.is_empty() {
        return Ok(Invocation::Help);
    }

    let mut font: Option<PathBuf> = None;
    let mut text: Option<String> = None;
    let mut size_raw: Option<String> = None;
    let mut anti_alias = false;

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--help" | "-h" => return Ok(Invocation::Help),
            "--anti-alias" | "-a" => anti_alias = true,
            "--font" | "-f" => font = Some(PathBuf::from(take_value(args, &mut i, "--font")?)),
            "--text" | "-t" => text = Some(take_value(args, &mut i, "--text")?),
            "--size" | "-s" => size_raw = Some(take_value(args, &mut i, "--size")?),
            _ => {
                if let Some(value) = arg.strip_prefix("--font=") {
                    font = Some(PathBuf::from(value));
                } else if let Some(value) = arg.strip_prefix("--text=") {
                    text = Some(value.to_string());
                } else if let Some(value) = arg.strip_prefix("--size=") {
                    size_raw = Some(value.to_string());
                } else {
                    return Err(UsageError::UnknownFlag {
                        flag: arg.to_string(),
                    });
                }
            }
        }
        i += 1;
    }

    let font = font.ok_or(UsageError::MissingRequired { flag: "--font" })?;
    let text = text.ok_or(UsageError::MissingRequired { flag: "--text" })?;
    let size_raw = size_raw.ok_or(UsageError::MissingRequired { flag: "--size" })?;
    let size = match size_raw.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            return Err(UsageError::InvalidSize { value: size_raw });
        }
    };

    Ok(Invocation::Run(Opts {
        font,
        text,
        size,
        anti_alias,
    }))
}

fn take_value(args: &[String], i: &mut usize, flag: &'static str) -> Result<String, UsageError> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or(UsageError::MissingValue { flag })
}
