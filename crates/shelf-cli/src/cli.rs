#![forbid(unsafe_code)]

//! Command-line argument parsing for `shelf-layout`.
//!
//! Parses args manually to keep the binary lean. Layout knobs come from the
//! `SHELF_*` environment first (see [`shelf_core::config`]) and are then
//! overridden by explicit flags; the merged config is validated once.

use std::env;
use std::fmt;
use std::process;

use shelf_core::{Centi, ConfigError, GlyphPolicy, LayoutConfig, chars_per_line_for};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
shelf-layout: lay out shelf-edge label text for one display

USAGE:
    shelf-layout [OPTIONS] < batch.json

INPUT:
    A JSON object with a `detections` array. Each detection has an `id`, a
    `label` (\"name,price,promo\") and either `pixel_x` (when the batch has an
    `image_width`) or a display position `x`. With `image_width`, positions
    are normalized, sorted and thinned; otherwise they are only sorted.

OPTIONS:
    --input=PATH          Read the batch from PATH instead of stdin
    --chars-per-line=N    Character cells per display line (default: 147)
    --block-width=N       Cells per label block (default: 20)
    --display-width=D     Physical display width (default: 30.00)
    --min-distance=D      Minimum gap between kept detections (default: 3.00)
    --glyph-policy=P      Wide glyphs: 'hangul' or 'unicode' (default: hangul)
    --screen-px=N         Derive chars per line from screen pixel width...
    --glyph-px=N          ...and the pixel width of one narrow glyph
    --format=FMT          Output: 'text' or 'json' (default: text)
    --display-id=ID       Display id for JSON output (default: from input)
    --help, -h            Show this help message
    --version, -V         Show version

ENVIRONMENT VARIABLES:
    SHELF_CHARS_PER_LINE  Override chars per line
    SHELF_BLOCK_WIDTH     Override block width
    SHELF_DISPLAY_WIDTH   Override display width
    SHELF_MIN_DISTANCE    Override minimum distance
    SHELF_GLYPH_POLICY    Override glyph policy
    SHELF_LOG             Log filter, e.g. 'debug' (default: warn)
    SHELF_LOG_JSON        Emit logs as JSON lines (1/true)";

/// Output rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The three display lines, as sent to the display.
    #[default]
    Text,
    /// Display payload plus the pass report.
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Merged and validated layout configuration.
    pub config: LayoutConfig,
    pub format: OutputFormat,
    /// Overrides the batch's own display id.
    pub display_id: Option<String>,
    /// Batch file; stdin when absent.
    pub input: Option<String>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            config: LayoutConfig::default(),
            format: OutputFormat::Text,
            display_id: None,
            input: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
    /// One of a pair of flags that only make sense together.
    MissingPair { given: &'static str, missing: &'static str },
    /// Two flags that set the same thing.
    Conflict { first: &'static str, second: &'static str },
    /// The merged configuration is unusable.
    Config(Vec<ConfigError>),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => f.write_str("help requested"),
            Self::Version => f.write_str("version requested"),
            Self::InvalidValue { flag, value } => write!(f, "Invalid {flag} value: {value}"),
            Self::UnknownArg(arg) => write!(f, "Unknown argument: {arg}"),
            Self::MissingPair { given, missing } => write!(f, "{given} requires {missing}"),
            Self::Conflict { first, second } => {
                write!(f, "{first} cannot be combined with {second}")
            }
            Self::Config(errors) => {
                f.write_str("Invalid configuration:")?;
                for err in errors {
                    write!(f, "\n    {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags. Exits the process on `--help`,
    /// `--version`, or any invalid input.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("shelf-layout {VERSION}");
                process::exit(0);
            }
            Err(err @ ParseError::UnknownArg(_)) => {
                eprintln!("{err}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
            Err(err) => {
                eprintln!("{err}");
                process::exit(1);
            }
        }
    }

    pub fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();
        let mut errors = opts.config.apply_env_with(|key| get_env(key));

        let mut explicit_cpl = false;
        let mut screen_px: Option<u32> = None;
        let mut glyph_px: Option<u32> = None;

        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--chars-per-line=") {
                        opts.config.chars_per_line = parse_flag("--chars-per-line", val)?;
                        explicit_cpl = true;
                    } else if let Some(val) = other.strip_prefix("--block-width=") {
                        opts.config.block_width = parse_flag("--block-width", val)?;
                    } else if let Some(val) = other.strip_prefix("--display-width=") {
                        opts.config.display_width = parse_flag::<Centi>("--display-width", val)?;
                    } else if let Some(val) = other.strip_prefix("--min-distance=") {
                        opts.config.min_distance = parse_flag::<Centi>("--min-distance", val)?;
                    } else if let Some(val) = other.strip_prefix("--glyph-policy=") {
                        opts.config.glyph_policy =
                            GlyphPolicy::parse(val).ok_or_else(|| ParseError::InvalidValue {
                                flag: "--glyph-policy",
                                value: val.to_string(),
                            })?;
                    } else if let Some(val) = other.strip_prefix("--screen-px=") {
                        screen_px = Some(parse_flag("--screen-px", val)?);
                    } else if let Some(val) = other.strip_prefix("--glyph-px=") {
                        glyph_px = Some(parse_flag("--glyph-px", val)?);
                    } else if let Some(val) = other.strip_prefix("--format=") {
                        opts.format =
                            OutputFormat::parse(val).ok_or_else(|| ParseError::InvalidValue {
                                flag: "--format",
                                value: val.to_string(),
                            })?;
                    } else if let Some(val) = other.strip_prefix("--display-id=") {
                        if !val.trim().is_empty() {
                            opts.display_id = Some(val.to_string());
                        }
                    } else if let Some(val) = other.strip_prefix("--input=") {
                        if !val.trim().is_empty() {
                            opts.input = Some(val.to_string());
                        }
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        match (screen_px, glyph_px) {
            (None, None) => {}
            (Some(_), None) => {
                return Err(ParseError::MissingPair {
                    given: "--screen-px",
                    missing: "--glyph-px",
                });
            }
            (None, Some(_)) => {
                return Err(ParseError::MissingPair {
                    given: "--glyph-px",
                    missing: "--screen-px",
                });
            }
            (Some(_), Some(_)) if explicit_cpl => {
                return Err(ParseError::Conflict {
                    first: "--chars-per-line",
                    second: "--screen-px",
                });
            }
            (Some(screen), Some(glyph)) => {
                opts.config.chars_per_line = chars_per_line_for(screen, glyph).ok_or_else(|| {
                    ParseError::InvalidValue {
                        flag: "--glyph-px",
                        value: glyph.to_string(),
                    }
                })?;
            }
        }

        if let Err(violations) = opts.config.validate() {
            errors.extend(violations);
        }
        if !errors.is_empty() {
            return Err(ParseError::Config(errors));
        }
        Ok(opts)
    }
}

fn parse_flag<T: std::str::FromStr>(flag: &'static str, val: &str) -> Result<T, ParseError> {
    val.trim().parse().map_err(|_| ParseError::InvalidValue {
        flag,
        value: val.to_string(),
    })
}
