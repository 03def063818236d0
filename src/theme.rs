//! Centralized theme and styling for the TUI
//!
//! Two layers live here:
//!
//! - **Palette**: semantic colors are small integer ids (the classic 16-color
//!   ANSI numbering: 2 green, 8 bright black, 9 bright red, ...). A [`Palette`]
//!   resolves an id against the terminal's color count, or to "no color" when
//!   color is disabled. Layout never depends on the outcome.
//! - **Styles**: pre-built ratatui styles for the chrome (footer, prefixes,
//!   notifications), routed through the palette so `--no-color` turns them off
//!   too.
//!
//! # Usage
//! ```rust
//! use collnav::theme::{CellStyle, Decoration, Palette};
//!
//! let palette = Palette::new(256);
//! let style = palette.style(CellStyle::new(9, Decoration::Underline));
//! assert!(palette.resolve(9).is_some());
//! assert!(Palette::disabled().resolve(9).is_none());
//! # let _ = style;
//! ```

use ratatui::style::{Color, Modifier, Style};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

// =============================================================================
// COLOR IDS
// =============================================================================

/// Well-known color ids used across the application
pub struct Colors;

impl Colors {
    /// Default entry color
    pub const DEFAULT: u8 = 2;

    /// Dimmed entries (shadowed collections), line-number prefixes, scrollbar
    pub const MUTED: u8 = 8;

    /// Deprecated entries
    pub const ALERT: u8 = 9;

    /// Informational notifications
    pub const INFO: u8 = 4;

    /// Warning notifications
    pub const WARNING: u8 = 3;

    /// Error notifications
    pub const ERROR: u8 = 1;

    /// Column headers
    pub const HEADER: u8 = 6;
}

// =============================================================================
// CELL STYLE
// =============================================================================

/// Text decoration applied on top of a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Decoration {
    #[default]
    None,
    Bold,
    Dim,
    Underline,
    Reverse,
}

impl Decoration {
    /// The ratatui modifier for this decoration
    pub fn modifier(self) -> Modifier {
        match self {
            Decoration::None => Modifier::empty(),
            Decoration::Bold => Modifier::BOLD,
            Decoration::Dim => Modifier::DIM,
            Decoration::Underline => Modifier::UNDERLINED,
            Decoration::Reverse => Modifier::REVERSED,
        }
    }
}

/// Color/decoration pair returned by a colorizer for one rendered cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellStyle {
    pub color: u8,
    pub decoration: Decoration,
}

impl CellStyle {
    pub const fn new(color: u8, decoration: Decoration) -> Self {
        Self { color, decoration }
    }

    /// A color with no decoration
    pub const fn plain(color: u8) -> Self {
        Self::new(color, Decoration::None)
    }
}

// =============================================================================
// PALETTE
// =============================================================================

/// The currently active color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Number of usable colors; zero means color is disabled.
    colors: u16,
}

impl Palette {
    /// A palette with `colors` usable colors (zero disables color)
    pub const fn new(colors: u16) -> Self {
        Self { colors }
    }

    /// A palette that never emits color
    pub const fn disabled() -> Self {
        Self::new(0)
    }

    /// Detect the terminal's color support.
    ///
    /// `enabled == false` or a terminal reporting zero colors gives a disabled
    /// palette; the latter is logged at debug.
    pub fn detect(enabled: bool) -> Self {
        if !enabled {
            debug!("Color disabled by configuration");
            return Self::disabled();
        }
        let colors = crossterm::style::available_color_count();
        debug!("Terminal reports {} colors", colors);
        if colors == 0 {
            debug!("No usable colors, disabling color");
        }
        Self::new(colors)
    }

    pub fn is_enabled(&self) -> bool {
        self.colors > 0
    }

    pub fn color_count(&self) -> u16 {
        self.colors
    }

    /// Resolve a color id modulo the available colors.
    pub fn resolve(&self, color: u8) -> Option<Color> {
        if self.colors == 0 {
            return None;
        }
        let idx = u16::from(color) % self.colors;
        // ratatui's indexed colors stop at 255
        Some(Color::Indexed(u8::try_from(idx).unwrap_or(color)))
    }

    /// Style for a colorized cell. Decorations survive a disabled palette.
    pub fn style(&self, cell: CellStyle) -> Style {
        let style = Style::default().add_modifier(cell.decoration.modifier());
        match self.resolve(cell.color) {
            Some(color) => style.fg(color),
            None => style,
        }
    }

    /// Foreground-only style for a color id
    pub fn fg(&self, color: u8) -> Style {
        self.style(CellStyle::plain(color))
    }

    /// Fit a 24-bit color to what the terminal can show.
    ///
    /// More than 256 colors keeps it as is, 256 maps it onto the xterm color
    /// cube and anything less picks one of the eight basic colors.
    pub fn rgb(&self, r: u8, g: u8, b: u8) -> Option<Color> {
        match self.colors {
            0 => None,
            c if c > 256 => Some(Color::Rgb(r, g, b)),
            256 => {
                let level = |v: u8| (u16::from(v) * 5 + 127) / 255;
                let idx = 16 + 36 * level(r) + 6 * level(g) + level(b);
                Some(Color::Indexed(u8::try_from(idx).unwrap_or(15)))
            }
            _ => {
                let bit = |v: u8, shift: u8| u8::from(v > 127) << shift;
                self.resolve(bit(r, 0) | bit(g, 1) | bit(b, 2))
            }
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(16)
    }
}

// =============================================================================
// PRE-BUILT STYLES
// =============================================================================

/// Pre-built styles for the screen chrome
pub struct Styles;

impl Styles {
    /// Menu column headers
    pub fn column_header(palette: &Palette) -> Style {
        palette.style(CellStyle::new(Colors::HEADER, Decoration::Underline))
    }

    /// Line-number prefix (`  3│`)
    pub fn prefix(palette: &Palette) -> Style {
        palette.fg(Colors::MUTED)
    }

    /// Scrollbar thumb
    pub fn scrollbar(palette: &Palette) -> Style {
        palette.fg(Colors::MUTED)
    }

    /// Footer key (`esc`, `:help`)
    pub fn footer_key() -> Style {
        Style::default().add_modifier(Modifier::REVERSED)
    }

    /// Footer key description
    pub fn footer_desc() -> Style {
        Style::default()
    }

    /// Command prompt line
    pub fn prompt() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

// =============================================================================
// SEVERITY
// =============================================================================

/// Severity level for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

/// Semantic style lookups
pub struct Theme;

impl Theme {
    /// Color id for a severity level
    pub fn severity_color(severity: Severity) -> u8 {
        match severity {
            Severity::Info => Colors::INFO,
            Severity::Warning => Colors::WARNING,
            Severity::Error => Colors::ERROR,
        }
    }

    /// Border style for a notification of this severity
    pub fn severity_style(palette: &Palette, severity: Severity) -> Style {
        palette.fg(Self::severity_color(severity))
    }
}

// =============================================================================
// UI CONSTANTS
// =============================================================================

/// UI dimension and layout constants
pub struct UiConstants;

impl UiConstants {
    /// Footer height
    pub const FOOTER_HEIGHT: u16 = 1;

    /// Gap between menu columns
    pub const COLUMN_GAP: usize = 2;

    /// Notification max width as a percentage of the screen
    pub const NOTIFICATION_WIDTH_PCT: u16 = 80;

    /// Scrollbar thumb character
    pub const SCROLLBAR_THUMB: &'static str = "\u{2592}";

    /// Separator between line-number prefix and content
    pub const PREFIX_SEPARATOR: &'static str = "\u{2502}";
}
