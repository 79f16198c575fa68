//! Cell model: ageing, colors, attributes, and the cell itself.
//!
//! Redrawing terminals is expensive, so cells are not flagged dirty — they
//! are stamped with a monotonically increasing *age*. Each framebuffer
//! remembers the age it last rendered and redraws exactly the cells that are
//! newer. A single dirty bit would force all renderers to coordinate; the
//! counter lets any number of double/triple-buffered renderers track their
//! own progress independently.

use bitflags::bitflags;

use crate::character::TermChar;

/// Monotone mutation counter stamped on cells, lines and pages.
pub type Age = u64;

/// Sentinel age: forces a redraw when stored on a cell or line, and means
/// "draw everything" when held by a framebuffer. Skipped when the counter
/// wraps, so wraparound stays harmless.
pub const AGE_NULL: Age = 0;

/// Color of a cell foreground or background.
///
/// Models the terminal color hierarchy: default → 16 named ANSI (8 dark +
/// 8 light) → 256-palette index → 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Terminal default (SGR 39 / SGR 49).
    #[default]
    Default,
    /// Named ANSI color (0-7 dark, 8-15 light).
    Named(u8),
    /// 256-color palette index.
    Indexed(u8),
    /// 24-bit true color.
    Rgb(u8, u8, u8),
}

bitflags! {
    /// Per-cell rendition marks.
    ///
    /// Seven independent booleans; `PROTECT` additionally shields the cell
    /// from selective-erase operations (DECSCA/DECSERA).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrFlags: u8 {
        const BOLD      = 1 << 0;
        const ITALIC    = 1 << 1;
        const UNDERLINE = 1 << 2;
        const INVERSE   = 1 << 3;
        const PROTECT   = 1 << 4;
        const BLINK     = 1 << 5;
        const HIDDEN    = 1 << 6;
    }
}

/// Rendition state of a single cell: colors plus marks.
///
/// The page never stores a "current" attribute — every mutating call takes
/// the attribute to fill with, so the SGR state lives solely in the
/// command dispatcher and cannot alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attr {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl Attr {
    /// Whether this attribute protects the cell from selective erase.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.flags.contains(AttrFlags::PROTECT)
    }
}

/// A single cell of a terminal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Stored cluster, or [`TermChar::NULL`] for a blank cell.
    pub ch: TermChar,
    /// Age of the last mutation, or [`AGE_NULL`] to force redraw.
    pub age: Age,
    /// Rendition state.
    pub attr: Attr,
    /// Cached column width of `ch`: 1 for a blank cell, 0 for the trailing
    /// placeholder of a wide character, otherwise `ch.lookup_width()`.
    pub width: u8,
}

impl Default for Cell {
    /// A blank cell with default attributes and the forced-redraw age.
    fn default() -> Self {
        Self::blank(Attr::default(), AGE_NULL)
    }
}

impl Cell {
    /// A blank cell carrying the given fill attribute.
    #[must_use]
    pub fn blank(attr: Attr, age: Age) -> Self {
        Self {
            ch: TermChar::NULL,
            age,
            attr,
            width: 1,
        }
    }

    /// The zero-width trailing placeholder of a wide character.
    #[must_use]
    pub fn continuation(attr: Attr, age: Age) -> Self {
        Self {
            ch: TermChar::NULL,
            age,
            attr,
            width: 0,
        }
    }

    /// Whether this cell holds no character (blank or continuation).
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.ch.is_null()
    }

    /// Whether this cell is the leading half of a wide character.
    #[must_use]
    pub fn is_wide(&self) -> bool {
        self.width == 2
    }

    /// Whether this cell is the trailing placeholder of a wide character.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.width == 0 && self.ch.is_null()
    }

    /// Store a cluster, stamping the age and caching the width.
    pub fn set(&mut self, ch: TermChar, cwidth: u8, attr: Attr, age: Age) {
        self.ch = ch;
        self.width = cwidth;
        self.attr = attr;
        self.age = age;
    }

    /// Blank this cell with the given fill attribute.
    pub fn erase(&mut self, attr: Attr, age: Age) {
        self.ch = TermChar::NULL;
        self.width = 1;
        self.attr = attr;
        self.age = age;
    }
}
