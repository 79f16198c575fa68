//! Terminal line: a variable-width row of cells.
//!
//! Lines own their cell buffers and are shuffled between a page and a
//! history by move, never by copying cells. Each line tracks its visible
//! `width` (which may be smaller than the allocated buffer), and a `fill`
//! counter: cells at `[fill, width)` are guaranteed blank, carrying the
//! attribute of the last fill operation. `fill` is an upper bound — cells
//! below it may also be blank — which keeps erase bookkeeping cheap.
//!
//! Wide characters occupy two cells: the leading cell stores the cluster
//! with cached width 2, the trailing cell is a zero-width placeholder.
//! Every edit that could split such a pair blanks the orphaned half.

use crate::cell::{Age, Attr, Cell};
use crate::character::TermChar;

/// A single row of the screen or of a history ring.
#[derive(Debug, Clone, Default)]
pub struct Line {
    /// Allocated cells; `cells.len()` is the capacity, `width` the visible
    /// prefix.
    cells: Vec<Cell>,
    /// Visible width, `<= cells.len()`.
    width: usize,
    /// Upper bound on the left-justified non-blank cell count.
    fill: usize,
    /// Line age: [`crate::cell::AGE_NULL`] forces a redraw of every cell
    /// regardless of per-cell ages.
    age: Age,
}

impl Line {
    /// Create an empty line with no allocated cells.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a blank line of the given visible width.
    #[must_use]
    pub fn with_width(width: usize, attr: Attr, age: Age) -> Self {
        let mut line = Self::new();
        line.reserve(width, attr, age, 0);
        line.set_width(width);
        line
    }

    /// Visible width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Allocated cell count (`>= width`).
    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// Upper bound on the number of left-justified non-blank cells.
    #[must_use]
    pub fn fill(&self) -> usize {
        self.fill
    }

    /// Line age. [`crate::cell::AGE_NULL`] means "redraw all cells".
    #[must_use]
    pub fn age(&self) -> Age {
        self.age
    }

    /// Stamp the line age, forcing renderers to reconsider every cell.
    pub fn set_age(&mut self, age: Age) {
        self.age = age;
    }

    /// The visible cells.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells[..self.width]
    }

    /// Bounds-checked cell accessor.
    #[must_use]
    pub fn cell(&self, x: usize) -> Option<&Cell> {
        self.cells[..self.width].get(x)
    }

    /// Ensure capacity for `width` cells.
    ///
    /// Cells below `protect_width` are preserved; everything from
    /// `protect_width` up to `width` is blanked with `attr`/`age`. The
    /// visible width is not changed — callers follow up with
    /// [`Line::set_width`].
    pub fn reserve(&mut self, width: usize, attr: Attr, age: Age, protect_width: usize) {
        let old = self.cells.len();
        if width > old {
            self.cells.resize_with(width, || Cell::blank(attr, age));
        }
        let start = protect_width.min(old).min(width);
        for cell in &mut self.cells[start..width.min(old)] {
            cell.erase(attr, age);
        }
        if protect_width < self.fill {
            self.fill = protect_width;
        }
    }

    /// Change the visible width within the allocated capacity.
    ///
    /// Shrinking truncates `fill`; cells beyond the new width keep their
    /// contents but are invisible until re-blanked by a later reserve.
    pub fn set_width(&mut self, width: usize) {
        self.width = width.min(self.cells.len());
        self.fill = self.fill.min(self.width);
    }

    /// Place a cluster at column `x`.
    ///
    /// `cwidth` is the cached column width of `ch`. Wide characters write a
    /// zero-width placeholder into the following cell; a wide write that
    /// would cross the right margin is dropped entirely, so no partial
    /// glyph is ever stored. In insert mode the cells at `[x, width)` shift
    /// right first, dropping cells off the right margin.
    pub fn write(&mut self, x: usize, ch: TermChar, cwidth: usize, attr: Attr, age: Age, insert_mode: bool) {
        if cwidth == 0 || x >= self.width || x + cwidth > self.width {
            return;
        }

        if insert_mode {
            let was_continuation = self.cells[x].is_continuation();
            if was_continuation && x > 0 {
                self.cells[x - 1].erase(attr, age);
            }

            if x < self.fill {
                self.fill = (self.fill + cwidth).min(self.width);
            }
            self.cells[x..self.width].rotate_right(cwidth);

            // The placeholder that sat at `x` moved to `x + cwidth`; its
            // leading half is gone.
            if was_continuation && x + cwidth < self.width && self.cells[x + cwidth].is_continuation() {
                self.cells[x + cwidth].erase(attr, age);
            }
            // A leading half shifted into the last column lost its partner.
            if self.cells[self.width - 1].is_wide() {
                self.cells[self.width - 1].erase(attr, age);
            }
        } else {
            // Overwriting the trailing half of a wide pair orphans its lead.
            if self.cells[x].is_continuation() && x > 0 {
                self.cells[x - 1].erase(attr, age);
            }
        }

        self.cells[x].set(ch, cwidth as u8, attr, age);
        for cell in &mut self.cells[x + 1..x + cwidth] {
            *cell = Cell::continuation(attr, age);
        }

        // Overwriting the leading half of a wide pair orphans its trailer.
        if x + cwidth < self.width && self.cells[x + cwidth].is_continuation() {
            self.cells[x + cwidth].erase(attr, age);
        }

        self.fill = self.fill.max(x + cwidth).min(self.width);
    }

    /// Insert `num` blank cells at `from`, shifting the rest right.
    pub fn insert(&mut self, from: usize, num: usize, attr: Attr, age: Age) {
        if from >= self.width || num == 0 {
            return;
        }
        let num = num.min(self.width - from);

        let was_continuation = self.cells[from].is_continuation();
        if was_continuation && from > 0 {
            self.cells[from - 1].erase(attr, age);
        }

        self.cells[from..self.width].rotate_right(num);
        for cell in &mut self.cells[from..from + num] {
            cell.erase(attr, age);
        }

        if was_continuation && from + num < self.width && self.cells[from + num].is_continuation() {
            self.cells[from + num].erase(attr, age);
        }
        if self.cells[self.width - 1].is_wide() {
            self.cells[self.width - 1].erase(attr, age);
        }

        if from < self.fill {
            self.fill = (self.fill + num).min(self.width);
        }
    }

    /// Delete `num` cells at `from`, shifting the rest left and blanking
    /// the vacated cells at the right margin.
    pub fn delete(&mut self, from: usize, num: usize, attr: Attr, age: Age) {
        if from >= self.width || num == 0 {
            return;
        }
        let num = num.min(self.width - from);

        if self.cells[from].is_continuation() && from > 0 {
            self.cells[from - 1].erase(attr, age);
        }

        self.cells[from..self.width].rotate_left(num);
        for cell in &mut self.cells[self.width - num..self.width] {
            cell.erase(attr, age);
        }

        // The first shifted-in cell may be a trailing half whose lead was
        // inside the deleted range.
        if self.cells[from].is_continuation() {
            self.cells[from].erase(attr, age);
        }

        if from < self.fill {
            self.fill = self.fill.saturating_sub(num).max(from);
        }
    }

    /// Merge a combining mark onto the cluster at column `x`.
    ///
    /// A blank target defensively becomes a standalone base. Wide-character
    /// placeholders are left untouched.
    pub fn append_combchar(&mut self, x: usize, ucs4: u32, age: Age) {
        if x >= self.width {
            return;
        }
        let was_null = {
            let cell = &self.cells[x];
            if cell.is_continuation() {
                return;
            }
            cell.is_null()
        };

        let cell = &mut self.cells[x];
        let ch = std::mem::take(&mut cell.ch).merge(ucs4);
        if was_null {
            cell.width = ch.lookup_width().max(1) as u8;
        }
        cell.ch = ch;
        cell.age = age;
        self.fill = self.fill.max(x + usize::from(cell.width)).min(self.width);
    }

    /// Blank the cells in `[from, from + num)`.
    ///
    /// With `keep_protected`, cells whose attribute carries the protect
    /// mark survive.
    pub fn erase(&mut self, from: usize, num: usize, attr: Attr, age: Age, keep_protected: bool) {
        if from >= self.width || num == 0 {
            return;
        }
        let to = (from + num).min(self.width);

        // Splitting a wide pair blanks the half left outside the range.
        if self.cells[from].is_continuation() && from > 0 {
            self.cells[from - 1].erase(attr, age);
        }
        if to < self.width && self.cells[to].is_continuation() {
            self.cells[to].erase(attr, age);
        }

        for cell in &mut self.cells[from..to] {
            if keep_protected && cell.attr.is_protected() {
                continue;
            }
            cell.erase(attr, age);
        }

        if !keep_protected && to >= self.fill {
            self.fill = self.fill.min(from);
        }
    }

    /// Blank the whole visible line and stamp the line age.
    pub fn reset(&mut self, attr: Attr, age: Age) {
        for cell in &mut self.cells[..self.width] {
            cell.erase(attr, age);
        }
        self.fill = 0;
        self.age = age;
    }
}
