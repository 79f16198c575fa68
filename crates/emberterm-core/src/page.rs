//! Terminal page: the 2D cell table backing a screen.
//!
//! Lines are stored as an array of owned [`Line`] values rather than a flat
//! cell matrix, so scrolling is a shuffle of line buffers — cells are never
//! copied. Scrolling is confined to the *scroll region*, a band of
//! `scroll_num` rows starting at `scroll_idx`; lines leaving the top of the
//! band can be handed to a [`History`], and scrolling back down pulls them
//! in again.
//!
//! The page owns the age counter: every mutating operation bumps it and
//! stamps the touched cells, so renderers comparing cell ages against their
//! last-rendered age redraw exactly what changed. Lines that change row
//! (scrolling, resize) get their *line* age stamped, which invalidates all
//! their cells at the new position in one store.
//!
//! The page has no cursor — cursor state belongs to the command dispatcher.

use crate::cell::{Age, Attr, Cell, AGE_NULL};
use crate::character::TermChar;
use crate::history::History;
use crate::line::Line;

/// The visible screen: a grid of lines with a scroll region.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Monotone mutation counter; bumped before every mutation.
    age: Age,
    /// Allocated lines; the first `height` are visible, the rest are
    /// headroom kept for cheap growth.
    lines: Vec<Line>,
    width: usize,
    height: usize,
    scroll_idx: usize,
    scroll_num: usize,
    /// Rows of the scroll region written since the region was configured;
    /// bounds the blanking work on scroll operations.
    scroll_fill: usize,
}

impl Page {
    /// Create a blank page. All cells start with [`AGE_NULL`], so a fresh
    /// framebuffer redraws everything once.
    #[must_use]
    pub fn new(cols: usize, rows: usize) -> Self {
        let lines = (0..rows)
            .map(|_| Line::with_width(cols, Attr::default(), AGE_NULL))
            .collect();
        Self {
            age: AGE_NULL,
            lines,
            width: cols,
            height: rows,
            scroll_idx: 0,
            scroll_num: rows,
            scroll_fill: 0,
        }
    }

    /// Current value of the mutation counter.
    ///
    /// A framebuffer records this after rendering; cells with a larger age
    /// (or [`AGE_NULL`]) have changed since.
    #[must_use]
    pub fn age(&self) -> Age {
        self.age
    }

    /// Visible width in columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Visible height in rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// First row of the scroll region.
    #[must_use]
    pub fn scroll_idx(&self) -> usize {
        self.scroll_idx
    }

    /// Height of the scroll region in rows.
    #[must_use]
    pub fn scroll_num(&self) -> usize {
        self.scroll_num
    }

    /// Number of allocated lines (`>= height`).
    #[must_use]
    pub fn n_lines(&self) -> usize {
        self.lines.len()
    }

    /// Bounds-checked cell accessor; `None` outside the visible area.
    #[must_use]
    pub fn get_cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if y >= self.height {
            return None;
        }
        self.lines[y].cell(x)
    }

    /// Bounds-checked line accessor; `None` outside the visible area.
    #[must_use]
    pub fn line(&self, y: usize) -> Option<&Line> {
        if y >= self.height {
            return None;
        }
        Some(&self.lines[y])
    }

    /// Iterate over the visible lines, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &Line> {
        self.lines[..self.height].iter()
    }

    /// Advance the mutation counter, skipping the [`AGE_NULL`] sentinel on
    /// wraparound.
    fn bump(&mut self) -> Age {
        self.age = self.age.wrapping_add(1);
        if self.age == AGE_NULL {
            self.age = 1;
        }
        self.age
    }

    /// Record that row `y` has been written, for the scroll-fill bound.
    fn touch(&mut self, y: usize) {
        if y >= self.scroll_idx && y < self.scroll_idx + self.scroll_num {
            self.scroll_fill = self.scroll_fill.max(y - self.scroll_idx + 1);
        }
    }

    /// Grow the allocation to at least `cols` × `rows` without changing the
    /// visible size. Existing content is preserved; new cells are blank
    /// with `attr`.
    pub fn reserve(&mut self, cols: usize, rows: usize, attr: Attr) {
        let age = self.bump();
        for line in &mut self.lines {
            if line.n_cells() < cols {
                let protect = line.width();
                line.reserve(cols, attr, age, protect);
            }
        }
        while self.lines.len() < rows {
            let mut line = Line::new();
            line.reserve(cols, attr, age, 0);
            line.set_width(self.width.min(cols));
            self.lines.push(line);
        }
    }

    /// Change the visible size to `cols` × `rows`.
    ///
    /// Shrinking the height evicts top lines into `history` (when given);
    /// growing it pops evicted lines back to refill from the top, falling
    /// back to blank lines below. Width changes reconcile every line
    /// without rewrapping: content beyond a narrowed width is truncated
    /// from view. The scroll region is reset to the full new screen.
    pub fn resize(&mut self, cols: usize, rows: usize, attr: Attr, mut history: Option<&mut History>) {
        if cols == self.width && rows == self.height {
            return;
        }
        let age = self.bump();

        if rows < self.height {
            let excess = self.height - rows;
            for _ in 0..excess {
                let mut line = self.lines.remove(0);
                match history.as_deref_mut() {
                    Some(h) => h.push(line),
                    None => {
                        // Keep the allocation around as headroom.
                        line.reset(attr, age);
                        self.lines.push(line);
                    }
                }
            }
            self.height = rows;
        }

        if cols != self.width {
            for line in &mut self.lines {
                let protect = line.width();
                line.reserve(cols, attr, age, protect);
                line.set_width(cols);
                line.set_age(age);
            }
            self.width = cols;
        }

        if rows > self.height {
            if let Some(h) = history.as_deref_mut() {
                while self.height < rows {
                    match h.pop(cols, attr, age) {
                        Some(mut line) => {
                            line.set_age(age);
                            self.lines.insert(0, line);
                            self.height += 1;
                        }
                        None => break,
                    }
                }
            }
            while self.lines.len() < rows {
                self.lines.push(Line::with_width(cols, attr, age));
            }
            for line in &mut self.lines[self.height..rows] {
                line.reserve(cols, attr, age, 0);
                line.set_width(cols);
                line.set_age(age);
            }
            self.height = rows;
        }

        self.scroll_idx = 0;
        self.scroll_num = rows;
        self.scroll_fill = rows;
    }

    /// Place a cluster at `(x, y)`. See [`Line::write`] for the wide-char
    /// and insert-mode semantics.
    pub fn write(&mut self, x: usize, y: usize, ch: TermChar, cwidth: usize, attr: Attr, insert_mode: bool) {
        if y >= self.height {
            return;
        }
        let age = self.bump();
        self.lines[y].write(x, ch, cwidth, attr, age, insert_mode);
        self.touch(y);
    }

    /// Insert `num` blank cells at `(x, y)`, shifting the rest of the row
    /// right.
    pub fn insert_cells(&mut self, x: usize, y: usize, num: usize, attr: Attr) {
        if y >= self.height {
            return;
        }
        let age = self.bump();
        self.lines[y].insert(x, num, attr, age);
        self.touch(y);
    }

    /// Delete `num` cells at `(x, y)`, shifting the rest of the row left.
    pub fn delete_cells(&mut self, x: usize, y: usize, num: usize, attr: Attr) {
        if y >= self.height {
            return;
        }
        let age = self.bump();
        self.lines[y].delete(x, num, attr, age);
        self.touch(y);
    }

    /// Merge a combining mark onto the cluster at `(x, y)`.
    pub fn append_combchar(&mut self, x: usize, y: usize, ucs4: u32) {
        if y >= self.height {
            return;
        }
        let age = self.bump();
        self.lines[y].append_combchar(x, ucs4, age);
        self.touch(y);
    }

    /// Blank all cells from `(from_x, from_y)` through `(to_x, to_y)`
    /// inclusive, in reading order. Reversed corners are swapped.
    pub fn erase(
        &mut self,
        from_x: usize,
        from_y: usize,
        to_x: usize,
        to_y: usize,
        attr: Attr,
        keep_protected: bool,
    ) {
        let (mut from_x, mut from_y, mut to_x, mut to_y) = (from_x, from_y, to_x, to_y);
        if (from_y, from_x) > (to_y, to_x) {
            std::mem::swap(&mut from_x, &mut to_x);
            std::mem::swap(&mut from_y, &mut to_y);
        }
        if from_y >= self.height {
            return;
        }
        let to_y = to_y.min(self.height.saturating_sub(1));

        let age = self.bump();
        for y in from_y..=to_y {
            let x0 = if y == from_y { from_x } else { 0 };
            let x1 = if y == to_y {
                (to_x + 1).min(self.width)
            } else {
                self.width
            };
            if x0 < x1 {
                self.lines[y].erase(x0, x1 - x0, attr, age, keep_protected);
            }
            self.touch(y);
        }
    }

    /// Blank the whole page and stamp the page age.
    pub fn reset(&mut self, attr: Attr) {
        let age = self.bump();
        for line in &mut self.lines[..self.height] {
            line.reset(attr, age);
        }
        self.scroll_fill = 0;
    }

    /// Configure the scroll region: `num` rows starting at `idx`.
    ///
    /// Degenerate regions (out of range, zero height) reset to the full
    /// screen. The scroll-fill bound is recomputed from the line fills so
    /// content written before the region was configured stays accounted.
    pub fn set_scroll_region(&mut self, idx: usize, num: usize) {
        let idx = idx.min(self.height);
        let num = num.min(self.height - idx);
        if num == 0 {
            self.scroll_idx = 0;
            self.scroll_num = self.height;
        } else {
            self.scroll_idx = idx;
            self.scroll_num = num;
        }
        self.scroll_fill = 0;
        for i in (0..self.scroll_num).rev() {
            if self.lines[self.scroll_idx + i].fill() > 0 {
                self.scroll_fill = i + 1;
                break;
            }
        }
    }

    /// Scroll the region up by `num` rows.
    ///
    /// Lines leaving the top of the region are pushed to `history` when
    /// given (fresh blank lines enter at the bottom); without a history the
    /// same line objects are blanked and recycled at the bottom. Cells are
    /// never copied, only line buffers move.
    pub fn scroll_up(&mut self, num: usize, attr: Attr, mut history: Option<&mut History>) {
        let num = num.min(self.scroll_num);
        if num == 0 {
            return;
        }
        let age = self.bump();
        let start = self.scroll_idx;
        let end = start + self.scroll_num;

        match history.as_deref_mut() {
            Some(h) => {
                for i in start..start + num {
                    let fresh = Line::with_width(self.width, attr, age);
                    h.push(std::mem::replace(&mut self.lines[i], fresh));
                }
            }
            None => {
                // Rows beyond the written bound are already blank.
                for i in start..start + num.min(self.scroll_fill) {
                    self.lines[i].reset(attr, age);
                }
            }
        }

        self.lines[start..end].rotate_left(num);
        for line in &mut self.lines[start..end] {
            line.set_age(age);
        }
        self.scroll_fill = self.scroll_fill.saturating_sub(num);
    }

    /// Scroll the region down by `num` rows.
    ///
    /// Rows entering at the top are popped from `history` when available
    /// (most recently evicted first, so order is restored), otherwise they
    /// are blank.
    pub fn scroll_down(&mut self, num: usize, attr: Attr, mut history: Option<&mut History>) {
        let num = num.min(self.scroll_num);
        if num == 0 {
            return;
        }
        let age = self.bump();
        let start = self.scroll_idx;
        let end = start + self.scroll_num;

        self.lines[start..end].rotate_right(num);
        // Fill the vacated top rows bottom-up: the most recently evicted
        // history line sits directly above the old top row.
        for i in (start..start + num).rev() {
            let popped = match history.as_deref_mut() {
                Some(h) => h.pop(self.width, attr, age),
                None => None,
            };
            match popped {
                Some(mut line) => {
                    line.set_age(age);
                    self.lines[i] = line;
                }
                None => self.lines[i].reset(attr, age),
            }
        }
        for line in &mut self.lines[start..end] {
            line.set_age(age);
        }
        self.scroll_fill = (self.scroll_fill + num).min(self.scroll_num);
    }

    /// Insert `num` blank lines at row `y`, scrolling the rows below down
    /// within the scroll region. A no-op outside the region.
    pub fn insert_lines(&mut self, y: usize, num: usize, attr: Attr) {
        if y < self.scroll_idx || y >= self.scroll_idx + self.scroll_num {
            return;
        }
        let end = self.scroll_idx + self.scroll_num;
        let num = num.min(end - y);
        if num == 0 {
            return;
        }
        let age = self.bump();

        self.lines[y..end].rotate_right(num);
        for line in &mut self.lines[y..y + num] {
            line.reset(attr, age);
        }
        for line in &mut self.lines[y..end] {
            line.set_age(age);
        }
        self.scroll_fill = self.scroll_num;
    }

    /// Delete `num` lines at row `y`, scrolling the rows below up within
    /// the scroll region. A no-op outside the region.
    pub fn delete_lines(&mut self, y: usize, num: usize, attr: Attr) {
        if y < self.scroll_idx || y >= self.scroll_idx + self.scroll_num {
            return;
        }
        let end = self.scroll_idx + self.scroll_num;
        let num = num.min(end - y);
        if num == 0 {
            return;
        }
        let age = self.bump();

        self.lines[y..end].rotate_left(num);
        for line in &mut self.lines[end - num..end] {
            line.reset(attr, age);
        }
        for line in &mut self.lines[y..end] {
            line.set_age(age);
        }
        self.scroll_fill = self.scroll_num;
    }
}
