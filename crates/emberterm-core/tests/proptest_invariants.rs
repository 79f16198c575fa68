//! Property-based invariant tests.
//!
//! These verify structural invariants that must hold for **any** input:
//!
//! 1. Every visible line matches the page width and keeps `fill <= width`.
//! 2. Cell ages never exceed the page age; the page age is monotone.
//! 3. The history never exceeds its configured capacity.
//! 4. The scroll region stays inside the page.
//! 5. The parser (fed through the lenient decoder) never panics and always
//!    recovers to ground.
//! 6. UTF-8 encode/decode round-trips all scalar values.
//! 7. Scrolling without a history is a pure permutation of line buffers.

use emberterm_core::{Attr, History, Page, Parser, TermChar, Utf8Decoder, utf8_encode};
use proptest::prelude::*;

fn attr() -> Attr {
    Attr::default()
}

/// A randomly generated page mutation.
#[derive(Debug, Clone)]
enum Op {
    Write { x: usize, y: usize, c: char, wide: bool, insert: bool },
    CombChar { x: usize, y: usize },
    InsertCells { x: usize, y: usize, n: usize },
    DeleteCells { x: usize, y: usize, n: usize },
    Erase { x0: usize, y0: usize, x1: usize, y1: usize },
    Reset,
    SetRegion { idx: usize, num: usize },
    ScrollUp(usize),
    ScrollDown(usize),
    InsertLines { y: usize, n: usize },
    DeleteLines { y: usize, n: usize },
    Resize { cols: usize, rows: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..140, 0usize..70, proptest::char::any(), any::<bool>(), any::<bool>()).prop_map(
            |(x, y, c, wide, insert)| Op::Write { x, y, c, wide, insert }
        ),
        (0usize..140, 0usize..70).prop_map(|(x, y)| Op::CombChar { x, y }),
        (0usize..140, 0usize..70, 0usize..10).prop_map(|(x, y, n)| Op::InsertCells { x, y, n }),
        (0usize..140, 0usize..70, 0usize..10).prop_map(|(x, y, n)| Op::DeleteCells { x, y, n }),
        (0usize..140, 0usize..70, 0usize..140, 0usize..70)
            .prop_map(|(x0, y0, x1, y1)| Op::Erase { x0, y0, x1, y1 }),
        Just(Op::Reset),
        (0usize..70, 0usize..70).prop_map(|(idx, num)| Op::SetRegion { idx, num }),
        (0usize..80).prop_map(Op::ScrollUp),
        (0usize..80).prop_map(Op::ScrollDown),
        (0usize..70, 0usize..10).prop_map(|(y, n)| Op::InsertLines { y, n }),
        (0usize..70, 0usize..10).prop_map(|(y, n)| Op::DeleteLines { y, n }),
        (1usize..120, 1usize..60).prop_map(|(cols, rows)| Op::Resize { cols, rows }),
    ]
}

fn apply(op: &Op, page: &mut Page, history: &mut History) {
    match *op {
        Op::Write { x, y, c, wide, insert } => {
            let cwidth = if wide { 2 } else { 1 };
            page.write(x, y, TermChar::from_base(u32::from(c)), cwidth, attr(), insert);
        }
        Op::CombChar { x, y } => page.append_combchar(x, y, 0x0301),
        Op::InsertCells { x, y, n } => page.insert_cells(x, y, n, attr()),
        Op::DeleteCells { x, y, n } => page.delete_cells(x, y, n, attr()),
        Op::Erase { x0, y0, x1, y1 } => page.erase(x0, y0, x1, y1, attr(), false),
        Op::Reset => page.reset(attr()),
        Op::SetRegion { idx, num } => page.set_scroll_region(idx, num),
        Op::ScrollUp(n) => page.scroll_up(n, attr(), Some(history)),
        Op::ScrollDown(n) => page.scroll_down(n, attr(), Some(history)),
        Op::InsertLines { y, n } => page.insert_lines(y, n, attr()),
        Op::DeleteLines { y, n } => page.delete_lines(y, n, attr()),
        Op::Resize { cols, rows } => page.resize(cols, rows, attr(), Some(history)),
    }
}

fn check_structure(page: &Page, history: &History, max_lines: usize) {
    for y in 0..page.height() {
        let line = page.line(y).expect("visible rows always exist");
        assert_eq!(line.width(), page.width(), "row {y} width");
        assert!(line.fill() <= line.width(), "row {y} fill");
    }
    assert!(page.scroll_idx() + page.scroll_num() <= page.height());
    assert!(history.len() <= max_lines);
}

proptest! {
    #[test]
    fn page_structure_survives_any_mutation(
        (cols, rows) in (1usize..120, 1usize..60),
        ops in proptest::collection::vec(op_strategy(), 0..60),
    ) {
        let mut page = Page::new(cols, rows);
        let mut history = History::new(50);
        for op in &ops {
            apply(op, &mut page, &mut history);
            check_structure(&page, &history, 50);
        }
    }

    #[test]
    fn page_age_is_monotone_and_bounds_cells(
        (cols, rows) in (1usize..60, 1usize..30),
        ops in proptest::collection::vec(op_strategy(), 0..40),
    ) {
        let mut page = Page::new(cols, rows);
        let mut history = History::new(20);
        let mut last_age = page.age();
        for op in &ops {
            apply(op, &mut page, &mut history);
            prop_assert!(page.age() >= last_age, "page age must not regress");
            last_age = page.age();
            for y in 0..page.height() {
                for x in 0..page.width() {
                    let cell = page.get_cell(x, y).unwrap();
                    prop_assert!(
                        cell.age <= page.age(),
                        "cell ({x},{y}) stamped beyond the page counter"
                    );
                }
            }
        }
    }

    #[test]
    fn history_respects_capacity(
        max in 0usize..40,
        pushes in 0usize..120,
    ) {
        let mut page = Page::new(10, 5);
        let mut history = History::new(max);
        for i in 0..pushes {
            page.write(0, 0, TermChar::from_base(u32::from('a') + (i as u32 % 26)), 1, attr(), false);
            page.scroll_up(1, attr(), Some(&mut history));
            prop_assert!(history.len() <= max);
        }
        history.trim(max / 2);
        prop_assert!(history.len() <= max / 2);
    }

    #[test]
    fn parser_never_panics_and_recovers(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut decoder = Utf8Decoder::new();
        let mut parser = Parser::new(true);
        for &b in &bytes {
            for &cp in decoder.feed(b) {
                let _ = parser.feed(cp);
            }
        }
        // CAN forces the machine back to ground; the next printable must
        // surface as a graphic.
        let _ = parser.feed(0x18);
        let seq = parser.feed(u32::from('A')).expect("ground state after CAN");
        prop_assert_eq!(seq.terminator, u32::from('A'));
    }

    #[test]
    fn utf8_round_trips_all_scalars(c in proptest::char::any()) {
        let mut decoder = Utf8Decoder::new();
        let mut buf = [0u8; 4];
        let n = utf8_encode(u32::from(c), &mut buf);
        let mut out = Vec::new();
        for &b in &buf[..n] {
            out.extend_from_slice(decoder.feed(b));
        }
        prop_assert_eq!(out, vec![u32::from(c)]);
    }

    #[test]
    fn char_clones_compare_equal(
        base in proptest::char::any(),
        marks in proptest::collection::vec(0x0300u32..0x0370, 0..6),
    ) {
        let mut ch = TermChar::from_base(u32::from(base));
        for &m in &marks {
            ch = ch.merge(m);
        }
        let dup = ch.dup();
        prop_assert_eq!(&ch, &dup);
        if ch.is_allocated() {
            prop_assert!(!ch.same(&dup), "deep copies are distinct identities");
        }
        prop_assert!(!TermChar::NULL.is_allocated());
    }

    #[test]
    fn scrolling_without_history_permutes_line_buffers(
        (cols, rows) in (1usize..40, 2usize..30),
        scrolls in proptest::collection::vec((any::<bool>(), 0usize..40), 1..20),
    ) {
        let mut page = Page::new(cols, rows);
        for y in 0..rows {
            page.write(0, y, TermChar::from_base(u32::from('x')), 1, attr(), false);
        }
        let mut before: Vec<_> = (0..rows).map(|y| page.line(y).unwrap().cells().as_ptr()).collect();
        for &(up, n) in &scrolls {
            if up {
                page.scroll_up(n, attr(), None);
            } else {
                page.scroll_down(n, attr(), None);
            }
        }
        let mut after: Vec<_> = (0..rows).map(|y| page.line(y).unwrap().cells().as_ptr()).collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after, "scroll must only rotate line buffers");
    }
}
