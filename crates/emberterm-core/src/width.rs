//! Column-width lookup for UCS-4 values.
//!
//! Thin shims over [`unicode_width`] that keep the classic `wcwidth`
//! convention: `-1` for non-printables, `0` for combining marks, `1` for
//! narrow and `2` for wide characters. The CJK variants treat the Unicode
//! "ambiguous" class as wide, which legacy East-Asian hosts expect.

use unicode_width::UnicodeWidthChar;

/// Column width of a single UCS-4 value.
///
/// Returns `-1` for non-printables (C0/C1 controls, surrogates, values above
/// U+10FFFF), `0` for zero-width combining marks, `1` for narrow and `2` for
/// wide characters.
#[must_use]
pub fn ucs4_width(ucs4: u32) -> i8 {
    match char::from_u32(ucs4) {
        Some(ch) => match ch.width() {
            Some(w) => w as i8,
            None => -1,
        },
        None => -1,
    }
}

/// Column width of a single UCS-4 value, East-Asian ambiguous treated as wide.
#[must_use]
pub fn ucs4_width_cjk(ucs4: u32) -> i8 {
    match char::from_u32(ucs4) {
        Some(ch) => match ch.width_cjk() {
            Some(w) => w as i8,
            None => -1,
        },
        None => -1,
    }
}

/// Total column width of a UCS-4 sequence.
///
/// Returns `None` if any code point in the sequence is a non-printable,
/// matching the `wcswidth` contract.
#[must_use]
pub fn seq_width(seq: &[u32]) -> Option<usize> {
    let mut total = 0usize;
    for &cp in seq {
        let w = ucs4_width(cp);
        if w < 0 {
            return None;
        }
        total += w as usize;
    }
    Some(total)
}

/// Total column width of a UCS-4 sequence, ambiguous treated as wide.
#[must_use]
pub fn seq_width_cjk(seq: &[u32]) -> Option<usize> {
    let mut total = 0usize;
    for &cp in seq {
        let w = ucs4_width_cjk(cp);
        if w < 0 {
            return None;
        }
        total += w as usize;
    }
    Some(total)
}
