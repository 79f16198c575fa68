//! Character-set translation tables.
//!
//! DEC terminals map the printable G-set range through one of four slots
//! (G0..G3), each designated by an SCS escape sequence. A table has 96
//! entries covering GL (0x20–0x7F) or GR (0xA0–0xFF). The engine ships the
//! four tables the original hardware families actually differ on — Unicode
//! identity for both halves, DEC Special Graphics (line drawing) and DEC
//! Supplemental Graphics (the DEC Multinational upper half) — and aliases
//! the national-replacement catalog onto them. The parser resolves SCS
//! designators to a [`CharsetId`]; the command dispatcher owns the G0..G3
//! slots and the GL/GR mapping.

/// A 96-entry translation table for one G-set.
pub type Charset = [u32; 96];

const fn identity(base: u32) -> Charset {
    let mut table = [0u32; 96];
    let mut i = 0;
    while i < 96 {
        table[i] = base + i as u32;
        i += 1;
    }
    table
}

/// Unicode identity for the GL range (0x20–0x7F).
pub static UNICODE_LOWER: Charset = identity(0x20);

/// Unicode identity for the GR range (0xA0–0xFF); this is exactly the
/// ISO Latin-1 supplemental set.
pub static UNICODE_UPPER: Charset = identity(0xA0);

const fn dec_special() -> Charset {
    let mut t = identity(0x20);
    // 0x5F..0x7E carry the VT100 line-drawing repertoire.
    t[0x5F - 0x20] = 0x0020; // blank
    t[0x60 - 0x20] = 0x25C6; // ◆ diamond
    t[0x61 - 0x20] = 0x2592; // ▒ checkerboard
    t[0x62 - 0x20] = 0x2409; // ␉ HT symbol
    t[0x63 - 0x20] = 0x240C; // ␌ FF symbol
    t[0x64 - 0x20] = 0x240D; // ␍ CR symbol
    t[0x65 - 0x20] = 0x240A; // ␊ LF symbol
    t[0x66 - 0x20] = 0x00B0; // ° degree
    t[0x67 - 0x20] = 0x00B1; // ± plus-minus
    t[0x68 - 0x20] = 0x2424; // ␤ NL symbol
    t[0x69 - 0x20] = 0x240B; // ␋ VT symbol
    t[0x6A - 0x20] = 0x2518; // ┘
    t[0x6B - 0x20] = 0x2510; // ┐
    t[0x6C - 0x20] = 0x250C; // ┌
    t[0x6D - 0x20] = 0x2514; // └
    t[0x6E - 0x20] = 0x253C; // ┼
    t[0x6F - 0x20] = 0x23BA; // ⎺ scan line 1
    t[0x70 - 0x20] = 0x23BB; // ⎻ scan line 3
    t[0x71 - 0x20] = 0x2500; // ─ scan line 5
    t[0x72 - 0x20] = 0x23BC; // ⎼ scan line 7
    t[0x73 - 0x20] = 0x23BD; // ⎽ scan line 9
    t[0x74 - 0x20] = 0x251C; // ├
    t[0x75 - 0x20] = 0x2524; // ┤
    t[0x76 - 0x20] = 0x2534; // ┴
    t[0x77 - 0x20] = 0x252C; // ┬
    t[0x78 - 0x20] = 0x2502; // │
    t[0x79 - 0x20] = 0x2264; // ≤
    t[0x7A - 0x20] = 0x2265; // ≥
    t[0x7B - 0x20] = 0x03C0; // π
    t[0x7C - 0x20] = 0x2260; // ≠
    t[0x7D - 0x20] = 0x00A3; // £
    t[0x7E - 0x20] = 0x00B7; // · centered dot
    t
}

/// DEC Special Graphics (the VT100 line-drawing set).
pub static DEC_SPECIAL_GRAPHICS: Charset = dec_special();

const fn dec_supplemental() -> Charset {
    let mut t = identity(0xA0);
    // DEC Multinational differs from Latin-1 in a handful of positions;
    // unassigned slots render as the replacement character.
    t[0x00] = 0xFFFD; // 0xA0 unassigned
    t[0x04] = 0xFFFD; // 0xA4
    t[0x06] = 0xFFFD; // 0xA6
    t[0x08] = 0x00A4; // 0xA8 ¤ currency sign
    t[0x0C] = 0xFFFD; // 0xAC
    t[0x0D] = 0xFFFD; // 0xAD
    t[0x0E] = 0xFFFD; // 0xAE
    t[0x0F] = 0xFFFD; // 0xAF
    t[0x14] = 0xFFFD; // 0xB4
    t[0x18] = 0xFFFD; // 0xB8
    t[0x1E] = 0xFFFD; // 0xBE
    t[0x30] = 0xFFFD; // 0xD0
    t[0x37] = 0x0152; // 0xD7 Œ
    t[0x3D] = 0x0178; // 0xDD Ÿ
    t[0x3E] = 0xFFFD; // 0xDE
    t[0x50] = 0xFFFD; // 0xF0
    t[0x57] = 0x0153; // 0xF7 œ
    t[0x5D] = 0x00FF; // 0xFD ÿ
    t[0x5E] = 0xFFFD; // 0xFE
    t[0x5F] = 0xFFFD; // 0xFF
    t
}

/// DEC Supplemental Graphics (DEC Multinational, upper half).
pub static DEC_SUPPLEMENTAL_GRAPHICS: Charset = dec_supplemental();

/// The charset catalog selectable through SCS sequences.
///
/// The original hardware's national-replacement sets mostly alias one of
/// the shipped tables; the IDs stay distinct so the dispatcher can report
/// them back (DECRQUPSS and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharsetId {
    #[default]
    None,

    // 96-cell sets.
    IsoLatin1Supplemental,
    IsoLatin2Supplemental,
    IsoLatin5Supplemental,
    IsoGreekSupplemental,
    IsoHebrewSupplemental,
    IsoLatinCyrillic,

    // 94-cell sets.
    DecSpecialGraphic,
    DecSupplemental,
    DecTechnical,
    CyrillicDec,
    DutchNrcs,
    FinnishNrcs,
    FrenchNrcs,
    FrenchCanadianNrcs,
    GermanNrcs,
    GreekDec,
    GreekNrcs,
    HebrewDec,
    HebrewNrcs,
    ItalianNrcs,
    NorwegianDanishNrcs,
    PortugueseNrcs,
    RussianNrcs,
    ScsNrcs,
    SpanishNrcs,
    SwedishNrcs,
    SwissNrcs,
    TurkishDec,
    TurkishNrcs,

    /// User-preference supplemental slot, reassigned by DECAUPSS.
    UserprefSupplemental,
}

impl CharsetId {
    /// British NRCS aliases the Latin-1 supplemental slot.
    pub const BRITISH_NRCS: Self = Self::IsoLatin1Supplemental;
    /// American NRCS aliases the Latin-2 supplemental slot.
    pub const AMERICAN_NRCS: Self = Self::IsoLatin2Supplemental;

    /// Whether this is a 96-cell set (mapped through GR-range designators).
    #[must_use]
    pub fn is_96(self) -> bool {
        matches!(
            self,
            Self::IsoLatin1Supplemental
                | Self::IsoLatin2Supplemental
                | Self::IsoLatin5Supplemental
                | Self::IsoGreekSupplemental
                | Self::IsoHebrewSupplemental
                | Self::IsoLatinCyrillic
                | Self::UserprefSupplemental
        )
    }

    /// The translation table backing this set.
    ///
    /// Sets without a dedicated table alias Unicode identity, matching the
    /// original's catalog.
    #[must_use]
    pub fn table(self) -> &'static Charset {
        match self {
            Self::DecSpecialGraphic => &DEC_SPECIAL_GRAPHICS,
            Self::DecSupplemental | Self::UserprefSupplemental => &DEC_SUPPLEMENTAL_GRAPHICS,
            s if s.is_96() => &UNICODE_UPPER,
            _ => &UNICODE_LOWER,
        }
    }
}

/// Map a GL-range code point (0x20–0x7F) through a table; other values pass
/// through unchanged.
#[must_use]
pub fn map_gl(table: &Charset, ucs4: u32) -> u32 {
    if (0x20..=0x7F).contains(&ucs4) {
        table[(ucs4 - 0x20) as usize]
    } else {
        ucs4
    }
}

/// Map a GR-range code point (0xA0–0xFF) through a table; other values pass
/// through unchanged.
#[must_use]
pub fn map_gr(table: &Charset, ucs4: u32) -> u32 {
    if (0xA0..=0xFF).contains(&ucs4) {
        table[(ucs4 - 0xA0) as usize]
    } else {
        ucs4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_tables_are_identity() {
        assert_eq!(map_gl(&UNICODE_LOWER, u32::from('q')), u32::from('q'));
        assert_eq!(map_gr(&UNICODE_UPPER, 0xE9), 0xE9);
    }

    #[test]
    fn dec_special_maps_line_drawing() {
        assert_eq!(map_gl(&DEC_SPECIAL_GRAPHICS, u32::from('q')), 0x2500);
        assert_eq!(map_gl(&DEC_SPECIAL_GRAPHICS, u32::from('x')), 0x2502);
        assert_eq!(map_gl(&DEC_SPECIAL_GRAPHICS, u32::from('l')), 0x250C);
        // Positions below 0x5F stay ASCII.
        assert_eq!(map_gl(&DEC_SPECIAL_GRAPHICS, u32::from('A')), u32::from('A'));
    }

    #[test]
    fn dec_supplemental_differs_from_latin1_where_expected() {
        assert_eq!(map_gr(&DEC_SUPPLEMENTAL_GRAPHICS, 0xD7), 0x0152); // Œ, not ×
        assert_eq!(map_gr(&DEC_SUPPLEMENTAL_GRAPHICS, 0xDD), 0x0178); // Ÿ, not Ý
        assert_eq!(map_gr(&DEC_SUPPLEMENTAL_GRAPHICS, 0xE9), 0xE9); // é as in Latin-1
        assert_eq!(map_gr(&DEC_SUPPLEMENTAL_GRAPHICS, 0xFF), 0xFFFD); // unassigned
    }

    #[test]
    fn out_of_range_values_pass_through() {
        assert_eq!(map_gl(&DEC_SPECIAL_GRAPHICS, 0x4E2D), 0x4E2D);
        assert_eq!(map_gr(&DEC_SUPPLEMENTAL_GRAPHICS, 0x41), 0x41);
    }

    #[test]
    fn catalog_tables_resolve() {
        assert_eq!(CharsetId::DecSpecialGraphic.table()[0x71 - 0x20], 0x2500);
        assert!(std::ptr::eq(
            CharsetId::IsoLatin1Supplemental.table(),
            &UNICODE_UPPER
        ));
        assert!(std::ptr::eq(CharsetId::GermanNrcs.table(), &UNICODE_LOWER));
        assert!(CharsetId::IsoLatinCyrillic.is_96());
        assert!(!CharsetId::DecTechnical.is_96());
    }

    #[test]
    fn nrcs_aliases_match_original_catalog() {
        assert_eq!(CharsetId::BRITISH_NRCS, CharsetId::IsoLatin1Supplemental);
        assert_eq!(CharsetId::AMERICAN_NRCS, CharsetId::IsoLatin2Supplemental);
    }
}
