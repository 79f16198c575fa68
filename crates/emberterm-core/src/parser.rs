//! VT control-sequence parser.
//!
//! A deterministic state machine after the DEC VT500-series diagram by Paul
//! Flo Williams, driven one decoded UCS-4 value at a time. Complete
//! sequences surface as a [`Seq`] record: graphic characters, C0/C1
//! controls, escape sequences, CSI functions, DCS and OSC strings. The
//! record carries the resolved [`Command`], the numeric parameters, the
//! collected intermediates and — for string sequences — the raw payload.
//!
//! The parser is side-agnostic: `Parser::new(true)` recognizes the
//! host-to-terminal command set (the usual case), `Parser::new(false)` the
//! terminal-to-host responses (DA/DSR-class replies). Unknown but
//! well-formed sequences still surface with [`Command::None`] so the
//! dispatcher can log or ignore them uniformly.

use bitflags::bitflags;
use smallvec::SmallVec;
use tracing::trace;

use crate::charset::CharsetId;
use crate::utf8::utf8_encode;

/// Maximum number of numeric parameters per sequence.
pub const PARSER_ARG_MAX: usize = 16;
/// Maximum string-payload size in bytes (OSC/DCS/SOS/PM/APC).
pub const PARSER_ST_MAX: usize = 4096;

/// Inline capacity for string payloads.
///
/// Typical OSC payloads (titles, color specs) are short; this keeps them
/// off the heap while oversized ones grow up to [`PARSER_ST_MAX`].
type StBuf = SmallVec<[u8; 32]>;

bitflags! {
    /// Collected intermediate and private-marker characters.
    ///
    /// Intermediates (0x20–0x2F) map to `1 << (ch - 0x20)`; the colon and
    /// semicolon positions are reserved by the parameter syntax. The
    /// private markers `<` `=` `>` `?` (0x3C–0x3F) live in the high bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Intermediates: u32 {
        const SPACE   = 1 << 0;  // ' '
        const BANG    = 1 << 1;  // !
        const DQUOTE  = 1 << 2;  // "
        const HASH    = 1 << 3;  // #
        const CASH    = 1 << 4;  // $
        const PERCENT = 1 << 5;  // %
        const AND     = 1 << 6;  // &
        const SQUOTE  = 1 << 7;  // '
        const POPEN   = 1 << 8;  // (
        const PCLOSE  = 1 << 9;  // )
        const MULT    = 1 << 10; // *
        const PLUS    = 1 << 11; // +
        const COMMA   = 1 << 12; // ,
        const MINUS   = 1 << 13; // -
        const DOT     = 1 << 14; // .
        const SLASH   = 1 << 15; // /

        const LT      = 1 << 28; // <
        const EQUAL   = 1 << 29; // =
        const GT      = 1 << 30; // >
        const WHAT    = 1 << 31; // ?
    }
}

/// Classification of a completed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqType {
    /// A no-op: aborted, overflowed or deliberately ignored input.
    Ignore,
    /// A printable character.
    Graphic,
    /// A C0/C1 control character.
    Control,
    /// An escape sequence (`ESC ... F`).
    Escape,
    /// A control sequence (`CSI ... F`).
    Csi,
    /// A device control string (`DCS ... ST`).
    Dcs,
    /// An operating system command (`OSC ... ST/BEL`).
    Osc,
}

/// The command vocabulary resolved from complete sequences.
///
/// Covers the VT500 series plus the xterm extensions; the dispatcher maps
/// these onto page operations. `None` marks a well-formed but unrecognized
/// sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Placeholder: nothing recognized.
    None,
    /// A graphic character (the code point is [`Seq::terminator`]).
    Graphic,

    Bel,         // bell
    Bs,          // backspace
    Cbt,         // cursor-backward-tabulation
    Cha,         // cursor-horizontal-absolute
    Cht,         // cursor-horizontal-forward-tabulation
    Cnl,         // cursor-next-line
    Cpl,         // cursor-previous-line
    Cr,          // carriage-return
    Cub,         // cursor-backward
    Cud,         // cursor-down
    Cuf,         // cursor-forward
    Cup,         // cursor-position
    Cuu,         // cursor-up
    Da1,         // primary-device-attributes
    Da2,         // secondary-device-attributes
    Da3,         // tertiary-device-attributes
    Dc1,         // device-control-1 (XON)
    Dc3,         // device-control-3 (XOFF)
    Dch,         // delete-character
    DecAln,      // screen-alignment-pattern
    DecAnm,      // ansi-mode
    DecAupss,    // assign-user-preference-supplemental-set
    DecBi,       // back-index
    DecCara,     // change-attributes-in-rectangular-area
    DecCra,      // copy-rectangular-area
    DecDc,       // delete-column
    DecDhlBh,    // double-width-double-height-line: bottom half
    DecDhlTh,    // double-width-double-height-line: top half
    DecDwl,      // double-width-single-height-line
    DecEfr,      // enable-filter-rectangle
    DecElf,      // enable-local-functions
    DecElr,      // enable-locator-reporting
    DecEra,      // erase-rectangular-area
    DecFi,       // forward-index
    DecFra,      // fill-rectangular-area
    DecIc,       // insert-column
    DecId,       // return-terminal-id (obsolete)
    DecInvm,     // invoke-macro
    DecKbd,      // keyboard-language-selection
    DecKpam,     // keypad-application-mode
    DecKpnm,     // keypad-numeric-mode
    DecLfkc,     // local-function-key-control
    DecLl,       // load-leds
    DecLtod,     // load-time-of-day
    DecPcterm,   // pcterm-mode
    DecPka,      // program-key-action
    DecPkfmr,    // program-key-free-memory-report
    DecRara,     // reverse-attributes-in-rectangular-area
    DecRc,       // restore-cursor
    DecReqtparm, // request-terminal-parameters
    DecRpkt,     // report-key-type
    DecRqcra,    // request-checksum-of-rectangular-area
    DecRqde,     // request-display-data
    DecRqkt,     // request-key-type
    DecRqlp,     // request-locator-position
    DecRqmAnsi,  // request-mode-ansi
    DecRqmDec,   // request-mode-dec
    DecRqpkfm,   // request-program-key-free-memory
    DecRqpsr,    // request-presentation-state-report
    DecRqtsr,    // request-terminal-state-report
    DecRqupss,   // request-user-preferred-supplemental-set
    DecSace,     // select-attribute-change-extent
    DecSasd,     // select-active-status-display
    DecSc,       // save-cursor
    DecSca,      // select-character-protection-attribute
    DecScl,      // select-conformance-level
    DecScp,      // select-communication-port
    DecScpp,     // select-columns-per-page
    DecScs,      // select-communication-speed
    DecScusr,    // set-cursor-style
    DecSddt,     // select-disconnect-delay-time
    DecSdpt,     // select-digital-printed-data-type
    DecSed,      // selective-erase-in-display
    DecSel,      // selective-erase-in-line
    DecSera,     // selective-erase-rectangular-area
    DecSfc,      // select-flow-control
    DecSkcv,     // set-key-click-volume
    DecSlck,     // set-lock-key-style
    DecSle,      // select-locator-events
    DecSlpp,     // set-lines-per-page
    DecSlrmOrSc, // set-left-right-margins or save-cursor (ambiguous)
    DecSmbv,     // set-margin-bell-volume
    DecSmkr,     // select-modifier-key-reporting
    DecSnls,     // set-lines-per-screen
    DecSpp,      // set-port-parameter
    DecSppcs,    // select-pro-printer-character-set
    DecSprtt,    // select-printer-type
    DecSr,       // secure-reset
    DecSrfr,     // select-refresh-rate
    DecSscls,    // set-scroll-speed
    DecSsdt,     // select-status-display-line-type
    DecSsl,      // select-setup-language
    DecSt8c,     // set-tab-at-every-8-columns
    DecStbm,     // set-top-and-bottom-margins
    DecStr,      // soft-terminal-reset
    DecStrl,     // set-transmit-rate-limit
    DecSwbv,     // set-warning-bell-volume
    DecSwl,      // single-width-single-height-line
    DecTid,      // select-terminal-id
    DecTme,      // terminal-mode-emulation
    DecTst,      // invoke-confidence-test
    Dl,          // delete-line
    DsrAnsi,     // device-status-report-ansi
    DsrDec,      // device-status-report-dec
    Ech,         // erase-character
    Ed,          // erase-in-display
    El,          // erase-in-line
    Enq,         // enquiry
    Epa,         // end-of-guarded-area
    Ff,          // form-feed
    Hpa,         // horizontal-position-absolute
    Hpr,         // horizontal-position-relative
    Ht,          // horizontal-tab
    Hts,         // horizontal-tab-set
    Hvp,         // horizontal-and-vertical-position
    Ich,         // insert-character
    Il,          // insert-line
    Ind,         // index
    Lf,          // line-feed
    Ls1r,        // locking-shift-1-right
    Ls2,         // locking-shift-2
    Ls2r,        // locking-shift-2-right
    Ls3,         // locking-shift-3
    Ls3r,        // locking-shift-3-right
    McAnsi,      // media-copy-ansi
    McDec,       // media-copy-dec
    Nel,         // next-line
    Np,          // next-page
    Null,        // null byte
    Pp,          // preceding-page
    Ppa,         // page-position-absolute
    Ppb,         // page-position-backward
    Ppr,         // page-position-relative
    Rc,          // restore-cursor (ANSI.SYS)
    Rep,         // repeat
    Ri,          // reverse-index
    Ris,         // reset-to-initial-state
    RmAnsi,      // reset-mode-ansi
    RmDec,       // reset-mode-dec
    S7c1t,       // send-7bit-c1-controls
    S8c1t,       // send-8bit-c1-controls
    Scs,         // select-character-set (the set is [`Seq::charset`])
    Sd,          // scroll-down
    Sgr,         // select-graphic-rendition
    Si,          // shift-in
    SmAnsi,      // set-mode-ansi
    SmDec,       // set-mode-dec
    So,          // shift-out
    Spa,         // start-of-guarded-area
    Ss2,         // single-shift-2
    Ss3,         // single-shift-3
    St,          // string-terminator
    Su,          // scroll-up
    Sub,         // substitute
    Tbc,         // tab-clear
    Vpa,         // vertical-position-absolute
    Vpr,         // vertical-position-relative
    Vt,          // vertical-tab
    XtermCllhp,  // xterm-cursor-lower-left-hp-bugfix
    XtermIhmt,   // xterm-initiate-highlight-mouse-tracking
    XtermMlhp,   // xterm-memory-lock-hp-bugfix
    XtermMuhp,   // xterm-memory-unlock-hp-bugfix
    XtermRpm,    // xterm-restore-private-mode
    XtermRrv,    // xterm-reset-resource-value
    XtermRtm,    // xterm-reset-title-mode
    XtermSacl1,  // xterm-set-ansi-conformance-level-1
    XtermSacl2,  // xterm-set-ansi-conformance-level-2
    XtermSacl3,  // xterm-set-ansi-conformance-level-3
    XtermSdcs,   // xterm-set-default-character-set
    XtermSgfx,   // xterm-sixel-graphics
    XtermSpm,    // xterm-save-private-mode
    XtermSrv,    // xterm-set-resource-value
    XtermStm,    // xterm-set-title-mode
    XtermSucs,   // xterm-set-utf8-character-set
    XtermWm,     // xterm-window-management
}

/// A completed sequence record.
///
/// The record (and in particular the string payload) is only valid until
/// the next [`Parser::feed`] call — the borrow checker enforces exactly
/// this lifetime. Callers that need the payload longer must copy it.
#[derive(Debug, Clone)]
pub struct Seq {
    /// Sequence classification.
    pub seq_type: SeqType,
    /// Resolved command, or [`Command::None`].
    pub command: Command,
    /// Final/terminating code point. For graphics and controls this is the
    /// character itself; for DCS it is the final byte selecting the
    /// command.
    pub terminator: u32,
    /// Collected intermediates and private markers.
    pub intermediates: Intermediates,
    /// Character set resolved from an SCS sequence.
    pub charset: CharsetId,
    n_args: usize,
    args: [i32; PARSER_ARG_MAX],
    st: StBuf,
}

impl Seq {
    fn new() -> Self {
        Self {
            seq_type: SeqType::Ignore,
            command: Command::None,
            terminator: 0,
            intermediates: Intermediates::empty(),
            charset: CharsetId::None,
            n_args: 0,
            args: [-1; PARSER_ARG_MAX],
            st: StBuf::new(),
        }
    }

    /// The numeric parameters. Empty or missing positions hold `-1` so the
    /// dispatcher can apply per-command defaults.
    #[must_use]
    pub fn args(&self) -> &[i32] {
        &self.args[..self.n_args]
    }

    /// Parameter at `idx`, with `default` applied for missing or empty
    /// positions.
    #[must_use]
    pub fn arg_or(&self, idx: usize, default: i32) -> i32 {
        match self.args().get(idx) {
            Some(&v) if v >= 0 => v,
            _ => default,
        }
    }

    /// The string payload of OSC/DCS sequences.
    #[must_use]
    pub fn st(&self) -> &[u8] {
        &self.st
    }
}

/// Parser states, after the VT500 state diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    EscapeInt,
    CsiEntry,
    CsiParam,
    CsiInt,
    CsiIgnore,
    DcsEntry,
    DcsParam,
    DcsInt,
    DcsPass,
    DcsEsc,
    OscString,
    OscEsc,
    StIgnore,
    StIgnoreEsc,
}

/// The control-sequence parser.
#[derive(Debug, Clone)]
pub struct Parser {
    seq: Seq,
    state: State,
    is_host: bool,
    /// Whether the current parameter slot has been opened by a digit or
    /// separator.
    param_open: bool,
    /// String payload hit [`PARSER_ST_MAX`]; the sequence closes as
    /// [`SeqType::Ignore`].
    st_overflow: bool,
}

impl Parser {
    /// Create a parser. `is_host` selects the host-to-terminal command
    /// tables; pass `false` to parse terminal-to-host responses instead.
    #[must_use]
    pub fn new(is_host: bool) -> Self {
        Self {
            seq: Seq::new(),
            state: State::Ground,
            is_host,
            param_open: false,
            st_overflow: false,
        }
    }

    /// Which side this parser handles.
    #[must_use]
    pub fn is_host(&self) -> bool {
        self.is_host
    }

    /// Advance by one decoded code point.
    ///
    /// Returns the completed sequence when `raw` terminates one. The
    /// returned record is valid until the next call.
    pub fn feed(&mut self, raw: u32) -> Option<&Seq> {
        if self.feed_inner(raw) {
            Some(&self.seq)
        } else {
            None
        }
    }

    fn seq_clear(&mut self) {
        self.seq.seq_type = SeqType::Ignore;
        self.seq.command = Command::None;
        self.seq.terminator = 0;
        self.seq.intermediates = Intermediates::empty();
        self.seq.charset = CharsetId::None;
        self.seq.n_args = 0;
        self.seq.args = [-1; PARSER_ARG_MAX];
        self.seq.st.clear();
        self.param_open = false;
        self.st_overflow = false;
    }

    fn feed_inner(&mut self, raw: u32) -> bool {
        // Transitions that apply from any state.
        match raw {
            // CAN / SUB abort the sequence in progress; in ground they
            // surface as plain controls like any other C0 byte.
            0x18 | 0x1A => {
                if self.state != State::Ground {
                    self.state = State::Ground;
                    self.seq_clear();
                    self.seq.seq_type = SeqType::Ignore;
                    self.seq.terminator = raw;
                    return true;
                }
                return self.emit_control(raw);
            }
            0x1B => {
                match self.state {
                    State::OscString => self.state = State::OscEsc,
                    State::DcsPass => self.state = State::DcsEsc,
                    State::StIgnore => self.state = State::StIgnoreEsc,
                    _ => {
                        self.seq_clear();
                        self.state = State::Escape;
                    }
                }
                return false;
            }
            // DEL is ignored everywhere.
            0x7F => return false,
            // C1 controls act from any state.
            0x90 => {
                self.seq_clear();
                self.state = State::DcsEntry;
                return false;
            }
            0x9B => {
                self.seq_clear();
                self.state = State::CsiEntry;
                return false;
            }
            0x9D => {
                self.seq_clear();
                self.state = State::OscString;
                return false;
            }
            0x98 | 0x9E | 0x9F => {
                self.seq_clear();
                self.state = State::StIgnore;
                return false;
            }
            0x9C => {
                // String terminator: closes string sequences, otherwise a
                // bare control.
                return match self.state {
                    State::OscString => self.emit_osc(raw),
                    State::DcsPass => self.emit_dcs(raw),
                    State::StIgnore => self.emit_string_ignore(raw),
                    _ => {
                        self.state = State::Ground;
                        self.emit_control(raw)
                    }
                };
            }
            0x80..=0x9F => {
                // Remaining C1 controls execute and return to ground.
                self.state = State::Ground;
                return self.emit_control(raw);
            }
            _ => {}
        }

        self.dispatch_state(raw)
    }

    fn dispatch_state(&mut self, raw: u32) -> bool {
        match self.state {
            State::Ground => self.feed_ground(raw),
            State::Escape => self.feed_escape(raw),
            State::EscapeInt => self.feed_escape_int(raw),
            State::CsiEntry => self.feed_csi_entry(raw),
            State::CsiParam => self.feed_csi_param(raw),
            State::CsiInt => self.feed_csi_int(raw),
            State::CsiIgnore => self.feed_csi_ignore(raw),
            State::DcsEntry => self.feed_dcs_entry(raw),
            State::DcsParam => self.feed_dcs_param(raw),
            State::DcsInt => self.feed_dcs_int(raw),
            State::DcsPass => self.feed_dcs_pass(raw),
            State::DcsEsc => self.feed_dcs_esc(raw),
            State::OscString => self.feed_osc(raw),
            State::OscEsc => self.feed_osc_esc(raw),
            State::StIgnore => self.feed_st_ignore(raw),
            State::StIgnoreEsc => self.feed_st_ignore_esc(raw),
        }
    }

    // ── Ground ──────────────────────────────────────────────────────

    fn feed_ground(&mut self, raw: u32) -> bool {
        if raw < 0x20 {
            return self.emit_control(raw);
        }
        self.seq_clear();
        self.seq.seq_type = SeqType::Graphic;
        self.seq.command = Command::Graphic;
        self.seq.terminator = raw;
        true
    }

    // ── Escape ──────────────────────────────────────────────────────

    fn feed_escape(&mut self, raw: u32) -> bool {
        match raw {
            0x20..=0x2F => {
                self.collect(raw);
                self.state = State::EscapeInt;
                false
            }
            0x5B => {
                // '[' introduces CSI.
                self.state = State::CsiEntry;
                false
            }
            0x5D => {
                // ']' introduces OSC.
                self.state = State::OscString;
                false
            }
            0x50 => {
                // 'P' introduces DCS.
                self.state = State::DcsEntry;
                false
            }
            0x58 | 0x5E | 0x5F => {
                // 'X' SOS, '^' PM, '_' APC: consumed and ignored.
                self.state = State::StIgnore;
                false
            }
            0x30..=0x7E => self.dispatch_escape(raw),
            _ => {
                // C0 handled globally; anything else aborts.
                if raw < 0x20 {
                    return false;
                }
                self.state = State::Ground;
                false
            }
        }
    }

    fn feed_escape_int(&mut self, raw: u32) -> bool {
        match raw {
            0x20..=0x2F => {
                self.collect(raw);
                false
            }
            0x30..=0x7E => self.dispatch_escape(raw),
            _ => {
                if raw < 0x20 {
                    return false;
                }
                self.state = State::Ground;
                false
            }
        }
    }

    // ── CSI ─────────────────────────────────────────────────────────

    fn feed_csi_entry(&mut self, raw: u32) -> bool {
        match raw {
            0x30..=0x39 => {
                self.param_digit(raw - 0x30);
                self.state = State::CsiParam;
                false
            }
            0x3B => {
                if !self.param_sep() {
                    self.state = State::CsiIgnore;
                } else {
                    self.state = State::CsiParam;
                }
                false
            }
            0x3A => {
                self.param_sub();
                self.state = State::CsiParam;
                false
            }
            0x3C..=0x3F => {
                self.collect(raw);
                self.state = State::CsiParam;
                false
            }
            0x20..=0x2F => {
                self.collect(raw);
                self.state = State::CsiInt;
                false
            }
            0x40..=0x7E => self.dispatch_csi(raw),
            _ => {
                if raw < 0x20 {
                    return false;
                }
                self.state = State::CsiIgnore;
                false
            }
        }
    }

    fn feed_csi_param(&mut self, raw: u32) -> bool {
        match raw {
            0x30..=0x39 => {
                self.param_digit(raw - 0x30);
                false
            }
            0x3B => {
                if !self.param_sep() {
                    self.state = State::CsiIgnore;
                }
                false
            }
            0x3A => {
                self.param_sub();
                false
            }
            0x3C..=0x3F => {
                self.state = State::CsiIgnore;
                false
            }
            0x20..=0x2F => {
                self.collect(raw);
                self.state = State::CsiInt;
                false
            }
            0x40..=0x7E => self.dispatch_csi(raw),
            _ => {
                if raw < 0x20 {
                    return false;
                }
                self.state = State::CsiIgnore;
                false
            }
        }
    }

    fn feed_csi_int(&mut self, raw: u32) -> bool {
        match raw {
            0x20..=0x2F => {
                self.collect(raw);
                false
            }
            0x30..=0x3F => {
                self.state = State::CsiIgnore;
                false
            }
            0x40..=0x7E => self.dispatch_csi(raw),
            _ => {
                if raw < 0x20 {
                    return false;
                }
                self.state = State::CsiIgnore;
                false
            }
        }
    }

    fn feed_csi_ignore(&mut self, raw: u32) -> bool {
        match raw {
            0x40..=0x7E => {
                trace!(terminator = raw, "discarding malformed or oversized CSI");
                self.state = State::Ground;
                self.seq_clear();
                self.seq.seq_type = SeqType::Ignore;
                self.seq.terminator = raw;
                true
            }
            _ => false,
        }
    }

    // ── DCS ─────────────────────────────────────────────────────────

    fn feed_dcs_entry(&mut self, raw: u32) -> bool {
        match raw {
            0x30..=0x39 => {
                self.param_digit(raw - 0x30);
                self.state = State::DcsParam;
                false
            }
            0x3B => {
                if !self.param_sep() {
                    self.state = State::StIgnore;
                } else {
                    self.state = State::DcsParam;
                }
                false
            }
            0x3A => {
                self.param_sub();
                self.state = State::DcsParam;
                false
            }
            0x3C..=0x3F => {
                self.collect(raw);
                self.state = State::DcsParam;
                false
            }
            0x20..=0x2F => {
                self.collect(raw);
                self.state = State::DcsInt;
                false
            }
            0x40..=0x7E => self.enter_dcs_pass(raw),
            _ => {
                if raw < 0x20 {
                    return false;
                }
                self.state = State::StIgnore;
                false
            }
        }
    }

    fn feed_dcs_param(&mut self, raw: u32) -> bool {
        match raw {
            0x30..=0x39 => {
                self.param_digit(raw - 0x30);
                false
            }
            0x3B => {
                if !self.param_sep() {
                    self.state = State::StIgnore;
                }
                false
            }
            0x3A => {
                self.param_sub();
                false
            }
            0x3C..=0x3F => {
                self.state = State::StIgnore;
                false
            }
            0x20..=0x2F => {
                self.collect(raw);
                self.state = State::DcsInt;
                false
            }
            0x40..=0x7E => self.enter_dcs_pass(raw),
            _ => {
                if raw < 0x20 {
                    return false;
                }
                self.state = State::StIgnore;
                false
            }
        }
    }

    fn feed_dcs_int(&mut self, raw: u32) -> bool {
        match raw {
            0x20..=0x2F => {
                self.collect(raw);
                false
            }
            0x30..=0x3F => {
                self.state = State::StIgnore;
                false
            }
            0x40..=0x7E => self.enter_dcs_pass(raw),
            _ => {
                if raw < 0x20 {
                    return false;
                }
                self.state = State::StIgnore;
                false
            }
        }
    }

    fn enter_dcs_pass(&mut self, raw: u32) -> bool {
        self.finish_args();
        self.seq.terminator = raw;
        self.seq.command = if self.is_host {
            host_dcs(raw, self.seq.intermediates)
        } else {
            terminal_dcs(raw, self.seq.intermediates)
        };
        self.state = State::DcsPass;
        false
    }

    fn feed_dcs_pass(&mut self, raw: u32) -> bool {
        self.st_push(raw);
        false
    }

    fn feed_dcs_esc(&mut self, raw: u32) -> bool {
        if raw == 0x5C {
            return self.emit_dcs(0x9C);
        }
        // Not a string terminator: the DCS is abandoned, the escape is
        // processed from scratch.
        self.seq_clear();
        self.state = State::Escape;
        self.dispatch_state(raw)
    }

    // ── OSC ─────────────────────────────────────────────────────────

    fn feed_osc(&mut self, raw: u32) -> bool {
        match raw {
            0x07 => self.emit_osc(raw),
            0x00..=0x1F => false,
            _ => {
                self.st_push(raw);
                false
            }
        }
    }

    fn feed_osc_esc(&mut self, raw: u32) -> bool {
        if raw == 0x5C {
            return self.emit_osc(0x9C);
        }
        self.seq_clear();
        self.state = State::Escape;
        self.dispatch_state(raw)
    }

    // ── SOS / PM / APC ──────────────────────────────────────────────

    fn feed_st_ignore(&mut self, raw: u32) -> bool {
        // Everything up to the string terminator is discarded.
        let _ = raw;
        false
    }

    fn feed_st_ignore_esc(&mut self, raw: u32) -> bool {
        if raw == 0x5C {
            return self.emit_string_ignore(0x9C);
        }
        self.seq_clear();
        self.state = State::Escape;
        self.dispatch_state(raw)
    }

    // ── Accumulation helpers ────────────────────────────────────────

    fn collect(&mut self, raw: u32) {
        let bit = match raw {
            0x20..=0x2F => 1u32 << (raw - 0x20),
            0x3C..=0x3F => 1u32 << (28 + (raw - 0x3C)),
            _ => return,
        };
        self.seq.intermediates |= Intermediates::from_bits_retain(bit);
    }

    fn param_digit(&mut self, digit: u32) {
        self.param_open = true;
        let slot = self.seq.n_args;
        if slot >= PARSER_ARG_MAX {
            return;
        }
        let cur = self.seq.args[slot].max(0);
        self.seq.args[slot] = cur.saturating_mul(10).saturating_add(digit as i32).min(0xFFFF);
    }

    /// Close the current parameter slot. Returns `false` when the argument
    /// limit is exceeded, routing the sequence to IGNORE.
    fn param_sep(&mut self) -> bool {
        self.param_open = true;
        if self.seq.n_args + 1 >= PARSER_ARG_MAX {
            trace!("parameter limit exceeded, ignoring sequence");
            return false;
        }
        self.seq.n_args += 1;
        true
    }

    /// Sub-parameter separator `:` — folded into the current parameter
    /// position (the last sub-value wins).
    fn param_sub(&mut self) {
        self.param_open = true;
        if self.seq.n_args < PARSER_ARG_MAX {
            self.seq.args[self.seq.n_args] = -1;
        }
    }

    fn finish_args(&mut self) {
        if self.param_open && self.seq.n_args < PARSER_ARG_MAX {
            self.seq.n_args += 1;
        }
    }

    fn st_push(&mut self, raw: u32) {
        if self.st_overflow {
            return;
        }
        let mut buf = [0u8; 4];
        let n = utf8_encode(raw, &mut buf);
        if self.seq.st.len() + n > PARSER_ST_MAX {
            trace!("string payload exceeds limit, ignoring sequence");
            self.st_overflow = true;
            return;
        }
        self.seq.st.extend_from_slice(&buf[..n]);
    }

    // ── Emission ────────────────────────────────────────────────────

    fn emit_control(&mut self, raw: u32) -> bool {
        self.seq_clear();
        self.seq.seq_type = SeqType::Control;
        self.seq.command = control_command(raw);
        self.seq.terminator = raw;
        true
    }

    fn dispatch_escape(&mut self, raw: u32) -> bool {
        self.state = State::Ground;
        self.seq.seq_type = SeqType::Escape;
        self.seq.terminator = raw;
        let (command, charset) = if self.is_host {
            host_escape(raw, self.seq.intermediates)
        } else {
            terminal_escape(raw, self.seq.intermediates)
        };
        self.seq.command = command;
        self.seq.charset = charset;
        if command == Command::None {
            trace!(terminator = raw, "unrecognized escape sequence");
        }
        true
    }

    fn dispatch_csi(&mut self, raw: u32) -> bool {
        self.state = State::Ground;
        self.finish_args();
        self.seq.seq_type = SeqType::Csi;
        self.seq.terminator = raw;
        self.seq.command = if self.is_host {
            host_csi(raw, self.seq.intermediates)
        } else {
            terminal_csi(raw, self.seq.intermediates)
        };
        if self.seq.command == Command::None {
            trace!(terminator = raw, "unrecognized CSI sequence");
        }
        true
    }

    fn emit_osc(&mut self, terminator: u32) -> bool {
        self.state = State::Ground;
        self.seq.terminator = terminator;
        if self.st_overflow {
            return self.close_overflowed();
        }
        // OSC carries no resolved command: the payload is the contract and
        // the dispatcher splits it ("0;title", color specs, ...).
        self.seq.seq_type = SeqType::Osc;
        self.seq.command = Command::None;
        true
    }

    fn emit_dcs(&mut self, terminator: u32) -> bool {
        self.state = State::Ground;
        // The command-selecting final byte stays in `terminator`.
        let _ = terminator;
        if self.st_overflow {
            return self.close_overflowed();
        }
        self.seq.seq_type = SeqType::Dcs;
        true
    }

    fn emit_string_ignore(&mut self, terminator: u32) -> bool {
        self.state = State::Ground;
        self.seq_clear();
        self.seq.seq_type = SeqType::Ignore;
        self.seq.terminator = terminator;
        true
    }

    fn close_overflowed(&mut self) -> bool {
        let terminator = self.seq.terminator;
        self.seq_clear();
        self.seq.seq_type = SeqType::Ignore;
        self.seq.terminator = terminator;
        true
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(true)
    }
}

// ── Command lookup tables ──────────────────────────────────────────────

/// C0/C1 control dispatch (both sides).
fn control_command(raw: u32) -> Command {
    match raw {
        0x00 => Command::Null,
        0x05 => Command::Enq,
        0x07 => Command::Bel,
        0x08 => Command::Bs,
        0x09 => Command::Ht,
        0x0A => Command::Lf,
        0x0B => Command::Vt,
        0x0C => Command::Ff,
        0x0D => Command::Cr,
        0x0E => Command::So,
        0x0F => Command::Si,
        0x11 => Command::Dc1,
        0x13 => Command::Dc3,
        0x1A => Command::Sub,
        0x84 => Command::Ind,
        0x85 => Command::Nel,
        0x88 => Command::Hts,
        0x8D => Command::Ri,
        0x8E => Command::Ss2,
        0x8F => Command::Ss3,
        0x96 => Command::Spa,
        0x97 => Command::Epa,
        0x9A => Command::DecId,
        0x9C => Command::St,
        _ => Command::None,
    }
}

/// SCS designator resolution: slot intermediates select 94- vs 96-cell
/// sets, extra intermediates and the final byte pick the set.
fn charset_designator(g96: bool, extra: Intermediates, final_byte: u32) -> Option<CharsetId> {
    use CharsetId::*;
    if g96 {
        if !extra.is_empty() {
            return Option::None;
        }
        return match final_byte {
            0x41 => Some(IsoLatin1Supplemental), // 'A'
            0x42 => Some(IsoLatin2Supplemental), // 'B'
            0x46 => Some(IsoGreekSupplemental),  // 'F'
            0x48 => Some(IsoHebrewSupplemental), // 'H'
            0x4C => Some(IsoLatinCyrillic),      // 'L'
            0x4D => Some(IsoLatin5Supplemental), // 'M'
            0x3C => Some(UserprefSupplemental),  // '<'
            _ => Option::None,
        };
    }
    if extra == Intermediates::PERCENT {
        return match final_byte {
            0x30 => Some(TurkishDec),     // '0'
            0x32 => Some(TurkishNrcs),    // '2'
            0x33 => Some(ScsNrcs),        // '3'
            0x35 => Some(DecSupplemental), // '5' (DEC Supplemental Graphics)
            0x36 => Some(PortugueseNrcs), // '6'
            0x3D => Some(HebrewNrcs),     // '='
            _ => Option::None,
        };
    }
    if extra == Intermediates::DQUOTE {
        return match final_byte {
            0x34 => Some(HebrewDec), // '4'
            0x3E => Some(GreekNrcs), // '>'
            0x3F => Some(GreekDec),  // '?'
            _ => Option::None,
        };
    }
    if extra == Intermediates::AND {
        return match final_byte {
            0x34 => Some(CyrillicDec),  // '4'
            0x35 => Some(RussianNrcs), // '5'
            _ => Option::None,
        };
    }
    if !extra.is_empty() {
        return Option::None;
    }
    match final_byte {
        0x30 => Some(DecSpecialGraphic),             // '0'
        0x34 => Some(DutchNrcs),                     // '4'
        0x35 | 0x43 => Some(FinnishNrcs),            // '5' 'C'
        0x36 | 0x45 | 0x60 => Some(NorwegianDanishNrcs), // '6' 'E' '`'
        0x37 | 0x48 => Some(SwedishNrcs),            // '7' 'H'
        0x39 | 0x51 => Some(FrenchCanadianNrcs),     // '9' 'Q'
        0x3C => Some(UserprefSupplemental),          // '<'
        0x3D => Some(SwissNrcs),                     // '='
        0x3E => Some(DecTechnical),                  // '>'
        0x41 => Some(CharsetId::BRITISH_NRCS),       // 'A'
        0x42 => Some(CharsetId::AMERICAN_NRCS),      // 'B'
        0x4B => Some(GermanNrcs),                    // 'K'
        0x52 | 0x66 => Some(FrenchNrcs),             // 'R' 'f'
        0x59 => Some(ItalianNrcs),                   // 'Y'
        0x5A => Some(SpanishNrcs),                   // 'Z'
        _ => Option::None,
    }
}

/// Host-side escape dispatch.
fn host_escape(final_byte: u32, intm: Intermediates) -> (Command, CharsetId) {
    use Command::*;

    let scs94 = Intermediates::POPEN
        | Intermediates::PCLOSE
        | Intermediates::MULT
        | Intermediates::PLUS;
    let scs96 = Intermediates::MINUS | Intermediates::DOT | Intermediates::SLASH;
    if intm.intersects(scs94 | scs96) {
        let extra = intm & (Intermediates::PERCENT | Intermediates::DQUOTE | Intermediates::AND);
        return match charset_designator(intm.intersects(scs96), extra, final_byte) {
            Some(id) => (Scs, id),
            Option::None => (None, CharsetId::None),
        };
    }

    let command = if intm.is_empty() {
        match final_byte {
            0x36 => DecBi,      // '6'
            0x37 => DecSc,      // '7'
            0x38 => DecRc,      // '8'
            0x39 => DecFi,      // '9'
            0x3C => DecAnm,     // '<' (exit VT52 mode)
            0x3D => DecKpam,    // '='
            0x3E => DecKpnm,    // '>'
            0x44 => Ind,        // 'D'
            0x45 => Nel,        // 'E'
            0x46 => XtermCllhp, // 'F'
            0x48 => Hts,        // 'H'
            0x4D => Ri,         // 'M'
            0x4E => Ss2,        // 'N'
            0x4F => Ss3,        // 'O'
            0x56 => Spa,        // 'V'
            0x57 => Epa,        // 'W'
            0x5A => DecId,      // 'Z'
            0x5C => St,         // '\'
            0x63 => Ris,        // 'c'
            0x6C => XtermMlhp,  // 'l'
            0x6D => XtermMuhp,  // 'm'
            0x6E => Ls2,        // 'n'
            0x6F => Ls3,        // 'o'
            0x7C => Ls3r,       // '|'
            0x7D => Ls2r,       // '}'
            0x7E => Ls1r,       // '~'
            _ => None,
        }
    } else if intm == Intermediates::SPACE {
        match final_byte {
            0x46 => S7c1t,      // 'F'
            0x47 => S8c1t,      // 'G'
            0x4C => XtermSacl1, // 'L'
            0x4D => XtermSacl2, // 'M'
            0x4E => XtermSacl3, // 'N'
            _ => None,
        }
    } else if intm == Intermediates::HASH {
        match final_byte {
            0x33 => DecDhlTh, // '3'
            0x34 => DecDhlBh, // '4'
            0x35 => DecSwl,   // '5'
            0x36 => DecDwl,   // '6'
            0x38 => DecAln,   // '8'
            _ => None,
        }
    } else if intm == Intermediates::PERCENT {
        match final_byte {
            0x40 => XtermSdcs, // '@'
            0x47 => XtermSucs, // 'G'
            _ => None,
        }
    } else {
        None
    };

    (command, CharsetId::None)
}

/// Terminal-side escape dispatch: responses only carry ST.
fn terminal_escape(final_byte: u32, intm: Intermediates) -> (Command, CharsetId) {
    if intm.is_empty() && final_byte == 0x5C {
        return (Command::St, CharsetId::None);
    }
    (Command::None, CharsetId::None)
}

/// Host-side CSI dispatch, keyed on the final byte plus the collected
/// intermediates and private markers.
fn host_csi(final_byte: u32, intm: Intermediates) -> Command {
    use Command::*;

    if intm.is_empty() {
        return match final_byte {
            0x40 => Ich,         // '@'
            0x41 => Cuu,         // 'A'
            0x42 => Cud,         // 'B'
            0x43 => Cuf,         // 'C'
            0x44 => Cub,         // 'D'
            0x45 => Cnl,         // 'E'
            0x46 => Cpl,         // 'F'
            0x47 => Cha,         // 'G'
            0x48 => Cup,         // 'H'
            0x49 => Cht,         // 'I'
            0x4A => Ed,          // 'J'
            0x4B => El,          // 'K'
            0x4C => Il,          // 'L'
            0x4D => Dl,          // 'M'
            0x50 => Dch,         // 'P'
            0x53 => Su,          // 'S'
            0x54 => Sd,          // 'T'
            0x55 => Np,          // 'U'
            0x56 => Pp,          // 'V'
            0x58 => Ech,         // 'X'
            0x5A => Cbt,         // 'Z'
            0x60 => Hpa,         // '`'
            0x61 => Hpr,         // 'a'
            0x62 => Rep,         // 'b'
            0x63 => Da1,         // 'c'
            0x64 => Vpa,         // 'd'
            0x65 => Vpr,         // 'e'
            0x66 => Hvp,         // 'f'
            0x67 => Tbc,         // 'g'
            0x68 => SmAnsi,      // 'h'
            0x69 => McAnsi,      // 'i'
            0x6C => RmAnsi,      // 'l'
            0x6D => Sgr,         // 'm'
            0x6E => DsrAnsi,     // 'n'
            0x71 => DecLl,       // 'q'
            0x72 => DecStbm,     // 'r'
            0x73 => DecSlrmOrSc, // 's'
            0x74 => XtermWm,     // 't'
            0x75 => Rc,          // 'u'
            0x78 => DecReqtparm, // 'x'
            0x79 => DecTst,      // 'y'
            _ => None,
        };
    }

    if intm == Intermediates::WHAT {
        return match final_byte {
            0x4A => DecSed,   // 'J'
            0x4B => DecSel,   // 'K'
            0x53 => XtermSgfx, // 'S'
            0x57 => DecSt8c,  // 'W'
            0x68 => SmDec,    // 'h'
            0x69 => McDec,    // 'i'
            0x6C => RmDec,    // 'l'
            0x6E => DsrDec,   // 'n'
            0x72 => XtermRpm, // 'r'
            0x73 => XtermSpm, // 's'
            _ => None,
        };
    }

    if intm == Intermediates::GT {
        return match final_byte {
            0x54 => XtermRtm, // 'T'
            0x63 => Da2,      // 'c'
            0x6D => XtermSrv, // 'm'
            0x6E => XtermRrv, // 'n'
            0x74 => XtermStm, // 't'
            _ => None,
        };
    }

    if intm == Intermediates::EQUAL {
        return match final_byte {
            0x63 => Da3, // 'c'
            _ => None,
        };
    }

    if intm == Intermediates::BANG {
        return match final_byte {
            0x70 => DecStr, // 'p'
            _ => None,
        };
    }

    if intm == Intermediates::DQUOTE {
        return match final_byte {
            0x70 => DecScl,  // 'p'
            0x71 => DecSca,  // 'q'
            0x74 => DecSrfr, // 't'
            0x75 => DecStrl, // 'u'
            0x76 => DecRqde, // 'v'
            _ => None,
        };
    }

    if intm == Intermediates::CASH {
        return match final_byte {
            0x70 => DecRqmAnsi, // 'p'
            0x71 => DecSddt,    // 'q'
            0x72 => DecCara,    // 'r'
            0x73 => DecSprtt,   // 's'
            0x74 => DecRara,    // 't'
            0x75 => DecRqtsr,   // 'u'
            0x76 => DecCra,     // 'v'
            0x77 => DecRqpsr,   // 'w'
            0x78 => DecFra,     // 'x'
            0x7A => DecEra,     // 'z'
            0x7B => DecSera,    // '{'
            0x7C => DecScpp,    // '|'
            0x7D => DecSasd,    // '}'
            0x7E => DecSsdt,    // '~'
            _ => None,
        };
    }

    if intm == Intermediates::CASH | Intermediates::WHAT {
        return match final_byte {
            0x70 => DecRqmDec, // 'p'
            _ => None,
        };
    }

    if intm == Intermediates::SPACE {
        return match final_byte {
            0x50 => Ppa,      // 'P'
            0x51 => Ppr,      // 'Q'
            0x52 => Ppb,      // 'R'
            0x70 => DecSscls, // 'p'
            0x71 => DecScusr, // 'q'
            0x72 => DecSkcv,  // 'r'
            0x74 => DecSwbv,  // 't'
            0x75 => DecSmbv,  // 'u'
            0x76 => DecSlck,  // 'v'
            _ => None,
        };
    }

    if intm == Intermediates::SQUOTE {
        return match final_byte {
            0x77 => DecEfr,  // 'w'
            0x7A => DecElr,  // 'z'
            0x7B => DecSle,  // '{'
            0x7C => DecRqlp, // '|'
            0x7D => DecIc,   // '}'
            0x7E => DecDc,   // '~'
            _ => None,
        };
    }

    if intm == Intermediates::MULT {
        return match final_byte {
            0x70 => DecSppcs, // 'p'
            0x72 => DecScs,   // 'r'
            0x73 => DecSfc,   // 's'
            0x75 => DecScp,   // 'u'
            0x78 => DecSace,  // 'x'
            0x79 => DecRqcra, // 'y'
            0x7A => DecInvm,  // 'z'
            0x7C => DecSnls,  // '|'
            0x7D => DecLfkc,  // '}'
            _ => None,
        };
    }

    if intm == Intermediates::PLUS {
        return match final_byte {
            0x70 => DecSr,     // 'p'
            0x71 => DecElf,    // 'q'
            0x72 => DecSmkr,   // 'r'
            0x77 => DecSpp,    // 'w'
            0x78 => DecRqpkfm, // 'x'
            0x7A => DecPka,    // 'z'
            _ => None,
        };
    }

    if intm == Intermediates::COMMA {
        return match final_byte {
            0x70 => DecLtod, // 'p'
            0x71 => DecTid,  // 'q'
            0x75 => DecRqkt, // 'u'
            0x77 => DecKbd,  // 'w'
            _ => None,
        };
    }

    if intm == Intermediates::AND {
        return match final_byte {
            0x75 => DecRqupss, // 'u'
            _ => None,
        };
    }

    None
}

/// Terminal-side CSI dispatch: the responses a host parses back.
fn terminal_csi(final_byte: u32, intm: Intermediates) -> Command {
    use Command::*;

    if intm.is_empty() {
        return match final_byte {
            0x52 => DsrAnsi,     // 'R' cursor position report
            0x6E => DsrAnsi,     // 'n'
            0x78 => DecReqtparm, // 'x' terminal parameters report
            _ => None,
        };
    }
    if intm == Intermediates::WHAT {
        return match final_byte {
            0x52 => DsrDec, // 'R' extended cursor position report
            0x63 => Da1,    // 'c' DA1 response
            0x6E => DsrDec, // 'n'
            _ => None,
        };
    }
    if intm == Intermediates::GT {
        return match final_byte {
            0x63 => Da2, // 'c'
            _ => None,
        };
    }
    if intm == Intermediates::EQUAL {
        return match final_byte {
            0x63 => Da3, // 'c'
            _ => None,
        };
    }
    if intm == Intermediates::CASH {
        return match final_byte {
            0x79 => DecRqmAnsi, // 'y' mode report
            _ => None,
        };
    }
    if intm == Intermediates::CASH | Intermediates::WHAT {
        return match final_byte {
            0x79 => DecRqmDec, // 'y'
            _ => None,
        };
    }
    None
}

/// Host-side DCS dispatch, resolved at the final byte that opens the
/// passthrough.
fn host_dcs(final_byte: u32, intm: Intermediates) -> Command {
    if intm == Intermediates::BANG && final_byte == 0x75 {
        // DCS ! u D..D ST assigns the user-preference supplemental set.
        return Command::DecAupss;
    }
    Command::None
}

/// Terminal-side DCS dispatch: the string reports a host parses back.
fn terminal_dcs(final_byte: u32, intm: Intermediates) -> Command {
    if intm == Intermediates::PLUS && final_byte == 0x78 {
        // DCS + x ... ST reports program key free memory.
        return Command::DecPkfmr;
    }
    if intm == Intermediates::BANG && final_byte == 0x7E {
        // DCS Ps ! ~ ... ST reports the key type.
        return Command::DecRpkt;
    }
    Command::None
}
