#![forbid(unsafe_code)]

//! Host-agnostic VT terminal engine core.
//!
//! `emberterm-core` is the platform-independent screen model at the heart of
//! EmberTerm. It owns the cell/line/page data model, the scrollback history,
//! and the DEC/ECMA-48 control-sequence parser — all without any host I/O
//! dependencies.
//!
//! # Primary responsibilities
//!
//! - **Character**: compact grapheme-cluster handle (base + combining marks).
//! - **Cell / Line / Page**: the screen model, with per-cell ageing so that
//!   multiple independently-buffered renderers can each track what they have
//!   already drawn.
//! - **History**: bounded FIFO ring of lines scrolled off the top of the
//!   scroll region.
//! - **Parser**: VT500-series state machine (Paul Flo Williams model) that
//!   turns decoded code points into typed [`Seq`] records.
//! - **UTF-8**: lenient decoder with Latin-1 fallback, plus an encoder.
//! - **Charsets**: 94/96-cell translation tables selected by SCS sequences.
//!
//! # Design principles
//!
//! - **No I/O**: all types are pure data + logic; the host adapter supplies
//!   bytes and executes the parsed commands.
//! - **Deterministic**: identical byte sequences always produce identical
//!   state.
//! - **Pointer-only scrolling**: lines are owned buffers shuffled by move;
//!   scrolling never copies cells.
//! - **`#![forbid(unsafe_code)]`**: safety enforced at compile time.

pub mod cell;
pub mod character;
pub mod charset;
pub mod history;
pub mod line;
pub mod page;
pub mod parser;
pub mod utf8;
pub mod width;

pub use cell::{Age, Attr, AttrFlags, Cell, Color, AGE_NULL};
pub use character::{CharBuf, TermChar};
pub use charset::{Charset, CharsetId, DEC_SPECIAL_GRAPHICS, DEC_SUPPLEMENTAL_GRAPHICS, UNICODE_LOWER, UNICODE_UPPER};
pub use history::History;
pub use line::Line;
pub use page::Page;
pub use parser::{Command, Intermediates, Parser, Seq, SeqType, PARSER_ARG_MAX, PARSER_ST_MAX};
pub use utf8::{utf8_encode, Utf8Decoder};
