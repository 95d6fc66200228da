//! Build TextMate grammars out of composable patterns.
//!
//! Rules are written with [`Pattern`]s instead of raw regexes and refer to their
//! capture groups by name or by tagging them with a [`Scope`]. Compiling a
//! [`Grammar`] produces a [`CompiledGrammar`] with the final regexes and
//! numbered captures, which serializes to the usual TextMate JSON.

mod error;
mod grammars;
mod regex;
pub mod scope;

pub use error::{Error, ErrorKind};
pub use grammars::{
    BeginEndRule, CaptureSpec, Captures, CompiledCapture, CompiledCaptures, CompiledGrammar,
    CompiledRule, Grammar, IncludeRule, MatchMode, MatchRule, Mode, PatternsRule, Reference,
    RepositoryEntry, SpanMode, WHOLE_MATCH,
};
pub use regex::{
    CaptureId, Pattern, PatternKind, Precedence, RegexBuild, RegexStats, alt, any_char, any_of,
    capture, cat, digit, ident, keywords, line_end, line_start, literal, look_ahead, look_behind,
    neg_look_ahead, neg_look_behind, opt, raw, rep, rep0, rep1, seq, space, stats, whitespace,
    word_boundary,
};
pub use scope::Scope;
