//! Composable building blocks for regexes.
//!
//! A [`Pattern`] is an immutable tree that is cheap to clone and can be shared
//! between rules and grammars. Capture groups are identified by a [`CaptureId`]
//! given when the node is created, not by their name or their position, so the
//! same sub-pattern can be reused anywhere and still get correct group numbers
//! once compiled.

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::scope::Scope;

/// Stable identity of a capture group, assigned when the node is built
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CaptureId(u32);

impl CaptureId {
    fn fresh() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        CaptureId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Deref for CaptureId {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum PatternKind {
    /// Raw regex source, literals are escaped before being stored here
    Leaf(String),
    Sequence(Pattern, Pattern),
    Alternation(Pattern, Pattern),
    /// `max: None` means unbounded
    Repetition {
        element: Pattern,
        min: u32,
        max: Option<u32>,
    },
    /// A numbered group that can be looked up by name
    Capture {
        element: Pattern,
        name: String,
        id: CaptureId,
    },
    /// Zero-width assertion
    Lookaround {
        element: Pattern,
        behind: bool,
        negate: bool,
    },
    /// Attaches scopes to the nearest capture. If `element` is not a capture,
    /// it gets wrapped in an unnamed one with the `implicit` id.
    Tag {
        element: Pattern,
        tags: Vec<Scope>,
        implicit: CaptureId,
    },
}

#[derive(Debug, Clone)]
pub struct Pattern(Arc<PatternKind>);

impl Pattern {
    fn new(kind: PatternKind) -> Self {
        Pattern(Arc::new(kind))
    }

    pub fn kind(&self) -> &PatternKind {
        &self.0
    }

    /// The identity of this pattern if it is a capture
    pub fn capture_id(&self) -> Option<CaptureId> {
        match self.kind() {
            PatternKind::Capture { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// This pattern followed by `other`
    pub fn then(self, other: Pattern) -> Pattern {
        cat(self, other)
    }

    /// Either this pattern or `other`
    pub fn or(self, other: Pattern) -> Pattern {
        alt(self, other)
    }

    pub fn repeat(self, min: u32, max: Option<u32>) -> Pattern {
        rep(self, min, max)
    }

    pub fn optional(self) -> Pattern {
        opt(self)
    }

    pub fn zero_or_more(self) -> Pattern {
        rep0(self)
    }

    pub fn one_or_more(self) -> Pattern {
        rep1(self)
    }

    pub fn capture(self, name: impl Into<String>) -> Pattern {
        capture(self, name)
    }

    /// Highlights whatever this pattern matches with `scope`.
    ///
    /// Tagging a capture attaches the scope to that capture, tagging anything else
    /// wraps it in a new capture group first.
    pub fn tag(self, scope: Scope) -> Pattern {
        self.tags([scope])
    }

    pub fn tags(self, scopes: impl IntoIterator<Item = Scope>) -> Pattern {
        Pattern::new(PatternKind::Tag {
            element: self,
            tags: scopes.into_iter().collect(),
            implicit: CaptureId::fresh(),
        })
    }
}

/// Escapes every regex metacharacter in `text`
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Matches `text` exactly
pub fn literal(text: &str) -> Pattern {
    Pattern::new(PatternKind::Leaf(escape(text)))
}

/// Uses `regex` as is
pub fn raw(regex: impl Into<String>) -> Pattern {
    Pattern::new(PatternKind::Leaf(regex.into()))
}

pub fn cat(first: Pattern, second: Pattern) -> Pattern {
    Pattern::new(PatternKind::Sequence(first, second))
}

/// All the patterns one after the other. An empty list matches the empty string.
pub fn seq(patterns: impl IntoIterator<Item = Pattern>) -> Pattern {
    patterns.into_iter().reduce(cat).unwrap_or_else(|| raw(""))
}

pub fn alt(first: Pattern, second: Pattern) -> Pattern {
    Pattern::new(PatternKind::Alternation(first, second))
}

/// Any one of the patterns. An empty list never matches.
pub fn any_of(patterns: impl IntoIterator<Item = Pattern>) -> Pattern {
    patterns.into_iter().reduce(alt).unwrap_or_else(|| raw("(?!)"))
}

pub fn rep(element: Pattern, min: u32, max: Option<u32>) -> Pattern {
    Pattern::new(PatternKind::Repetition { element, min, max })
}

pub fn rep0(element: Pattern) -> Pattern {
    rep(element, 0, None)
}

pub fn rep1(element: Pattern) -> Pattern {
    rep(element, 1, None)
}

pub fn opt(element: Pattern) -> Pattern {
    rep(element, 0, Some(1))
}

pub fn capture(element: Pattern, name: impl Into<String>) -> Pattern {
    Pattern::new(PatternKind::Capture {
        element,
        name: name.into(),
        id: CaptureId::fresh(),
    })
}

fn lookaround(element: Pattern, behind: bool, negate: bool) -> Pattern {
    Pattern::new(PatternKind::Lookaround {
        element,
        behind,
        negate,
    })
}

pub fn look_ahead(element: Pattern) -> Pattern {
    lookaround(element, false, false)
}

pub fn neg_look_ahead(element: Pattern) -> Pattern {
    lookaround(element, false, true)
}

pub fn look_behind(element: Pattern) -> Pattern {
    lookaround(element, true, false)
}

pub fn neg_look_behind(element: Pattern) -> Pattern {
    lookaround(element, true, true)
}

/// Any of the given words, as whole words
pub fn keywords<'a>(words: impl IntoIterator<Item = &'a str>) -> Pattern {
    seq([
        word_boundary(),
        any_of(words.into_iter().map(literal)),
        word_boundary(),
    ])
}

/// A space or a tab
pub fn space() -> Pattern {
    raw(r"[ \t]")
}

pub fn whitespace() -> Pattern {
    raw(r"\s")
}

/// A C-like identifier
pub fn ident() -> Pattern {
    raw(r"[A-Za-z_][A-Za-z0-9_]*")
}

pub fn digit() -> Pattern {
    raw(r"\d")
}

pub fn word_boundary() -> Pattern {
    raw(r"\b")
}

pub fn line_start() -> Pattern {
    raw("^")
}

pub fn line_end() -> Pattern {
    raw("$")
}

pub fn any_char() -> Pattern {
    raw(".")
}
