use std::collections::BTreeMap;
use std::fmt;

use crate::regex::Pattern;
use crate::scope::Scope;

/// Capture name that always refers to the whole match, group 0
pub const WHOLE_MATCH: &str = "$all";

/// Where an include points to.
///
/// Per the TextMate format:
///  * `#name` for a rule of the grammar repository
///  * `$self` for the root patterns of the current grammar
///  * `$base` for the root patterns of the grammar that started highlighting
///  * `source.lang` for the root patterns of another grammar
///  * `source.lang#name` for a repository rule of another grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Local(String),
    SelfGrammar,
    Base,
    External(String),
    ExternalRule(String, String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Local(name) => write!(f, "#{name}"),
            Reference::SelfGrammar => f.write_str("$self"),
            Reference::Base => f.write_str("$base"),
            Reference::External(scope) => f.write_str(scope),
            Reference::ExternalRule(scope, name) => write!(f, "{scope}#{name}"),
        }
    }
}

/// What to do with a capture group declared by name in a mode
#[derive(Debug, Clone)]
pub enum CaptureSpec {
    /// Highlight the group with that scope
    Scope(Scope),
    /// Run more rules on the text of the group
    Rule {
        scope: Option<Scope>,
        patterns: Vec<Mode>,
    },
}

impl From<Scope> for CaptureSpec {
    fn from(value: Scope) -> Self {
        CaptureSpec::Scope(value)
    }
}

/// Captures declared by the author, keyed by capture name or [`WHOLE_MATCH`]
#[derive(Debug, Clone, Default)]
pub struct Captures(pub(crate) BTreeMap<String, CaptureSpec>);

impl Captures {
    pub fn insert(&mut self, name: impl Into<String>, spec: impl Into<CaptureSpec>) {
        self.0.insert(name.into(), spec.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CaptureSpec)> {
        self.0.iter()
    }
}

/// A rule matching a single regex
#[derive(Debug, Clone)]
pub struct MatchMode {
    pub(crate) scope: Option<Scope>,
    pub(crate) pattern: Pattern,
    pub(crate) captures: Captures,
    pub(crate) contains: Vec<Mode>,
}

impl MatchMode {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            scope: None,
            pattern,
            captures: Captures::default(),
            contains: Vec::new(),
        }
    }

    /// Scope of the whole match
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// What to do with the capture called `name`
    pub fn capture(mut self, name: impl Into<String>, spec: impl Into<CaptureSpec>) -> Self {
        self.captures.insert(name, spec);
        self
    }

    pub fn contains(mut self, modes: impl IntoIterator<Item = Mode>) -> Self {
        self.contains.extend(modes);
        self
    }
}

/// A rule starting at `begin` and running until `end`
#[derive(Debug, Clone)]
pub struct SpanMode {
    pub(crate) scope: Option<Scope>,
    pub(crate) content_scope: Option<Scope>,
    pub(crate) begin: Pattern,
    pub(crate) end: Pattern,
    pub(crate) begin_captures: Captures,
    pub(crate) end_captures: Captures,
    pub(crate) contains: Vec<Mode>,
    pub(crate) apply_end_pattern_last: bool,
}

impl SpanMode {
    pub fn new(begin: Pattern, end: Pattern) -> Self {
        Self {
            scope: None,
            content_scope: None,
            begin,
            end,
            begin_captures: Captures::default(),
            end_captures: Captures::default(),
            contains: Vec::new(),
            apply_end_pattern_last: false,
        }
    }

    /// Scope of the whole span, delimiters included
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Scope of the text between the delimiters
    pub fn content_scope(mut self, scope: Scope) -> Self {
        self.content_scope = Some(scope);
        self
    }

    pub fn begin_capture(mut self, name: impl Into<String>, spec: impl Into<CaptureSpec>) -> Self {
        self.begin_captures.insert(name, spec);
        self
    }

    pub fn end_capture(mut self, name: impl Into<String>, spec: impl Into<CaptureSpec>) -> Self {
        self.end_captures.insert(name, spec);
        self
    }

    pub fn contains(mut self, modes: impl IntoIterator<Item = Mode>) -> Self {
        self.contains.extend(modes);
        self
    }

    /// Try the nested rules before the end pattern
    pub fn apply_end_pattern_last(mut self, value: bool) -> Self {
        self.apply_end_pattern_last = value;
        self
    }
}

/// A lexical rule of a grammar
#[derive(Debug, Clone)]
pub enum Mode {
    Match(MatchMode),
    Span(SpanMode),
    /// Several rules tried together, without a regex of their own
    Group(Vec<Mode>),
    Include(Reference),
}

impl Mode {
    /// An include of the repository rule called `name`
    pub fn include(name: impl Into<String>) -> Mode {
        Mode::Include(Reference::Local(name.into()))
    }

    pub fn group(modes: impl IntoIterator<Item = Mode>) -> Mode {
        Mode::Group(modes.into_iter().collect())
    }
}

impl From<MatchMode> for Mode {
    fn from(value: MatchMode) -> Self {
        Mode::Match(value)
    }
}

impl From<SpanMode> for Mode {
    fn from(value: SpanMode) -> Self {
        Mode::Span(value)
    }
}

impl From<Reference> for Mode {
    fn from(value: Reference) -> Self {
        Mode::Include(value)
    }
}
