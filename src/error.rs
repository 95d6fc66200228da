use std::fmt;

pub(crate) type TmResult<T> = Result<T, Error>;

/// Broad classes of [`Error`], looking through any rule context.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The pattern or mode was built in a way that can't be compiled.
    Authoring,
    /// A capture referenced by name has no compiled group.
    CaptureResolution,
    /// The grammar descriptor itself is unusable.
    GrammarConfig,
    /// The compiled tree could not be serialized.
    Serialization,
}

/// Errors that can occur while building a grammar
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A tag was put on something that can't become a capture group.
    #[allow(missing_docs)]
    UntaggableElement { reason: &'static str },

    /// A repetition with an upper bound lower than its lower bound.
    #[allow(missing_docs)]
    InvalidRepetition { min: u32, max: u32 },

    /// A repetition of a pattern that matches nothing, which would leave a bare
    /// quantifier in the regex.
    EmptyRepetition,

    /// A capture map referenced a name that is bound to several different captures
    /// in the same regex.
    AmbiguousCaptureName(String),

    /// A scope with no text can't be qualified with the grammar scope name.
    EmptyScope,

    /// A capture map referenced a name that doesn't exist in the compiled regex.
    UnresolvedCapture(String),

    /// The grammar scope name is empty or isn't a single segment.
    #[allow(missing_docs)]
    InvalidScopeName { name: String, reason: &'static str },

    /// Adds the location of the rule that failed to another error.
    #[allow(missing_docs)]
    Rule {
        path: String,
        field: &'static str,
        source: Box<Error>,
    },

    /// JSON serialization of a compiled grammar failed.
    Json(serde_json::Error),
}

impl Error {
    pub(crate) fn in_rule(self, path: &str, field: &'static str) -> Self {
        Error::Rule {
            path: if path.is_empty() {
                "<root>".to_string()
            } else {
                path.to_string()
            },
            field,
            source: Box::new(self),
        }
    }

    /// Which category of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UntaggableElement { .. }
            | Error::InvalidRepetition { .. }
            | Error::EmptyRepetition
            | Error::AmbiguousCaptureName(_)
            | Error::EmptyScope => ErrorKind::Authoring,
            Error::UnresolvedCapture(_) => ErrorKind::CaptureResolution,
            Error::InvalidScopeName { .. } => ErrorKind::GrammarConfig,
            Error::Rule { source, .. } => source.kind(),
            Error::Json(_) => ErrorKind::Serialization,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UntaggableElement { reason } => write!(f, "cannot tag pattern: {}", reason),
            Error::InvalidRepetition { min, max } => {
                write!(f, "invalid repetition bounds {{{},{}}}", min, max)
            }
            Error::EmptyRepetition => write!(f, "cannot repeat an empty pattern"),
            Error::AmbiguousCaptureName(name) => {
                write!(f, "capture name '{}' is bound to more than one group", name)
            }
            Error::EmptyScope => write!(f, "scope name is empty"),
            Error::UnresolvedCapture(name) => write!(f, "no capture group named '{}'", name),
            Error::InvalidScopeName { name, reason } => {
                write!(f, "invalid scope name for grammar '{}': {}", name, reason)
            }
            Error::Rule {
                path,
                field,
                source,
            } => write!(f, "in {} ({}): {}", path, field, source),
            Error::Json(err) => write!(f, "JSON serialization error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Rule { source, .. } => Some(source.as_ref()),
            Error::Json(err) => Some(err),
            Error::UntaggableElement { .. }
            | Error::InvalidRepetition { .. }
            | Error::EmptyRepetition
            | Error::AmbiguousCaptureName(_)
            | Error::EmptyScope
            | Error::UnresolvedCapture(_)
            | Error::InvalidScopeName { .. } => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
