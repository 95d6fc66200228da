mod captures;
mod compiled;
mod definition;
mod mode;

pub use compiled::*;
pub use definition::{Grammar, RepositoryEntry};
pub use mode::{CaptureSpec, Captures, MatchMode, Mode, Reference, SpanMode, WHOLE_MATCH};
