mod build;
mod pattern;
mod stats;

pub use build::RegexBuild;
pub use pattern::*;
pub(crate) use stats::{has_backreferences, is_wrapped_in_capture};
pub use stats::{Precedence, RegexStats, stats};
