use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, TmResult};
use crate::regex::pattern::{CaptureId, Pattern, PatternKind};
use crate::regex::stats::{Precedence, stats};
use crate::scope::Scope;

/// The regex produced by a [`Pattern`], with everything needed to find its groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexBuild {
    pub text: String,
    pub precedence: Precedence,
    pub capture_count: usize,
    /// Last capture compiled with a given name wins
    pub names: BTreeMap<String, CaptureId>,
    /// Names that were given to more than one distinct capture
    pub ambiguous_names: BTreeSet<String>,
    /// 1-based group numbers of each capture, in order. A capture node used
    /// several times in the same regex has one group per use.
    pub indices: BTreeMap<CaptureId, Vec<usize>>,
    pub tags: BTreeMap<CaptureId, Vec<Scope>>,
}

impl RegexBuild {
    fn leaf(text: String) -> Self {
        let stats = stats(&text);
        Self {
            text,
            precedence: stats.precedence,
            capture_count: stats.capture_count,
            names: BTreeMap::new(),
            ambiguous_names: BTreeSet::new(),
            indices: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    /// First group number of the capture called `name`, if any
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices_of(name).first().copied()
    }

    /// Every group number of the capture called `name`
    pub fn indices_of(&self, name: &str) -> &[usize] {
        self.names
            .get(name)
            .and_then(|id| self.indices.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn add_tags<'t>(&mut self, id: CaptureId, tags: impl IntoIterator<Item = &'t Scope>) {
        let existing = self.tags.entry(id).or_default();
        for tag in tags {
            if !existing.contains(tag) {
                existing.push(tag.clone());
            }
        }
    }

    /// Wraps the text in a non-capturing group if it binds looser than `min`.
    /// A fragment that is already tight enough is left untouched.
    pub(crate) fn grouped(mut self, min: Precedence) -> Self {
        if self.precedence < min {
            self.text = format!("(?:{})", self.text);
            self.precedence = Precedence::Group;
        }
        self
    }

    fn shifted(mut self, offset: usize) -> Self {
        for index in self.indices.values_mut().flatten() {
            *index += offset;
        }
        self
    }

    fn bind_name(&mut self, name: &str, id: CaptureId) {
        if let Some(previous) = self.names.insert(name.to_string(), id) {
            if previous != id {
                #[cfg(feature = "debug")]
                log::debug!("[bind_name] capture name '{name}' is used more than once");
                self.ambiguous_names.insert(name.to_string());
            }
        }
    }

    /// Puts `self` then `right` together, renumbering the groups of `right`
    fn combine(mut self, right: RegexBuild, separator: &str, precedence: Precedence) -> Self {
        let offset = self.capture_count;
        let right = right.shifted(offset);

        self.precedence = if self.text.is_empty() && separator.is_empty() {
            right.precedence
        } else if right.text.is_empty() && separator.is_empty() {
            self.precedence
        } else {
            precedence
        };
        self.text.push_str(separator);
        self.text.push_str(&right.text);
        self.capture_count += right.capture_count;

        for (name, id) in &right.names {
            self.bind_name(name, *id);
        }
        self.ambiguous_names.extend(right.ambiguous_names);
        for (id, indices) in right.indices {
            self.indices.entry(id).or_default().extend(indices);
        }
        for (id, tags) in &right.tags {
            self.add_tags(*id, tags);
        }
        self
    }

    fn captured(self, id: CaptureId, name: Option<&str>) -> Self {
        let mut out = self.shifted(1);
        out.text = format!("({})", out.text);
        out.precedence = Precedence::Group;
        out.capture_count += 1;
        out.indices.entry(id).or_default().insert(0, 1);
        if let Some(name) = name {
            out.bind_name(name, id);
        }
        out
    }
}

/// The shortest quantifier for the given bounds
fn quantifier(min: u32, max: Option<u32>) -> TmResult<String> {
    let q = match (min, max) {
        (0, None) => "*".to_string(),
        (1, None) => "+".to_string(),
        (min, None) => format!("{{{min},}}"),
        (0, Some(1)) => "?".to_string(),
        (min, Some(max)) if max < min => return Err(Error::InvalidRepetition { min, max }),
        (min, Some(max)) if min == max => format!("{{{min}}}"),
        (0, Some(max)) => format!("{{,{max}}}"),
        (min, Some(max)) => format!("{{{min},{max}}}"),
    };
    Ok(q)
}

impl Pattern {
    /// Turns this pattern into a single regex, adding parentheses only where needed.
    pub fn compile(&self) -> TmResult<RegexBuild> {
        match self.kind() {
            PatternKind::Leaf(text) => Ok(RegexBuild::leaf(text.clone())),
            PatternKind::Sequence(first, second) => {
                let first = first.compile()?.grouped(Precedence::Seq);
                let second = second.compile()?.grouped(Precedence::Seq);
                Ok(first.combine(second, "", Precedence::Seq))
            }
            PatternKind::Alternation(first, second) => {
                let first = first.compile()?;
                let second = second.compile()?;
                Ok(first.combine(second, "|", Precedence::Alt))
            }
            PatternKind::Repetition { element, min, max } => {
                let quantifier = quantifier(*min, *max)?;
                // `a+` followed by `?` would make it lazy rather than optional
                let mut out = element.compile()?.grouped(Precedence::Group);
                if out.text.is_empty() {
                    return Err(Error::EmptyRepetition);
                }
                out.text.push_str(&quantifier);
                out.precedence = Precedence::Rep;
                Ok(out)
            }
            PatternKind::Capture { element, name, id } => {
                Ok(element.compile()?.captured(*id, Some(name.as_str())))
            }
            PatternKind::Lookaround {
                element,
                behind,
                negate,
            } => {
                let prefix = match (behind, negate) {
                    (false, false) => "?=",
                    (false, true) => "?!",
                    (true, false) => "?<=",
                    (true, true) => "?<!",
                };
                let mut out = element.compile()?;
                out.text = format!("({prefix}{})", out.text);
                out.precedence = Precedence::Group;
                Ok(out)
            }
            PatternKind::Tag {
                element,
                tags,
                implicit,
            } => compile_tagged(element, tags, *implicit).map(|(build, _)| build),
        }
    }
}

/// Compiles the element of a tag and returns the capture its scopes ended up on
fn compile_tagged(
    element: &Pattern,
    tags: &[Scope],
    implicit: CaptureId,
) -> TmResult<(RegexBuild, CaptureId)> {
    let (mut build, target) = match element.kind() {
        PatternKind::Capture { id, .. } => (element.compile()?, *id),
        PatternKind::Tag {
            element,
            tags,
            implicit,
        } => compile_tagged(element, tags, *implicit)?,
        PatternKind::Lookaround { .. } => {
            return Err(Error::UntaggableElement {
                reason: "lookarounds are zero-width",
            });
        }
        PatternKind::Leaf(text) if text.is_empty() => {
            return Err(Error::UntaggableElement {
                reason: "the pattern is empty",
            });
        }
        _ => (element.compile()?.captured(implicit, None), implicit),
    };

    build.add_tags(target, tags);
    Ok((build, target))
}
