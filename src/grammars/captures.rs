//! Turns capture names and tags into group numbers for a single regex.

use std::collections::BTreeMap;

use crate::error::{Error, TmResult};
use crate::grammars::mode::{CaptureSpec, Captures, Mode, WHOLE_MATCH};
use crate::regex::{RegexBuild, has_backreferences, is_wrapped_in_capture};
use crate::scope::Scope;

/// What a given group number ends up with, before scopes are qualified
#[derive(Debug, Default)]
pub(crate) struct ResolvedCapture<'a> {
    pub scopes: Vec<&'a Scope>,
    pub patterns: &'a [Mode],
}

impl<'a> ResolvedCapture<'a> {
    fn add_scope(&mut self, scope: &'a Scope) {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
    }
}

/// Group numbers of a capture referenced by name in a mode
fn resolve_indices(build: &RegexBuild, name: &str) -> TmResult<Vec<usize>> {
    if name == WHOLE_MATCH {
        if build.text.is_empty() {
            return Err(Error::UnresolvedCapture(name.to_string()));
        }
        return Ok(vec![0]);
    }
    if build.ambiguous_names.contains(name) {
        return Err(Error::AmbiguousCaptureName(name.to_string()));
    }
    let indices = build.indices_of(name);
    if indices.is_empty() {
        return Err(Error::UnresolvedCapture(name.to_string()));
    }
    Ok(indices.to_vec())
}

/// Merges the tags found in the regex with the captures declared by the author.
/// Tags come first when both target the same group. A capture used several
/// times gets the same treatment at every one of its groups.
pub(crate) fn resolve_captures<'a>(
    build: &'a RegexBuild,
    declared: &'a Captures,
) -> TmResult<BTreeMap<usize, ResolvedCapture<'a>>> {
    let mut out: BTreeMap<usize, ResolvedCapture<'a>> = BTreeMap::new();

    for (id, tags) in &build.tags {
        let indices = build
            .indices
            .get(id)
            .filter(|indices| !indices.is_empty())
            .ok_or_else(|| Error::UnresolvedCapture(format!("<tagged capture {}>", **id)))?;
        for index in indices {
            let entry = out.entry(*index).or_default();
            for tag in tags {
                entry.add_scope(tag);
            }
        }
    }

    for (name, spec) in declared.iter() {
        for index in resolve_indices(build, name)? {
            let entry = out.entry(index).or_default();
            match spec {
                CaptureSpec::Scope(scope) => entry.add_scope(scope),
                CaptureSpec::Rule { scope, patterns } => {
                    if let Some(scope) = scope {
                        entry.add_scope(scope);
                    }
                    entry.patterns = patterns.as_slice();
                }
            }
        }
    }

    Ok(out)
}

/// Removes the parentheses of a regex that is entirely group 1 when group 1 is
/// only there to be highlighted: its scope moves to the whole match and every
/// other group moves down by one.
///
/// Left alone if the group 0 already has something, if the regex uses
/// backreferences or if `allowed` is false.
pub(crate) fn elide_outer_group<'a>(
    text: String,
    captures: BTreeMap<usize, ResolvedCapture<'a>>,
    allowed: bool,
) -> (String, BTreeMap<usize, ResolvedCapture<'a>>) {
    let group_1_highlighted = captures.get(&1).is_some_and(|c| !c.scopes.is_empty());
    if !allowed
        || !group_1_highlighted
        || captures.contains_key(&0)
        || !is_wrapped_in_capture(&text)
        || has_backreferences(&text)
    {
        return (text, captures);
    }

    #[cfg(feature = "debug")]
    log::debug!("[elide_outer_group] Removing outer group of {text}");

    let inner = text[1..text.len() - 1].to_string();
    let captures = captures
        .into_iter()
        .map(|(index, capture)| (index - 1, capture))
        .collect();
    (inner, captures)
}
