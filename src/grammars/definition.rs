use std::collections::BTreeMap;

use crate::error::{Error, TmResult};
use crate::grammars::compiled::CompiledGrammar;
use crate::grammars::mode::Mode;

/// A reusable rule stored in the grammar repository
#[derive(Debug, Clone)]
pub enum RepositoryEntry {
    Mode(Mode),
    /// Rendered as `{"patterns": [...]}`
    Modes(Vec<Mode>),
}

impl From<Mode> for RepositoryEntry {
    fn from(value: Mode) -> Self {
        RepositoryEntry::Mode(value)
    }
}

impl From<Vec<Mode>> for RepositoryEntry {
    fn from(value: Vec<Mode>) -> Self {
        RepositoryEntry::Modes(value)
    }
}

/// A language definition, ready to be compiled into a TextMate grammar.
///
/// Rules in the repository refer to each other only by name through includes,
/// nothing is linked when the grammar is built.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) name: String,
    pub(crate) scope_name: Option<String>,
    pub(crate) file_types: Vec<String>,
    pub(crate) patterns: Vec<Mode>,
    pub(crate) repository: BTreeMap<String, RepositoryEntry>,
}

impl Grammar {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope_name: None,
            file_types: Vec::new(),
            patterns: Vec::new(),
            repository: BTreeMap::new(),
        }
    }

    /// Overrides the scope name derived from the grammar name.
    /// Example: `rust` or `source.rust` both give a `source.rust` grammar.
    pub fn scope_name(mut self, scope_name: impl Into<String>) -> Self {
        self.scope_name = Some(scope_name.into());
        self
    }

    /// File extensions, with or without the leading dot
    pub fn file_types<S: Into<String>>(mut self, extensions: impl IntoIterator<Item = S>) -> Self {
        self.file_types.extend(extensions.into_iter().map(Into::into));
        self
    }

    /// Adds a top-level rule
    pub fn pattern(mut self, mode: impl Into<Mode>) -> Self {
        self.patterns.push(mode.into());
        self
    }

    pub fn patterns(mut self, modes: impl IntoIterator<Item = Mode>) -> Self {
        self.patterns.extend(modes);
        self
    }

    /// Adds a rule to the repository, replacing any rule with the same name
    pub fn rule(mut self, name: impl Into<String>, entry: impl Into<RepositoryEntry>) -> Self {
        self.repository.insert(name.into(), entry.into());
        self
    }

    /// The last segment of the grammar scope name, also appended to every scope.
    pub fn derived_scope_name(&self) -> TmResult<String> {
        let scope_name = match &self.scope_name {
            Some(s) => {
                let s = s.trim();
                s.strip_prefix("source.").unwrap_or(s).to_string()
            }
            None => kebab_case(&self.name),
        };

        if scope_name.is_empty() {
            return Err(Error::InvalidScopeName {
                name: self.name.clone(),
                reason: "the scope name is empty",
            });
        }
        if scope_name.contains(|c: char| c == '.' || c.is_whitespace()) {
            return Err(Error::InvalidScopeName {
                name: self.name.clone(),
                reason: "the scope name must be a single segment",
            });
        }

        Ok(scope_name)
    }

    /// Compile this grammar into its TextMate form
    pub fn compile(&self) -> TmResult<CompiledGrammar> {
        CompiledGrammar::from_grammar(self)
    }
}

/// `My Language` -> `my-language`, `HTTPHeaders` -> `http-headers`
pub(crate) fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            pending_separator = true;
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                pending_separator = true;
            }
        }

        if pending_separator && !out.is_empty() {
            out.push('-');
        }
        pending_separator = false;
        out.extend(c.to_lowercase());
    }

    out
}
