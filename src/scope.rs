//! Highlighting scopes attached to captures and rules.
//!
//! A [`Scope`] only carries the generic part of a TextMate scope name, like
//! `comment.line.double-slash`. The grammar compiler appends the grammar's own
//! scope name to it, giving `comment.line.double-slash.my-lang`.

use std::borrow::Cow;
use std::fmt;

use crate::error::{Error, TmResult};

/// An opaque highlighting category
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope(Cow<'static, str>);

impl Scope {
    /// Create a scope usable in `const` items, see the constants in this module
    pub const fn from_static(s: &'static str) -> Scope {
        Scope(Cow::Borrowed(s))
    }

    /// Create a scope from any string, for categories missing from the catalog
    pub fn new(s: impl Into<String>) -> Scope {
        Scope(Cow::Owned(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends the grammar scope name, eg `keyword.control` + `rust`
    pub(crate) fn qualify(&self, grammar_scope: &str) -> TmResult<String> {
        let s = self.0.trim();
        if s.is_empty() {
            return Err(Error::EmptyScope);
        }
        Ok(format!("{s}.{grammar_scope}"))
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope(\"{}\")", self.0)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Scope {
    fn from(value: &'static str) -> Self {
        Scope::from_static(value)
    }
}

// Commonly used scopes, named after the TextMate naming conventions.
pub const COMMENT_LINE: Scope = Scope::from_static("comment.line");
pub const COMMENT_LINE_DOUBLE_SLASH: Scope = Scope::from_static("comment.line.double-slash");
pub const COMMENT_LINE_NUMBER_SIGN: Scope = Scope::from_static("comment.line.number-sign");
pub const COMMENT_BLOCK: Scope = Scope::from_static("comment.block");
pub const COMMENT_BLOCK_DOCUMENTATION: Scope = Scope::from_static("comment.block.documentation");
pub const CONSTANT_NUMERIC: Scope = Scope::from_static("constant.numeric");
pub const CONSTANT_CHARACTER: Scope = Scope::from_static("constant.character");
pub const CONSTANT_CHARACTER_ESCAPE: Scope = Scope::from_static("constant.character.escape");
pub const CONSTANT_LANGUAGE: Scope = Scope::from_static("constant.language");
pub const ENTITY_NAME_FUNCTION: Scope = Scope::from_static("entity.name.function");
pub const ENTITY_NAME_TYPE: Scope = Scope::from_static("entity.name.type");
pub const ENTITY_NAME_NAMESPACE: Scope = Scope::from_static("entity.name.namespace");
pub const ENTITY_NAME_TAG: Scope = Scope::from_static("entity.name.tag");
pub const ENTITY_OTHER_ATTRIBUTE_NAME: Scope = Scope::from_static("entity.other.attribute-name");
pub const INVALID_ILLEGAL: Scope = Scope::from_static("invalid.illegal");
pub const KEYWORD_CONTROL: Scope = Scope::from_static("keyword.control");
pub const KEYWORD_OPERATOR: Scope = Scope::from_static("keyword.operator");
pub const KEYWORD_OTHER: Scope = Scope::from_static("keyword.other");
pub const MARKUP_BOLD: Scope = Scope::from_static("markup.bold");
pub const MARKUP_HEADING: Scope = Scope::from_static("markup.heading");
pub const MARKUP_ITALIC: Scope = Scope::from_static("markup.italic");
pub const PUNCTUATION_DEFINITION_STRING_BEGIN: Scope =
    Scope::from_static("punctuation.definition.string.begin");
pub const PUNCTUATION_DEFINITION_STRING_END: Scope =
    Scope::from_static("punctuation.definition.string.end");
pub const PUNCTUATION_DEFINITION_COMMENT: Scope =
    Scope::from_static("punctuation.definition.comment");
pub const PUNCTUATION_SEPARATOR: Scope = Scope::from_static("punctuation.separator");
pub const PUNCTUATION_TERMINATOR: Scope = Scope::from_static("punctuation.terminator");
pub const STORAGE_TYPE: Scope = Scope::from_static("storage.type");
pub const STORAGE_MODIFIER: Scope = Scope::from_static("storage.modifier");
pub const STRING_QUOTED_DOUBLE: Scope = Scope::from_static("string.quoted.double");
pub const STRING_QUOTED_SINGLE: Scope = Scope::from_static("string.quoted.single");
pub const STRING_REGEXP: Scope = Scope::from_static("string.regexp");
pub const SUPPORT_FUNCTION: Scope = Scope::from_static("support.function");
pub const SUPPORT_TYPE: Scope = Scope::from_static("support.type");
pub const VARIABLE_PARAMETER: Scope = Scope::from_static("variable.parameter");
pub const VARIABLE_OTHER: Scope = Scope::from_static("variable.other");
pub const VARIABLE_LANGUAGE: Scope = Scope::from_static("variable.language");
