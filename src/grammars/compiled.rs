use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, TmResult};
use crate::grammars::captures::{ResolvedCapture, elide_outer_group, resolve_captures};
use crate::grammars::definition::{Grammar, RepositoryEntry};
use crate::grammars::mode::{Captures, Mode};
use crate::regex::{Pattern, has_backreferences};
use crate::scope::Scope;

/// A capture group that assigns a scope name to matched text
///
/// # Examples
/// ```json
/// {
///   "1": { "name": "entity.name.function.toy" },
///   "2": { "patterns": [{ "include": "#params" }] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledCapture {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<CompiledRule>,
}

/// Keyed by group number, serialized as `"0"`, `"1"`...
pub type CompiledCaptures = BTreeMap<usize, CompiledCapture>;

/// # Examples
/// ```json
/// {
///   "name": "keyword.control.toy",
///   "match": "\\b(?:if|else)\\b"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "match")]
    pub match_: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub captures: CompiledCaptures,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<CompiledRule>,
}

/// # Examples
/// ```json
/// {
///   "name": "string.quoted.double.toy",
///   "begin": "\"",
///   "end": "\"",
///   "beginCaptures": {
///     "0": { "name": "punctuation.definition.string.begin.toy" }
///   },
///   "patterns": [{ "include": "#escapes" }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginEndRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_name: Option<String>,
    pub begin: String,
    pub end: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub begin_captures: CompiledCaptures,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub end_captures: CompiledCaptures,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<CompiledRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_end_pattern_last: Option<u32>,
}

/// `{"include": "#name"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeRule {
    pub include: String,
}

/// A list of rules without a regex of its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternsRule {
    pub patterns: Vec<CompiledRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CompiledRule {
    Match(MatchRule),
    BeginEnd(BeginEndRule),
    Include(IncludeRule),
    Patterns(PatternsRule),
}

/// A grammar in TextMate format, ready to be serialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledGrammar {
    pub name: String,
    pub scope_name: String,
    pub file_types: Vec<String>,
    pub patterns: Vec<CompiledRule>,
    pub repository: BTreeMap<String, CompiledRule>,
}

impl CompiledGrammar {
    pub fn from_grammar(grammar: &Grammar) -> TmResult<Self> {
        let scope_name = grammar.derived_scope_name()?;
        #[cfg(feature = "debug")]
        log::debug!("[from_grammar] Compiling {} as source.{scope_name}", grammar.name);

        let compiler = RuleCompiler {
            scope_name: &scope_name,
        };

        let patterns = compiler.compile_patterns(&grammar.patterns, "")?;
        let mut repository = BTreeMap::new();
        for (name, entry) in &grammar.repository {
            let path = format!("repository.{name}");
            let rule = match entry {
                RepositoryEntry::Mode(mode) => compiler.compile_mode(mode, &path)?,
                RepositoryEntry::Modes(modes) => CompiledRule::Patterns(PatternsRule {
                    patterns: compiler.compile_patterns(modes, &path)?,
                }),
            };
            repository.insert(name.clone(), rule);
        }

        let file_types = grammar
            .file_types
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();

        Ok(Self {
            name: grammar.name.clone(),
            scope_name: format!("source.{scope_name}"),
            file_types,
            patterns,
            repository,
        })
    }

    /// Serializes the grammar to JSON
    pub fn to_json(&self, pretty: bool) -> TmResult<String> {
        let out = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(out)
    }
}

struct RuleCompiler<'g> {
    scope_name: &'g str,
}

impl RuleCompiler<'_> {
    fn compile_patterns(&self, modes: &[Mode], path: &str) -> TmResult<Vec<CompiledRule>> {
        let mut out = Vec::with_capacity(modes.len());
        for (i, mode) in modes.iter().enumerate() {
            let child = if path.is_empty() {
                format!("patterns[{i}]")
            } else {
                format!("{path}.patterns[{i}]")
            };
            out.push(self.compile_mode(mode, &child)?);
        }
        Ok(out)
    }

    fn compile_mode(&self, mode: &Mode, path: &str) -> TmResult<CompiledRule> {
        #[cfg(feature = "debug")]
        log::debug!("[compile_mode] {path}");

        let rule = match mode {
            Mode::Include(reference) => CompiledRule::Include(IncludeRule {
                include: reference.to_string(),
            }),
            Mode::Group(modes) => CompiledRule::Patterns(PatternsRule {
                patterns: self.compile_patterns(modes, path)?,
            }),
            Mode::Match(m) => {
                let (match_, captures) =
                    self.compile_regex(&m.pattern, &m.captures, path, "match", true)?;
                CompiledRule::Match(MatchRule {
                    name: self.qualify(m.scope.as_ref(), path, "name")?,
                    match_,
                    captures,
                    patterns: self.compile_patterns(&m.contains, path)?,
                })
            }
            Mode::Span(s) => {
                let (end, end_captures) =
                    self.compile_regex(&s.end, &s.end_captures, path, "end", true)?;
                // `end` can refer to the groups of `begin`, which must keep their numbers
                let keep_begin_groups = has_backreferences(&end);
                let (begin, begin_captures) = self.compile_regex(
                    &s.begin,
                    &s.begin_captures,
                    path,
                    "begin",
                    !keep_begin_groups,
                )?;
                CompiledRule::BeginEnd(BeginEndRule {
                    name: self.qualify(s.scope.as_ref(), path, "name")?,
                    content_name: self.qualify(s.content_scope.as_ref(), path, "contentName")?,
                    begin,
                    end,
                    begin_captures,
                    end_captures,
                    patterns: self.compile_patterns(&s.contains, path)?,
                    apply_end_pattern_last: s.apply_end_pattern_last.then_some(1),
                })
            }
        };

        Ok(rule)
    }

    fn qualify(
        &self,
        scope: Option<&Scope>,
        path: &str,
        field: &'static str,
    ) -> TmResult<Option<String>> {
        scope
            .map(|s| s.qualify(self.scope_name))
            .transpose()
            .map_err(|e| e.in_rule(path, field))
    }

    fn compile_regex(
        &self,
        pattern: &Pattern,
        declared: &Captures,
        path: &str,
        field: &'static str,
        allow_elision: bool,
    ) -> TmResult<(String, CompiledCaptures)> {
        let build = pattern.compile().map_err(|e| e.in_rule(path, field))?;
        let resolved = resolve_captures(&build, declared).map_err(|e| e.in_rule(path, field))?;
        let (text, resolved) = elide_outer_group(build.text.clone(), resolved, allow_elision);
        let captures = self.compile_captures(resolved, path, field)?;
        Ok((text, captures))
    }

    fn compile_captures(
        &self,
        resolved: BTreeMap<usize, ResolvedCapture<'_>>,
        path: &str,
        field: &'static str,
    ) -> TmResult<CompiledCaptures> {
        let key = match field {
            "begin" => "beginCaptures",
            "end" => "endCaptures",
            _ => "captures",
        };

        let mut out = BTreeMap::new();
        for (index, capture) in resolved {
            let name = if capture.scopes.is_empty() {
                None
            } else {
                let qualified = capture
                    .scopes
                    .iter()
                    .map(|s| s.qualify(self.scope_name))
                    .collect::<Result<Vec<_>, Error>>()
                    .map_err(|e| e.in_rule(path, field))?;
                Some(qualified.join(" "))
            };
            let patterns =
                self.compile_patterns(capture.patterns, &format!("{path}.{key}.{index}"))?;
            out.insert(index, CompiledCapture { name, patterns });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::grammars::mode::{CaptureSpec, MatchMode, Reference, SpanMode, WHOLE_MATCH};
    use crate::regex::*;
    use crate::scope::*;

    fn compile_to_value(grammar: Grammar) -> serde_json::Value {
        serde_json::to_value(grammar.compile().unwrap()).unwrap()
    }

    fn toy() -> Grammar {
        Grammar::new("Toy").file_types([".toy", "ty"])
    }

    #[test]
    fn tagged_capture_gets_its_index() {
        let grammar = toy().pattern(MatchMode::new(cat(
            literal("let "),
            capture(ident(), "x").tag(VARIABLE_OTHER),
        )));
        let value = compile_to_value(grammar);
        assert_eq!(
            value["patterns"][0],
            json!({
                "match": "let ([A-Za-z_][A-Za-z0-9_]*)",
                "captures": { "1": { "name": "variable.other.toy" } }
            })
        );
    }

    #[test]
    fn reused_patterns_are_highlighted_at_every_use() {
        let name = ident().tag(VARIABLE_OTHER);
        let grammar = toy().pattern(MatchMode::new(seq([name.clone(), literal(","), name])));
        let value = compile_to_value(grammar);
        assert_eq!(
            value["patterns"][0],
            json!({
                "match": "([A-Za-z_][A-Za-z0-9_]*),([A-Za-z_][A-Za-z0-9_]*)",
                "captures": {
                    "1": { "name": "variable.other.toy" },
                    "2": { "name": "variable.other.toy" }
                }
            })
        );

        let param = capture(ident(), "param");
        let grammar = toy().pattern(
            MatchMode::new(seq([param.clone(), literal(","), param]))
                .capture("param", VARIABLE_PARAMETER),
        );
        let value = compile_to_value(grammar);
        assert_eq!(
            value["patterns"][0]["captures"],
            json!({
                "1": { "name": "variable.parameter.toy" },
                "2": { "name": "variable.parameter.toy" }
            })
        );
    }

    #[test]
    fn single_tagged_capture_becomes_the_whole_match() {
        let number = capture(raw(r"\d+|0x[0-9a-f]+"), "n").tag(CONSTANT_NUMERIC);
        let grammar = toy().pattern(MatchMode::new(number));
        let value = compile_to_value(grammar);
        assert_eq!(
            value["patterns"][0],
            json!({
                "match": r"\d+|0x[0-9a-f]+",
                "captures": { "0": { "name": "constant.numeric.toy" } }
            })
        );
    }

    #[test]
    fn unknown_capture_names_abort_compilation() {
        let grammar = toy()
            .pattern(MatchMode::new(capture(ident(), "x")).capture("x", VARIABLE_OTHER))
            .pattern(MatchMode::new(capture(ident(), "x")).capture("nope", VARIABLE_OTHER));
        let err = grammar.compile().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CaptureResolution);
        insta::assert_snapshot!(
            err.to_string(),
            @"in patterns[1] (match): no capture group named 'nope'"
        );
    }

    #[test]
    fn errors_in_repository_rules_carry_their_path() {
        let grammar = toy().rule(
            "decls",
            vec![
                Mode::include("comments"),
                Mode::from(MatchMode::new(look_ahead(raw("x")).tag(KEYWORD_OTHER))),
            ],
        );
        let err = grammar.compile().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authoring);
        insta::assert_snapshot!(
            err.to_string(),
            @"in repository.decls.patterns[1] (match): cannot tag pattern: lookarounds are zero-width"
        );
    }

    #[test]
    fn empty_scopes_are_rejected() {
        let grammar = toy().pattern(MatchMode::new(raw("a")).scope(Scope::new("")));
        let err = grammar.compile().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authoring);
        assert!(matches!(err, Error::Rule { field: "name", .. }));
    }

    #[test]
    fn unusable_grammar_names_are_rejected() {
        let err = Grammar::new("...").compile().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GrammarConfig);
    }

    #[test]
    fn compiles_a_complete_grammar() {
        let string = SpanMode::new(literal("\""), literal("\""))
            .scope(STRING_QUOTED_DOUBLE)
            .begin_capture(WHOLE_MATCH, PUNCTUATION_DEFINITION_STRING_BEGIN)
            .end_capture(WHOLE_MATCH, PUNCTUATION_DEFINITION_STRING_END)
            .contains([Mode::from(
                MatchMode::new(raw(r"\\.")).scope(CONSTANT_CHARACTER_ESCAPE),
            )]);
        let comment =
            MatchMode::new(cat(literal("//"), rep0(any_char()))).scope(COMMENT_LINE_DOUBLE_SLASH);
        let function = MatchMode::new(seq([
            keywords(["fn"]).tag(STORAGE_TYPE),
            rep1(space()),
            capture(ident(), "name"),
        ]))
        .capture("name", ENTITY_NAME_FUNCTION);

        let grammar = toy()
            .pattern(Mode::include("comments"))
            .pattern(Mode::include("strings"))
            .pattern(function)
            .pattern(MatchMode::new(keywords(["if", "else"])).scope(KEYWORD_CONTROL))
            .rule("comments", Mode::from(comment))
            .rule("strings", vec![Mode::from(string), Mode::Include(Reference::SelfGrammar)]);

        assert_eq!(
            compile_to_value(grammar),
            json!({
                "name": "Toy",
                "scopeName": "source.toy",
                "fileTypes": ["toy", "ty"],
                "patterns": [
                    { "include": "#comments" },
                    { "include": "#strings" },
                    {
                        "match": r"(\bfn\b)[ \t]+([A-Za-z_][A-Za-z0-9_]*)",
                        "captures": {
                            "1": { "name": "storage.type.toy" },
                            "2": { "name": "entity.name.function.toy" }
                        }
                    },
                    { "name": "keyword.control.toy", "match": r"\b(?:if|else)\b" }
                ],
                "repository": {
                    "comments": {
                        "name": "comment.line.double-slash.toy",
                        "match": "//.*"
                    },
                    "strings": {
                        "patterns": [
                            {
                                "name": "string.quoted.double.toy",
                                "begin": "\"",
                                "end": "\"",
                                "beginCaptures": {
                                    "0": { "name": "punctuation.definition.string.begin.toy" }
                                },
                                "endCaptures": {
                                    "0": { "name": "punctuation.definition.string.end.toy" }
                                },
                                "patterns": [
                                    { "name": "constant.character.escape.toy", "match": r"\\." }
                                ]
                            },
                            { "include": "$self" }
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn span_groups_referenced_by_end_are_kept() {
        let grammar = toy().pattern(
            SpanMode::new(
                capture(raw(r#"['"]"#), "quote").tag(PUNCTUATION_DEFINITION_STRING_BEGIN),
                raw(r"\1").tag(PUNCTUATION_DEFINITION_STRING_END),
            )
            .content_scope(STRING_QUOTED_SINGLE)
            .apply_end_pattern_last(true),
        );
        let value = compile_to_value(grammar);
        assert_eq!(
            value["patterns"][0],
            json!({
                "contentName": "string.quoted.single.toy",
                "begin": r#"(['"])"#,
                "end": r"(\1)",
                "beginCaptures": { "1": { "name": "punctuation.definition.string.begin.toy" } },
                "endCaptures": { "1": { "name": "punctuation.definition.string.end.toy" } },
                "applyEndPatternLast": 1
            })
        );
    }

    #[test]
    fn span_delimiters_are_elided_independently() {
        let grammar = toy().pattern(SpanMode::new(
            literal("/*").tag(PUNCTUATION_DEFINITION_COMMENT),
            literal("*/").tag(PUNCTUATION_DEFINITION_COMMENT),
        ));
        let value = compile_to_value(grammar);
        assert_eq!(
            value["patterns"][0],
            json!({
                "begin": r"/\*",
                "end": r"\*/",
                "beginCaptures": { "0": { "name": "punctuation.definition.comment.toy" } },
                "endCaptures": { "0": { "name": "punctuation.definition.comment.toy" } }
            })
        );
    }

    #[test]
    fn groups_nested_rules_and_multiple_tags() {
        let call = MatchMode::new(seq([
            capture(ident(), "callee"),
            literal("("),
            capture(raw("[^)]*"), "args"),
            literal(")"),
        ]))
        .capture(
            "callee",
            CaptureSpec::Rule {
                scope: Some(SUPPORT_FUNCTION),
                patterns: vec![],
            },
        )
        .capture(
            "args",
            CaptureSpec::Rule {
                scope: None,
                patterns: vec![Mode::include("expr")],
            },
        );
        let terminator =
            MatchMode::new(literal(";").tags([PUNCTUATION_TERMINATOR, KEYWORD_OTHER]));
        let grammar = toy().pattern(Mode::group([
            Mode::from(call),
            Mode::from(terminator),
            Mode::Include(Reference::ExternalRule("source.js".into(), "expr".into())),
        ]));
        let value = compile_to_value(grammar);
        assert_eq!(
            value["patterns"][0],
            json!({
                "patterns": [
                    {
                        "match": r"([A-Za-z_][A-Za-z0-9_]*)\(([^)]*)\)",
                        "captures": {
                            "1": { "name": "support.function.toy" },
                            "2": { "patterns": [{ "include": "#expr" }] }
                        }
                    },
                    {
                        "match": ";",
                        "captures": {
                            "0": { "name": "punctuation.terminator.toy keyword.other.toy" }
                        }
                    },
                    { "include": "source.js#expr" }
                ]
            })
        );
    }

    #[test]
    fn adjacent_groups_are_not_mistaken_for_one() {
        let grammar = toy().pattern(MatchMode::new(cat(
            capture(raw("a"), "a").tag(KEYWORD_CONTROL),
            capture(raw("b"), "b").tag(KEYWORD_OTHER),
        )));
        let value = compile_to_value(grammar);
        assert_eq!(value["patterns"][0]["match"], "(a)(b)");
        assert_eq!(
            value["patterns"][0]["captures"],
            json!({
                "1": { "name": "keyword.control.toy" },
                "2": { "name": "keyword.other.toy" }
            })
        );
    }

    #[test]
    fn shared_patterns_compile_the_same_everywhere() {
        let name = capture(ident(), "name").tag(ENTITY_NAME_TYPE);
        let grammars = [
            Grammar::new("First").pattern(MatchMode::new(cat(literal("struct "), name.clone()))),
            Grammar::new("Second").pattern(MatchMode::new(cat(literal("class "), name.clone()))),
        ];

        let compiled: Vec<CompiledGrammar> = std::thread::scope(|s| {
            let handles: Vec<_> = grammars
                .iter()
                .map(|g| s.spawn(move || g.compile().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (grammar, suffix) in compiled.iter().zip(["first", "second"]) {
            let CompiledRule::Match(rule) = &grammar.patterns[0] else {
                panic!("expected a match rule");
            };
            assert_eq!(
                rule.captures[&1].name.as_deref(),
                Some(format!("entity.name.type.{suffix}").as_str())
            );
        }
    }

    #[test]
    fn serializes_to_json() {
        let grammar = toy()
            .scope_name("source.toy-lang")
            .pattern(MatchMode::new(literal("x")).scope(VARIABLE_LANGUAGE))
            .compile()
            .unwrap();
        insta::assert_snapshot!(
            grammar.to_json(false).unwrap(),
            @r#"{"name":"Toy","scopeName":"source.toy-lang","fileTypes":["toy","ty"],"patterns":[{"name":"variable.language.toy-lang","match":"x"}],"repository":{}}"#
        );
        let pretty = grammar.to_json(true).unwrap();
        assert!(pretty.contains("\n  \"scopeName\": \"source.toy-lang\""));
    }
}
