//! Coarse statistics over raw regex source, without parsing it into an AST.
//!
//! Patterns can embed arbitrary raw regexes so we need to know, for any string,
//! whether it needs parentheses before being concatenated, alternated or quantified
//! and how many capture groups it opens. A single pass with a stack of expected
//! closing characters is enough for both.

/// The loosest operator that is not guarded by parentheses in a regex.
///
/// Ordered from loosest to tightest binding, so `Alt < Seq < Rep < Group`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// A top-level `|`
    Alt,
    /// Several atoms one after the other
    Seq,
    /// A single quantified atom
    Rep,
    /// A single atom: a char, an escape, a class or a group
    Group,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegexStats {
    pub precedence: Precedence,
    pub capture_count: usize,
}

/// Computes the precedence class and the number of capture groups of `raw`.
///
/// `(?...)` groups are never counted, which includes lookarounds and named groups.
pub fn stats(raw: &str) -> RegexStats {
    let chars: Vec<char> = raw.chars().collect();
    let mut closers: Vec<char> = Vec::new();
    let mut precedence = Precedence::Group;
    let mut capture_count = 0;
    let mut first = true;
    let mut i = 0;

    let mut lower = |to: Precedence| {
        if to < precedence {
            precedence = to;
        }
    };

    while i < chars.len() {
        let top_level = closers.is_empty();
        let in_class = closers.last() == Some(&']');

        match chars[i] {
            '\\' => {
                i += 1;
                if top_level && !first {
                    lower(Precedence::Seq);
                }
            }
            ']' if in_class => {
                closers.pop();
            }
            // nested class, eg `[[:alpha:]]` or `[a-z&&[^aeiou]]`
            '[' if in_class => {
                closers.push(']');
                i += class_prefix_len(&chars[i + 1..]);
            }
            // anything else in a class is a literal
            _ if in_class => {}
            '(' => {
                if top_level && !first {
                    lower(Precedence::Seq);
                }
                if chars.get(i + 1) != Some(&'?') {
                    capture_count += 1;
                }
                closers.push(')');
            }
            '[' => {
                if top_level && !first {
                    lower(Precedence::Seq);
                }
                closers.push(']');
                i += class_prefix_len(&chars[i + 1..]);
            }
            ')' => {
                if closers.last() == Some(&')') {
                    closers.pop();
                }
            }
            '|' => {
                if top_level {
                    lower(Precedence::Alt);
                }
            }
            '*' | '+' | '?' => {
                if top_level && !first {
                    lower(Precedence::Rep);
                }
            }
            '{' => {
                if top_level && !first {
                    lower(Precedence::Rep);
                }
                i = chars[i..]
                    .iter()
                    .position(|c| *c == '}')
                    .map_or(chars.len(), |p| i + p);
            }
            _ => {
                if top_level && !first {
                    lower(Precedence::Seq);
                }
            }
        }

        first = false;
        i += 1;
    }

    RegexStats {
        precedence,
        capture_count,
    }
}

/// A `]` right after `[` or `[^` is a literal, not the end of the class.
fn class_prefix_len(after_open: &[char]) -> usize {
    let mut skip = 0;
    if after_open.first() == Some(&'^') {
        skip += 1;
    }
    if after_open.get(skip) == Some(&']') {
        skip += 1;
    }
    skip
}

/// Whether the whole of `raw` is a single capture group, eg `(a|b)` but not `(a)(b)`
/// or `(?:a)`.
pub(crate) fn is_wrapped_in_capture(raw: &str) -> bool {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() < 2 || chars[0] != '(' || chars[1] == '?' {
        return false;
    }

    let mut closers: Vec<char> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let in_class = closers.last() == Some(&']');
        match chars[i] {
            '\\' => i += 1,
            ']' if in_class => {
                closers.pop();
            }
            '[' if in_class => {
                closers.push(']');
                i += class_prefix_len(&chars[i + 1..]);
            }
            _ if in_class => {}
            '(' => closers.push(')'),
            '[' => {
                closers.push(']');
                i += class_prefix_len(&chars[i + 1..]);
            }
            ')' if closers.last() == Some(&')') => {
                closers.pop();
                if closers.is_empty() {
                    return i == chars.len() - 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    false
}

/// Whether `raw` refers to a numbered group with `\1`..`\9`.
pub(crate) fn has_backreferences(raw: &str) -> bool {
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some('1'..='9') = chars.next() {
                return true;
            }
        }
    }
    false
}
