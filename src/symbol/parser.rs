//! Symbol-string grammar parser
//!
//! Grammar (after the optional scheme header):
//!
//! ```text
//! namespace/    Type#    term.    method(disambiguator).
//! [TypeParam]   (param)  meta:    macro!
//! ```
//!
//! Names may be quoted with backticks (`` `main.dart` ``); a doubled backtick
//! inside a quoted name is a literal backtick.

use super::{Descriptor, DescriptorSuffix, Markers, SymbolPath};
use crate::config::SymbolConfig;
use crate::error::{SymbolError, SymbolResult};
use std::iter::Peekable;
use std::str::CharIndices;

/// Pure parser turning raw symbol strings into [`SymbolPath`] values
#[derive(Debug, Clone)]
pub struct SymbolParser {
    local_prefix: String,
    test_markers: Vec<String>,
}

impl Default for SymbolParser {
    fn default() -> Self {
        Self::new(&SymbolConfig::default())
    }
}

impl SymbolParser {
    pub fn new(config: &SymbolConfig) -> Self {
        Self {
            local_prefix: config.local_prefix.clone(),
            test_markers: config
                .test_markers
                .iter()
                .filter(|m| !m.is_empty())
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }

    /// Cheap check used before parsing occurrence symbols
    pub fn is_local(&self, raw: &str) -> bool {
        !self.local_prefix.is_empty() && raw.starts_with(&self.local_prefix)
    }

    /// Parse one raw symbol string.
    ///
    /// Fails only when no leaf can be extracted at all (empty input or a
    /// bare scheme header). Unbalanced quoting and unterminated trailing
    /// text yield a best-effort path flagged [`Markers::PARTIAL`].
    pub fn parse(&self, raw: &str) -> SymbolResult<SymbolPath> {
        if raw.trim().is_empty() {
            return Err(SymbolError::malformed(raw, "empty symbol string"));
        }

        if self.is_local(raw) {
            return Ok(self.local_path(raw, 0));
        }

        let header_len = header_len(raw);
        let body = &raw[header_len..];
        if body.trim().is_empty() {
            return Err(SymbolError::malformed(raw, "no descriptors after scheme header"));
        }
        if self.is_local(body) {
            return Ok(self.local_path(raw, header_len));
        }

        let (descriptors, partial) = tokenize(body, header_len);
        if descriptors.is_empty() {
            return Err(SymbolError::malformed(raw, "no descriptors after scheme header"));
        }

        let mut markers = Markers::empty();
        if partial {
            markers |= Markers::PARTIAL;
        }

        let first_non_namespace = descriptors
            .iter()
            .position(|d| d.suffix != DescriptorSuffix::Namespace)
            .unwrap_or(descriptors.len());
        let last_index = descriptors.len() - 1;
        let last = &descriptors[last_index];

        let (scope, leaf) = if last.suffix == DescriptorSuffix::Namespace {
            let scope = descriptors[..last_index]
                .iter()
                .map(|d| d.name.clone())
                .collect();
            (scope, last.name.clone())
        } else {
            let scope = descriptors[..first_non_namespace]
                .iter()
                .map(|d| d.name.clone())
                .collect();
            let leaf_start = descriptors[first_non_namespace].start;
            (scope, clean_fragment(&raw[leaf_start..]))
        };

        let owner_index = descriptors[..last_index]
            .iter()
            .rposition(|d| d.suffix == DescriptorSuffix::Type);
        let (owner, owner_end, member) = match owner_index {
            Some(i) => {
                let owner = &descriptors[i];
                markers |= Markers::MEMBER;
                (
                    Some(owner.name.clone()),
                    Some(owner.end),
                    Some(clean_fragment(&raw[owner.end..])),
                )
            }
            None => (None, None, None),
        };

        let tail = member.as_deref().unwrap_or(leaf.as_str());
        if tail.contains("<constructor>") {
            markers |= Markers::CONSTRUCTOR;
        }
        if tail.contains("<get>") {
            markers |= Markers::GETTER;
        }
        if tail.contains("<set>") {
            markers |= Markers::SETTER;
        }

        markers |= match last.suffix {
            DescriptorSuffix::TypeParameter => Markers::GENERIC,
            DescriptorSuffix::Parameter => Markers::PARAMETER,
            DescriptorSuffix::Method => Markers::CALLABLE,
            DescriptorSuffix::Type => Markers::TYPE,
            DescriptorSuffix::Namespace => Markers::NAMESPACE,
            _ => Markers::empty(),
        };

        if descriptors.iter().any(|d| self.is_test_name(&d.name)) {
            markers |= Markers::TEST;
        }

        Ok(SymbolPath {
            raw: raw.to_string(),
            header_len,
            descriptors,
            scope,
            leaf,
            owner,
            owner_end,
            member,
            markers,
        })
    }

    fn is_test_name(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.test_markers.iter().any(|m| lowered.contains(m.as_str()))
    }

    fn local_path(&self, raw: &str, header_len: usize) -> SymbolPath {
        let leaf = raw[header_len..]
            .strip_prefix(self.local_prefix.as_str())
            .unwrap_or(&raw[header_len..])
            .to_string();
        SymbolPath {
            raw: raw.to_string(),
            header_len,
            descriptors: Vec::new(),
            scope: Vec::new(),
            leaf,
            owner: None,
            owner_end: None,
            member: None,
            markers: Markers::LOCAL,
        }
    }
}

/// Length of the `<scheme> <manager> <package> <version> ` header, or 0.
///
/// Header fields never contain backticks, so the first four spaces outside
/// quoting delimit it.
fn header_len(raw: &str) -> usize {
    let mut spaces = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '`' => return 0,
            ' ' => {
                spaces += 1;
                if spaces == 4 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    0
}

/// Split the descriptor part of a symbol. `base` is the byte offset of
/// `text` within the raw string so descriptor offsets index the raw string.
fn tokenize(text: &str, base: usize) -> (Vec<Descriptor>, bool) {
    let mut descriptors = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut name = String::new();
    let mut start = base;
    let mut in_backticks = false;
    let mut partial = false;

    while let Some((i, c)) = chars.next() {
        if in_backticks {
            if c == '`' {
                if matches!(chars.peek(), Some((_, '`'))) {
                    chars.next();
                    name.push('`');
                } else {
                    in_backticks = false;
                }
            } else {
                name.push(c);
            }
            continue;
        }

        let (suffix, disambiguator, end) = match c {
            '`' => {
                in_backticks = true;
                continue;
            }
            '/' => (DescriptorSuffix::Namespace, None, i + 1),
            '#' => (DescriptorSuffix::Type, None, i + 1),
            '.' => (DescriptorSuffix::Term, None, i + 1),
            ':' => (DescriptorSuffix::Meta, None, i + 1),
            '!' => (DescriptorSuffix::Macro, None, i + 1),
            '(' => {
                let Some((inner, close)) = read_until(&mut chars, ')') else {
                    partial = true;
                    name.push_str(&text[i..]);
                    break;
                };
                if name.is_empty() {
                    name = inner;
                    (DescriptorSuffix::Parameter, None, close + 1)
                } else if let Some((dot, _)) = chars.next_if(|(_, c)| *c == '.') {
                    (DescriptorSuffix::Method, Some(inner), dot + 1)
                } else {
                    partial = true;
                    (DescriptorSuffix::Method, Some(inner), close + 1)
                }
            }
            '[' => {
                let Some((inner, close)) = read_until(&mut chars, ']') else {
                    partial = true;
                    name.push_str(&text[i..]);
                    break;
                };
                name.push_str(&inner);
                (DescriptorSuffix::TypeParameter, None, close + 1)
            }
            _ => {
                name.push(c);
                continue;
            }
        };

        descriptors.push(Descriptor {
            name: std::mem::take(&mut name),
            suffix,
            disambiguator,
            start,
            end: base + end,
        });
        start = base + end;
    }

    if in_backticks || !name.is_empty() {
        partial = true;
        descriptors.push(Descriptor {
            name,
            suffix: DescriptorSuffix::Term,
            disambiguator: None,
            start,
            end: base + text.len(),
        });
    }

    (descriptors, partial)
}

/// Collect text up to `close`, dropping backtick quoting. Returns the text
/// and the byte index of the closing character.
fn read_until(chars: &mut Peekable<CharIndices<'_>>, close: char) -> Option<(String, usize)> {
    let mut inner = String::new();
    let mut in_backticks = false;
    for (i, c) in chars.by_ref() {
        match c {
            '`' => in_backticks = !in_backticks,
            c if c == close && !in_backticks => return Some((inner, i)),
            c => inner.push(c),
        }
    }
    None
}

/// Drop quoting and one trailing terminator from a slice of a symbol string
fn clean_fragment(fragment: &str) -> String {
    let unquoted: String = fragment.chars().filter(|c| *c != '`').collect();
    match unquoted.strip_suffix(['.', '#', '/', ':', '!']) {
        Some(stripped) => stripped.to_string(),
        None => unquoted,
    }
}
