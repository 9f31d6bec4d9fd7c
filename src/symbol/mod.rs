//! Parsed representation of raw symbol strings
//!
//! A raw symbol such as `scip-dart pub app 1.0.0 lib/`main.dart`/Foo#bar().`
//! is parsed once by [`SymbolParser`] into a [`SymbolPath`]; every later
//! stage (naming, scope resolution, edge classification) reads the parsed
//! form instead of re-splitting the string.

pub mod name;
pub mod parser;

pub use name::NameNormalizer;
pub use parser::SymbolParser;

use bitflags::bitflags;

/// Terminator of one descriptor in a symbol string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorSuffix {
    /// `name/` - package, library, file or namespace
    Namespace,
    /// `Name#` - class, interface, enum, mixin
    Type,
    /// `name.` - field, variable, getter-style member
    Term,
    /// `name(disambiguator).` - callable
    Method,
    /// `[T]` - generic type parameter
    TypeParameter,
    /// `(x)` - callable parameter
    Parameter,
    /// `name:`
    Meta,
    /// `name!`
    Macro,
}

/// One scope step of a symbol path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Name with escaping removed
    pub name: String,
    pub suffix: DescriptorSuffix,
    /// Overload disambiguator between the parentheses of a method
    pub disambiguator: Option<String>,
    /// Byte offset in the raw string where this descriptor starts
    pub start: usize,
    /// Byte offset just past this descriptor's terminator
    pub end: usize,
}

bitflags! {
    /// Structural facts detected while parsing a symbol string
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Markers: u16 {
        /// Declared inside an owning type (`Owner#member`)
        const MEMBER      = 1 << 0;
        const CONSTRUCTOR = 1 << 1;
        const GETTER      = 1 << 2;
        const SETTER      = 1 << 3;
        /// Final descriptor is a type parameter
        const GENERIC     = 1 << 4;
        /// Final descriptor is a callable parameter
        const PARAMETER   = 1 << 5;
        /// Final descriptor carries a call signature
        const CALLABLE    = 1 << 6;
        /// Call-site-local binding, never recorded as an entity
        const LOCAL       = 1 << 7;
        const TEST        = 1 << 8;
        /// Final descriptor is a type
        const TYPE        = 1 << 9;
        /// Final descriptor is a namespace
        const NAMESPACE   = 1 << 10;
        /// Parsed best-effort from unterminated or unbalanced input
        const PARTIAL     = 1 << 11;
    }
}

/// Structured form of one raw symbol string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolPath {
    pub(crate) raw: String,
    pub(crate) header_len: usize,
    pub(crate) descriptors: Vec<Descriptor>,
    pub(crate) scope: Vec<String>,
    pub(crate) leaf: String,
    pub(crate) owner: Option<String>,
    pub(crate) owner_end: Option<usize>,
    pub(crate) member: Option<String>,
    pub(crate) markers: Markers,
}

impl SymbolPath {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Scheme header (`<scheme> <manager> <package> <version> `), if any
    pub fn header(&self) -> &str {
        &self.raw[..self.header_len]
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn last_descriptor(&self) -> Option<&Descriptor> {
        self.descriptors.last()
    }

    /// Namespace segments preceding the leaf
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    /// Final `/` segment with terminator and quoting stripped
    pub fn leaf(&self) -> &str {
        &self.leaf
    }

    /// Bare name of the owning type when this symbol is a type member
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Text after the owning type's member delimiter
    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    pub fn markers(&self) -> Markers {
        self.markers
    }

    pub fn is_local(&self) -> bool {
        self.markers.contains(Markers::LOCAL)
    }

    pub fn is_test_related(&self) -> bool {
        self.markers.contains(Markers::TEST)
    }

    pub fn is_constructor(&self) -> bool {
        self.markers.contains(Markers::CONSTRUCTOR)
    }

    pub fn is_accessor(&self) -> bool {
        self.markers.intersects(Markers::GETTER | Markers::SETTER)
    }

    /// Number of descriptors, used to schedule shallow declarations first
    pub fn depth(&self) -> usize {
        self.descriptors.len()
    }

    /// Name of the final descriptor with accessor markers removed
    pub fn bare_leaf_name(&self) -> &str {
        match self.descriptors.last() {
            Some(last) => {
                let name = last.name.as_str();
                name.strip_prefix("<get>")
                    .or_else(|| name.strip_prefix("<set>"))
                    .unwrap_or(name)
            }
            None => self.leaf.as_str(),
        }
    }

    /// The full scope-chain string: the raw symbol minus its last descriptor
    pub fn parent_key(&self) -> Option<&str> {
        self.ancestor_keys().into_iter().next()
    }

    /// Enclosing scope strings from innermost to outermost
    pub fn ancestor_keys(&self) -> Vec<&str> {
        let count = self.descriptors.len();
        if count < 2 {
            return Vec::new();
        }
        self.descriptors[..count - 1]
            .iter()
            .rev()
            .map(|d| &self.raw[..d.end])
            .collect()
    }

    /// Symbol string of the owning type (`...Owner#`)
    pub fn owner_key(&self) -> Option<&str> {
        self.owner_end.map(|end| &self.raw[..end])
    }

    /// Key of the property backing an accessor (`` Foo#`<get>bar`. `` -> `Foo#bar.`),
    /// spelled the way a declared field of that name would be.
    pub fn accessor_base_key(&self) -> Option<String> {
        if !self.is_accessor() {
            return None;
        }
        let last = self.descriptors.last()?;
        let terminator = if self.markers.contains(Markers::PARTIAL) {
            ""
        } else {
            self.raw.get(last.end.saturating_sub(1)..last.end).unwrap_or("")
        };
        Some(format!(
            "{}{}{}",
            &self.raw[..last.start],
            escape_name(self.bare_leaf_name()),
            terminator
        ))
    }

    /// Alternative keys under which a container may be referenced.
    ///
    /// Returns the key with its terminator stripped and, when the bare name
    /// starts with one of `prefixes`, the path with those prefixes removed.
    pub fn alias_keys(&self, prefixes: &[String]) -> Vec<String> {
        let mut keys = Vec::new();
        let Some(last) = self.descriptors.last() else {
            return keys;
        };
        if !matches!(
            last.suffix,
            DescriptorSuffix::Type | DescriptorSuffix::Namespace
        ) {
            return keys;
        }

        if let Some(stripped) = self.raw.get(..self.raw.len() - 1) {
            if !stripped.is_empty() {
                keys.push(stripped.to_string());
            }
        }

        let bare = strip_decl_prefixes(&last.name, prefixes);
        if bare != last.name && !bare.is_empty() {
            let terminator = &self.raw[self.raw.len() - 1..];
            keys.push(format!(
                "{}{}{}",
                &self.raw[..last.start],
                escape_name(bare),
                terminator
            ));
        }

        keys
    }
}

/// Remove private/generated declaration prefixes, repeatedly (`_$Foo` -> `Foo`)
pub fn strip_decl_prefixes<'a>(name: &'a str, prefixes: &[String]) -> &'a str {
    let mut current = name;
    loop {
        let next = prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .find_map(|p| current.strip_prefix(p.as_str()));
        match next {
            Some(rest) => current = rest,
            None => return current,
        }
    }
}

/// Quote a descriptor name with backticks unless it is a plain identifier
pub(crate) fn escape_name(name: &str) -> String {
    let simple = name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '+' | '-'));
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_decl_prefixes() {
        let prefixes = vec!["_".to_string(), "$".to_string()];
        assert_eq!(strip_decl_prefixes("_Foo", &prefixes), "Foo");
        assert_eq!(strip_decl_prefixes("_$Foo", &prefixes), "Foo");
        assert_eq!(strip_decl_prefixes("Foo", &prefixes), "Foo");
        assert_eq!(strip_decl_prefixes("__", &prefixes), "");
    }

    #[test]
    fn test_escape_name() {
        assert_eq!(escape_name("Foo"), "Foo");
        assert_eq!(escape_name("main.dart"), "`main.dart`");
    }
}
