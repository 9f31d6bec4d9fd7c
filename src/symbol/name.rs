//! Display names for parsed symbols

use super::SymbolPath;
use crate::config::ConversionConfig;
use crate::error::{SymbolError, SymbolResult};
use crate::types::EntityKind;

const CONSTRUCTOR_MARKER: &str = "<constructor>";
const GETTER_MARKER: &str = "<get>";
const SETTER_MARKER: &str = "<set>";

/// Derives human-readable entity names from a [`SymbolPath`]
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    anonymous_name: String,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(&ConversionConfig::default())
    }
}

impl NameNormalizer {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            anonymous_name: config.anonymous_name.clone(),
        }
    }

    /// Name under which `path` is recorded as an entity of `kind`.
    ///
    /// Constructors take the owning type's name and accessors keep their
    /// direction as a suffix (`value<get>`, `value<set>`). An empty result is
    /// only accepted for variable-like entities, which get the anonymous name.
    pub fn normalize(&self, path: &SymbolPath, kind: EntityKind) -> SymbolResult<String> {
        let name = display_name(path);
        if !name.is_empty() {
            return Ok(name);
        }

        match kind {
            EntityKind::Variable => Ok(self.anonymous_name.clone()),
            _ => Err(SymbolError::Unnamed {
                symbol: path.raw().to_string(),
                kind: kind.to_string(),
            }),
        }
    }

    /// Name of the backing property for an accessor (`<get>value` -> `value`)
    pub fn accessor_base_name(&self, path: &SymbolPath) -> Option<String> {
        let last = path.last_descriptor()?;
        let base = last
            .name
            .strip_prefix(GETTER_MARKER)
            .or_else(|| last.name.strip_prefix(SETTER_MARKER))?;
        (!base.is_empty()).then(|| base.to_string())
    }
}

fn display_name(path: &SymbolPath) -> String {
    let Some(last) = path.last_descriptor() else {
        return strip_call_suffix(path.leaf()).to_string();
    };

    let name = last.name.trim();
    if name == CONSTRUCTOR_MARKER {
        return path.owner().unwrap_or_default().to_string();
    }
    if let Some(base) = name.strip_prefix(GETTER_MARKER) {
        return accessor_name(base, GETTER_MARKER);
    }
    if let Some(base) = name.strip_prefix(SETTER_MARKER) {
        return accessor_name(base, SETTER_MARKER);
    }

    strip_call_suffix(name).to_string()
}

fn accessor_name(base: &str, marker: &str) -> String {
    if base.is_empty() {
        String::new()
    } else {
        format!("{base}{marker}")
    }
}

fn strip_call_suffix(name: &str) -> &str {
    let name = name.strip_suffix('.').unwrap_or(name);
    name.strip_suffix("()").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolParser;

    fn name_of(raw: &str, kind: EntityKind) -> SymbolResult<String> {
        let path = SymbolParser::default().parse(raw).unwrap();
        NameNormalizer::default().normalize(&path, kind)
    }

    #[test]
    fn test_plain_names() {
        assert_eq!(name_of("pkg/Foo#", EntityKind::Class).unwrap(), "Foo");
        assert_eq!(name_of("pkg/Foo#bar().", EntityKind::Method).unwrap(), "bar");
        assert_eq!(
            name_of("lib/`main.dart`/", EntityKind::Namespace).unwrap(),
            "main.dart"
        );
        assert_eq!(name_of("pkg/Box#[T]", EntityKind::TypeParameter).unwrap(), "T");
        assert_eq!(name_of("pkg/run().(count)", EntityKind::Variable).unwrap(), "count");
    }

    #[test]
    fn test_constructor_takes_owner_name() {
        assert_eq!(
            name_of("pkg/Foo#`<constructor>`().", EntityKind::Constructor).unwrap(),
            "Foo"
        );
    }

    #[test]
    fn test_accessors_keep_direction() {
        assert_eq!(
            name_of("pkg/Foo#`<get>value`.", EntityKind::Method).unwrap(),
            "value<get>"
        );
        assert_eq!(
            name_of("pkg/Foo#`<set>value`.", EntityKind::Method).unwrap(),
            "value<set>"
        );

        let path = SymbolParser::default().parse("pkg/Foo#`<get>value`.").unwrap();
        assert_eq!(
            NameNormalizer::default().accessor_base_name(&path).as_deref(),
            Some("value")
        );
    }

    #[test]
    fn test_unnamed_symbols() {
        let err = name_of("pkg/Foo#``().", EntityKind::Method).unwrap_err();
        assert!(matches!(err, SymbolError::Unnamed { .. }));

        assert_eq!(
            name_of("pkg/run().()", EntityKind::Variable).unwrap(),
            "<anonymous>"
        );
    }
}
