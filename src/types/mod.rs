mod entity_counter;

pub use entity_counter::EntityCounter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// Node kinds of the output entity graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Namespace,
    Module,
    Class,
    Interface,
    Enum,
    EnumConstant,
    Method,
    Constructor,
    Field,
    Function,
    Variable,
    TypeAlias,
    TypeParameter,
}

/// Declaration kind as reported by the source index.
///
/// This is the input vocabulary; several kinds collapse onto one
/// [`EntityKind`] and `Unspecified` is resolved from the symbol string itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SymbolKind {
    #[default]
    Unspecified,
    Class,
    Interface,
    Mixin,
    Extension,
    Struct,
    Trait,
    Enum,
    EnumMember,
    Namespace,
    Module,
    Package,
    TypeAlias,
    Method,
    Getter,
    Setter,
    Function,
    Constructor,
    Field,
    Property,
    Constant,
    Variable,
    Parameter,
    TypeParameter,
    Macro,
}

impl EntityId {
    pub fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl FileId {
    pub fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Range {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Build a range from the SCIP integer encoding.
    ///
    /// Three elements mean `[line, start_column, end_column]` on a single
    /// line, four mean `[start_line, start_column, end_line, end_column]`.
    /// Anything else (or a negative component) is rejected.
    pub fn from_scip(values: &[i32]) -> Option<Self> {
        let as_u32 = |v: i32| u32::try_from(v).ok();
        match values {
            [line, start, end] => Some(Self::new(
                as_u32(*line)?,
                as_u32(*start)?,
                as_u32(*line)?,
                as_u32(*end)?,
            )),
            [start_line, start, end_line, end] => Some(Self::new(
                as_u32(*start_line)?,
                as_u32(*start)?,
                as_u32(*end_line)?,
                as_u32(*end)?,
            )),
            _ => None,
        }
    }

    pub fn contains(&self, line: u32, column: u32) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }

        if line == self.start_line && column < self.start_column {
            return false;
        }

        if line == self.end_line && column > self.end_column {
            return false;
        }

        true
    }

    /// True when `other` lies entirely within this range
    pub fn encloses(&self, other: &Range) -> bool {
        self.contains(other.start_line, other.start_column)
            && self.contains(other.end_line, other.end_column)
    }

    /// Number of lines spanned, used to pick the innermost enclosing range
    pub fn line_span(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line)
    }
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Namespace => "Namespace",
            EntityKind::Module => "Module",
            EntityKind::Class => "Class",
            EntityKind::Interface => "Interface",
            EntityKind::Enum => "Enum",
            EntityKind::EnumConstant => "EnumConstant",
            EntityKind::Method => "Method",
            EntityKind::Constructor => "Constructor",
            EntityKind::Field => "Field",
            EntityKind::Function => "Function",
            EntityKind::Variable => "Variable",
            EntityKind::TypeAlias => "TypeAlias",
            EntityKind::TypeParameter => "TypeParameter",
        }
    }

    /// Kinds that other declarations can be nested under
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            EntityKind::Namespace
                | EntityKind::Module
                | EntityKind::Class
                | EntityKind::Interface
                | EntityKind::Enum
                | EntityKind::TypeAlias
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            EntityKind::Method | EntityKind::Constructor | EntityKind::Function
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = &'static str;

    /// Accepts SCIP kind names case-insensitively, plus the lowercase
    /// spellings older converters emitted (`class`, `method`, `field`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "unspecifiedkind" | "unspecified" | "" => SymbolKind::Unspecified,
            "class" | "object" => SymbolKind::Class,
            "interface" | "protocol" => SymbolKind::Interface,
            "mixin" => SymbolKind::Mixin,
            "extension" => SymbolKind::Extension,
            "struct" => SymbolKind::Struct,
            "trait" => SymbolKind::Trait,
            "enum" => SymbolKind::Enum,
            "enummember" | "enumconstant" => SymbolKind::EnumMember,
            "namespace" => SymbolKind::Namespace,
            "module" | "file" => SymbolKind::Module,
            "package" | "packageobject" | "library" => SymbolKind::Package,
            "typealias" => SymbolKind::TypeAlias,
            "method" | "staticmethod" | "abstractmethod" => SymbolKind::Method,
            "getter" => SymbolKind::Getter,
            "setter" => SymbolKind::Setter,
            "function" => SymbolKind::Function,
            "constructor" => SymbolKind::Constructor,
            "field" | "staticfield" => SymbolKind::Field,
            "property" | "staticproperty" => SymbolKind::Property,
            "constant" => SymbolKind::Constant,
            "variable" | "staticvariable" => SymbolKind::Variable,
            "parameter" | "selfparameter" | "thisparameter" => SymbolKind::Parameter,
            "typeparameter" => SymbolKind::TypeParameter,
            "macro" => SymbolKind::Macro,
            _ => return Err("Unknown symbol kind"),
        };
        Ok(kind)
    }
}

impl SymbolKind {
    /// Parse from string with a default fallback for unknown values
    pub fn from_str_with_default(s: &str) -> Self {
        s.parse().unwrap_or(SymbolKind::Unspecified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_creation() {
        assert!(EntityId::new(0).is_none());

        let id = EntityId::new(42).unwrap();
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "#42");
    }

    #[test]
    fn test_file_id_creation() {
        assert!(FileId::new(0).is_none());

        let id = FileId::new(100).unwrap();
        assert_eq!(id.value(), 100);
    }

    #[test]
    fn test_range_contains() {
        let range = Range::new(10, 5, 15, 20);

        assert!(range.contains(12, 10));
        assert!(range.contains(10, 5)); // Start position
        assert!(range.contains(15, 20)); // End position

        assert!(!range.contains(9, 10));
        assert!(!range.contains(16, 10));
        assert!(!range.contains(10, 4));
        assert!(!range.contains(15, 21));
    }

    #[test]
    fn test_range_from_scip() {
        assert_eq!(Range::from_scip(&[3, 4, 9]), Some(Range::new(3, 4, 3, 9)));
        assert_eq!(
            Range::from_scip(&[1, 0, 12, 1]),
            Some(Range::new(1, 0, 12, 1))
        );
        assert_eq!(Range::from_scip(&[1, 2]), None);
        assert_eq!(Range::from_scip(&[-1, 0, 4]), None);
    }

    #[test]
    fn test_range_encloses() {
        let body = Range::new(10, 0, 20, 1);
        assert!(body.encloses(&Range::new(12, 4, 12, 9)));
        assert!(!body.encloses(&Range::new(19, 4, 21, 0)));
    }

    #[test]
    fn test_symbol_kind_from_scip_names() {
        assert_eq!("Class".parse::<SymbolKind>(), Ok(SymbolKind::Class));
        assert_eq!("method".parse::<SymbolKind>(), Ok(SymbolKind::Method));
        assert_eq!(
            "UnspecifiedKind".parse::<SymbolKind>(),
            Ok(SymbolKind::Unspecified)
        );
        assert_eq!(
            "EnumMember".parse::<SymbolKind>(),
            Ok(SymbolKind::EnumMember)
        );
        assert!("Spaceship".parse::<SymbolKind>().is_err());
        assert_eq!(
            SymbolKind::from_str_with_default("Spaceship"),
            SymbolKind::Unspecified
        );
    }

    #[test]
    fn test_container_kinds() {
        assert!(EntityKind::Class.is_container());
        assert!(EntityKind::Namespace.is_container());
        assert!(!EntityKind::Method.is_container());
        assert!(!EntityKind::TypeParameter.is_container());
        assert!(EntityKind::Constructor.is_callable());
    }
}
