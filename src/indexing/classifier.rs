//! Maps an input kind and a parsed symbol onto an entity kind and the rule
//! used to record it.

use crate::symbol::{DescriptorSuffix, SymbolPath};
use crate::types::{EntityKind, SymbolKind};

/// Which of the two recording passes handles a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pass {
    Containers,
    Members,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingRule {
    /// Recorded once and registered under its alias keys
    Container,
    /// Method or constructor: an owner is synthesized when none resolves
    BoundCallable,
    /// Getter/setter: backing field plus accessor method
    Accessor,
    /// Recorded free-standing when no parent resolves
    Member,
    /// Bound to its generic declaration, else a free-standing placeholder
    TypeParameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: EntityKind,
    pub rule: RecordingRule,
}

impl Classification {
    fn new(kind: EntityKind, rule: RecordingRule) -> Self {
        Self { kind, rule }
    }

    pub fn pass(&self) -> Pass {
        match self.rule {
            RecordingRule::Container => Pass::Containers,
            _ => Pass::Members,
        }
    }
}

/// Classify one symbol.
///
/// Structural markers win over the declared kind: a `<constructor>`
/// descriptor is always a constructor and `<get>`/`<set>` members are always
/// accessors. Unspecified kinds are inferred from the final descriptor.
pub fn classify(kind: SymbolKind, path: &SymbolPath) -> Classification {
    use EntityKind as E;
    use RecordingRule as R;

    if is_constructor_declaration(path) {
        return Classification::new(E::Constructor, R::BoundCallable);
    }
    if path.is_accessor() && !is_container_kind(kind) {
        return Classification::new(E::Method, R::Accessor);
    }

    let has_owner = path.owner().is_some();
    match kind {
        SymbolKind::Class | SymbolKind::Mixin | SymbolKind::Extension | SymbolKind::Struct => {
            Classification::new(E::Class, R::Container)
        }
        SymbolKind::Interface | SymbolKind::Trait => Classification::new(E::Interface, R::Container),
        SymbolKind::Enum => Classification::new(E::Enum, R::Container),
        SymbolKind::Namespace => Classification::new(E::Namespace, R::Container),
        SymbolKind::Module | SymbolKind::Package => Classification::new(E::Module, R::Container),
        SymbolKind::TypeAlias => Classification::new(E::TypeAlias, R::Container),
        SymbolKind::Method | SymbolKind::Getter | SymbolKind::Setter => {
            Classification::new(E::Method, R::BoundCallable)
        }
        SymbolKind::Constructor => Classification::new(E::Constructor, R::BoundCallable),
        SymbolKind::Function | SymbolKind::Macro => Classification::new(E::Function, R::Member),
        SymbolKind::Field | SymbolKind::Property => Classification::new(E::Field, R::Member),
        SymbolKind::Constant if has_owner => Classification::new(E::Field, R::Member),
        SymbolKind::Constant | SymbolKind::Variable | SymbolKind::Parameter => {
            Classification::new(E::Variable, R::Member)
        }
        SymbolKind::EnumMember => Classification::new(E::EnumConstant, R::Member),
        SymbolKind::TypeParameter => Classification::new(E::TypeParameter, R::TypeParameter),
        SymbolKind::Unspecified => infer_from_suffix(path),
    }
}

fn infer_from_suffix(path: &SymbolPath) -> Classification {
    use EntityKind as E;
    use RecordingRule as R;

    let has_owner = path.owner().is_some();
    match path.last_descriptor().map(|d| d.suffix) {
        Some(DescriptorSuffix::Namespace) => Classification::new(E::Namespace, R::Container),
        Some(DescriptorSuffix::Type) => Classification::new(E::Class, R::Container),
        Some(DescriptorSuffix::Method) if has_owner => {
            Classification::new(E::Method, R::BoundCallable)
        }
        Some(DescriptorSuffix::Method) | Some(DescriptorSuffix::Macro) => {
            Classification::new(E::Function, R::Member)
        }
        Some(DescriptorSuffix::TypeParameter) => {
            Classification::new(E::TypeParameter, R::TypeParameter)
        }
        Some(DescriptorSuffix::Term) if has_owner => Classification::new(E::Field, R::Member),
        _ => Classification::new(E::Variable, R::Member),
    }
}

fn is_constructor_declaration(path: &SymbolPath) -> bool {
    path.last_descriptor().is_some_and(|last| {
        last.suffix == DescriptorSuffix::Method && last.name == "<constructor>"
    })
}

fn is_container_kind(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::Class
            | SymbolKind::Mixin
            | SymbolKind::Extension
            | SymbolKind::Struct
            | SymbolKind::Interface
            | SymbolKind::Trait
            | SymbolKind::Enum
            | SymbolKind::Namespace
            | SymbolKind::Module
            | SymbolKind::Package
            | SymbolKind::TypeAlias
    )
}
