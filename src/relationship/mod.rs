//! Typed edges between entities and the rules that derive them from
//! occurrence role bits.

pub mod call_graph;
pub mod classifier;

pub use call_graph::{CallCategory, CallGraphStats, CallSite};
pub use classifier::RelationshipClassifier;

use crate::types::EntityId;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    Usage,
    Call,
    Inheritance,
    Override,
    TypeUsage,
    Implementation,
    Import,
    Membership,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Usage => "Usage",
            EdgeKind::Call => "Call",
            EdgeKind::Inheritance => "Inheritance",
            EdgeKind::Override => "Override",
            EdgeKind::TypeUsage => "TypeUsage",
            EdgeKind::Implementation => "Implementation",
            EdgeKind::Import => "Import",
            EdgeKind::Membership => "Membership",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed directed relationship between two recorded entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub source: EntityId,
    pub target: EntityId,
}

impl Edge {
    pub fn new(kind: EdgeKind, source: EntityId, target: EntityId) -> Self {
        Self {
            kind,
            source,
            target,
        }
    }
}

bitflags! {
    /// Occurrence role bitmask.
    ///
    /// The low seven bits carry SCIP's `SymbolRole` values; the rest are
    /// extensions emitted by richer indexers. Bits are independent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolRoles: u32 {
        const DEFINITION         = 0x1;
        const IMPORT             = 0x2;
        const WRITE_ACCESS       = 0x4;
        const READ_ACCESS        = 0x8;
        const GENERATED          = 0x10;
        const TEST               = 0x20;
        const FORWARD_DEFINITION = 0x40;
        const REFERENCE          = 0x80;
        const CALL               = 0x100;
        const IMPLEMENTATION     = 0x200;
        const OVERRIDE           = 0x400;
        const TYPE_DEFINITION    = 0x800;
    }
}

impl SymbolRoles {
    /// Unknown bits are dropped rather than rejected
    pub fn from_raw(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }
}

/// Syntactic hint attached to an occurrence (`extends Foo`, `implements Bar`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyntaxTag {
    Extends,
    Implements,
    With,
    #[default]
    Other,
}

impl SyntaxTag {
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.map(|h| h.trim().to_ascii_lowercase()).as_deref() {
            Some("extends") => SyntaxTag::Extends,
            Some("implements") => SyntaxTag::Implements,
            Some("with") => SyntaxTag::With,
            _ => SyntaxTag::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scip_role_values() {
        let roles = SymbolRoles::from_raw(0x1 | 0x8);
        assert!(roles.contains(SymbolRoles::DEFINITION));
        assert!(roles.contains(SymbolRoles::READ_ACCESS));
        assert!(!roles.contains(SymbolRoles::CALL));

        // Unknown high bits are ignored
        assert_eq!(SymbolRoles::from_raw(0x10000), SymbolRoles::empty());
    }

    #[test]
    fn test_syntax_tag_from_hint() {
        assert_eq!(SyntaxTag::from_hint(Some("implements")), SyntaxTag::Implements);
        assert_eq!(SyntaxTag::from_hint(Some(" Extends ")), SyntaxTag::Extends);
        assert_eq!(SyntaxTag::from_hint(Some("with")), SyntaxTag::With);
        assert_eq!(SyntaxTag::from_hint(None), SyntaxTag::Other);
    }
}
