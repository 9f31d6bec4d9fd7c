//! Pure mapping from role bits and syntax hints to edge kinds

use super::{EdgeKind, SymbolRoles, SyntaxTag};
use crate::config::CallGraphConfig;
use crate::symbol::SymbolPath;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct RelationshipClassifier {
    callback_methods: HashSet<String>,
}

impl Default for RelationshipClassifier {
    fn default() -> Self {
        Self::new(&CallGraphConfig::default())
    }
}

impl RelationshipClassifier {
    pub fn new(config: &CallGraphConfig) -> Self {
        Self {
            callback_methods: config.callback_methods.iter().cloned().collect(),
        }
    }

    /// Edge kinds contributed by `roles` for one occurrence and one target.
    ///
    /// Each bit is decoded independently; the result is de-duplicated and
    /// keeps first-contribution order.
    pub fn classify(&self, roles: SymbolRoles, target: &str, tag: SyntaxTag) -> Vec<EdgeKind> {
        let mut kinds = Vec::new();
        let mut push = |kind: EdgeKind| {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        };

        if roles.intersects(
            SymbolRoles::DEFINITION | SymbolRoles::REFERENCE | SymbolRoles::WRITE_ACCESS,
        ) {
            push(EdgeKind::Usage);
        }
        if roles.contains(SymbolRoles::READ_ACCESS) {
            // An explicit call bit leaves the read to mean a plain access
            if !roles.contains(SymbolRoles::CALL) && reads_as_call(target) {
                push(EdgeKind::Call);
            } else {
                push(EdgeKind::Usage);
            }
        }
        if roles.contains(SymbolRoles::IMPORT) {
            push(EdgeKind::Import);
        }
        if roles.contains(SymbolRoles::CALL) {
            push(EdgeKind::Call);
        }
        if roles.contains(SymbolRoles::IMPLEMENTATION) {
            if tag == SyntaxTag::Implements {
                push(EdgeKind::Implementation);
            } else {
                push(EdgeKind::Inheritance);
            }
        }
        if roles.contains(SymbolRoles::OVERRIDE) {
            push(EdgeKind::Override);
            if tag == SyntaxTag::Extends {
                push(EdgeKind::Inheritance);
            }
        }
        if roles.contains(SymbolRoles::TYPE_DEFINITION) {
            if tag == SyntaxTag::Implements {
                push(EdgeKind::Implementation);
            } else {
                push(EdgeKind::TypeUsage);
            }
        }

        kinds
    }

    /// Target names a deferred-invocation registration (`stream.listen(cb)`)
    pub fn is_callback_registration(&self, target: &SymbolPath) -> bool {
        self.callback_methods.contains(target.bare_leaf_name())
    }
}

/// A read of a member with a call signature is taken as an invocation.
///
/// String heuristic only: no kind information confirms the target is
/// callable.
pub fn reads_as_call(target: &str) -> bool {
    target.contains('#') && target.ends_with("().")
}
