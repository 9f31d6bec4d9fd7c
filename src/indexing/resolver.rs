//! Parent scope resolution
//!
//! A member's parent is never given explicitly; it has to be found from the
//! structure of its symbol string. The strategies below are tried in
//! [`ResolutionStrategy::ORDER`]; each one can also be run on its own.

use super::context::{ConversionContext, EntityRegistry, SymbolTable};
use crate::storage::{GraphSink, SinkResult};
use crate::symbol::SymbolPath;
use crate::types::{EntityId, EntityKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionStrategy {
    /// The full scope chain is a recorded symbol (or alias)
    ExactScope,
    /// Constructors and their parameters bind to the owning type
    ConstructorOwner,
    /// Drop trailing scope steps until a recorded symbol is found
    ShortenedChain,
    /// A recorded type whose name is contained in the owner's name
    NameContainment,
    /// Test-related symbols fall back to the shared test scope
    TestScope,
}

impl ResolutionStrategy {
    pub const ORDER: [ResolutionStrategy; 5] = [
        ResolutionStrategy::ExactScope,
        ResolutionStrategy::ConstructorOwner,
        ResolutionStrategy::ShortenedChain,
        ResolutionStrategy::NameContainment,
        ResolutionStrategy::TestScope,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStrategy::ExactScope => "exact-scope",
            ResolutionStrategy::ConstructorOwner => "constructor-owner",
            ResolutionStrategy::ShortenedChain => "shortened-chain",
            ResolutionStrategy::NameContainment => "name-containment",
            ResolutionStrategy::TestScope => "test-scope",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub parent: EntityId,
    pub strategy: ResolutionStrategy,
}

/// Read-only lookups over what has been recorded so far
pub struct ScopeResolver<'a> {
    symbols: &'a SymbolTable,
    entities: &'a EntityRegistry,
}

impl<'a> ScopeResolver<'a> {
    pub fn new(symbols: &'a SymbolTable, entities: &'a EntityRegistry) -> Self {
        Self { symbols, entities }
    }

    /// Run the lookup strategies in order. The test-scope fallback needs to
    /// create an entity and is handled by [`resolve_parent`].
    pub fn resolve(&self, path: &SymbolPath) -> Option<Resolution> {
        ResolutionStrategy::ORDER.iter().find_map(|strategy| {
            self.apply(*strategy, path).map(|parent| Resolution {
                parent,
                strategy: *strategy,
            })
        })
    }

    pub fn apply(&self, strategy: ResolutionStrategy, path: &SymbolPath) -> Option<EntityId> {
        match strategy {
            ResolutionStrategy::ExactScope => self.exact_scope(path),
            ResolutionStrategy::ConstructorOwner => self.constructor_owner(path),
            ResolutionStrategy::ShortenedChain => self.shortened_chain(path),
            ResolutionStrategy::NameContainment => self.name_containment(path),
            ResolutionStrategy::TestScope => None,
        }
    }

    pub fn exact_scope(&self, path: &SymbolPath) -> Option<EntityId> {
        self.symbols.get(path.parent_key()?)
    }

    pub fn constructor_owner(&self, path: &SymbolPath) -> Option<EntityId> {
        if !path.is_constructor() {
            return None;
        }
        self.symbols.get(path.owner_key()?)
    }

    pub fn shortened_chain(&self, path: &SymbolPath) -> Option<EntityId> {
        path.ancestor_keys()
            .into_iter()
            .skip(1)
            .find_map(|key| self.symbols.get(key))
    }

    /// Among recorded types whose name occurs inside the owner's bare name,
    /// prefer the longest name, then the key sharing the longest prefix with
    /// the symbol, then the earliest recorded.
    pub fn name_containment(&self, path: &SymbolPath) -> Option<EntityId> {
        let owner = path.owner()?;
        if owner.is_empty() {
            return None;
        }

        self.entities
            .containers()
            // Type-parameter placeholders are recorded as aliases but are not types
            .filter(|info| is_type_like(info.kind) && info.key.ends_with('#'))
            .filter(|info| !info.name.is_empty() && owner.contains(info.name.as_str()))
            .max_by(|a, b| {
                a.name
                    .len()
                    .cmp(&b.name.len())
                    .then_with(|| {
                        common_prefix_len(&a.key, path.raw())
                            .cmp(&common_prefix_len(&b.key, path.raw()))
                    })
                    .then_with(|| b.id.cmp(&a.id))
            })
            .map(|info| info.id)
    }
}

fn is_type_like(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::Class | EntityKind::Interface | EntityKind::Enum | EntityKind::TypeAlias
    )
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

/// Resolve a parent, creating the shared test scope when a test-related
/// symbol resolves nowhere else.
pub fn resolve_parent<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    path: &SymbolPath,
) -> SinkResult<Option<Resolution>> {
    if let Some(resolution) = ScopeResolver::new(&ctx.symbols, &ctx.entities).resolve(path) {
        return Ok(Some(resolution));
    }
    if path.is_test_related() {
        let parent = ctx.test_scope(sink)?;
        return Ok(Some(Resolution {
            parent,
            strategy: ResolutionStrategy::TestScope,
        }));
    }
    Ok(None)
}
