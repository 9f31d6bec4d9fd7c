//! Per-run state threaded through every conversion stage

use super::progress::ConversionReport;
use crate::config::Settings;
use crate::relationship::{Edge, RelationshipClassifier};
use crate::storage::{GraphSink, SinkResult};
use crate::symbol::{NameNormalizer, SymbolParser, SymbolPath};
use crate::types::{EntityId, EntityKind, FileId, Range};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Raw symbol string -> entity id, with alias keys for container variants.
///
/// Append-only: a key, once mapped, keeps its id for the rest of the run.
#[derive(Debug, Default)]
pub struct SymbolTable {
    exact: HashMap<String, EntityId>,
    aliases: HashMap<String, EntityId>,
    /// Every key, literal or alias, that maps to an entity
    keys: HashMap<EntityId, Vec<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Literal keys win over alias keys
    pub fn get(&self, symbol: &str) -> Option<EntityId> {
        self.exact
            .get(symbol)
            .or_else(|| self.aliases.get(symbol))
            .copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    /// Map a literal key; returns the id already mapped if there is one
    pub fn insert(&mut self, symbol: &str, id: EntityId) -> EntityId {
        if let Some(existing) = self.exact.get(symbol) {
            return *existing;
        }
        self.exact.insert(symbol.to_string(), id);
        self.keys.entry(id).or_default().push(symbol.to_string());
        id
    }

    /// Map an alias key unless any mapping for it exists. Returns whether
    /// the alias was added.
    pub fn insert_alias(&mut self, alias: &str, id: EntityId) -> bool {
        if self.exact.contains_key(alias) || self.aliases.contains_key(alias) {
            return false;
        }
        self.aliases.insert(alias.to_string(), id);
        self.keys.entry(id).or_default().push(alias.to_string());
        true
    }

    /// Keys mapped to `id`, in insertion order
    pub fn keys_of(&self, id: EntityId) -> &[String] {
        self.keys.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

/// Normalized file path -> file id
#[derive(Debug, Default)]
pub struct FileTable {
    by_path: HashMap<String, FileId>,
}

impl FileTable {
    pub fn get(&self, path: &str) -> Option<FileId> {
        self.by_path.get(&normalize_path(path)).copied()
    }

    /// Create the file in the sink on first sight of its normalized path
    pub fn get_or_create<S: GraphSink>(
        &mut self,
        sink: &mut S,
        path: &str,
        language: Option<&str>,
    ) -> SinkResult<(FileId, bool)> {
        let normalized = normalize_path(path);
        if let Some(id) = self.by_path.get(&normalized) {
            return Ok((*id, false));
        }
        let id = sink.create_file(&normalized, language)?;
        self.by_path.insert(normalized, id);
        Ok((id, true))
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

/// Backslashes become forward slashes and a leading `./` is dropped
pub fn normalize_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

/// What the engine remembers about an entity it created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub parent: Option<EntityId>,
    /// Symbol string the entity was first recorded for
    pub key: String,
    /// Test and fallback scopes
    pub synthetic: bool,
}

#[derive(Debug, Default)]
pub struct EntityRegistry {
    infos: HashMap<EntityId, EntityInfo>,
    containers: Vec<EntityId>,
}

impl EntityRegistry {
    pub fn get(&self, id: EntityId) -> Option<&EntityInfo> {
        self.infos.get(&id)
    }

    pub fn insert(&mut self, info: EntityInfo) {
        if info.kind.is_container() && !info.synthetic {
            self.containers.push(info.id);
        }
        self.infos.insert(info.id, info);
    }

    /// Non-synthetic containers in recording order
    pub fn containers(&self) -> impl Iterator<Item = &EntityInfo> + '_ {
        self.containers.iter().filter_map(|id| self.infos.get(id))
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

/// A definition occurrence whose body range can enclose references
#[derive(Debug, Clone, Copy)]
pub struct DefinitionSpan {
    pub entity: EntityId,
    pub range: Range,
    pub callable: bool,
}

/// All mutable state of one conversion run.
///
/// Nothing here is shared between runs, so independent conversions can
/// proceed on separate threads.
pub struct ConversionContext {
    pub settings: Settings,
    pub parser: SymbolParser,
    pub normalizer: NameNormalizer,
    pub classifier: RelationshipClassifier,
    pub symbols: SymbolTable,
    pub files: FileTable,
    pub entities: EntityRegistry,
    /// Symbols whose signature carries an async marker
    pub async_symbols: HashSet<String>,
    /// Edges produced while recording entities, emitted first in the edge phase
    pub deferred_edges: Vec<Edge>,
    pub definitions: HashMap<FileId, Vec<DefinitionSpan>>,
    pub report: ConversionReport,
    test_scope: Option<EntityId>,
    fallback_scope: Option<EntityId>,
}

impl ConversionContext {
    pub fn new(settings: &Settings) -> Self {
        Self {
            parser: SymbolParser::new(&settings.symbols),
            normalizer: NameNormalizer::new(&settings.conversion),
            classifier: RelationshipClassifier::new(&settings.call_graph),
            symbols: SymbolTable::new(),
            files: FileTable::default(),
            entities: EntityRegistry::default(),
            async_symbols: HashSet::new(),
            deferred_edges: Vec::new(),
            definitions: HashMap::new(),
            report: ConversionReport::new(settings.report.max_reported_errors),
            test_scope: None,
            fallback_scope: None,
            settings: settings.clone(),
        }
    }

    /// Private and generated declaration prefixes, in one list
    pub fn decl_prefixes(&self) -> Vec<String> {
        self.settings
            .symbols
            .private_prefixes
            .iter()
            .chain(&self.settings.symbols.generated_prefixes)
            .cloned()
            .collect()
    }

    /// Spellings of a member under the other keys of its owning type.
    ///
    /// `pkg/Foo#baz().` yields `pkg/_Foo#baz().` once `pkg/Foo#` and
    /// `pkg/_Foo#` name the same entity.
    pub fn member_variants(&self, path: &SymbolPath) -> Vec<String> {
        let Some(owner_key) = path.owner_key() else {
            return Vec::new();
        };
        let Some(owner) = self.symbols.get(owner_key) else {
            return Vec::new();
        };
        let rest = &path.raw()[owner_key.len()..];
        self.symbols
            .keys_of(owner)
            .iter()
            .filter(|key| key.as_str() != owner_key && key.ends_with('#'))
            .map(|key| format!("{key}{rest}"))
            .collect()
    }

    /// Entity for a raw symbol, also trying its owner's other spellings
    pub fn resolve_symbol(&self, raw: &str) -> Option<EntityId> {
        if let Some(id) = self.symbols.get(raw) {
            return Some(id);
        }
        let path = self.parser.parse(raw).ok()?;
        self.member_variants(&path)
            .iter()
            .find_map(|variant| self.symbols.get(variant))
    }

    /// Make a member reachable under every spelling of its owner
    pub fn register_member_variants(&mut self, path: &SymbolPath, id: EntityId) {
        for variant in self.member_variants(path) {
            self.symbols.insert_alias(&variant, id);
        }
    }

    /// Create an entity in the sink and remember it under `key`
    pub fn create_entity<S: GraphSink>(
        &mut self,
        sink: &mut S,
        kind: EntityKind,
        name: &str,
        parent: Option<EntityId>,
        key: &str,
    ) -> SinkResult<EntityId> {
        let id = sink.create_entity(kind, name, parent)?;
        self.report.entities_recorded += 1;
        self.symbols.insert(key, id);
        self.entities.insert(EntityInfo {
            id,
            kind,
            name: name.to_string(),
            parent,
            key: key.to_string(),
            synthetic: false,
        });
        debug!("recorded {kind} '{name}' as {id} for {key}");
        Ok(id)
    }

    /// The shared scope for test symbols that resolve nowhere else
    pub fn test_scope<S: GraphSink>(&mut self, sink: &mut S) -> SinkResult<EntityId> {
        if let Some(id) = self.test_scope {
            return Ok(id);
        }
        let name = self.settings.conversion.test_scope_name.clone();
        let id = self.create_synthetic_scope(sink, &name)?;
        self.test_scope = Some(id);
        Ok(id)
    }

    /// The shared scope for members with no owning type at all
    pub fn fallback_scope<S: GraphSink>(&mut self, sink: &mut S) -> SinkResult<EntityId> {
        if let Some(id) = self.fallback_scope {
            return Ok(id);
        }
        let name = self.settings.conversion.fallback_scope_name.clone();
        let id = self.create_synthetic_scope(sink, &name)?;
        self.fallback_scope = Some(id);
        Ok(id)
    }

    fn create_synthetic_scope<S: GraphSink>(
        &mut self,
        sink: &mut S,
        name: &str,
    ) -> SinkResult<EntityId> {
        let id = sink.create_entity(EntityKind::Namespace, name, None)?;
        self.report.entities_recorded += 1;
        self.report.synthesized_scopes += 1;
        // Synthetic scopes are never reachable through the symbol table
        self.entities.insert(EntityInfo {
            id,
            kind: EntityKind::Namespace,
            name: name.to_string(),
            parent: None,
            key: String::new(),
            synthetic: true,
        });
        debug!("created synthetic scope '{name}' as {id}");
        Ok(id)
    }

    /// Innermost recorded definition in `file` whose body contains `range`.
    ///
    /// Callable definitions win over other enclosing definitions.
    pub fn enclosing_definition(&self, file: FileId, range: &Range) -> Option<EntityId> {
        let spans = self.definitions.get(&file)?;
        spans
            .iter()
            .filter(|span| span.range.encloses(range))
            .min_by_key(|span| (!span.callable, span.range.line_span()))
            .map(|span| span.entity)
    }
}
