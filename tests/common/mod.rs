#![allow(dead_code)]

use sciptrail::storage::SinkResult;
use sciptrail::types::{EntityId, EntityKind, FileId, Range, SymbolKind};
use sciptrail::{
    ConversionReport, Converter, EdgeKind, GraphSink, MemorySink, Occurrence, ScipIndex, SinkError,
    SymbolInformation, SymbolRoles,
};

/// Flat index built from (symbol, kind) pairs
pub fn index_of(symbols: &[(&str, SymbolKind)]) -> ScipIndex {
    ScipIndex {
        symbols: symbols
            .iter()
            .map(|(raw, kind)| SymbolInformation::new(*raw, *kind))
            .collect(),
        ..Default::default()
    }
}

pub fn reference(file: &str, source: &str, roles: SymbolRoles, target: &str) -> Occurrence {
    Occurrence {
        target: Some(target.to_string()),
        file: Some(file.to_string()),
        ..Occurrence::new(source, roles)
    }
}

pub fn convert(index: &ScipIndex) -> (ConversionReport, MemorySink) {
    let mut sink = MemorySink::new();
    let report = Converter::default()
        .convert(index, &mut sink)
        .expect("conversion failed");
    (report, sink)
}

/// Id of the single entity named `name`
pub fn entity_named(sink: &MemorySink, name: &str) -> EntityId {
    let found = sink.find_by_name(name);
    assert_eq!(found.len(), 1, "expected exactly one entity named {name}");
    found[0].id
}

/// Entities as (kind, qualified name, parent qualified name), id-free and sorted
pub fn entity_shape(sink: &MemorySink) -> Vec<(EntityKind, String, Option<String>)> {
    let mut shape: Vec<_> = sink
        .entities()
        .iter()
        .map(|e| {
            (
                e.kind,
                sink.qualified_name(e.id).join("::"),
                e.parent.map(|p| sink.qualified_name(p).join("::")),
            )
        })
        .collect();
    shape.sort();
    shape
}

/// Edges as (kind, source qualified name, target qualified name), sorted
pub fn edge_shape(sink: &MemorySink) -> Vec<(EdgeKind, String, String)> {
    let mut shape: Vec<_> = sink
        .edges()
        .iter()
        .map(|e| {
            (
                e.kind,
                sink.qualified_name(e.source).join("::"),
                sink.qualified_name(e.target).join("::"),
            )
        })
        .collect();
    shape.sort();
    shape
}

/// Which sink operation a [`FlakySink`] should reject
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    Entity(String),
    EdgeKind(EdgeKind),
    Commit,
}

/// Wraps a [`MemorySink`] and rejects one kind of call
pub struct FlakySink {
    pub inner: MemorySink,
    pub fail_on: FailOn,
    pub close_calls: usize,
}

impl FlakySink {
    pub fn new(fail_on: FailOn) -> Self {
        Self {
            inner: MemorySink::new(),
            fail_on,
            close_calls: 0,
        }
    }
}

impl GraphSink for FlakySink {
    fn create_file(&mut self, path: &str, language: Option<&str>) -> SinkResult<FileId> {
        self.inner.create_file(path, language)
    }

    fn create_entity(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: Option<EntityId>,
    ) -> SinkResult<EntityId> {
        if matches!(&self.fail_on, FailOn::Entity(rejected) if rejected == name) {
            return Err(SinkError::recording("create_entity", format!("rejected {name}")));
        }
        self.inner.create_entity(kind, name, parent)
    }

    fn record_location(&mut self, entity: EntityId, file: FileId, range: Range) -> SinkResult<()> {
        self.inner.record_location(entity, file, range)
    }

    fn record_edge(
        &mut self,
        kind: EdgeKind,
        source: EntityId,
        target: EntityId,
    ) -> SinkResult<()> {
        if self.fail_on == FailOn::EdgeKind(kind) {
            return Err(SinkError::recording("record_edge", format!("rejected {kind}")));
        }
        self.inner.record_edge(kind, source, target)
    }

    fn commit(&mut self) -> SinkResult<()> {
        if self.fail_on == FailOn::Commit {
            return Err(SinkError::Io(std::io::Error::other("disk full")));
        }
        self.inner.commit()
    }

    fn close(&mut self) -> SinkResult<()> {
        self.close_calls += 1;
        self.inner.close()
    }
}
