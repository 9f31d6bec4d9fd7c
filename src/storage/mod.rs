//! Destination graph sinks
//!
//! The converter only talks to [`GraphSink`]; any store that can create
//! files and entities, attach locations, and append edges is a valid target.

pub mod error;
pub mod jsonl;
pub mod memory;

pub use error::{SinkError, SinkResult};
pub use jsonl::{JsonLinesSink, SinkRecord};
pub use memory::MemorySink;

use crate::relationship::EdgeKind;
use crate::types::{EntityId, EntityKind, FileId, Range};
use serde::{Deserialize, Serialize};

/// Append-only recording interface of a code-navigation store.
///
/// A sink is owned exclusively by one conversion run. `commit` and `close`
/// are called exactly once each, in that order, at the end of the run.
pub trait GraphSink {
    fn create_file(&mut self, path: &str, language: Option<&str>) -> SinkResult<FileId>;

    fn create_entity(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: Option<EntityId>,
    ) -> SinkResult<EntityId>;

    fn record_location(&mut self, entity: EntityId, file: FileId, range: Range) -> SinkResult<()>;

    fn record_edge(&mut self, kind: EdgeKind, source: EntityId, target: EntityId)
    -> SinkResult<()>;

    fn commit(&mut self) -> SinkResult<()>;

    fn close(&mut self) -> SinkResult<()>;
}

impl<S: GraphSink + ?Sized> GraphSink for &mut S {
    fn create_file(&mut self, path: &str, language: Option<&str>) -> SinkResult<FileId> {
        (**self).create_file(path, language)
    }

    fn create_entity(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: Option<EntityId>,
    ) -> SinkResult<EntityId> {
        (**self).create_entity(kind, name, parent)
    }

    fn record_location(&mut self, entity: EntityId, file: FileId, range: Range) -> SinkResult<()> {
        (**self).record_location(entity, file, range)
    }

    fn record_edge(
        &mut self,
        kind: EdgeKind,
        source: EntityId,
        target: EntityId,
    ) -> SinkResult<()> {
        (**self).record_edge(kind, source, target)
    }

    fn commit(&mut self) -> SinkResult<()> {
        (**self).commit()
    }

    fn close(&mut self) -> SinkResult<()> {
        (**self).close()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub path: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub parent: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub entity: EntityId,
    pub file: FileId,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub kind: EdgeKind,
    pub source: EntityId,
    pub target: EntityId,
}

/// Language recorded for files whose index entry carries none
pub const UNKNOWN_LANGUAGE: &str = "unknown";

pub(crate) fn language_or_unknown(language: Option<&str>) -> String {
    match language.map(str::trim) {
        Some(lang) if !lang.is_empty() => lang.to_string(),
        _ => UNKNOWN_LANGUAGE.to_string(),
    }
}
