use super::{
    EdgeRecord, EntityRecord, FileRecord, GraphSink, LocationRecord, SinkError, SinkResult,
    language_or_unknown,
};
use crate::relationship::EdgeKind;
use crate::types::{EntityCounter, EntityId, EntityKind, FileId, Range};
use std::collections::HashMap;

/// In-memory graph, queryable after the run.
///
/// Nothing is visible as committed until [`GraphSink::commit`] is called;
/// writes after [`GraphSink::close`] fail with [`SinkError::Closed`].
#[derive(Debug, Default)]
pub struct MemorySink {
    entity_ids: EntityCounter,
    file_ids: EntityCounter,
    files: Vec<FileRecord>,
    entities: Vec<EntityRecord>,
    locations: Vec<LocationRecord>,
    edges: Vec<EdgeRecord>,
    by_name: HashMap<String, Vec<EntityId>>,
    by_parent: HashMap<EntityId, Vec<EntityId>>,
    commits: usize,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    pub fn locations(&self) -> &[LocationRecord] {
        &self.locations
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        let index = usize::try_from(id.value()).ok()?.checked_sub(1)?;
        self.entities.get(index)
    }

    pub fn file(&self, id: FileId) -> Option<&FileRecord> {
        let index = usize::try_from(id.value()).ok()?.checked_sub(1)?;
        self.files.get(index)
    }

    pub fn find_by_name(&self, name: &str) -> Vec<&EntityRecord> {
        self.by_name
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| self.entity(*id)).collect())
            .unwrap_or_default()
    }

    pub fn find_by_kind(&self, kind: EntityKind) -> Vec<&EntityRecord> {
        self.entities.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn children(&self, parent: EntityId) -> Vec<&EntityRecord> {
        self.by_parent
            .get(&parent)
            .map(|ids| ids.iter().filter_map(|id| self.entity(*id)).collect())
            .unwrap_or_default()
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> Vec<&EdgeRecord> {
        self.edges.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn edges_from(&self, source: EntityId) -> Vec<&EdgeRecord> {
        self.edges.iter().filter(|e| e.source == source).collect()
    }

    pub fn locations_of(&self, entity: EntityId) -> Vec<&LocationRecord> {
        self.locations.iter().filter(|l| l.entity == entity).collect()
    }

    /// Name chain from the root down to `id`, e.g. `["app", "Foo", "bar"]`
    pub fn qualified_name(&self, id: EntityId) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self.entity(id);
        while let Some(entity) = current {
            chain.push(entity.name.as_str());
            // Parents are always created before their children
            current = entity
                .parent
                .filter(|p| *p < entity.id)
                .and_then(|p| self.entity(p));
        }
        chain.reverse();
        chain
    }

    pub fn is_committed(&self) -> bool {
        self.commits > 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn ensure_open(&self) -> SinkResult<()> {
        if self.closed {
            Err(SinkError::Closed)
        } else {
            Ok(())
        }
    }

    fn ensure_entity(&self, id: EntityId) -> SinkResult<()> {
        match self.entity(id) {
            Some(_) => Ok(()),
            None => Err(SinkError::UnknownId {
                what: "entity",
                id: id.value(),
            }),
        }
    }
}

impl GraphSink for MemorySink {
    fn create_file(&mut self, path: &str, language: Option<&str>) -> SinkResult<FileId> {
        self.ensure_open()?;
        let id = self
            .file_ids
            .next_file_id()
            .ok_or(SinkError::IdExhausted("file"))?;
        self.files.push(FileRecord {
            id,
            path: path.to_string(),
            language: language_or_unknown(language),
        });
        Ok(id)
    }

    fn create_entity(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: Option<EntityId>,
    ) -> SinkResult<EntityId> {
        self.ensure_open()?;
        if let Some(parent) = parent {
            self.ensure_entity(parent)?;
        }
        let id = self
            .entity_ids
            .next_id()
            .ok_or(SinkError::IdExhausted("entity"))?;

        self.entities.push(EntityRecord {
            id,
            kind,
            name: name.to_string(),
            parent,
        });
        self.by_name.entry(name.to_string()).or_default().push(id);
        if let Some(parent) = parent {
            self.by_parent.entry(parent).or_default().push(id);
        }
        Ok(id)
    }

    fn record_location(&mut self, entity: EntityId, file: FileId, range: Range) -> SinkResult<()> {
        self.ensure_open()?;
        self.ensure_entity(entity)?;
        if self.file(file).is_none() {
            return Err(SinkError::UnknownId {
                what: "file",
                id: file.value(),
            });
        }
        self.locations.push(LocationRecord {
            entity,
            file,
            range,
        });
        Ok(())
    }

    fn record_edge(
        &mut self,
        kind: EdgeKind,
        source: EntityId,
        target: EntityId,
    ) -> SinkResult<()> {
        self.ensure_open()?;
        self.ensure_entity(source)?;
        self.ensure_entity(target)?;
        self.edges.push(EdgeRecord {
            kind,
            source,
            target,
        });
        Ok(())
    }

    fn commit(&mut self) -> SinkResult<()> {
        self.ensure_open()?;
        self.commits += 1;
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one_and_grow() {
        let mut sink = MemorySink::new();
        let ns = sink.create_entity(EntityKind::Namespace, "app", None).unwrap();
        let class = sink
            .create_entity(EntityKind::Class, "Foo", Some(ns))
            .unwrap();

        assert_eq!(ns, EntityId(1));
        assert_eq!(class, EntityId(2));
        assert_eq!(sink.entity(class).unwrap().parent, Some(ns));
        assert_eq!(sink.children(ns).len(), 1);
        assert_eq!(sink.qualified_name(class), vec!["app", "Foo"]);
    }

    #[test]
    fn test_find_by_name_and_kind() {
        let mut sink = MemorySink::new();
        sink.create_entity(EntityKind::Class, "Foo", None).unwrap();
        sink.create_entity(EntityKind::Method, "bar", None).unwrap();
        sink.create_entity(EntityKind::Method, "bar", None).unwrap();

        assert_eq!(sink.find_by_name("bar").len(), 2);
        assert_eq!(sink.find_by_kind(EntityKind::Class).len(), 1);
        assert!(sink.find_by_name("baz").is_empty());
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        let mut sink = MemorySink::new();
        let foo = sink.create_entity(EntityKind::Class, "Foo", None).unwrap();

        let err = sink
            .record_edge(EdgeKind::Usage, foo, EntityId(99))
            .unwrap_err();
        assert!(matches!(err, SinkError::UnknownId { what: "entity", id: 99 }));

        let err = sink
            .record_location(foo, FileId(1), Range::new(1, 0, 1, 3))
            .unwrap_err();
        assert!(matches!(err, SinkError::UnknownId { what: "file", .. }));

        assert!(
            sink.create_entity(EntityKind::Method, "bar", Some(EntityId(7)))
                .is_err()
        );
    }

    #[test]
    fn test_file_language_defaults_to_unknown() {
        let mut sink = MemorySink::new();
        let a = sink.create_file("lib/a.dart", Some("dart")).unwrap();
        let b = sink.create_file("lib/b.txt", None).unwrap();

        assert_eq!(sink.file(a).unwrap().language, "dart");
        assert_eq!(sink.file(b).unwrap().language, "unknown");
    }

    #[test]
    fn test_closed_sink_rejects_writes() {
        let mut sink = MemorySink::new();
        sink.commit().unwrap();
        sink.close().unwrap();

        assert!(sink.is_committed());
        assert!(sink.is_closed());
        assert!(matches!(
            sink.create_entity(EntityKind::Class, "Late", None),
            Err(SinkError::Closed)
        ));
        assert!(matches!(sink.close(), Err(SinkError::Closed)));
    }
}
