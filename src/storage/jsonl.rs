//! Append-only JSON-lines sink: one record per line, a `commit` marker at
//! the end of a successful run.

use super::{
    EdgeRecord, EntityRecord, FileRecord, GraphSink, LocationRecord, SinkError, SinkResult,
    language_or_unknown,
};
use crate::relationship::EdgeKind;
use crate::types::{EntityCounter, EntityId, EntityKind, FileId, Range};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum SinkRecord {
    File(FileRecord),
    Entity(EntityRecord),
    Location(LocationRecord),
    Edge(EdgeRecord),
    Commit { entities: u32, files: u32 },
}

#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    entity_ids: EntityCounter,
    file_ids: EntityCounter,
}

impl JsonLinesSink {
    /// Create (or truncate) the output file
    pub fn create(path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            entity_ids: EntityCounter::new(),
            file_ids: EntityCounter::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record of a sink file
    pub fn read_records(path: impl AsRef<Path>) -> SinkResult<Vec<SinkRecord>> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    fn write(&mut self, record: &SinkRecord) -> SinkResult<()> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn check_entity(&self, id: EntityId) -> SinkResult<()> {
        if id.value() == 0 || id.value() > self.entity_ids.current_count() {
            return Err(SinkError::UnknownId {
                what: "entity",
                id: id.value(),
            });
        }
        Ok(())
    }
}

impl GraphSink for JsonLinesSink {
    fn create_file(&mut self, path: &str, language: Option<&str>) -> SinkResult<FileId> {
        if self.writer.is_none() {
            return Err(SinkError::Closed);
        }
        let id = self
            .file_ids
            .next_file_id()
            .ok_or(SinkError::IdExhausted("file"))?;
        self.write(&SinkRecord::File(FileRecord {
            id,
            path: path.to_string(),
            language: language_or_unknown(language),
        }))?;
        Ok(id)
    }

    fn create_entity(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: Option<EntityId>,
    ) -> SinkResult<EntityId> {
        if self.writer.is_none() {
            return Err(SinkError::Closed);
        }
        if let Some(parent) = parent {
            self.check_entity(parent)?;
        }
        let id = self
            .entity_ids
            .next_id()
            .ok_or(SinkError::IdExhausted("entity"))?;
        self.write(&SinkRecord::Entity(EntityRecord {
            id,
            kind,
            name: name.to_string(),
            parent,
        }))?;
        Ok(id)
    }

    fn record_location(&mut self, entity: EntityId, file: FileId, range: Range) -> SinkResult<()> {
        self.check_entity(entity)?;
        if file.value() == 0 || file.value() > self.file_ids.current_count() {
            return Err(SinkError::UnknownId {
                what: "file",
                id: file.value(),
            });
        }
        self.write(&SinkRecord::Location(LocationRecord {
            entity,
            file,
            range,
        }))
    }

    fn record_edge(
        &mut self,
        kind: EdgeKind,
        source: EntityId,
        target: EntityId,
    ) -> SinkResult<()> {
        self.check_entity(source)?;
        self.check_entity(target)?;
        self.write(&SinkRecord::Edge(EdgeRecord {
            kind,
            source,
            target,
        }))
    }

    fn commit(&mut self) -> SinkResult<()> {
        let marker = SinkRecord::Commit {
            entities: self.entity_ids.current_count(),
            files: self.file_ids.current_count(),
        };
        self.write(&marker)?;
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        let mut writer = self.writer.take().ok_or(SinkError::Closed)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_records_are_written_one_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("graph.jsonl");

        let mut sink = JsonLinesSink::create(&path).unwrap();
        let file = sink.create_file("lib/main.dart", Some("dart")).unwrap();
        let class = sink.create_entity(EntityKind::Class, "Foo", None).unwrap();
        let method = sink
            .create_entity(EntityKind::Method, "bar", Some(class))
            .unwrap();
        sink.record_location(method, file, Range::new(3, 2, 3, 5))
            .unwrap();
        sink.record_edge(EdgeKind::Call, method, class).unwrap();
        sink.commit().unwrap();
        sink.close().unwrap();

        let records = JsonLinesSink::read_records(&path).unwrap();
        assert_eq!(records.len(), 6);
        assert!(matches!(&records[0], SinkRecord::File(f) if f.language == "dart"));
        assert!(matches!(&records[2], SinkRecord::Entity(e) if e.parent == Some(class)));
        assert_eq!(
            records.last(),
            Some(&SinkRecord::Commit {
                entities: 2,
                files: 1
            })
        );

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().next().unwrap().contains("\"record\":\"file\""));
    }

    #[test]
    fn test_closed_sink_rejects_writes() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = JsonLinesSink::create(temp_dir.path().join("g.jsonl")).unwrap();
        sink.close().unwrap();

        assert!(matches!(
            sink.create_entity(EntityKind::Class, "Foo", None),
            Err(SinkError::Closed)
        ));
        assert!(matches!(sink.close(), Err(SinkError::Closed)));
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = JsonLinesSink::create(temp_dir.path().join("g.jsonl")).unwrap();
        let foo = sink.create_entity(EntityKind::Class, "Foo", None).unwrap();
        assert!(sink.record_edge(EdgeKind::Usage, foo, EntityId(5)).is_err());
    }
}
