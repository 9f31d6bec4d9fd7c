mod common;

use common::{FailOn, FlakySink, index_of, reference};
use sciptrail::storage::SinkRecord;
use sciptrail::types::{EntityKind, SymbolKind};
use sciptrail::{ConvertError, Converter, EdgeKind, JsonLinesSink, ScipIndex, SymbolRoles};
use tempfile::TempDir;

fn calling_index() -> ScipIndex {
    let mut index = index_of(&[
        ("pkg/Foo#", SymbolKind::Class),
        ("pkg/Foo#bar().", SymbolKind::Method),
        ("pkg/Rejected#", SymbolKind::Class),
        ("pkg/main().", SymbolKind::Function),
    ]);
    index.occurrences.push(reference(
        "lib/main.dart",
        "pkg/main().",
        SymbolRoles::READ_ACCESS,
        "pkg/Foo#bar().",
    ));
    index
}

#[test]
fn test_json_lines_sink_receives_the_whole_graph() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out").join("graph.jsonl");

    let mut sink = JsonLinesSink::create(&path).unwrap();
    let report = Converter::default()
        .convert(&calling_index(), &mut sink)
        .unwrap();

    let records = JsonLinesSink::read_records(&path).unwrap();
    let entities = records
        .iter()
        .filter(|r| matches!(r, SinkRecord::Entity(_)))
        .count();
    assert_eq!(entities, report.entities_recorded);

    let calls: Vec<_> = records
        .iter()
        .filter_map(|r| match r {
            SinkRecord::Edge(edge) => Some(edge.kind),
            _ => None,
        })
        .collect();
    assert_eq!(calls, vec![EdgeKind::Call]);

    // Files come first, the commit marker last
    assert!(matches!(records.first(), Some(SinkRecord::File(f)) if f.path == "lib/main.dart"));
    assert_eq!(
        records.last(),
        Some(&SinkRecord::Commit {
            entities: 4,
            files: 1
        })
    );
}

#[test]
fn test_rejected_entity_is_reported_and_run_commits() {
    let mut sink = FlakySink::new(FailOn::Entity("Rejected".to_string()));
    let report = Converter::default()
        .convert(&calling_index(), &mut sink)
        .unwrap();

    assert_eq!(report.unregistered_count, 1);
    assert_eq!(report.unregistered[0].symbol, "pkg/Rejected#");
    assert_eq!(report.unregistered[0].kind, "Class");
    assert_eq!(sink.inner.find_by_kind(EntityKind::Class).len(), 1);
    assert!(sink.inner.is_committed());
}

#[test]
fn test_rejected_edge_is_reported_and_not_counted_as_a_call() {
    let mut sink = FlakySink::new(FailOn::EdgeKind(EdgeKind::Call));
    let report = Converter::default()
        .convert(&calling_index(), &mut sink)
        .unwrap();

    assert_eq!(report.failed_relationship_count, 1);
    let failure = &report.failed_relationships[0];
    assert_eq!(failure.source, "pkg/main().");
    assert_eq!(failure.target, "pkg/Foo#bar().");
    assert_eq!(failure.kind, "Call");
    assert_eq!(report.call_graph.total_calls, 0);
    assert!(sink.inner.is_committed());
}

#[test]
fn test_rejected_callback_registration_adds_no_reverse_edge() {
    let mut index = index_of(&[
        ("dart:async/Stream#", SymbolKind::Class),
        ("dart:async/Stream#listen().", SymbolKind::Method),
        ("pkg/init().", SymbolKind::Function),
    ]);
    index.occurrences.push(reference(
        "lib/main.dart",
        "pkg/init().",
        SymbolRoles::CALL,
        "dart:async/Stream#listen().",
    ));

    let mut sink = FlakySink::new(FailOn::EdgeKind(EdgeKind::Call));
    let report = Converter::default().convert(&index, &mut sink).unwrap();

    assert!(sink.inner.edges().is_empty());
    assert_eq!(report.failed_relationship_count, 1);
    assert_eq!(report.call_graph.callback_registrations, 0);
    assert_eq!(report.call_graph.callback_calls, 0);

    // The same registration goes through when the sink accepts it
    let (_, accepting) = common::convert(&index);
    assert_eq!(accepting.edges_of_kind(EdgeKind::Usage).len(), 1);
}

#[test]
fn test_commit_failure_aborts_the_run() {
    let mut sink = FlakySink::new(FailOn::Commit);
    let err = Converter::default()
        .convert(&calling_index(), &mut sink)
        .unwrap_err();

    assert!(matches!(err, ConvertError::Sink { operation: "commit", .. }));
    assert_eq!(err.status_code(), "SINK_FAILURE");
    assert!(!err.recovery_suggestions().is_empty());
    assert_eq!(sink.close_calls, 1);
    assert!(!sink.inner.is_committed());
}

#[test]
fn test_report_serializes_and_displays() {
    let mut sink = FlakySink::new(FailOn::Entity("Rejected".to_string()));
    let report = Converter::default()
        .convert(&calling_index(), &mut sink)
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["entities_recorded"], 3);
    assert_eq!(json["call_graph"]["direct_calls"], 1);
    assert_eq!(json["unregistered"][0]["symbol"], "pkg/Rejected#");

    let text = report.to_string();
    assert!(text.starts_with("Conversion Complete:"));
    assert!(text.contains("pkg/Rejected#"));
}
