//! Conversion driver
//!
//! Runs the phases in their fixed order against one sink:
//! files, containers, members, deferred edges, occurrence edges, symbol
//! relationships, then commit and close.

use super::context::ConversionContext;
use super::edges;
use super::progress::ConversionReport;
use super::recorder::{record_pass, schedule};
use crate::config::Settings;
use crate::error::{ConvertError, ConvertResult};
use crate::input::ScipIndex;
use crate::storage::GraphSink;
use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, info, warn};

/// Converts symbol indexes into entity graphs
#[derive(Debug, Clone, Default)]
pub struct Converter {
    settings: Settings,
}

impl Converter {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Convert one index into `sink`.
    ///
    /// Per-symbol and per-edge failures are collected in the returned report.
    /// Only a failed commit or close aborts the run.
    pub fn convert<S: GraphSink>(
        &self,
        index: &ScipIndex,
        sink: &mut S,
    ) -> ConvertResult<ConversionReport> {
        let mut ctx = ConversionContext::new(&self.settings);

        // Files
        for (path, language) in index.file_entries() {
            match ctx.files.get_or_create(sink, path, language) {
                Ok((_, true)) => ctx.report.files_recorded += 1,
                Ok((_, false)) => {}
                Err(err) => {
                    warn!("failed to record file {path}: {err}");
                    ctx.report
                        .add_unregistered(path, "File", err.to_string());
                }
            }
        }
        debug!("recorded {} files", ctx.report.files_recorded);

        // Entities, containers strictly before members
        let symbols = index.all_symbols(self.settings.conversion.include_external_symbols);
        let (containers, members) = schedule(&mut ctx, symbols.iter().copied());
        record_pass(&mut ctx, sink, &containers);
        debug!(
            "pass 1: {} containers, {} entities so far",
            containers.len(),
            ctx.report.entities_recorded
        );
        record_pass(&mut ctx, sink, &members);
        debug!(
            "pass 2: {} members, {} entities so far",
            members.len(),
            ctx.report.entities_recorded
        );

        // Edges
        let occurrences = index.all_occurrences();
        edges::collect_definitions(&mut ctx, &occurrences);
        edges::emit_deferred(&mut ctx, sink);
        edges::process_occurrences(&mut ctx, sink, &occurrences);
        edges::process_symbol_relationships(&mut ctx, sink, symbols.iter().copied());

        if let Err(err) = sink.commit() {
            if let Err(close_err) = sink.close() {
                warn!("close after failed commit also failed: {close_err}");
            }
            return Err(ConvertError::sink("commit", err));
        }
        sink.close().map_err(|err| ConvertError::sink("close", err))?;

        let mut report = ctx.report;
        report.finish(self.settings.call_graph.top_n);
        info!(
            "converted {} symbols into {} entities, {} edges and {} locations in {:.2?}",
            report.symbols_seen,
            report.entities_recorded,
            report.edges_recorded,
            report.locations_recorded,
            report.elapsed
        );
        if !report.is_clean() {
            info!(
                "{} symbols unregistered, {} relationships failed",
                report.unregistered_count, report.failed_relationship_count
            );
        }
        Ok(report)
    }
}

/// Convert independent (index, sink) jobs in parallel.
///
/// Each job gets its own context; results come back in job order together
/// with the sink so callers can inspect or reuse it.
pub fn convert_many<S: GraphSink + Send>(
    settings: &Settings,
    jobs: Vec<(ScipIndex, S)>,
) -> Vec<ConvertResult<(ConversionReport, S)>> {
    let converter = Converter::new(settings.clone());
    jobs.into_par_iter()
        .enumerate()
        .map(|(job, (index, mut sink))| {
            catch_unwind(AssertUnwindSafe(|| converter.convert(&index, &mut sink)))
                .map_err(|_| ConvertError::WorkerPanicked { job })
                .and_then(|result| result)
                .map(|report| (report, sink))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Occurrence, SymbolInformation};
    use crate::relationship::{EdgeKind, SymbolRoles};
    use crate::storage::MemorySink;
    use crate::types::{EntityKind, SymbolKind};

    fn small_index() -> ScipIndex {
        let json = r#"{
            "documents": [{
                "relative_path": "./lib/foo.dart",
                "language": "dart",
                "symbols": [
                    {"symbol": "pkg/Foo#bar().", "kind": "Method"},
                    {"symbol": "pkg/Foo#", "kind": "Class"},
                    {"symbol": "pkg/main().", "kind": "Function"}
                ],
                "occurrences": [
                    {"symbol": "pkg/main().", "symbol_roles": 8, "target": "pkg/Foo#bar().", "range": [3, 2, 5]}
                ]
            }]
        }"#;
        ScipIndex::from_json_str(json).unwrap()
    }

    #[test]
    fn test_convert_small_index() {
        let mut sink = MemorySink::new();
        let report = Converter::default().convert(&small_index(), &mut sink).unwrap();

        assert_eq!(report.files_recorded, 1);
        assert_eq!(sink.files()[0].path, "lib/foo.dart");
        assert_eq!(sink.files()[0].language, "dart");
        assert_eq!(report.entities_recorded, 3);

        let calls = sink.edges_of_kind(EdgeKind::Call);
        assert_eq!(calls.len(), 1);
        assert_eq!(report.call_graph.direct_calls, 1);
        assert!(sink.is_committed());
        assert!(sink.is_closed());
        assert!(report.is_clean());
    }

    #[test]
    fn test_external_symbols_toggle() {
        let mut index = small_index();
        index
            .external_symbols
            .push(SymbolInformation::new("dart:core/String#", SymbolKind::Class));

        let mut sink = MemorySink::new();
        Converter::default().convert(&index, &mut sink).unwrap();
        assert_eq!(sink.find_by_name("String").len(), 1);

        let mut settings = Settings::default();
        settings.conversion.include_external_symbols = false;
        let mut sink = MemorySink::new();
        Converter::new(settings).convert(&index, &mut sink).unwrap();
        assert!(sink.find_by_name("String").is_empty());
    }

    #[test]
    fn test_convert_many_keeps_job_order() {
        let mut second = ScipIndex::default();
        second
            .symbols
            .push(SymbolInformation::new("pkg/Other#", SymbolKind::Class));
        second.occurrences.push(Occurrence::new("local 1", SymbolRoles::DEFINITION));

        let results = convert_many(
            &Settings::default(),
            vec![
                (small_index(), MemorySink::new()),
                (second, MemorySink::new()),
            ],
        );

        assert_eq!(results.len(), 2);
        let (first_report, first_sink) = results[0].as_ref().unwrap();
        assert_eq!(first_report.entities_recorded, 3);
        assert_eq!(first_sink.len(), 3);

        let (second_report, second_sink) = results[1].as_ref().unwrap();
        assert_eq!(second_report.local_occurrences, 1);
        assert_eq!(second_sink.find_by_kind(EntityKind::Class).len(), 1);
        // Ids are per run
        assert_eq!(second_sink.entities()[0].id.value(), 1);
    }
}
