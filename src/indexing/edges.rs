//! Edge phase: locations, typed edges and call-graph statistics

use super::context::{ConversionContext, DefinitionSpan, normalize_path};
use crate::input::{Occurrence, SymbolInformation};
use crate::relationship::{CallCategory, CallSite, EdgeKind, SymbolRoles, SyntaxTag};
use crate::storage::GraphSink;
use crate::types::{EntityId, EntityKind};
use tracing::{debug, warn};

/// One source/target pair to classify
#[derive(Debug, Clone, Copy)]
struct EdgeRequest<'a> {
    source_symbol: &'a str,
    source: EntityId,
    target_symbol: &'a str,
    roles: SymbolRoles,
    tag: SyntaxTag,
    /// Relationship declared the target as the source's definition
    membership: bool,
    file: Option<&'a str>,
}

/// Remember which definitions enclose which ranges, per file, so that
/// target-less references can be attributed to their caller.
pub fn collect_definitions(ctx: &mut ConversionContext, occurrences: &[(Option<&str>, &Occurrence)]) {
    for (file, occurrence) in occurrences {
        if !occurrence.roles().contains(SymbolRoles::DEFINITION) {
            continue;
        }
        let Some(entity) = ctx.resolve_symbol(&occurrence.symbol) else {
            continue;
        };
        let (Some(file), Some(range)) = (
            file.and_then(|f| ctx.files.get(f)),
            occurrence.enclosing_range(),
        ) else {
            continue;
        };
        let callable = ctx
            .entities
            .get(entity)
            .is_some_and(|info| info.kind.is_callable());
        ctx.definitions.entry(file).or_default().push(DefinitionSpan {
            entity,
            range,
            callable,
        });
    }
}

/// Flush edges produced while recording entities
pub fn emit_deferred<S: GraphSink>(ctx: &mut ConversionContext, sink: &mut S) {
    for edge in std::mem::take(&mut ctx.deferred_edges) {
        match sink.record_edge(edge.kind, edge.source, edge.target) {
            Ok(()) => ctx.report.edges_recorded += 1,
            Err(err) => {
                warn!("failed to record {} edge {} -> {}: {err}", edge.kind, edge.source, edge.target);
                ctx.report.add_failed_relationship(
                    &edge.source.to_string(),
                    &edge.target.to_string(),
                    edge.kind.as_str(),
                    err.to_string(),
                );
            }
        }
    }
}

pub fn process_occurrences<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    occurrences: &[(Option<&str>, &Occurrence)],
) {
    for (file, occurrence) in occurrences {
        process_occurrence(ctx, sink, *file, occurrence);
    }
}

fn process_occurrence<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    file: Option<&str>,
    occurrence: &Occurrence,
) {
    let symbol = occurrence.symbol.as_str();
    if symbol.is_empty() {
        return;
    }
    if ctx.parser.is_local(symbol) {
        ctx.report.local_occurrences += 1;
        return;
    }

    let entity = ctx.resolve_symbol(symbol);
    let file_id = file.and_then(|f| ctx.files.get(f));
    let range = occurrence.range();

    if let (Some(entity), Some(file_id), Some(range)) = (entity, file_id, range) {
        match sink.record_location(entity, file_id, range) {
            Ok(()) => ctx.report.locations_recorded += 1,
            Err(err) => {
                warn!("failed to record location of {symbol}: {err}");
                ctx.report.add_failed_relationship(
                    symbol,
                    file.unwrap_or_default(),
                    "Location",
                    err.to_string(),
                );
            }
        }
    }

    let roles = occurrence.roles();
    let tag = SyntaxTag::from_hint(occurrence.syntax.as_deref());
    let has_targets = occurrence.target.is_some() || !occurrence.relationships.is_empty();

    if has_targets {
        let Some(source) = entity else {
            debug!("occurrence of unrecorded symbol {symbol}");
            ctx.report.unresolved_occurrences += 1;
            return;
        };
        if let Some(target) = occurrence.target.as_deref() {
            emit(
                ctx,
                sink,
                EdgeRequest {
                    source_symbol: symbol,
                    source,
                    target_symbol: target,
                    roles,
                    tag,
                    membership: false,
                    file,
                },
            );
        }
        for relationship in &occurrence.relationships {
            emit(
                ctx,
                sink,
                EdgeRequest {
                    source_symbol: symbol,
                    source,
                    target_symbol: &relationship.symbol,
                    roles: relationship.roles(),
                    tag,
                    membership: relationship.is_definition,
                    file,
                },
            );
        }
        return;
    }

    // A plain reference: the referenced symbol is the target and the
    // innermost enclosing definition is the source.
    if !ctx.settings.conversion.infer_enclosing_callers
        || roles.intersects(SymbolRoles::DEFINITION | SymbolRoles::FORWARD_DEFINITION)
    {
        return;
    }
    let (Some(file_id), Some(range)) = (file_id, range) else {
        return;
    };
    let Some(caller) = ctx.enclosing_definition(file_id, &range) else {
        return;
    };
    if entity.is_none() {
        debug!("reference to unrecorded symbol {symbol}");
        ctx.report.unresolved_occurrences += 1;
        return;
    }
    let caller_symbol = ctx
        .entities
        .get(caller)
        .map(|info| info.key.clone())
        .unwrap_or_default();
    // SCIP encodes a plain reference as an empty role set
    let roles = if roles.is_empty() {
        SymbolRoles::REFERENCE
    } else {
        roles
    };
    emit(
        ctx,
        sink,
        EdgeRequest {
            source_symbol: &caller_symbol,
            source: caller,
            target_symbol: symbol,
            roles,
            tag,
            membership: false,
            file,
        },
    );
}

/// Relationships declared on symbols rather than on occurrences
pub fn process_symbol_relationships<'a, S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    symbols: impl IntoIterator<Item = &'a SymbolInformation>,
) {
    for info in symbols {
        if info.relationships.is_empty() {
            continue;
        }
        let Some(source) = ctx.resolve_symbol(&info.symbol) else {
            continue;
        };
        for relationship in &info.relationships {
            // Without a syntax hint, implementing an interface is the only
            // reading that makes an implementation edge
            let target_is_interface = ctx
                .resolve_symbol(&relationship.symbol)
                .and_then(|id| ctx.entities.get(id))
                .is_some_and(|target| target.kind == EntityKind::Interface);
            let tag = if relationship.is_implementation && target_is_interface {
                SyntaxTag::Implements
            } else {
                SyntaxTag::Other
            };
            emit(
                ctx,
                sink,
                EdgeRequest {
                    source_symbol: &info.symbol,
                    source,
                    target_symbol: &relationship.symbol,
                    roles: relationship.roles(),
                    tag,
                    membership: relationship.is_definition,
                    file: None,
                },
            );
        }
    }
}

fn emit<S: GraphSink>(ctx: &mut ConversionContext, sink: &mut S, request: EdgeRequest<'_>) {
    let target_symbol = request.target_symbol;
    if target_symbol.is_empty() || ctx.parser.is_local(target_symbol) {
        return;
    }
    let Some(target) = ctx.resolve_symbol(target_symbol) else {
        debug!("edge target {target_symbol} was never recorded");
        ctx.report.unresolved_targets += 1;
        return;
    };

    let mut kinds = ctx
        .classifier
        .classify(request.roles, target_symbol, request.tag);
    if request.membership && !kinds.contains(&EdgeKind::Membership) {
        kinds.push(EdgeKind::Membership);
    }
    if kinds.is_empty() {
        return;
    }

    let callback = ctx
        .parser
        .parse(target_symbol)
        .is_ok_and(|path| ctx.classifier.is_callback_registration(&path));

    let mut recorded_any = false;
    for kind in kinds {
        if !record_edge(ctx, sink, kind, request.source, target, &request) {
            continue;
        }
        recorded_any = true;
        if kind == EdgeKind::Call {
            record_call(ctx, &request, target, callback);
        }
    }

    // The reverse edge only accompanies a registration the sink accepted
    if callback
        && recorded_any
        && record_edge(ctx, sink, EdgeKind::Usage, target, request.source, &request)
    {
        ctx.report.call_graph.record_callback_registration();
    }
}

fn record_edge<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    kind: EdgeKind,
    source: EntityId,
    target: EntityId,
    request: &EdgeRequest<'_>,
) -> bool {
    match sink.record_edge(kind, source, target) {
        Ok(()) => {
            ctx.report.edges_recorded += 1;
            true
        }
        Err(err) => {
            warn!(
                "failed to record {kind} edge {} -> {}: {err}",
                request.source_symbol, request.target_symbol
            );
            ctx.report.add_failed_relationship(
                request.source_symbol,
                request.target_symbol,
                kind.as_str(),
                err.to_string(),
            );
            false
        }
    }
}

fn record_call(ctx: &mut ConversionContext, request: &EdgeRequest<'_>, callee: EntityId, callback: bool) {
    let callee_info = ctx.entities.get(callee);
    let via_interface = callee_info
        .and_then(|info| info.parent)
        .and_then(|parent| ctx.entities.get(parent))
        .is_some_and(|parent| parent.kind == EntityKind::Interface);
    let category = if callback {
        CallCategory::Callback
    } else if via_interface {
        CallCategory::InterfaceDispatched
    } else {
        CallCategory::Direct
    };

    let callee_name = callee_info.map(|i| i.name.clone()).unwrap_or_default();
    let caller_name = ctx
        .entities
        .get(request.source)
        .map(|i| i.name.clone())
        .unwrap_or_default();
    let file = request.file.map(normalize_path);
    let is_async = ctx.async_symbols.contains(request.target_symbol);

    ctx.report.call_graph.record_call(CallSite {
        file: file.as_deref(),
        caller: request.source,
        caller_name: &caller_name,
        callee,
        callee_name: &callee_name,
        category,
        is_async,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::input::Relationship;
    use crate::storage::MemorySink;
    use crate::types::Range;

    struct Fixture {
        ctx: ConversionContext,
        sink: MemorySink,
    }

    impl Fixture {
        fn new() -> Self {
            let mut ctx = ConversionContext::new(&Settings::default());
            let mut sink = MemorySink::new();
            ctx.files
                .get_or_create(&mut sink, "lib/main.dart", Some("dart"))
                .unwrap();
            Self { ctx, sink }
        }

        fn entity(&mut self, kind: EntityKind, name: &str, parent: Option<EntityId>, key: &str) -> EntityId {
            self.ctx
                .create_entity(&mut self.sink, kind, name, parent, key)
                .unwrap()
        }

        fn process(&mut self, occurrence: Occurrence) {
            let occurrences = vec![(Some("lib/main.dart"), &occurrence)];
            collect_definitions(&mut self.ctx, &occurrences);
            process_occurrences(&mut self.ctx, &mut self.sink, &occurrences);
        }

        fn edges(&self) -> Vec<(EdgeKind, EntityId, EntityId)> {
            self.sink
                .edges()
                .iter()
                .map(|e| (e.kind, e.source, e.target))
                .collect()
        }
    }

    fn with_target(symbol: &str, roles: SymbolRoles, target: &str) -> Occurrence {
        Occurrence {
            target: Some(target.to_string()),
            ..Occurrence::new(symbol, roles)
        }
    }

    #[test]
    fn test_read_of_method_is_a_call() {
        let mut fx = Fixture::new();
        let foo = fx.entity(EntityKind::Class, "Foo", None, "pkg/Foo#");
        let main = fx.entity(EntityKind::Function, "main", None, "pkg/main().");
        let bar = fx.entity(EntityKind::Method, "bar", Some(foo), "pkg/Foo#bar().");

        fx.process(with_target("pkg/main().", SymbolRoles::READ_ACCESS, "pkg/Foo#bar()."));

        assert_eq!(fx.edges(), vec![(EdgeKind::Call, main, bar)]);
        assert_eq!(fx.ctx.report.call_graph.direct_calls, 1);
        assert_eq!(fx.ctx.report.call_graph.calls_per_callee.get(&bar), Some(&1));
    }

    #[test]
    fn test_read_and_call_bits_both_emit() {
        let mut fx = Fixture::new();
        let main = fx.entity(EntityKind::Function, "main", None, "pkg/main().");
        let value = fx.entity(EntityKind::Variable, "value", None, "pkg/value.");

        fx.process(with_target(
            "pkg/main().",
            SymbolRoles::READ_ACCESS | SymbolRoles::CALL,
            "pkg/value.",
        ));

        assert_eq!(
            fx.edges(),
            vec![(EdgeKind::Usage, main, value), (EdgeKind::Call, main, value)]
        );
    }

    #[test]
    fn test_local_and_unresolved_sources_are_no_ops() {
        let mut fx = Fixture::new();
        fx.entity(EntityKind::Function, "main", None, "pkg/main().");

        fx.process(with_target("local 3", SymbolRoles::READ_ACCESS, "pkg/main()."));
        fx.process(with_target("pkg/gone().", SymbolRoles::READ_ACCESS, "pkg/main()."));

        assert!(fx.sink.edges().is_empty());
        assert_eq!(fx.ctx.report.local_occurrences, 1);
        assert_eq!(fx.ctx.report.unresolved_occurrences, 1);
        assert!(fx.ctx.report.is_clean());
    }

    #[test]
    fn test_callback_registration_adds_reverse_usage() {
        let mut fx = Fixture::new();
        let stream = fx.entity(EntityKind::Class, "Stream", None, "dart:async/Stream#");
        let listen = fx.entity(
            EntityKind::Method,
            "listen",
            Some(stream),
            "dart:async/Stream#listen().",
        );
        let init = fx.entity(EntityKind::Function, "init", None, "pkg/init().");

        fx.process(with_target(
            "pkg/init().",
            SymbolRoles::CALL,
            "dart:async/Stream#listen().",
        ));

        assert_eq!(
            fx.edges(),
            vec![(EdgeKind::Call, init, listen), (EdgeKind::Usage, listen, init)]
        );
        let stats = &fx.ctx.report.call_graph;
        assert_eq!(stats.callback_calls, 1);
        assert_eq!(stats.callback_registrations, 1);
    }

    #[test]
    fn test_interface_dispatch_and_async() {
        let mut fx = Fixture::new();
        let repo = fx.entity(EntityKind::Interface, "Repo", None, "pkg/Repo#");
        let load = fx.entity(EntityKind::Method, "load", Some(repo), "pkg/Repo#load().");
        fx.entity(EntityKind::Function, "main", None, "pkg/main().");
        fx.ctx.async_symbols.insert("pkg/Repo#load().".to_string());

        fx.process(with_target("pkg/main().", SymbolRoles::CALL, "pkg/Repo#load()."));

        let stats = &fx.ctx.report.call_graph;
        assert_eq!(stats.interface_calls, 1);
        assert_eq!(stats.async_calls, 1);
        assert_eq!(stats.calls_per_file.get("lib/main.dart"), Some(&1));
        assert_eq!(stats.top_callees(1), vec![(load, 1)]);
    }

    #[test]
    fn test_relationship_roles_and_tags() {
        let mut fx = Fixture::new();
        let base = fx.entity(EntityKind::Interface, "Base", None, "pkg/Base#");
        let impl_ = fx.entity(EntityKind::Class, "Impl", None, "pkg/Impl#");

        let occurrence = Occurrence {
            syntax: Some("implements".to_string()),
            relationships: vec![Relationship {
                symbol: "pkg/Base#".to_string(),
                is_implementation: true,
                ..Default::default()
            }],
            ..Occurrence::new("pkg/Impl#", SymbolRoles::empty())
        };
        fx.process(occurrence);

        assert_eq!(fx.edges(), vec![(EdgeKind::Implementation, impl_, base)]);
    }

    #[test]
    fn test_symbol_level_relationships() {
        let mut fx = Fixture::new();
        let base = fx.entity(EntityKind::Interface, "Base", None, "pkg/Base#");
        let impl_ = fx.entity(EntityKind::Class, "Impl", None, "pkg/Impl#");

        let mut info = SymbolInformation::new("pkg/Impl#", crate::types::SymbolKind::Class);
        info.relationships.push(Relationship {
            symbol: "pkg/Base#".to_string(),
            is_implementation: true,
            ..Default::default()
        });
        process_symbol_relationships(&mut fx.ctx, &mut fx.sink, [&info]);

        assert_eq!(fx.edges(), vec![(EdgeKind::Implementation, impl_, base)]);
    }

    #[test]
    fn test_enclosing_caller_inference_and_locations() {
        let mut fx = Fixture::new();
        let main = fx.entity(EntityKind::Function, "main", None, "pkg/main().");
        let foo = fx.entity(EntityKind::Class, "Foo", None, "pkg/Foo#");
        let bar = fx.entity(EntityKind::Method, "bar", Some(foo), "pkg/Foo#bar().");

        let definition = Occurrence {
            range: Some(Range::new(1, 5, 1, 9).into()),
            enclosing_range: Some(Range::new(1, 0, 5, 1).into()),
            ..Occurrence::new("pkg/main().", SymbolRoles::DEFINITION)
        };
        let reference = Occurrence {
            range: Some(Range::new(2, 8, 2, 11).into()),
            ..Occurrence::new("pkg/Foo#bar().", SymbolRoles::READ_ACCESS)
        };
        let occurrences = vec![
            (Some("lib/main.dart"), &definition),
            (Some("lib/main.dart"), &reference),
        ];
        collect_definitions(&mut fx.ctx, &occurrences);
        process_occurrences(&mut fx.ctx, &mut fx.sink, &occurrences);

        assert_eq!(fx.edges(), vec![(EdgeKind::Call, main, bar)]);
        assert_eq!(fx.ctx.report.locations_recorded, 2);
        assert_eq!(fx.sink.locations_of(bar).len(), 1);
    }

    #[test]
    fn test_sink_rejection_is_reported() {
        let mut fx = Fixture::new();
        let main = fx.entity(EntityKind::Function, "main", None, "pkg/main().");
        fx.ctx.symbols.insert("pkg/ghost().", EntityId(99));

        fx.process(with_target("pkg/main().", SymbolRoles::REFERENCE, "pkg/ghost()."));

        assert!(fx.sink.edges_from(main).is_empty());
        assert_eq!(fx.ctx.report.failed_relationship_count, 1);
        assert_eq!(fx.ctx.report.failed_relationships[0].kind, "Usage");
    }

    #[test]
    fn test_deferred_edges_flush_once() {
        let mut fx = Fixture::new();
        let getter = fx.entity(EntityKind::Method, "value<get>", None, "pkg/Foo#`<get>value`.");
        let field = fx.entity(EntityKind::Field, "value", None, "pkg/Foo#value.");
        fx.ctx
            .deferred_edges
            .push(crate::relationship::Edge::new(EdgeKind::Usage, getter, field));

        emit_deferred(&mut fx.ctx, &mut fx.sink);
        emit_deferred(&mut fx.ctx, &mut fx.sink);

        assert_eq!(fx.edges(), vec![(EdgeKind::Usage, getter, field)]);
    }
}
