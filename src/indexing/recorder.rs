//! Two-pass entity recording
//!
//! Pass 1 records every container, pass 2 every member, so a member can
//! always see its owning type regardless of where it appears in the input.

use super::classifier::{Classification, Pass, RecordingRule, classify};
use super::context::ConversionContext;
use super::resolver::resolve_parent;
use crate::error::SymbolError;
use crate::input::SymbolInformation;
use crate::relationship::{Edge, EdgeKind};
use crate::storage::{GraphSink, SinkError};
use crate::symbol::SymbolPath;
use crate::types::{EntityId, EntityKind};
use thiserror::Error;
use tracing::{debug, warn};

/// Why one symbol could not be recorded
#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// A parsed symbol waiting for its pass
#[derive(Debug, Clone)]
pub struct PendingSymbol {
    pub path: SymbolPath,
    pub classification: Classification,
}

/// Parse and classify symbols, split into the two passes.
///
/// Local and malformed symbols are counted and dropped here. Each pass is
/// stably sorted by descriptor depth so enclosing declarations come first.
pub fn schedule<'a>(
    ctx: &mut ConversionContext,
    symbols: impl IntoIterator<Item = &'a SymbolInformation>,
) -> (Vec<PendingSymbol>, Vec<PendingSymbol>) {
    let mut containers = Vec::new();
    let mut members = Vec::new();

    for info in symbols {
        ctx.report.symbols_seen += 1;
        let path = match ctx.parser.parse(&info.symbol) {
            Ok(path) => path,
            Err(err) => {
                warn!("{err}");
                ctx.report.malformed_symbols += 1;
                ctx.report
                    .add_unregistered(&info.symbol, &format!("{:?}", info.kind), err.to_string());
                continue;
            }
        };
        if path.is_local() {
            ctx.report.skipped_local += 1;
            continue;
        }

        if let Some(signature) = info.signature() {
            let markers = &ctx.settings.call_graph.async_markers;
            if markers.iter().any(|m| !m.is_empty() && signature.contains(m.as_str())) {
                ctx.async_symbols.insert(info.symbol.clone());
            }
        }

        let classification = classify(info.kind, &path);
        let pending = PendingSymbol {
            path,
            classification,
        };
        match classification.pass() {
            Pass::Containers => containers.push(pending),
            Pass::Members => members.push(pending),
        }
    }

    containers.sort_by_key(|p| p.path.depth());
    members.sort_by_key(|p| p.path.depth());
    (containers, members)
}

/// Record one pass, reporting per-symbol failures without stopping
pub fn record_pass<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    pending: &[PendingSymbol],
) {
    for symbol in pending {
        if let Err(err) = record_symbol(ctx, sink, symbol) {
            if matches!(err, RecordError::Symbol(SymbolError::Unnamed { .. })) {
                ctx.report.unnamed_symbols += 1;
            }
            warn!("failed to record {}: {err}", symbol.path.raw());
            ctx.report.add_unregistered(
                symbol.path.raw(),
                symbol.classification.kind.as_str(),
                err.to_string(),
            );
        }
    }
}

/// Record a single symbol, returning the existing id if it is already known
pub fn record_symbol<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    symbol: &PendingSymbol,
) -> Result<EntityId, RecordError> {
    let path = &symbol.path;
    if let Some(id) = ctx.symbols.get(path.raw()) {
        return Ok(id);
    }

    let kind = symbol.classification.kind;
    // The same member spelled through another variant of its owner
    let variants = match symbol.classification.rule {
        RecordingRule::Container => Vec::new(),
        _ => ctx.member_variants(path),
    };
    if let Some(id) = variants.iter().find_map(|v| ctx.symbols.get(v)) {
        ctx.symbols.insert(path.raw(), id);
        return Ok(id);
    }

    let id = match symbol.classification.rule {
        RecordingRule::Container => record_container(ctx, sink, path, kind)?,
        RecordingRule::BoundCallable => {
            let name = ctx.normalizer.normalize(path, kind)?;
            let parent = bound_parent(ctx, sink, path)?;
            ctx.create_entity(sink, kind, &name, Some(parent), path.raw())?
        }
        RecordingRule::Accessor => record_accessor(ctx, sink, path)?,
        RecordingRule::Member => {
            let name = ctx.normalizer.normalize(path, kind)?;
            let parent = optional_parent(ctx, sink, path)?;
            ctx.create_entity(sink, kind, &name, parent, path.raw())?
        }
        RecordingRule::TypeParameter => {
            let name = ctx.normalizer.normalize(path, kind)?;
            match optional_parent(ctx, sink, path)? {
                Some(parent) => ctx.create_entity(sink, kind, &name, Some(parent), path.raw())?,
                // Placeholder so type-usage edges still have a target
                None => ctx.create_entity(sink, EntityKind::TypeAlias, &name, None, path.raw())?,
            }
        }
    };
    for variant in &variants {
        ctx.symbols.insert_alias(variant, id);
    }
    Ok(id)
}

fn record_container<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    path: &SymbolPath,
    kind: EntityKind,
) -> Result<EntityId, RecordError> {
    // A variant of this container may already be known under an alias
    let prefixes = ctx.decl_prefixes();
    let aliases = path.alias_keys(&prefixes);
    if let Some(id) = aliases.iter().find_map(|alias| ctx.symbols.get(alias)) {
        if ctx.entities.get(id).is_some_and(|info| info.kind == kind) {
            ctx.symbols.insert(path.raw(), id);
            return Ok(id);
        }
    }

    let name = ctx.normalizer.normalize(path, kind)?;
    // Top-level containers legitimately have no parent
    let parent = resolve_parent(ctx, sink, path)?.map(|resolution| {
        debug!(
            "{} -> {} via {}",
            path.raw(),
            resolution.parent,
            resolution.strategy
        );
        resolution.parent
    });
    let id = ctx.create_entity(sink, kind, &name, parent, path.raw())?;
    for alias in &aliases {
        ctx.symbols.insert_alias(alias, id);
    }
    Ok(id)
}

fn record_accessor<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    path: &SymbolPath,
) -> Result<EntityId, RecordError> {
    let name = ctx.normalizer.normalize(path, EntityKind::Method)?;
    let base_name = ctx
        .normalizer
        .accessor_base_name(path)
        .ok_or_else(|| SymbolError::Unnamed {
            symbol: path.raw().to_string(),
            kind: EntityKind::Field.to_string(),
        })?;
    let parent = bound_parent(ctx, sink, path)?;

    let base_key = path
        .accessor_base_key()
        .unwrap_or_else(|| path.raw().to_string());
    let field = match ctx.resolve_symbol(&base_key) {
        Some(id) => id,
        None => {
            let id = ctx.create_entity(sink, EntityKind::Field, &base_name, Some(parent), &base_key)?;
            if let Ok(base_path) = ctx.parser.parse(&base_key) {
                ctx.register_member_variants(&base_path, id);
            }
            id
        }
    };

    let accessor = ctx.create_entity(sink, EntityKind::Method, &name, Some(parent), path.raw())?;
    ctx.deferred_edges
        .push(Edge::new(EdgeKind::Usage, accessor, field));
    Ok(accessor)
}

/// Parent for kinds that must have one: resolved, else a synthesized owner
fn bound_parent<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    path: &SymbolPath,
) -> Result<EntityId, RecordError> {
    if let Some(resolution) = resolve_parent(ctx, sink, path)? {
        debug!(
            "{} -> {} via {}",
            path.raw(),
            resolution.parent,
            resolution.strategy
        );
        return Ok(resolution.parent);
    }

    ctx.report.missing_parent += 1;
    synthesize_owner(ctx, sink, path)
}

/// Parent for members that may stand alone; an unresolved one is still
/// counted as missing
fn optional_parent<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    path: &SymbolPath,
) -> Result<Option<EntityId>, RecordError> {
    if let Some(resolution) = resolve_parent(ctx, sink, path)? {
        debug!(
            "{} -> {} via {}",
            path.raw(),
            resolution.parent,
            resolution.strategy
        );
        return Ok(Some(resolution.parent));
    }

    debug!("no parent found for {}", path.raw());
    ctx.report.missing_parent += 1;
    Ok(None)
}

/// Create the owning type a member refers to, or the shared fallback scope
/// when the member names no owner at all.
fn synthesize_owner<S: GraphSink>(
    ctx: &mut ConversionContext,
    sink: &mut S,
    path: &SymbolPath,
) -> Result<EntityId, RecordError> {
    let (Some(owner_key), Some(owner_name)) = (path.owner_key(), path.owner()) else {
        return Ok(ctx.fallback_scope(sink)?);
    };
    if owner_name.is_empty() {
        return Ok(ctx.fallback_scope(sink)?);
    }

    let owner_path = ctx.parser.parse(owner_key)?;
    let parent = resolve_parent(ctx, sink, &owner_path)?.map(|r| r.parent);
    let id = ctx.create_entity(sink, EntityKind::Class, owner_name, parent, owner_key)?;
    ctx.report.synthesized_scopes += 1;

    let prefixes = ctx.decl_prefixes();
    for alias in owner_path.alias_keys(&prefixes) {
        ctx.symbols.insert_alias(&alias, id);
    }
    debug!("synthesized owner '{owner_name}' as {id} for {}", path.raw());
    Ok(id)
}
