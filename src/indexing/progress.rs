//! Diagnostics collected during a conversion run

use crate::relationship::CallGraphStats;
use crate::types::EntityId;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// A symbol that could not be recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnregisteredSymbol {
    pub symbol: String,
    pub kind: String,
    pub reason: String,
}

/// An edge or location the sink did not accept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRelationship {
    pub source: String,
    pub target: String,
    pub kind: String,
    pub reason: String,
}

/// Summary of one conversion run
#[derive(Debug, Default, Serialize)]
pub struct ConversionReport {
    pub files_recorded: usize,
    pub symbols_seen: usize,
    pub entities_recorded: usize,
    pub edges_recorded: usize,
    pub locations_recorded: usize,

    /// Local-scope symbol descriptors that were not recorded
    pub skipped_local: usize,
    /// Occurrences of local-scope symbols
    pub local_occurrences: usize,
    pub malformed_symbols: usize,
    pub unnamed_symbols: usize,
    /// Members whose parent could not be resolved by any strategy
    pub missing_parent: usize,
    /// Owners and fallback scopes created so members are not dropped
    pub synthesized_scopes: usize,
    /// Occurrences whose symbol was never recorded
    pub unresolved_occurrences: usize,
    /// Edge targets that were never recorded
    pub unresolved_targets: usize,

    /// Unregistered symbols (limited to the first N)
    pub unregistered: Vec<UnregisteredSymbol>,
    pub unregistered_count: usize,

    /// Failed relationships (limited to the first N)
    pub failed_relationships: Vec<FailedRelationship>,
    pub failed_relationship_count: usize,

    pub call_graph: CallGraphStats,
    /// Most-called entities as (id, calls), filled in by [`Self::finish`]
    pub top_callees: Vec<(EntityId, usize)>,
    /// Entities making the most calls, filled in by [`Self::finish`]
    pub top_callers: Vec<(EntityId, usize)>,

    /// Time elapsed during conversion
    #[serde(skip)]
    pub elapsed: Duration,

    #[serde(skip)]
    max_reported: usize,

    #[serde(skip)]
    start_time: Option<Instant>,
}

impl ConversionReport {
    /// Create a report and start timing
    pub fn new(max_reported: usize) -> Self {
        Self {
            max_reported,
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Stop timing and record elapsed time
    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
            self.start_time = None;
        }
    }

    /// Stop timing and rank the call graph's busiest entities
    pub fn finish(&mut self, top_n: usize) {
        self.stop_timing();
        self.top_callees = self.call_graph.top_callees(top_n);
        self.top_callers = self.call_graph.top_callers(top_n);
    }

    pub fn add_unregistered(&mut self, symbol: &str, kind: &str, reason: String) {
        if self.unregistered.len() < self.max_reported {
            self.unregistered.push(UnregisteredSymbol {
                symbol: symbol.to_string(),
                kind: kind.to_string(),
                reason,
            });
        }
        self.unregistered_count += 1;
    }

    pub fn add_failed_relationship(
        &mut self,
        source: &str,
        target: &str,
        kind: &str,
        reason: String,
    ) {
        if self.failed_relationships.len() < self.max_reported {
            self.failed_relationships.push(FailedRelationship {
                source: source.to_string(),
                target: target.to_string(),
                kind: kind.to_string(),
                reason,
            });
        }
        self.failed_relationship_count += 1;
    }

    /// True when every symbol and edge made it into the sink
    pub fn is_clean(&self) -> bool {
        self.unregistered_count == 0 && self.failed_relationship_count == 0
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Conversion Complete:")?;
        writeln!(f, "  Files recorded: {}", self.files_recorded)?;
        writeln!(f, "  Symbols seen: {}", self.symbols_seen)?;
        writeln!(f, "  Entities recorded: {}", self.entities_recorded)?;
        writeln!(f, "  Edges recorded: {}", self.edges_recorded)?;
        writeln!(f, "  Locations recorded: {}", self.locations_recorded)?;
        writeln!(f, "  Skipped local symbols: {}", self.skipped_local)?;
        writeln!(f, "  Missing parents: {}", self.missing_parent)?;
        writeln!(f, "  Synthesized scopes: {}", self.synthesized_scopes)?;
        writeln!(f, "  Time elapsed: {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "{}", self.call_graph)?;

        if !self.top_callees.is_empty() {
            writeln!(f, "\nMost called:")?;
            for (id, count) in &self.top_callees {
                let name = self.call_graph.name_of(*id).unwrap_or("?");
                writeln!(f, "  {name} ({id}): {count}")?;
            }
        }
        if !self.top_callers.is_empty() {
            writeln!(f, "\nMost calling:")?;
            for (id, count) in &self.top_callers {
                let name = self.call_graph.name_of(*id).unwrap_or("?");
                writeln!(f, "  {name} ({id}): {count}")?;
            }
        }

        if self.unregistered_count > 0 {
            writeln!(
                f,
                "\nUnregistered symbols: {} (showing first {}):",
                self.unregistered_count,
                self.unregistered.len().min(5)
            )?;
            for entry in self.unregistered.iter().take(5) {
                writeln!(f, "  [{}] {}: {}", entry.kind, entry.symbol, entry.reason)?;
            }
        }

        if self.failed_relationship_count > 0 {
            writeln!(
                f,
                "\nFailed relationships: {} (showing first {}):",
                self.failed_relationship_count,
                self.failed_relationships.len().min(5)
            )?;
            for entry in self.failed_relationships.iter().take(5) {
                writeln!(
                    f,
                    "  {} {} -> {}: {}",
                    entry.kind, entry.source, entry.target, entry.reason
                )?;
            }
        }

        Ok(())
    }
}
