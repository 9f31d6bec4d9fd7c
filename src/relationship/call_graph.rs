//! Aggregate call-graph statistics, updated on every emitted Call edge

use crate::types::EntityId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallCategory {
    Direct,
    /// Callee is declared on an interface
    InterfaceDispatched,
    /// Callee registers a callback for later invocation
    Callback,
}

/// One emitted Call edge with the facts needed to categorise it
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    pub file: Option<&'a str>,
    pub caller: EntityId,
    pub caller_name: &'a str,
    pub callee: EntityId,
    pub callee_name: &'a str,
    pub category: CallCategory,
    pub is_async: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CallGraphStats {
    pub total_calls: usize,
    pub direct_calls: usize,
    pub interface_calls: usize,
    pub callback_calls: usize,
    pub async_calls: usize,
    /// Reverse Usage edges emitted for callback registrations
    pub callback_registrations: usize,
    pub calls_per_file: BTreeMap<String, usize>,
    pub calls_per_callee: BTreeMap<EntityId, usize>,
    pub calls_per_caller: BTreeMap<EntityId, usize>,
    #[serde(skip)]
    names: BTreeMap<EntityId, String>,
}

impl CallGraphStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&mut self, site: CallSite<'_>) {
        self.total_calls += 1;
        match site.category {
            CallCategory::Direct => self.direct_calls += 1,
            CallCategory::InterfaceDispatched => self.interface_calls += 1,
            CallCategory::Callback => self.callback_calls += 1,
        }
        if site.is_async {
            self.async_calls += 1;
        }
        if let Some(file) = site.file {
            *self.calls_per_file.entry(file.to_string()).or_default() += 1;
        }
        *self.calls_per_callee.entry(site.callee).or_default() += 1;
        *self.calls_per_caller.entry(site.caller).or_default() += 1;

        self.names
            .entry(site.caller)
            .or_insert_with(|| site.caller_name.to_string());
        self.names
            .entry(site.callee)
            .or_insert_with(|| site.callee_name.to_string());
    }

    pub fn record_callback_registration(&mut self) {
        self.callback_registrations += 1;
    }

    /// Most-called entities, highest count first, ties by id
    pub fn top_callees(&self, n: usize) -> Vec<(EntityId, usize)> {
        top_n(&self.calls_per_callee, n)
    }

    /// Entities making the most outgoing calls
    pub fn top_callers(&self, n: usize) -> Vec<(EntityId, usize)> {
        top_n(&self.calls_per_caller, n)
    }

    pub fn name_of(&self, id: EntityId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }
}

fn top_n(counts: &BTreeMap<EntityId, usize>, n: usize) -> Vec<(EntityId, usize)> {
    let mut entries: Vec<(EntityId, usize)> = counts.iter().map(|(id, c)| (*id, *c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

impl fmt::Display for CallGraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Call graph:")?;
        writeln!(f, "  Total calls: {}", self.total_calls)?;
        writeln!(f, "  Direct: {}", self.direct_calls)?;
        writeln!(f, "  Interface-dispatched: {}", self.interface_calls)?;
        writeln!(f, "  Callback: {}", self.callback_calls)?;
        writeln!(f, "  Async: {}", self.async_calls)?;
        write!(f, "  Callback registrations: {}", self.callback_registrations)
    }
}
