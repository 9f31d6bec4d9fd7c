//! Resolution engine that turns a flat SCIP-style symbol index into a typed,
//! scoped entity graph and a classified call graph.

pub mod config;
pub mod error;
pub mod indexing;
pub mod input;
pub mod logging;
pub mod relationship;
pub mod storage;
pub mod symbol;
pub mod types;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{ConvertError, ConvertResult, SymbolError, SymbolResult};
pub use indexing::{ConversionReport, Converter, ResolutionStrategy, convert_many};
pub use input::{Document, Occurrence, ScipIndex, SymbolInformation};
pub use relationship::{CallGraphStats, Edge, EdgeKind, SymbolRoles, SyntaxTag};
pub use storage::{GraphSink, JsonLinesSink, MemorySink, SinkError, SinkResult};
pub use symbol::{Markers, SymbolParser, SymbolPath};
pub use types::{EntityId, EntityKind, FileId, Range, SymbolKind};
