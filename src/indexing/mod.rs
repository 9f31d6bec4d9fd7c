//! Conversion of a symbol index into an entity graph and call graph

pub mod classifier;
pub mod context;
pub mod converter;
pub mod edges;
pub mod progress;
pub mod recorder;
pub mod resolver;

pub use classifier::{Classification, Pass, RecordingRule, classify};
pub use context::{ConversionContext, EntityRegistry, FileTable, SymbolTable, normalize_path};
pub use converter::{Converter, convert_many};
pub use progress::{ConversionReport, FailedRelationship, UnregisteredSymbol};
pub use recorder::{PendingSymbol, RecordError};
pub use resolver::{Resolution, ResolutionStrategy, ScopeResolver, resolve_parent};
