//! Decoded symbol index
//!
//! Mirrors the JSON export of a SCIP index with proto field names preserved
//! (`relative_path`, `symbol_roles`, `enclosing_range`). Symbols and
//! occurrences may arrive grouped per document or flattened at the top
//! level; [`ScipIndex::normalize`] moves everything to the flat form.

use crate::error::{ConvertError, ConvertResult};
use crate::relationship::SymbolRoles;
use crate::types::{Range, SymbolKind};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScipIndex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub symbols: Vec<SymbolInformation>,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
    #[serde(default)]
    pub external_symbols: Vec<SymbolInformation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub relative_path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub symbols: Vec<SymbolInformation>,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolInformation {
    pub symbol: String,
    #[serde(default, deserialize_with = "kind_from_name_or_number")]
    pub kind: SymbolKind,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub signature_documentation: Option<SignatureDocumentation>,
    #[serde(default)]
    pub documentation: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub enclosing_symbol: Option<String>,
}

impl SymbolInformation {
    pub fn new(symbol: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            ..Default::default()
        }
    }

    /// Signature text, falling back to the first documentation block
    pub fn signature(&self) -> Option<&str> {
        self.signature_documentation
            .as_ref()
            .and_then(|s| s.text.as_deref())
            .or_else(|| self.documentation.first().map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureDocumentation {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub symbol: String,
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub is_implementation: bool,
    #[serde(default)]
    pub is_type_definition: bool,
    #[serde(default)]
    pub is_definition: bool,
}

impl Relationship {
    /// Role bits this relationship contributes for its target
    pub fn roles(&self) -> SymbolRoles {
        let mut roles = SymbolRoles::empty();
        if self.is_reference {
            roles |= SymbolRoles::REFERENCE;
        }
        if self.is_implementation {
            roles |= SymbolRoles::IMPLEMENTATION;
        }
        if self.is_type_definition {
            roles |= SymbolRoles::TYPE_DEFINITION;
        }
        roles
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub symbol_roles: u32,
    /// Single role name used by older exports (`"reference"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub range: Option<RawRange>,
    #[serde(default)]
    pub enclosing_range: Option<RawRange>,
    /// Explicit target of a reference
    #[serde(default)]
    pub target: Option<String>,
    /// Syntactic hint such as `extends` or `implements`
    #[serde(default, alias = "syntax_tag")]
    pub syntax: Option<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Owning file for occurrences given outside a document
    #[serde(default)]
    pub file: Option<String>,
}

impl Occurrence {
    pub fn new(symbol: impl Into<String>, roles: SymbolRoles) -> Self {
        Self {
            symbol: symbol.into(),
            symbol_roles: roles.bits(),
            ..Default::default()
        }
    }

    pub fn roles(&self) -> SymbolRoles {
        let mut roles = SymbolRoles::from_raw(self.symbol_roles);
        if let Some(role) = self.role.as_deref() {
            roles |= role_from_name(role);
        }
        roles
    }

    pub fn range(&self) -> Option<Range> {
        self.range.as_ref().and_then(RawRange::to_range)
    }

    pub fn enclosing_range(&self) -> Option<Range> {
        self.enclosing_range.as_ref().and_then(RawRange::to_range)
    }
}

/// Range as either SCIP's packed integers or a start/end position pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRange {
    Packed(Vec<i32>),
    Span { start: Position, end: Position },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl RawRange {
    pub fn to_range(&self) -> Option<Range> {
        match self {
            RawRange::Packed(values) => Range::from_scip(values),
            RawRange::Span { start, end } => Some(Range::new(
                start.line,
                start.character,
                end.line,
                end.character,
            )),
        }
    }
}

impl From<Range> for RawRange {
    fn from(range: Range) -> Self {
        let as_i32 = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
        RawRange::Packed(vec![
            as_i32(range.start_line),
            as_i32(range.start_column),
            as_i32(range.end_line),
            as_i32(range.end_column),
        ])
    }
}

fn role_from_name(name: &str) -> SymbolRoles {
    match name.trim().to_ascii_lowercase().as_str() {
        "definition" => SymbolRoles::DEFINITION,
        "import" => SymbolRoles::IMPORT,
        "write" | "write_access" => SymbolRoles::WRITE_ACCESS,
        "read" | "read_access" => SymbolRoles::READ_ACCESS,
        "reference" => SymbolRoles::REFERENCE,
        "call" => SymbolRoles::CALL,
        "implementation" => SymbolRoles::IMPLEMENTATION,
        "override" => SymbolRoles::OVERRIDE,
        "type_definition" => SymbolRoles::TYPE_DEFINITION,
        _ => SymbolRoles::empty(),
    }
}

/// Kinds arrive as enum names; numeric enum values carry no name and are
/// left for inference from the symbol string.
fn kind_from_name_or_number<'de, D>(deserializer: D) -> Result<SymbolKind, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum KindRepr {
        Name(String),
        Number(i64),
    }

    Ok(match Option::<KindRepr>::deserialize(deserializer)? {
        Some(KindRepr::Name(name)) => SymbolKind::from_str_with_default(&name),
        Some(KindRepr::Number(_)) | None => SymbolKind::Unspecified,
    })
}

impl ScipIndex {
    pub fn from_json_str(json: &str) -> ConvertResult<Self> {
        let mut index: ScipIndex = serde_json::from_str(json)?;
        index.normalize();
        Ok(index)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConvertResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConvertError::InputRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Move per-document symbols and occurrences to the top level.
    ///
    /// Occurrences taken from a document get that document's path as their
    /// owning file. Calling this again is a no-op.
    pub fn normalize(&mut self) {
        for document in &mut self.documents {
            self.symbols.append(&mut document.symbols);
            for mut occurrence in document.occurrences.drain(..) {
                if occurrence.file.is_none() {
                    occurrence.file = Some(document.relative_path.clone());
                }
                self.occurrences.push(occurrence);
            }
        }
    }

    /// Every symbol, flattened or still grouped per document.
    ///
    /// External symbols are appended when requested, minus parameters of
    /// external callables which never receive edges of their own.
    pub fn all_symbols(&self, include_external: bool) -> Vec<&SymbolInformation> {
        let mut symbols: Vec<&SymbolInformation> = self
            .symbols
            .iter()
            .chain(self.documents.iter().flat_map(|d| d.symbols.iter()))
            .collect();
        if include_external {
            symbols.extend(
                self.external_symbols
                    .iter()
                    .filter(|s| s.kind != SymbolKind::Parameter),
            );
        }
        symbols
    }

    /// Every occurrence paired with its owning file path
    pub fn all_occurrences(&self) -> Vec<(Option<&str>, &Occurrence)> {
        let mut occurrences: Vec<(Option<&str>, &Occurrence)> = self
            .occurrences
            .iter()
            .map(|o| (o.file.as_deref(), o))
            .collect();
        for document in &self.documents {
            occurrences.extend(document.occurrences.iter().map(|o| {
                (
                    Some(o.file.as_deref().unwrap_or(&document.relative_path)),
                    o,
                )
            }));
        }
        occurrences
    }

    /// Files to record: documents first, then files only named by
    /// occurrences
    pub fn file_entries(&self) -> Vec<(&str, Option<&str>)> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut files = Vec::new();
        for document in &self.documents {
            if seen.insert(document.relative_path.as_str()) {
                files.push((document.relative_path.as_str(), document.language.as_deref()));
            }
        }
        for (file, _) in self.all_occurrences() {
            if let Some(file) = file.filter(|f| seen.insert(*f)) {
                files.push((file, None));
            }
        }
        files
    }

    pub fn document(&self, relative_path: &str) -> Option<&Document> {
        self.documents
            .iter()
            .find(|d| d.relative_path == relative_path)
    }
}
