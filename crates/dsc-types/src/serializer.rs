use crate::document::{Document, DocumentKind};
use crate::error::{TypesError, TypesResult};

/// Turns documents into payload strings and back.
pub trait Serializer: Send + Sync {
    fn serialize(&self, document: &Document) -> TypesResult<String>;

    /// Decode `raw`, failing with `IllegalArgument` unless it holds a
    /// document of the expected `kind`.
    fn deserialize(&self, raw: &str, kind: DocumentKind) -> TypesResult<Document>;
}

/// JSON rendering of documents, tagged by `@type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, document: &Document) -> TypesResult<String> {
        serde_json::to_string(document).map_err(|e| {
            TypesError::IllegalArgument(format!("failed to serialize {}: {e}", document.kind()))
        })
    }

    fn deserialize(&self, raw: &str, kind: DocumentKind) -> TypesResult<Document> {
        let document: Document = serde_json::from_str(raw)
            .map_err(|e| TypesError::IllegalArgument(format!("expected {kind}: {e}")))?;
        if document.kind() != kind {
            return Err(TypesError::IllegalArgument(format!(
                "expected {kind}, got {}",
                document.kind()
            )));
        }
        Ok(document)
    }
}
