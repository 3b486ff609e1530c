use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Document body: field name to JSON value.
pub type Fields = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Auth error: {0}")]
    Auth(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Path to a collection or a document, as alternating segments.
///
/// An odd number of segments addresses a collection, an even number a
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Top-level collection.
    pub fn collection(id: &str) -> Result<Self, StoreError> {
        validate_segment(id)?;
        Ok(Self {
            segments: vec![id.to_string()],
        })
    }

    /// Document `id` inside this collection.
    pub fn document(&self, id: &str) -> Result<Self, StoreError> {
        if !self.is_collection() {
            return Err(StoreError::InvalidPath(format!(
                "{} is not a collection",
                self
            )));
        }
        self.push(id)
    }

    /// Sub-collection `id` under this document.
    pub fn subcollection(&self, id: &str) -> Result<Self, StoreError> {
        if !self.is_document() {
            return Err(StoreError::InvalidPath(format!("{} is not a document", self)));
        }
        self.push(id)
    }

    /// Parses a slash-separated path such as `permissions/h1/admin/u1`.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let segments: Vec<String> = path
            .trim_matches('/')
            .split('/')
            .map(str::to_string)
            .collect();
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    pub fn is_collection(&self) -> bool {
        self.segments.len() % 2 == 1
    }

    pub fn is_document(&self) -> bool {
        !self.segments.is_empty() && self.segments.len() % 2 == 0
    }

    /// Last segment: the document id or the collection id.
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn push(&self, id: &str) -> Result<Self, StoreError> {
        validate_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(Self { segments })
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Checks that `id` can be used as a single path segment.
pub fn validate_segment(id: &str) -> Result<(), StoreError> {
    if id.is_empty() {
        return Err(StoreError::InvalidPath("empty path segment".to_string()));
    }
    if id.contains('/') {
        return Err(StoreError::InvalidPath(format!(
            "segment must not contain '/': {}",
            id
        )));
    }
    if id == "." || id == ".." {
        return Err(StoreError::InvalidPath(format!("reserved segment: {}", id)));
    }
    Ok(())
}

/// Document database operations the handlers rely on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document with a database-assigned id and returns its path.
    async fn add(&self, collection: &DocumentPath, fields: Fields)
        -> Result<DocumentPath, StoreError>;

    /// Creates or fully replaces a document.
    async fn set(&self, document: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Reads a document, `None` if it does not exist.
    async fn get(&self, document: &DocumentPath) -> Result<Option<Fields>, StoreError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_build_admin_path() {
        let path = DocumentPath::collection("permissions")
            .unwrap()
            .document("default-house-id")
            .unwrap()
            .subcollection("admin")
            .unwrap()
            .document("abc123")
            .unwrap();

        assert_eq!(path.to_string(), "permissions/default-house-id/admin/abc123");
        assert!(path.is_document());
        assert_eq!(path.id(), "abc123");
        assert_eq!(
            path.parent().unwrap().to_string(),
            "permissions/default-house-id/admin"
        );
    }

    #[test]
    fn test_document_requires_collection() {
        let doc = DocumentPath::parse("permissions/h1").unwrap();
        assert!(matches!(doc.document("x"), Err(StoreError::InvalidPath(_))));

        let col = DocumentPath::collection("permissions").unwrap();
        assert!(matches!(col.subcollection("x"), Err(StoreError::InvalidPath(_))));
    }

    #[test]
    fn test_rejects_bad_segments() {
        assert!(DocumentPath::collection("").is_err());
        let col = DocumentPath::collection("permissions").unwrap();
        assert!(col.document("a/b").is_err());
        assert!(col.document("..").is_err());
        assert!(DocumentPath::parse("permissions//admin").is_err());
    }

    #[test]
    fn test_parse_trims_slashes() {
        let path = DocumentPath::parse("/permissions/h1/").unwrap();
        assert_eq!(path.segments(), &["permissions".to_string(), "h1".to_string()]);
        assert!(path.is_document());
    }

    #[test]
    fn test_top_level_collection_has_no_parent() {
        let col = DocumentPath::collection("permissions").unwrap();
        assert!(col.is_collection());
        assert!(col.parent().is_none());
    }
}
