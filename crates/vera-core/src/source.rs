use crate::error::{check_non_empty, ModelError};
use crate::ids::SourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vera_integrity::{hash_bytes, is_content_hash};

/// Kind of document a source is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Policy,
    Regulation,
    Guidance,
    Precedent,
    Reference,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// ISO-8601 date the source takes effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SourceMetadata {
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            version: None,
            effective_date: None,
            expiration_date: None,
            jurisdiction: None,
            tags: Vec::new(),
        }
    }
}

/// A document an argument can cite, pinned by the SHA-256 of its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSource")]
pub struct Source {
    id: SourceId,
    title: String,
    description: String,
    content_hash: String,
    retrieved_at: DateTime<Utc>,
    metadata: SourceMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSource {
    id: SourceId,
    title: String,
    #[serde(default)]
    description: String,
    content_hash: String,
    retrieved_at: DateTime<Utc>,
    metadata: SourceMetadata,
}

impl TryFrom<RawSource> for Source {
    type Error = ModelError;

    fn try_from(raw: RawSource) -> Result<Self, Self::Error> {
        Ok(
            Source::new(raw.title, raw.description, raw.content_hash, raw.metadata)?
                .with_id(raw.id)
                .with_retrieved_at(raw.retrieved_at),
        )
    }
}

impl Source {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        content_hash: impl Into<String>,
        metadata: SourceMetadata,
    ) -> Result<Self, ModelError> {
        let title = title.into();
        check_non_empty("title", &title)?;
        let content_hash = content_hash.into();
        if !is_content_hash(&content_hash) {
            return Err(ModelError::InvalidContentHash(content_hash));
        }
        Ok(Self {
            id: SourceId::generate(),
            title,
            description: description.into(),
            content_hash,
            retrieved_at: Utc::now(),
            metadata,
        })
    }

    /// Build a source from the raw document bytes, hashing them.
    pub fn from_content(
        title: impl Into<String>,
        description: impl Into<String>,
        content: &[u8],
        metadata: SourceMetadata,
    ) -> Result<Self, ModelError> {
        Self::new(title, description, hash_bytes(content), metadata)
    }

    pub fn with_id(mut self, id: impl Into<SourceId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_retrieved_at(mut self, retrieved_at: DateTime<Utc>) -> Self {
        self.retrieved_at = retrieved_at;
        self
    }

    pub fn id(&self) -> &SourceId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }

    pub fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}
