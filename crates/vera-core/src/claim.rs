use crate::error::{check_non_empty, ModelError};
use crate::ids::ClaimId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The statement under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawClaim")]
pub struct Claim {
    id: ClaimId,
    statement: String,
    context: String,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClaim {
    id: ClaimId,
    statement: String,
    #[serde(default)]
    context: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RawClaim> for Claim {
    type Error = ModelError;

    fn try_from(raw: RawClaim) -> Result<Self, Self::Error> {
        Ok(Claim::new(raw.statement, raw.context)?
            .with_id(raw.id)
            .with_created_at(raw.created_at))
    }
}

impl Claim {
    pub fn new(
        statement: impl Into<String>,
        context: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let statement = statement.into();
        check_non_empty("statement", &statement)?;
        Ok(Self {
            id: ClaimId::generate(),
            statement,
            context: context.into(),
            created_at: Utc::now(),
        })
    }

    pub fn with_id(mut self, id: impl Into<ClaimId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &ClaimId {
        &self.id
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_requires_statement() {
        assert!(Claim::new("", "ctx").is_err());
        let claim = Claim::new("Approve the request.", "").unwrap().with_id("claim-1");
        assert_eq!(claim.id().as_str(), "claim-1");
    }

    #[test]
    fn test_claim_deserialize_validates() {
        let bad = r#"{"id":"claim-1","statement":" ","context":"","createdAt":"2024-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Claim>(bad).is_err());

        let good = r#"{"id":"claim-1","statement":"s","context":"c","createdAt":"2024-01-01T00:00:00Z"}"#;
        let claim: Claim = serde_json::from_str(good).unwrap();
        assert_eq!(claim.statement(), "s");
    }
}
