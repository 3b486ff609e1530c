use serde::{Deserialize, Serialize};

/// Collection holding one document per house.
pub const PERMISSIONS_COLLECTION: &str = "permissions";

/// Sub-collection of a house holding one document per administrator.
pub const ADMIN_COLLECTION: &str = "admin";

/// House id used while the generated-id path is switched off.
pub const DEFAULT_HOUSE_ID: &str = "default-house-id";

/// Identity of the caller as established by the transport.
///
/// `caller_id` is `None` when the request carried no credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub caller_id: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { caller_id: None }
    }

    pub fn user(caller_id: impl Into<String>) -> Self {
        Self {
            caller_id: Some(caller_id.into()),
        }
    }
}

/// Payload returned to the client on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseCreated {
    pub house_doc_id: String,
    pub admin_user: String,
}

/// How the house document id is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseIdStrategy {
    /// Always write to the same house document.
    Fixed(String),
    /// Let the database assign a fresh id.
    Generated,
}

impl Default for HouseIdStrategy {
    fn default() -> Self {
        HouseIdStrategy::Fixed(DEFAULT_HOUSE_ID.to_string())
    }
}

impl HouseIdStrategy {
    /// Parses `generated` or a literal house id.
    pub fn from_setting(value: &str) -> Self {
        match value.trim() {
            "" => HouseIdStrategy::default(),
            "generated" => HouseIdStrategy::Generated,
            id => HouseIdStrategy::Fixed(id.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_house_created_serializes_camel_case() {
        let created = HouseCreated {
            house_doc_id: "default-house-id".to_string(),
            admin_user: "abc123".to_string(),
        };
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"houseDocId": "default-house-id", "adminUser": "abc123"})
        );
    }

    #[test]
    fn test_house_id_setting() {
        assert_eq!(HouseIdStrategy::from_setting("generated"), HouseIdStrategy::Generated);
        assert_eq!(HouseIdStrategy::from_setting(""), HouseIdStrategy::default());
        assert_eq!(
            HouseIdStrategy::from_setting(" my-house "),
            HouseIdStrategy::Fixed("my-house".to_string())
        );
    }

    #[test]
    fn test_default_strategy_is_fixed_id() {
        assert_eq!(
            HouseIdStrategy::default(),
            HouseIdStrategy::Fixed(DEFAULT_HOUSE_ID.to_string())
        );
    }
}
