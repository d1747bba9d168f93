use serde::{Deserialize, Serialize};

use super::ids::PostId;

/// Full post record as returned by the remote service
///
/// Only `id` and `retweeted` are interpreted; every other field is kept
/// verbatim so archives preserve whatever the service sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,

    /// Whether the authenticated account has already retweeted this post
    #[serde(default)]
    pub retweeted: bool,

    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl PostRecord {
    pub fn new(id: PostId) -> Self {
        Self {
            id,
            retweeted: false,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_retweeted(mut self, retweeted: bool) -> Self {
        self.retweeted = retweeted;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Look up a preserved field
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "id": 1050118621198921728u64,
            "id_str": "1050118621198921728",
            "retweeted": true,
            "text": "hello",
            "user": {"screen_name": "someone"}
        });

        let record: PostRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.id, PostId(1050118621198921728));
        assert!(record.retweeted);
        assert_eq!(record.get("text"), Some(&json!("hello")));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_retweeted_defaults_to_false() {
        let record: PostRecord = serde_json::from_value(json!({"id": 5})).unwrap();
        assert!(!record.retweeted);
    }
}
