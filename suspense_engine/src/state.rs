use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{EngineError, EngineResult};

/// One gizmo's flat field map within the state tree.
pub type Bucket = Map<String, Value>;

/// Builds a bucket from a JSON object literal; any other value yields an
/// empty bucket.
pub fn bucket(value: Value) -> Bucket {
    match value {
        Value::Object(map) => map,
        _ => Bucket::new(),
    }
}

/// The serializable root of all mutable game data: a tree of named buckets,
/// one per scene, thing or item factory, plus the reserved `inventories`,
/// `item_factories` and `game` buckets owned by the orchestrator.
///
/// Every bucket must be initialised by its owning gizmo before first use;
/// reading or writing an uninitialised bucket is a content bug.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GameState {
    buckets: BTreeMap<String, Bucket>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-copies `defaults` under `key` unless the bucket already exists.
    /// Idempotent, so restored saves keep their data when scene setup
    /// re-runs against them.
    pub fn initialize(&mut self, key: &str, defaults: &Bucket) {
        self.buckets
            .entry(key.to_string())
            .or_insert_with(|| defaults.clone());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.buckets.contains_key(key)
    }

    pub fn get(&self, key: &str, field: &str) -> EngineResult<Option<&Value>> {
        let bucket = self
            .buckets
            .get(key)
            .ok_or_else(|| EngineError::UninitializedBucket(key.to_string()))?;
        Ok(bucket.get(field))
    }

    pub fn set(&mut self, key: &str, field: &str, value: Value) -> EngineResult<()> {
        let bucket = self
            .buckets
            .get_mut(key)
            .ok_or_else(|| EngineError::UninitializedBucket(key.to_string()))?;
        bucket.insert(field.to_string(), value);
        Ok(())
    }

    /// Boolean field accessor; an absent field reads as `false`.
    pub fn flag(&self, key: &str, field: &str) -> EngineResult<bool> {
        Ok(matches!(self.get(key, field)?, Some(Value::Bool(true))))
    }

    /// String field accessor; an absent or non-string field reads as `None`.
    pub fn text(&self, key: &str, field: &str) -> EngineResult<Option<String>> {
        Ok(self
            .get(key, field)?
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub fn bucket(&self, key: &str) -> EngineResult<&Bucket> {
        self.buckets
            .get(key)
            .ok_or_else(|| EngineError::UninitializedBucket(key.to_string()))
    }

    /// Fully independent deep copy of the whole tree, for saving.
    pub fn export(&self) -> Value {
        let mut root = Map::new();
        for (key, bucket) in &self.buckets {
            root.insert(key.clone(), Value::Object(bucket.clone()));
        }
        Value::Object(root)
    }

    /// Reconstructs the tree from an exported document.
    pub fn from_document(document: &Value) -> EngineResult<Self> {
        let Value::Object(root) = document else {
            return Err(EngineError::MalformedDocument(
                "top level is not an object".to_string(),
            ));
        };
        let mut buckets = BTreeMap::new();
        for (key, value) in root {
            let Value::Object(bucket) = value else {
                return Err(EngineError::MalformedDocument(format!(
                    "bucket `{key}` is not an object"
                )));
            };
            buckets.insert(key.clone(), bucket.clone());
        }
        Ok(GameState { buckets })
    }
}

/// Read-only view of one gizmo's bucket, handed to interactivity and
/// interact-selection hooks.
pub struct StateView<'a> {
    state: &'a GameState,
    key: &'a str,
}

impl<'a> StateView<'a> {
    pub fn new(state: &'a GameState, key: &'a str) -> Self {
        Self { state, key }
    }

    pub fn key(&self) -> &str {
        self.key
    }

    pub fn get(&self, field: &str) -> EngineResult<Option<&Value>> {
        self.state.get(self.key, field)
    }

    pub fn flag(&self, field: &str) -> EngineResult<bool> {
        self.state.flag(self.key, field)
    }

    pub fn text(&self, field: &str) -> EngineResult<Option<String>> {
        self.state.text(self.key, field)
    }

    /// Escape hatch for hooks that derive their answer from another
    /// gizmo's bucket (e.g. a camera reflecting the AI status).
    pub fn state(&self) -> &GameState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Bucket {
        bucket(json!({ "open": false, "count": 2 }))
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut state = GameState::new();
        state.initialize("cryo.door", &defaults());
        state.set("cryo.door", "open", json!(true)).expect("set");

        state.initialize("cryo.door", &defaults());
        assert_eq!(
            state.get("cryo.door", "open").expect("get"),
            Some(&json!(true))
        );
    }

    #[test]
    fn get_on_uninitialised_bucket_is_an_error() {
        let state = GameState::new();
        assert!(matches!(
            state.get("cryo.door", "open"),
            Err(EngineError::UninitializedBucket(key)) if key == "cryo.door"
        ));
    }

    #[test]
    fn set_on_uninitialised_bucket_is_an_error() {
        let mut state = GameState::new();
        assert!(state.set("cryo.door", "open", json!(true)).is_err());
    }

    #[test]
    fn absent_field_reads_as_none() {
        let mut state = GameState::new();
        state.initialize("cryo.door", &defaults());
        assert_eq!(state.get("cryo.door", "missing").expect("get"), None);
        assert!(!state.flag("cryo.door", "missing").expect("flag"));
    }

    #[test]
    fn export_round_trips() {
        let mut state = GameState::new();
        state.initialize("cryo.door", &defaults());
        state.initialize(
            "inventories",
            &bucket(json!({ "main": ["titanium_leg", "full_can.0"] })),
        );
        state
            .set("cryo.door", "open", json!(true))
            .expect("set field");

        let document = state.export();
        let restored = GameState::from_document(&document).expect("round trip");
        assert_eq!(restored, state);
        assert_eq!(restored.export(), document);
    }

    #[test]
    fn export_is_a_deep_copy() {
        let mut state = GameState::new();
        state.initialize("cryo.door", &defaults());
        let before = state.export();
        state.set("cryo.door", "open", json!(true)).expect("set");
        assert_ne!(before, state.export());
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(GameState::from_document(&json!([])).is_err());
        assert!(GameState::from_document(&json!({ "cryo.door": 7 })).is_err());
    }
}
