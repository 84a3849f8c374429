use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::state::GameState;

/// Deterministic slot path: `<dir>/<name>.json`.
pub fn save_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{name}.json"))
}

/// Writes the exported state tree as pretty-printed JSON, creating the
/// directory if needed. Returns the path written.
pub fn save(state: &GameState, directory: &Path, name: &str) -> EngineResult<PathBuf> {
    fs::create_dir_all(directory).map_err(|source| EngineError::SaveIo {
        path: directory.to_path_buf(),
        source,
    })?;
    let path = save_path(directory, name);
    let document = state.export();
    let json = serde_json::to_string_pretty(&document)
        .map_err(|err| EngineError::MalformedDocument(err.to_string()))?;
    fs::write(&path, json).map_err(|source| EngineError::SaveIo {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Reads a save slot. A missing or unreadable file is the "no save found"
/// sentinel, not an error; a present document that fails to parse *is* an
/// error, so a corrupt save is never silently discarded.
pub fn load(directory: &Path, name: &str) -> EngineResult<Option<GameState>> {
    let path = save_path(directory, name);
    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            eprintln!(
                "[suspense_engine] warning: save slot {} unreadable: {err}",
                path.display()
            );
            return Ok(None);
        }
    };
    let document: serde_json::Value = serde_json::from_str(&data)
        .map_err(|err| EngineError::MalformedDocument(format!("{}: {err}", path.display())))?;
    GameState::from_document(&document).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::bucket;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_state() -> GameState {
        let mut state = GameState::new();
        state.initialize("cryo.door", &bucket(json!({ "open": true })));
        state.initialize(
            "inventories",
            &bucket(json!({ "main": ["titanium_leg", "full_can.0"] })),
        );
        state.initialize(
            "item_factories",
            &bucket(json!({ "full_can": { "created": ["full_can.0"] } })),
        );
        state
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().expect("temp dir");
        let state = sample_state();

        let path = save(&state, dir.path(), "slot1").expect("save");
        assert_eq!(path, dir.path().join("slot1.json"));

        let restored = load(dir.path(), "slot1")
            .expect("load")
            .expect("slot present");
        assert_eq!(restored.export(), state.export());
    }

    #[test]
    fn missing_save_is_a_sentinel_not_an_error() {
        let dir = tempdir().expect("temp dir");
        assert!(load(dir.path(), "nope").expect("load").is_none());
    }

    #[test]
    fn save_creates_the_directory() {
        let dir = tempdir().expect("temp dir");
        let nested = dir.path().join("saves");
        save(&sample_state(), &nested, "auto").expect("save");
        assert!(nested.join("auto.json").is_file());
    }

    #[test]
    fn corrupt_save_is_an_error() {
        let dir = tempdir().expect("temp dir");
        fs::write(save_path(dir.path(), "bad"), "{ not json").expect("write");
        assert!(load(dir.path(), "bad").is_err());
    }
}
