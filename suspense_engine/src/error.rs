use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal engine errors. Everything here indicates a bug in scene or puzzle
/// content rather than a condition the player can trigger; there is no
/// runtime recovery path, callers propagate these to the top level.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("state bucket `{0}` was never initialised")]
    UninitializedBucket(String),

    #[error("save document is malformed: {0}")]
    MalformedDocument(String),

    #[error("no item factory registered for `{0}`")]
    UnknownFactory(String),

    #[error("item `{0}` has not been created by its factory")]
    UncreatedItem(String),

    #[error("singleton item `{0}` created twice")]
    DuplicateSingleton(String),

    #[error("item `{0}` is already in inventory `{1}`")]
    DuplicateInventoryItem(String, String),

    #[error("no scene named `{0}`")]
    UnknownScene(String),

    #[error("no detail view named `{0}`")]
    UnknownDetail(String),

    #[error("no thing named `{0}` in the current views")]
    UnknownThing(String),

    #[error("thing `{0}` has no interact named `{1}`")]
    UnknownInteract(String, String),

    #[error("resource `{folder}/{name}` not found")]
    MissingResource { folder: String, name: String },

    #[error("no scene is current")]
    NoCurrentScene,

    #[error("writing save to {path}: {source}")]
    SaveIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
