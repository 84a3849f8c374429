//! Headless point-and-click adventure engine: a JSON-shaped state tree,
//! scenes full of stateful hotspots, an item-factory inventory and a
//! trait-based interaction dispatch protocol. Rendering and input live in
//! a separate presentation shell; everything here runs without a window.

pub mod audio;
pub mod error;
pub mod events;
pub mod game;
pub mod geometry;
pub mod interact;
pub mod items;
pub mod outcome;
pub mod resources;
pub mod save;
pub mod scene;
pub mod state;
pub mod thing;

pub use audio::{NullSoundService, RecordingSoundService, SoundService};
pub use error::{EngineError, EngineResult};
pub use events::{EventQueue, SceneChange, ScreenEvent};
pub use game::{Game, InteractionContext};
pub use geometry::{HitRegion, Rect};
pub use interact::{AnimationState, ImageRef, Interact, InteractImage};
pub use items::{item_base, Item, ItemBehavior, ItemFactoryDef};
pub use outcome::{Outcome, Response, WidgetRequest};
pub use resources::{FontHandle, ImageHandle, ManifestLoader, ResourceLoader};
pub use scene::{Scene, SceneBehavior, SceneDef, SceneSetup};
pub use state::{bucket, Bucket, GameState, StateView};
pub use thing::{Interactable, Thing, ThingBehavior, ThingDef};
