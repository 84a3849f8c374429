use std::rc::Rc;

use crate::error::{EngineError, EngineResult};
use crate::game::InteractionContext;
use crate::interact::ImageRef;
use crate::outcome::Response;
use crate::state::{Bucket, GameState, StateView};
use crate::thing::{Thing, ThingDef};

/// Hooks owned by one scene or detail view.
pub trait SceneBehavior {
    /// Populates the scene's things against current state. Runs once at
    /// registration and again after a restore; membership that depends on
    /// puzzle progress must be derived from the bucket here.
    fn setup(&self, setup: &mut SceneSetup<'_>) -> EngineResult<()>;

    fn enter(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Response> {
        Ok(Response::Nothing)
    }

    fn leave(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Response> {
        Ok(Response::Nothing)
    }
}

/// Context-free description of a scene or detail view.
pub struct SceneDef {
    pub name: String,
    pub folder: String,
    pub background: Option<ImageRef>,
    /// Draw offset applied to every thing's hit-region.
    pub offset: (i32, i32),
    pub defaults: Bucket,
    pub behavior: Rc<dyn SceneBehavior>,
}

/// A bound scene. Things are kept in insertion order: pointer resolution is
/// first-match over this order, and existing content relies on it.
pub struct Scene {
    name: String,
    folder: String,
    background: Option<ImageRef>,
    offset: (i32, i32),
    defaults: Bucket,
    things: Vec<Thing>,
    behavior: Rc<dyn SceneBehavior>,
}

impl Scene {
    pub(crate) fn bind(def: SceneDef) -> Self {
        Scene {
            name: def.name,
            folder: def.folder,
            background: def.background,
            offset: def.offset,
            defaults: def.defaults,
            things: Vec::new(),
            behavior: def.behavior,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn background(&self) -> Option<&ImageRef> {
        self.background.as_ref()
    }

    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    pub(crate) fn defaults(&self) -> &Bucket {
        &self.defaults
    }

    pub fn behavior(&self) -> Rc<dyn SceneBehavior> {
        self.behavior.clone()
    }

    pub fn things(&self) -> &[Thing] {
        &self.things
    }

    pub(crate) fn things_mut(&mut self) -> &mut Vec<Thing> {
        &mut self.things
    }

    pub fn thing(&self, name: &str) -> Option<&Thing> {
        self.things.iter().find(|thing| thing.name() == name)
    }

    pub(crate) fn thing_mut(&mut self, name: &str) -> Option<&mut Thing> {
        self.things.iter_mut().find(|thing| thing.name() == name)
    }

    /// First thing in insertion order whose active hit-region contains the
    /// point. Deterministic, not spatial: overlaps resolve to whichever
    /// thing the scene's setup added first.
    pub fn thing_at(&self, point: (i32, i32)) -> Option<&str> {
        self.things
            .iter()
            .find(|thing| thing.region(self.offset).contains(point))
            .map(Thing::name)
    }

    /// Removes a thing from scene membership (identity is untouched; it can
    /// be re-added by a later setup pass or handler).
    pub(crate) fn remove_thing(&mut self, name: &str) -> Option<Thing> {
        let index = self.things.iter().position(|thing| thing.name() == name)?;
        Some(self.things.remove(index))
    }

    /// Advances every animated interact once; true when any frame changed.
    pub fn animate(&mut self) -> bool {
        let mut changed = false;
        for thing in &mut self.things {
            changed |= thing.animate();
        }
        changed
    }
}

/// Hands a scene's setup hook the ability to bind things, with state access
/// for membership decisions. This is the explicit bind step: a `ThingDef`
/// never sees state until it passes through here.
pub struct SceneSetup<'a> {
    state: &'a mut GameState,
    scene_name: &'a str,
    scene_folder: &'a str,
    things: &'a mut Vec<Thing>,
}

impl<'a> SceneSetup<'a> {
    pub(crate) fn new(
        state: &'a mut GameState,
        scene_name: &'a str,
        scene_folder: &'a str,
        things: &'a mut Vec<Thing>,
    ) -> Self {
        Self {
            state,
            scene_name,
            scene_folder,
            things,
        }
    }

    pub fn scene_name(&self) -> &str {
        self.scene_name
    }

    /// Read access for conditional membership (e.g. skip a thing whose item
    /// was already picked up).
    pub fn state(&self) -> &GameState {
        self.state
    }

    /// Binds a thing: initialises its bucket, inherits the scene folder,
    /// consults `select_interact`, and appends it in insertion order.
    pub fn add_thing(&mut self, def: ThingDef) -> EngineResult<()> {
        self.state.initialize(&def.name, &def.defaults);
        let view = StateView::new(self.state, &def.name);
        let current = match def.behavior.select_interact(&view)? {
            Some(name) => name,
            None => def.initial_interact.clone(),
        };
        if !def.interacts.contains_key(&current) {
            return Err(EngineError::UnknownInteract(def.name.clone(), current));
        }
        if self.things.iter().any(|thing| thing.name() == def.name) {
            // re-adding replaces the stale entry in place
            self.things.retain(|thing| thing.name() != def.name);
        }
        self.things.push(Thing::bind(&def, self.scene_folder, current));
        Ok(())
    }
}
