use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{EngineError, EngineResult};
use crate::game::InteractionContext;
use crate::geometry::HitRegion;
use crate::interact::{AnimationState, Interact};
use crate::outcome::Response;
use crate::state::{Bucket, StateView};

/// Dispatch hooks shared by things and items. Returning `Ok(None)` from a
/// specific hook means "no handler registered for this combination" and
/// lets resolution fall through to the next step.
pub trait Interactable {
    /// Handler for a bare-hand interaction.
    fn interact_without(
        &self,
        _ctx: &mut InteractionContext<'_>,
    ) -> EngineResult<Option<Response>> {
        Ok(None)
    }

    /// Handler keyed by the tool's factory base name.
    fn interact_with(
        &self,
        _ctx: &mut InteractionContext<'_>,
        _tool: &str,
    ) -> EngineResult<Option<Response>> {
        Ok(None)
    }

    /// Inverse side: this object is the *tool* being applied to `target`.
    /// Consulted only after the target declined the combination.
    fn answer_for(
        &self,
        _ctx: &mut InteractionContext<'_>,
        _target: &str,
    ) -> EngineResult<Option<Response>> {
        Ok(None)
    }

    /// Fallback when neither side registered a handler.
    fn interact_default(
        &self,
        _ctx: &mut InteractionContext<'_>,
        _tool: Option<&str>,
    ) -> EngineResult<Response> {
        Ok(Response::Nothing)
    }
}

/// Behaviour of one clickable hotspot. Implementations keep all mutable
/// puzzle data in the state tree; the trait object itself stays stateless
/// so it can be shared across dispatch calls.
pub trait ThingBehavior: Interactable {
    /// Puzzle-specific gating; a thing that is not interactive produces no
    /// outcome at all when clicked.
    fn is_interactive(&self, _view: &StateView<'_>, _tool: Option<&str>) -> EngineResult<bool> {
        Ok(true)
    }

    /// Derives the active interact from state; `None` keeps the declared
    /// initial interact. Consulted at bind time, on view entry, after a
    /// restore, and whenever the thing is explicitly refreshed.
    fn select_interact(&self, _view: &StateView<'_>) -> EngineResult<Option<String>> {
        Ok(None)
    }
}

/// Context-free description of a thing, bound into a scene by
/// `SceneSetup::add_thing`.
pub struct ThingDef {
    pub name: String,
    /// Resource namespace; `None` inherits the owning scene's folder.
    pub folder: Option<String>,
    pub interacts: BTreeMap<String, Interact>,
    pub initial_interact: String,
    pub defaults: Bucket,
    pub behavior: Rc<dyn ThingBehavior>,
}

/// A bound thing living inside a scene.
pub struct Thing {
    name: String,
    folder: String,
    interacts: BTreeMap<String, Interact>,
    current_interact: String,
    animation: AnimationState,
    behavior: Rc<dyn ThingBehavior>,
}

impl Thing {
    pub(crate) fn bind(def: &ThingDef, scene_folder: &str, current: String) -> Self {
        Thing {
            name: def.name.clone(),
            folder: def
                .folder
                .clone()
                .unwrap_or_else(|| scene_folder.to_string()),
            interacts: def.interacts.clone(),
            current_interact: current,
            animation: AnimationState::default(),
            behavior: def.behavior.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn behavior(&self) -> Rc<dyn ThingBehavior> {
        self.behavior.clone()
    }

    pub fn current_interact(&self) -> &str {
        &self.current_interact
    }

    pub fn interact(&self) -> &Interact {
        // the current name is validated on every transition
        &self.interacts[&self.current_interact]
    }

    pub fn interact_names(&self) -> impl Iterator<Item = &str> {
        self.interacts.keys().map(String::as_str)
    }

    pub fn interacts(&self) -> &BTreeMap<String, Interact> {
        &self.interacts
    }

    /// Transition the interact-state machine; re-derives the effective
    /// hit-region and restarts any frame sequence.
    pub fn set_interact(&mut self, name: &str) -> EngineResult<()> {
        if !self.interacts.contains_key(name) {
            return Err(EngineError::UnknownInteract(
                self.name.clone(),
                name.to_string(),
            ));
        }
        if self.current_interact != name {
            self.current_interact = name.to_string();
            self.animation.reset();
        }
        Ok(())
    }

    /// Effective hit-region, offset by the owning scene's draw offset.
    pub fn region(&self, offset: (i32, i32)) -> HitRegion {
        self.interact().region.translated(offset.0, offset.1)
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    /// Advances the frame cursor once; true means a redraw is needed.
    pub fn animate(&mut self) -> bool {
        let interact = self.interacts[&self.current_interact].clone();
        self.animation.advance(&interact)
    }
}
