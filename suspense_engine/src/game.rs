use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::{json, Value};

use crate::audio::{NullSoundService, SoundService};
use crate::error::{EngineError, EngineResult};
use crate::events::{EventQueue, SceneChange, ScreenEvent};
use crate::interact::ImageRef;
use crate::items::{item_base, Item, ItemBehavior, ItemFactoryDef};
use crate::outcome::{Outcome, Response};
use crate::resources::ResourceLoader;
use crate::save;
use crate::scene::{Scene, SceneDef, SceneSetup};
use crate::state::{bucket, Bucket, GameState, StateView};
use crate::thing::{Interactable, ThingBehavior, ThingDef};

const GAME_KEY: &str = "game";
const INVENTORIES_KEY: &str = "inventories";
const FACTORIES_KEY: &str = "item_factories";
const MAIN_INVENTORY: &str = "main";

struct FactoryEntry {
    cloneable: bool,
    image: Option<ImageRef>,
    behavior: Rc<dyn ItemBehavior>,
    cache: BTreeMap<String, Rc<Item>>,
}

#[derive(Clone, Copy)]
enum Hook {
    Enter,
    Leave,
}

/// The orchestrator: owns the state tree, the scene/detail graph, item
/// factories, the inventory, the held tool and the deferred event queue,
/// and resolves every player interaction through the dispatch protocol.
pub struct Game {
    state: GameState,
    scenes: BTreeMap<String, Scene>,
    details: BTreeMap<String, Scene>,
    factories: BTreeMap<String, FactoryEntry>,
    current_scene: Option<String>,
    detail_stack: Vec<String>,
    tool: Option<String>,
    queue: EventQueue,
    events: Vec<String>,
    sound: Rc<dyn SoundService>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(Rc::new(NullSoundService))
    }
}

impl Game {
    pub fn new(sound: Rc<dyn SoundService>) -> Self {
        let mut state = GameState::new();
        state.initialize(INVENTORIES_KEY, &bucket(json!({ MAIN_INVENTORY: [] })));
        state.initialize(FACTORIES_KEY, &Bucket::new());
        state.initialize(
            GAME_KEY,
            &bucket(json!({ "scene": null, "tool": null, "details": [] })),
        );
        Game {
            state,
            scenes: BTreeMap::new(),
            details: BTreeMap::new(),
            factories: BTreeMap::new(),
            current_scene: None,
            detail_stack: Vec::new(),
            tool: None,
            queue: EventQueue::new(),
            events: Vec::new(),
            sound,
        }
    }

    // ------------------------------------------------------------------
    // registration (the bind phase)

    pub fn register_scene(&mut self, def: SceneDef) -> EngineResult<()> {
        let scene = self.bind_scene(def)?;
        self.log(format!("scene.register {}", scene.name()));
        self.scenes.insert(scene.name().to_string(), scene);
        Ok(())
    }

    pub fn register_detail(&mut self, def: SceneDef) -> EngineResult<()> {
        let scene = self.bind_scene(def)?;
        self.log(format!("detail.register {}", scene.name()));
        self.details.insert(scene.name().to_string(), scene);
        Ok(())
    }

    fn bind_scene(&mut self, def: SceneDef) -> EngineResult<Scene> {
        self.state.initialize(&def.name, &def.defaults);
        let mut scene = Scene::bind(def);
        let behavior = scene.behavior();
        let name = scene.name().to_string();
        let folder = scene.folder().to_string();
        let mut setup = SceneSetup::new(&mut self.state, &name, &folder, scene.things_mut());
        behavior.setup(&mut setup)?;
        Ok(scene)
    }

    pub fn register_factory(&mut self, def: ItemFactoryDef) -> EngineResult<()> {
        self.state.initialize(&def.key, &def.defaults);
        if self.state.get(FACTORIES_KEY, &def.key)?.is_none() {
            self.state
                .set(FACTORIES_KEY, &def.key, json!({ "created": [] }))?;
        }
        self.log(format!("factory.register {}", def.key));
        self.factories.insert(
            def.key,
            FactoryEntry {
                cloneable: def.cloneable,
                image: def.image,
                behavior: def.behavior,
                cache: BTreeMap::new(),
            },
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // state access

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    fn log(&mut self, entry: String) {
        self.events.push(entry);
    }

    // ------------------------------------------------------------------
    // item factories

    fn created_list(&self, base: &str) -> EngineResult<Vec<String>> {
        match self.state.get(FACTORIES_KEY, base)? {
            Some(Value::Object(record)) => match record.get("created") {
                Some(Value::Array(entries)) => Ok(entries
                    .iter()
                    .filter_map(|value| value.as_str().map(str::to_string))
                    .collect()),
                _ => Ok(Vec::new()),
            },
            Some(_) => Err(EngineError::MalformedDocument(format!(
                "factory record `{base}` is not an object"
            ))),
            None => Err(EngineError::UnknownFactory(base.to_string())),
        }
    }

    fn write_created(&mut self, base: &str, created: &[String]) -> EngineResult<()> {
        self.state
            .set(FACTORIES_KEY, base, json!({ "created": created }))
    }

    /// Mints a new item identifier. Singleton factories mint the bare key
    /// exactly once; cloneable factories mint `key.N` where `N` comes from
    /// the persisted `created` list, never from an in-memory counter, so
    /// numbering survives save/load.
    pub fn create_item(&mut self, base: &str) -> EngineResult<String> {
        let cloneable = self
            .factories
            .get(base)
            .ok_or_else(|| EngineError::UnknownFactory(base.to_string()))?
            .cloneable;
        let mut created = self.created_list(base)?;
        let identifier = if cloneable {
            let next = created
                .iter()
                .filter_map(|id| id.rsplit_once('.').and_then(|(_, n)| n.parse::<usize>().ok()))
                .max()
                .map(|n| n + 1)
                .unwrap_or(0);
            format!("{base}.{next}")
        } else {
            if created.iter().any(|id| id == base) {
                return Err(EngineError::DuplicateSingleton(base.to_string()));
            }
            base.to_string()
        };
        created.push(identifier.clone());
        self.write_created(base, &created)?;
        self.log(format!("item.create {identifier}"));
        Ok(identifier)
    }

    /// Resolves a live item by identifier; the identifier must already be
    /// in its factory's `created` record. Instances are cached, so fetching
    /// twice yields the same object within one run.
    pub fn get_item(&mut self, identifier: &str) -> EngineResult<Rc<Item>> {
        let base = item_base(identifier).to_string();
        let created = self.created_list(&base)?;
        if !created.iter().any(|id| id == identifier) {
            return Err(EngineError::UncreatedItem(identifier.to_string()));
        }
        let entry = self
            .factories
            .get_mut(&base)
            .ok_or_else(|| EngineError::UnknownFactory(base.clone()))?;
        if let Some(item) = entry.cache.get(identifier) {
            return Ok(item.clone());
        }
        let item = Rc::new(Item {
            name: identifier.to_string(),
            base: base.clone(),
            image: entry.image.clone(),
            behavior: entry.behavior.clone(),
        });
        entry.cache.insert(identifier.to_string(), item.clone());
        Ok(item)
    }

    // ------------------------------------------------------------------
    // inventory

    fn inventory_list(&self, name: &str) -> EngineResult<Vec<String>> {
        match self.state.get(INVENTORIES_KEY, name)? {
            Some(Value::Array(entries)) => Ok(entries
                .iter()
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    fn write_inventory(&mut self, name: &str, items: &[String]) -> EngineResult<()> {
        self.state.set(INVENTORIES_KEY, name, json!(items))?;
        self.queue.post_screen(ScreenEvent::named("inventory.changed"));
        Ok(())
    }

    pub fn inventory(&self) -> EngineResult<Vec<String>> {
        self.inventory_list(MAIN_INVENTORY)
    }

    pub fn inventory_named(&self, name: &str) -> EngineResult<Vec<String>> {
        self.inventory_list(name)
    }

    /// Adds a created identifier to the main inventory. Adding an uncreated
    /// or duplicate identifier is a content bug.
    pub fn add_inventory_item(&mut self, identifier: &str) -> EngineResult<()> {
        let base = item_base(identifier).to_string();
        let created = self.created_list(&base)?;
        if !created.iter().any(|id| id == identifier) {
            return Err(EngineError::UncreatedItem(identifier.to_string()));
        }
        let mut items = self.inventory_list(MAIN_INVENTORY)?;
        if items.iter().any(|id| id == identifier) {
            return Err(EngineError::DuplicateInventoryItem(
                identifier.to_string(),
                MAIN_INVENTORY.to_string(),
            ));
        }
        items.push(identifier.to_string());
        self.write_inventory(MAIN_INVENTORY, &items)?;
        self.log(format!("inventory.add {identifier}"));
        Ok(())
    }

    /// Removes an identifier; `Ok(false)` when it was not present. Clears
    /// the tool when the held item is removed.
    pub fn remove_inventory_item(&mut self, identifier: &str) -> EngineResult<bool> {
        let mut items = self.inventory_list(MAIN_INVENTORY)?;
        let Some(index) = items.iter().position(|id| id == identifier) else {
            return Ok(false);
        };
        items.remove(index);
        self.write_inventory(MAIN_INVENTORY, &items)?;
        if self.tool.as_deref() == Some(identifier) {
            self.set_tool(None)?;
        }
        self.log(format!("inventory.remove {identifier}"));
        Ok(true)
    }

    /// Swaps `old` for a freshly created `new_base` item in place, keeping
    /// inventory order. `Ok(false)` when `old` is absent: nothing is
    /// created, nothing changes. Retargets the tool when the held item is
    /// the one replaced.
    pub fn replace_inventory_item(&mut self, old: &str, new_base: &str) -> EngineResult<bool> {
        let mut items = self.inventory_list(MAIN_INVENTORY)?;
        let Some(index) = items.iter().position(|id| id == old) else {
            return Ok(false);
        };
        let replacement = self.create_item(new_base)?;
        items[index] = replacement.clone();
        self.write_inventory(MAIN_INVENTORY, &items)?;
        if self.tool.as_deref() == Some(old) {
            self.tool = Some(replacement.clone());
            self.state.set(GAME_KEY, "tool", json!(replacement))?;
        }
        self.log(format!("inventory.replace {old} -> {replacement}"));
        Ok(true)
    }

    pub fn tool(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    /// Selects the held item used as the left-hand operand of every
    /// subsequent interaction; `None` goes back to the bare hand.
    pub fn set_tool(&mut self, identifier: Option<&str>) -> EngineResult<()> {
        if let Some(identifier) = identifier {
            let base = item_base(identifier).to_string();
            let created = self.created_list(&base)?;
            if !created.iter().any(|id| id == identifier) {
                return Err(EngineError::UncreatedItem(identifier.to_string()));
            }
        }
        self.tool = identifier.map(str::to_string);
        self.state.set(
            GAME_KEY,
            "tool",
            match identifier {
                Some(identifier) => json!(identifier),
                None => Value::Null,
            },
        )?;
        self.log(format!("tool.set {}", identifier.unwrap_or("hand")));
        Ok(())
    }

    // ------------------------------------------------------------------
    // scene graph

    pub fn current_scene(&self) -> Option<&str> {
        self.current_scene.as_deref()
    }

    pub fn detail_stack(&self) -> &[String] {
        &self.detail_stack
    }

    pub fn scene(&self, name: &str) -> EngineResult<&Scene> {
        self.scenes
            .get(name)
            .ok_or_else(|| EngineError::UnknownScene(name.to_string()))
    }

    pub fn detail(&self, name: &str) -> EngineResult<&Scene> {
        self.details
            .get(name)
            .ok_or_else(|| EngineError::UnknownDetail(name.to_string()))
    }

    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    pub fn detail_names(&self) -> impl Iterator<Item = &str> {
        self.details.keys().map(String::as_str)
    }

    /// The view input currently routes to: topmost open detail, else the
    /// current scene.
    pub fn top_view(&self) -> EngineResult<&Scene> {
        if let Some(name) = self.detail_stack.last() {
            return self.detail(name);
        }
        let current = self
            .current_scene
            .as_deref()
            .ok_or(EngineError::NoCurrentScene)?;
        self.scene(current)
    }

    /// Requests a transition to a main scene. Deferred: applied by the next
    /// `pump`, and superseded by any later request in the same tick.
    pub fn change_scene(&mut self, name: &str) {
        self.queue.post_scene_change(SceneChange::scene(name));
    }

    /// Requests a detail view be pushed onto the stack. Deferred like
    /// `change_scene`.
    pub fn show_detail(&mut self, name: &str) {
        self.queue.post_scene_change(SceneChange::detail(name));
    }

    /// Pops the topmost detail view, invoking its leave hook. No-op when
    /// the stack is empty. Called by the shell between ticks, never from
    /// inside dispatch.
    pub fn close_detail(&mut self) -> EngineResult<Vec<Outcome>> {
        let Some(name) = self.detail_stack.pop() else {
            return Ok(Vec::new());
        };
        self.sync_view_bucket()?;
        self.log(format!("detail.close {name}"));
        let outcomes = self.run_hook(&name, true, Hook::Leave)?;
        self.process_outcomes(outcomes)
    }

    /// Convenience for starting (or restarting) a fresh game in `name`.
    pub fn start(&mut self, name: &str) -> EngineResult<Vec<Outcome>> {
        self.change_scene(name);
        self.pump()
    }

    /// One cooperative tick of the transition machinery: applies at most
    /// one pending scene/detail change and returns the hook outcomes.
    pub fn pump(&mut self) -> EngineResult<Vec<Outcome>> {
        match self.queue.take_scene_change() {
            Some(change) => self.apply_scene_change(change),
            None => Ok(Vec::new()),
        }
    }

    pub fn has_pending_change(&self) -> bool {
        self.queue.has_pending_change()
    }

    pub fn post_screen_event(&mut self, event: ScreenEvent) {
        self.queue.post_screen(event);
    }

    /// Hands the queued screen events to the presentation shell, exactly
    /// once each, in post order.
    pub fn drain_screen_events(&mut self) -> Vec<ScreenEvent> {
        self.queue.drain_screen()
    }

    fn sync_view_bucket(&mut self) -> EngineResult<()> {
        self.state
            .set(GAME_KEY, "details", json!(self.detail_stack))?;
        Ok(())
    }

    fn apply_scene_change(&mut self, change: SceneChange) -> EngineResult<Vec<Outcome>> {
        let mut outcomes = Vec::new();
        if change.detail {
            if self.detail_stack.last().map(String::as_str) == Some(change.target.as_str()) {
                return Ok(Vec::new());
            }
            if !self.details.contains_key(&change.target) {
                return Err(EngineError::UnknownDetail(change.target));
            }
            self.detail_stack.push(change.target.clone());
            self.sync_view_bucket()?;
            self.log(format!("detail.open {}", change.target));
            outcomes.extend(self.run_hook(&change.target, true, Hook::Enter)?);
            self.refresh_view(&change.target)?;
        } else {
            if !self.scenes.contains_key(&change.target) {
                return Err(EngineError::UnknownScene(change.target));
            }
            while let Some(detail) = self.detail_stack.pop() {
                self.sync_view_bucket()?;
                self.log(format!("detail.close {detail}"));
                outcomes.extend(self.run_hook(&detail, true, Hook::Leave)?);
            }
            if let Some(old) = self.current_scene.clone() {
                outcomes.extend(self.run_hook(&old, false, Hook::Leave)?);
            }
            self.current_scene = Some(change.target.clone());
            self.state.set(GAME_KEY, "scene", json!(change.target))?;
            self.log(format!("scene.switch {}", change.target));
            outcomes.extend(self.run_hook(&change.target, false, Hook::Enter)?);
            self.refresh_view(&change.target)?;
        }
        self.process_outcomes(outcomes)
    }

    fn run_hook(&mut self, view: &str, detail: bool, hook: Hook) -> EngineResult<Vec<Outcome>> {
        let behavior = if detail {
            self.detail(view)?.behavior()
        } else {
            self.scene(view)?.behavior()
        };
        let mut ctx = InteractionContext::new(self, view.to_string(), None);
        let response = match hook {
            Hook::Enter => behavior.enter(&mut ctx)?,
            Hook::Leave => behavior.leave(&mut ctx)?,
        };
        Ok(response.into_outcomes())
    }

    /// Re-derives `select_interact` for every thing in a view; used on
    /// entry so interact states driven by other scenes' data catch up.
    fn refresh_view(&mut self, view: &str) -> EngineResult<()> {
        let names: Vec<String> = {
            let scene = self
                .scenes
                .get(view)
                .or_else(|| self.details.get(view))
                .ok_or_else(|| EngineError::UnknownScene(view.to_string()))?;
            scene
                .things()
                .iter()
                .map(|thing| thing.name().to_string())
                .collect()
        };
        for name in names {
            self.refresh_thing(&name)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // things

    fn find_thing_behavior(&self, name: &str) -> Option<Rc<dyn ThingBehavior>> {
        for scene in self.details.values().chain(self.scenes.values()) {
            if let Some(thing) = scene.thing(name) {
                return Some(thing.behavior());
            }
        }
        None
    }

    /// Re-runs a thing's `select_interact` against current state; returns
    /// whether the thing was found in any view.
    pub fn refresh_thing(&mut self, name: &str) -> EngineResult<bool> {
        let mut found: Option<(bool, String, Option<String>)> = None;
        for (key, scene) in &self.scenes {
            if let Some(thing) = scene.thing(name) {
                let selected = thing
                    .behavior()
                    .select_interact(&StateView::new(&self.state, name))?;
                found = Some((false, key.clone(), selected));
                break;
            }
        }
        if found.is_none() {
            for (key, scene) in &self.details {
                if let Some(thing) = scene.thing(name) {
                    let selected = thing
                        .behavior()
                        .select_interact(&StateView::new(&self.state, name))?;
                    found = Some((true, key.clone(), selected));
                    break;
                }
            }
        }
        let Some((is_detail, view, selected)) = found else {
            return Ok(false);
        };
        if let Some(selected) = selected {
            let map = if is_detail {
                &mut self.details
            } else {
                &mut self.scenes
            };
            if let Some(thing) = map.get_mut(&view).and_then(|scene| scene.thing_mut(name)) {
                thing.set_interact(&selected)?;
            }
        }
        Ok(true)
    }

    /// Transitions a thing's interact-state machine directly.
    pub fn set_thing_interact(&mut self, name: &str, interact: &str) -> EngineResult<()> {
        let mut done = false;
        for scene in self.scenes.values_mut().chain(self.details.values_mut()) {
            if let Some(thing) = scene.thing_mut(name) {
                thing.set_interact(interact)?;
                done = true;
                break;
            }
        }
        if !done {
            return Err(EngineError::UnknownThing(name.to_string()));
        }
        self.log(format!("interact.set {name} {interact}"));
        Ok(())
    }

    /// Binds a new thing into a scene or detail view mid-game.
    pub fn add_thing_to(&mut self, view: &str, def: ThingDef) -> EngineResult<()> {
        let thing_name = def.name.clone();
        let scene = if self.scenes.contains_key(view) {
            self.scenes.get_mut(view)
        } else {
            self.details.get_mut(view)
        };
        let Some(scene) = scene else {
            return Err(EngineError::UnknownScene(view.to_string()));
        };
        let name = scene.name().to_string();
        let folder = scene.folder().to_string();
        let mut setup = SceneSetup::new(&mut self.state, &name, &folder, scene.things_mut());
        setup.add_thing(def)?;
        self.log(format!("thing.add {view} {thing_name}"));
        Ok(())
    }

    /// Removes a thing from whatever view owns it; `Ok(false)` when no
    /// view does. Identity survives, only membership goes away.
    pub fn remove_thing(&mut self, name: &str) -> EngineResult<bool> {
        let mut removed = false;
        for scene in self.scenes.values_mut().chain(self.details.values_mut()) {
            if scene.remove_thing(name).is_some() {
                removed = true;
                break;
            }
        }
        if removed {
            self.log(format!("thing.remove {name}"));
        }
        Ok(removed)
    }

    /// Resolves the thing under the pointer in the topmost view.
    pub fn thing_at(&self, point: (i32, i32)) -> EngineResult<Option<String>> {
        Ok(self.top_view()?.thing_at(point).map(str::to_string))
    }

    /// Advances animated interacts in the topmost view once; true means a
    /// redraw is needed.
    pub fn animate(&mut self) -> EngineResult<bool> {
        if let Some(name) = self.detail_stack.last().cloned() {
            let scene = self
                .details
                .get_mut(&name)
                .ok_or(EngineError::UnknownDetail(name))?;
            return Ok(scene.animate());
        }
        let Some(name) = self.current_scene.clone() else {
            return Ok(false);
        };
        let scene = self
            .scenes
            .get_mut(&name)
            .ok_or(EngineError::UnknownScene(name))?;
        Ok(scene.animate())
    }

    // ------------------------------------------------------------------
    // interaction dispatch

    /// A pointer click in the topmost view, using the held tool.
    pub fn click(&mut self, point: (i32, i32)) -> EngineResult<Vec<Outcome>> {
        let Some(name) = self.thing_at(point)? else {
            return Ok(Vec::new());
        };
        let tool = self.tool.clone();
        self.interact_thing(&name, tool.as_deref())
    }

    /// Full dispatch against a thing: interactivity gate, then the
    /// three-step handler resolution (target's specific handler, tool's
    /// inverse handler, target's default). The target's handler always
    /// wins when both sides define one.
    pub fn interact_thing(&mut self, name: &str, tool: Option<&str>) -> EngineResult<Vec<Outcome>> {
        let behavior = self
            .find_thing_behavior(name)
            .ok_or_else(|| EngineError::UnknownThing(name.to_string()))?;
        let tool_base = tool.map(|id| item_base(id).to_string());
        {
            let view = StateView::new(&self.state, name);
            if !behavior.is_interactive(&view, tool_base.as_deref())? {
                self.log(format!("interact.skip {name}"));
                return Ok(Vec::new());
            }
        }
        self.log(format!("interact {name} tool={}", tool.unwrap_or("hand")));
        let response = self.dispatch(behavior.as_ref(), name, name, tool)?;
        self.process_outcomes(response.into_outcomes())
    }

    /// Dispatch against an inventory item as the target (combining two
    /// items). The held tool itself is never a valid target.
    pub fn interact_item(
        &mut self,
        target: &str,
        tool: Option<&str>,
    ) -> EngineResult<Vec<Outcome>> {
        if tool == Some(target) {
            return Ok(Vec::new());
        }
        let item = self.get_item(target)?;
        self.log(format!("interact {target} tool={}", tool.unwrap_or("hand")));
        let target_key = item.base.clone();
        let target_ident = item.base.clone();
        let behavior = item.behavior.clone();
        let response = self.dispatch(behavior.as_ref(), &target_key, &target_ident, tool)?;
        self.process_outcomes(response.into_outcomes())
    }

    fn dispatch<B>(
        &mut self,
        behavior: &B,
        target_key: &str,
        target_ident: &str,
        tool: Option<&str>,
    ) -> EngineResult<Response>
    where
        B: Interactable + ?Sized,
    {
        match tool {
            None => {
                {
                    let mut ctx = InteractionContext::new(self, target_key.to_string(), None);
                    if let Some(response) = behavior.interact_without(&mut ctx)? {
                        return Ok(response);
                    }
                }
                let mut ctx = InteractionContext::new(self, target_key.to_string(), None);
                behavior.interact_default(&mut ctx, None)
            }
            Some(tool_id) => {
                let base = item_base(tool_id).to_string();
                {
                    let mut ctx = InteractionContext::new(
                        self,
                        target_key.to_string(),
                        Some(tool_id.to_string()),
                    );
                    if let Some(response) = behavior.interact_with(&mut ctx, &base)? {
                        return Ok(response);
                    }
                }
                let item = self.get_item(tool_id)?;
                {
                    let mut ctx = InteractionContext::new(
                        self,
                        item.base.clone(),
                        Some(tool_id.to_string()),
                    );
                    if let Some(response) = item.behavior.answer_for(&mut ctx, target_ident)? {
                        return Ok(response);
                    }
                }
                let mut ctx = InteractionContext::new(
                    self,
                    target_key.to_string(),
                    Some(tool_id.to_string()),
                );
                behavior.interact_default(&mut ctx, Some(&base))
            }
        }
    }

    /// Performs the engine-side effects of a batch of outcomes (sound,
    /// queued detail-opens, end-game event) and passes the batch through
    /// for the presentation layer to show messages and widgets.
    fn process_outcomes(&mut self, outcomes: Vec<Outcome>) -> EngineResult<Vec<Outcome>> {
        for outcome in &outcomes {
            if let Some(cue) = &outcome.sound {
                let sound = self.sound.clone();
                sound.play(cue);
                self.log(format!("sound.play {cue}"));
            }
            if let Some(detail) = &outcome.detail {
                let detail = detail.clone();
                self.show_detail(&detail);
            }
            if outcome.end_game {
                self.queue.post_screen(ScreenEvent::named("end_game"));
                self.log("game.end".to_string());
            }
        }
        Ok(outcomes)
    }

    // ------------------------------------------------------------------
    // persistence

    pub fn save_to(&self, directory: &Path, slot: &str) -> EngineResult<PathBuf> {
        save::save(&self.state, directory, slot)
    }

    /// Adopts a restored state tree: orchestrator fields come back from
    /// the `game` bucket, scene membership is rebuilt by re-running every
    /// setup hook against the restored buckets, interact states re-derive
    /// from `select_interact`, and item caches and queues start empty.
    pub fn restore(&mut self, state: GameState) -> EngineResult<()> {
        self.state = state;
        self.state
            .initialize(INVENTORIES_KEY, &bucket(json!({ MAIN_INVENTORY: [] })));
        self.state.initialize(FACTORIES_KEY, &Bucket::new());
        self.state.initialize(
            GAME_KEY,
            &bucket(json!({ "scene": null, "tool": null, "details": [] })),
        );
        self.tool = self.state.text(GAME_KEY, "tool")?;
        self.current_scene = self.state.text(GAME_KEY, "scene")?;
        self.detail_stack = match self.state.get(GAME_KEY, "details")? {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        self.queue = EventQueue::new();
        for entry in self.factories.values_mut() {
            entry.cache.clear();
        }
        let scene_keys: Vec<String> = self.scenes.keys().cloned().collect();
        for key in scene_keys {
            self.rebuild_view(&key, false)?;
        }
        let detail_keys: Vec<String> = self.details.keys().cloned().collect();
        for key in detail_keys {
            self.rebuild_view(&key, true)?;
        }
        self.log("state.restore".to_string());
        Ok(())
    }

    fn rebuild_view(&mut self, key: &str, detail: bool) -> EngineResult<()> {
        let map = if detail {
            &mut self.details
        } else {
            &mut self.scenes
        };
        let scene = match map.get_mut(key) {
            Some(scene) => scene,
            None if detail => return Err(EngineError::UnknownDetail(key.to_string())),
            None => return Err(EngineError::UnknownScene(key.to_string())),
        };
        let defaults = scene.defaults().clone();
        self.state.initialize(key, &defaults);
        scene.things_mut().clear();
        let behavior = scene.behavior();
        let name = scene.name().to_string();
        let folder = scene.folder().to_string();
        let mut setup = SceneSetup::new(&mut self.state, &name, &folder, scene.things_mut());
        behavior.setup(&mut setup)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // content validation

    /// Resolves every background and interact image plus every factory's
    /// inventory image through the loader. Run from tests so missing-asset
    /// content errors never reach a shipped build.
    pub fn validate_resources(&self, loader: &dyn ResourceLoader) -> EngineResult<()> {
        use crate::interact::InteractImage;
        for scene in self.scenes.values().chain(self.details.values()) {
            if let Some(image) = scene.background() {
                loader.get_image(&image.folder, &image.name)?;
            }
            for thing in scene.things() {
                for interact in thing.interacts().values() {
                    match &interact.image {
                        InteractImage::None => {}
                        InteractImage::Static(image) => {
                            loader.get_image(&image.folder, &image.name)?;
                        }
                        InteractImage::Animated { frames, .. } => {
                            for image in frames {
                                loader.get_image(&image.folder, &image.name)?;
                            }
                        }
                    }
                }
            }
        }
        for entry in self.factories.values() {
            if let Some(image) = &entry.image {
                loader.get_image(&image.folder, &image.name)?;
            }
        }
        Ok(())
    }
}

/// Mutable context handed to every handler: own-bucket accessors keyed by
/// the dispatch target's state key, the concrete held-tool identifier, and
/// full orchestrator access for everything else.
pub struct InteractionContext<'a> {
    game: &'a mut Game,
    state_key: String,
    tool: Option<String>,
}

impl<'a> InteractionContext<'a> {
    pub(crate) fn new(game: &'a mut Game, state_key: String, tool: Option<String>) -> Self {
        Self {
            game,
            state_key,
            tool,
        }
    }

    pub fn game(&mut self) -> &mut Game {
        self.game
    }

    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    /// Concrete identifier of the held tool (`full_can.1`), as opposed to
    /// the base name the handler was looked up by.
    pub fn tool_id(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    pub fn get(&self, field: &str) -> EngineResult<Option<Value>> {
        Ok(self.game.state.get(&self.state_key, field)?.cloned())
    }

    pub fn flag(&self, field: &str) -> EngineResult<bool> {
        self.game.state.flag(&self.state_key, field)
    }

    pub fn text(&self, field: &str) -> EngineResult<Option<String>> {
        self.game.state.text(&self.state_key, field)
    }

    pub fn set(&mut self, field: &str, value: Value) -> EngineResult<()> {
        self.game.state.set(&self.state_key, field, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{HitRegion, Rect};
    use crate::interact::Interact;
    use crate::scene::SceneBehavior;
    use std::collections::BTreeMap;

    struct InertItem;
    impl Interactable for InertItem {}
    impl ItemBehavior for InertItem {}

    struct EmptyScene;
    impl SceneBehavior for EmptyScene {
        fn setup(&self, _setup: &mut SceneSetup<'_>) -> EngineResult<()> {
            Ok(())
        }
    }

    fn factory(key: &str, cloneable: bool) -> ItemFactoryDef {
        ItemFactoryDef {
            key: key.to_string(),
            cloneable,
            image: None,
            defaults: Bucket::new(),
            behavior: Rc::new(InertItem),
        }
    }

    fn scene_def(name: &str) -> SceneDef {
        SceneDef {
            name: name.to_string(),
            folder: name.to_string(),
            background: None,
            offset: (0, 0),
            defaults: Bucket::new(),
            behavior: Rc::new(EmptyScene),
        }
    }

    fn game_with_factories() -> Game {
        let mut game = Game::default();
        game.register_factory(factory("titanium_leg", false))
            .expect("register leg");
        game.register_factory(factory("full_can", true))
            .expect("register can");
        game.register_factory(factory("empty_can", true))
            .expect("register empty can");
        game
    }

    #[test]
    fn singleton_factory_rejects_second_create() {
        let mut game = game_with_factories();
        assert_eq!(
            game.create_item("titanium_leg").expect("first create"),
            "titanium_leg"
        );
        assert!(matches!(
            game.create_item("titanium_leg"),
            Err(EngineError::DuplicateSingleton(_))
        ));
    }

    #[test]
    fn cloneable_factory_numbers_in_creation_order() {
        let mut game = game_with_factories();
        let ids: Vec<String> = (0..3)
            .map(|_| game.create_item("full_can").expect("create"))
            .collect();
        assert_eq!(ids, ["full_can.0", "full_can.1", "full_can.2"]);
    }

    #[test]
    fn get_item_requires_creation() {
        let mut game = game_with_factories();
        assert!(matches!(
            game.get_item("full_can.0"),
            Err(EngineError::UncreatedItem(_))
        ));
        let id = game.create_item("full_can").expect("create");
        let first = game.get_item(&id).expect("fetch");
        let second = game.get_item(&id).expect("fetch again");
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn unknown_factory_is_an_error() {
        let mut game = Game::default();
        assert!(matches!(
            game.create_item("crowbar"),
            Err(EngineError::UnknownFactory(_))
        ));
    }

    #[test]
    fn removing_the_held_tool_clears_it() {
        let mut game = game_with_factories();
        let id = game.create_item("full_can").expect("create");
        game.add_inventory_item(&id).expect("add");
        game.set_tool(Some(&id)).expect("hold");

        assert!(game.remove_inventory_item(&id).expect("remove"));
        assert_eq!(game.tool(), None);
        assert!(game.inventory().expect("inventory").is_empty());
    }

    #[test]
    fn replacing_the_held_tool_retargets_it() {
        let mut game = game_with_factories();
        let id = game.create_item("full_can").expect("create");
        game.add_inventory_item(&id).expect("add");
        game.set_tool(Some(&id)).expect("hold");

        assert!(game.replace_inventory_item(&id, "empty_can").expect("swap"));
        assert_eq!(game.inventory().expect("inventory"), ["empty_can.0"]);
        assert_eq!(game.tool(), Some("empty_can.0"));
    }

    #[test]
    fn mutating_an_absent_item_is_a_silent_no_op() {
        let mut game = game_with_factories();
        let id = game.create_item("full_can").expect("create");
        game.add_inventory_item(&id).expect("add");
        game.set_tool(Some(&id)).expect("hold");

        assert!(!game.remove_inventory_item("full_can.7").expect("remove"));
        assert!(!game
            .replace_inventory_item("full_can.7", "empty_can")
            .expect("replace"));
        assert_eq!(game.inventory().expect("inventory"), [id.clone()]);
        assert_eq!(game.tool(), Some(id.as_str()));
        // the failed replace must not have minted anything
        assert!(matches!(
            game.get_item("empty_can.0"),
            Err(EngineError::UncreatedItem(_))
        ));
    }

    #[test]
    fn duplicate_inventory_entries_are_content_errors() {
        let mut game = game_with_factories();
        let id = game.create_item("full_can").expect("create");
        game.add_inventory_item(&id).expect("add");
        assert!(matches!(
            game.add_inventory_item(&id),
            Err(EngineError::DuplicateInventoryItem(..))
        ));
    }

    #[test]
    fn inventory_changes_notify_the_shell() {
        let mut game = game_with_factories();
        let id = game.create_item("full_can").expect("create");
        game.add_inventory_item(&id).expect("add");
        let events = game.drain_screen_events();
        assert!(events
            .iter()
            .any(|event| event.name == "inventory.changed"));
    }

    #[test]
    fn pump_applies_at_most_one_change_and_last_request_wins() {
        let mut game = Game::default();
        game.register_scene(scene_def("cryo")).expect("cryo");
        game.register_scene(scene_def("mess")).expect("mess");
        game.register_scene(scene_def("bridge")).expect("bridge");

        game.change_scene("mess");
        game.change_scene("bridge");
        game.pump().expect("pump");
        assert_eq!(game.current_scene(), Some("bridge"));

        // nothing left pending
        game.pump().expect("pump");
        assert_eq!(game.current_scene(), Some("bridge"));
        let switches = game
            .events()
            .iter()
            .filter(|entry| entry.starts_with("scene.switch"))
            .count();
        assert_eq!(switches, 1);
    }

    #[test]
    fn detail_views_stack_and_reshowing_the_top_is_a_no_op() {
        let mut game = Game::default();
        game.register_scene(scene_def("bridge")).expect("bridge");
        game.register_detail(scene_def("bridge.comp"))
            .expect("detail");
        game.start("bridge").expect("start");

        game.show_detail("bridge.comp");
        game.pump().expect("pump");
        assert_eq!(game.detail_stack(), ["bridge.comp"]);
        assert_eq!(game.top_view().expect("top").name(), "bridge.comp");

        game.show_detail("bridge.comp");
        game.pump().expect("pump");
        assert_eq!(game.detail_stack(), ["bridge.comp"]);

        game.close_detail().expect("close");
        assert!(game.detail_stack().is_empty());
        assert_eq!(game.top_view().expect("top").name(), "bridge");

        // closing with nothing open is fine
        assert!(game.close_detail().expect("close again").is_empty());
    }

    #[test]
    fn changing_scene_closes_open_details_first() {
        let mut game = Game::default();
        game.register_scene(scene_def("bridge")).expect("bridge");
        game.register_scene(scene_def("cryo")).expect("cryo");
        game.register_detail(scene_def("bridge.comp"))
            .expect("detail");
        game.start("bridge").expect("start");
        game.show_detail("bridge.comp");
        game.pump().expect("pump");

        game.change_scene("cryo");
        game.pump().expect("pump");
        assert!(game.detail_stack().is_empty());
        assert_eq!(game.current_scene(), Some("cryo"));
    }

    // dispatch-order fixtures -------------------------------------------

    struct Door;
    impl Interactable for Door {
        fn interact_with(
            &self,
            ctx: &mut InteractionContext<'_>,
            tool: &str,
        ) -> EngineResult<Option<Response>> {
            if tool != "titanium_leg" {
                return Ok(None);
            }
            ctx.set("open", json!(true))?;
            Ok(Some(Outcome::silent().with_sound("creak").into()))
        }
        fn interact_default(
            &self,
            _ctx: &mut InteractionContext<'_>,
            _tool: Option<&str>,
        ) -> EngineResult<Response> {
            Ok(Outcome::message("It does not budge.").into())
        }
    }
    impl ThingBehavior for Door {}

    struct Leg;
    impl Interactable for Leg {
        fn answer_for(
            &self,
            _ctx: &mut InteractionContext<'_>,
            target: &str,
        ) -> EngineResult<Option<Response>> {
            // deliberately also claims the door: the door's own handler
            // must win
            if target == "door" || target == "panel" {
                return Ok(Some(Outcome::message("You wave the leg at it.").into()));
            }
            Ok(None)
        }
    }
    impl ItemBehavior for Leg {}

    struct DoorScene;
    impl SceneBehavior for DoorScene {
        fn setup(&self, setup: &mut SceneSetup<'_>) -> EngineResult<()> {
            let mut interacts = BTreeMap::new();
            interacts.insert(
                "closed".to_string(),
                Interact::invisible(HitRegion::Single(Rect::new(0, 0, 10, 10))),
            );
            for name in ["door", "panel"] {
                setup.add_thing(ThingDef {
                    name: name.to_string(),
                    folder: None,
                    interacts: interacts.clone(),
                    initial_interact: "closed".to_string(),
                    defaults: bucket(json!({ "open": false })),
                    behavior: if name == "door" {
                        Rc::new(Door) as Rc<dyn ThingBehavior>
                    } else {
                        Rc::new(PanelWithoutHandlers)
                    },
                })?;
            }
            Ok(())
        }
    }

    struct PanelWithoutHandlers;
    impl Interactable for PanelWithoutHandlers {}
    impl ThingBehavior for PanelWithoutHandlers {}

    fn dispatch_game() -> Game {
        let mut game = Game::default();
        game.register_factory(ItemFactoryDef {
            key: "titanium_leg".to_string(),
            cloneable: false,
            image: None,
            defaults: Bucket::new(),
            behavior: Rc::new(Leg),
        })
        .expect("factory");
        game.register_scene(SceneDef {
            name: "hold".to_string(),
            folder: "hold".to_string(),
            background: None,
            offset: (0, 0),
            defaults: Bucket::new(),
            behavior: Rc::new(DoorScene),
        })
        .expect("scene");
        game.start("hold").expect("start");
        game.create_item("titanium_leg").expect("create");
        game
    }

    #[test]
    fn target_handler_wins_over_inverse() {
        let mut game = dispatch_game();
        let outcomes = game
            .interact_thing("door", Some("titanium_leg"))
            .expect("dispatch");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].sound.as_deref(), Some("creak"));
        assert!(game.state().flag("door", "open").expect("flag"));
    }

    #[test]
    fn inverse_fires_when_the_target_declines() {
        let mut game = dispatch_game();
        let outcomes = game
            .interact_thing("panel", Some("titanium_leg"))
            .expect("dispatch");
        assert_eq!(
            outcomes[0].message.as_deref(),
            Some("You wave the leg at it.")
        );
        assert!(!game.state().flag("panel", "open").expect("flag"));
    }

    #[test]
    fn default_handler_is_the_last_resort() {
        let mut game = dispatch_game();
        let outcomes = game.interact_thing("door", None).expect("dispatch");
        assert_eq!(outcomes[0].message.as_deref(), Some("It does not budge."));
    }
}
