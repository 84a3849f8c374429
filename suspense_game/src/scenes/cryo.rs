use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::json;
use suspense_engine::{
    bucket, EngineResult, HitRegion, ImageRef, Interact, Interactable, InteractionContext,
    Outcome, Rect, Response, SceneBehavior, SceneDef, SceneSetup, StateView, ThingBehavior,
    ThingDef,
};

/// The cryo bay the player wakes up in. The door out is sealed until pried
/// open with the titanium leg.
pub fn def() -> SceneDef {
    SceneDef {
        name: "cryo".to_string(),
        folder: "cryo".to_string(),
        background: Some(ImageRef::new("cryo", "background")),
        offset: (0, 0),
        defaults: bucket(json!({ "briefed": false })),
        behavior: Rc::new(CryoBay),
    }
}

struct CryoBay;

impl SceneBehavior for CryoBay {
    fn setup(&self, setup: &mut SceneSetup<'_>) -> EngineResult<()> {
        // the pipes deliberately overlap the door's region; insertion
        // order makes the pipes win the hit test over the overlap
        setup.add_thing(ThingDef {
            name: "cryo.pipes".to_string(),
            folder: None,
            interacts: single(
                "idle",
                Interact::image(
                    ImageRef::new("cryo", "pipes"),
                    HitRegion::Single(Rect::new(300, 40, 60, 200)),
                ),
            ),
            initial_interact: "idle".to_string(),
            defaults: suspense_engine::Bucket::new(),
            behavior: Rc::new(Pipes),
        })?;
        setup.add_thing(ThingDef {
            name: "cryo.door".to_string(),
            folder: None,
            interacts: door_interacts(),
            initial_interact: "closed".to_string(),
            defaults: bucket(json!({ "open": false })),
            behavior: Rc::new(Door),
        })?;
        setup.add_thing(ThingDef {
            name: "cryo.unit".to_string(),
            folder: None,
            interacts: single(
                "occupied",
                Interact::image(
                    ImageRef::new("cryo", "unit"),
                    HitRegion::Single(Rect::new(60, 120, 120, 140)),
                ),
            ),
            initial_interact: "occupied".to_string(),
            defaults: bucket(json!({ "looted": false })),
            behavior: Rc::new(CryoUnit),
        })?;
        setup.add_thing(ThingDef {
            name: "cryo.hatch".to_string(),
            folder: None,
            interacts: single(
                "idle",
                Interact::invisible(HitRegion::Single(Rect::new(500, 200, 80, 120))),
            ),
            initial_interact: "idle".to_string(),
            defaults: suspense_engine::Bucket::new(),
            behavior: Rc::new(Hatch),
        })?;
        Ok(())
    }

    fn enter(&self, ctx: &mut InteractionContext<'_>) -> EngineResult<Response> {
        if ctx.flag("briefed")? {
            return Ok(Response::Nothing);
        }
        ctx.set("briefed", json!(true))?;
        Ok(Outcome::message("You thaw out alone. The ship is silent.").into())
    }
}

fn single(name: &str, interact: Interact) -> BTreeMap<String, Interact> {
    let mut interacts = BTreeMap::new();
    interacts.insert(name.to_string(), interact);
    interacts
}

fn door_interacts() -> BTreeMap<String, Interact> {
    let region = HitRegion::Single(Rect::new(320, 80, 90, 180));
    let mut interacts = BTreeMap::new();
    interacts.insert(
        "closed".to_string(),
        Interact::image(ImageRef::new("cryo", "door_closed"), region.clone()),
    );
    interacts.insert(
        "open".to_string(),
        Interact::image(ImageRef::new("cryo", "door_open"), region),
    );
    interacts
}

struct Door;

impl Interactable for Door {
    fn interact_without(&self, ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        if ctx.flag("open")? {
            ctx.game().change_scene("bridge");
            return Ok(Some(Response::Nothing));
        }
        Ok(Some(
            Outcome::message("Sealed. The emergency bolts are thrown.").into(),
        ))
    }

    fn interact_with(
        &self,
        ctx: &mut InteractionContext<'_>,
        tool: &str,
    ) -> EngineResult<Option<Response>> {
        if tool != "titanium_leg" {
            return Ok(None);
        }
        if ctx.flag("open")? {
            return Ok(Some(Outcome::message("It is already open.").into()));
        }
        ctx.set("open", json!(true))?;
        ctx.game().state_mut().set("bridge", "accessible", json!(true))?;
        ctx.game().refresh_thing("cryo.door")?;
        Ok(Some(Outcome::silent().with_sound("prybar").into()))
    }
}

impl ThingBehavior for Door {
    fn select_interact(&self, view: &StateView<'_>) -> EngineResult<Option<String>> {
        Ok(Some(
            if view.flag("open")? { "open" } else { "closed" }.to_string(),
        ))
    }
}

struct Pipes;

impl Interactable for Pipes {
    fn interact_without(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        Ok(Some(Outcome::message("Frost-caked coolant pipes.").into()))
    }
}

impl ThingBehavior for Pipes {}

struct CryoUnit;

impl Interactable for CryoUnit {
    fn interact_without(&self, ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        if ctx.flag("looted")? {
            return Ok(Some(
                Outcome::message("Nothing else in there you want to touch.").into(),
            ));
        }
        ctx.set("looted", json!(true))?;
        let leg = ctx.game().create_item("titanium_leg")?;
        ctx.game().add_inventory_item(&leg)?;
        Ok(Some(
            Outcome::message("You unscrew the occupant's titanium leg. Sorry, pal.")
                .with_sound("servo")
                .into(),
        ))
    }
}

impl ThingBehavior for CryoUnit {}

struct Hatch;

impl Interactable for Hatch {
    fn interact_without(&self, ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        ctx.game().change_scene("mess");
        Ok(Some(Response::Nothing))
    }
}

impl ThingBehavior for Hatch {}
