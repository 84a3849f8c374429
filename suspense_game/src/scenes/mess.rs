use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::json;
use suspense_engine::{
    bucket, Bucket, EngineResult, HitRegion, ImageRef, Interact, Interactable,
    InteractionContext, Outcome, Rect, Response, SceneBehavior, SceneDef, SceneSetup,
    ThingBehavior, ThingDef,
};

pub fn def() -> SceneDef {
    SceneDef {
        name: "mess".to_string(),
        folder: "mess".to_string(),
        background: Some(ImageRef::new("mess", "background")),
        offset: (0, 0),
        defaults: Bucket::new(),
        behavior: Rc::new(MessHall),
    }
}

struct MessHall;

impl SceneBehavior for MessHall {
    fn setup(&self, setup: &mut SceneSetup<'_>) -> EngineResult<()> {
        setup.add_thing(ThingDef {
            name: "mess.shelf".to_string(),
            folder: None,
            interacts: single(
                "stocked",
                Interact::image(
                    ImageRef::new("mess", "shelf"),
                    HitRegion::Single(Rect::new(40, 60, 180, 90)),
                ),
            ),
            initial_interact: "stocked".to_string(),
            defaults: bucket(json!({ "taken": 0 })),
            behavior: Rc::new(Shelf),
        })?;
        setup.add_thing(ThingDef {
            name: "mess.counter".to_string(),
            folder: None,
            interacts: single(
                "idle",
                Interact::image(
                    ImageRef::new("mess", "counter"),
                    HitRegion::Single(Rect::new(240, 180, 220, 80)),
                ),
            ),
            initial_interact: "idle".to_string(),
            defaults: Bucket::new(),
            behavior: Rc::new(Counter),
        })?;
        setup.add_thing(ThingDef {
            name: "mess.hatch".to_string(),
            folder: None,
            interacts: single(
                "idle",
                Interact::invisible(HitRegion::Single(Rect::new(540, 160, 80, 140))),
            ),
            initial_interact: "idle".to_string(),
            defaults: Bucket::new(),
            behavior: Rc::new(Hatch),
        })?;
        Ok(())
    }
}

fn single(name: &str, interact: Interact) -> BTreeMap<String, Interact> {
    let mut interacts = BTreeMap::new();
    interacts.insert(name.to_string(), interact);
    interacts
}

/// Ration shelf. Holds exactly three cans; the count lives in state so it
/// survives a save.
struct Shelf;

impl Interactable for Shelf {
    fn interact_without(&self, ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        let taken = ctx
            .get("taken")?
            .and_then(|value| value.as_u64())
            .unwrap_or(0);
        if taken >= 3 {
            return Ok(Some(Outcome::message("No more cans back there.").into()));
        }
        ctx.set("taken", json!(taken + 1))?;
        let can = ctx.game().create_item("full_can")?;
        ctx.game().add_inventory_item(&can)?;
        Ok(Some(
            Outcome::message("You grab a can of mystery meat.").into(),
        ))
    }
}

impl ThingBehavior for Shelf {}

struct Counter;

impl Interactable for Counter {
    fn interact_without(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        Ok(Some(
            Outcome::message("A counter unit with a built-in can opener.").into(),
        ))
    }

    fn interact_with(
        &self,
        ctx: &mut InteractionContext<'_>,
        tool: &str,
    ) -> EngineResult<Option<Response>> {
        if tool != "full_can" {
            return Ok(None);
        }
        let Some(held) = ctx.tool_id().map(str::to_string) else {
            return Ok(None);
        };
        if !ctx.game().replace_inventory_item(&held, "empty_can")? {
            return Ok(None);
        }
        Ok(Some(
            Outcome::message("You wolf the contents down cold.")
                .with_sound("can_open")
                .into(),
        ))
    }
}

impl ThingBehavior for Counter {}

struct Hatch;

impl Interactable for Hatch {
    fn interact_without(&self, ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        ctx.game().change_scene("cryo");
        Ok(Some(Response::Nothing))
    }
}

impl ThingBehavior for Hatch {}
