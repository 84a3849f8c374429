use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::json;
use suspense_engine::{
    bucket, Bucket, EngineResult, HitRegion, ImageRef, Interact, Interactable,
    InteractionContext, Outcome, Rect, Response, SceneBehavior, SceneDef, SceneSetup, StateView,
    ThingBehavior, ThingDef,
};

/// The bridge, reachable once the cryo door has been pried open. The
/// surveillance camera's interact state tracks `ai_status` in this scene's
/// bucket, so puzzle code elsewhere can kill the feed.
pub fn def() -> SceneDef {
    SceneDef {
        name: "bridge".to_string(),
        folder: "bridge".to_string(),
        background: Some(ImageRef::new("bridge", "background")),
        offset: (0, 0),
        defaults: bucket(json!({ "accessible": false, "ai_status": "online" })),
        behavior: Rc::new(Bridge),
    }
}

pub fn comp_def() -> SceneDef {
    SceneDef {
        name: "bridge.comp".to_string(),
        folder: "bridge".to_string(),
        background: Some(ImageRef::new("bridge", "comp_screen")),
        offset: (120, 60),
        defaults: Bucket::new(),
        behavior: Rc::new(CompScreen),
    }
}

struct Bridge;

impl SceneBehavior for Bridge {
    fn setup(&self, setup: &mut SceneSetup<'_>) -> EngineResult<()> {
        setup.add_thing(ThingDef {
            name: "bridge.camera".to_string(),
            folder: None,
            interacts: camera_interacts(),
            initial_interact: "online".to_string(),
            defaults: Bucket::new(),
            behavior: Rc::new(Camera),
        })?;
        setup.add_thing(ThingDef {
            name: "bridge.console".to_string(),
            folder: None,
            interacts: single(
                "idle",
                Interact::image(
                    ImageRef::new("bridge", "console"),
                    HitRegion::Single(Rect::new(200, 160, 240, 120)),
                ),
            ),
            initial_interact: "idle".to_string(),
            defaults: Bucket::new(),
            behavior: Rc::new(Console),
        })?;
        setup.add_thing(ThingDef {
            name: "bridge.exit".to_string(),
            folder: None,
            interacts: single(
                "idle",
                Interact::invisible(HitRegion::Single(Rect::new(0, 140, 50, 180))),
            ),
            initial_interact: "idle".to_string(),
            defaults: Bucket::new(),
            behavior: Rc::new(Exit),
        })?;
        Ok(())
    }
}

fn single(name: &str, interact: Interact) -> BTreeMap<String, Interact> {
    let mut interacts = BTreeMap::new();
    interacts.insert(name.to_string(), interact);
    interacts
}

fn camera_interacts() -> BTreeMap<String, Interact> {
    let region = HitRegion::Single(Rect::new(540, 20, 60, 50));
    let mut interacts = BTreeMap::new();
    interacts.insert(
        "online".to_string(),
        Interact::animated(
            vec![
                ImageRef::new("bridge", "camera_pan_0"),
                ImageRef::new("bridge", "camera_pan_1"),
                ImageRef::new("bridge", "camera_pan_2"),
            ],
            4,
            region.clone(),
        ),
    );
    interacts.insert(
        "looping".to_string(),
        Interact::animated(
            vec![
                ImageRef::new("bridge", "camera_loop_0"),
                ImageRef::new("bridge", "camera_loop_1"),
            ],
            8,
            region.clone(),
        ),
    );
    interacts.insert(
        "dead".to_string(),
        Interact::image(ImageRef::new("bridge", "camera_dead"), region),
    );
    interacts
}

struct Camera;

impl Interactable for Camera {
    fn interact_without(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        Ok(Some(
            Outcome::message("The camera swivels to track you.").into(),
        ))
    }
}

impl ThingBehavior for Camera {
    fn is_interactive(&self, view: &StateView<'_>, _tool: Option<&str>) -> EngineResult<bool> {
        Ok(view.state().text("bridge", "ai_status")?.as_deref() == Some("online"))
    }

    fn select_interact(&self, view: &StateView<'_>) -> EngineResult<Option<String>> {
        Ok(view.state().text("bridge", "ai_status")?)
    }
}

struct Console;

impl Interactable for Console {
    fn interact_without(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        Ok(Some(Outcome::silent().with_detail("bridge.comp").into()))
    }
}

impl ThingBehavior for Console {}

struct Exit;

impl Interactable for Exit {
    fn interact_without(&self, ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        ctx.game().change_scene("cryo");
        Ok(Some(Response::Nothing))
    }
}

impl ThingBehavior for Exit {}

// ----------------------------------------------------------------------
// bridge.comp detail view

struct CompScreen;

impl SceneBehavior for CompScreen {
    fn setup(&self, setup: &mut SceneSetup<'_>) -> EngineResult<()> {
        setup.add_thing(ThingDef {
            name: "bridge.comp.loop_button".to_string(),
            folder: None,
            interacts: single(
                "idle",
                Interact::image(
                    ImageRef::new("bridge", "loop_button"),
                    HitRegion::Single(Rect::new(40, 40, 80, 40)),
                ),
            ),
            initial_interact: "idle".to_string(),
            defaults: Bucket::new(),
            behavior: Rc::new(LoopButton),
        })?;
        setup.add_thing(ThingDef {
            name: "bridge.comp.logs".to_string(),
            folder: None,
            interacts: single(
                "idle",
                Interact::invisible(HitRegion::Single(Rect::new(40, 100, 200, 120))),
            ),
            initial_interact: "idle".to_string(),
            defaults: Bucket::new(),
            behavior: Rc::new(Logs),
        })?;
        Ok(())
    }
}

struct LoopButton;

impl Interactable for LoopButton {
    fn interact_without(&self, ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        let game = ctx.game();
        if game.state().text("bridge", "ai_status")?.as_deref() != Some("online") {
            return Ok(Some(Outcome::message("The feed is already frozen.").into()));
        }
        game.state_mut().set("bridge", "ai_status", json!("looping"))?;
        game.refresh_thing("bridge.camera")?;
        Ok(Some(
            Outcome::message("Surveillance feed locked to a thirty-second loop.")
                .with_sound("beep")
                .into(),
        ))
    }
}

impl ThingBehavior for LoopButton {}

struct Logs;

impl Interactable for Logs {
    fn interact_without(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        Ok(Some(
            Outcome::message("Maintenance logs. The last entry is eighteen years old.").into(),
        ))
    }
}

impl ThingBehavior for Logs {}
