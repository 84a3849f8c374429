//! Content for the derelict-ship demo game: three scenes, one detail view
//! and three item factories wired onto `suspense_engine`. The binary in
//! `main.rs` drives it headless; integration tests drive it the same way.

use std::rc::Rc;

use suspense_engine::{EngineResult, Game, Outcome, SoundService};

pub mod assets;
pub mod items;
pub mod scenes;

pub const START_SCENE: &str = "cryo";

/// Registers all factories, scenes and detail views on a fresh game. The
/// caller decides when to `start`.
pub fn build_game(sound: Rc<dyn SoundService>) -> EngineResult<Game> {
    let mut game = Game::new(sound);
    game.register_factory(items::titanium_leg())?;
    game.register_factory(items::full_can())?;
    game.register_factory(items::empty_can())?;
    game.register_scene(scenes::cryo::def())?;
    game.register_scene(scenes::mess::def())?;
    game.register_scene(scenes::bridge::def())?;
    game.register_detail(scenes::bridge::comp_def())?;
    Ok(game)
}

/// Scripted solve of the demo content, start to finish. Returns every
/// outcome the run produced, in order.
pub fn run_walkthrough(game: &mut Game) -> EngineResult<Vec<Outcome>> {
    let mut outcomes = Vec::new();
    fn step(result: EngineResult<Vec<Outcome>>, sink: &mut Vec<Outcome>) -> EngineResult<()> {
        result.map(|batch| sink.extend(batch))
    }

    step(game.start(START_SCENE), &mut outcomes)?;

    // cryo: loot the leg, pry the door, walk through
    step(game.interact_thing("cryo.unit", None), &mut outcomes)?;
    game.set_tool(Some("titanium_leg"))?;
    step(game.interact_thing("cryo.door", Some("titanium_leg")), &mut outcomes)?;
    game.set_tool(None)?;
    step(game.interact_thing("cryo.door", None), &mut outcomes)?;
    step(game.pump(), &mut outcomes)?;

    // bridge: freeze the surveillance feed from the console
    step(game.interact_thing("bridge.console", None), &mut outcomes)?;
    step(game.pump(), &mut outcomes)?;
    step(
        game.interact_thing("bridge.comp.loop_button", None),
        &mut outcomes,
    )?;
    step(game.close_detail(), &mut outcomes)?;
    step(game.interact_thing("bridge.exit", None), &mut outcomes)?;
    step(game.pump(), &mut outcomes)?;

    // mess: stock up and eat
    step(game.interact_thing("cryo.hatch", None), &mut outcomes)?;
    step(game.pump(), &mut outcomes)?;
    step(game.interact_thing("mess.shelf", None), &mut outcomes)?;
    game.set_tool(Some("full_can.0"))?;
    step(
        game.interact_thing("mess.counter", Some("full_can.0")),
        &mut outcomes,
    )?;
    game.set_tool(None)?;

    Ok(outcomes)
}
