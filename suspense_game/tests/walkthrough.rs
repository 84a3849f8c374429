use std::rc::Rc;

use anyhow::Result;
use suspense_engine::save::load;
use suspense_engine::{Game, NullSoundService, RecordingSoundService, ResourceLoader};
use tempfile::tempdir;

use suspense_game::{assets, build_game, run_walkthrough, START_SCENE};

fn fresh_game() -> Result<Game> {
    let mut game = build_game(Rc::new(NullSoundService))?;
    game.start(START_SCENE)?;
    Ok(game)
}

#[test]
fn closed_door_by_hand_changes_nothing() -> Result<()> {
    let mut game = fresh_game()?;
    let before = game.state().export();

    let outcomes = game.interact_thing("cryo.door", None)?;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].message.is_some());
    assert!(!game.state().flag("cryo.door", "open")?);
    assert!(!game.state().flag("bridge", "accessible")?);
    assert_eq!(game.state().export(), before);
    Ok(())
}

#[test]
fn titanium_leg_opens_the_door() -> Result<()> {
    let mut game = fresh_game()?;
    game.interact_thing("cryo.unit", None)?;
    assert_eq!(game.inventory()?, ["titanium_leg"]);
    game.set_tool(Some("titanium_leg"))?;

    let outcomes = game.interact_thing("cryo.door", Some("titanium_leg"))?;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].message.is_none());
    assert_eq!(outcomes[0].sound.as_deref(), Some("prybar"));
    assert!(game.state().flag("cryo.door", "open")?);
    assert!(game.state().flag("bridge", "accessible")?);
    let door = game.scene("cryo")?.thing("cryo.door").expect("door bound");
    assert_eq!(door.current_interact(), "open");

    // the door's own handler beat the leg's inverse one
    game.set_tool(None)?;
    game.interact_thing("cryo.door", None)?;
    game.pump()?;
    assert_eq!(game.current_scene(), Some("bridge"));
    Ok(())
}

#[test]
fn overlapping_regions_resolve_to_the_earlier_thing() -> Result<()> {
    let mut game = fresh_game()?;
    // point inside both the pipes and the door; the pipes were added first
    assert_eq!(game.thing_at((330, 100))?.as_deref(), Some("cryo.pipes"));
    let outcomes = game.click((330, 100))?;
    assert_eq!(
        outcomes[0].message.as_deref(),
        Some("Frost-caked coolant pipes.")
    );
    Ok(())
}

#[test]
fn shelf_yields_exactly_three_cans() -> Result<()> {
    let mut game = fresh_game()?;
    for _ in 0..3 {
        game.interact_thing("mess.shelf", None)?;
    }
    assert_eq!(
        game.inventory()?,
        ["full_can.0", "full_can.1", "full_can.2"]
    );

    let outcomes = game.interact_thing("mess.shelf", None)?;
    assert_eq!(outcomes[0].message.as_deref(), Some("No more cans back there."));
    assert_eq!(game.inventory()?.len(), 3);
    Ok(())
}

#[test]
fn counter_swaps_the_held_can_in_place() -> Result<()> {
    let mut game = fresh_game()?;
    game.interact_thing("mess.shelf", None)?;
    game.interact_thing("mess.shelf", None)?;
    game.set_tool(Some("full_can.0"))?;

    let outcomes = game.interact_thing("mess.counter", Some("full_can.0"))?;
    assert_eq!(outcomes[0].sound.as_deref(), Some("can_open"));
    assert_eq!(game.inventory()?, ["empty_can.0", "full_can.1"]);
    assert_eq!(game.tool(), Some("empty_can.0"));
    Ok(())
}

#[test]
fn empty_can_answers_for_the_shelf() -> Result<()> {
    let mut game = fresh_game()?;
    game.interact_thing("mess.shelf", None)?;
    game.set_tool(Some("full_can.0"))?;
    game.interact_thing("mess.counter", Some("full_can.0"))?;

    let outcomes = game.interact_thing("mess.shelf", Some("empty_can.0"))?;
    assert_eq!(
        outcomes[0].message.as_deref(),
        Some("No point putting an empty can back.")
    );
    Ok(())
}

#[test]
fn console_detail_gates_the_camera() -> Result<()> {
    let mut game = fresh_game()?;
    game.interact_thing("bridge.console", None)?;
    assert!(game.has_pending_change());
    game.pump()?;
    assert_eq!(game.detail_stack(), ["bridge.comp"]);

    game.interact_thing("bridge.comp.loop_button", None)?;
    assert_eq!(
        game.state().text("bridge", "ai_status")?.as_deref(),
        Some("looping")
    );
    let camera = game
        .scene("bridge")?
        .thing("bridge.camera")
        .expect("camera bound");
    assert_eq!(camera.current_interact(), "looping");

    // a looping camera no longer reacts
    let outcomes = game.interact_thing("bridge.camera", None)?;
    assert!(outcomes.is_empty());

    game.close_detail()?;
    assert!(game.detail_stack().is_empty());
    Ok(())
}

#[test]
fn walkthrough_save_and_restore_round_trips() -> Result<()> {
    let dir = tempdir()?;
    let mut game = build_game(Rc::new(NullSoundService))?;
    run_walkthrough(&mut game)?;
    let exported = game.state().export();
    game.save_to(dir.path(), "slot0")?;

    let restored_state = load(dir.path(), "slot0")?.expect("slot exists");
    let mut restored = build_game(Rc::new(NullSoundService))?;
    restored.restore(restored_state)?;

    assert_eq!(restored.state().export(), exported);
    assert_eq!(restored.current_scene(), Some("mess"));
    assert_eq!(restored.tool(), None);
    assert_eq!(restored.inventory()?, ["titanium_leg", "empty_can.0"]);
    let door = restored.scene("cryo")?.thing("cryo.door").expect("door");
    assert_eq!(door.current_interact(), "open");

    // clone numbering continues from the persisted record, not from zero
    restored.interact_thing("mess.shelf", None)?;
    assert!(restored.inventory()?.contains(&"full_can.1".to_string()));
    Ok(())
}

#[test]
fn missing_save_slot_loads_as_none() -> Result<()> {
    let dir = tempdir()?;
    assert!(load(dir.path(), "nope")?.is_none());
    Ok(())
}

#[test]
fn walkthrough_plays_cues_in_story_order() -> Result<()> {
    let recorder = RecordingSoundService::new();
    let mut game = build_game(Rc::new(recorder.clone()))?;
    run_walkthrough(&mut game)?;
    assert_eq!(recorder.cues(), ["servo", "prybar", "beep", "can_open"]);
    Ok(())
}

#[test]
fn every_referenced_asset_is_in_the_manifest() -> Result<()> {
    let game = build_game(Rc::new(NullSoundService))?;
    let loader = assets::manifest();
    game.validate_resources(&loader)?;
    loader.get_font("prompt", 16)?;
    Ok(())
}
