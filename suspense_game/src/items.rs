use std::rc::Rc;

use suspense_engine::{
    Bucket, EngineResult, ImageRef, Interactable, InteractionContext, ItemBehavior,
    ItemFactoryDef, Outcome, Response,
};

/// The titanium leg unscrewed from the cryo unit's occupant. Singleton:
/// there is exactly one in the whole game.
struct TitaniumLeg;

impl Interactable for TitaniumLeg {
    fn interact_without(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        Ok(Some(
            Outcome::message("Solid titanium. Good heft to it.").into(),
        ))
    }

    fn answer_for(
        &self,
        _ctx: &mut InteractionContext<'_>,
        target: &str,
    ) -> EngineResult<Option<Response>> {
        // the door defines its own titanium_leg handler, which takes
        // precedence; this line only shows for targets that decline
        if target == "cryo.door" || target == "mess.hatch" {
            return Ok(Some(
                Outcome::message("Prying at that achieves nothing.").into(),
            ));
        }
        Ok(None)
    }
}

impl ItemBehavior for TitaniumLeg {}

struct FullCan;

impl Interactable for FullCan {
    fn interact_without(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        Ok(Some(
            Outcome::message("Sealed tight. The counter unit should open it.").into(),
        ))
    }
}

impl ItemBehavior for FullCan {}

struct EmptyCan;

impl Interactable for EmptyCan {
    fn interact_without(&self, _ctx: &mut InteractionContext<'_>) -> EngineResult<Option<Response>> {
        Ok(Some(Outcome::message("Licked clean.").into()))
    }

    fn answer_for(
        &self,
        _ctx: &mut InteractionContext<'_>,
        target: &str,
    ) -> EngineResult<Option<Response>> {
        if target == "mess.shelf" {
            return Ok(Some(
                Outcome::message("No point putting an empty can back.").into(),
            ));
        }
        Ok(None)
    }
}

impl ItemBehavior for EmptyCan {}

pub fn titanium_leg() -> ItemFactoryDef {
    ItemFactoryDef {
        key: "titanium_leg".to_string(),
        cloneable: false,
        image: Some(ImageRef::new("items", "titanium_leg")),
        defaults: Bucket::new(),
        behavior: Rc::new(TitaniumLeg),
    }
}

pub fn full_can() -> ItemFactoryDef {
    ItemFactoryDef {
        key: "full_can".to_string(),
        cloneable: true,
        image: Some(ImageRef::new("items", "full_can")),
        defaults: Bucket::new(),
        behavior: Rc::new(FullCan),
    }
}

pub fn empty_can() -> ItemFactoryDef {
    ItemFactoryDef {
        key: "empty_can".to_string(),
        cloneable: true,
        image: Some(ImageRef::new("items", "empty_can")),
        defaults: Bucket::new(),
        behavior: Rc::new(EmptyCan),
    }
}
