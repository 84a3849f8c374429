use std::rc::Rc;

use crate::interact::ImageRef;
use crate::state::Bucket;
use crate::thing::Interactable;

/// Behaviour of a portable item. Items answer interactions from both sides:
/// as the clicked target of another tool, and (via `answer_for`) as the
/// tool applied to a thing that declined the combination.
pub trait ItemBehavior: Interactable {}

/// Context-free description of an item factory. The factory key doubles as
/// the item's base identifier and its state key, so it must not contain the
/// `.` the clone suffix uses.
pub struct ItemFactoryDef {
    pub key: String,
    /// Cloneable factories mint `key.N` identifiers on demand; singleton
    /// factories mint the bare key exactly once.
    pub cloneable: bool,
    pub image: Option<ImageRef>,
    pub defaults: Bucket,
    pub behavior: Rc<dyn ItemBehavior>,
}

/// A live item, resolved through its factory. Identity-stable within one
/// process run: the factory caches and reuses the instance.
pub struct Item {
    pub name: String,
    pub base: String,
    pub image: Option<ImageRef>,
    pub behavior: Rc<dyn ItemBehavior>,
}

/// Base (factory key) of an item identifier: `full_can.0` -> `full_can`,
/// `titanium_leg` -> `titanium_leg`.
pub fn item_base(identifier: &str) -> &str {
    match identifier.split_once('.') {
        Some((base, _)) => base,
        None => identifier,
    }
}
