//! easel-editor: pointer-driven interactive transforms for the easel
//! scene graph — handle hit-testing, transform sessions, and the
//! drag/scale/rotate/skew action handlers.

pub mod actions;
pub mod controller;
pub mod controls;
pub mod input;
pub mod session;

pub use actions::apply_action;
pub use controller::{ControllerState, PointerController};
pub use controls::{Action, ControlHit, Handle, find_control};
pub use input::{InputEvent, Modifiers};
pub use session::TransformSession;
