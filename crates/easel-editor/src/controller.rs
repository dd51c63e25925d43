//! The pointer state machine: Idle → hit-testing on pointer-down →
//! TransformActive → commit on pointer-up.
//!
//! On pointer-down the controller asks, in order: is the pointer over the
//! active target's handles? over some node's body? over empty space? The
//! answer opens a transform session, replaces the selection, or clears it.

use crate::actions::apply_action;
use crate::controls::{Action, ControlHit, Handle, find_control};
use crate::input::{InputEvent, Modifiers};
use crate::session::TransformSession;
use easel_core::config::EngineConfig;
use easel_core::event::EventKind;
use easel_core::geom::Point;
use easel_core::scene::{ActiveTarget, Scene};
use easel_core::NodeIndex;

/// Where the controller currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    TransformActive,
}

pub struct PointerController {
    config: EngineConfig,
    session: Option<TransformSession>,
}

impl PointerController {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        if self.session.is_some() {
            ControllerState::TransformActive
        } else {
            ControllerState::Idle
        }
    }

    pub fn session(&self) -> Option<&TransformSession> {
        self.session.as_ref()
    }

    /// Feed one input event. Returns whether the scene changed and a
    /// render should be requested.
    pub fn handle(&mut self, scene: &mut Scene, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { .. } => {
                self.pointer_down(scene, event.position(), &event.modifiers())
            }
            InputEvent::PointerMove { .. } => self.pointer_move(scene, event.position()),
            InputEvent::PointerUp { .. } => self.pointer_up(scene),
        }
    }

    /// Tear down an in-flight session outside of pointer-up, e.g. from a
    /// key command. Commits whatever the session already applied.
    pub fn end_transform(&mut self, scene: &mut Scene) {
        self.commit(scene);
    }

    // ─── States ──────────────────────────────────────────────────────

    fn pointer_down(&mut self, scene: &mut Scene, device: Point, modifiers: &Modifiers) -> bool {
        // A stray down while a session is open: close the old one first.
        if self.session.is_some() {
            self.commit(scene);
        }
        let pointer = scene.restore_pointer_vpt(device);

        // Handles of the active target win over body hits.
        if let Some(target) = scene.active_target() {
            let idx = target.index();
            if scene.node(idx).is_some()
                && let Some(hit) =
                    find_control(scene, idx, device, modifiers, self.config.control_padding)
            {
                self.begin(scene, idx, hit, pointer);
                return false;
            }
        }

        match scene.hit_test(device) {
            Some(hit_idx) => {
                let changed = self.update_selection(scene, hit_idx, modifiers);
                // Whatever is now active starts a drag session.
                if let Some(target) = scene.active_target() {
                    let idx = target.index();
                    let hit = ControlHit {
                        handle: Handle::TopLeft, // unused for drags
                        action: Action::Drag,
                        anchor: Point::ZERO,
                    };
                    self.begin(scene, idx, hit, pointer);
                }
                changed
            }
            None => {
                // Empty space: selection goes away.
                let had = scene.active_target().is_some();
                scene.discard_active_selection();
                had
            }
        }
    }

    fn update_selection(
        &mut self,
        scene: &mut Scene,
        hit_idx: NodeIndex,
        modifiers: &Modifiers,
    ) -> bool {
        let current = scene.active_target();
        if modifiers.shift {
            // Shift-click: toggle membership of a multi-selection.
            let mut members: Vec<NodeIndex> = match current {
                None => vec![],
                Some(ActiveTarget::Node(n)) => vec![n],
                Some(ActiveTarget::Selection(sel)) => scene.children(sel).to_vec(),
            };
            if let Some(pos) = members.iter().position(|&m| m == hit_idx) {
                members.remove(pos);
            } else {
                members.push(hit_idx);
            }
            scene.select_nodes(&members);
            return true;
        }
        match current {
            // Clicking inside the current target keeps it (drag follows).
            Some(t) if t.index() == hit_idx => false,
            Some(ActiveTarget::Selection(sel)) if scene.children(sel).contains(&hit_idx) => false,
            _ => {
                scene.set_active_node(hit_idx);
                true
            }
        }
    }

    fn begin(&mut self, scene: &mut Scene, idx: NodeIndex, hit: ControlHit, pointer: Point) {
        let default_snap = self.config.snap_angle.map(|a| (a, self.config.snap_threshold));
        let session = TransformSession::begin(scene, idx, &hit, pointer, default_snap);
        log::debug!("transform session open: {:?} on {:?}", session.action, idx);
        self.session = Some(session);
    }

    fn pointer_move(&mut self, scene: &mut Scene, device: Point) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let pointer = scene.restore_pointer_vpt(device);
        apply_action(scene, session, pointer)
    }

    fn pointer_up(&mut self, scene: &mut Scene) -> bool {
        let had = self.session.is_some();
        self.commit(scene);
        had
    }

    fn commit(&mut self, scene: &mut Scene) {
        if let Some(session) = self.session.take() {
            if session.performed {
                scene.set_coords(session.target);
                scene.push_event(EventKind::Modified, session.target);
            }
            log::debug!("transform session closed on {:?}", session.target);
        }
    }
}
