//! Scene composition: the canvas root, node arena, and coordinate planes.
//!
//! All nodes live in one `StableDiGraph` arena; containment is a parent →
//! child edge plus an ordered child list on the container (paint order,
//! back to front). `NodeIndex` doubles as the non-owning handle for every
//! back-reference, so there are no ownership cycles to break.
//!
//! Moving a node between planes never moves it on screen: the scene
//! computes a plane change from the node's world matrix to the destination
//! plane and bakes the result back into the node's local properties.

use crate::event::{EventKind, EventQueue, SceneEvent};
use crate::geom::{Matrix, Point, plane_change};
use crate::id::NodeId;
use crate::intersect::{polygon_contains, polygons_overlap};
use crate::layout::perform_layout;
use crate::node::{Corners, GroupState, MemberRestore, NodeKind, Prop, SceneNode};
use crate::paint::Paint;
use petgraph::Direction;
use petgraph::stable_graph::StableDiGraph;
use std::collections::HashMap;
use std::fmt;

// ─── Errors ──────────────────────────────────────────────────────────────

/// Rejected structural operations. Every variant is a no-op on the scene,
/// not a crash — callers decide whether to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The destination group is a descendant of the node being inserted.
    CyclicHierarchy { node: NodeId, group: NodeId },
    /// The node is already a child of the destination.
    DuplicateChild { node: NodeId },
    /// The destination cannot hold children.
    NotAContainer { node: NodeId },
    /// The node is not in the arena (already disposed).
    Missing,
    /// A plane-change matrix could not be inverted.
    SingularPlane,
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::CyclicHierarchy { node, group } => {
                write!(f, "adding {node} to {group} would create a cycle")
            }
            SceneError::DuplicateChild { node } => {
                write!(f, "{node} is already a member of the destination")
            }
            SceneError::NotAContainer { node } => write!(f, "{node} cannot hold children"),
            SceneError::Missing => write!(f, "node is not part of the scene"),
            SceneError::SingularPlane => write!(f, "destination plane is not invertible"),
        }
    }
}

impl std::error::Error for SceneError {}

impl From<crate::geom::SingularMatrix> for SceneError {
    fn from(_: crate::geom::SingularMatrix) -> Self {
        SceneError::SingularPlane
    }
}

// ─── Supporting types ────────────────────────────────────────────────────

pub use petgraph::graph::NodeIndex;

/// Background or overlay fill of the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub paint: Paint,
    /// Paint under the viewport transform (pans/zooms with content) instead
    /// of in raw device space.
    pub viewport_aware: bool,
}

/// What is currently selected on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTarget {
    /// A single node, selected directly.
    Node(NodeIndex),
    /// The ephemeral multi-selection group.
    Selection(NodeIndex),
}

impl ActiveTarget {
    pub fn index(&self) -> NodeIndex {
        match *self {
            ActiveTarget::Node(i) | ActiveTarget::Selection(i) => i,
        }
    }
}

// ─── Scene ───────────────────────────────────────────────────────────────

pub struct Scene {
    graph: StableDiGraph<SceneNode, ()>,
    root: NodeIndex,
    id_index: HashMap<NodeId, NodeIndex>,
    viewport: Matrix,
    pub background: Option<Backdrop>,
    pub overlay: Option<Backdrop>,
    clip_node: Option<NodeIndex>,
    selection: Option<ActiveTarget>,
    events: EventQueue,
}

impl Scene {
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_node = SceneNode::named(NodeId::named("canvas"), NodeKind::group());
        let root = graph.add_node(root_node);
        let mut id_index = HashMap::new();
        id_index.insert(NodeId::named("canvas"), root);
        Self {
            graph,
            root,
            id_index,
            viewport: Matrix::IDENTITY,
            background: None,
            overlay: None,
            clip_node: None,
            selection: None,
            events: EventQueue::default(),
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    // ─── Node access ─────────────────────────────────────────────────

    pub fn node(&self, idx: NodeIndex) -> Option<&SceneNode> {
        self.graph.node_weight(idx)
    }

    /// Panics when the node was disposed; internal callers hold live
    /// indices by construction.
    pub fn node_ref(&self, idx: NodeIndex) -> &SceneNode {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut SceneNode {
        &mut self.graph[idx]
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    /// Apply one property to a node. Returns whether anything changed.
    pub fn set_prop(&mut self, idx: NodeIndex, prop: Prop) -> bool {
        self.graph[idx].set(prop)
    }

    pub fn set_props<I: IntoIterator<Item = Prop>>(&mut self, idx: NodeIndex, props: I) -> bool {
        self.graph[idx].set_many(props)
    }

    // ─── Structure ───────────────────────────────────────────────────

    /// Insert a node into the arena without attaching it anywhere.
    pub fn adopt(&mut self, node: SceneNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        idx
    }

    /// Add a fresh node at the top of `container`'s paint order. The node's
    /// placement properties are read as container-plane coordinates.
    pub fn add(&mut self, container: NodeIndex, node: SceneNode) -> Result<NodeIndex, SceneError> {
        let len = self.children(container).len();
        self.insert_at(container, node, len)
    }

    /// Add a fresh node at a specific paint position.
    pub fn insert_at(
        &mut self,
        container: NodeIndex,
        node: SceneNode,
        index: usize,
    ) -> Result<NodeIndex, SceneError> {
        self.check_container(container)?;
        let idx = self.adopt(node);
        self.attach(idx, container, index)?;
        self.after_membership_change(container, idx, EventKind::Added);
        Ok(idx)
    }

    fn check_container(&self, container: NodeIndex) -> Result<(), SceneError> {
        let node = self.graph.node_weight(container).ok_or(SceneError::Missing)?;
        if node.group_state().is_none() {
            return Err(SceneError::NotAContainer { node: node.id });
        }
        Ok(())
    }

    pub fn parent_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    /// Paint order of a container, back to front. Empty for non-groups.
    pub fn children(&self, container: NodeIndex) -> &[NodeIndex] {
        self.graph
            .node_weight(container)
            .and_then(|n| n.group_state())
            .map(|g| g.children.as_slice())
            .unwrap_or(&[])
    }

    /// Walk ancestors of `descendant` looking for `ancestor`.
    pub fn is_ancestor_of(&self, ancestor: NodeIndex, descendant: NodeIndex) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = descendant;
        while let Some(parent) = self.parent_of(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    fn attach(
        &mut self,
        node: NodeIndex,
        container: NodeIndex,
        index: usize,
    ) -> Result<(), SceneError> {
        let container_id = self.graph[container].id;
        if self.graph[container].group_state().is_none() {
            return Err(SceneError::NotAContainer { node: container_id });
        }
        let node_id = self.graph[node].id;
        if node == container || self.is_ancestor_of(node, container) {
            return Err(SceneError::CyclicHierarchy {
                node: node_id,
                group: container_id,
            });
        }
        if self.children(container).contains(&node) {
            return Err(SceneError::DuplicateChild { node: node_id });
        }
        self.graph.add_edge(container, node, ());
        let state = self.graph[container].group_state_mut().expect("checked above");
        let index = index.min(state.children.len());
        state.children.insert(index, node);
        Ok(())
    }

    /// Unlink `node` from its container, leaving it standalone in the
    /// arena. Returns the old container.
    fn detach(&mut self, node: NodeIndex) -> Option<NodeIndex> {
        let parent = self.parent_of(node)?;
        if let Some(edge) = self.graph.find_edge(parent, node) {
            self.graph.remove_edge(edge);
        }
        if let Some(state) = self.graph[parent].group_state_mut()
            && let Some(pos) = state.children.iter().position(|&c| c == node)
        {
            state.children.remove(pos);
        }
        Some(parent)
    }

    fn after_membership_change(&mut self, container: NodeIndex, node: NodeIndex, kind: EventKind) {
        self.push_event(kind, node);
        if container != self.root {
            perform_layout(self, container);
        }
    }

    // ─── Plane changes ───────────────────────────────────────────────

    /// The matrix of a container's coordinate plane. The root plane is the
    /// world plane.
    pub fn plane_matrix(&mut self, container: NodeIndex) -> Matrix {
        if container == self.root {
            Matrix::IDENTITY
        } else {
            self.full_matrix(container)
        }
    }

    /// Decompose `m` into the node's local properties, resetting flips
    /// (their sign folds into scale) and re-anchoring by the node's own
    /// origin.
    pub fn bake_transform(&mut self, idx: NodeIndex, m: &Matrix) {
        let parts = m.decompose();
        let node = &mut self.graph[idx];
        node.set_many([
            Prop::FlipX(false),
            Prop::FlipY(false),
            Prop::ScaleX(parts.scale_x),
            Prop::ScaleY(parts.scale_y),
            Prop::SkewX(parts.skew_x),
            Prop::SkewY(parts.skew_y),
            Prop::Angle(parts.angle),
        ]);
        node.set_position_by_origin(Point::new(parts.translate_x, parts.translate_y), Point::ZERO);
    }

    /// Move a node into a group. With `preserve_position` (the default
    /// behavior for interactive grouping) the node's world transform is
    /// re-expressed against the group plane so it does not visually move;
    /// without it the node's current properties are read as group-plane
    /// coordinates as-is.
    pub fn enter_group(
        &mut self,
        node: NodeIndex,
        group: NodeIndex,
        preserve_position: bool,
    ) -> Result<(), SceneError> {
        if self.graph.node_weight(node).is_none() || self.graph.node_weight(group).is_none() {
            return Err(SceneError::Missing);
        }
        let group_id = self.graph[group].id;
        if self.graph[group].group_state().is_none() {
            return Err(SceneError::NotAContainer { node: group_id });
        }
        if node == group || self.is_ancestor_of(node, group) {
            return Err(SceneError::CyclicHierarchy {
                node: self.graph[node].id,
                group: group_id,
            });
        }
        if self.children(group).contains(&node) {
            return Err(SceneError::DuplicateChild {
                node: self.graph[node].id,
            });
        }

        let world = self.full_matrix(node);
        if let Some(old) = self.detach(node) {
            self.layout_unless_selection(old);
        }
        let plane = self.plane_matrix(group);
        let len = self.children(group).len();
        self.attach(node, group, len)?;
        if preserve_position {
            let local = plane_change(&world, &plane)?;
            self.bake_transform(node, &local);
        }
        self.after_membership_change(group, node, EventKind::Added);
        Ok(())
    }

    /// Move a node out of its group into the group's own container,
    /// preserving its on-screen position. The mirror of [`Self::enter_group`].
    pub fn exit_group(&mut self, node: NodeIndex) -> Result<(), SceneError> {
        let parent = self.parent_of(node).ok_or(SceneError::Missing)?;
        if parent == self.root {
            // Already at the top level; nothing to exit from.
            return Ok(());
        }
        let dest = self.parent_of(parent).unwrap_or(self.root);
        let world = self.full_matrix(node);
        self.detach(node);
        self.layout_unless_selection(parent);
        let plane = self.plane_matrix(dest);
        let len = self.children(dest).len();
        self.attach(node, dest, len)?;
        let local = plane_change(&world, &plane)?;
        self.bake_transform(node, &local);
        self.after_membership_change(dest, node, EventKind::Added);
        Ok(())
    }

    /// Collect existing nodes into a new group at the top of the root paint
    /// order. Members keep their on-screen positions.
    pub fn group_nodes(&mut self, members: &[NodeIndex]) -> Result<NodeIndex, SceneError> {
        let group = self.add(self.root, SceneNode::new(NodeKind::group()))?;
        for &member in members {
            self.enter_group(member, group, true)?;
        }
        Ok(group)
    }

    /// Unlink a node from its container entirely, re-expressing its
    /// transform against the world plane so it keeps its coordinates.
    pub fn remove_from_parent(&mut self, node: NodeIndex) -> Result<(), SceneError> {
        if self.parent_of(node).is_none() {
            return Ok(());
        }
        let world = self.full_matrix(node);
        let old = self.detach(node).expect("parent checked above");
        self.layout_unless_selection(old);
        self.bake_transform(node, &world);
        self.push_event(EventKind::Removed, node);
        Ok(())
    }

    /// Drop a node (and its whole subtree) from the arena, releasing every
    /// derived resource reference.
    pub fn dispose(&mut self, node: NodeIndex) {
        let children: Vec<NodeIndex> = self.children(node).to_vec();
        for child in children {
            self.dispose(child);
        }
        if self.clip_node == Some(node) {
            self.clip_node = None;
        }
        if self.selection.map(|s| s.index()) == Some(node) {
            self.selection = None;
        }
        self.push_event(EventKind::Removed, node);
        self.detach(node);
        if let Some(n) = self.graph.remove_node(node) {
            self.id_index.remove(&n.id);
        }
    }

    fn layout_unless_selection(&mut self, container: NodeIndex) {
        if container == self.root {
            return;
        }
        let is_selection = self
            .graph
            .node_weight(container)
            .and_then(|n| n.group_state())
            .is_some_and(|g| g.selection);
        if !is_selection {
            perform_layout(self, container);
        }
    }

    // ─── Z-order ─────────────────────────────────────────────────────

    fn slot_of(&self, node: NodeIndex) -> Option<(NodeIndex, usize)> {
        let parent = self.parent_of(node)?;
        let pos = self.children(parent).iter().position(|&c| c == node)?;
        Some((parent, pos))
    }

    /// Move a node to an explicit paint position within its container.
    pub fn move_to(&mut self, node: NodeIndex, index: usize) -> bool {
        let Some((parent, pos)) = self.slot_of(node) else {
            return false;
        };
        let state = self.graph[parent].group_state_mut().expect("parent is a container");
        let index = index.min(state.children.len() - 1);
        if index == pos {
            return false;
        }
        state.children.remove(pos);
        state.children.insert(index, node);
        true
    }

    pub fn bring_to_front(&mut self, node: NodeIndex) -> bool {
        match self.slot_of(node) {
            Some((parent, _)) => {
                let last = self.children(parent).len() - 1;
                self.move_to(node, last)
            }
            None => false,
        }
    }

    pub fn send_to_back(&mut self, node: NodeIndex) -> bool {
        self.move_to(node, 0)
    }

    /// Move one slot up, or — when `intersecting` — directly above the
    /// nearest sibling whose bounding quad overlaps this node's.
    pub fn bring_forward(&mut self, node: NodeIndex, intersecting: bool) -> bool {
        let Some((parent, pos)) = self.slot_of(node) else {
            return false;
        };
        let len = self.children(parent).len();
        if pos + 1 >= len {
            return false;
        }
        let new_index = if intersecting {
            match self.nearest_overlap(parent, node, pos, true) {
                Some(j) => j,
                None => return false,
            }
        } else {
            pos + 1
        };
        self.move_to(node, new_index)
    }

    /// Move one slot down, or — when `intersecting` — directly below the
    /// nearest overlapping sibling.
    pub fn send_backwards(&mut self, node: NodeIndex, intersecting: bool) -> bool {
        let Some((parent, pos)) = self.slot_of(node) else {
            return false;
        };
        if pos == 0 {
            return false;
        }
        let new_index = if intersecting {
            match self.nearest_overlap(parent, node, pos, false) {
                Some(j) => j,
                None => return false,
            }
        } else {
            pos - 1
        };
        self.move_to(node, new_index)
    }

    fn nearest_overlap(
        &mut self,
        parent: NodeIndex,
        node: NodeIndex,
        pos: usize,
        forward: bool,
    ) -> Option<usize> {
        let quad = self.absolute_corners(node).loop_points();
        let siblings: Vec<NodeIndex> = self.children(parent).to_vec();
        let candidates: Vec<usize> = if forward {
            (pos + 1..siblings.len()).collect()
        } else {
            (0..pos).rev().collect()
        };
        for j in candidates {
            let other = self.absolute_corners(siblings[j]).loop_points();
            if polygons_overlap(&quad, &other) {
                return Some(j);
            }
        }
        None
    }

    // ─── Matrices and corners ────────────────────────────────────────

    /// Chained fingerprint of the node's own properties and its whole
    /// ancestor path. Matrix and corner caches are valid exactly while
    /// this value is unchanged.
    pub fn full_fingerprint(&self, idx: NodeIndex) -> u64 {
        let own = self.graph[idx].transform_fingerprint();
        match self.parent_of(idx) {
            Some(p) if p != self.root => {
                use std::hash::{Hash, Hasher};
                let mut h = std::hash::DefaultHasher::new();
                own.hash(&mut h);
                self.full_fingerprint(p).hash(&mut h);
                h.finish()
            }
            _ => own,
        }
    }

    /// Node-local transform (object plane → parent plane), memoized on the
    /// node.
    pub fn own_matrix(&mut self, idx: NodeIndex) -> Matrix {
        self.graph[idx].own_matrix()
    }

    /// Ancestor-inclusive transform (object plane → world plane), memoized
    /// against [`Self::full_fingerprint`]. The viewport transform is never
    /// part of this.
    pub fn full_matrix(&mut self, idx: NodeIndex) -> Matrix {
        let key = self.full_fingerprint(idx);
        if let Some(m) = self.graph[idx].full_memo_get(key) {
            return m;
        }
        let own = self.graph[idx].own_matrix();
        let value = match self.parent_of(idx) {
            Some(p) if p != self.root => self.full_matrix(p).multiply(&own),
            _ => own,
        };
        self.graph[idx].full_memo_put(key, value);
        value
    }

    /// World-plane corners of the node's bounding quad, stable under
    /// viewport pan/zoom. Recomputed only on fingerprint mismatch.
    pub fn absolute_corners(&mut self, idx: NodeIndex) -> Corners {
        let key = self.full_fingerprint(idx);
        if let Some((k, c)) = self.graph[idx].corners_memo
            && k == key
        {
            return c;
        }
        let local = self.graph[idx].parent_plane_corners();
        let corners = match self.parent_of(idx) {
            Some(p) if p != self.root => {
                let m = self.full_matrix(p);
                local.map(|pt| m.transform_point(pt))
            }
            _ => local,
        };
        self.graph[idx].corners_memo = Some((key, corners));
        corners
    }

    /// Force-refresh the stored corner set.
    pub fn set_coords(&mut self, idx: NodeIndex) {
        self.graph[idx].corners_memo = None;
        let _ = self.absolute_corners(idx);
    }

    /// Viewport-applied corners, the basis for hit tests and culling.
    pub fn screen_corners(&mut self, idx: NodeIndex) -> Corners {
        let abs = self.absolute_corners(idx);
        let vpt = self.viewport;
        abs.map(|p| vpt.transform_point(p))
    }

    /// Screen corners expanded by `padding` device pixels along the node's
    /// own screen-space axes. For handle and border hit regions only —
    /// containment tests use the unpadded quad.
    pub fn screen_corners_padded(&mut self, idx: NodeIndex, padding: f64) -> Corners {
        let c = self.screen_corners(idx);
        if padding == 0.0 {
            return c;
        }
        let width = c.tl.distance(c.tr);
        let height = c.tl.distance(c.bl);
        if width < crate::geom::EPSILON || height < crate::geom::EPSILON {
            return c;
        }
        let u = (c.tr - c.tl) * (1.0 / width);
        let v = (c.bl - c.tl) * (1.0 / height);
        Corners {
            tl: c.tl - u * padding - v * padding,
            tr: c.tr + u * padding - v * padding,
            bl: c.bl - u * padding + v * padding,
            br: c.br + u * padding + v * padding,
        }
    }

    /// Screen-space containment against the node's bounding quad.
    pub fn contains_point(&mut self, idx: NodeIndex, point: Point) -> bool {
        let corners = self.screen_corners(idx).loop_points();
        polygon_contains(&corners, point)
    }

    /// Topmost selectable node at a screen-space point, walking the root's
    /// paint order front to back. Group members hit as their group.
    pub fn hit_test(&mut self, point: Point) -> Option<NodeIndex> {
        let top_level: Vec<NodeIndex> = self.children(self.root).to_vec();
        for idx in top_level.into_iter().rev() {
            let node = &self.graph[idx];
            if !node.visible || !node.selectable {
                continue;
            }
            if self.contains_point(idx, point) {
                return Some(idx);
            }
        }
        None
    }

    // ─── Viewport ────────────────────────────────────────────────────

    pub fn viewport_transform(&self) -> Matrix {
        self.viewport
    }

    pub fn set_viewport_transform(&mut self, m: Matrix) {
        self.viewport = m;
    }

    /// Undo the viewport transform on a device-space pointer position.
    /// Falls back to the raw position when the viewport is degenerate.
    pub fn restore_pointer_vpt(&self, p: Point) -> Point {
        match self.viewport.invert() {
            Ok(inv) => inv.transform_point(p),
            Err(_) => p,
        }
    }

    // ─── Clip node ───────────────────────────────────────────────────

    pub fn clip_node(&self) -> Option<NodeIndex> {
        self.clip_node
    }

    /// Use a standalone arena node as the canvas clip mask.
    pub fn set_clip_node(&mut self, idx: Option<NodeIndex>) {
        self.clip_node = idx;
    }

    // ─── Selection ───────────────────────────────────────────────────

    pub fn active_target(&self) -> Option<ActiveTarget> {
        self.selection
    }

    /// Select a single node, replacing any previous selection wholesale.
    pub fn set_active_node(&mut self, idx: NodeIndex) {
        self.discard_active_selection();
        self.selection = Some(ActiveTarget::Node(idx));
        self.push_event(EventKind::Selected, idx);
    }

    /// Aggregate several nodes into the ephemeral selection group. Members
    /// keep a restore record and return to their original containers when
    /// the selection is discarded.
    pub fn select_nodes(&mut self, nodes: &[NodeIndex]) -> Option<ActiveTarget> {
        self.discard_active_selection();
        match nodes {
            [] => None,
            [single] => {
                self.set_active_node(*single);
                self.selection
            }
            members => {
                let sel_node = SceneNode::new(NodeKind::Group(GroupState {
                    selection: true,
                    ..GroupState::default()
                }));
                // Record every member's slot before any of them moves, so
                // restore indices refer to the untouched paint order.
                let restores: Vec<Option<MemberRestore>> = members
                    .iter()
                    .map(|&member| {
                        self.slot_of(member).map(|(parent, index)| MemberRestore {
                            member,
                            prior_parent: parent,
                            prior_index: index,
                        })
                    })
                    .collect();
                let sel = self
                    .add(self.root, sel_node)
                    .expect("root accepts children");
                for (&member, restore) in members.iter().zip(restores) {
                    if self.enter_group(member, sel, true).is_err() {
                        log::warn!("selection skipped unattachable node {:?}", member);
                        continue;
                    }
                    if let Some(r) = restore
                        && let Some(state) = self.graph[sel].group_state_mut()
                    {
                        state.restore.push(r);
                    }
                    self.push_event(EventKind::Selected, member);
                }
                perform_layout(self, sel);
                self.selection = Some(ActiveTarget::Selection(sel));
                self.selection
            }
        }
    }

    /// Dissolve the current selection. Multi-selection members re-enter
    /// their original containers at their original paint positions.
    pub fn discard_active_selection(&mut self) {
        match self.selection.take() {
            None => {}
            Some(ActiveTarget::Node(idx)) => {
                self.push_event(EventKind::Deselected, idx);
            }
            Some(ActiveTarget::Selection(sel)) => {
                let mut restores: Vec<MemberRestore> = self
                    .graph
                    .node_weight(sel)
                    .and_then(|n| n.group_state())
                    .map(|g| g.restore.to_vec())
                    .unwrap_or_default();
                // Ascending order makes each original index valid again by
                // the time its member is re-inserted.
                restores.sort_by_key(|r| r.prior_index);
                for r in &restores {
                    if self.graph.node_weight(r.member).is_none() {
                        continue;
                    }
                    if self.enter_group(r.member, r.prior_parent, true).is_ok() {
                        self.move_to(r.member, r.prior_index);
                    }
                    self.push_event(EventKind::Deselected, r.member);
                }
                // Members the restore list missed fall back to the root.
                let leftovers: Vec<NodeIndex> = self.children(sel).to_vec();
                for member in leftovers {
                    let _ = self.enter_group(member, self.root, true);
                    self.push_event(EventKind::Deselected, member);
                }
                self.dispose(sel);
            }
        }
    }

    // ─── Events ──────────────────────────────────────────────────────

    pub fn push_event(&mut self, kind: EventKind, target: NodeIndex) {
        let name = match self.graph.node_weight(target) {
            Some(n) => n.id,
            None => return,
        };
        self.events.push(kind, target, name);
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.events.drain()
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────
