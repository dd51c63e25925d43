//! easel-core: retained-mode 2D scene graph — data model, affine geometry,
//! composition, and layout.
//!
//! The render pipeline and the interactive editor live in their own crates
//! (`easel-render`, `easel-editor`) and drive everything through the
//! [`scene::Scene`] API.

pub mod config;
pub mod event;
pub mod geom;
pub mod id;
pub mod intersect;
pub mod layout;
pub mod node;
pub mod paint;
pub mod scene;

pub use config::{EngineConfig, Viewport};
pub use event::{EventKind, SceneEvent};
pub use geom::{Decomposed, Matrix, Point, SingularMatrix, plane_change};
pub use id::NodeId;
pub use layout::{LayoutStrategy, perform_layout};
pub use node::{Corners, NodeKind, NodeSnapshot, Origin, Prop, SceneNode};
pub use paint::{Color, GradientStop, Paint, Shadow};
pub use scene::{ActiveTarget, Backdrop, Scene, SceneError};

// Re-export the arena handle so downstream crates don't need a direct
// petgraph dependency.
pub use petgraph::graph::NodeIndex;
