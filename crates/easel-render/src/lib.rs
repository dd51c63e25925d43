//! easel-render: render pipeline, raster cache, and drawing-surface
//! backends for the easel scene graph.

pub mod cache;
pub mod draw;
pub mod pipeline;
pub mod record;
pub mod surface;
pub mod vello;

pub use cache::{CacheDims, CacheRecord, RasterCache};
pub use pipeline::{HANDLE_SIZE, ROTATE_HANDLE_OFFSET, Renderer};
pub use record::{DrawCmd, MemoryOffscreenStore, RecordingSurface};
pub use surface::{
    BasicFillResolver, BitmapId, CompositeMode, DisabledOffscreenStore, FillResolver, FrameHandle,
    FramePump, FrameScheduler, OffscreenStore, Surface,
};
pub use self::vello::VelloSurface;
