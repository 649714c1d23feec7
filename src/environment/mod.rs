//! Spatial object storage and the frame loop that drives it: tiles and
//! layers ([`tile`]), the container bucketing objects by both
//! ([`container`]), the dispatcher-integrated [`Environment`], a virtual
//! [`TimeKeeper`], and the [`FrameLoop`] that ties a clock to an
//! environment for one tick at a time.

mod container;
mod environment;
mod frame_loop;
mod tile;
mod time_keeper;

pub use container::{ObjectContainer, BATCH_COST_GOAL};
pub use environment::Environment;
pub use frame_loop::{FrameLoop, ForcedOverride};
pub use tile::{Layer, TileCoord, LAYERS};
pub use time_keeper::TimeKeeper;
