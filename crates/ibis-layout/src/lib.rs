//! IBIS layout
//!
//! Pure placement helpers for the argumentation graph:
//!
//! - [`ZoneMap`]: one radial band per category, and the constraint enforcer
//!   that projects points back into their band
//! - [`PositionAllocator`]: base coordinate + seeded jitter, clamped to the
//!   [`Canvas`]
//!
//! Nothing here performs I/O; the only external input is the injected RNG.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod allocator;
mod zone;

pub use allocator::{Canvas, LayoutConfig, PositionAllocator};
pub use zone::{LayoutError, Zone, ZoneMap};
