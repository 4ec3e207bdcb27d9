#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dirty-region invalidation shared by every spatial cache in Wayfarer.
//!
//! Sensing caches, path caches and influence maps all subscribe to a single
//! [`DirtyRegionHub`]. World mutation code, or the [`Invalidation`] system
//! reacting to world events, marks cells dirty and the hub fans the
//! notification out to every subscriber.

mod hub;
mod stale;

pub use hub::{DirtyListener, DirtyRegionHub, DispatchReport, ListenerError, SubscriptionToken};
pub use stale::StaleCells;

use wayfarer_core::Event;

/// Pure system translating world events into dirty marks.
#[derive(Debug, Default)]
pub struct Invalidation;

impl Invalidation {
    /// Creates a new invalidation system.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Marks every cell affected by the provided events.
    ///
    /// Terrain changes dirty their cell. Marker placement and removal dirty
    /// the marker footprint, and a move dirties the footprint at both the old
    /// and the new position. Rejected commands change nothing.
    pub fn handle(&self, events: &[Event], hub: &DirtyRegionHub) -> DispatchReport {
        let mut report = DispatchReport::default();

        for event in events {
            let dispatched = match event {
                Event::TerrainChanged { position, .. } => hub.mark_dirty(*position),
                Event::MarkerPlaced {
                    position,
                    footprint,
                    ..
                }
                | Event::MarkerRemoved {
                    position,
                    footprint,
                    ..
                } => hub.mark_dirty_area(position, *footprint),
                Event::MarkerMoved {
                    from,
                    to,
                    footprint,
                    ..
                } => {
                    let mut moved = hub.mark_dirty_area(from, *footprint);
                    moved.absorb(hub.mark_dirty_area(to, *footprint));
                    moved
                }
                Event::CommandRejected { .. } => continue,
            };
            report.absorb(dispatched);
        }

        report
    }
}
