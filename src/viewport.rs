/// Viewport contract consumed by the overlay pipeline.
///
/// The map camera itself belongs to the host (a mapping library, or the demo
/// viewer's Web-Mercator camera). The overlay only consumes a projection
/// snapshot plus a stream of change events, and must never cache projected
/// pixel coordinates across render passes.
use std::collections::VecDeque;

use glam::Vec2;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Visible geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn contains(&self, pos: LatLng) -> bool {
        pos.lat >= self.south
            && pos.lat <= self.north
            && pos.lng >= self.west
            && pos.lng <= self.east
    }
}

/// Camera state snapshot the overlay reads during a render pass.
///
/// Projection results are valid only until the next viewport change; the
/// surface re-projects every source inside every pass.
pub trait MapViewport {
    /// Current viewport size in physical pixels.
    fn size_px(&self) -> (u32, u32);

    /// Current zoom level (slippy-map convention, higher = closer).
    fn zoom(&self) -> f64;

    /// Geographic position to on-screen pixel position.
    fn project(&self, pos: LatLng) -> Vec2;

    /// Visible geographic bounds.
    fn bounds(&self) -> GeoBounds;

    /// False while the map handle is missing or degenerate (zero-sized).
    /// Every overlay operation is a silent no-op until this turns true.
    fn is_ready(&self) -> bool {
        let (w, h) = self.size_px();
        w > 0 && h > 0
    }
}

/// Viewport change notifications published by the host camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    /// Camera center moved (pan).
    Moved,
    /// Zoom level changed.
    Zoomed { zoom: f64 },
    /// Viewport pixel dimensions changed.
    Resized { width: u32, height: u32 },
}

/// Handle returned by [`EventHub::subscribe`]; required to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u32);

/// Per-subscriber event cap. Viewport events are coalescible, so dropping
/// the oldest entry under pressure loses nothing a later drain would need.
const MAX_QUEUED_EVENTS: usize = 128;

struct Subscriber {
    id: SubscriptionId,
    queue: VecDeque<ViewportEvent>,
}

/// Fan-out queue for viewport events.
///
/// Subscribe/unsubscribe pairs are symmetric: teardown removes the
/// subscriber entry deterministically instead of leaving a dangling
/// callback behind. Delivery is pull-based; subscribers drain their queue
/// from the single UI thread, matching the cooperative event-loop model.
pub struct EventHub {
    next_id: u32,
    subscribers: Vec<Subscriber>,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribers.push(Subscriber {
            id,
            queue: VecDeque::new(),
        });
        id
    }

    /// Remove a subscriber. Unknown ids are a no-op, so double-unsubscribe
    /// during teardown is harmless.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|s| s.id != id);
    }

    /// Deliver an event to every subscriber queue.
    pub fn publish(&mut self, event: ViewportEvent) {
        for sub in &mut self.subscribers {
            if sub.queue.len() >= MAX_QUEUED_EVENTS {
                sub.queue.pop_front();
            }
            sub.queue.push_back(event);
        }
    }

    /// Take all queued events for one subscriber, oldest first.
    pub fn drain(&mut self, id: SubscriptionId) -> Vec<ViewportEvent> {
        match self.subscribers.iter_mut().find(|s| s.id == id) {
            Some(sub) => sub.queue.drain(..).collect(),
            None => Vec::new(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_publish_drain() {
        let mut hub = EventHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();

        hub.publish(ViewportEvent::Moved);
        hub.publish(ViewportEvent::Zoomed { zoom: 13.0 });

        let got_a = hub.drain(a);
        assert_eq!(got_a.len(), 2);
        assert_eq!(got_a[0], ViewportEvent::Moved);
        assert_eq!(got_a[1], ViewportEvent::Zoomed { zoom: 13.0 });

        // b has its own copy, a's queue is now empty
        assert_eq!(hub.drain(b).len(), 2);
        assert!(hub.drain(a).is_empty());
    }

    #[test]
    fn unsubscribe_is_symmetric_and_idempotent() {
        let mut hub = EventHub::new();
        let a = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);

        hub.unsubscribe(a);
        assert_eq!(hub.subscriber_count(), 0);

        // publish after unsubscribe reaches nobody
        hub.publish(ViewportEvent::Moved);
        assert!(hub.drain(a).is_empty());

        // double-unsubscribe is a no-op
        hub.unsubscribe(a);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn queue_drops_oldest_under_pressure() {
        let mut hub = EventHub::new();
        let a = hub.subscribe();

        hub.publish(ViewportEvent::Resized {
            width: 1,
            height: 1,
        });
        for _ in 0..MAX_QUEUED_EVENTS {
            hub.publish(ViewportEvent::Moved);
        }

        let got = hub.drain(a);
        assert_eq!(got.len(), MAX_QUEUED_EVENTS);
        assert!(got.iter().all(|e| *e == ViewportEvent::Moved));
    }

    #[test]
    fn latlng_finiteness() {
        assert!(LatLng::new(40.7, -74.0).is_finite());
        assert!(!LatLng::new(f64::NAN, -74.0).is_finite());
        assert!(!LatLng::new(40.7, f64::INFINITY).is_finite());
    }

    #[test]
    fn bounds_contains() {
        let b = GeoBounds {
            south: 40.0,
            west: -75.0,
            north: 41.0,
            east: -73.0,
        };
        assert!(b.contains(LatLng::new(40.5, -74.0)));
        assert!(!b.contains(LatLng::new(42.0, -74.0)));
        assert!(!b.contains(LatLng::new(40.5, -76.0)));
    }
}
