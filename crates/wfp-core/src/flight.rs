// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Module-side counterpart of the route: holds the ordered coordinates it
//! was sent and walks them as the StartFlight / NextPoi flags change,
//! placing a marker object at the active stop.

use crate::export::parse_poi_coordinates;
use crate::geo::Coordinate;
use crate::host::{SimVars, UNIT_NUMBER, VAR_NEXT_POI_SOUND, VAR_NEXT_POI_VOLUME};
use crate::scheduler::DelayedWrites;
use crate::WfpError;
use log::{info, warn};
use std::time::{Duration, Instant};

/// How long the arrival chime flag stays raised.
pub const SOUND_RESET_DELAY: Duration = Duration::from_secs(4);
const SOUND_VOLUME: f64 = 100.0;

/// Places and removes the ground marker shown at the active stop.
pub trait MarkerSpawner {
    fn spawn(&mut self, at: Coordinate) -> Result<(), WfpError>;
    fn remove_all(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightEvent {
    Started { index: usize },
    StartedEmpty,
    Stopped,
    Advanced { index: usize },
    Completed,
}

pub struct FlightController<S: MarkerSpawner> {
    spawner: S,
    coords: Vec<Coordinate>,
    active_index: Option<usize>,
    flight_active: bool,
    last_start_flight: f64,
    last_next_poi: f64,
    sound_reset: DelayedWrites,
}

impl<S: MarkerSpawner> FlightController<S> {
    pub fn new(spawner: S) -> Self {
        Self {
            spawner,
            coords: Vec::new(),
            active_index: None,
            flight_active: false,
            last_start_flight: 0.0,
            last_next_poi: 0.0,
            sound_reset: DelayedWrites::new(),
        }
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn is_active(&self) -> bool {
        self.flight_active
    }

    pub fn set_coordinates(&mut self, coords: Vec<Coordinate>) {
        info!("Received ordered POI coordinates — count={}", coords.len());
        self.coords = coords;
    }

    /// Feeds a raw inbound message. Returns true when it carried coordinates.
    pub fn handle_message(&mut self, received: &str) -> bool {
        let coords = parse_poi_coordinates(received);
        if coords.is_empty() {
            return false;
        }
        self.set_coordinates(coords);
        true
    }

    fn spawn_at(&mut self, index: usize) {
        let at = self.coords[index];
        if let Err(e) = self.spawner.spawn(at) {
            warn!("Failed to spawn marker — index={} at={} error={}", index, at, e);
        }
    }

    /// Reacts to a new StartFlight value. Repeated values are ignored.
    pub fn on_start_flight(&mut self, value: f64) -> Option<FlightEvent> {
        if value == self.last_start_flight {
            return None;
        }
        self.last_start_flight = value;

        if value == 1.0 {
            self.spawner.remove_all();
            self.flight_active = true;
            self.active_index = Some(0);
            if self.coords.is_empty() {
                info!("Flight started with no POIs to place");
                return Some(FlightEvent::StartedEmpty);
            }
            self.spawn_at(0);
            info!("Flight started — first={}", self.coords[0]);
            Some(FlightEvent::Started { index: 0 })
        } else if value == 0.0 {
            self.spawner.remove_all();
            self.flight_active = false;
            self.active_index = None;
            info!("Flight stopped; markers removed");
            Some(FlightEvent::Stopped)
        } else {
            None
        }
    }

    /// Reacts to a new NextPoi value. Only a raised flag during an active
    /// flight advances.
    pub fn on_next_poi<H: SimVars + ?Sized>(
        &mut self,
        value: f64,
        host: &mut H,
        now: Instant,
    ) -> Option<FlightEvent> {
        if value == self.last_next_poi {
            return None;
        }
        self.last_next_poi = value;

        if !(self.flight_active && value == 1.0) {
            return None;
        }

        let next = self.active_index.map_or(0, |i| i + 1);
        self.active_index = Some(next);

        if next < self.coords.len() {
            self.spawner.remove_all();
            self.spawn_at(next);
            self.play_arrival_sound(host, now);
            info!("Advanced to POI — index={} at={}", next, self.coords[next]);
            Some(FlightEvent::Advanced { index: next })
        } else {
            self.spawner.remove_all();
            self.flight_active = false;
            info!("End of POI list reached");
            Some(FlightEvent::Completed)
        }
    }

    /// Relays one arrival as a complete NextPoi rise and fall. Two arrivals
    /// on consecutive polls can share a single observed flag value, so this
    /// path advances once per call regardless of the last sampled value.
    pub fn on_arrival_pulse<H: SimVars + ?Sized>(
        &mut self,
        host: &mut H,
        now: Instant,
    ) -> Option<FlightEvent> {
        self.last_next_poi = 0.0;
        let event = self.on_next_poi(1.0, host, now);
        self.last_next_poi = 0.0;
        event
    }

    fn play_arrival_sound<H: SimVars + ?Sized>(&mut self, host: &mut H, now: Instant) {
        let raised = host
            .set(VAR_NEXT_POI_VOLUME, UNIT_NUMBER, SOUND_VOLUME)
            .and_then(|_| host.set(VAR_NEXT_POI_SOUND, UNIT_NUMBER, 1.0));
        match raised {
            Ok(()) => self.sound_reset.schedule(
                now + SOUND_RESET_DELAY,
                VAR_NEXT_POI_SOUND,
                UNIT_NUMBER,
                0.0,
            ),
            Err(e) => warn!("Failed to trigger arrival sound — error={}", e),
        }
    }

    /// Resets the chime flag once its delay has passed.
    pub fn update<H: SimVars + ?Sized>(&mut self, host: &mut H, now: Instant) {
        self.sound_reset.run_due(now, host);
    }

    pub fn shutdown(&mut self) {
        self.sound_reset.cancel_all();
        self.spawner.remove_all();
        self.flight_active = false;
        self.active_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[derive(Default)]
    struct RecordingSpawner {
        spawned: Vec<Coordinate>,
        live: usize,
        removals: usize,
    }

    impl MarkerSpawner for RecordingSpawner {
        fn spawn(&mut self, at: Coordinate) -> Result<(), WfpError> {
            self.spawned.push(at);
            self.live += 1;
            Ok(())
        }

        fn remove_all(&mut self) {
            self.live = 0;
            self.removals += 1;
        }
    }

    fn controller_with(n: usize) -> FlightController<RecordingSpawner> {
        let mut fc = FlightController::new(RecordingSpawner::default());
        fc.set_coordinates((0..n).map(|i| Coordinate::new(i as f64, i as f64)).collect());
        fc
    }

    #[test]
    fn test_start_spawns_first() {
        let mut fc = controller_with(3);
        assert_eq!(fc.on_start_flight(1.0), Some(FlightEvent::Started { index: 0 }));
        assert_eq!(fc.spawner().spawned, vec![Coordinate::new(0.0, 0.0)]);
        assert_eq!(fc.active_index(), Some(0));
        // Same value again is not an edge.
        assert_eq!(fc.on_start_flight(1.0), None);
    }

    #[test]
    fn test_advance_through_list() {
        let mut host = MemoryHost::new();
        let t0 = Instant::now();
        let mut fc = controller_with(2);
        fc.on_start_flight(1.0);

        assert_eq!(
            fc.on_next_poi(1.0, &mut host, t0),
            Some(FlightEvent::Advanced { index: 1 })
        );
        assert_eq!(fc.spawner().live, 1);
        assert_eq!(host.writes_to(VAR_NEXT_POI_SOUND).collect::<Vec<_>>(), vec![1.0]);
        assert_eq!(host.writes_to(VAR_NEXT_POI_VOLUME).collect::<Vec<_>>(), vec![100.0]);

        // Falling edge does nothing; next rising edge runs off the end.
        assert_eq!(fc.on_next_poi(0.0, &mut host, t0), None);
        assert_eq!(fc.on_next_poi(1.0, &mut host, t0), Some(FlightEvent::Completed));
        assert!(!fc.is_active());
        assert_eq!(fc.spawner().live, 0);

        fc.update(&mut host, t0 + Duration::from_secs(3));
        assert_eq!(host.writes_to(VAR_NEXT_POI_SOUND).count(), 1);
        fc.update(&mut host, t0 + SOUND_RESET_DELAY);
        assert_eq!(
            host.writes_to(VAR_NEXT_POI_SOUND).collect::<Vec<_>>(),
            vec![1.0, 0.0]
        );
    }

    #[test]
    fn test_back_to_back_arrival_pulses_each_advance() {
        let mut host = MemoryHost::new();
        let t0 = Instant::now();
        let mut fc = controller_with(3);
        fc.on_start_flight(1.0);

        // A sampled flag stuck at 1 would only advance once.
        assert_eq!(
            fc.on_next_poi(1.0, &mut host, t0),
            Some(FlightEvent::Advanced { index: 1 })
        );
        assert_eq!(fc.on_next_poi(1.0, &mut host, t0), None);

        assert_eq!(
            fc.on_arrival_pulse(&mut host, t0 + Duration::from_secs(1)),
            Some(FlightEvent::Advanced { index: 2 })
        );
        assert_eq!(
            fc.on_arrival_pulse(&mut host, t0 + Duration::from_secs(2)),
            Some(FlightEvent::Completed)
        );
        assert_eq!(fc.spawner().spawned.len(), 3);
    }

    #[test]
    fn test_next_ignored_when_inactive() {
        let mut host = MemoryHost::new();
        let mut fc = controller_with(2);
        assert_eq!(fc.on_next_poi(1.0, &mut host, Instant::now()), None);
        assert!(fc.spawner().spawned.is_empty());
        assert!(host.writes.is_empty());
    }

    #[test]
    fn test_stop_removes_markers() {
        let mut fc = controller_with(2);
        fc.on_start_flight(1.0);
        assert_eq!(fc.on_start_flight(0.0), Some(FlightEvent::Stopped));
        assert_eq!(fc.active_index(), None);
        assert_eq!(fc.spawner().live, 0);
    }

    #[test]
    fn test_start_with_no_coordinates() {
        let mut fc = FlightController::new(RecordingSpawner::default());
        assert_eq!(fc.on_start_flight(1.0), Some(FlightEvent::StartedEmpty));
        assert!(fc.spawner().spawned.is_empty());
    }

    #[test]
    fn test_handle_message() {
        let mut fc = FlightController::new(RecordingSpawner::default());
        assert!(!fc.handle_message(r#"{"type":"OTHER"}"#));
        assert!(fc.handle_message(
            r#"{"type":"POI_COORDINATES","data":[{"lat":1.5,"lon":2.5}],"count":1}"#
        ));
        assert_eq!(fc.coordinates(), &[Coordinate::new(1.5, 2.5)]);
    }

    #[test]
    fn test_shutdown_cancels_sound_reset() {
        let mut host = MemoryHost::new();
        let t0 = Instant::now();
        let mut fc = controller_with(3);
        fc.on_start_flight(1.0);
        fc.on_next_poi(1.0, &mut host, t0);
        fc.shutdown();
        fc.update(&mut host, t0 + Duration::from_secs(10));
        assert_eq!(host.writes_to(VAR_NEXT_POI_SOUND).count(), 1);
    }
}
