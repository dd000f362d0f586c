use std::cell::RefCell;
use std::rc::Rc;

use super::{TravelConfig, TravelState, TravelStatus, clamp_speed};
use crate::duration::{Duration, MINUTES_PER_HOUR};
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::events::{EventSink, TimeEvent, TravelEvent};
use crate::hex::HexCoordinate;
use crate::ids::{IdGenerator, IdKind, SequentialIds};
use crate::numbers::{floor_f64_to_u32, u64_to_f64};
use crate::ports::{NullPositionStore, PositionStore, TerrainLookup, TimeService};
use crate::progress::{TravelProgress, interpolate};
use crate::route::{Route, Waypoint, calculate_route};
use crate::time::TimeChangeReason;

/// Owns [`TravelState`] and applies commands and frame ticks to it.
///
/// Every state mutation publishes `travel:state-changed` with a snapshot.
/// Failing commands return a [`CommandError`] and change nothing.
pub struct TravelMachine {
    state: TravelState,
    config: TravelConfig,
    terrain: Rc<dyn TerrainLookup>,
    time: Rc<RefCell<dyn TimeService>>,
    ids: Box<dyn IdGenerator>,
    store: Box<dyn PositionStore>,
    /// Game minutes travelled on the current journey.
    elapsed_minutes: f64,
    /// Whole hours already pushed to the time port for this journey.
    hours_advanced: u32,
    /// Real milliseconds until `arrived` reverts to `idle`.
    arrival_timer_ms: Option<f64>,
}

impl TravelMachine {
    pub fn new(
        config: TravelConfig,
        terrain: Rc<dyn TerrainLookup>,
        time: Rc<RefCell<dyn TimeService>>,
    ) -> Self {
        Self {
            state: TravelState::default(),
            config,
            terrain,
            time,
            ids: Box::new(SequentialIds::new()),
            store: Box::new(NullPositionStore),
            elapsed_minutes: 0.0,
            hours_advanced: 0,
            arrival_timer_ms: None,
        }
    }

    #[must_use]
    pub fn with_ids(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn with_position_store(mut self, store: Box<dyn PositionStore>) -> Self {
        self.store = store;
        self
    }

    /// Initial party position, applied without events or persistence.
    #[must_use]
    pub fn with_party_position(mut self, coord: HexCoordinate) -> Self {
        self.state.party_position = coord;
        self
    }

    #[must_use]
    pub const fn state(&self) -> &TravelState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &TravelConfig {
        &self.config
    }

    #[must_use]
    pub const fn elapsed_minutes(&self) -> f64 {
        self.elapsed_minutes
    }

    #[must_use]
    pub const fn hours_advanced(&self) -> u32 {
        self.hours_advanced
    }

    /// Whether an arrival is still waiting to fall back to idle.
    #[must_use]
    pub const fn arrival_pending(&self) -> bool {
        self.arrival_timer_ms.is_some()
    }

    // Route planning

    /// Append a waypoint and recompute the route.
    pub fn add_waypoint(&mut self, coord: HexCoordinate, sink: &mut dyn EventSink) -> Waypoint {
        let mut waypoints = self.current_waypoints();
        let order = i32::try_from(waypoints.len()).unwrap_or(i32::MAX);
        let waypoint = Waypoint::new(self.ids.next_id(IdKind::Waypoint), coord, order);
        waypoints.push(waypoint.clone());

        self.state.route = Some(self.plan(&waypoints));
        if self.state.status.is_active() {
            self.refresh_progress();
        } else {
            self.set_status(TravelStatus::Planning);
        }
        log::debug!(target: "saltmarch::travel", "added waypoint {} at {coord}", waypoint.id);
        self.publish_state(sink);
        waypoint
    }

    /// Remove a waypoint, renumber the rest and recompute. Removing the last
    /// waypoint clears the route.
    ///
    /// # Errors
    ///
    /// `NO_ROUTE` without a route, `WAYPOINT_NOT_FOUND` for an unknown id.
    pub fn remove_waypoint(&mut self, waypoint_id: &str, sink: &mut dyn EventSink) -> CommandResult {
        let mut waypoints = self.existing_waypoints(waypoint_id, "remove")?;
        waypoints.retain(|w| w.id != waypoint_id);
        for (index, waypoint) in waypoints.iter_mut().enumerate() {
            waypoint.order = i32::try_from(index).unwrap_or(i32::MAX);
        }

        if waypoints.is_empty() {
            if self.state.status.is_active() {
                self.stop_travel(sink);
                return Ok(());
            }
            self.state.route = None;
            self.state.progress = None;
            self.set_status(TravelStatus::Idle);
        } else {
            self.state.route = Some(self.plan(&waypoints));
            self.refresh_progress();
        }
        self.publish_state(sink);
        Ok(())
    }

    /// Move a waypoint to a new hex and recompute.
    ///
    /// # Errors
    ///
    /// `NO_ROUTE` without a route, `WAYPOINT_NOT_FOUND` for an unknown id.
    pub fn move_waypoint(
        &mut self,
        waypoint_id: &str,
        coord: HexCoordinate,
        sink: &mut dyn EventSink,
    ) -> CommandResult {
        let mut waypoints = self.existing_waypoints(waypoint_id, "move")?;
        for waypoint in waypoints.iter_mut().filter(|w| w.id == waypoint_id) {
            waypoint.coord = coord;
        }
        self.state.route = Some(self.plan(&waypoints));
        self.refresh_progress();
        self.publish_state(sink);
        Ok(())
    }

    /// Put the party somewhere else. An active journey is stopped first;
    /// remaining waypoints are re-planned from the new position.
    pub fn set_party_position(&mut self, coord: HexCoordinate, sink: &mut dyn EventSink) {
        let waypoints = self.current_waypoints();
        if self.state.status.is_active() {
            self.stop_travel(sink);
        }
        self.state.party_position = coord;
        self.persist_position();

        if waypoints.is_empty() {
            self.state.route = None;
            self.state.progress = None;
            self.set_status(TravelStatus::Idle);
        } else {
            self.state.route = Some(self.plan(&waypoints));
            self.state.progress = None;
            self.set_status(TravelStatus::Planning);
        }
        self.publish_state(sink);
    }

    pub fn clear_route(&mut self, sink: &mut dyn EventSink) {
        if self.state.status.is_active() {
            self.stop_travel(sink);
        }
        self.state.route = None;
        self.state.progress = None;
        self.set_status(TravelStatus::Idle);
        self.publish_state(sink);
    }

    // Journey control

    /// Begin travelling the planned route from the party position.
    ///
    /// # Errors
    ///
    /// `NO_ROUTE` without a route, `ALREADY_TRAVELING` while travelling.
    pub fn start_travel(&mut self, sink: &mut dyn EventSink) -> CommandResult {
        let Some(route) = &self.state.route else {
            return Err(CommandError::new(ErrorCode::NoRoute, "cannot start travel: no route planned"));
        };
        if self.state.status == TravelStatus::Traveling {
            return Err(CommandError::new(ErrorCode::AlreadyTraveling, "travel already in progress"));
        }

        let from = self.state.party_position;
        let started = TravelEvent::Started {
            route_id: route.id.clone(),
            from,
            to: route.destination().unwrap_or(from),
            estimated_duration: route.total_duration,
        };
        self.state.progress = Some(TravelProgress::starting_at(from, route, self.config.hex_size));
        self.elapsed_minutes = 0.0;
        self.hours_advanced = 0;
        self.set_status(TravelStatus::Traveling);
        log::info!(target: "saltmarch::travel", "travel started from {from}");

        self.publish_state(sink);
        sink.publish(started.into());
        Ok(())
    }

    /// # Errors
    ///
    /// `NOT_TRAVELING` unless travelling.
    pub fn pause_travel(&mut self, sink: &mut dyn EventSink) -> CommandResult {
        if self.state.status != TravelStatus::Traveling {
            return Err(CommandError::new(ErrorCode::NotTraveling, "cannot pause: not currently traveling"));
        }
        self.set_status(TravelStatus::Paused);
        self.publish_state(sink);
        if let (Some(route), Some(progress)) = (&self.state.route, &self.state.progress) {
            sink.publish(
                TravelEvent::Paused {
                    route_id: route.id.clone(),
                    current_position: progress.current_coord,
                    progress: progress.overall_progress,
                }
                .into(),
            );
        }
        Ok(())
    }

    /// Continue a paused journey with its accumulated time.
    ///
    /// # Errors
    ///
    /// `NOT_PAUSED` unless paused.
    pub fn resume_travel(&mut self, sink: &mut dyn EventSink) -> CommandResult {
        if self.state.status != TravelStatus::Paused {
            return Err(CommandError::new(ErrorCode::NotPaused, "cannot resume: travel is not paused"));
        }
        self.set_status(TravelStatus::Traveling);
        self.publish_state(sink);
        if let Some(route) = &self.state.route {
            sink.publish(
                TravelEvent::Resumed {
                    route_id: route.id.clone(),
                }
                .into(),
            );
        }
        Ok(())
    }

    /// End the journey where the party stands. Always succeeds.
    pub fn stop_travel(&mut self, sink: &mut dyn EventSink) {
        let Some(progress) = self.state.progress.take() else {
            self.state.route = None;
            self.set_status(TravelStatus::Idle);
            self.publish_state(sink);
            return;
        };

        let travelled = u64::from(floor_f64_to_u32(self.elapsed_minutes));
        let committed = u64::from(self.hours_advanced) * MINUTES_PER_HOUR;
        self.commit_minutes(travelled.saturating_sub(committed), sink);

        let final_position = progress.current_coord;
        self.state.party_position = final_position;
        self.state.route = None;
        self.reset_journey();
        self.set_status(TravelStatus::Idle);
        self.persist_position();
        log::info!(target: "saltmarch::travel", "travel stopped at {final_position}");

        self.publish_state(sink);
        sink.publish(
            TravelEvent::Stopped {
                final_position,
                progress: progress.overall_progress,
            }
            .into(),
        );
    }

    /// Advance by `delta_ms` real milliseconds.
    ///
    /// Counts down a pending arrival; otherwise a no-op unless travelling.
    pub fn tick(&mut self, delta_ms: f64, sink: &mut dyn EventSink) {
        if !delta_ms.is_finite() || delta_ms <= 0.0 {
            return;
        }
        if let Some(remaining) = self.arrival_timer_ms {
            let remaining = remaining - delta_ms;
            if remaining > 0.0 {
                self.arrival_timer_ms = Some(remaining);
            } else {
                self.arrival_timer_ms = None;
                if self.state.status == TravelStatus::Arrived {
                    self.set_status(TravelStatus::Idle);
                    self.publish_state(sink);
                }
            }
            return;
        }
        if self.state.status != TravelStatus::Traveling {
            return;
        }
        let Some(total) = self.state.route.as_ref().map(Route::total_minutes) else {
            return;
        };

        let gained = delta_ms / 1_000.0 * self.config.speed_multiplier;
        self.elapsed_minutes = (self.elapsed_minutes + gained).min(u64_to_f64(total));
        self.update_progress(sink);

        if self.state.progress.as_ref().is_some_and(TravelProgress::is_complete) {
            self.complete(sink);
        }
    }

    // Configuration

    /// Game minutes per real second, never below 1.
    pub fn set_animation_speed(&mut self, speed: f64) {
        self.config.speed_multiplier = clamp_speed(speed);
        log::debug!(
            target: "saltmarch::travel",
            "animation speed set to {}",
            self.config.speed_multiplier
        );
    }

    /// Replace the configuration; a route still being planned is recomputed.
    pub fn update_config(&mut self, mut config: TravelConfig, sink: &mut dyn EventSink) {
        if let Err(err) = config.validate() {
            log::warn!(target: "saltmarch::travel", "travel config adjusted: {err}");
            config.sanitize();
        }
        self.config = config;
        if self.state.status == TravelStatus::Planning {
            let waypoints = self.current_waypoints();
            if !waypoints.is_empty() {
                self.state.route = Some(self.plan(&waypoints));
                self.publish_state(sink);
            }
        }
    }

    // Internals

    fn current_waypoints(&self) -> Vec<Waypoint> {
        self.state
            .route
            .as_ref()
            .map(|r| r.waypoints.clone())
            .unwrap_or_default()
    }

    fn existing_waypoints(&self, waypoint_id: &str, action: &str) -> CommandResult<Vec<Waypoint>> {
        let Some(route) = &self.state.route else {
            return Err(CommandError::new(
                ErrorCode::NoRoute,
                format!("cannot {action} waypoint: no route exists"),
            ));
        };
        if route.waypoint(waypoint_id).is_none() {
            return Err(CommandError::new(
                ErrorCode::WaypointNotFound,
                format!("waypoint '{waypoint_id}' not found"),
            )
            .with_details(serde_json::json!({ "waypoint_id": waypoint_id })));
        }
        Ok(route.waypoints.clone())
    }

    fn plan(&mut self, waypoints: &[Waypoint]) -> Route {
        calculate_route(
            self.state.party_position,
            waypoints,
            self.terrain.as_ref(),
            &self.config,
            self.ids.as_mut(),
        )
    }

    /// Re-interpolate after the route changed under an active journey.
    fn refresh_progress(&mut self) {
        if !self.state.status.is_active() {
            return;
        }
        if let Some(route) = &self.state.route {
            self.elapsed_minutes = self
                .elapsed_minutes
                .min(u64_to_f64(route.total_minutes()));
            self.state.progress = Some(interpolate(
                route,
                self.state.party_position,
                self.elapsed_minutes,
                self.config.hex_size,
            ));
        }
    }

    fn update_progress(&mut self, sink: &mut dyn EventSink) {
        let (Some(route), Some(previous)) = (&self.state.route, &self.state.progress) else {
            return;
        };
        let next = interpolate(
            route,
            self.state.party_position,
            self.elapsed_minutes,
            self.config.hex_size,
        );

        for index in previous.current_segment_index..next.current_segment_index {
            if let Some(reached) = route.waypoints.get(index) {
                sink.publish(
                    TravelEvent::WaypointReached {
                        route_id: route.id.clone(),
                        waypoint_id: reached.id.clone(),
                        coord: reached.coord,
                    }
                    .into(),
                );
            }
        }
        if next.current_coord != previous.current_coord {
            sink.publish(
                TravelEvent::PositionChanged {
                    previous: previous.current_coord,
                    current: next.current_coord,
                    pixel_position: next.pixel_position,
                }
                .into(),
            );
        }

        let whole_hours = floor_f64_to_u32(self.elapsed_minutes / 60.0);
        self.state.progress = Some(next);
        if self.config.advance_time {
            while self.hours_advanced < whole_hours {
                self.advance_time(Duration::from_hours(1), sink);
                self.hours_advanced += 1;
            }
        }
        self.publish_state(sink);
    }

    fn complete(&mut self, sink: &mut dyn EventSink) {
        let Some(route) = self.state.route.take() else {
            return;
        };
        let progress = self.state.progress.take();
        let from = self.state.party_position;
        let to = route.destination().unwrap_or(from);

        let committed = u64::from(self.hours_advanced) * MINUTES_PER_HOUR;
        self.commit_minutes(route.total_minutes().saturating_sub(committed), sink);

        sink.publish(
            TravelEvent::Completed {
                route_id: route.id.clone(),
                from,
                to,
                actual_duration: progress.map_or(route.total_duration, |p| p.elapsed_duration),
            }
            .into(),
        );

        self.state.party_position = to;
        self.reset_journey();
        self.set_status(TravelStatus::Arrived);
        self.arrival_timer_ms = Some(u64_to_f64(self.config.arrival_idle_delay_ms));
        self.persist_position();
        log::info!(target: "saltmarch::travel", "arrived at {to} via {}", route.id);
        self.publish_state(sink);
    }

    /// Push leftover minutes of a journey to the time port.
    fn commit_minutes(&mut self, minutes: u64, sink: &mut dyn EventSink) {
        if self.config.advance_time && minutes > 0 {
            self.advance_time(Duration::from_total_minutes(minutes), sink);
        }
    }

    fn advance_time(&mut self, duration: Duration, sink: &mut dyn EventSink) {
        let reason = TimeChangeReason::Travel;
        let result = self.time.borrow_mut().advance(duration, reason);
        for event in TimeEvent::from_advance(&result, reason, duration) {
            sink.publish(event.into());
        }
    }

    fn reset_journey(&mut self) {
        self.elapsed_minutes = 0.0;
        self.hours_advanced = 0;
    }

    /// Any status change supersedes a pending arrival timer.
    fn set_status(&mut self, status: TravelStatus) {
        self.arrival_timer_ms = None;
        self.state.status = status;
    }

    fn persist_position(&mut self) {
        let position = self.state.party_position;
        if let Err(err) = self.store.save_party_position(position) {
            log::warn!(target: "saltmarch::travel", "failed to persist party position {position}: {err:#}");
        }
    }

    fn publish_state(&self, sink: &mut dyn EventSink) {
        sink.publish(
            TravelEvent::StateChanged {
                state: self.state.clone(),
            }
            .into(),
        );
    }
}
