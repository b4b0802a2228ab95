//! Implementations for the NavCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::mech::WheelDems;
use log::{error, info, trace, warn};
use nalgebra::Vector2;

// Internal
use super::{
    NavCtrlError, NavIo, NavState, Params, StallPolicy, StatusReport, StopHandle
};
use crate::{
    drive_ctrl::{DriveMapper, DriveOutput, MotorActuator},
    head_ctrl::{PidController, PidOutput},
    loc::{Estimator, LocError, Pose}
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::{heading_deg, norm_angle_deg},
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Navigation control module state
pub struct NavCtrl {
    params: Params,

    state: NavState,

    waypoints: Vec<Vector2<f64>>,

    /// Index of the waypoint currently being navigated to
    cursor: usize,

    estimator: Estimator,

    pid: PidController,

    mapper: DriveMapper,

    io: NavIo,

    stop: StopHandle,

    /// Last demands sent to the actuator
    last_dems: WheelDems,

    /// Last steering output while advancing, reused if the controller isn't
    /// ready
    last_steer: f64,

    report: StatusReport,
    arch_report: Archiver,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavCtrl {

    /// Create a new instance of navigation control.
    ///
    /// The waypoints in the parameters are loaded but navigation doesn't
    /// begin until [`NavCtrl::begin`] or [`NavCtrl::start`] is called.
    pub fn new(
        params: Params,
        estimator: Estimator,
        pid: PidController,
        mapper: DriveMapper,
        io: NavIo
    ) -> Result<Self, NavCtrlError> {
        if !(params.angle_tolerance_deg >= 0.0) {
            return Err(NavCtrlError::InvalidParam("angle_tolerance_deg must be non-negative"))
        }
        if !(params.position_tolerance >= 0.0) {
            return Err(NavCtrlError::InvalidParam("position_tolerance must be non-negative"))
        }
        if !(0.0..=1.0).contains(&params.speed) {
            return Err(NavCtrlError::InvalidParam("speed must be in [0, 1]"))
        }
        if !(params.tick_period_s > 0.0 && params.tick_period_s.is_finite()) {
            return Err(NavCtrlError::InvalidParam("tick_period_s must be positive"))
        }

        let waypoints = to_waypoints(&params.waypoints)?;

        Ok(Self {
            params,
            state: NavState::Idle,
            waypoints,
            cursor: 0,
            estimator,
            pid,
            mapper,
            io,
            stop: StopHandle::new(),
            last_dems: WheelDems::stop(),
            last_steer: 0.0,
            report: StatusReport::default(),
            arch_report: Archiver::default()
        })
    }

    /// Start archiving the status report into the session.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_report = Archiver::from_path(session, "nav_ctrl/status_report.csv")?;
        Ok(())
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn waypoints(&self) -> &[Vector2<f64>] {
        &self.waypoints
    }

    pub fn pose(&self) -> &Pose {
        self.estimator.pose()
    }

    /// The status report of the last tick.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// Get a handle which can be used to stop navigation.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Replace the waypoint list. Only valid while idle.
    pub fn set_waypoints(&mut self, waypoints: &[[f64; 2]]) -> Result<(), NavCtrlError> {
        if self.state != NavState::Idle {
            return Err(NavCtrlError::NotIdle(self.state))
        }

        self.waypoints = to_waypoints(waypoints)?;
        info!("Loaded {} waypoints", self.waypoints.len());

        Ok(())
    }

    /// Begin navigating through the given waypoints. Only valid while idle.
    pub fn start(&mut self, waypoints: &[[f64; 2]]) -> Result<(), NavCtrlError> {
        self.set_waypoints(waypoints)?;
        self.begin()
    }

    /// Begin navigating through the loaded waypoints. Only valid while idle.
    pub fn begin(&mut self) -> Result<(), NavCtrlError> {
        if self.state != NavState::Idle {
            return Err(NavCtrlError::NotIdle(self.state))
        }

        self.cursor = 0;
        self.pid.reset();

        if self.waypoints.is_empty() {
            info!("No waypoints to navigate to");
            self.complete();
        }
        else {
            info!(
                "Navigation started, heading for waypoint 0 ({:.2}, {:.2})",
                self.waypoints[0][0], self.waypoints[0][1]
            );
            self.state = NavState::Aligning;
        }

        Ok(())
    }

    /// Drive the state machine until navigation is complete, sleeping one
    /// tick period between ticks.
    ///
    /// If idle, navigation through the loaded waypoints is begun first.
    pub fn run(&mut self) -> Result<(), NavCtrlError> {
        if self.state == NavState::Idle {
            self.begin()?;
        }

        loop {
            self.step()?;

            if self.state == NavState::Complete {
                return Ok(())
            }

            self.io.clock.sleep(self.params.tick_period_s);
        }
    }

    /// Execute a single tick of navigation control.
    ///
    /// Each active tick refreshes the pose once and takes one control
    /// decision. Idle and complete ticks do nothing. If a stop has been
    /// requested the wheels are stopped and navigation completes, whatever
    /// the state.
    pub fn step(&mut self) -> Result<StatusReport, NavCtrlError> {
        self.report = StatusReport {
            time_s: self.io.clock.now_s(),
            num_waypoints: self.waypoints.len(),
            ..Default::default()
        };

        if self.stop.is_requested() && self.state != NavState::Complete {
            info!("Stop requested");
            self.complete();
            return Ok(self.finish_report())
        }

        match self.state {
            NavState::Aligning | NavState::Advancing => (),
            NavState::Complete => {
                // Retry a final stop that didn't reach the wheels
                self.stop_motion();
                return Ok(self.finish_report())
            },
            _ => return Ok(self.finish_report())
        }

        // ---- POSE ----

        let pose = match self.refresh_pose() {
            Ok(p) => p,
            Err(LocError::Aborted(_)) if self.stop.is_requested() => {
                info!("Stop requested while waiting for a position fix");
                self.complete();
                return Ok(self.finish_report())
            },
            Err(e) => {
                error!("Could not refresh the pose: {}", e);
                let o = self.mapper.stop();
                self.issue(o);
                return Err(NavCtrlError::LocError(e))
            }
        };

        let now_s = self.io.clock.now_s();

        // ---- GUIDANCE ----

        let target = self.waypoints[self.cursor];
        let to_target = target - pose.position;
        let distance = to_target.norm();
        let bearing_deg = heading_deg(to_target[0], to_target[1]);
        let error_deg = norm_angle_deg(bearing_deg - pose.heading_deg());

        self.report.pos_x = Some(pose.position[0]);
        self.report.pos_y = Some(pose.position[1]);
        self.report.heading_deg = pose.heading.map(|h| heading_deg(h[0], h[1]));
        self.report.target_x = Some(target[0]);
        self.report.target_y = Some(target[1]);
        self.report.bearing_deg = Some(bearing_deg);
        self.report.heading_error_deg = Some(error_deg);
        self.report.distance = Some(distance);

        // ---- CONTROL ----

        match self.state {
            NavState::Aligning => self.mode_aligning(distance, error_deg, now_s),
            NavState::Advancing => self.mode_advancing(distance, error_deg, now_s),
            _ => ()
        }

        if self.state == NavState::Arrived {
            self.mode_arrived();
        }

        let report = self.finish_report();

        trace!(
            "NavCtrl {:?}: distance {:.3}, bearing {:.2}, error {:.2}",
            report.state, distance, bearing_deg, error_deg
        );

        Ok(report)
    }

    /// Turn on the spot until facing the waypoint.
    fn mode_aligning(&mut self, distance: f64, error_deg: f64, now_s: f64) {
        if distance <= self.params.position_tolerance {
            self.arrive(distance);
            return
        }

        if error_deg.abs() <= self.params.angle_tolerance_deg {
            self.stop_motion();
            self.pid.reset();
            self.last_steer = 0.0;

            info!(
                "Aligned with waypoint {} (error {:.2} deg), advancing",
                self.cursor, error_deg
            );
            self.state = NavState::Advancing;
            return
        }

        match self.pid.compute(error_deg, now_s) {
            PidOutput::Ready(steer) => {
                let o = self.mapper.pure_rotation(steer);
                self.issue(o);
            },
            PidOutput::NotReady => self.report.pid_not_ready = true
        }
    }

    /// Drive towards the waypoint while correcting the heading.
    fn mode_advancing(&mut self, distance: f64, error_deg: f64, now_s: f64) {
        if distance <= self.params.position_tolerance {
            self.arrive(distance);
            return
        }

        if error_deg.abs() > self.params.angle_tolerance_deg {
            info!(
                "Heading error to waypoint {} is {:.2} deg, realigning",
                self.cursor, error_deg
            );
            self.pid.reset();
            self.state = NavState::Aligning;
            return
        }

        let steer = match self.pid.compute(error_deg, now_s) {
            PidOutput::Ready(s) => {
                self.last_steer = s;
                s
            },
            PidOutput::NotReady => {
                self.report.pid_not_ready = true;
                self.last_steer
            }
        };

        let o = self.mapper.steered_advance(self.params.speed, steer);
        self.issue(o);
    }

    /// Move on to the next waypoint, or complete if there are none left.
    fn mode_arrived(&mut self) {
        self.cursor += 1;

        if self.cursor < self.waypoints.len() {
            let w = self.waypoints[self.cursor];
            info!(
                "Heading for waypoint {} ({:.2}, {:.2})",
                self.cursor, w[0], w[1]
            );
            self.pid.reset();
            self.state = NavState::Aligning;
        }
        else {
            info!("All waypoints visited");
            self.complete();
        }
    }

    fn arrive(&mut self, distance: f64) {
        self.stop_motion();
        info!("Arrived at waypoint {} (distance {:.3})", self.cursor, distance);
        self.state = NavState::Arrived;
    }

    /// Stop the wheels and end navigation.
    fn complete(&mut self) {
        let o = self.mapper.stop();
        self.issue(o);
        self.state = NavState::Complete;
        info!("Navigation complete");
    }

    /// Stop the wheels if they were last commanded to move.
    fn stop_motion(&mut self) {
        if !self.last_dems.is_stop() {
            let o = self.mapper.stop();
            self.issue(o);
        }
    }

    /// Send demands to the actuator.
    ///
    /// Actuator errors are only logged. The last demands are left unchanged
    /// so that a rejected stop is sent again.
    fn issue(&mut self, output: DriveOutput) {
        send_dems(
            self.io.actuator.as_mut(),
            &mut self.last_dems,
            &mut self.report,
            &output
        );
    }

    /// Refresh the pose, handling the wheels and stop requests while the
    /// position source is unavailable.
    fn refresh_pose(&mut self) -> Result<Pose, LocError> {
        let stop = &self.stop;
        let policy = self.params.stall_policy;
        let mapper = &self.mapper;
        let actuator = &mut self.io.actuator;
        let last_dems = &mut self.last_dems;
        let report = &mut self.report;

        self.estimator.refresh(
            self.io.source.as_mut(),
            self.io.clock.as_mut(),
            |_, attempt| {
                report.pos_stall_attempts = attempt;

                if policy == StallPolicy::StopMotion && !last_dems.is_stop() {
                    info!("Stopping until a position fix is available");
                    send_dems(actuator.as_mut(), last_dems, report, &mapper.stop());
                }

                !stop.is_requested()
            }
        )
    }

    fn finish_report(&mut self) -> StatusReport {
        let terms = self.pid.terms();

        self.report.state = self.state;
        self.report.cursor = self.cursor;
        self.report.pid_p = terms.p;
        self.report.pid_i = terms.i;
        self.report.pid_d = terms.d;
        self.report.pid_output = terms.output;

        self.report.clone()
    }
}

impl Archived for NavCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(&self.report)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn to_waypoints(waypoints: &[[f64; 2]]) -> Result<Vec<Vector2<f64>>, NavCtrlError> {
    waypoints
        .iter()
        .enumerate()
        .map(|(i, w)| match w[0].is_finite() && w[1].is_finite() {
            true => Ok(Vector2::new(w[0], w[1])),
            false => Err(NavCtrlError::InvalidWaypoint(i, w[0], w[1]))
        })
        .collect()
}

/// Send demands to the actuator, updating `last_dems` only if they were
/// accepted.
fn send_dems(
    actuator: &mut dyn MotorActuator,
    last_dems: &mut WheelDems,
    report: &mut StatusReport,
    output: &DriveOutput
) {
    match actuator.set_dems(&output.dems) {
        Ok(()) => *last_dems = output.dems,
        Err(e) => warn!("Could not send demands to the actuator: {}", e)
    }

    record_dems(report, output);
}

fn record_dems(report: &mut StatusReport, output: &DriveOutput) {
    report.dem_left = Some(output.dems.left);
    report.dem_right = Some(output.dems.right);
    report.dem_left_limited = output.report.left_limited;
    report.dem_right_limited = output.report.right_limited;
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
