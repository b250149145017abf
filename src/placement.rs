//! Per-frame placement of geo-anchored targets in the engine-local frame.
//!
//! Every frame, the [`PlacementEngine`] takes the latest location fix and compass heading from
//! its [`LocationProvider`], combines them with the camera's pose in the engine-local frame, and
//! works out where each registered [`Target`] should be drawn. Nothing carries over from one
//! frame to the next: each pose is recomputed from scratch, so errors never accumulate.
//!
//! For one target, placement goes like this:
//!
//! 1. Compute the great-circle [`Course`](crate::Course) from the observer to the target.
//! 2. Turn the compass bearing into an angle relative to where the observer is facing
//!    (`bearing - heading`).
//! 3. Turn that relative angle into a direction in the engine-local frame by composing it with
//!    the camera's own yaw. Camera pitch and roll are ignored so that markers stay on the horizon
//!    no matter how the device is tilted.
//! 4. Walk the great-circle distance from the camera in that direction.
//! 5. Replace the height with the camera's height plus the altitude difference between target
//!    and observer. GPS altitude is noisy, but far less so than deriving height from distance.
//! 6. Have the target look back at the camera.
//!
//! ```
//! use geoanchor::{
//!     CameraPose, GeoPoint, PlacementEngine, ScriptedLocation, TargetConfig, TargetRegistry,
//!     TickOutcome, WorldPoint,
//! };
//! use uom::si::{angle::degree, f64::Angle, length::meter};
//!
//! let here = GeoPoint::from_degrees(35.6586, 139.7454, 40.).expect("valid lat/lon");
//! let registry = TargetRegistry::initialize([
//!     // about a hundred meters north, five meters higher up
//!     TargetConfig::new("marker", 35.6595, 139.7454, 45., "cube"),
//! ])
//! .expect("valid configuration");
//!
//! // the device is facing north
//! let location = ScriptedLocation::fixed(here, Angle::new::<degree>(0.));
//! let engine = PlacementEngine::new(location, registry);
//!
//! let camera = CameraPose::new(WorldPoint::from_meters(0., 1.5, 0.), Angle::new::<degree>(0.));
//! let mut placed = Vec::new();
//! let outcome = engine.tick(
//!     camera,
//!     &mut |payload: &&'static str, position: WorldPoint, _look_at: WorldPoint| {
//!         placed.push((*payload, position));
//!     },
//! );
//!
//! assert_eq!(outcome, TickOutcome::Placed { count: 1 });
//! let (_, position) = placed[0];
//! assert_eq!(position.z().get::<meter>().round(), 100.); // straight ahead
//! assert_eq!(position.y().get::<meter>(), 6.5); // camera height + 5m
//! ```

use crate::frame::{Facing, WorldPoint, WorldVector, Yaw};
use crate::geodesy::{distance_and_bearing, GeoPoint};
use crate::location::{LocationProvider, LocationStatus};
use crate::registry::{Target, TargetRegistry};
use std::fmt;
use std::fmt::{Display, Formatter};
use uom::si::angle::{degree, radian};
use uom::si::f64::Angle;
use uom::si::length::meter;

/// Where the camera is in the engine-local frame, and which way it is turned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// The camera's position.
    pub position: WorldPoint,
    /// The camera's rotation about the vertical axis, positive to the right.
    pub yaw: Angle,
}

impl CameraPose {
    #[must_use]
    pub fn new(position: WorldPoint, yaw: impl Into<Angle>) -> Self {
        Self {
            position,
            yaw: yaw.into(),
        }
    }

    /// Constructs a pose from the camera's full orientation as intrinsic yaw, pitch, and roll,
    /// keeping only its yaw. See [`Yaw::of_tait_bryan_angles`] for the conventions.
    #[must_use]
    pub fn from_tait_bryan_angles(
        position: WorldPoint,
        yaw: impl Into<Angle>,
        pitch: impl Into<Angle>,
        roll: impl Into<Angle>,
    ) -> Self {
        Self::new(position, Yaw::of_tait_bryan_angles(yaw, pitch, roll).angle())
    }
}

/// Everything known about the observer for one frame.
///
/// The engine only ever reads this; a fresh one is assembled every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverState {
    location: GeoPoint,
    heading: Angle,
    camera: CameraPose,
}

impl ObserverState {
    /// Combines a location fix and compass heading with the camera's pose in the local frame.
    #[must_use]
    pub fn new(location: GeoPoint, heading: impl Into<Angle>, camera: CameraPose) -> Self {
        Self {
            location,
            heading: heading.into(),
            camera,
        }
    }

    #[must_use]
    pub fn location(&self) -> &GeoPoint {
        &self.location
    }

    /// Compass heading of the device, clockwise from true north.
    #[must_use]
    pub fn heading(&self) -> Angle {
        self.heading
    }

    #[must_use]
    pub fn position(&self) -> WorldPoint {
        self.camera.position
    }

    #[must_use]
    pub fn yaw(&self) -> Angle {
        self.camera.yaw
    }

    fn is_finite(&self) -> bool {
        self.heading.get::<radian>().is_finite()
            && self.camera.yaw.get::<radian>().is_finite()
            && self.camera.position.is_finite()
            && self.location.altitude().get::<meter>().is_finite()
    }
}

/// Where one target should be drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementResult {
    /// Index of the target in its [`TargetRegistry`].
    pub target_index: usize,
    /// Position of the target in the engine-local frame.
    pub position: WorldPoint,
    /// The point the target's forward axis should face (ie, the camera).
    pub look_at: WorldPoint,
}

impl PlacementResult {
    /// Returns the orientation that makes the target face [`look_at`](Self::look_at).
    #[must_use]
    pub fn facing(&self) -> Facing {
        Facing::looking_at(self.position, self.look_at)
    }
}

/// Receives computed poses and applies them to renderables.
///
/// Implemented for any `FnMut(&P, WorldPoint, WorldPoint)`.
pub trait PresentationSink<P> {
    /// Moves the renderable identified by `payload` to `position` and turns it to face `look_at`.
    fn set_world_pose(&mut self, payload: &P, position: WorldPoint, look_at: WorldPoint);
}

impl<P, F> PresentationSink<P> for F
where
    F: FnMut(&P, WorldPoint, WorldPoint),
{
    fn set_world_pose(&mut self, payload: &P, position: WorldPoint, look_at: WorldPoint) {
        self(payload, position, look_at)
    }
}

/// Why a frame did not move any targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The location service has no fix. Expected while positioning hardware warms up.
    LocationUnavailable(LocationStatus),
    /// There is nothing to place.
    NoTargets,
    /// The heading, camera pose, or altitude reading was NaN or infinite.
    InvalidObserver,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LocationUnavailable(status) => {
                write!(f, "location service is {status}")
            }
            SkipReason::NoTargets => f.write_str("no targets registered"),
            SkipReason::InvalidObserver => f.write_str("observer reading is not finite"),
        }
    }
}

/// What a call to [`PlacementEngine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Every registered target was placed.
    Placed { count: usize },
    /// Nothing was placed; previously placed targets stay where they were.
    Skipped(SkipReason),
}

impl Display for TickOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::Placed { count } => write!(f, "placed {count} targets"),
            TickOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Computes where `target` should be drawn for `observer`.
///
/// This is a pure function of its inputs.
#[must_use]
pub fn place<P>(
    observer: &ObserverState,
    target_index: usize,
    target: &Target<P>,
) -> PlacementResult {
    let course = distance_and_bearing(&observer.location, target.location());

    let angle_to_target = course.bearing.angle() - observer.heading;
    let rotation = Yaw::new(observer.camera.yaw) * Yaw::new(angle_to_target);
    let horizontal_offset: WorldVector = rotation * WorldVector::forward() * course.distance;

    let camera = observer.camera.position;
    let height = camera.y() + (target.location().altitude() - observer.location.altitude());
    let position = (camera + horizontal_offset).with_y(height);

    tracing::trace!(
        index = target_index,
        name = target.name(),
        distance_m = course.distance.get::<meter>(),
        bearing_deg = course.bearing.degrees(),
        relative_deg = angle_to_target.get::<degree>(),
        %position,
        "placed target"
    );

    PlacementResult {
        target_index,
        position,
        look_at: camera,
    }
}

/// Keeps the targets of a [`TargetRegistry`] placed around a moving observer.
///
/// The engine holds no per-frame state; see the [module documentation](self) for how each frame
/// is computed.
#[derive(Debug)]
pub struct PlacementEngine<L, P> {
    provider: L,
    registry: TargetRegistry<P>,
}

impl<L, P> PlacementEngine<L, P>
where
    L: LocationProvider,
{
    /// Constructs an engine that reads the observer's whereabouts from `provider`.
    pub fn new(provider: L, registry: TargetRegistry<P>) -> Self {
        Self { provider, registry }
    }

    #[must_use]
    pub fn provider(&self) -> &L {
        &self.provider
    }

    /// Gives access to the provider, eg to feed it new readings.
    pub fn provider_mut(&mut self) -> &mut L {
        &mut self.provider
    }

    #[must_use]
    pub fn registry(&self) -> &TargetRegistry<P> {
        &self.registry
    }

    /// Gives back the provider and registry.
    pub fn into_parts(self) -> (L, TargetRegistry<P>) {
        (self.provider, self.registry)
    }

    /// Snapshots the observer for this frame, or explains why there is nothing to do.
    pub fn observe(&self, camera: CameraPose) -> Result<ObserverState, SkipReason> {
        let status = self.provider.status();
        if status != LocationStatus::Running {
            return Err(SkipReason::LocationUnavailable(status));
        }
        if self.registry.is_empty() {
            return Err(SkipReason::NoTargets);
        }

        let observer = ObserverState::new(
            self.provider.current_location(),
            self.provider.current_heading(),
            camera,
        );
        if !observer.is_finite() {
            tracing::warn!(?observer, "ignoring non-finite observer reading");
            return Err(SkipReason::InvalidObserver);
        }
        Ok(observer)
    }

    /// Computes the placement of every target for `observer`, in registry order.
    #[must_use]
    pub fn place_all(&self, observer: &ObserverState) -> Vec<PlacementResult> {
        self.registry
            .iter()
            .enumerate()
            .map(|(index, target)| place(observer, index, target))
            .collect()
    }

    /// Runs one frame: places every target and hands each pose to `sink` as soon as it is known.
    ///
    /// When the location service is not running (or its readings are unusable), the frame is
    /// skipped and `sink` is not called at all, leaving every target where it last was.
    pub fn tick<S>(&self, camera: CameraPose, sink: &mut S) -> TickOutcome
    where
        S: PresentationSink<P> + ?Sized,
    {
        let observer = match self.observe(camera) {
            Ok(observer) => observer,
            Err(reason) => {
                tracing::debug!(%reason, "skipping placement this frame");
                return TickOutcome::Skipped(reason);
            }
        };

        for (index, target) in self.registry.iter().enumerate() {
            let result = place(&observer, index, target);
            sink.set_world_pose(target.payload(), result.position, result.look_at);
        }

        TickOutcome::Placed {
            count: self.registry.len(),
        }
    }
}
