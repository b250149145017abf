//! This library anchors virtual markers to real-world places for augmented-reality apps that have
//! nothing better than a phone's GPS and compass to go on.
//!
//! An AR session renders in its own engine-local frame ([`WorldPoint`]s, with Y up and Z
//! "forward"), and has no idea where on Earth it is or which way is north. Targets, on the other
//! hand, are configured as latitude, longitude, and altitude ([`GeoPoint`]s). Every frame, the
//! [`PlacementEngine`] bridges the two:
//!
//! - a [`LocationProvider`] says where the device is and which way its compass points;
//! - the [`geodesy`] module turns that into a great-circle [`Course`] to each target;
//! - the [`frame`] module turns each course into a position in the engine-local frame, relative to
//!   the camera's [`CameraPose`];
//! - a [`PresentationSink`] moves each renderable there and turns it towards the camera.
//!
//! Targets are validated once, up front, by [`TargetRegistry::initialize`], and the set never
//! changes afterwards.
//!
//! # Examples
//!
//! Say we want a marker over Tokyo Tower while someone walks up Sakurada-dori towards it:
//!
//! ```
//! use geoanchor::{
//!     CameraPose, GeoPoint, LocationSample, PlacementEngine, ScriptedLocation, TargetConfig,
//!     TargetRegistry, TickOutcome, WorldPoint,
//! };
//! use uom::si::f64::Angle;
//! use uom::si::{angle::degree, length::meter};
//!
//! let registry = TargetRegistry::initialize([
//!     TargetConfig::new("tokyo-tower", 35.6586, 139.7454, 150., "tower-marker"),
//! ])
//! .expect("configuration is valid");
//!
//! // the device needs a moment to get a fix, then walks north while facing north
//! let walk = ScriptedLocation::new([
//!     LocationSample::without_fix(geoanchor::LocationStatus::Starting),
//!     LocationSample::running(
//!         GeoPoint::from_degrees(35.6540, 139.7454, 20.).expect("in range"),
//!         Angle::new::<degree>(0.),
//!     ),
//!     LocationSample::running(
//!         GeoPoint::from_degrees(35.6560, 139.7454, 22.).expect("in range"),
//!         Angle::new::<degree>(0.),
//!     ),
//! ]);
//! let mut engine = PlacementEngine::new(walk, registry);
//! let camera = CameraPose::new(WorldPoint::origin(), Angle::new::<degree>(0.));
//!
//! let mut tower = None;
//! let mut sink = |_: &&'static str, position: WorldPoint, _: WorldPoint| tower = Some(position);
//!
//! // no fix yet, so nothing is placed
//! assert!(matches!(engine.tick(camera, &mut sink), TickOutcome::Skipped(_)));
//!
//! engine.provider_mut().advance();
//! assert_eq!(engine.tick(camera, &mut sink), TickOutcome::Placed { count: 1 });
//! engine.provider_mut().advance();
//! assert_eq!(engine.tick(camera, &mut sink), TickOutcome::Placed { count: 1 });
//!
//! // a bit under 300 meters ahead, and 128 meters above the (unmoved) camera
//! let tower = tower.expect("placed");
//! assert_eq!(tower.z().get::<meter>().round(), 289.);
//! assert_eq!(tower.y().get::<meter>(), 128.);
//! ```
//!
//! # Accuracy
//!
//! The Earth is treated as a sphere of radius [`EARTH_MEAN_RADIUS`](geodesy::EARTH_MEAN_RADIUS),
//! and targets are placed along a flat plane tangent to the observer. Both are fine for the
//! distances at which a marker is still visible, and far below the error of consumer GPS. Heights
//! come straight from the difference in altitude between observer and target.

mod util;

pub mod frame;
pub mod geodesy;
pub mod location;
pub mod placement;
pub mod registry;

pub(crate) type Point3 = nalgebra::Point3<f64>;
pub(crate) type Vector3 = nalgebra::Vector3<f64>;
pub(crate) type Quaternion = nalgebra::Quaternion<f64>;
pub(crate) type UnitQuaternion = nalgebra::Unit<Quaternion>;

pub use frame::{Facing, WorldPoint, WorldVector, Yaw};
pub use geodesy::{distance_and_bearing, CompassBearing, Course, GeoPoint};
pub use location::{LocationProvider, LocationSample, LocationStatus, ScriptedLocation};
pub use placement::{
    CameraPose, ObserverState, PlacementEngine, PlacementResult, PresentationSink, SkipReason,
    TickOutcome,
};
pub use registry::{ConfigurationError, Target, TargetConfig, TargetRegistry};
