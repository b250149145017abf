//! The engine-local Euclidean frame that markers are placed in.
//!
//! This is the frame the presentation layer renders in (think: the AR session's world space). It
//! has no relation to the Earth other than that its `y` axis points away from the Earth's center:
//!
//! - Positive X is to the right.
//! - Positive Y is up.
//! - Positive Z is forward.
//!
//! Where "right" and "forward" point in the real world depends on how the AR session happened to
//! be oriented when it started, which is why the observer's compass heading and camera yaw are
//! both needed to get from a [`CompassBearing`](crate::CompassBearing) to a direction in this
//! frame.
//!
//! Yaw is rotation about positive Y, with positive angles turning forward towards the right (ie,
//! clockwise as seen from above), just like compass bearings do.

use crate::{Point3, UnitQuaternion, Vector3};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Mul, Sub};
use uom::si::angle::radian;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// below this many meters a direction is considered to have no horizontal component
const HORIZONTAL_EPSILON: f64 = 1e-9;

/// A position in the engine-local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// no need for the "point": indirection
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WorldPoint {
    point: Point3,
}

impl WorldPoint {
    pub(crate) fn from_nalgebra_point(point: Point3) -> Self {
        Self { point }
    }

    /// Constructs a position from its (right, up, forward) components.
    #[must_use]
    pub fn new(x: impl Into<Length>, y: impl Into<Length>, z: impl Into<Length>) -> Self {
        Self::from_nalgebra_point(Point3::new(
            x.into().get::<meter>(),
            y.into().get::<meter>(),
            z.into().get::<meter>(),
        ))
    }

    /// Constructs a position from its (right, up, forward) components in meters.
    #[must_use]
    pub fn from_meters(x: f64, y: f64, z: f64) -> Self {
        Self::from_nalgebra_point(Point3::new(x, y, z))
    }

    /// The origin of the frame.
    #[must_use]
    pub fn origin() -> Self {
        Self::from_nalgebra_point(Point3::origin())
    }

    #[must_use]
    pub fn x(&self) -> Length {
        Length::new::<meter>(self.point.x)
    }

    #[must_use]
    pub fn y(&self) -> Length {
        Length::new::<meter>(self.point.y)
    }

    #[must_use]
    pub fn z(&self) -> Length {
        Length::new::<meter>(self.point.z)
    }

    /// Returns the same position with its height replaced by `y`.
    #[must_use]
    pub fn with_y(mut self, y: impl Into<Length>) -> Self {
        self.point.y = y.into().get::<meter>();
        self
    }

    /// Returns the straight-line distance between two positions.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> Length {
        (*other - *self).length()
    }

    /// Returns the position as a `[x, y, z]` array of meters, as most engines want it.
    #[must_use]
    pub fn to_array(&self) -> [f64; 3] {
        [self.point.x, self.point.y, self.point.z]
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.point.iter().all(|c| c.is_finite())
    }
}

impl Default for WorldPoint {
    fn default() -> Self {
        Self::origin()
    }
}

impl Display for WorldPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.to_array();
        write!(f, "({x:.3}, {y:.3}, {z:.3}) m")
    }
}

impl Add<WorldVector> for WorldPoint {
    type Output = WorldPoint;

    fn add(self, rhs: WorldVector) -> Self::Output {
        WorldPoint::from_nalgebra_point(self.point + rhs.vector)
    }
}

impl Sub<WorldPoint> for WorldPoint {
    type Output = WorldVector;

    fn sub(self, rhs: WorldPoint) -> Self::Output {
        WorldVector::from_nalgebra_vector(self.point - rhs.point)
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for WorldPoint {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        Point3::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.point.abs_diff_eq(&other.point, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for WorldPoint {
    fn default_max_relative() -> Self::Epsilon {
        Point3::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.point.relative_eq(&other.point, epsilon, max_relative)
    }
}

/// A displacement in the engine-local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WorldVector {
    vector: Vector3,
}

impl WorldVector {
    pub(crate) fn from_nalgebra_vector(vector: Vector3) -> Self {
        Self { vector }
    }

    /// Constructs a displacement from its (right, up, forward) components in meters.
    #[must_use]
    pub fn from_meters(x: f64, y: f64, z: f64) -> Self {
        Self::from_nalgebra_vector(Vector3::new(x, y, z))
    }

    /// One meter straight ahead (positive Z).
    #[must_use]
    pub fn forward() -> Self {
        Self::from_nalgebra_vector(Vector3::z())
    }

    /// One meter straight up (positive Y).
    #[must_use]
    pub fn up() -> Self {
        Self::from_nalgebra_vector(Vector3::y())
    }

    #[must_use]
    pub fn x(&self) -> Length {
        Length::new::<meter>(self.vector.x)
    }

    #[must_use]
    pub fn y(&self) -> Length {
        Length::new::<meter>(self.vector.y)
    }

    #[must_use]
    pub fn z(&self) -> Length {
        Length::new::<meter>(self.vector.z)
    }

    /// Returns the length of this displacement.
    #[must_use]
    pub fn length(&self) -> Length {
        Length::new::<meter>(self.vector.norm())
    }

    /// Returns the length of this displacement once projected onto the horizontal (XZ) plane.
    #[must_use]
    pub fn horizontal_length(&self) -> Length {
        Length::new::<meter>(self.vector.x.hypot(self.vector.z))
    }
}

impl Mul<Length> for WorldVector {
    type Output = WorldVector;

    fn mul(self, rhs: Length) -> Self::Output {
        WorldVector::from_nalgebra_vector(self.vector * rhs.get::<meter>())
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for WorldVector {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        Vector3::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.vector.abs_diff_eq(&other.vector, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for WorldVector {
    fn default_max_relative() -> Self::Epsilon {
        Vector3::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.vector.relative_eq(&other.vector, epsilon, max_relative)
    }
}

/// A rotation purely about the vertical axis.
///
/// Yaws compose with `*` and are applied to [`WorldVector`]s with `*` (rotation on the left).
/// Since they all share one axis, the order of composition does not matter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Yaw {
    inner: UnitQuaternion,
}

impl Yaw {
    /// Constructs a yaw that turns forward to the right by `angle`.
    #[must_use]
    pub fn new(angle: impl Into<Angle>) -> Self {
        Self {
            inner: UnitQuaternion::from_axis_angle(
                &Vector3::y_axis(),
                angle.into().get::<radian>(),
            ),
        }
    }

    /// A yaw that changes nothing.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            inner: UnitQuaternion::identity(),
        }
    }

    /// Extracts the yaw of an orientation given as intrinsic yaw, then pitch, then roll.
    ///
    /// Positive pitch tilts forward upwards, and positive roll tilts the top of the object to the
    /// right. Only the yaw survives, but it is recovered from the combined rotation rather than
    /// copied: an object pitched straight up or down takes its yaw from where its top edge points.
    ///
    /// ```
    /// use geoanchor::Yaw;
    /// use uom::si::{angle::degree, f64::Angle};
    ///
    /// let yaw = Yaw::of_tait_bryan_angles(
    ///     Angle::new::<degree>(30.),
    ///     Angle::new::<degree>(-20.),
    ///     Angle::new::<degree>(5.),
    /// );
    /// assert_eq!(yaw.angle().get::<degree>().round(), 30.);
    /// ```
    #[must_use]
    pub fn of_tait_bryan_angles(
        yaw: impl Into<Angle>,
        pitch: impl Into<Angle>,
        roll: impl Into<Angle>,
    ) -> Self {
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw.into().get::<radian>());
        // rotating about +x turns forward downwards, and about +z turns up to the left
        let pitch =
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -pitch.into().get::<radian>());
        let roll =
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -roll.into().get::<radian>());
        Self::of_rotation(&(yaw * pitch * roll))
    }

    /// Extracts the yaw of an arbitrary rotation of the frame, dropping pitch and roll.
    ///
    /// The yaw is that of the rotated forward axis once projected onto the horizontal plane. When
    /// the rotation points forward straight up or down, the rotated up axis takes its place (the
    /// top edge of a camera looking at the floor still points somewhere).
    pub(crate) fn of_rotation(rotation: &UnitQuaternion) -> Self {
        let forward = rotation * Vector3::z();
        let horizontal = if forward.x.hypot(forward.z) > HORIZONTAL_EPSILON {
            forward
        } else {
            // looking down, up points ahead; looking up, up points behind
            rotation * Vector3::y() * -forward.y.signum()
        };
        Self::new(Angle::new::<radian>(horizontal.x.atan2(horizontal.z)))
    }

    /// Returns the angle of this yaw, in [-180°, 180°].
    #[must_use]
    pub fn angle(&self) -> Angle {
        let forward = self.inner * Vector3::z();
        Angle::new::<radian>(forward.x.atan2(forward.z))
    }
}

impl Default for Yaw {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul<Yaw> for Yaw {
    type Output = Yaw;

    fn mul(self, rhs: Yaw) -> Self::Output {
        Yaw {
            inner: self.inner * rhs.inner,
        }
    }
}

impl Mul<WorldVector> for Yaw {
    type Output = WorldVector;

    fn mul(self, rhs: WorldVector) -> Self::Output {
        WorldVector::from_nalgebra_vector(self.inner * rhs.vector)
    }
}

/// The orientation of a renderable: which way its forward (positive Z) axis points, with its up
/// axis kept as close to world up as possible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facing {
    inner: UnitQuaternion,
}

impl Facing {
    /// The orientation of an object aligned with the frame axes.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            inner: UnitQuaternion::identity(),
        }
    }

    /// Returns the orientation of an object at `from` whose forward axis points at `to`.
    ///
    /// If `to` is directly above or below `from`, the object's up axis is aligned with world
    /// forward instead of world up. If the two coincide, there is nothing to look at and the
    /// identity orientation is returned.
    #[must_use]
    pub fn looking_at(from: WorldPoint, to: WorldPoint) -> Self {
        let direction = (to - from).vector;
        if direction.norm() <= HORIZONTAL_EPSILON {
            return Self::identity();
        }
        let up = if direction.x.hypot(direction.z) > HORIZONTAL_EPSILON {
            Vector3::y()
        } else {
            Vector3::z()
        };
        Self {
            inner: UnitQuaternion::face_towards(&direction, &up),
        }
    }

    /// Returns the direction the object's forward axis points in, as a unit vector.
    #[must_use]
    pub fn forward(&self) -> WorldVector {
        WorldVector::from_nalgebra_vector(self.inner * Vector3::z())
    }

    /// Returns the orientation as the scalar-first quaternion `(w, i, j, k)`.
    #[must_use]
    pub fn to_quaternion(&self) -> (f64, f64, f64, f64) {
        let q = self.inner.quaternion();
        (q.w, q.i, q.j, q.k)
    }

    /// Returns the direction the object's up axis points in, as a unit vector.
    #[must_use]
    pub fn up(&self) -> WorldVector {
        WorldVector::from_nalgebra_vector(self.inner * Vector3::y())
    }
}

impl Default for Facing {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::{Facing, WorldPoint, WorldVector, Yaw};
    use crate::{UnitQuaternion, Vector3};
    use approx::assert_relative_eq;
    use rstest::rstest;
    use uom::si::angle::degree;
    use uom::si::f64::{Angle, Length};
    use uom::si::length::meter;

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }
    fn m(meters: f64) -> Length {
        Length::new::<meter>(meters)
    }

    #[rstest]
    #[case(d(0.), WorldVector::from_meters(0., 0., 1.))]
    #[case(d(90.), WorldVector::from_meters(1., 0., 0.))]
    #[case(d(-90.), WorldVector::from_meters(-1., 0., 0.))]
    #[case(d(180.), WorldVector::from_meters(0., 0., -1.))]
    #[case(d(45.), WorldVector::from_meters(0.5_f64.sqrt(), 0., 0.5_f64.sqrt()))]
    fn positive_yaw_turns_right(#[case] angle: Angle, #[case] expected: WorldVector) {
        assert_relative_eq!(Yaw::new(angle) * WorldVector::forward(), expected, epsilon = 1e-12);
    }

    #[test]
    fn yaws_compose_by_adding_angles() {
        let composed = Yaw::new(d(30.)) * Yaw::new(d(-75.));
        assert_relative_eq!(composed.angle().get::<degree>(), -45., epsilon = 1e-9);
        assert_relative_eq!(
            composed * WorldVector::forward(),
            Yaw::new(d(-45.)) * WorldVector::forward(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn yaw_leaves_vertical_alone() {
        let turned = Yaw::new(d(123.)) * WorldVector::up();
        assert_relative_eq!(turned, WorldVector::up(), epsilon = 1e-12);
    }

    #[rstest]
    // yawed only
    #[case(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5), 0.5)]
    // yawed, then pitched down a lot
    #[case(
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -1.2)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 1.3),
        -1.2
    )]
    // yawed, then rolled
    #[case(
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 2.)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7),
        2.
    )]
    // yawed, then looking straight down at the floor
    #[case(
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.3)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::FRAC_PI_2),
        0.3
    )]
    fn yaw_of_rotation_ignores_pitch_and_roll(
        #[case] rotation: UnitQuaternion,
        #[case] expected_radians: f64,
    ) {
        assert_relative_eq!(
            Yaw::of_rotation(&rotation).angle().get::<uom::si::angle::radian>(),
            expected_radians,
            epsilon = 1e-9
        );
    }

    #[rstest]
    #[case(d(30.), d(-20.), d(5.), 30.)]
    #[case(d(-120.), d(60.), d(-40.), -120.)]
    #[case(d(170.), d(0.), d(90.), 170.)]
    // looking straight down, then straight up
    #[case(d(10.), d(-90.), d(0.), 10.)]
    #[case(d(10.), d(90.), d(0.), 10.)]
    fn tait_bryan_yaw_survives_pitch_and_roll(
        #[case] yaw: Angle,
        #[case] pitch: Angle,
        #[case] roll: Angle,
        #[case] expected_degrees: f64,
    ) {
        assert_relative_eq!(
            Yaw::of_tait_bryan_angles(yaw, pitch, roll).angle().get::<degree>(),
            expected_degrees,
            epsilon = 1e-9
        );
    }

    #[rstest]
    #[case(WorldPoint::from_meters(0., 0., 10.), WorldPoint::origin())]
    #[case(WorldPoint::from_meters(3., 2., -4.), WorldPoint::from_meters(-1., 5., 7.))]
    #[case(WorldPoint::from_meters(0., 30., 0.1), WorldPoint::origin())]
    fn looking_at_points_forward_at_the_target(#[case] from: WorldPoint, #[case] to: WorldPoint) {
        let facing = Facing::looking_at(from, to);
        let direction = to - from;
        let expected = direction * m(1. / direction.length().get::<meter>());
        assert_relative_eq!(facing.forward(), expected, epsilon = 1e-9);
    }

    #[test]
    fn looking_at_keeps_up_up() {
        let from = WorldPoint::from_meters(10., 0., 10.);
        let facing = Facing::looking_at(from, WorldPoint::origin());
        assert_relative_eq!(facing.up(), WorldVector::up(), epsilon = 1e-9);
    }

    #[test]
    fn looking_straight_down_is_finite() {
        let facing = Facing::looking_at(WorldPoint::from_meters(0., 50., 0.), WorldPoint::origin());
        assert_relative_eq!(
            facing.forward(),
            WorldVector::from_meters(0., -1., 0.),
            epsilon = 1e-9
        );
        let (w, i, j, k) = facing.to_quaternion();
        assert!([w, i, j, k].iter().all(|c| c.is_finite()));
    }

    #[test]
    fn looking_at_yourself_is_identity() {
        let here = WorldPoint::from_meters(1., 2., 3.);
        assert_eq!(Facing::looking_at(here, here), Facing::identity());
    }

    #[test]
    fn points_and_vectors() {
        let a = WorldPoint::new(m(1.), m(2.), m(3.));
        let b = a + WorldVector::from_meters(3., 0., 4.);
        assert_relative_eq!(a.distance_to(&b).get::<meter>(), 5.);
        assert_relative_eq!((b - a).horizontal_length().get::<meter>(), 5.);
        assert_eq!(b.with_y(m(-1.)).to_array(), [4., -1., 7.]);
        insta::assert_snapshot!(b, @"(4.000, 2.000, 7.000) m");
    }
}
