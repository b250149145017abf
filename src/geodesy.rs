//! Great-circle math on a spherical Earth.
//!
//! This is the only place in the crate that does trigonometry on latitudes and longitudes. The
//! rest of the crate only ever sees the resulting [`Course`] (a distance and a compass bearing).

use crate::util::BoundedAngle;
use std::fmt;
use std::fmt::Display;
use std::marker::PhantomData;
use uom::si::f64::{Angle, Length};
use uom::si::{
    angle::{degree, radian},
    length::meter,
};
use uom::ConstZero;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean radius of the Earth used for all great-circle computations.
///
/// The Earth is treated as a sphere; there is no ellipsoidal correction.
#[doc(alias = "R")]
pub const EARTH_MEAN_RADIUS: f64 = 6_371_000.0;

// conversions through uom's radian base unit may land a hair outside of the nominal range
const RANGE_SLACK_DEGREES: f64 = 1e-9;

/// An Earth-bound location: latitude, longitude, and altitude above the WGS84 ellipsoid.
///
/// Construct one through [`GeoPoint::build`], [`GeoPoint::builder`], or
/// [`GeoPoint::from_degrees`]. All of them refuse latitudes outside of [-90°, 90°] and longitudes
/// outside of [-180°, 180°].
///
/// <div class="warning">
///
/// Deserializing a `GeoPoint` does _not_ re-check the ranges above. Configuration should go
/// through [`TargetConfig`](crate::registry::TargetConfig), which does.
///
/// </div>
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    latitude: Angle,
    longitude: Angle,
    altitude: Length,
}

impl GeoPoint {
    /// Constructs a location from latitude, longitude, and altitude.
    ///
    /// Returns `None` if latitude is not in [-90°,90°], longitude is not in [-180°,180°], or
    /// altitude is not finite.
    #[must_use]
    pub fn build(
        Components {
            latitude,
            longitude,
            altitude,
        }: Components,
    ) -> Option<Self> {
        Some(
            Self::builder()
                .latitude(latitude)?
                .longitude(longitude)?
                .altitude(altitude)?
                .build(),
        )
    }

    /// Provides a constructor for a [`GeoPoint`].
    pub fn builder() -> Builder<MissingLatitude, MissingLongitude, MissingAltitude> {
        Builder {
            under_construction: GeoPoint {
                latitude: Angle::ZERO,
                longitude: Angle::ZERO,
                altitude: Length::ZERO,
            },
            has: (PhantomData, PhantomData, PhantomData),
        }
    }

    /// Constructs a location from plain degrees and meters, as location services report them.
    #[must_use]
    pub fn from_degrees(latitude: f64, longitude: f64, altitude: f64) -> Option<Self> {
        Self::build(Components {
            latitude: Angle::new::<degree>(latitude),
            longitude: Angle::new::<degree>(longitude),
            altitude: Length::new::<meter>(altitude),
        })
    }

    /// Returns the angle north of the equator ("northing"), in [-90°, 90°].
    #[must_use]
    pub fn latitude(&self) -> Angle {
        self.latitude
    }

    /// Returns the angle east of the prime meridian ("easting"), in [-180°, 180°].
    #[must_use]
    pub fn longitude(&self) -> Angle {
        self.longitude
    }

    /// Returns the height above the WGS84 reference ellipsoid.
    ///
    /// This is neither height above sea level nor above local terrain, though it tends to be
    /// within a few dozen meters of the former.
    #[must_use]
    pub fn altitude(&self) -> Length {
        self.altitude
    }

    /// Computes the [great-circle distance] to `other` along the surface of a spherical Earth.
    ///
    /// Altitude does not contribute.
    ///
    /// [great-circle distance]: https://en.wikipedia.org/wiki/Great-circle_distance
    #[doc(alias = "great_circle_distance")]
    #[must_use]
    pub fn haversine_distance_to(&self, other: &GeoPoint) -> Length {
        central_angle_by_haversine(self, other) * Length::new::<meter>(EARTH_MEAN_RADIUS)
    }

    /// Computes the initial compass bearing of the great circle from `self` towards `other`.
    #[doc(alias = "forward_azimuth")]
    #[must_use]
    pub fn initial_bearing_to(&self, other: &GeoPoint) -> CompassBearing {
        CompassBearing::new(initial_bearing(self, other))
    }

    /// Shorthand for [`distance_and_bearing`] with `self` as the observer.
    #[must_use]
    pub fn course_to(&self, other: &GeoPoint) -> Course {
        distance_and_bearing(self, other)
    }
}

/// 0°N 0°E, on the ellipsoid.
impl Default for GeoPoint {
    fn default() -> Self {
        Self {
            latitude: Angle::ZERO,
            longitude: Angle::ZERO,
            altitude: Length::ZERO,
        }
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat = self.latitude;
        let lat_is_positive = lat.is_sign_positive();
        let lat = lat.abs().get::<degree>();
        let lon = self.longitude;
        let lon_is_positive = lon.is_sign_positive();
        let lon = lon.abs().get::<degree>();
        let alt = self.altitude.get::<meter>();
        match (lat_is_positive, lon_is_positive) {
            (true, true) => write!(f, "{lat:.6}°N, {lon:.6}°E, {alt:.2}m"),
            (true, false) => write!(f, "{lat:.6}°N, {lon:.6}°W, {alt:.2}m"),
            (false, true) => write!(f, "{lat:.6}°S, {lon:.6}°E, {alt:.2}m"),
            (false, false) => write!(f, "{lat:.6}°S, {lon:.6}°W, {alt:.2}m"),
        }
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for GeoPoint {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        // GPS fixes are rarely better than a few meters, so a centimeter is plenty
        Length::new::<meter>(0.01)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.haversine_distance_to(other) <= epsilon
            && self
                .altitude
                .get::<meter>()
                .abs_diff_eq(&other.altitude.get::<meter>(), epsilon.get::<meter>())
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for GeoPoint {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(f64::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.haversine_distance_to(other)
            .get::<meter>()
            .abs_diff_eq(&0., epsilon.get::<meter>())
            && self.altitude.get::<meter>().relative_eq(
                &other.altitude.get::<meter>(),
                epsilon.get::<meter>(),
                max_relative.get::<meter>(),
            )
    }
}

/// A compass direction, measured clockwise from true north as seen from above.
///
/// The held angle is always in [0°, 360°).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CompassBearing {
    angle: Angle,
}

impl CompassBearing {
    /// Constructs a bearing from any angle, wrapping it into [0°, 360°).
    #[must_use]
    pub fn new(angle: impl Into<Angle>) -> Self {
        Self {
            angle: BoundedAngle::new(angle).to_bounded_angle(),
        }
    }

    /// Due north.
    #[must_use]
    pub fn north() -> Self {
        Self { angle: Angle::ZERO }
    }

    /// Returns the bearing as an angle in [0°, 360°).
    #[must_use]
    pub fn angle(&self) -> Angle {
        self.angle
    }

    /// Returns the bearing in degrees in [0, 360).
    #[must_use]
    pub fn degrees(&self) -> f64 {
        let degrees = self.angle.get::<degree>();
        // the round-trip through uom's radians may land exactly on 360
        if degrees >= 360. {
            0.
        } else {
            degrees
        }
    }

    /// Returns where this bearing lies for an observer facing `heading`, in [-180°, 180°).
    ///
    /// Positive angles are to the observer's right.
    #[must_use]
    pub fn relative_to(&self, heading: impl Into<Angle>) -> Angle {
        BoundedAngle::new(self.angle - heading.into()).to_signed_angle()
    }
}

impl Default for CompassBearing {
    fn default() -> Self {
        Self::north()
    }
}

impl Display for CompassBearing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.degrees())
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for CompassBearing {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        BoundedAngle::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        BoundedAngle::new(self.angle).abs_diff_eq(&BoundedAngle::new(other.angle), epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for CompassBearing {
    fn default_max_relative() -> Self::Epsilon {
        BoundedAngle::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        BoundedAngle::new(self.angle).relative_eq(
            &BoundedAngle::new(other.angle),
            epsilon,
            max_relative,
        )
    }
}

/// Where a target lies as seen from an observer: how far away, and in which compass direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Course {
    /// Great-circle distance along the surface.
    pub distance: Length,
    /// Initial bearing of the great circle, clockwise from true north.
    pub bearing: CompassBearing,
}

/// Computes the great-circle distance and initial bearing from `observer` to `target`.
///
/// The distance uses the [haversine formula] on a sphere of radius [`EARTH_MEAN_RADIUS`]; the
/// bearing is the [forward azimuth] of the great circle at `observer`.
///
/// This function is total over valid [`GeoPoint`]s: it never returns NaN or infinity. When the
/// two points coincide the bearing is meaningless and is reported as due north. At the poles,
/// where every direction is south (or north), the bearing is whatever `atan2` settles on.
///
/// ```
/// use geoanchor::{geodesy::distance_and_bearing, GeoPoint};
/// use uom::si::length::kilometer;
///
/// let london = GeoPoint::from_degrees(51.5074, -0.1278, 0.).expect("valid lat/lon");
/// let paris = GeoPoint::from_degrees(48.8566, 2.3522, 0.).expect("valid lat/lon");
///
/// let course = distance_and_bearing(&london, &paris);
/// assert_eq!(course.distance.get::<kilometer>().round(), 344.);
/// assert_eq!(course.bearing.degrees().round(), 148.);
/// ```
///
/// [haversine formula]: https://en.wikipedia.org/wiki/Haversine_formula
/// [forward azimuth]: https://www.movable-type.co.uk/scripts/latlong.html#bearing
#[must_use]
pub fn distance_and_bearing(observer: &GeoPoint, target: &GeoPoint) -> Course {
    Course {
        distance: observer.haversine_distance_to(target),
        bearing: observer.initial_bearing_to(target),
    }
}

/// Computes the central angle between the given lat/lon points.
fn central_angle_by_haversine(a: &GeoPoint, b: &GeoPoint) -> Angle {
    let lat_a = a.latitude.get::<radian>(); // φ1
    let lat_b = b.latitude.get::<radian>(); // φ2
    let delta_lat = lat_b - lat_a; // Δφ
    let delta_lon = b.longitude.get::<radian>() - a.longitude.get::<radian>(); // Δλ

    let haversine = (delta_lat / 2.).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lon / 2.).sin().powi(2);
    // rounding can push antipodal points just past 1
    let haversine = haversine.clamp(0., 1.);

    Angle::new::<radian>(2. * haversine.sqrt().atan2((1. - haversine).sqrt()))
}

/// Computes the forward azimuth from `a` towards `b`, not yet bounded.
fn initial_bearing(a: &GeoPoint, b: &GeoPoint) -> Angle {
    let lat_a = a.latitude.get::<radian>();
    let lat_b = b.latitude.get::<radian>();
    let delta_lon = b.longitude.get::<radian>() - a.longitude.get::<radian>();

    let y = delta_lon.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * delta_lon.cos();

    // atan2(0, 0) is 0 (north) for coincident points
    Angle::new::<radian>(y.atan2(x))
}

/// Argument type for [`GeoPoint::build`].
#[derive(Debug, Default)]
#[must_use]
pub struct Components {
    /// The latitude of the proposed [`GeoPoint`]; must be in [-90°,90°].
    pub latitude: Angle,

    /// The longitude of the proposed [`GeoPoint`]; must be in [-180°,180°].
    pub longitude: Angle,

    /// The altitude of the proposed [`GeoPoint`] above the WGS84 reference ellipsoid.
    pub altitude: Length,
}

/// Used to indicate that a partially-constructed [`GeoPoint`] is missing the latitude component.
pub struct MissingLatitude;
/// Used to indicate that a partially-constructed [`GeoPoint`] has the latitude component set.
pub struct HasLatitude;
/// Used to indicate that a partially-constructed [`GeoPoint`] is missing the longitude component.
pub struct MissingLongitude;
/// Used to indicate that a partially-constructed [`GeoPoint`] has the longitude component set.
pub struct HasLongitude;
/// Used to indicate that a partially-constructed [`GeoPoint`] is missing the altitude component.
pub struct MissingAltitude;
/// Used to indicate that a partially-constructed [`GeoPoint`] has the altitude component set.
pub struct HasAltitude;

/// [Builder] for a [`GeoPoint`].
///
/// Construct one through [`GeoPoint::builder`], and finalize with [`Builder::build`].
///
/// [Builder]: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
#[derive(Debug)]
#[must_use]
pub struct Builder<Latitude, Longitude, Altitude> {
    under_construction: GeoPoint,
    has: (
        PhantomData<Latitude>,
        PhantomData<Longitude>,
        PhantomData<Altitude>,
    ),
}

// manual impls of Clone and Copy to avoid requiring the markers to be Copy + Clone
impl<L1, L2, A> Clone for Builder<L1, L2, A> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<L1, L2, A> Copy for Builder<L1, L2, A> {}

fn within_degrees(angle: Angle, limit: f64) -> bool {
    let degrees = angle.get::<degree>();
    degrees.is_finite() && degrees.abs() <= limit + RANGE_SLACK_DEGREES
}

impl<L1, L2, A> Builder<L1, L2, A> {
    /// Sets the latitude of the [`GeoPoint`]-to-be.
    ///
    /// The latitude must be in [-90°,90°]. If it is not, this function returns `None`.
    pub fn latitude(mut self, latitude: impl Into<Angle>) -> Option<Builder<HasLatitude, L2, A>> {
        let latitude = latitude.into();
        if !within_degrees(latitude, 90.) {
            return None;
        }
        self.under_construction.latitude = latitude;
        Some(Builder {
            under_construction: self.under_construction,
            has: (PhantomData::<HasLatitude>, self.has.1, self.has.2),
        })
    }

    /// Sets the longitude of the [`GeoPoint`]-to-be.
    ///
    /// The longitude must be in [-180°,180°]. If it is not, this function returns `None`.
    pub fn longitude(
        mut self,
        longitude: impl Into<Angle>,
    ) -> Option<Builder<L1, HasLongitude, A>> {
        let longitude = longitude.into();
        if !within_degrees(longitude, 180.) {
            return None;
        }
        self.under_construction.longitude = longitude;
        Some(Builder {
            under_construction: self.under_construction,
            has: (self.has.0, PhantomData::<HasLongitude>, self.has.2),
        })
    }

    /// Sets the altitude of the [`GeoPoint`]-to-be.
    ///
    /// The altitude is measured as distance above the WGS84 datum reference ellipsoid. If it is
    /// NaN or infinite, this function returns `None`.
    pub fn altitude(
        mut self,
        altitude: impl Into<Length>,
    ) -> Option<Builder<L1, L2, HasAltitude>> {
        let altitude = altitude.into();
        if !altitude.get::<meter>().is_finite() {
            return None;
        }
        self.under_construction.altitude = altitude;
        Some(Builder {
            under_construction: self.under_construction,
            has: (self.has.0, self.has.1, PhantomData::<HasAltitude>),
        })
    }
}

impl Builder<HasLatitude, HasLongitude, HasAltitude> {
    #[must_use]
    pub fn build(self) -> GeoPoint {
        self.under_construction
    }
}

#[cfg(test)]
mod tests {
    use super::{distance_and_bearing, CompassBearing, Components, GeoPoint, EARTH_MEAN_RADIUS};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::quickcheck;
    use rstest::rstest;
    use uom::si::f64::{Angle, Length};
    use uom::si::{angle::degree, length::meter};

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::from_degrees(lat, lon, 0.).expect("valid lat/lon")
    }
    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }
    fn m(meters: f64) -> Length {
        Length::new::<meter>(meters)
    }

    impl quickcheck::Arbitrary for GeoPoint {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            // quickcheck will give us awkward f64 values -- we ignore those
            let mut finite = || loop {
                match f64::arbitrary(g) {
                    0. => break 0.,
                    f if f.is_normal() => break f,
                    _ => {}
                }
            };
            let (latitude, longitude, altitude) = (finite(), finite(), finite());
            GeoPoint::from_degrees(
                latitude.rem_euclid(180.) - 90.,
                longitude.rem_euclid(360.) - 180.,
                altitude.rem_euclid(10_000.) - 500.,
            )
            .expect("generated within range")
        }
    }

    #[rstest]
    #[case(90.0001, 0., 0.)]
    #[case(-90.5, 0., 0.)]
    #[case(0., 180.5, 0.)]
    #[case(0., -181., 0.)]
    #[case(f64::NAN, 0., 0.)]
    #[case(0., f64::INFINITY, 0.)]
    #[case(0., 0., f64::NAN)]
    #[case(35.6586, 139.7454, f64::INFINITY)]
    #[case(35.6586, 139.7454, f64::NEG_INFINITY)]
    fn geo_point_rejects_out_of_range(#[case] lat: f64, #[case] lon: f64, #[case] alt: f64) {
        assert_eq!(GeoPoint::from_degrees(lat, lon, alt), None);
    }

    #[test]
    fn builder_rejects_non_finite_altitude() {
        let builder = GeoPoint::builder()
            .latitude(d(35.6586))
            .expect("latitude in range")
            .longitude(d(139.7454))
            .expect("longitude in range");
        assert!(builder.altitude(m(f64::NAN)).is_none());
        assert!(builder.altitude(m(-12.)).is_some());
    }

    #[test]
    fn due_north_across_negative_zero_longitude_is_positive_zero() {
        let course = distance_and_bearing(&p(0., 0.), &p(1., -0.0));
        assert!(course.bearing.degrees().is_sign_positive());
        assert!(course.bearing.angle().is_sign_positive());
        insta::assert_snapshot!(course.bearing, @"0.0°");
    }

    #[rstest]
    #[case(90., 180.)]
    #[case(-90., -180.)]
    #[case(0., 0.)]
    fn geo_point_accepts_range_limits(#[case] lat: f64, #[case] lon: f64) {
        assert!(GeoPoint::from_degrees(lat, lon, 0.).is_some());
    }

    #[test]
    fn geo_point_builder_and_build_agree() {
        let built = GeoPoint::build(Components {
            latitude: d(35.6586),
            longitude: d(139.7454),
            altitude: m(40.),
        })
        .expect("valid lat/lon");
        let from_builder = GeoPoint::builder()
            .latitude(d(35.6586))
            .expect("latitude in range")
            .longitude(d(139.7454))
            .expect("longitude in range")
            .altitude(m(40.))
            .expect("altitude is finite")
            .build();
        assert_eq!(built, from_builder);
        assert_eq!(built.altitude(), m(40.));
    }

    #[test]
    fn geo_point_display() {
        insta::assert_snapshot!(
            GeoPoint::from_degrees(51.5074, -0.1278, 35.).unwrap(),
            @"51.507400°N, 0.127800°W, 35.00m"
        );
        insta::assert_snapshot!(
            GeoPoint::from_degrees(-33.8568, 151.2153, 4.5).unwrap(),
            @"33.856800°S, 151.215300°E, 4.50m"
        );
        insta::assert_snapshot!(
            GeoPoint::from_degrees(0., 0., 0.).unwrap(),
            @"0.000000°N, 0.000000°E, 0.00m"
        );
    }

    #[test]
    fn london_to_paris() {
        let london = p(51.5074, -0.1278);
        let paris = p(48.8566, 2.3522);

        let course = distance_and_bearing(&london, &paris);
        assert_relative_eq!(course.distance.get::<meter>(), 343_556.06, epsilon = 0.1);
        assert!((343_000. ..344_000.).contains(&course.distance.get::<meter>()));
        assert_relative_eq!(course.bearing.degrees(), 148.115_616_87, epsilon = 1e-6);

        let back = distance_and_bearing(&paris, &london);
        assert_relative_eq!(back.bearing.degrees(), 330.021_092_86, epsilon = 1e-6);
    }

    #[rstest]
    // one degree of arc along the equator and along a meridian
    #[case(p(0., 0.), p(0., 1.), 111_194.926_644_558_7, 90.)]
    #[case(p(0., 0.), p(1., 0.), 111_194.926_644_558_7, 0.)]
    #[case(p(0., 0.), p(-1., 0.), 111_194.926_644_558_7, 180.)]
    #[case(p(0., 1.), p(0., 0.), 111_194.926_644_558_7, 270.)]
    // across the antimeridian, the short way round
    #[case(p(0., 179.5), p(0., -179.5), 111_194.926_644_559, 90.)]
    #[case(p(0., -179.5), p(0., 179.5), 111_194.926_644_559, 270.)]
    // pole to pole
    #[case(p(90., 0.), p(-90., 0.), std::f64::consts::PI * EARTH_MEAN_RADIUS, 180.)]
    // a hundred meters north of Tokyo Tower
    #[case(p(35.6586, 139.7454), p(35.6595, 139.7454), 100.075_433_980, 0.)]
    fn known_courses(
        #[case] from: GeoPoint,
        #[case] to: GeoPoint,
        #[case] meters: f64,
        #[case] bearing: f64,
    ) {
        let course = distance_and_bearing(&from, &to);
        assert_relative_eq!(course.distance.get::<meter>(), meters, epsilon = 1e-3);
        assert_abs_diff_eq!(course.bearing, CompassBearing::new(d(bearing)), epsilon = 1e-9);
    }

    #[test]
    fn antipodal_points_are_half_the_circumference_apart() {
        let course = distance_and_bearing(&p(0., 0.), &p(0., 180.));
        assert_relative_eq!(
            course.distance.get::<meter>(),
            std::f64::consts::PI * EARTH_MEAN_RADIUS,
            epsilon = 1e-3
        );
        assert!(course.bearing.degrees().is_finite());
    }

    #[rstest]
    #[case(p(0., 0.))]
    #[case(p(90., 0.))]
    #[case(p(-90., 45.))]
    #[case(p(12.5, 180.))]
    #[case(p(51.5074, -0.1278))]
    fn coincident_points_have_zero_distance_and_a_bearing(#[case] point: GeoPoint) {
        let course = distance_and_bearing(&point, &point);
        assert_eq!(course.distance, m(0.));
        assert!(course.bearing.degrees().is_finite());
    }

    #[test]
    fn relative_bearing_is_signed() {
        let bearing = CompassBearing::new(d(10.));
        assert_relative_eq!(bearing.relative_to(d(350.)).get::<degree>(), 20., epsilon = 1e-9);
        assert_relative_eq!(bearing.relative_to(d(30.)).get::<degree>(), -20., epsilon = 1e-9);
        assert_relative_eq!(bearing.relative_to(d(200.)).get::<degree>(), 170., epsilon = 1e-9);
    }

    #[test]
    fn compass_bearing_display() {
        insta::assert_snapshot!(CompassBearing::new(d(-90.)), @"270.0°");
        insta::assert_snapshot!(CompassBearing::new(d(148.115)), @"148.1°");
    }

    quickcheck! {
        fn course_is_always_finite(a: GeoPoint, b: GeoPoint) -> bool {
            let course = distance_and_bearing(&a, &b);
            let meters = course.distance.get::<meter>();
            let degrees = course.bearing.degrees();
            meters.is_finite()
                && (0. ..=std::f64::consts::PI * EARTH_MEAN_RADIUS + 1e-3).contains(&meters)
                && degrees.is_finite()
                && (0. ..360.).contains(&degrees)
        }

        fn distance_to_self_is_zero(a: GeoPoint) -> bool {
            let course = distance_and_bearing(&a, &a);
            course.distance.get::<meter>() == 0. && course.bearing.degrees().is_finite()
        }

        fn distance_is_symmetric(a: GeoPoint, b: GeoPoint) -> bool {
            let there = distance_and_bearing(&a, &b).distance.get::<meter>();
            let back = distance_and_bearing(&b, &a).distance.get::<meter>();
            (there - back).abs() <= 1e-6 * there.max(1.)
        }
    }

    #[rstest]
    // short hops on the same meridian reverse exactly
    #[case(p(10., 20.), p(10.01, 20.), 0.)]
    // further apart, great-circle convergence kicks in
    #[case(p(51.5074, -0.1278), p(48.8566, 2.3522), 1.91)]
    fn back_bearing_is_roughly_opposite(
        #[case] a: GeoPoint,
        #[case] b: GeoPoint,
        #[case] convergence_degrees: f64,
    ) {
        let there = distance_and_bearing(&a, &b).bearing;
        let back = distance_and_bearing(&b, &a).bearing;
        let deviation = back.relative_to(there.angle() + d(180.)).get::<degree>().abs();
        assert!(
            (deviation - convergence_degrees).abs() < 0.05,
            "back bearing deviates by {deviation}°"
        );
    }
}
