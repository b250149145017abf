use uom::si::angle::radian;
use uom::si::f64::Angle;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An angle that only cares about where it points, not how many turns it took to get there.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct BoundedAngle {
    angle: Angle,
}

impl BoundedAngle {
    pub(crate) fn new(angle: impl Into<Angle>) -> Self {
        Self {
            // NOTE: uom may store the value differently-normalized than we hand it over, so we
            // normalize on output as well.
            angle: Angle::new::<radian>(Self::into_bounds(angle.into())),
        }
    }

    /// Returns the angle in [0°, 360°) in radians.
    pub(crate) fn get_bounded(self) -> f64 {
        Self::into_bounds(self.angle)
    }

    /// Returns the angle in [0°, 360°).
    pub(crate) fn to_bounded_angle(self) -> Angle {
        Angle::new::<radian>(self.get_bounded())
    }

    fn into_bounds(angle: Angle) -> f64 {
        let full_turn = Angle::FULL_TURN.get::<radian>();
        let bounded = angle.get::<radian>().rem_euclid(full_turn);
        // rem_euclid of a tiny negative value rounds up to exactly one full turn, and keeps the
        // sign of a negative zero
        if bounded >= full_turn {
            0.
        } else {
            bounded.abs()
        }
    }

    /// Returns the angle in [-180°, 180°) in radians.
    pub(crate) fn to_signed_range(self) -> f64 {
        let angle = self.get_bounded();
        if angle < Angle::HALF_TURN.get::<radian>() {
            angle
        } else {
            angle - Angle::FULL_TURN.get::<radian>()
        }
    }

    /// Returns the angle in [-180°, 180°).
    pub(crate) fn to_signed_angle(self) -> Angle {
        Angle::new::<radian>(self.to_signed_range())
    }
}

/// Every value that can be converted into an [`Angle`] can be converted into [`BoundedAngle`].
impl<U: Into<Angle>> From<U> for BoundedAngle {
    fn from(value: U) -> Self {
        BoundedAngle::new(value)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for BoundedAngle {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let bounded = self.get_bounded();
        let other_bounded = other.get_bounded();

        let min = f64::min(bounded, other_bounded);
        let max = f64::max(bounded, other_bounded);

        // 359.9° and 0.1° are neighbours
        f64::relative_eq(&min, &max, epsilon, max_relative)
            || f64::relative_eq(
                &(min + Angle::FULL_TURN.get::<radian>()),
                &max,
                epsilon,
                max_relative,
            )
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for BoundedAngle {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // radians, so roughly 6e-8 degrees
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        Self::new(self.angle - other.angle).to_signed_range().abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use crate::util::BoundedAngle;
    use approx::{assert_abs_diff_eq, assert_abs_diff_ne, assert_relative_eq};
    use rstest::rstest;
    use uom::si::angle::{degree, radian};
    use uom::si::f64::Angle;

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    #[rstest]
    #[case(d(-90.), 270.)]
    #[case(d(-390.), 330.)]
    #[case(d(720. + 45.), 45.)]
    #[case(d(180.), 180.)]
    #[case(d(0.), 0.)]
    fn bounded_angle_wraps_into_one_turn(#[case] input: Angle, #[case] expected_degrees: f64) {
        assert_relative_eq!(
            BoundedAngle::new(input).get_bounded(),
            expected_degrees.to_radians(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn bounded_angle_never_reaches_a_full_turn() {
        let sut = BoundedAngle::new(Angle::new::<radian>(-1e-18));
        assert!(sut.get_bounded() < Angle::FULL_TURN.get::<radian>());
        assert_eq!(sut.get_bounded(), 0.);
    }

    #[rstest]
    #[case(-0.0)]
    #[case(-1e-300)]
    #[case(-2. * std::f64::consts::PI)]
    fn bounded_angle_is_never_negative_zero(#[case] radians: f64) {
        let sut = BoundedAngle::new(Angle::new::<radian>(radians));
        assert_eq!(sut.get_bounded(), 0.);
        assert!(sut.get_bounded().is_sign_positive());
        assert!(sut.to_bounded_angle().is_sign_positive());
    }

    #[rstest]
    #[case(d(0.), 0.)]
    #[case(d(180.), -180.)]
    #[case(d(359.), -1.)]
    #[case(d(90.), 90.)]
    #[case(d(270.), -90.)]
    #[case(d(-90.), -90.)]
    #[case(d(360.+120.), 120.)]
    #[case(d(360.+340.), -20.)]
    fn bounded_angle_to_signed_range_converts_correctly(
        #[case] input: Angle,
        #[case] expected_result_in_degrees: f64,
    ) {
        assert_relative_eq!(
            BoundedAngle::new(input).to_signed_angle().get::<degree>(),
            expected_result_in_degrees,
            epsilon = 1e-9
        );
    }

    #[rstest]
    #[case(359.99999, 0.00001, true)]
    #[case(0.5, 360.5, true)]
    #[case(10., 350., false)]
    #[case(90., 270., false)]
    fn bounded_angle_comparison_respects_wraparound(
        #[case] a: f64,
        #[case] b: f64,
        #[case] expected: bool,
    ) {
        let a = BoundedAngle::new(d(a));
        let b = BoundedAngle::new(d(b));

        if expected {
            assert_abs_diff_eq!(&a, &b, epsilon = 1e-6);
        } else {
            assert_abs_diff_ne!(&a, &b, epsilon = 1e-6);
        }
    }
}
