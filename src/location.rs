//! The observer's side of the world: where the device is, and which way it is facing.
//!
//! Positioning hardware updates on its own schedule. Placement only ever polls the most recent
//! reading through [`LocationProvider`], so implementations should answer from a cached snapshot
//! and never block.

use crate::geodesy::GeoPoint;
use std::fmt;
use std::fmt::{Display, Formatter};
use uom::si::f64::Angle;
use uom::ConstZero;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lifecycle of the device's location service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LocationStatus {
    /// The service is not running.
    Stopped,
    /// The service is acquiring a fix; readings are not yet meaningful.
    Starting,
    /// The service has a fix and readings are current.
    Running,
    /// The service could not start (eg, permission denied, no hardware).
    Failed,
}

impl Display for LocationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let status = match self {
            LocationStatus::Stopped => "stopped",
            LocationStatus::Starting => "starting",
            LocationStatus::Running => "running",
            LocationStatus::Failed => "failed",
        };
        f.write_str(status)
    }
}

/// Supplies the observer's latest location and compass heading.
///
/// The values returned by [`current_location`](LocationProvider::current_location) and
/// [`current_heading`](LocationProvider::current_heading) are only meaningful while
/// [`status`](LocationProvider::status) is [`LocationStatus::Running`].
pub trait LocationProvider {
    /// Returns the current state of the location service.
    fn status(&self) -> LocationStatus;

    /// Returns the most recent location fix.
    fn current_location(&self) -> GeoPoint;

    /// Returns the most recent compass heading, clockwise from true north.
    fn current_heading(&self) -> Angle;
}

impl<T> LocationProvider for &T
where
    T: LocationProvider + ?Sized,
{
    fn status(&self) -> LocationStatus {
        (**self).status()
    }

    fn current_location(&self) -> GeoPoint {
        (**self).current_location()
    }

    fn current_heading(&self) -> Angle {
        (**self).current_heading()
    }
}

impl<T> LocationProvider for Box<T>
where
    T: LocationProvider + ?Sized,
{
    fn status(&self) -> LocationStatus {
        (**self).status()
    }

    fn current_location(&self) -> GeoPoint {
        (**self).current_location()
    }

    fn current_heading(&self) -> Angle {
        (**self).current_heading()
    }
}

/// One reading of a [`ScriptedLocation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub status: LocationStatus,
    pub location: GeoPoint,
    pub heading: Angle,
}

impl LocationSample {
    /// A reading from a service that has a fix.
    #[must_use]
    pub fn running(location: GeoPoint, heading: impl Into<Angle>) -> Self {
        Self {
            status: LocationStatus::Running,
            location,
            heading: heading.into(),
        }
    }

    /// A reading from a service that has no fix (yet, or anymore).
    ///
    /// The location is a placeholder at 0°N 0°E and must not be relied upon.
    #[must_use]
    pub fn without_fix(status: LocationStatus) -> Self {
        Self {
            status,
            location: GeoPoint::default(),
            heading: Angle::ZERO,
        }
    }
}

/// A [`LocationProvider`] that replays a fixed sequence of readings.
///
/// Useful for driving placement deterministically from synthetic walks. The provider reports the
/// sample under its cursor; [`advance`](ScriptedLocation::advance) moves the cursor forward and
/// stays on the last sample once the script runs out.
#[derive(Debug, Clone)]
pub struct ScriptedLocation {
    samples: Vec<LocationSample>,
    cursor: usize,
}

impl ScriptedLocation {
    /// Constructs a provider that replays `samples` in order.
    ///
    /// An empty script behaves like a stopped service.
    #[must_use]
    pub fn new(samples: impl IntoIterator<Item = LocationSample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            cursor: 0,
        }
    }

    /// Constructs a provider that always reports the same fix.
    #[must_use]
    pub fn fixed(location: GeoPoint, heading: impl Into<Angle>) -> Self {
        Self::new([LocationSample::running(location, heading)])
    }

    /// Appends a reading to the end of the script.
    pub fn push(&mut self, sample: LocationSample) {
        self.samples.push(sample);
    }

    /// Moves on to the next reading. Returns `false` if already at the last one.
    pub fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.samples.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Returns the index of the reading currently being reported.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    fn current(&self) -> Option<&LocationSample> {
        self.samples.get(self.cursor)
    }
}

impl LocationProvider for ScriptedLocation {
    fn status(&self) -> LocationStatus {
        self.current().map_or(LocationStatus::Stopped, |sample| sample.status)
    }

    fn current_location(&self) -> GeoPoint {
        self.current().map_or_else(GeoPoint::default, |sample| sample.location)
    }

    fn current_heading(&self) -> Angle {
        self.current().map_or(Angle::ZERO, |sample| sample.heading)
    }
}
