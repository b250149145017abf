//! The fixed set of places markers are anchored to.
//!
//! Targets are configured once, validated once by [`TargetRegistry::initialize`], and never
//! change afterwards. Placement relies on that: the number and order of
//! [`PlacementResult`](crate::placement::PlacementResult)s in a frame always match the registry.

use crate::geodesy::GeoPoint;
use std::collections::HashSet;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One configured target, as written in configuration.
///
/// `P` is whatever handle the presentation layer uses to refer to the renderable that should
/// appear at this location (a prefab id, an entity, an asset path, ...). A record without a
/// payload is rejected by [`TargetRegistry::initialize`].
///
/// With the `serde` feature, records deserialize from any serde format:
///
/// ```yaml
/// - name: tokyo-tower
///   latitude: 35.6586
///   longitude: 139.7454
///   altitude: 40.0
///   payload: tower-marker
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetConfig<P> {
    pub name: String,
    /// Degrees north of the equator, in [-90, 90].
    pub latitude: f64,
    /// Degrees east of the prime meridian, in [-180, 180].
    pub longitude: f64,
    /// Meters above the WGS84 ellipsoid. Must be finite.
    #[cfg_attr(feature = "serde", serde(default))]
    pub altitude: f64,
    pub payload: Option<P>,
}

impl<P> TargetConfig<P> {
    /// Convenience constructor for a record that carries a payload.
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        payload: P,
    ) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            altitude,
            payload: Some(payload),
        }
    }
}

/// Why a set of [`TargetConfig`]s could not become a [`TargetRegistry`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("no targets configured")]
    Empty,

    #[error("target '{name}' has no payload")]
    MissingPayload { name: String },

    #[error("target '{name}' has an invalid location ({latitude}, {longitude}, {altitude}m)")]
    InvalidLocation {
        name: String,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    },

    #[error("target name '{name}' is used more than once")]
    DuplicateName { name: String },
}

/// A place a marker is anchored to.
#[derive(Debug, Clone, PartialEq)]
pub struct Target<P> {
    name: String,
    location: GeoPoint,
    payload: P,
}

impl<P> Target<P> {
    /// Returns the name of this target. Only meant for diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn location(&self) -> &GeoPoint {
        &self.location
    }

    /// Returns the handle of the renderable anchored here.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }
}

/// The ordered, immutable list of [`Target`]s.
///
/// There is deliberately no way to add or remove targets once the registry exists.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRegistry<P> {
    targets: Vec<Target<P>>,
}

impl<P> TargetRegistry<P> {
    /// Validates the configured targets and freezes them, keeping their order.
    ///
    /// Fails if there are no targets, if any target lacks a payload, has an out-of-range location
    /// or a non-finite altitude, or shares its name with another target. Only the first problem is
    /// reported.
    pub fn initialize(
        configured: impl IntoIterator<Item = TargetConfig<P>>,
    ) -> Result<Self, ConfigurationError> {
        let mut names = HashSet::new();
        let targets = configured
            .into_iter()
            .map(|config| {
                let TargetConfig {
                    name,
                    latitude,
                    longitude,
                    altitude,
                    payload,
                } = config;

                if !names.insert(name.clone()) {
                    return Err(ConfigurationError::DuplicateName { name });
                }
                let Some(location) = GeoPoint::from_degrees(latitude, longitude, altitude) else {
                    return Err(ConfigurationError::InvalidLocation {
                        name,
                        latitude,
                        longitude,
                        altitude,
                    });
                };
                let Some(payload) = payload else {
                    return Err(ConfigurationError::MissingPayload { name });
                };

                Ok(Target {
                    name,
                    location,
                    payload,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|error| tracing::warn!(%error, "rejected target configuration"))?;

        if targets.is_empty() {
            tracing::warn!(error = %ConfigurationError::Empty, "rejected target configuration");
            return Err(ConfigurationError::Empty);
        }

        tracing::info!(
            count = targets.len(),
            names = ?targets.iter().map(Target::name).collect::<Vec<_>>(),
            "target registry initialized"
        );
        Ok(Self { targets })
    }

    /// Returns the number of registered targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Always `false` for a successfully initialized registry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Target<P>> {
        self.targets.get(index)
    }

    /// Iterates over the targets in configuration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Target<P>> {
        self.targets.iter()
    }

    /// Iterates over the target names in configuration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.targets.iter().map(Target::name)
    }
}

impl<'a, P> IntoIterator for &'a TargetRegistry<P> {
    type Item = &'a Target<P>;
    type IntoIter = std::slice::Iter<'a, Target<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
