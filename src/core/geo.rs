use crate::core::constants::{EARTH_RADIUS_METERS, METERS_PER_KILOMETER, METERS_PER_MILE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a geographical coordinate with latitude and longitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// A coordinate that carries no location at all
    pub fn unknown() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }

    /// True if either component is NaN
    pub fn is_unknown(&self) -> bool {
        self.lat.is_nan() || self.lng.is_nan()
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Great-circle distance to another LatLng using the Haversine formula.
    ///
    /// Every distance in this crate goes through this one primitive so the
    /// different fitting modes stay consistent with each other.
    pub fn distance_to(&self, other: &LatLng) -> Distance {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        Distance::from_meters(EARTH_RADIUS_METERS * c)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// True if the point is absent or either coordinate is NaN
pub fn is_unknown(point: Option<&LatLng>) -> bool {
    point.map_or(true, LatLng::is_unknown)
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Smallest bounds containing every point, `None` for an empty input
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self::new(first, first);
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Great-circle length of the southwest → northeast diagonal
    pub fn diagonal(&self) -> Distance {
        self.south_west.distance_to(&self.north_east)
    }
}

/// Units a [`Distance`] can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
}

impl DistanceUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Miles => "mi",
        }
    }

    fn meters_per_unit(&self) -> f64 {
        match self {
            Self::Meters => 1.0,
            Self::Kilometers => METERS_PER_KILOMETER,
            Self::Miles => METERS_PER_MILE,
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = std::convert::Infallible;

    /// Unrecognised unit strings fall back to meters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "km" => Self::Kilometers,
            "mi" => Self::Miles,
            _ => Self::Meters,
        })
    }
}

/// A non-negative length, stored in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Distance {
    meters: f64,
}

impl Distance {
    pub const ZERO: Distance = Distance { meters: 0.0 };

    /// Negative inputs are clamped to zero
    pub fn from_meters(meters: f64) -> Self {
        Self {
            meters: if meters < 0.0 { 0.0 } else { meters },
        }
    }

    pub fn from_kilometers(kilometers: f64) -> Self {
        Self::from_meters(kilometers * METERS_PER_KILOMETER)
    }

    pub fn from_miles(miles: f64) -> Self {
        Self::from_meters(miles * METERS_PER_MILE)
    }

    pub fn from_unit(value: f64, unit: DistanceUnit) -> Self {
        Self::from_meters(value * unit.meters_per_unit())
    }

    pub fn meters(&self) -> f64 {
        self.meters
    }

    pub fn kilometers(&self) -> f64 {
        self.meters / METERS_PER_KILOMETER
    }

    pub fn miles(&self) -> f64 {
        self.meters / METERS_PER_MILE
    }

    pub fn in_unit(&self, unit: DistanceUnit) -> f64 {
        self.meters / unit.meters_per_unit()
    }

    /// Multiplies the distance by a non-negative factor
    pub fn scale(&self, factor: f64) -> Self {
        Self::from_meters(self.meters * factor)
    }

    pub fn min(self, other: Distance) -> Distance {
        if other.meters < self.meters {
            other
        } else {
            self
        }
    }

    pub fn max(self, other: Distance) -> Distance {
        if other.meters > self.meters {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.meters >= METERS_PER_KILOMETER {
            write!(f, "{:.2} km", self.kilometers())
        } else {
            write!(f, "{:.0} m", self.meters)
        }
    }
}
