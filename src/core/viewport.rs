use crate::core::constants::{
    DEFAULT_CENTER, DEFAULT_RADIUS_KM, EARTH_RADIUS_METERS, MAX_LATITUDE_DEGREES,
    MAX_LONGITUDE_DEGREES,
};
use crate::core::geo::{Distance, LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The visible region of the map: a center plus latitude/longitude extents.
///
/// A viewport can equally be built from a center and a radius; both forms
/// convert into each other through [`Viewport::from_center_and_radius`] and
/// [`Viewport::radius`]. Extents are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    center: LatLng,
    latitude_degrees: f64,
    longitude_degrees: f64,
}

impl Viewport {
    /// Creates a viewport, clamping the extents into `[0, 90]` and `[0, 180]` degrees
    pub fn new(center: LatLng, latitude_degrees: f64, longitude_degrees: f64) -> Self {
        Self {
            center,
            latitude_degrees: latitude_degrees.max(0.0).min(MAX_LATITUDE_DEGREES),
            longitude_degrees: longitude_degrees.max(0.0).min(MAX_LONGITUDE_DEGREES),
        }
    }

    /// Creates the viewport of a circle with the given radius around `center`
    pub fn from_center_and_radius(center: LatLng, radius: Distance) -> Self {
        Self::new(
            center,
            2.0 * distance_to_latitude_degrees(radius),
            2.0 * distance_to_longitude_degrees(&center, radius),
        )
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn latitude_degrees(&self) -> f64 {
        self.latitude_degrees
    }

    pub fn longitude_degrees(&self) -> f64 {
        self.longitude_degrees
    }

    /// Radius of the largest circle around the center that fits in the viewport
    pub fn radius(&self) -> Distance {
        let lat_meters = latitude_degrees_to_meters(self.latitude_degrees);
        let lng_meters = longitude_degrees_to_meters(&self.center, self.longitude_degrees);
        Distance::from_meters(lat_meters.min(lng_meters) / 2.0)
    }

    /// Same radius (zoom level) around a different center
    pub fn with_center(&self, center: LatLng) -> Self {
        Self::from_center_and_radius(center, self.radius())
    }

    /// Same center with a different radius
    pub fn with_radius(&self, radius: Distance) -> Self {
        Self::from_center_and_radius(self.center, radius)
    }

    /// Southwest and northeast corners, the form native cameras take
    pub fn bounds(&self) -> LatLngBounds {
        let half_lat = self.latitude_degrees / 2.0;
        let half_lng = self.longitude_degrees / 2.0;
        LatLngBounds::from_coords(
            self.center.lat - half_lat,
            self.center.lng - half_lng,
            self.center.lat + half_lat,
            self.center.lng + half_lng,
        )
    }

    pub fn has_unknown_center(&self) -> bool {
        self.center.is_unknown()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_center_and_radius(
            LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            Distance::from_kilometers(DEFAULT_RADIUS_KM),
        )
    }
}

fn earth_circumference_meters() -> f64 {
    EARTH_RADIUS_METERS * 2.0 * PI
}

fn latitude_circumference_meters(position: &LatLng) -> f64 {
    earth_circumference_meters() * position.lat.to_radians().cos()
}

fn distance_to_latitude_degrees(distance: Distance) -> f64 {
    distance.meters() / earth_circumference_meters() * 360.0
}

fn distance_to_longitude_degrees(position: &LatLng, distance: Distance) -> f64 {
    distance.meters() / latitude_circumference_meters(position) * 360.0
}

fn latitude_degrees_to_meters(degrees: f64) -> f64 {
    earth_circumference_meters() * degrees / 360.0
}

fn longitude_degrees_to_meters(position: &LatLng, degrees: f64) -> f64 {
    latitude_circumference_meters(position) * degrees / 360.0
}
