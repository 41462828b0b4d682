//! Deterministic viewport fitting over sets of geographic points.
//!
//! Unknown points (absent, or with a NaN component) are dropped before any
//! computation. All distances come from [`LatLng::distance_to`].

use crate::core::{
    geo::{Distance, LatLng, LatLngBounds},
    viewport::Viewport,
};
use serde::{Deserialize, Serialize};

/// How the span covering a point set is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceMode {
    /// Diagonal of the bounding box, southwest to northeast corner
    #[default]
    BoundingBox,
    /// Twice the distance from the centroid to the farthest point
    MaxDistanceFromCenter,
}

/// Constraints applied by [`fit_viewport`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitOptions {
    pub min_radius: Option<Distance>,
    pub max_radius: Option<Distance>,
    /// Fraction added to the radius after clamping, e.g. `0.1` for 10 %
    pub padding: Option<f64>,
    pub mode: DistanceMode,
}

impl FitOptions {
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_radius_limits(mut self, min: Option<Distance>, max: Option<Distance>) -> Self {
        self.min_radius = min;
        self.max_radius = max;
        self
    }

    pub fn with_mode(mut self, mode: DistanceMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Splits the input into known points and a count of the unknown ones
pub fn partition_known<I, P>(points: I) -> (Vec<LatLng>, usize)
where
    I: IntoIterator<Item = P>,
    P: Into<Option<LatLng>>,
{
    let mut skipped = 0;
    let known = points
        .into_iter()
        .filter_map(|p| match p.into() {
            Some(point) if !point.is_unknown() => Some(point),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();
    (known, skipped)
}

fn known<I, P>(points: I) -> Vec<LatLng>
where
    I: IntoIterator<Item = P>,
    P: Into<Option<LatLng>>,
{
    partition_known(points).0
}

/// Arithmetic mean of latitudes and longitudes, `None` if no point is known
pub fn centroid<I, P>(points: I) -> Option<LatLng>
where
    I: IntoIterator<Item = P>,
    P: Into<Option<LatLng>>,
{
    centroid_of(&known(points))
}

fn centroid_of(points: &[LatLng]) -> Option<LatLng> {
    match points {
        [] => None,
        [single] => Some(*single),
        _ => {
            let n = points.len() as f64;
            let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
            let lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
            Some(LatLng::new(lat, lng))
        }
    }
}

/// Great-circle length of the bounding box diagonal
pub fn bounding_distance<I, P>(points: I) -> Option<Distance>
where
    I: IntoIterator<Item = P>,
    P: Into<Option<LatLng>>,
{
    bounding_distance_of(&known(points))
}

fn bounding_distance_of(points: &[LatLng]) -> Option<Distance> {
    LatLngBounds::from_points(points).map(|bounds| bounds.diagonal())
}

/// Diameter of the centroid-anchored circle reaching the farthest point
pub fn max_distance_from_center<I, P>(points: I) -> Option<Distance>
where
    I: IntoIterator<Item = P>,
    P: Into<Option<LatLng>>,
{
    max_distance_from_center_of(&known(points))
}

fn max_distance_from_center_of(points: &[LatLng]) -> Option<Distance> {
    let center = centroid_of(points)?;
    let farthest = points
        .iter()
        .map(|p| center.distance_to(p))
        .fold(Distance::ZERO, Distance::max);
    Some(farthest.scale(2.0))
}

/// Span of the point set measured in the given mode
pub fn distance<I, P>(points: I, mode: DistanceMode) -> Option<Distance>
where
    I: IntoIterator<Item = P>,
    P: Into<Option<LatLng>>,
{
    distance_of(&known(points), mode)
}

fn distance_of(points: &[LatLng], mode: DistanceMode) -> Option<Distance> {
    match mode {
        DistanceMode::BoundingBox => bounding_distance_of(points),
        DistanceMode::MaxDistanceFromCenter => max_distance_from_center_of(points),
    }
}

/// Viewport centered on the centroid that covers all known points.
///
/// The radius is half the measured span, clamped to the min/max limits and
/// only then scaled by `1 + padding`, so padding may push the final radius
/// past the clamp bounds.
pub fn fit_viewport<I, P>(points: I, options: &FitOptions) -> Option<Viewport>
where
    I: IntoIterator<Item = P>,
    P: Into<Option<LatLng>>,
{
    let points = known(points);
    let center = centroid_of(&points)?;
    let mut radius = distance_of(&points, options.mode)?.scale(0.5);

    if let Some(max) = options.max_radius {
        radius = radius.min(max);
    }
    if let Some(min) = options.min_radius {
        radius = radius.max(min);
    }
    if let Some(padding) = options.padding {
        radius = radius.scale(1.0 + padding);
    }

    Some(Viewport::from_center_and_radius(center, radius))
}
