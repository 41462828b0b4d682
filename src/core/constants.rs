//! Core constants shared by the geometry, camera and reconciliation code.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Mean Earth radius used by every great-circle computation, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Meters in one statute mile.
pub const METERS_PER_MILE: f64 = 1_609.344;

/// Meters in one kilometer.
pub const METERS_PER_KILOMETER: f64 = 1_000.0;

/// Center shown before anything else has been requested (lat, lng).
pub const DEFAULT_CENTER: (f64, f64) = (0.0, 10.0);

/// Radius shown before anything else has been requested, in kilometers.
pub const DEFAULT_RADIUS_KM: f64 = 20_000.0;

/// Upper bound for a viewport's latitude extent in degrees.
pub const MAX_LATITUDE_DEGREES: f64 = 90.0;

/// Upper bound for a viewport's longitude extent in degrees.
pub const MAX_LONGITUDE_DEGREES: f64 = 180.0;

/// Quiet window after the last native camera event before it is written back.
pub const CAMERA_DEBOUNCE_MS: u64 = 100;

/// Wait after an animated camera move before the next queued move is applied.
pub const ANIMATED_SETTLE_MS: u64 = 350;

/// Wait after a non-animated camera move before the next queued move is applied.
pub const IMMEDIATE_SETTLE_MS: u64 = 50;
