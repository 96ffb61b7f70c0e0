//! Geofence validation for attendance check-in.
//!
//! Given a position and the polygons an employee is authorized to check in
//! from, [`validate_zones_with_direction`] reports whether the position is
//! inside one of them and, if not, how far away and in which compass
//! direction the nearest boundary lies. [`CheckInPolicy`] layers the
//! check-in rules (fix accuracy, any-zone authorization, boundary tolerance)
//! on top of that.

pub mod core;
pub mod error;

pub use crate::core::data::{Coordinate, Direction, LocationFix, Zone, ZoneValidation, ZonesArray};
pub use crate::core::json::{load_authorization, load_zones, parse_authorization, parse_zones, zones_from_json};
pub use crate::core::policy::{
    CheckInDecision, CheckInPolicy, ZoneAuthorization, BOUNDARY_TOLERANCE_METERS,
    DEFAULT_MAX_ACCURACY_METERS, STRICT_MAX_ACCURACY_METERS,
};
pub use crate::core::validate::{bearing_degrees, validate_zones_with_direction};
pub use crate::error::{Error, Result};
