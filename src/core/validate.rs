//! Point-in-zone validation with distance and compass hint to the nearest boundary.

use geo::{Closest, HaversineClosestPoint, HaversineDistance, Intersects, Point};
use tracing::{debug, warn};

use super::data::{Coordinate, Direction, Zone, ZoneValidation};

/// Bearing in degrees, normalized to [0, 360), computed as `atan2(Δlng, Δlat)` on raw degrees.
///
/// This is a planar approximation that the direction hints shown to users
/// were calibrated against; it is not a great-circle initial bearing.
pub fn bearing_degrees(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = to.lat - from.lat;
    let d_lng = to.lng - from.lng;
    d_lng.atan2(d_lat).to_degrees().rem_euclid(360.0)
}

/// Checks whether (`lat`, `lng`) lies in any of `zones`.
///
/// The first containing zone wins. Otherwise the zone whose boundary is
/// nearest (haversine meters, ties resolved to the lowest index) is reported
/// together with the compass direction towards that boundary. Zones with
/// fewer than 3 distinct vertices are skipped.
pub fn validate_zones_with_direction(lat: f64, lng: f64, zones: &[Zone]) -> ZoneValidation {
    let user = Coordinate::new(lng, lat);
    let user_point = Point::from(user);

    let mut closest: Option<(usize, f64, Coordinate)> = None;

    for (index, zone) in zones.iter().enumerate() {
        if zone.is_degenerate() {
            warn!(zone = index, vertices = zone.vertices().len(), "skipping degenerate zone");
            continue;
        }

        let polygon = zone.to_polygon();
        if polygon.intersects(&user_point) {
            debug!(zone = index, %user, "position inside zone");
            return ZoneValidation::inside(index);
        }

        let nearest = match polygon.exterior().haversine_closest_point(&user_point) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p,
            Closest::Indeterminate => {
                warn!(zone = index, "no closest boundary point");
                continue;
            }
        };
        let distance = user_point.haversine_distance(&nearest);

        if closest.map_or(true, |(_, best, _)| distance < best) {
            closest = Some((index, distance, nearest.into()));
        }
    }

    match closest {
        Some((zone_index, distance, target)) => {
            let direction = Direction::from_bearing(bearing_degrees(user, target));
            debug!(zone = zone_index, distance, %direction, %user, "position outside all zones");
            ZoneValidation {
                inside: false,
                zone_index: Some(zone_index),
                distance,
                direction: Some(direction),
            }
        }
        None => ZoneValidation::empty(),
    }
}
