// this file contains the geofence domain types shared by the validator and the check-in policy

use std::collections::HashSet;
use std::fmt::{self, Display};

use chrono::{DateTime, Duration, Utc};
use geo::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// a position in decimal degrees, always ordered (longitude, latitude)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Self {
        Coordinate { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    // -0.0 and 0.0 must hash the same
    fn key(&self) -> (u64, u64) {
        ((self.lng + 0.0).to_bits(), (self.lat + 0.0).to_bits())
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Coordinate::new(lng, lat)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lng, lat): (f64, f64)) -> Self {
        Coordinate::new(lng, lat)
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Coord { x: c.lng, y: c.lat }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lng, c.lat)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(p: Point<f64>) -> Self {
        Coordinate::new(p.x(), p.y())
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lng, self.lat)
    }
}

/// the boundary ring of one authorized area, the closing vertex may or may not be repeated
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Zone {
    vertices: Vec<Coordinate>,
}

pub type ZonesArray = Vec<Zone>;

impl Zone {
    pub fn new(vertices: Vec<Coordinate>) -> Self {
        Zone { vertices }
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn distinct_vertices(&self) -> usize {
        self.vertices
            .iter()
            .map(Coordinate::key)
            .collect::<HashSet<_>>()
            .len()
    }

    /// fewer than 3 distinct vertices cannot enclose an area
    pub fn is_degenerate(&self) -> bool {
        self.distinct_vertices() < 3
    }

    /// `Polygon::new` closes the exterior ring, so the result always
    /// includes the segment from the last vertex back to the first
    pub fn to_polygon(&self) -> Polygon<f64> {
        let ring: LineString<f64> = self.vertices.iter().map(|&c| Coord::from(c)).collect();
        Polygon::new(ring, vec![])
    }
}

impl<C: Into<Coordinate>> FromIterator<C> for Zone {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Zone::new(iter.into_iter().map(Into::into).collect())
    }
}

/// compass hint shown to a user standing outside every zone
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Clone, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inside,
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl Direction {
    pub const COMPASS: [Direction; 8] = [
        Direction::North,
        Direction::Northeast,
        Direction::East,
        Direction::Southeast,
        Direction::South,
        Direction::Southwest,
        Direction::West,
        Direction::Northwest,
    ];

    /// buckets a bearing in degrees into one of 8 sectors of 45°, each centered on its label
    pub fn from_bearing(bearing: f64) -> Self {
        let normalized = bearing.rem_euclid(360.0);
        // shift by half a sector so North covers [337.5, 360) and [0, 22.5)
        let sector = ((normalized + 22.5) / 45.0).floor() as usize % 8;
        Self::COMPASS[sector]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Inside => "inside",
            Direction::North => "north",
            Direction::Northeast => "northeast",
            Direction::East => "east",
            Direction::Southeast => "southeast",
            Direction::South => "south",
            Direction::Southwest => "southwest",
            Direction::West => "west",
            Direction::Northwest => "northwest",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// outcome of checking one position against a set of zones
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneValidation {
    pub inside: bool,
    pub zone_index: Option<usize>,
    /// meters to the nearest boundary, `f64::INFINITY` when there was nothing to measure against
    pub distance: f64,
    pub direction: Option<Direction>,
}

impl ZoneValidation {
    pub fn inside(zone_index: usize) -> Self {
        ZoneValidation {
            inside: true,
            zone_index: Some(zone_index),
            distance: 0.0,
            direction: Some(Direction::Inside),
        }
    }

    /// result for an empty (or entirely degenerate) zone list
    pub fn empty() -> Self {
        ZoneValidation {
            inside: false,
            zone_index: None,
            distance: f64::INFINITY,
            direction: None,
        }
    }

    pub fn has_zone(&self) -> bool {
        self.zone_index.is_some()
    }
}

impl Display for ZoneValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.inside, self.zone_index, self.direction) {
            (true, Some(i), _) => write!(f, "inside zone {i}"),
            (false, Some(i), Some(d)) => {
                write!(f, "{:.2} m {d} of zone {i}", self.distance)
            }
            _ => write!(f, "no zones to validate against"),
        }
    }
}

/// a GPS fix as reported by the device location provider
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// horizontal accuracy radius in meters
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp: DateTime<Utc>) -> Self {
        LocationFix {
            latitude,
            longitude,
            accuracy,
            timestamp,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.timestamp)
    }
}

impl Display for LocationFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ±{:.1}m at {}",
            self.coordinate(),
            self.accuracy,
            self.timestamp.to_rfc2822()
        )
    }
}
