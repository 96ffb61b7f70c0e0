// this file contains definitions for the JSON payloads returned by the attendance backend

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::data::{Coordinate, Zone, ZonesArray};
use super::policy::ZoneAuthorization;
use crate::error::{Error, Result};

/// raw ring list, each vertex is `[lng, lat, ...]`
pub type JsonRings = Vec<Vec<Vec<f64>>>;

#[derive(Deserialize)]
pub struct JsonZonesResponse {
    pub data: JsonZonesData,
}

#[derive(Deserialize)]
pub struct JsonZonesData {
    pub coordinates: JsonRings,
}

/// the zones endpoint wraps the rings in an envelope, exported files are often the bare array
#[derive(Deserialize)]
#[serde(untagged)]
pub enum JsonZonesDocument {
    Envelope(JsonZonesResponse),
    Bare(JsonRings),
}

impl JsonZonesDocument {
    pub fn into_rings(self) -> JsonRings {
        match self {
            JsonZonesDocument::Envelope(response) => response.data.coordinates,
            JsonZonesDocument::Bare(rings) => rings,
        }
    }
}

#[derive(Deserialize)]
pub struct JsonEmployeeResponse {
    pub data: JsonEmployeeData,
}

#[derive(Deserialize)]
pub struct JsonEmployeeData {
    pub employee: JsonEmployee,
}

#[derive(Deserialize)]
pub struct JsonEmployee {
    #[serde(rename(deserialize = "employeeAuthorizeAnyZones"))]
    pub authorize_any_zones: i64,
}

/// converts raw rings into zones, vertices beyond the first two numbers are ignored
pub fn zones_from_json(rings: &[Vec<Vec<f64>>]) -> Result<ZonesArray> {
    rings
        .iter()
        .enumerate()
        .map(|(zone, ring)| {
            ring.iter()
                .enumerate()
                .map(|(vertex, pair)| match pair.as_slice() {
                    [lng, lat, ..] if lng.is_finite() && lat.is_finite() => {
                        Ok(Coordinate::new(*lng, *lat))
                    }
                    _ => Err(Error::MalformedCoordinate { zone, vertex }),
                })
                .collect::<Result<Vec<_>>>()
                .map(Zone::new)
        })
        .collect()
}

pub fn parse_zones(json: &str) -> Result<ZonesArray> {
    let document: JsonZonesDocument = serde_json::from_str(json)?;
    zones_from_json(&document.into_rings())
}

pub fn parse_authorization(json: &str) -> Result<ZoneAuthorization> {
    let response: JsonEmployeeResponse = serde_json::from_str(json)?;
    Ok(ZoneAuthorization::from_flag(
        response.data.employee.authorize_any_zones,
    ))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_zones(path: &Path) -> Result<ZonesArray> {
    parse_zones(&read(path)?)
}

pub fn load_authorization(path: &Path) -> Result<ZoneAuthorization> {
    parse_authorization(&read(path)?)
}
