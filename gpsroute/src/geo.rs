//! Geographic primitives: coordinates, named locations and polylines.

use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use thiserror::Error;

/// Mean Earth radius in meters used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Default precision of Google encoded polylines (1e-5 degrees).
pub const DEFAULT_POLYLINE_PRECISION: u32 = 5;

/// Default polyline color, opaque black in RGBA.
pub const DEFAULT_POLYLINE_COLOR: u32 = 0x0000_00FF;

/// Errors produced when parsing geographic values from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("invalid coordinate '{0}': expected 'lat,lng'")]
    InvalidCoordinate(String),

    #[error("coordinate out of range: lat={lat}, lng={lng}")]
    OutOfRange { lat: String, lng: String },

    #[error("truncated encoded polyline at byte {0}")]
    TruncatedPolyline(usize),

    #[error("invalid character in encoded polyline at byte {0}")]
    InvalidPolylineCharacter(usize),

    #[error("encoded polyline coordinate overflows at byte {0}")]
    PolylineOverflow(usize),
}

/// A latitude/longitude pair in decimal degrees.
///
/// Ordering is lexicographic on `(lat, lng)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_METERS * c
    }

    /// True when both components lie within their valid ranges.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

impl FromStr for LatLng {
    type Err = GeoError;

    /// Parses `"lat,lng"`, tolerating whitespace around each component.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| GeoError::InvalidCoordinate(s.to_string()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| GeoError::InvalidCoordinate(s.to_string()))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| GeoError::InvalidCoordinate(s.to_string()))?;

        let point = LatLng::new(lat, lng);
        if !point.is_valid() {
            return Err(GeoError::OutOfRange {
                lat: lat.to_string(),
                lng: lng.to_string(),
            });
        }
        Ok(point)
    }
}

/// A coordinate with an optional human-readable name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub position: LatLng,
    pub name: String,
}

impl Location {
    pub fn new(position: LatLng, name: impl Into<String>) -> Self {
        Self {
            position,
            name: name.into(),
        }
    }
}

impl From<LatLng> for Location {
    fn from(position: LatLng) -> Self {
        Self {
            position,
            name: String::new(),
        }
    }
}

/// Ordered list of route locations (resolved waypoints).
///
/// Appending drops the first incoming location when it sits at the same
/// position as the current last one, so consecutive chunk boundaries are
/// not duplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locations(Vec<Location>);

impl Locations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, location: Location) {
        self.0.push(location);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Location] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<Vec<Location>> for Locations {
    fn from(locations: Vec<Location>) -> Self {
        Self(locations)
    }
}

impl AddAssign<&Locations> for Locations {
    fn add_assign(&mut self, other: &Locations) {
        let skip = match (self.0.last(), other.0.first()) {
            (Some(last), Some(first)) if last.position == first.position => 1,
            _ => 0,
        };
        self.0.extend(other.0.iter().skip(skip).cloned());
    }
}

/// Colored path geometry of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    path: Vec<LatLng>,
    rgba: u32,
}

impl Default for Polyline {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            rgba: DEFAULT_POLYLINE_COLOR,
        }
    }
}

impl Polyline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: Vec<LatLng>) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Decodes a Google encoded polyline with the given decimal precision.
    pub fn from_encoded(encoded: &str, precision: u32) -> Result<Self, GeoError> {
        Ok(Self::from_path(decode_polyline(encoded, precision)?))
    }

    pub fn path(&self) -> &[LatLng] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn push(&mut self, point: LatLng) {
        self.path.push(point);
    }

    pub fn rgba(&self) -> u32 {
        self.rgba
    }

    /// RGB part of the color, alpha masked out.
    pub fn color(&self) -> u32 {
        (self.rgba >> 8) & 0x00FF_FFFF
    }

    pub fn alpha(&self) -> u8 {
        (self.rgba & 0xFF) as u8
    }

    pub fn set_color(&mut self, rgb: u32, alpha: u8) {
        self.rgba = ((rgb & 0x00FF_FFFF) << 8) | alpha as u32;
    }

    /// Total path length in meters.
    pub fn length(&self) -> f64 {
        self.path.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
    }

    pub fn clear(&mut self) {
        self.path.clear();
    }
}

impl AddAssign<&Polyline> for Polyline {
    /// Appends `other`'s path, dropping its first point when it repeats ours.
    fn add_assign(&mut self, other: &Polyline) {
        let skip = match (self.path.last(), other.path.first()) {
            (Some(last), Some(first)) if last == first => 1,
            _ => 0,
        };
        self.path.extend(other.path.iter().skip(skip).copied());
    }
}

fn decode_polyline(encoded: &str, precision: u32) -> Result<Vec<LatLng>, GeoError> {
    let factor = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut path = Vec::new();

    while index < bytes.len() {
        lat = lat
            .checked_add(decode_value(bytes, &mut index)?)
            .ok_or(GeoError::PolylineOverflow(index))?;
        lng = lng
            .checked_add(decode_value(bytes, &mut index)?)
            .ok_or(GeoError::PolylineOverflow(index))?;
        path.push(LatLng::new(lat as f64 / factor, lng as f64 / factor));
    }

    Ok(path)
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64, GeoError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes
            .get(*index)
            .ok_or(GeoError::TruncatedPolyline(*index))?;
        if !(63..=126).contains(&byte) || shift > 60 {
            return Err(GeoError::InvalidPolylineCharacter(*index));
        }
        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1F) << shift;
        shift += 5;
        *index += 1;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}
