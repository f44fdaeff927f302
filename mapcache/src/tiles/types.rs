//! Geographic and tile coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Supported tile zoom levels
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// A geographic position in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLon {
    /// Latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
}

impl LatLon {
    /// Create a position without range validation.
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a position, rejecting out-of-range coordinates.
    ///
    /// Latitudes beyond the Web Mercator limits are rejected because they
    /// have no tile.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        Ok(Self::new(latitude, longitude))
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.latitude, self.longitude)
    }
}

/// An axis-aligned geographic rectangle, `min` is the south-west corner.
///
/// Bounding boxes crossing the 180th meridian are not supported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// South-west corner
    pub min: LatLon,
    /// North-east corner
    pub max: LatLon,
}

impl BoundingBox {
    /// Create a bounding box from its edges.
    #[inline]
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min: LatLon::new(min_lat, min_lon),
            max: LatLon::new(max_lat, max_lon),
        }
    }

    /// Smallest bounding box containing every given position.
    ///
    /// Returns `None` for an empty iterator.
    pub fn enclosing<'a>(positions: impl IntoIterator<Item = &'a LatLon>) -> Option<Self> {
        let mut positions = positions.into_iter();
        let first = positions.next()?;
        let mut bbox = Self {
            min: *first,
            max: *first,
        };
        for p in positions {
            bbox.min.latitude = bbox.min.latitude.min(p.latitude);
            bbox.min.longitude = bbox.min.longitude.min(p.longitude);
            bbox.max.latitude = bbox.max.latitude.max(p.latitude);
            bbox.max.longitude = bbox.max.longitude.max(p.longitude);
        }
        Some(bbox)
    }

    /// Whether the position lies inside or on the edge of this box.
    #[inline]
    pub fn contains(&self, position: &LatLon) -> bool {
        (self.min.latitude..=self.max.latitude).contains(&position.latitude)
            && (self.min.longitude..=self.max.longitude).contains(&position.longitude)
    }

    /// Whether the two boxes share at least one point.
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.latitude <= other.max.latitude
            && other.min.latitude <= self.max.latitude
            && self.min.longitude <= other.max.longitude
            && other.min.longitude <= self.max.longitude
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}

/// Slippy-map tile position at the cache's fixed zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePos {
    /// X coordinate (west-east), 0 at west
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
}

impl TilePos {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.x, self.y)
    }
}

/// Inclusive rectangle of tiles.
///
/// `left <= right` and `top <= bottom` always hold; `top` is the northern edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilesRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl TilesRect {
    /// Create a rectangle, rejecting inverted edges.
    pub fn try_new(left: u32, top: u32, right: u32, bottom: u32) -> Result<Self, CoordError> {
        if left > right || top > bottom {
            return Err(CoordError::InvalidTilesRect {
                left,
                top,
                right,
                bottom,
            });
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Number of tiles covered.
    #[inline]
    pub fn size(&self) -> usize {
        (self.right - self.left + 1) as usize * (self.bottom - self.top + 1) as usize
    }

    #[inline]
    pub fn contains(&self, tile: &TilePos) -> bool {
        (self.left..=self.right).contains(&tile.x) && (self.top..=self.bottom).contains(&tile.y)
    }

    /// Iterates all tiles in row-major order (north row first).
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        (self.top..=self.bottom)
            .flat_map(move |y| (self.left..=self.right).map(move |x| TilePos::new(x, y)))
    }

    /// Iterates the last `count` tiles in row-major order.
    ///
    /// Yields the whole rect when `count` is at least its size. Only the
    /// yielded tiles are visited.
    pub fn last_tiles(&self, count: usize) -> impl Iterator<Item = TilePos> + '_ {
        let width = (self.right - self.left + 1) as usize;
        let size = self.size();
        (size - count.min(size)..size).map(move |i| {
            TilePos::new(self.left + (i % width) as u32, self.top + (i / width) as u32)
        })
    }

    /// Smallest rectangle containing every given tile.
    ///
    /// Returns `None` for an empty iterator.
    pub fn minimal_enclosing(tiles: impl IntoIterator<Item = TilePos>) -> Option<Self> {
        let mut tiles = tiles.into_iter();
        let first = tiles.next()?;
        let mut rect = Self::from(first);
        for tile in tiles {
            rect.left = rect.left.min(tile.x);
            rect.right = rect.right.max(tile.x);
            rect.top = rect.top.min(tile.y);
            rect.bottom = rect.bottom.max(tile.y);
        }
        Some(rect)
    }
}

impl From<TilePos> for TilesRect {
    fn from(tile: TilePos) -> Self {
        Self {
            left: tile.x,
            top: tile.y,
            right: tile.x,
            bottom: tile.y,
        }
    }
}

impl fmt::Display for TilesRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}..{}/{}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside the Web Mercator range
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside the supported range
    InvalidZoom(u8),
    /// Rectangle edges are inverted
    InvalidTilesRect {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::InvalidTilesRect {
                left,
                top,
                right,
                bottom,
            } => {
                write!(
                    f,
                    "Invalid tiles rect: left={} top={} right={} bottom={} (edges inverted)",
                    left, top, right, bottom
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
