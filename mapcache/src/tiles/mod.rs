//! Tile math
//!
//! Converts between geographic positions / bounding boxes and Web Mercator
//! (slippy map) tile positions at a single zoom level. The cache uses tiles
//! as its unit of spatial completeness.

mod types;

#[cfg(test)]
mod tests;

pub use types::{
    BoundingBox, CoordError, LatLon, TilePos, TilesRect, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT,
    MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Amount a bounding box is shrunk before conversion to a tiles rect.
///
/// A bounding box produced by [`tiles_rect_bounding_box`] touches the
/// neighbouring tiles on every edge, so without shrinking the round trip
/// would grow the rectangle by one tile in each direction.
const NOT_THE_NEXT_TILE: f64 = 1e-7;

/// Validates a zoom level.
pub fn validate_zoom(zoom: u8) -> Result<u8, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(zoom)
}

/// Returns the tile containing the given position.
///
/// Positions outside the Web Mercator range are clamped onto the edge tiles.
/// A position exactly on a tile border belongs to the tile east / south of it.
#[inline]
pub fn enclosing_tile(position: &LatLon, zoom: u8) -> TilePos {
    let n = 2.0_f64.powi(zoom as i32);
    let max_index = n - 1.0;

    let lon = position.longitude.clamp(MIN_LON, MAX_LON);
    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, max_index);

    let lat = position.latitude.clamp(MIN_LAT, MAX_LAT);
    let lat_rad = lat * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max_index);

    TilePos::new(x as u32, y as u32)
}

/// Returns the minimal tiles rect covering the bounding box.
///
/// Each edge is pulled inwards by a tiny amount (when the box is large
/// enough) so that a box produced from a tiles rect converts back to exactly
/// that rect.
pub fn enclosing_tiles_rect(bbox: &BoundingBox, zoom: u8) -> TilesRect {
    let (min_lat, max_lat) = shrink(bbox.min.latitude, bbox.max.latitude);
    let (min_lon, max_lon) = shrink(bbox.min.longitude, bbox.max.longitude);

    let north_west = enclosing_tile(&LatLon::new(max_lat, min_lon), zoom);
    let south_east = enclosing_tile(&LatLon::new(min_lat, max_lon), zoom);

    TilesRect {
        left: north_west.x.min(south_east.x),
        top: north_west.y.min(south_east.y),
        right: north_west.x.max(south_east.x),
        bottom: north_west.y.max(south_east.y),
    }
}

fn shrink(min: f64, max: f64) -> (f64, f64) {
    if max - min > 2.0 * NOT_THE_NEXT_TILE {
        (min + NOT_THE_NEXT_TILE, max - NOT_THE_NEXT_TILE)
    } else {
        (min, max)
    }
}

/// Returns the bounding box of a single tile.
#[inline]
pub fn tile_bounding_box(tile: &TilePos, zoom: u8) -> BoundingBox {
    tiles_rect_bounding_box(&TilesRect::from(*tile), zoom)
}

/// Returns the bounding box covered by a tiles rect.
///
/// Adjacent tile boxes share their edges.
pub fn tiles_rect_bounding_box(rect: &TilesRect, zoom: u8) -> BoundingBox {
    BoundingBox::new(
        tile_y_to_lat(rect.bottom + 1, zoom),
        tile_x_to_lon(rect.left, zoom),
        tile_y_to_lat(rect.top, zoom),
        tile_x_to_lon(rect.right + 1, zoom),
    )
}

/// Longitude of the western edge of tile column `x`.
#[inline]
pub fn tile_x_to_lon(x: u32, zoom: u8) -> f64 {
    let n = 2.0_f64.powi(zoom as i32);
    x as f64 / n * 360.0 - 180.0
}

/// Latitude of the northern edge of tile row `y` (inverse Web Mercator).
#[inline]
pub fn tile_y_to_lat(y: u32, zoom: u8) -> f64 {
    let n = 2.0_f64.powi(zoom as i32);
    let lat_rad = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan();
    lat_rad * 180.0 / PI
}
