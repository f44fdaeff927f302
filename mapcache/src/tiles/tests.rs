//! Tests for tile math

use super::*;
use proptest::prelude::*;

#[test]
fn test_new_york_city_at_zoom_16() {
    // New York City: 40.7128°N, 74.0060°W
    let tile = enclosing_tile(&LatLon::new(40.7128, -74.0060), 16);
    assert_eq!(tile.x, 19295, "NYC longitude should map to x 19295 at zoom 16");
    assert_eq!(tile.y, 24640, "NYC latitude should map to y 24640 at zoom 16");
}

#[test]
fn test_london_at_zoom_10() {
    let tile = enclosing_tile(&LatLon::new(51.5074, -0.1278), 10);
    assert_eq!(tile, TilePos::new(511, 340));
}

#[test]
fn test_equator_prime_meridian() {
    // At zoom 1: 2×2 tiles, 0°N 0°E is the corner shared by all four.
    // Border positions belong to the tile south-east of them.
    let tile = enclosing_tile(&LatLon::new(0.0, 0.0), 1);
    assert_eq!(tile, TilePos::new(1, 1));
}

#[test]
fn test_positions_beyond_mercator_range_are_clamped() {
    let north = enclosing_tile(&LatLon::new(89.9, 0.0), 4);
    let south = enclosing_tile(&LatLon::new(-89.9, 0.0), 4);
    let east = enclosing_tile(&LatLon::new(0.0, 180.0), 4);

    assert_eq!(north.y, 0);
    assert_eq!(south.y, 15);
    assert_eq!(east.x, 15);
}

#[test]
fn test_validate_zoom() {
    assert_eq!(validate_zoom(0), Ok(0));
    assert_eq!(validate_zoom(MAX_ZOOM), Ok(MAX_ZOOM));
    assert!(matches!(
        validate_zoom(MAX_ZOOM + 1),
        Err(CoordError::InvalidZoom(_))
    ));
}

#[test]
fn test_lat_lon_try_new_validates() {
    assert!(LatLon::try_new(52.5, 13.4).is_ok());
    assert!(matches!(
        LatLon::try_new(90.0, 0.0),
        Err(CoordError::InvalidLatitude(_))
    ));
    assert!(matches!(
        LatLon::try_new(0.0, -181.0),
        Err(CoordError::InvalidLongitude(_))
    ));
}

#[test]
fn test_tiles_rect_try_new_rejects_inverted_edges() {
    assert!(TilesRect::try_new(1, 1, 2, 2).is_ok());
    let err = TilesRect::try_new(3, 1, 2, 2).unwrap_err();
    assert!(err.to_string().contains("inverted"));
}

#[test]
fn test_tile_bounding_box_edges() {
    let bbox = tile_bounding_box(&TilePos::new(32768, 32768), 16);

    assert_eq!(bbox.max.latitude, 0.0);
    assert_eq!(bbox.min.longitude, 0.0);
    assert!((bbox.max.longitude - 0.0054931640625).abs() < 1e-12);
    assert!((bbox.min.latitude + 0.005493164).abs() < 1e-8);
}

#[test]
fn test_tiles_rect_round_trip_through_bounding_box() {
    let rect = TilesRect::try_new(32767, 32767, 32768, 32768).unwrap();
    let bbox = tiles_rect_bounding_box(&rect, 16);

    assert_eq!(enclosing_tiles_rect(&bbox, 16), rect);
}

#[test]
fn test_enclosing_tiles_rect_of_close_positions() {
    let positions = [
        LatLon::new(0.00001, 0.00001),
        LatLon::new(0.0001, 0.0001),
        LatLon::new(0.0002, 0.0002),
    ];
    let bbox = BoundingBox::enclosing(&positions).unwrap();

    let rect = enclosing_tiles_rect(&bbox, 16);
    assert_eq!(rect.size(), 1);
    assert_eq!(rect.tiles().next(), Some(TilePos::new(32768, 32767)));
}

#[test]
fn test_enclosing_tiles_rect_of_degenerate_box() {
    let p = LatLon::new(0.0001, 0.0001);
    let bbox = BoundingBox { min: p, max: p };

    let rect = enclosing_tiles_rect(&bbox, 16);
    assert_eq!(rect, TilesRect::from(enclosing_tile(&p, 16)));
}

#[test]
fn test_tiles_iterates_row_major() {
    let rect = TilesRect::try_new(4, 7, 5, 8).unwrap();
    let tiles: Vec<_> = rect.tiles().collect();

    assert_eq!(
        tiles,
        vec![
            TilePos::new(4, 7),
            TilePos::new(5, 7),
            TilePos::new(4, 8),
            TilePos::new(5, 8),
        ]
    );
    assert_eq!(rect.size(), 4);
    assert!(tiles.iter().all(|t| rect.contains(t)));
    assert!(!rect.contains(&TilePos::new(6, 7)));
}

#[test]
fn test_last_tiles_is_tail_of_row_major_order() {
    let rect = TilesRect::try_new(4, 7, 6, 9).unwrap();
    let all: Vec<_> = rect.tiles().collect();

    let tail: Vec<_> = rect.last_tiles(4).collect();
    assert_eq!(tail, all[5..].to_vec());
    assert_eq!(rect.last_tiles(100).count(), 9);
    assert_eq!(rect.last_tiles(0).count(), 0);
}

#[test]
fn test_minimal_enclosing() {
    assert_eq!(TilesRect::minimal_enclosing(Vec::new()), None);

    let rect = TilesRect::minimal_enclosing(vec![
        TilePos::new(10, 3),
        TilePos::new(8, 5),
        TilePos::new(9, 4),
    ])
    .unwrap();
    assert_eq!(rect, TilesRect::try_new(8, 3, 10, 5).unwrap());
}

#[test]
fn test_bounding_box_contains_and_intersects() {
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);

    assert!(bbox.contains(&LatLon::new(0.5, 0.5)));
    assert!(bbox.contains(&LatLon::new(1.0, 0.0)), "edges are inclusive");
    assert!(!bbox.contains(&LatLon::new(1.5, 0.5)));

    assert!(bbox.intersects(&BoundingBox::new(0.5, 0.5, 2.0, 2.0)));
    assert!(!bbox.intersects(&BoundingBox::new(1.5, 1.5, 2.0, 2.0)));
}

#[test]
fn test_bounding_box_enclosing_empty() {
    assert_eq!(BoundingBox::enclosing(&[]), None);
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #[test]
    fn prop_position_lies_in_its_tile(
        lat in -85.0f64..85.0,
        lon in -179.99f64..179.99,
        zoom in 0u8..=20,
    ) {
        let position = LatLon::new(lat, lon);
        let tile = enclosing_tile(&position, zoom);
        let bbox = tile_bounding_box(&tile, zoom);

        let tolerance = 1e-9;
        prop_assert!(position.latitude >= bbox.min.latitude - tolerance);
        prop_assert!(position.latitude <= bbox.max.latitude + tolerance);
        prop_assert!(position.longitude >= bbox.min.longitude - tolerance);
        prop_assert!(position.longitude <= bbox.max.longitude + tolerance);
    }

    #[test]
    fn prop_tiles_rect_round_trips_at_zoom_16(
        left in 0u32..65000,
        top in 0u32..65000,
        width in 0u32..8,
        height in 0u32..8,
    ) {
        let rect = TilesRect::try_new(left, top, left + width, top + height).unwrap();
        let bbox = tiles_rect_bounding_box(&rect, 16);

        prop_assert_eq!(enclosing_tiles_rect(&bbox, 16), rect);
    }
}
