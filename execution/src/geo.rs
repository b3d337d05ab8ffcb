//! Grid coordinate mapping. The world is tiled into fixed 16m squares in
//! Web-Mercator meter space; a plot is addressed by its integer cell index.
//! Nothing geographic is stored: floats exist only at this boundary.

use std::f64::consts::PI;

/// Edge length of one grid cell in projected meters.
pub const CELL_SIZE_METERS: f64 = 16.0;

/// WGS84 Earth radius used by the Web-Mercator projection.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Latitude bound of the Web-Mercator square.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Largest representable cell index on either axis:
/// `floor(pi * EARTH_RADIUS / CELL_SIZE)`.
pub const MAX_CELL_INDEX: i64 = 1_252_344;

/// Whether a cell lies inside the projectable world square. Cells touching
/// the antimeridian or polar edge are rejected so every accepted cell has a
/// projectable center.
pub fn in_bounds(gx: i64, gy: i64) -> bool {
    (-MAX_CELL_INDEX..MAX_CELL_INDEX).contains(&gx)
        && (-MAX_CELL_INDEX..MAX_CELL_INDEX).contains(&gy)
}

/// Projects geographic coordinates to the containing grid cell. Returns
/// `None` outside the projectable domain (non-finite input, latitude beyond
/// the Mercator bound, longitude beyond +-180).
pub fn to_grid(lat: f64, lon: f64) -> Option<(i64, i64)> {
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    if lat.abs() > MAX_MERCATOR_LAT || lon.abs() > 180.0 {
        return None;
    }

    let x = EARTH_RADIUS_METERS * lon.to_radians();
    let y = EARTH_RADIUS_METERS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();

    let gx = (x / CELL_SIZE_METERS).floor() as i64;
    let gy = (y / CELL_SIZE_METERS).floor() as i64;

    Some((gx, gy))
}

/// Inverse projection of a fractional grid coordinate (cell corners at
/// integers, centers at `+0.5`). Returns `(lat, lon)`.
pub fn grid_point(gx: f64, gy: f64) -> (f64, f64) {
    let x = gx * CELL_SIZE_METERS;
    let y = gy * CELL_SIZE_METERS;

    let lon_rad = x / EARTH_RADIUS_METERS;
    let lat_rad = 2.0 * (y / EARTH_RADIUS_METERS).exp().atan() - PI / 2.0;

    (lat_rad.to_degrees(), lon_rad.to_degrees())
}

/// Geographic center of a cell, the exact inverse of [to_grid] for every
/// in-bounds cell.
pub fn cell_center(gx: i64, gy: i64) -> (f64, f64) {
    grid_point(gx as f64 + 0.5, gy as f64 + 0.5)
}

/// Great-circle distance between two `(lat, lon)` points in meters, via the
/// haversine formula on a sphere of [EARTH_RADIUS_METERS].
pub fn distance_meters(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let lat1 = p1.0.to_radians();
    let lon1 = p1.1.to_radians();
    let lat2 = p2.0.to_radians();
    let lon2 = p2.1.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_METERS * c
}
