//! Linear interpolation used to clip curves exactly at window boundaries.

use crate::data_types::PointData;

/// Point on the line through `p1` and `p2` at `x`.
///
/// The points may be given in any order. Returns `None` if `x` lies outside
/// the segment or any coordinate is `NaN`.
pub fn calc_intersection(p1: PointData, p2: PointData, x: f64) -> Option<PointData> {
    if p1.is_nan() || p2.is_nan() || x.is_nan() {
        return None;
    }
    let (p1, p2) = if p1.x > p2.x { (p2, p1) } else { (p1, p2) };
    if x < p1.x || x > p2.x {
        return None;
    }
    let dx = p2.x - p1.x;
    if dx == 0.0 {
        return Some(p1);
    }
    let y = p1.y + (p2.y - p1.y) * (x - p1.x) / dx;
    Some(PointData::new(x, y))
}
