use crate::core::geometry::{Geometry, Position, Ring};
use crate::models::{Point, Zone};

/// Tolerance for the on-edge test, in degree space
const EDGE_EPSILON: f64 = 1e-9;

/// Result of partitioning zones around a point
#[derive(Debug)]
pub struct Partition {
    pub containing: Vec<Zone>,
    pub excluded: Vec<Zone>,
}

/// Even-odd point-in-polygon test over a polygon's rings
///
/// A point exactly on a ring edge counts as contained. Inclusive boundary
/// semantics keep points on shared zone borders deterministically assigned
/// instead of dropping into the fallback path.
pub fn polygon_contains(rings: &[Ring], point: &Point) -> bool {
    for ring in rings {
        if point_on_ring(ring, point) {
            return true;
        }
    }

    // Crossing parity across all rings; holes flip the parity back out
    let mut inside = false;
    for ring in rings {
        if ring_crossings_odd(ring, point) {
            inside = !inside;
        }
    }
    inside
}

/// Containment against any geometry variant
///
/// A MultiPolygon contains the point if any member polygon does. A bare
/// point geometry never contains anything.
pub fn geometry_contains(geometry: &Geometry, point: &Point) -> bool {
    geometry
        .polygons()
        .iter()
        .any(|rings| polygon_contains(rings, point))
}

/// Split zones into those whose boundary contains the point and the rest
///
/// Linear scan over the snapshot: O(zones × vertices). Fine for a provider's
/// operational footprint; a spatial index would feed pre-filtered candidates
/// at larger scale.
pub fn partition_zones(point: &Point, zones: Vec<Zone>) -> Partition {
    let (containing, excluded) = zones
        .into_iter()
        .partition(|zone| geometry_contains(&zone.boundary, point));

    Partition { containing, excluded }
}

/// Ray-casting crossing parity for one ring
fn ring_crossings_odd(ring: &[Position], point: &Point) -> bool {
    if ring.len() < 2 {
        return false;
    }

    let mut odd = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];

        let crosses = ((yi > point.lat) != (yj > point.lat))
            && (point.lng < (xj - xi) * (point.lat - yi) / (yj - yi) + xi);
        if crosses {
            odd = !odd;
        }
        j = i;
    }
    odd
}

/// Check whether the point lies on any edge of the ring
fn point_on_ring(ring: &[Position], point: &Point) -> bool {
    ring.windows(2)
        .any(|edge| point_on_segment(point, edge[0], edge[1]))
}

fn point_on_segment(point: &Point, (ax, ay): Position, (bx, by): Position) -> bool {
    let cross = (bx - ax) * (point.lat - ay) - (by - ay) * (point.lng - ax);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }

    // Collinear; check the point sits between the endpoints
    let dot = (point.lng - ax) * (bx - ax) + (point.lat - ay) * (by - ay);
    let length_sq = (bx - ax).powi(2) + (by - ay).powi(2);

    dot >= -EDGE_EPSILON && dot <= length_sq + EDGE_EPSILON
}
