use crate::core::geometry::{Geometry, Position};
use crate::models::{BoundingBox, Point};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude
const KM_PER_DEGREE: f64 = 111.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Project a position onto a local equirectangular plane in kilometers
///
/// Accurate enough at city/regional scale, which is the operational footprint
/// this service targets. The plane is anchored at `origin` so distances stay
/// small and longitude compression follows the origin's latitude.
#[inline]
fn project_km(origin: &Point, (lng, lat): Position) -> (f64, f64) {
    let x = (lng - origin.lng) * KM_PER_DEGREE * origin.lat.to_radians().cos();
    let y = (lat - origin.lat) * KM_PER_DEGREE;
    (x, y)
}

/// Minimum distance in kilometers from a point to a line segment
///
/// Both segment endpoints are projected onto the equirectangular plane
/// anchored at the point, then the point (the plane origin) is projected
/// onto the segment.
#[inline]
pub fn point_to_segment_km(point: &Point, a: Position, b: Position) -> f64 {
    let (ax, ay) = project_km(point, a);
    let (bx, by) = project_km(point, b);

    let dx = bx - ax;
    let dy = by - ay;
    let length_sq = dx * dx + dy * dy;

    if length_sq == 0.0 {
        return (ax * ax + ay * ay).sqrt();
    }

    // Parameter of the projection of the origin onto the segment, clamped
    let t = (-(ax * dx + ay * dy) / length_sq).clamp(0.0, 1.0);
    let px = ax + t * dx;
    let py = ay + t * dy;

    (px * px + py * py).sqrt()
}

/// Minimum distance in kilometers from a point to any boundary edge
///
/// Scans every edge of every ring. Returns `None` for geometry without rings.
pub fn min_distance_to_boundary_km(point: &Point, geometry: &Geometry) -> Option<f64> {
    let mut best: Option<f64> = None;

    for ring in geometry.rings() {
        for edge in ring.windows(2) {
            let d = point_to_segment_km(point, edge[0], edge[1]);
            best = Some(match best {
                Some(current) => current.min(d),
                None => d,
            });
        }
    }

    best
}

/// Calculate a bounding box around a center point
///
/// This is much faster than Haversine for pre-filtering.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
pub fn bounding_box_around(point: &Point, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let lon_delta = radius_km / (KM_PER_DEGREE * point.lat.to_radians().cos().abs().max(1e-6));

    BoundingBox {
        west: point.lng - lon_delta,
        south: point.lat - lat_delta,
        east: point.lng + lon_delta,
        north: point.lat + lat_delta,
    }
}

/// Check if two bounding boxes overlap
#[inline]
pub fn boxes_intersect(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.west <= b.east && b.west <= a.east && a.south <= b.north && b.south <= a.north
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let distance = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_haversine_distance_zero() {
        let distance = haversine_distance(51.5074, -0.1278, 51.5074, -0.1278);
        assert!(distance < 0.01);
    }

    #[test]
    fn test_point_to_segment_perpendicular() {
        // Point due south of a horizontal edge at lat 51.53
        let point = Point { lng: -0.1, lat: 51.5 };
        let d = point_to_segment_km(&point, (-0.2, 51.53), (0.0, 51.53));

        // 0.03 degrees of latitude ≈ 3.33 km
        assert!((d - 3.33).abs() < 0.1, "Expected ~3.33km, got {}", d);
    }

    #[test]
    fn test_point_to_segment_clamps_to_endpoint() {
        // Point west of both endpoints; nearest point is the west endpoint
        let point = Point { lng: -0.5, lat: 51.53 };
        let d = point_to_segment_km(&point, (-0.2, 51.53), (0.0, 51.53));

        let expected = haversine_distance(51.53, -0.5, 51.53, -0.2);
        assert!((d - expected).abs() < 0.1, "Expected ~{}km, got {}", expected, d);
    }

    #[test]
    fn test_min_distance_to_boundary() {
        let geometry = Geometry::Polygon {
            coordinates: vec![vec![
                (-0.125, 51.5),
                (-0.09, 51.5),
                (-0.09, 51.53),
                (-0.125, 51.53),
                (-0.125, 51.5),
            ]],
        };

        // Point just east of the east edge
        let point = Point { lng: -0.08, lat: 51.515 };
        let d = min_distance_to_boundary_km(&point, &geometry).unwrap();

        // 0.01 degrees of longitude at lat ~51.5 ≈ 0.69 km
        assert!(d > 0.5 && d < 0.9, "Expected ~0.69km, got {}", d);
    }

    #[test]
    fn test_min_distance_no_rings() {
        let point = Point { lng: 0.0, lat: 0.0 };
        let geometry = Geometry::Point { coordinates: (1.0, 1.0) };
        assert!(min_distance_to_boundary_km(&point, &geometry).is_none());
    }

    #[test]
    fn test_bounding_box_around() {
        let point = Point { lng: -0.1278, lat: 51.5074 };
        let bbox = bounding_box_around(&point, 10.0);

        assert!(bbox.west < point.lng && bbox.east > point.lng);
        assert!(bbox.south < point.lat && bbox.north > point.lat);

        // 20km / 111km per degree ≈ 0.18 degrees of latitude
        let lat_span = bbox.north - bbox.south;
        assert!((lat_span - 0.18).abs() < 0.02, "Lat span should be ~0.18 degrees");
    }

    #[test]
    fn test_boxes_intersect() {
        let a = BoundingBox { west: -1.0, south: -1.0, east: 1.0, north: 1.0 };
        let b = BoundingBox { west: 0.5, south: 0.5, east: 2.0, north: 2.0 };
        let c = BoundingBox { west: 5.0, south: 5.0, east: 6.0, north: 6.0 };

        assert!(boxes_intersect(&a, &b));
        assert!(boxes_intersect(&b, &a));
        assert!(!boxes_intersect(&a, &c));
    }
}
