use crate::models::{BoundingBox, Point};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single coordinate pair, GeoJSON order: (longitude, latitude)
pub type Position = (f64, f64);

/// An ordered sequence of positions; closed when first == last
pub type Ring = Vec<Position>;

/// Errors produced while normalizing or validating geometry input
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate-ring: ring has fewer than 3 distinct points")]
    DegenerateRing,

    #[error("out-of-range: coordinate ({0}, {1}) outside [-180,180]/[-90,90]")]
    OutOfRange(f64, f64),
}

/// Canonical geometry representation
///
/// Serializes to/from the GeoJSON geometry shape (`type` + `coordinates`),
/// so zone boundaries round-trip unchanged through the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
}

impl Geometry {
    /// Iterate over every ring of every member polygon
    pub fn rings(&self) -> Vec<&Ring> {
        match self {
            Geometry::Point { .. } => vec![],
            Geometry::Polygon { coordinates } => coordinates.iter().collect(),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flat_map(|p| p.iter()).collect()
            }
        }
    }

    /// Iterate over the outer ring of every member polygon
    pub fn outer_rings(&self) -> Vec<&Ring> {
        match self {
            Geometry::Point { .. } => vec![],
            Geometry::Polygon { coordinates } => coordinates.first().into_iter().collect(),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().filter_map(|p| p.first()).collect()
            }
        }
    }

    /// Member polygons as ring slices (one entry for a Polygon, n for a MultiPolygon)
    pub fn polygons(&self) -> Vec<&[Ring]> {
        match self {
            Geometry::Point { .. } => vec![],
            Geometry::Polygon { coordinates } => vec![coordinates.as_slice()],
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().map(|p| p.as_slice()).collect()
            }
        }
    }
}

/// Normalize a GeoJSON-like value into canonical geometry
///
/// Accepts a bare geometry object or a `Feature` (the wrapped geometry is
/// unwrapped). Returns `Ok(None)` for a `FeatureCollection` (ambiguous) or
/// anything that does not parse as a supported geometry. Recognized polygons
/// that carry invalid coordinates fail with a `GeometryError`.
///
/// The returned geometry owns its coordinates; callers can mutate it without
/// aliasing the input document.
pub fn normalize(input: &Value) -> Result<Option<Geometry>, GeometryError> {
    let geometry_value = match input.get("type").and_then(Value::as_str) {
        Some("Feature") => match input.get("geometry") {
            Some(g) => g,
            None => return Ok(None),
        },
        Some("FeatureCollection") => return Ok(None),
        Some(_) => input,
        None => return Ok(None),
    };

    let geometry: Geometry = match serde_json::from_value(geometry_value.clone()) {
        Ok(g) => g,
        Err(_) => return Ok(None),
    };

    validate_coordinates(&geometry)?;
    let geometry = ensure_closed_rings(geometry);
    validate_rings(&geometry)?;

    Ok(Some(geometry))
}

/// Close any ring whose first and last positions differ
///
/// Idempotent: re-closing an already closed ring is a no-op.
pub fn ensure_closed_rings(geometry: Geometry) -> Geometry {
    fn close(mut ring: Ring) -> Ring {
        if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
            if first != last {
                ring.push(first);
            }
        }
        ring
    }

    match geometry {
        Geometry::Point { coordinates } => Geometry::Point { coordinates },
        Geometry::Polygon { coordinates } => Geometry::Polygon {
            coordinates: coordinates.into_iter().map(close).collect(),
        },
        Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
            coordinates: coordinates
                .into_iter()
                .map(|polygon| polygon.into_iter().map(close).collect())
                .collect(),
        },
    }
}

/// Min/max sweep over every coordinate of the given geometries
///
/// Returns `None` when no finite coordinate was found.
pub fn compute_bounding_box(geometries: &[Geometry]) -> Option<BoundingBox> {
    let mut bbox: Option<BoundingBox> = None;

    let mut visit = |(lng, lat): Position| {
        if !lng.is_finite() || !lat.is_finite() {
            return;
        }
        match bbox.as_mut() {
            Some(b) => {
                b.west = b.west.min(lng);
                b.east = b.east.max(lng);
                b.south = b.south.min(lat);
                b.north = b.north.max(lat);
            }
            None => {
                bbox = Some(BoundingBox {
                    west: lng,
                    south: lat,
                    east: lng,
                    north: lat,
                });
            }
        }
    };

    for geometry in geometries {
        match geometry {
            Geometry::Point { coordinates } => visit(*coordinates),
            _ => {
                for ring in geometry.rings() {
                    for &position in ring {
                        visit(position);
                    }
                }
            }
        }
    }

    bbox
}

/// Vertex-mean centroid over the outer rings
///
/// The closing vertex of each ring is excluded so it does not count twice.
/// This is the plain mean of boundary vertices, not the area-weighted
/// centroid; for highly irregular or self-intersecting polygons the result
/// can sit outside the visual center, which is an accepted limitation.
pub fn compute_centroid(geometry: &Geometry) -> Option<Point> {
    if let Geometry::Point { coordinates: (lng, lat) } = geometry {
        return Some(Point { lng: *lng, lat: *lat });
    }

    let mut sum_lng = 0.0;
    let mut sum_lat = 0.0;
    let mut count = 0usize;

    for ring in geometry.outer_rings() {
        let closed = ring.len() >= 2 && ring.first() == ring.last();
        let vertices = if closed { &ring[..ring.len() - 1] } else { &ring[..] };
        for &(lng, lat) in vertices {
            sum_lng += lng;
            sum_lat += lat;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }

    Some(Point {
        lng: sum_lng / count as f64,
        lat: sum_lat / count as f64,
    })
}

/// Structural equality after rounding each coordinate to `precision` decimals
///
/// Used for no-op boundary-edit detection: an edit that only perturbs
/// coordinates below the precision threshold is treated as unchanged.
pub fn geometries_equal(a: &Geometry, b: &Geometry, precision: u32) -> bool {
    let factor = 10f64.powi(precision as i32);
    let round = |v: f64| (v * factor).round() / factor;
    let positions_equal = |&(alng, alat): &Position, &(blng, blat): &Position| {
        round(alng) == round(blng) && round(alat) == round(blat)
    };
    let rings_equal = |a: &Ring, b: &Ring| {
        a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| positions_equal(x, y))
    };

    match (a, b) {
        (Geometry::Point { coordinates: pa }, Geometry::Point { coordinates: pb }) => {
            positions_equal(pa, pb)
        }
        (Geometry::Polygon { coordinates: pa }, Geometry::Polygon { coordinates: pb }) => {
            pa.len() == pb.len() && pa.iter().zip(pb.iter()).all(|(x, y)| rings_equal(x, y))
        }
        (
            Geometry::MultiPolygon { coordinates: pa },
            Geometry::MultiPolygon { coordinates: pb },
        ) => {
            pa.len() == pb.len()
                && pa.iter().zip(pb.iter()).all(|(xa, xb)| {
                    xa.len() == xb.len()
                        && xa.iter().zip(xb.iter()).all(|(x, y)| rings_equal(x, y))
                })
        }
        _ => false,
    }
}

fn validate_coordinates(geometry: &Geometry) -> Result<(), GeometryError> {
    let check = |(lng, lat): Position| {
        if !lng.is_finite()
            || !lat.is_finite()
            || !(-180.0..=180.0).contains(&lng)
            || !(-90.0..=90.0).contains(&lat)
        {
            return Err(GeometryError::OutOfRange(lng, lat));
        }
        Ok(())
    };

    match geometry {
        Geometry::Point { coordinates } => check(*coordinates),
        _ => {
            for ring in geometry.rings() {
                for &position in ring {
                    check(position)?;
                }
            }
            Ok(())
        }
    }
}

fn validate_rings(geometry: &Geometry) -> Result<(), GeometryError> {
    for ring in geometry.rings() {
        let mut distinct: Vec<Position> = Vec::new();
        for &position in ring {
            if !distinct.contains(&position) {
                distinct.push(position);
            }
        }
        if distinct.len() < 3 {
            return Err(GeometryError::DegenerateRing);
        }
    }
    Ok(())
}
