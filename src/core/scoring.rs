use crate::core::distance::haversine_distance;
use crate::models::{Point, ScoringWeights, Zone};

/// Composite zone score; strictly positive, higher is better
///
/// Scoring formula:
/// score = service_weight * service_count    # dominant term
///       + demand_weight * demand_level      # high=3, medium=2, low=1
///       + proximity_weight / (1 + distance) # centroid distance tie-breaker
///
/// With the default weights (100 / 10 / 1) the ordering contract holds by
/// construction: any extra matching service beats every possible demand and
/// proximity contribution, and a demand step beats any proximity gap.
pub fn calculate_zone_score(
    zone: &Zone,
    point: &Point,
    service_count: usize,
    weights: &ScoringWeights,
) -> f64 {
    let distance_km = centroid_distance_km(zone, point);

    weights.service * service_count as f64
        + weights.demand * zone.demand_level.weight()
        + weights.proximity / (1.0 + distance_km)
}

/// Distance in kilometers from the query point to the zone centroid
#[inline]
pub fn centroid_distance_km(zone: &Zone, point: &Point) -> f64 {
    haversine_distance(point.lat, point.lng, zone.centroid.lat, zone.centroid.lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Geometry;
    use crate::models::DemandLevel;

    fn zone_at(id: &str, lng: f64, lat: f64, demand: DemandLevel) -> Zone {
        let d = 0.01;
        Zone::from_boundary(
            id.to_string(),
            "c1".to_string(),
            format!("Zone {}", id),
            Geometry::Polygon {
                coordinates: vec![vec![
                    (lng - d, lat - d),
                    (lng + d, lat - d),
                    (lng + d, lat + d),
                    (lng - d, lat + d),
                    (lng - d, lat - d),
                ]],
            },
            demand,
        )
        .unwrap()
    }

    #[test]
    fn test_score_strictly_positive() {
        let zone = zone_at("z1", -0.1, 51.5, DemandLevel::Low);
        let point = Point { lng: 10.0, lat: 40.0 };
        let weights = ScoringWeights::default();

        let score = calculate_zone_score(&zone, &point, 0, &weights);
        assert!(score > 0.0);
    }

    #[test]
    fn test_more_services_always_outranks() {
        let point = Point { lng: -0.1, lat: 51.5 };
        let weights = ScoringWeights::default();

        // Fewer services, but best demand level and centroid on top of the point
        let near_high = zone_at("near", -0.1, 51.5, DemandLevel::High);
        // More services, worst demand level, far centroid
        let far_low = zone_at("far", 2.0, 48.0, DemandLevel::Low);

        let score_near = calculate_zone_score(&near_high, &point, 1, &weights);
        let score_far = calculate_zone_score(&far_low, &point, 2, &weights);

        assert!(score_far > score_near);
    }

    #[test]
    fn test_demand_breaks_service_count_ties() {
        let point = Point { lng: -0.1, lat: 51.5 };
        let weights = ScoringWeights::default();

        // Equal service counts; the high-demand zone is much farther away
        let near_low = zone_at("near", -0.1, 51.5, DemandLevel::Low);
        let far_high = zone_at("far", 2.0, 48.0, DemandLevel::High);

        let score_near = calculate_zone_score(&near_low, &point, 3, &weights);
        let score_far = calculate_zone_score(&far_high, &point, 3, &weights);

        assert!(score_far > score_near);
    }

    #[test]
    fn test_distance_breaks_remaining_ties() {
        let point = Point { lng: -0.1, lat: 51.5 };
        let weights = ScoringWeights::default();

        let near = zone_at("near", -0.11, 51.51, DemandLevel::Medium);
        let far = zone_at("far", 0.5, 51.9, DemandLevel::Medium);

        let score_near = calculate_zone_score(&near, &point, 2, &weights);
        let score_far = calculate_zone_score(&far, &point, 2, &weights);

        assert!(score_near > score_far);
    }
}
