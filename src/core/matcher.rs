use crate::core::{
    containment::partition_zones,
    distance::{bounding_box_around, boxes_intersect, min_distance_to_boundary_km},
    scoring::{calculate_zone_score, centroid_distance_km},
};
use crate::models::{
    FallbackDescriptor, Point, ScoringWeights, Service, Zone, ZoneMatch, FALLBACK_REASON,
};
use std::collections::HashMap;
use thiserror::Error;

/// Validation failures that abort a match before any geometry runs
///
/// Bad input must never reach the fallback path, so every check happens up
/// front and the whole match fails fast.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid point: latitude {lat} / longitude {lng} out of range or not finite")]
    InvalidPoint { lat: f64, lng: f64 },

    #[error("invalid radius: {0} (must be finite and positive)")]
    InvalidRadius(f64),

    #[error("invalid limit: must be at least 1")]
    InvalidLimit,
}

/// Per-request knobs; both optional
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

/// Result of a point match
#[derive(Debug)]
pub struct MatchOutcome {
    pub matches: Vec<ZoneMatch>,
    pub fallback: Option<FallbackDescriptor>,
    pub total_services: usize,
}

/// Main matching orchestrator
///
/// # Pipeline stages
/// 1. Input validation (fail fast on bad points/options)
/// 2. Optional radius bounding-box pre-filter
/// 3. Containment partition
/// 4. Scoring and ranking, or nearest-zone fallback
///
/// Purely functional over the supplied zone/service snapshot; safe to share
/// across request handlers without locking.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
}

impl Matcher {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    /// Match a point against a zone snapshot
    ///
    /// Returns ranked matches over the containing zones. When nothing
    /// contains the point, the nearest zone by projected boundary distance is
    /// returned as a single synthetic match with a populated `fallback`
    /// descriptor, so the response shape stays uniform. With no candidate
    /// zones at all the result is empty and `fallback` is `None`.
    pub fn match_point(
        &self,
        point: &Point,
        zones: Vec<Zone>,
        services_by_zone: &HashMap<String, Vec<Service>>,
        options: &MatchOptions,
    ) -> Result<MatchOutcome, MatchError> {
        validate_point(point)?;
        validate_options(options)?;

        // Radius pre-filter: drops zones whose box cannot touch the circle.
        // Never changes containment for zones that do intersect.
        let candidates: Vec<Zone> = match options.radius_km {
            Some(radius_km) => {
                let circle_box = bounding_box_around(point, radius_km);
                zones
                    .into_iter()
                    .filter(|zone| boxes_intersect(&zone.bounding_box, &circle_box))
                    .collect()
            }
            None => zones,
        };

        let partition = partition_zones(point, candidates);

        let (ranked_zones, fallback) = if partition.containing.is_empty() {
            match resolve_fallback(point, &partition.excluded) {
                Some(descriptor) => {
                    let zone = partition
                        .excluded
                        .into_iter()
                        .find(|z| z.id == descriptor.zone_id);
                    (zone.into_iter().collect(), Some(descriptor))
                }
                None => (vec![], None),
            }
        } else {
            (partition.containing, None)
        };

        let matches = rank_matches(
            ranked_zones,
            point,
            services_by_zone,
            options.limit,
            &self.weights,
        );
        let total_services = matches.iter().map(|m| m.services.len()).sum();

        Ok(MatchOutcome {
            matches,
            fallback,
            total_services,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Score, sort descending and truncate
///
/// The per-zone service lists are opaque here; whatever category filtering
/// the caller wanted has already happened upstream.
pub fn rank_matches(
    zones: Vec<Zone>,
    point: &Point,
    services_by_zone: &HashMap<String, Vec<Service>>,
    limit: Option<usize>,
    weights: &ScoringWeights,
) -> Vec<ZoneMatch> {
    let mut matches: Vec<ZoneMatch> = zones
        .into_iter()
        .map(|zone| {
            let services = services_by_zone.get(&zone.id).cloned().unwrap_or_default();
            let score = calculate_zone_score(&zone, point, services.len(), weights);
            let distance_km = centroid_distance_km(&zone, point);
            ZoneMatch {
                zone,
                services,
                score,
                distance_km,
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.distance_km
                    .partial_cmp(&b.distance_km)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    if let Some(limit) = limit {
        matches.truncate(limit);
    }

    matches
}

/// Nearest zone by projected boundary distance
///
/// Invoked only when the containing set is empty. Returns `None` on an empty
/// candidate set; the caller reports "no coverage" instead of inventing a
/// fallback.
pub fn resolve_fallback(point: &Point, candidates: &[Zone]) -> Option<FallbackDescriptor> {
    let mut best: Option<(&Zone, f64)> = None;

    for zone in candidates {
        let Some(distance_km) = min_distance_to_boundary_km(point, &zone.boundary) else {
            continue;
        };
        match best {
            Some((_, current)) if current <= distance_km => {}
            _ => best = Some((zone, distance_km)),
        }
    }

    best.map(|(zone, distance_km)| FallbackDescriptor {
        reason: FALLBACK_REASON.to_string(),
        zone_id: zone.id.clone(),
        distance_km,
    })
}

fn validate_point(point: &Point) -> Result<(), MatchError> {
    if !point.lat.is_finite()
        || !point.lng.is_finite()
        || !(-90.0..=90.0).contains(&point.lat)
        || !(-180.0..=180.0).contains(&point.lng)
    {
        return Err(MatchError::InvalidPoint {
            lat: point.lat,
            lng: point.lng,
        });
    }
    Ok(())
}

fn validate_options(options: &MatchOptions) -> Result<(), MatchError> {
    if let Some(radius_km) = options.radius_km {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(MatchError::InvalidRadius(radius_km));
        }
    }
    if options.limit == Some(0) {
        return Err(MatchError::InvalidLimit);
    }
    Ok(())
}
