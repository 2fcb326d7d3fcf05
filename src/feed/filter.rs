use crate::models::FeedQuery;
use serde_json::Value;
use std::collections::HashSet;

/// Zone-membership filter attached to one live feed subscriber
#[derive(Debug, Clone, Default)]
pub struct SubscriberFilter {
    pub zone_ids: HashSet<String>,
    pub include_out_of_zone: bool,
    pub out_of_zone_only: bool,
}

/// Zone metadata derived from an event payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventMeta {
    pub zone_id: Option<String>,
    pub allow_out_of_zone: bool,
}

impl SubscriberFilter {
    /// Decide whether an event with the given metadata reaches this subscriber
    ///
    /// - `out_of_zone_only`: match iff the event allows out-of-zone delivery;
    ///   the zone id is irrelevant.
    /// - Empty `zone_ids`: unscoped subscriber, matches everything.
    /// - Otherwise: the event's zone must be in the watched set, or the event
    ///   allows out-of-zone delivery and the subscriber opted into it.
    pub fn matches(&self, meta: &EventMeta) -> bool {
        if self.out_of_zone_only {
            return meta.allow_out_of_zone;
        }

        if self.zone_ids.is_empty() {
            return true;
        }

        if let Some(zone_id) = &meta.zone_id {
            if self.zone_ids.contains(zone_id) {
                return true;
            }
        }

        meta.allow_out_of_zone && self.include_out_of_zone
    }
}

impl From<&FeedQuery> for SubscriberFilter {
    fn from(query: &FeedQuery) -> Self {
        let mut zone_ids = HashSet::new();

        if let Some(id) = &query.zone_id {
            if !id.trim().is_empty() {
                zone_ids.insert(id.trim().to_string());
            }
        }
        if let Some(csv) = &query.zone_ids {
            for id in csv.split(',') {
                let id = id.trim();
                if !id.is_empty() {
                    zone_ids.insert(id.to_string());
                }
            }
        }

        Self {
            zone_ids,
            include_out_of_zone: query.include_out_of_zone,
            out_of_zone_only: query.out_of_zone_only,
        }
    }
}

impl EventMeta {
    /// Pull zone metadata out of an event payload
    ///
    /// Looks at `payload.zoneId` falling back to `payload.post.zoneId`, and
    /// `payload.allowOutOfZone` falling back to `payload.post.allowOutOfZone`.
    pub fn from_payload(payload: &Value) -> Self {
        let post = payload.get("post");

        let zone_id = payload
            .get("zoneId")
            .or_else(|| post.and_then(|p| p.get("zoneId")))
            .and_then(Value::as_str)
            .map(str::to_string);

        let allow_out_of_zone = payload
            .get("allowOutOfZone")
            .or_else(|| post.and_then(|p| p.get("allowOutOfZone")))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Self {
            zone_id,
            allow_out_of_zone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scoped(zone_ids: &[&str], include_out_of_zone: bool) -> SubscriberFilter {
        SubscriberFilter {
            zone_ids: zone_ids.iter().map(|s| s.to_string()).collect(),
            include_out_of_zone,
            out_of_zone_only: false,
        }
    }

    #[test]
    fn test_scoped_subscriber_only_sees_watched_zones() {
        let filter = scoped(&["Z1"], false);

        let other_zone = EventMeta {
            zone_id: Some("Z2".to_string()),
            allow_out_of_zone: true,
        };
        assert!(!filter.matches(&other_zone));

        let watched = EventMeta {
            zone_id: Some("Z1".to_string()),
            allow_out_of_zone: false,
        };
        assert!(filter.matches(&watched));
    }

    #[test]
    fn test_include_out_of_zone_extends_scoped_filter() {
        let filter = scoped(&["Z1"], true);

        let out_of_zone = EventMeta {
            zone_id: Some("Z2".to_string()),
            allow_out_of_zone: true,
        };
        assert!(filter.matches(&out_of_zone));

        let pinned = EventMeta {
            zone_id: Some("Z2".to_string()),
            allow_out_of_zone: false,
        };
        assert!(!filter.matches(&pinned));
    }

    #[test]
    fn test_unscoped_subscriber_sees_everything() {
        let filter = SubscriberFilter::default();

        assert!(filter.matches(&EventMeta {
            zone_id: Some("Z9".to_string()),
            allow_out_of_zone: false,
        }));
        assert!(filter.matches(&EventMeta::default()));
    }

    #[test]
    fn test_out_of_zone_only() {
        let filter = SubscriberFilter {
            zone_ids: HashSet::new(),
            include_out_of_zone: false,
            out_of_zone_only: true,
        };

        assert!(!filter.matches(&EventMeta {
            zone_id: Some("Z1".to_string()),
            allow_out_of_zone: false,
        }));
        assert!(filter.matches(&EventMeta {
            zone_id: Some("Z1".to_string()),
            allow_out_of_zone: true,
        }));
        assert!(filter.matches(&EventMeta {
            zone_id: None,
            allow_out_of_zone: true,
        }));
    }

    #[test]
    fn test_filter_from_query_dedups_zone_ids() {
        let query = FeedQuery {
            zone_id: Some("Z1".to_string()),
            zone_ids: Some("Z1, Z2,,Z3 ".to_string()),
            include_out_of_zone: true,
            out_of_zone_only: false,
        };

        let filter = SubscriberFilter::from(&query);
        assert_eq!(filter.zone_ids.len(), 3);
        assert!(filter.zone_ids.contains("Z1"));
        assert!(filter.zone_ids.contains("Z2"));
        assert!(filter.zone_ids.contains("Z3"));
        assert!(filter.include_out_of_zone);
    }

    #[test]
    fn test_meta_from_payload_direct_fields() {
        let meta = EventMeta::from_payload(&json!({
            "zoneId": "Z1",
            "allowOutOfZone": true,
        }));

        assert_eq!(meta.zone_id.as_deref(), Some("Z1"));
        assert!(meta.allow_out_of_zone);
    }

    #[test]
    fn test_meta_from_payload_nested_post() {
        let meta = EventMeta::from_payload(&json!({
            "post": { "zoneId": "Z7", "allowOutOfZone": true },
        }));

        assert_eq!(meta.zone_id.as_deref(), Some("Z7"));
        assert!(meta.allow_out_of_zone);
    }

    #[test]
    fn test_meta_direct_field_wins_over_post() {
        let meta = EventMeta::from_payload(&json!({
            "zoneId": "Z1",
            "post": { "zoneId": "Z7", "allowOutOfZone": true },
        }));

        assert_eq!(meta.zone_id.as_deref(), Some("Z1"));
        assert!(meta.allow_out_of_zone);
    }

    #[test]
    fn test_meta_from_empty_payload() {
        let meta = EventMeta::from_payload(&json!({}));
        assert!(meta.zone_id.is_none());
        assert!(!meta.allow_out_of_zone);
    }
}
