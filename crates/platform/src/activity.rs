use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finhub_core::{ActivityId, DomainError, DomainResult, UserId};

/// Where an activity came from, as reported by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityDetails {
    pub ip_address: String,
    pub city: String,
    pub country: String,
    pub region_name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub user_id: UserId,
    pub activity_type: String,
    pub details: ActivityDetails,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActivityDraft {
    pub activity_type: String,
    #[serde(default)]
    pub details: ActivityDetails,
}

impl Activity {
    pub fn record(
        id: ActivityId,
        user_id: UserId,
        draft: ActivityDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let activity_type = draft.activity_type.trim();
        if activity_type.is_empty() {
            return Err(DomainError::validation("activityType is required"));
        }
        Ok(Self {
            id,
            user_id,
            activity_type: activity_type.to_string(),
            details: draft.details,
            timestamp: now,
        })
    }
}

/// Sort by timestamp, latest first.
pub fn newest_first(activities: &mut [Activity]) {
    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn details_default_to_empty_strings() {
        let draft: ActivityDraft =
            serde_json::from_value(serde_json::json!({"activityType": "login", "details": {"city": "Lagos"}}))
                .unwrap();
        let activity = Activity::record(ActivityId::new(), UserId::new(), draft, Utc::now()).unwrap();
        assert_eq!(activity.details.city, "Lagos");
        assert_eq!(activity.details.ip_address, "");
    }

    #[test]
    fn blank_type_is_rejected() {
        let draft = ActivityDraft {
            activity_type: "  ".into(),
            details: ActivityDetails::default(),
        };
        assert!(Activity::record(ActivityId::new(), UserId::new(), draft, Utc::now()).is_err());
    }

    #[test]
    fn newest_first_orders_by_timestamp_descending() {
        let now = Utc::now();
        let make = |offset: i64| {
            let draft = ActivityDraft {
                activity_type: "login".into(),
                details: ActivityDetails::default(),
            };
            Activity::record(ActivityId::new(), UserId::new(), draft, now + Duration::seconds(offset)).unwrap()
        };
        let mut list = vec![make(0), make(10), make(5)];
        newest_first(&mut list);
        let stamps: Vec<_> = list.iter().map(|a| a.timestamp).collect();
        assert_eq!(
            stamps,
            vec![now + Duration::seconds(10), now + Duration::seconds(5), now]
        );
    }
}
