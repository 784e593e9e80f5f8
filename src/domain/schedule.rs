use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::push::UNTIL_CANCELLED;

/// The live tracking record for a scheduled push. The `payload` is the
/// serialized [`crate::domain::push::PushRequest`], opaque to the store; it is
/// only decoded at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPush {
    pub id: Uuid,
    pub occurrences: i64,
    pub interval: i64,
    #[serde(with = "time::serde::timestamp")]
    pub next_push: OffsetDateTime,
    #[serde(with = "opaque_payload")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ScheduledPush {
    #[must_use]
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        self.error.is_none() && self.next_push <= now
    }

    #[must_use]
    pub const fn repeats_until_cancelled(&self) -> bool {
        self.occurrences == UNTIL_CANCELLED
    }
}

/// Externally visible projection of a schedule's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ScheduledPushStatus {
    Scheduled {
        id: Uuid,
        remaining_occurrences: i64,
        interval: i64,
        #[serde(with = "time::serde::timestamp")]
        next_push: OffsetDateTime,
    },
    Finished {
        id: Uuid,
    },
    Failed {
        id: Uuid,
        reason: String,
    },
}

impl ScheduledPushStatus {
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Scheduled { id, .. } | Self::Finished { id } | Self::Failed { id, .. } => *id,
        }
    }
}

/// Durable serialization of the store's three partitions. An id lives in
/// exactly one of them at any time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schedules: HashMap<Uuid, ScheduledPush>,
    pub errored: Vec<ScheduledPush>,
    #[serde(rename = "completedIDs")]
    pub completed_ids: HashSet<Uuid>,
}

impl Snapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty() && self.errored.is_empty() && self.completed_ids.is_empty()
    }

    /// Human-readable rendering for operational inspection. Not part of the
    /// durability contract.
    #[must_use]
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "<snapshot not renderable>".into())
    }
}

mod opaque_payload {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(payload: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(payload))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_push(error: Option<&str>) -> ScheduledPush {
        ScheduledPush {
            id: Uuid::new_v4(),
            occurrences: 3,
            interval: 60,
            next_push: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            payload: br#"{"fake":"payload"}"#.to_vec(),
            error: error.map(Into::into),
        }
    }

    #[test]
    fn test_status_json_is_tagged_camel_case() {
        let status = ScheduledPushStatus::Scheduled {
            id: Uuid::nil(),
            remaining_occurrences: 2,
            interval: 60,
            next_push: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["scheduled"]["remainingOccurrences"], json!(2));
        assert_eq!(value["scheduled"]["nextPush"], json!(1_700_000_000));

        let finished = serde_json::to_value(ScheduledPushStatus::Finished { id: Uuid::nil() }).unwrap();
        assert!(finished.get("finished").is_some());
    }

    #[test]
    fn test_snapshot_round_trips_payload_bytes() {
        let push = sample_push(None);
        let mut snapshot = Snapshot::default();
        snapshot.schedules.insert(push.id, push.clone());
        snapshot.errored.push(sample_push(Some("delivery failed")));
        snapshot.completed_ids.insert(Uuid::new_v4());

        let encoded = serde_json::to_vec(&snapshot).unwrap();
        let decoded: Snapshot = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.schedules[&push.id].payload, push.payload);
    }

    #[test]
    fn test_due_requires_no_error() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_100).unwrap();
        assert!(sample_push(None).is_due(now));
        assert!(!sample_push(Some("boom")).is_due(now));
    }
}
