use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// Sentinel for schedules that repeat until explicitly cancelled.
pub const UNTIL_CANCELLED: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    Alert,
    Background,
    Location,
    Voip,
    Complication,
    Fileprovider,
    Mdm,
    #[serde(rename = "liveactivity")]
    LiveActivity,
}

/// Delivery priority. On the wire this is numeric: `5` asks the gateway to
/// consider device power, anything else (or absence) means deliver immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum Priority {
    #[default]
    Immediately,
    ConsideringDevicePower,
}

impl From<Option<i64>> for Priority {
    fn from(raw: Option<i64>) -> Self {
        match raw {
            Some(5) => Self::ConsideringDevicePower,
            _ => Self::Immediately,
        }
    }
}

impl From<Priority> for Option<i64> {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Immediately => Some(10),
            Priority::ConsideringDevicePower => Some(5),
        }
    }
}

/// Notification expiration. On the wire this is epoch seconds; absence means
/// the notification is only valid for immediate delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum Expiration {
    #[default]
    Immediately,
    At(i64),
}

impl From<Option<i64>> for Expiration {
    fn from(raw: Option<i64>) -> Self {
        raw.map_or(Self::Immediately, Self::At)
    }
}

impl From<Expiration> for Option<i64> {
    fn from(expiration: Expiration) -> Self {
        match expiration {
            Expiration::Immediately => None,
            Expiration::At(epoch_secs) => Some(epoch_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveActivityEvent {
    Start,
    Update,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveActivity {
    pub event: LiveActivityEvent,
    #[serde(default)]
    pub content_state: Value,
}

/// The notification content, as a closed union. The wire form is either the
/// string `"background"`, an `{"alert": text}` object, or a
/// `{"liveActivity": {...}}` object; anything else decodes to `Other` and is
/// rejected at dispatch time rather than at intake.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Background,
    Alert(String),
    LiveActivity(LiveActivity),
    Other(Value),
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Background => serializer.serialize_str("background"),
            Self::Alert(text) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("alert", text)?;
                map.end()
            }
            Self::LiveActivity(activity) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("liveActivity", activity)?;
                map.end()
            }
            Self::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.as_str() == Some("background") {
            return Ok(Self::Background);
        }
        if let Some(fields) = value.as_object() {
            if let Some(Value::String(text)) = fields.get("alert") {
                return Ok(Self::Alert(text.clone()));
            }
            if let Some(inner) = fields.get("liveActivity") {
                return serde_json::from_value(inner.clone()).map(Self::LiveActivity).map_err(D::Error::custom);
            }
        }
        Ok(Self::Other(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// `-1` repeats until cancelled, `1` is one-shot, `n > 1` is a fixed count.
    #[serde(default = "default_occurrences")]
    pub occurrences: i64,

    /// Seconds between occurrences.
    #[serde(default)]
    pub interval: i64,

    /// When the first delivery should fire.
    #[serde(with = "time::serde::timestamp")]
    pub send_at: OffsetDateTime,
}

const fn default_occurrences() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Hex-encoded device token the gateway should deliver to.
    pub device_token: String,

    pub push_type: PushType,

    #[serde(default)]
    pub expiration: Expiration,

    #[serde(default)]
    pub priority: Priority,

    /// Optional correlation id forwarded to the gateway.
    #[serde(rename = "apnsID", default)]
    pub apns_id: Option<Uuid>,

    /// App/tenant identity this push is addressed to.
    pub topic: String,

    #[serde(rename = "collapseID", default)]
    pub collapse_id: Option<String>,

    pub message: Message,

    pub schedule: Schedule,
}

impl PushRequest {
    /// Validates the scheduling payload.
    ///
    /// # Errors
    /// Returns an error if the recurrence fields are out of range or the
    /// device token is not a hex string.
    pub fn validate(&self) -> Result<(), String> {
        let occurrences = self.schedule.occurrences;
        if occurrences != UNTIL_CANCELLED && occurrences < 1 {
            return Err(format!("occurrences must be -1 or >= 1, got {occurrences}"));
        }
        if self.schedule.interval < 0 {
            return Err(format!("interval must be >= 0, got {}", self.schedule.interval));
        }
        if self.device_token.is_empty() || hex::decode(&self.device_token).is_err() {
            return Err("deviceToken must be a non-empty hex string".into());
        }
        Ok(())
    }
}
