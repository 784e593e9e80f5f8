pub mod push;
pub mod schedule;

pub use push::{Expiration, LiveActivity, LiveActivityEvent, Message, Priority, PushRequest, PushType, UNTIL_CANCELLED};
pub use schedule::{ScheduledPush, ScheduledPushStatus, Snapshot};
