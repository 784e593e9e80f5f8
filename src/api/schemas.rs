use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchScheduleResponse {
    pub scheduled: usize,
    pub rejected: usize,
}
