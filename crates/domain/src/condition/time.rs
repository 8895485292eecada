//! Time leaf configuration.

use serde::{Deserialize, Serialize};

use crate::operator::Operator;

/// Which clock-based check a time leaf performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSubType {
    /// Current time of day within `startTime..endTime` (`HH:MM`).
    TimeRange,
    /// Current weekday (0 = Sunday) among `daysOfWeek`.
    DayOfWeek,
    /// Current date within `startDate..endDate` (`YYYY-MM-DD`).
    DateRange,
    /// At least `intervalMinutes` elapsed since the last execution.
    LastExecutionInterval,
}

/// Typed payload of a `time` leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeConditionConfig {
    pub sub_type: TimeSubType,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u64>,
}
