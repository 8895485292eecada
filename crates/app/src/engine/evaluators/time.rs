//! Time leaves: clock ranges, weekdays, calendar dates and recurrence intervals.

use async_trait::async_trait;
use chrono::Datelike;

use formgate_domain::condition::{Condition, TimeConditionConfig, TimeSubType};
use formgate_domain::evaluation::EvaluationResult;
use formgate_domain::operator::Operator;
use formgate_domain::time::{MILLIS_PER_MINUTE, minute_of_day, parse_clock, parse_iso_date};

use super::{missing, parse_config};
use crate::engine::{EvaluationContext, LeafEvaluator};

/// Strategy for `time` leaves. Reads the clock from the context only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeEvaluator;

#[async_trait]
impl LeafEvaluator for TimeEvaluator {
    async fn evaluate(&self, condition: &Condition, ctx: &EvaluationContext) -> EvaluationResult {
        let config: TimeConditionConfig = match parse_config(condition) {
            Ok(config) => config,
            Err(result) => return result,
        };
        let outcome = match config.sub_type {
            TimeSubType::TimeRange => time_range(&config, ctx),
            TimeSubType::DayOfWeek => day_of_week(&config, ctx),
            TimeSubType::DateRange => date_range(&config, ctx),
            TimeSubType::LastExecutionInterval => last_execution_interval(&config, ctx),
        };
        outcome.unwrap_or_else(|what| missing(condition, what))
    }
}

/// Outcome of a bounded check under `operator`.
///
/// Negative operators invert the range test; `LessThan`/`LessThanOrEqual`
/// compare against the start bound only and `GreaterThan`/`GreaterThanOrEqual`
/// against the end bound only.
fn bounded<T: PartialOrd>(
    operator: Operator,
    value: &T,
    start: Option<&T>,
    end: Option<&T>,
    in_range: impl Fn(&T, &T) -> bool,
) -> Result<bool, &'static str> {
    match operator {
        Operator::LessThan => start.map(|s| value < s).ok_or("start bound"),
        Operator::LessThanOrEqual => start.map(|s| value <= s).ok_or("start bound"),
        Operator::GreaterThan => end.map(|e| value > e).ok_or("end bound"),
        Operator::GreaterThanOrEqual => end.map(|e| value >= e).ok_or("end bound"),
        op => {
            let (Some(start), Some(end)) = (start, end) else {
                return Err("start and end bounds");
            };
            let hit = in_range(start, end);
            Ok(if op.is_negative() { !hit } else { hit })
        }
    }
}

fn time_range(
    config: &TimeConditionConfig,
    ctx: &EvaluationContext,
) -> Result<EvaluationResult, &'static str> {
    let now = minute_of_day(&ctx.now);
    let start = config.start_time.as_deref().and_then(parse_clock);
    let end = config.end_time.as_deref().and_then(parse_clock);
    let satisfied = bounded(
        config.operator,
        &now,
        start.as_ref(),
        end.as_ref(),
        |&start, &end| {
            if start <= end {
                (start..=end).contains(&now)
            } else {
                now >= start || now <= end
            }
        },
    )?;
    Ok(EvaluationResult::from_outcome(
        satisfied,
        format!(
            "time {} {} {}-{}",
            ctx.now.format("%H:%M"),
            config.operator,
            config.start_time.as_deref().unwrap_or("*"),
            config.end_time.as_deref().unwrap_or("*"),
        ),
    ))
}

fn day_of_week(
    config: &TimeConditionConfig,
    ctx: &EvaluationContext,
) -> Result<EvaluationResult, &'static str> {
    let (Some(&min), Some(&max)) = (
        config.days_of_week.iter().min(),
        config.days_of_week.iter().max(),
    ) else {
        return Err("daysOfWeek");
    };
    let today = u8::try_from(ctx.now.weekday().num_days_from_sunday()).unwrap_or_default();
    let in_span = (min..=max).contains(&today);
    let listed = config.days_of_week.contains(&today);
    let satisfied = match config.operator {
        Operator::Between => in_span,
        Operator::NotContains => !in_span,
        Operator::NotIn | Operator::NotEquals => !listed,
        _ => listed,
    };
    Ok(EvaluationResult::from_outcome(
        satisfied,
        format!(
            "weekday {today} {} {:?}",
            config.operator, config.days_of_week
        ),
    ))
}

fn date_range(
    config: &TimeConditionConfig,
    ctx: &EvaluationContext,
) -> Result<EvaluationResult, &'static str> {
    let today = ctx.now.format("%Y-%m-%d").to_string();
    let start = config.start_date.as_deref().and_then(parse_iso_date);
    let end = config.end_date.as_deref().and_then(parse_iso_date);
    let satisfied = bounded(
        config.operator,
        &today,
        start.as_ref(),
        end.as_ref(),
        |start, end| start <= &today && &today <= end,
    )?;
    Ok(EvaluationResult::from_outcome(
        satisfied,
        format!(
            "date {today} {} {}..{}",
            config.operator,
            start.as_deref().unwrap_or("*"),
            end.as_deref().unwrap_or("*"),
        ),
    ))
}

fn last_execution_interval(
    config: &TimeConditionConfig,
    ctx: &EvaluationContext,
) -> Result<EvaluationResult, &'static str> {
    let interval = config.interval_minutes.ok_or("intervalMinutes")?;
    let Some(last) = ctx.last_execution_time else {
        return Ok(EvaluationResult::satisfied("no previous execution"));
    };
    let elapsed = ctx.now_millis().saturating_sub(last);
    let required = i64::try_from(interval)
        .unwrap_or(i64::MAX)
        .saturating_mul(MILLIS_PER_MINUTE);
    Ok(EvaluationResult::from_outcome(
        elapsed >= required,
        format!(
            "{} minutes since last execution, {interval} required",
            elapsed / MILLIS_PER_MINUTE
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use formgate_domain::condition::ConditionKind;
    use serde_json::{Value, json};

    /// Saturday 2026-03-14 at `hh:mm`.
    fn ctx_at(hour: u32, minute: u32) -> EvaluationContext {
        let mut ctx = EvaluationContext::default();
        ctx.now = Local.with_ymd_and_hms(2026, 3, 14, hour, minute, 0).unwrap();
        ctx
    }

    async fn check(config: Value, ctx: &EvaluationContext) -> EvaluationResult {
        TimeEvaluator
            .evaluate(&Condition::leaf(ConditionKind::Time, config), ctx)
            .await
    }

    fn range(start: &str, end: &str) -> Value {
        json!({"subType": "TimeRange", "startTime": start, "endTime": end})
    }

    #[tokio::test]
    async fn should_match_time_inside_daytime_range() {
        assert!(check(range("09:00", "18:00"), &ctx_at(12, 0)).await.satisfied);
        assert!(!check(range("09:00", "18:00"), &ctx_at(20, 0)).await.satisfied);
        assert!(check(range("09:00", "18:00"), &ctx_at(18, 0)).await.satisfied);
    }

    #[tokio::test]
    async fn should_wrap_range_crossing_midnight() {
        assert!(check(range("22:00", "06:00"), &ctx_at(23, 30)).await.satisfied);
        assert!(check(range("22:00", "06:00"), &ctx_at(2, 0)).await.satisfied);
        assert!(!check(range("22:00", "06:00"), &ctx_at(12, 0)).await.satisfied);
    }

    #[tokio::test]
    async fn should_invert_range_for_negative_operator() {
        let mut config = range("09:00", "18:00");
        config["operator"] = json!("NotIn");
        assert!(check(config.clone(), &ctx_at(20, 0)).await.satisfied);
        assert!(!check(config, &ctx_at(12, 0)).await.satisfied);
    }

    #[tokio::test]
    async fn should_compare_one_sided_operators_to_single_bound() {
        let before = json!({"subType": "TimeRange", "operator": "LessThan", "startTime": "09:00"});
        assert!(check(before.clone(), &ctx_at(8, 59)).await.satisfied);
        assert!(!check(before, &ctx_at(9, 0)).await.satisfied);

        let after = json!({"subType": "TimeRange", "operator": "GreaterThan", "startTime": "01:00", "endTime": "17:00"});
        assert!(check(after.clone(), &ctx_at(17, 1)).await.satisfied);
        assert!(!check(after, &ctx_at(12, 0)).await.satisfied);
    }

    #[tokio::test]
    async fn should_fail_gracefully_without_bounds() {
        let result = check(json!({"subType": "TimeRange"}), &ctx_at(12, 0)).await;
        assert!(!result.satisfied);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn should_check_day_membership_and_span() {
        // 2026-03-14 is a Saturday (6).
        let weekend = json!({"subType": "DayOfWeek", "daysOfWeek": [0, 6]});
        assert!(check(weekend, &ctx_at(12, 0)).await.satisfied);

        let span = json!({"subType": "DayOfWeek", "operator": "Between", "daysOfWeek": [5, 1]});
        assert!(!check(span, &ctx_at(12, 0)).await.satisfied);

        let outside = json!({"subType": "DayOfWeek", "operator": "NotContains", "daysOfWeek": [1, 5]});
        assert!(check(outside, &ctx_at(12, 0)).await.satisfied);

        let not_weekdays = json!({"subType": "DayOfWeek", "operator": "NotIn", "daysOfWeek": [1, 2, 3]});
        assert!(check(not_weekdays, &ctx_at(12, 0)).await.satisfied);
    }

    #[tokio::test]
    async fn should_compare_iso_dates() {
        let march = json!({"subType": "DateRange", "startDate": "2026-03-01", "endDate": "2026-03-31"});
        assert!(check(march, &ctx_at(12, 0)).await.satisfied);

        let april = json!({"subType": "DateRange", "startDate": "2026-04-01", "endDate": "2026-04-30"});
        assert!(!check(april, &ctx_at(12, 0)).await.satisfied);

        let until = json!({"subType": "DateRange", "operator": "LessThan", "startDate": "2026-04-01"});
        assert!(check(until, &ctx_at(12, 0)).await.satisfied);
    }

    #[tokio::test]
    async fn should_enforce_last_execution_interval() {
        let config = json!({"subType": "LastExecutionInterval", "intervalMinutes": 30});
        let now = ctx_at(12, 0);
        let minutes_ago = |m: i64| {
            now.clone()
                .with_last_execution_time(Some(now.now_millis() - m * MILLIS_PER_MINUTE))
        };

        assert!(!check(config.clone(), &minutes_ago(10)).await.satisfied);
        assert!(check(config.clone(), &minutes_ago(31)).await.satisfied);
        assert!(check(config, &now).await.satisfied);
    }

    #[tokio::test]
    async fn should_saturate_interval_for_extreme_execution_times() {
        let config = json!({"subType": "LastExecutionInterval", "intervalMinutes": 30});
        let now = ctx_at(12, 0);

        let ancient = now.clone().with_last_execution_time(Some(i64::MIN));
        assert!(check(config.clone(), &ancient).await.satisfied);

        let future = now.with_last_execution_time(Some(i64::MAX));
        assert!(!check(config, &future).await.satisfied);
    }

    #[tokio::test]
    async fn should_fail_gracefully_on_malformed_config() {
        let result = check(json!({"subType": "Tomorrow"}), &ctx_at(12, 0)).await;
        assert!(!result.satisfied);
        assert!(result.details.contains("invalid configuration"));
    }
}
