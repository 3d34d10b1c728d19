use chrono::{DateTime, Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static RELATIVE_POSTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d+)\+?\s*(minutes|minute|mins|min|hours|hour|hrs|hr|days|day|weeks|week|months|month)\s+ago",
    )
    .expect("relative date pattern is valid")
});

const ABSOLUTE_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%m/%d/%Y", "%d %B %Y"];

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Resolves a job board "posted" label against `now`.
///
/// Accepts `today`, `just posted`, `yesterday`, `<n>[+] <unit> ago` and a set of
/// absolute date layouts. A week counts as 7 days and a month as 30 days.
/// Anything else yields `None`.
pub fn parse_posted_date(value: Option<&str>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    let normalized = raw.to_lowercase();

    if normalized == "today" || normalized.contains("just posted") {
        return Some(now);
    }
    if normalized == "yesterday" {
        return Some(now - Duration::days(1));
    }

    if let Some(captures) = RELATIVE_POSTED.captures(&normalized) {
        if let Ok(amount) = captures[1].parse::<i64>() {
            let unit = &captures[2];
            let offset = if unit.starts_with("min") {
                Duration::try_minutes(amount)
            } else if unit.starts_with('h') {
                Duration::try_hours(amount)
            } else if unit.starts_with("day") {
                Duration::try_days(amount)
            } else if unit.starts_with("week") {
                amount.checked_mul(7).and_then(Duration::try_days)
            } else {
                amount.checked_mul(30).and_then(Duration::try_days)
            };
            // Out-of-range counts are treated like any other unreadable label.
            return offset.and_then(|offset| now.checked_sub_signed(offset));
        }
    }

    parse_absolute_date(raw)
}

fn parse_absolute_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ABSOLUTE_DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(raw, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}
