use chrono::NaiveDate;
use serde::Deserialize;

pub const MAX_SEARCH_TEXT_LEN: usize = 100;
pub const MAX_SEARCH_PROVIDERS: i64 = 50;

/// Search request as customers send it. Every field is optional and loosely
/// shaped; [`SlotSearchFilter::sanitize`] turns it into something safe to
/// bind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotSearchQuery {
    pub q: Option<String>,
    pub loc: Option<String>,
    pub cat: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSearchFilter {
    /// Escaped `ILIKE` pattern over display name and email.
    pub query_pattern: Option<String>,
    /// Escaped `ILIKE` pattern over city, postal code and street.
    pub location_pattern: Option<String>,
    pub category: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: Option<NaiveDate>,
    pub provider_limit: i64,
}

impl SlotSearchFilter {
    pub fn sanitize(query: &SlotSearchQuery, today: NaiveDate) -> Self {
        let date_from = query
            .from
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(today);

        Self {
            query_pattern: clean_text(query.q.as_deref()).map(|q| contains_pattern(&q)),
            location_pattern: clean_text(query.loc.as_deref()).map(|l| contains_pattern(&l)),
            category: clean_text(query.cat.as_deref()),
            date_from,
            date_to: query.to.as_deref().and_then(parse_date),
            provider_limit: MAX_SEARCH_PROVIDERS,
        }
    }
}

fn clean_text(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(trimmed.chars().take(MAX_SEARCH_TEXT_LEN).collect())
}

/// Wraps `value` in `%..%` after escaping LIKE metacharacters with the
/// Postgres default escape character.
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
