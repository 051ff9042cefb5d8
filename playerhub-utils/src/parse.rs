use chrono::{Datelike, NaiveDate};

/// Longest username an account may register with.
pub const MAX_USERNAME_LEN: usize = 150;
/// Longest search term accepted by player search.
pub const MAX_SEARCH_LEN: usize = 100;
/// Date format used for release dates and command-line date arguments.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Trim and validate a username: letters, digits and `@.+-_` only.
pub fn normalize_username(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value.chars().count() > MAX_USERNAME_LEN {
        return None;
    }

    value
        .chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_'))
        .then(|| value.to_owned())
}

/// Trim and loosely validate an email address. The domain is lowercased.
pub fn normalize_email(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.chars().any(char::is_whitespace) {
        return None;
    }

    let (local, domain) = value.rsplit_once('@')?;
    if local.is_empty() || local.contains('@') {
        return None;
    }

    let labels_ok = domain.contains('.')
        && domain
            .split('.')
            .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'));
    if !labels_ok {
        return None;
    }

    Some(format!("{}@{}", local, domain.to_ascii_lowercase()))
}

/// Parse an hours value with at most one decimal (e.g. `12.5`) into tenths.
pub fn parse_hours_tenths(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, "0"),
    };

    if whole.is_empty()
        || fraction.len() != 1
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let whole = whole.parse::<i64>().ok()?;
    let fraction = fraction.parse::<i64>().ok()?;
    let tenths = whole.checked_mul(10)?.checked_add(fraction)?;

    // five integer digits, one decimal
    (tenths <= 999_999).then_some(tenths)
}

/// Parse a canonical ISO `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    let date = NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).ok()?;
    if !(0..=9999).contains(&date.year()) {
        return None;
    }
    // chrono also takes signed or short fields; only the canonical spelling round-trips
    (date.format(ISO_DATE_FORMAT).to_string() == value).then_some(date)
}

/// Review ratings are whole stars from 1 to 5.
pub fn parse_review_rating(raw: &str) -> Option<i16> {
    raw.trim()
        .parse::<i16>()
        .ok()
        .filter(|rating| (1..=5).contains(rating))
}

/// Trim a search term; `None` means "no filter".
pub fn normalize_search(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.chars().take(MAX_SEARCH_LEN).collect())
}

/// Escape `%`, `_` and `\` so user input matches literally inside a LIKE pattern.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{
        escape_like, normalize_email, normalize_search, normalize_username, parse_hours_tenths,
        parse_iso_date, parse_review_rating,
    };
    use chrono::NaiveDate;

    #[test]
    fn usernames_allow_the_usual_punctuation() {
        assert_eq!(normalize_username("  geralt_of.rivia+1 "), Some("geralt_of.rivia+1".to_owned()));
        assert_eq!(normalize_username("two words"), None);
        assert_eq!(normalize_username("   "), None);
        assert_eq!(normalize_username(&"a".repeat(151)), None);
    }

    #[test]
    fn emails_need_a_dotted_domain() {
        assert_eq!(
            normalize_email("Ciri@Example.COM"),
            Some("Ciri@example.com".to_owned())
        );
        assert_eq!(normalize_email("nobody@localhost"), None);
        assert_eq!(normalize_email("@example.com"), None);
        assert_eq!(normalize_email("a b@example.com"), None);
        assert_eq!(normalize_email("x@example..com"), None);
    }

    #[test]
    fn hours_parse_into_tenths() {
        assert_eq!(parse_hours_tenths("12.5"), Some(125));
        assert_eq!(parse_hours_tenths("3"), Some(30));
        assert_eq!(parse_hours_tenths("0.0"), Some(0));
        assert_eq!(parse_hours_tenths("1.25"), None);
        assert_eq!(parse_hours_tenths("-1"), None);
        assert_eq!(parse_hours_tenths(".5"), None);
        assert_eq!(parse_hours_tenths("100000"), None);
    }

    #[test]
    fn iso_dates_respect_month_lengths() {
        assert_eq!(parse_iso_date("2015-05-19"), NaiveDate::from_ymd_opt(2015, 5, 19));
        assert_eq!(parse_iso_date(" 2024-02-29 "), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_iso_date("2023-02-29"), None);
        assert_eq!(parse_iso_date("2023-13-01"), None);
        assert_eq!(parse_iso_date("2023-4-01"), None);
    }

    #[test]
    fn iso_dates_need_a_plain_four_digit_year() {
        assert_eq!(parse_iso_date("+015-05-19"), None);
        assert_eq!(parse_iso_date("-2015-05-19"), None);
        assert_eq!(parse_iso_date("15-05-19"), None);
        assert_eq!(parse_iso_date("2015/05/19"), None);
    }

    #[test]
    fn ratings_are_one_to_five() {
        assert_eq!(parse_review_rating("5"), Some(5));
        assert_eq!(parse_review_rating(" 1 "), Some(1));
        assert_eq!(parse_review_rating("0"), None);
        assert_eq!(parse_review_rating("6"), None);
        assert_eq!(parse_review_rating("four"), None);
    }

    #[test]
    fn search_terms_are_trimmed_and_capped() {
        assert_eq!(normalize_search("  yen "), Some("yen".to_owned()));
        assert_eq!(normalize_search(""), None);
        assert_eq!(normalize_search(&"z".repeat(300)).map(|s| s.len()), Some(100));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
