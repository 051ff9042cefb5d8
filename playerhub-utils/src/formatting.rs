/// Render a fixed-width text progress bar, e.g. `[#####-----] 50%`.
pub fn progress_bar(percent: i64, width: usize) -> String {
    let percent = percent.clamp(0, 100);
    let filled = (percent as usize * width) / 100;
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}

/// One-line level summary, e.g. `Lv. 2 | 150/200 XP | 1200 pts`.
pub fn level_summary(level: i64, experience: i64, exp_to_next: i64, total_points: i64) -> String {
    format!("Lv. {level} | {experience}/{exp_to_next} XP | {total_points} pts")
}

/// Format hours stored as tenths (125 -> "12.5").
pub fn format_hours(tenths: i64) -> String {
    let sign = if tenths < 0 { "-" } else { "" };
    let tenths = tenths.unsigned_abs();
    format!("{}{}.{}", sign, tenths / 10, tenths % 10)
}

/// English ordinal for a placement (1 -> "1st", 12 -> "12th", 22 -> "22nd").
pub fn format_ordinal(position: i64) -> String {
    let suffix = match (position % 100, position % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}

/// Convert snake_case identifiers to user-facing names ("co_op" -> "Co Op").
pub fn display_name(key: &str) -> String {
    let normalized = key.trim();
    if normalized.is_empty() {
        return "Unknown".to_owned();
    }

    normalized
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!(
                    "{}{}",
                    first.to_uppercase(),
                    chars.as_str().to_ascii_lowercase()
                ),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Star string for a 1-5 rating ("***--").
pub fn rating_stars(rating: i16) -> String {
    let filled = usize::try_from(rating.clamp(0, 5)).unwrap_or(0);
    format!("{}{}", "*".repeat(filled), "-".repeat(5 - filled))
}

#[cfg(test)]
mod tests {
    use super::{
        display_name, format_hours, format_ordinal, level_summary, progress_bar, rating_stars,
    };

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(50, 10), "[#####-----] 50%");
        assert_eq!(progress_bar(0, 4), "[----] 0%");
        assert_eq!(progress_bar(140, 4), "[####] 100%");
        assert_eq!(progress_bar(33, 3), "[---] 33%");
    }

    #[test]
    fn level_summary_reads_naturally() {
        assert_eq!(level_summary(2, 150, 200, 1200), "Lv. 2 | 150/200 XP | 1200 pts");
    }

    #[test]
    fn hours_keep_one_decimal() {
        assert_eq!(format_hours(125), "12.5");
        assert_eq!(format_hours(30), "3.0");
        assert_eq!(format_hours(0), "0.0");
    }

    #[test]
    fn ordinals_handle_teens() {
        assert_eq!(format_ordinal(1), "1st");
        assert_eq!(format_ordinal(2), "2nd");
        assert_eq!(format_ordinal(3), "3rd");
        assert_eq!(format_ordinal(11), "11th");
        assert_eq!(format_ordinal(13), "13th");
        assert_eq!(format_ordinal(22), "22nd");
        assert_eq!(format_ordinal(104), "104th");
    }

    #[test]
    fn display_names_are_title_cased() {
        assert_eq!(display_name("accepted"), "Accepted");
        assert_eq!(display_name("co_op_shooter"), "Co Op Shooter");
        assert_eq!(display_name("  "), "Unknown");
    }

    #[test]
    fn stars_cover_the_rating() {
        assert_eq!(rating_stars(3), "***--");
        assert_eq!(rating_stars(5), "*****");
        assert_eq!(rating_stars(9), "*****");
    }
}
