use std::fmt::Display;

pub const COUNT_PLACEHOLDER: &str = "@count";

/// Pick `singular` for a count of one and `plural` otherwise, substituting
/// every `@count` in the chosen string.
pub fn format_plural(count: i64, singular: &str, plural: &str) -> String {
    let chosen = if count == 1 { singular } else { plural };
    chosen.replace(COUNT_PLACEHOLDER, &count.to_string())
}

pub fn ordinal_suffix(n: i64) -> String {
    let magnitude = n.unsigned_abs();
    with_suffix(n, suffix_for(magnitude))
}

fn suffix_for(magnitude: u64) -> &'static str {
    let last_digit = magnitude % 10;
    let last_two = magnitude % 100;
    match (last_digit, last_two) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn with_suffix(value: impl Display, suffix: &str) -> String {
    format!("{value}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_picks_singular_for_one() {
        assert_eq!(format_plural(1, "@count item", "@count items"), "1 item");
        assert_eq!(format_plural(5, "@count item", "@count items"), "5 items");
        assert_eq!(format_plural(0, "@count item", "@count items"), "0 items");
    }

    #[test]
    fn plural_replaces_every_placeholder() {
        assert_eq!(
            format_plural(3, "@count", "@count of @count"),
            "3 of 3"
        );
        assert_eq!(format_plural(2, "one", "several"), "several");
    }

    #[test]
    fn ordinal_follows_english_rules() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (23, "23rd"),
            (100, "100th"),
            (111, "111th"),
            (112, "112th"),
            (1001, "1001st"),
            (0, "0th"),
        ];
        for (value, expected) in cases {
            assert_eq!(ordinal_suffix(value), expected, "value {value}");
        }
    }

    #[test]
    fn ordinal_uses_magnitude_for_negatives() {
        assert_eq!(ordinal_suffix(-1), "-1st");
        assert_eq!(ordinal_suffix(-12), "-12th");
    }
}
