//! Common utility functions shared across the codebase.

use std::cmp::Ordering;

/// Natural, case-insensitive string ordering.
///
/// Runs of ASCII digits compare by numeric value, everything else compares
/// by lowercase character. Ties are broken by plain byte order so the
/// result is total.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use l10nguy::utils::natural_cmp;
///
/// assert_eq!(natural_cmp("item2", "item10"), Ordering::Less);
/// assert_eq!(natural_cmp("Beta", "alpha"), Ordering::Greater);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_digits = take_digits(&mut left);
                let r_digits = take_digits(&mut right);
                let ordering = compare_numeric(&l_digits, &r_digits);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
}

/// Split a comma or whitespace separated list, dropping empty items and
/// duplicates while keeping the first occurrence's position.
///
/// ```
/// use l10nguy::utils::normalize_list;
///
/// assert_eq!(normalize_list(["de, fr", "de  en"]), vec!["de", "fr", "en"]);
/// ```
pub fn normalize_list<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut items: Vec<String> = Vec::new();
    for value in values {
        for item in value
            .as_ref()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            if !items.iter().any(|existing| existing == item) {
                items.push(item.to_string());
            }
        }
    }
    items
}

/// "yes" or "no", as used in run headers.
pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::utils::*;

    #[test]
    fn test_natural_cmp_numbers() {
        let mut ids = vec!["item10", "item2", "item1", "Item3"];
        ids.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(ids, vec!["item1", "item2", "Item3", "item10"]);
    }

    #[test]
    fn test_natural_cmp_case_insensitive() {
        let mut ids = vec!["b", "A", "c", "a"];
        ids.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(ids, vec!["A", "a", "b", "c"]);
    }

    #[test]
    fn test_natural_cmp_plural_forms() {
        let mut ids = vec!["cards[10]", "cards[1]", "cards[0]", "cards"];
        ids.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(ids, vec!["cards", "cards[0]", "cards[1]", "cards[10]"]);
    }

    #[test]
    fn test_natural_cmp_leading_zeros() {
        assert_eq!(natural_cmp("a007", "a7"), "a007".cmp("a7"));
        assert_eq!(natural_cmp("a007", "a8"), Ordering::Less);
    }

    #[test]
    fn test_normalize_list() {
        assert_eq!(normalize_list(["de,fr", " en\tde "]), vec!["de", "fr", "en"]);
        assert!(normalize_list(Vec::<String>::new()).is_empty());
        assert!(normalize_list([" , "]).is_empty());
    }

    #[test]
    fn test_yes_no() {
        assert_eq!(yes_no(true), "yes");
        assert_eq!(yes_no(false), "no");
    }
}
