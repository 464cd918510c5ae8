// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parameter parsing for the operations that prompt the user.
//
// Page numbers are 1-based in user input and 0-based everywhere else.

use std::collections::{BTreeSet, HashSet};

use toolghor_core::error::{Result, ToolghorError};

/// Rotation angles the user may pick.
pub const ANGLES: [u16; 3] = [90, 180, 270];

/// `"90"`, `"180"` or `"270"`; anything else is rejected.
pub fn parse_angle(input: &str) -> Option<u16> {
    let angle = input.trim().parse().ok()?;
    ANGLES.contains(&angle).then_some(angle)
}

/// Pages to delete from a `total_pages` document, as 0-based indices in
/// descending order so they can be removed one after another.
///
/// Tokens are separated by `,` and are either a page number or an inclusive
/// `a-b` range. Pages outside `1..=total_pages` and tokens that are not
/// numbers are dropped silently. A page named twice is removed once.
pub fn parse_delete_pages(input: &str, total_pages: usize) -> Vec<usize> {
    let mut pages = BTreeSet::new();
    for token in input.split(',') {
        let token = token.trim();
        let (first, last) = match token.split_once('-') {
            Some((start, end)) => match (parse_page(start), parse_page(end)) {
                (Some(start), Some(end)) => (start, end),
                _ => continue,
            },
            None => match parse_page(token) {
                Some(page) => (page, page),
                None => continue,
            },
        };
        let (first, last) = (first.max(1), last.min(total_pages));
        if first <= last {
            pages.extend(first..=last);
        }
    }
    pages.into_iter().rev().map(|page| page - 1).collect()
}

/// New page order for a `total_pages` document, as 0-based indices.
///
/// Every token must be a page number in `1..=total_pages` and no page may
/// appear twice; otherwise the whole order is rejected with `None`. The order
/// need not mention every page: unnamed pages are left out of the output.
pub fn parse_page_order(input: &str, total_pages: usize) -> Option<Vec<usize>> {
    let tokens: Vec<&str> = input.split(',').collect();
    let mut order = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let page = parse_page(token)?;
        if !(1..=total_pages).contains(&page) {
            return None;
        }
        order.push(page - 1);
    }

    let distinct: HashSet<usize> = order.iter().copied().collect();
    (distinct.len() == tokens.len()).then_some(order)
}

fn parse_page(token: &str) -> Option<usize> {
    token.trim().parse().ok()
}

/// Seconds represented by `MM:SS` or `HH:MM:SS`.
///
/// Any other number of colon-separated parts yields `0`. A part that is not
/// a non-negative number makes the whole value `None`.
pub fn parse_time(input: &str) -> Option<f64> {
    let parts = input
        .trim()
        .split(':')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value >= 0.0)
        })
        .collect::<Option<Vec<f64>>>()?;

    Some(match parts.as_slice() {
        [minutes, seconds] => minutes * 60.0 + seconds,
        [hours, minutes, seconds] => hours * 3600.0 + minutes * 60.0 + seconds,
        _ => 0.0,
    })
}

/// Start offset and duration, both in seconds, of the window between two
/// time strings.
pub fn trim_window(start: &str, end: &str) -> Result<(f64, f64)> {
    match (parse_time(start), parse_time(end)) {
        (Some(start), Some(end)) if end - start > 0.0 => Ok((start, end - start)),
        _ => Err(ToolghorError::validation("End time must be after start time")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angles() {
        assert_eq!(parse_angle("90"), Some(90));
        assert_eq!(parse_angle(" 270 "), Some(270));
        assert_eq!(parse_angle("45"), None);
        assert_eq!(parse_angle("360"), None);
        assert_eq!(parse_angle("ninety"), None);
        assert_eq!(parse_angle(""), None);
    }

    #[test]
    fn delete_single_pages() {
        assert_eq!(parse_delete_pages("1,3,5", 5), vec![4, 2, 0]);
    }

    #[test]
    fn delete_inclusive_range() {
        assert_eq!(parse_delete_pages("2-4", 5), vec![3, 2, 1]);
    }

    #[test]
    fn delete_out_of_range_is_dropped() {
        assert!(parse_delete_pages("10", 5).is_empty());
        assert!(parse_delete_pages("0", 5).is_empty());
        assert_eq!(parse_delete_pages("4-9", 5), vec![4, 3]);
    }

    #[test]
    fn delete_huge_range_is_clamped_to_the_document() {
        assert_eq!(parse_delete_pages("4-18446744073709551615", 5), vec![4, 3]);
        assert_eq!(parse_delete_pages("0-18446744073709551615", 2), vec![1, 0]);
        assert!(parse_delete_pages("9-18446744073709551615", 5).is_empty());
    }

    #[test]
    fn delete_mixed_tokens_with_noise() {
        assert_eq!(parse_delete_pages(" 1 , x, 3-2, 2-3, 3", 5), vec![2, 1, 0]);
        assert!(parse_delete_pages("", 5).is_empty());
    }

    #[test]
    fn reorder_permutation() {
        assert_eq!(parse_page_order("3,1,2,4", 4), Some(vec![2, 0, 1, 3]));
    }

    #[test]
    fn reorder_subset_is_allowed() {
        assert_eq!(parse_page_order("2, 1", 4), Some(vec![1, 0]));
    }

    #[test]
    fn reorder_rejects_duplicates_and_out_of_range() {
        assert_eq!(parse_page_order("1,1,2", 4), None);
        assert_eq!(parse_page_order("1,5", 4), None);
        assert_eq!(parse_page_order("0,1", 4), None);
        assert_eq!(parse_page_order("1,two", 4), None);
        assert_eq!(parse_page_order("", 4), None);
    }

    #[test]
    fn time_shapes() {
        assert_eq!(parse_time("01:30"), Some(90.0));
        assert_eq!(parse_time("01:00:05"), Some(3605.0));
        assert_eq!(parse_time("00:00:02.5"), Some(2.5));
        assert_eq!(parse_time("42"), Some(0.0));
        assert_eq!(parse_time("1:2:3:4"), Some(0.0));
        assert_eq!(parse_time("aa:10"), None);
        assert_eq!(parse_time("-1:10"), None);
    }

    #[test]
    fn window_requires_positive_duration() {
        assert_eq!(trim_window("00:00:05", "00:00:15").unwrap(), (5.0, 10.0));
        for (start, end) in [("00:10", "00:10"), ("00:20", "00:10"), ("x:10", "00:30"), ("00:00", "30")] {
            let err = trim_window(start, end).unwrap_err();
            assert_eq!(err.status_text(), "End time must be after start time");
        }
    }
}
