//! Per-stop departure filters.

use std::collections::BTreeSet;

use crate::domain::{Departure, StopConfig};

/// Apply a stop's platform and time-window filters, then keep the first
/// `max` departures.
///
/// Upstream order is preserved.
pub fn filter_departures(
    departures: Vec<Departure>,
    config: &StopConfig,
    max: usize,
) -> Vec<Departure> {
    departures
        .into_iter()
        .filter(|d| {
            config.platforms.is_empty() || config.platforms.iter().any(|p| d.is_at_platform(p))
        })
        .filter(|d| (config.time_from..=config.time_to).contains(&d.minutes_until))
        .take(max)
        .collect()
}

/// Distinct non-blank platform labels, sorted.
pub fn distinct_platforms(departures: &[Departure]) -> Vec<String> {
    departures
        .iter()
        .map(|d| d.platform.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LineType;
    use proptest::prelude::*;

    fn departure(platform: &str, minutes_until: i64) -> Departure {
        Departure {
            line: "U18".into(),
            destination: "Mülheim Hbf".into(),
            platform: platform.into(),
            line_type: LineType::UBahn,
            minutes_until,
            delay_minutes: 0,
            scheduled_time: "08:05".into(),
        }
    }

    #[test]
    fn empty_platform_set_keeps_all() {
        let config = StopConfig::new("1", "Essen Hbf");
        let deps = vec![departure("1", 5), departure("2", 6), departure("", 7)];

        assert_eq!(filter_departures(deps, &config, 10).len(), 3);
    }

    #[test]
    fn platform_filter_ignores_case() {
        let config = StopConfig::new("1", "Essen Hbf").with_platforms(["1a", "3"]);
        let deps = vec![
            departure("1A", 5),
            departure("2", 6),
            departure("3", 7),
            departure("", 8),
        ];

        let kept = filter_departures(deps, &config, 10);
        let platforms: Vec<_> = kept.iter().map(|d| d.platform.as_str()).collect();
        assert_eq!(platforms, vec!["1A", "3"]);
    }

    #[test]
    fn time_window_is_inclusive() {
        let config = StopConfig::new("1", "Essen Hbf").with_time_window(2, 10);
        let deps = vec![
            departure("1", 1),
            departure("1", 2),
            departure("1", 10),
            departure("1", 11),
        ];

        let kept = filter_departures(deps, &config, 10);
        let minutes: Vec<_> = kept.iter().map(|d| d.minutes_until).collect();
        assert_eq!(minutes, vec![2, 10]);
    }

    #[test]
    fn default_window_keeps_due_but_not_departed() {
        let config = StopConfig::new("1", "Essen Hbf");
        let deps = vec![departure("1", -1), departure("1", 0), departure("1", 60)];

        let kept = filter_departures(deps, &config, 10);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn limit_applies_after_filters() {
        let config = StopConfig::new("1", "Essen Hbf").with_platforms(["2"]);
        let deps = vec![
            departure("1", 1),
            departure("2", 2),
            departure("1", 3),
            departure("2", 4),
            departure("2", 5),
        ];

        let kept = filter_departures(deps, &config, 2);
        let minutes: Vec<_> = kept.iter().map(|d| d.minutes_until).collect();
        assert_eq!(minutes, vec![2, 4]);
    }

    #[test]
    fn platforms_distinct_and_sorted() {
        let deps = vec![
            departure("3", 1),
            departure("1", 2),
            departure("", 3),
            departure("3", 4),
            departure("  ", 5),
            departure("10", 6),
        ];

        assert_eq!(distinct_platforms(&deps), vec!["1", "10", "3"]);
    }

    proptest! {
        #[test]
        fn filtered_output_respects_every_constraint(
            minutes in proptest::collection::vec(-10i64..120, 0..40),
            from in 0i64..30,
            span in 0i64..60,
            max in 1usize..15,
        ) {
            let config = StopConfig::new("1", "Essen Hbf").with_time_window(from, from + span);
            let deps: Vec<_> = minutes.iter().map(|m| departure("1", *m)).collect();

            let kept = filter_departures(deps, &config, max);

            prop_assert!(kept.len() <= max);
            for d in &kept {
                prop_assert!(d.minutes_until >= from && d.minutes_until <= from + span);
            }
        }
    }
}
