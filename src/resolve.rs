use std::collections::BTreeMap;

use crate::error::{PipelineError, Result};
use crate::fiscal::FinancialYear;
use crate::models::{Incumbency, PeriodRow, Representative};

/// Resolve which representative held each constituency over `fy` under the
/// chosen incumbency mode.
///
/// Constituencies with no qualifying period are absent from the map; the
/// joiner renders those rows with null representative fields. When several
/// periods qualify (the normal case for `Incoming` over a turnover year)
/// the one with the latest start date wins.
pub fn resolve_representation(
    periods: &[PeriodRow],
    fy: &FinancialYear,
    mode: Incumbency,
) -> Result<BTreeMap<String, Representative>> {
    let mut qualifying: BTreeMap<&str, Vec<&PeriodRow>> = BTreeMap::new();
    for period in periods {
        if qualifies(period, fy, mode) {
            qualifying
                .entry(period.constituency_id.as_str())
                .or_default()
                .push(period);
        }
    }

    let mut resolved = BTreeMap::new();
    for (constituency, mut matches) in qualifying {
        matches.sort_by_key(|p| p.start_date);
        let Some((&chosen, earlier)) = matches.split_last() else {
            continue;
        };
        if let Some(runner_up) = earlier.last() {
            // Equal start dates break the non-overlap invariant and leave no
            // deterministic order to pick from.
            if runner_up.start_date == chosen.start_date {
                return Err(PipelineError::AmbiguousRepresentation {
                    constituency: constituency.to_string(),
                    start: chosen.start_date,
                });
            }
            if mode == Incumbency::Outgoing {
                log::warn!(
                    "constituency {constituency} has {} periods seated at the start of {}; \
                     keeping the one starting {}",
                    matches.len(),
                    fy.token,
                    chosen.start_date
                );
            }
        }
        resolved.insert(constituency.to_string(), chosen.representative.clone());
    }

    Ok(resolved)
}

/// A representative who left before the year began never qualifies, in
/// either mode. Outgoing additionally requires the seat to have been taken
/// strictly before the year began.
fn qualifies(period: &PeriodRow, fy: &FinancialYear, mode: Incumbency) -> bool {
    let held_into_year = period.end_date.map_or(true, |end| end >= fy.start);
    match mode {
        Incumbency::Outgoing => period.start_date < fy.start && held_into_year,
        Incumbency::Incoming => period.start_date <= fy.end && held_into_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(
        constituency: &str,
        name: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> PeriodRow {
        PeriodRow {
            constituency_id: constituency.to_string(),
            start_date: start,
            end_date: end,
            representative: Representative {
                id: Uuid::new_v4(),
                full_name: name.to_string(),
                party_name: "Independent".to_string(),
                party_colour_code: "#888888".to_string(),
            },
        }
    }

    fn turnover_fixture() -> Vec<PeriodRow> {
        vec![
            period(
                "E14000530",
                "Alice Outgoing",
                date(2021, 1, 1),
                Some(date(2022, 5, 1)),
            ),
            period("E14000530", "Bob Incoming", date(2022, 5, 1), None),
        ]
    }

    #[test]
    fn outgoing_picks_the_seat_holder_at_year_start() {
        let fy = FinancialYear::starting(2022).unwrap();
        let seats =
            resolve_representation(&turnover_fixture(), &fy, Incumbency::Outgoing).unwrap();
        assert_eq!(seats["E14000530"].full_name, "Alice Outgoing");
    }

    #[test]
    fn incoming_picks_the_seat_holder_through_year_end() {
        let fy = FinancialYear::starting(2022).unwrap();
        let seats =
            resolve_representation(&turnover_fixture(), &fy, Incumbency::Incoming).unwrap();
        assert_eq!(seats["E14000530"].full_name, "Bob Incoming");
    }

    #[test]
    fn representative_gone_before_year_start_never_qualifies() {
        let periods = vec![period(
            "E14000531",
            "Carol Departed",
            date(2019, 12, 12),
            Some(date(2022, 3, 30)),
        )];
        let fy = FinancialYear::starting(2022).unwrap();
        for mode in [Incumbency::Outgoing, Incumbency::Incoming] {
            let seats = resolve_representation(&periods, &fy, mode).unwrap();
            assert!(seats.is_empty(), "{mode:?} should not seat Carol");
        }
    }

    #[test]
    fn seat_taken_on_year_start_counts_as_incoming_only() {
        let periods = vec![period("E14000532", "Dan Dayone", date(2022, 4, 1), None)];
        let fy = FinancialYear::starting(2022).unwrap();

        let outgoing =
            resolve_representation(&periods, &fy, Incumbency::Outgoing).unwrap();
        assert!(outgoing.is_empty());

        let incoming =
            resolve_representation(&periods, &fy, Incumbency::Incoming).unwrap();
        assert_eq!(incoming["E14000532"].full_name, "Dan Dayone");
    }

    #[test]
    fn open_ended_period_spans_every_later_year() {
        let periods = vec![period("E14000533", "Eve Evergreen", date(2015, 5, 7), None)];
        let fy = FinancialYear::starting(2022).unwrap();
        let seats = resolve_representation(&periods, &fy, Incumbency::Outgoing).unwrap();
        assert_eq!(seats["E14000533"].full_name, "Eve Evergreen");
    }

    #[test]
    fn equal_start_dates_are_ambiguous() {
        let periods = vec![
            period("E14000534", "Fay First", date(2022, 5, 1), None),
            period("E14000534", "Gus Second", date(2022, 5, 1), None),
        ];
        let fy = FinancialYear::starting(2022).unwrap();
        let err = resolve_representation(&periods, &fy, Incumbency::Incoming).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AmbiguousRepresentation { constituency, .. }
                if constituency == "E14000534"
        ));
    }

    #[test]
    fn resolves_each_constituency_independently() {
        let mut periods = turnover_fixture();
        periods.push(period("E14000535", "Hal Steady", date(2010, 5, 6), None));
        let fy = FinancialYear::starting(2022).unwrap();
        let seats = resolve_representation(&periods, &fy, Incumbency::Incoming).unwrap();
        assert_eq!(seats.len(), 2);
        assert_eq!(seats["E14000530"].full_name, "Bob Incoming");
        assert_eq!(seats["E14000535"].full_name, "Hal Steady");
    }
}
