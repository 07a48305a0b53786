//! Dashboard time-series aggregation.
//!
//! Produces pending/collected counts bucketed by day, ISO week or calendar
//! month depending on the requested range. Counts are cumulative as of each
//! bucket's end date (a bucket includes every specimen created on or
//! before that date, not just the events inside the bucket), so the
//! resulting curves are monotonically non-decreasing and the final bucket
//! always equals the facility's totals.

use crate::constants::{ALL_TIME_FALLBACK_DAYS, DAY_BUCKET_MAX_DAYS, WEEK_BUCKET_MAX_DAYS};
use crate::model::{FacilityId, SpecimenRecord};
use crate::store::SpecimenStore;
use crate::{TrackerError, TrackerResult};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

/// The span a dashboard chart covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateRange {
    /// The trailing `n` days, today inclusive.
    Days(u32),
    /// From the facility's earliest specimen onward.
    AllTime,
}

/// One bucket of the dashboard series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    /// Day, week-start (Monday) or month-start date labelling the bucket.
    pub date: NaiveDate,
    /// Specimens created on or before the bucket end and not yet collected
    /// by then.
    pub pending_count: usize,
    /// Specimens collected on or before the bucket end.
    pub collected_count: usize,
}

#[derive(Clone, Copy)]
enum Bucket {
    Day,
    Week,
    Month,
}

/// Builds dashboard series over one program's specimens.
pub struct AnalyticsAggregator {
    store: Arc<dyn SpecimenStore>,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<dyn SpecimenStore>) -> Self {
        Self { store }
    }

    /// The pending/collected series for `facility` over `range`.
    ///
    /// Loads the facility's specimen set once and folds it into buckets:
    /// one point per day up to 90 days, per ISO week up to a year, per
    /// calendar month beyond that and for all time.
    pub fn time_series(
        &self,
        facility: FacilityId,
        range: DateRange,
    ) -> TrackerResult<Vec<TimeSeriesPoint>> {
        let specimens = self.store.specimens_for_facility(facility)?;
        build_series(&specimens, Utc::now().date_naive(), range)
    }
}

/// Pure series construction, split out so bucketing rules can be tested
/// against a pinned "today".
fn build_series(
    specimens: &[SpecimenRecord],
    today: NaiveDate,
    range: DateRange,
) -> TrackerResult<Vec<TimeSeriesPoint>> {
    let (start, bucket) = match range {
        DateRange::Days(0) => {
            return Err(TrackerError::InvalidInput(
                "range must cover at least one day".into(),
            ));
        }
        DateRange::Days(days) if days <= DAY_BUCKET_MAX_DAYS => {
            (today - Duration::days(i64::from(days) - 1), Bucket::Day)
        }
        DateRange::Days(days) if days <= WEEK_BUCKET_MAX_DAYS => (
            week_start(today - Duration::days(i64::from(days) - 1)),
            Bucket::Week,
        ),
        DateRange::Days(days) => (
            month_start(today - Duration::days(i64::from(days) - 1)),
            Bucket::Month,
        ),
        DateRange::AllTime => {
            let earliest = specimens.iter().map(|s| s.created_at.date_naive()).min();
            let start = earliest.unwrap_or(today - Duration::days(ALL_TIME_FALLBACK_DAYS));
            (month_start(start), Bucket::Month)
        }
    };

    let mut points = Vec::new();
    let mut cursor = start;
    while cursor <= today {
        let end = match bucket {
            Bucket::Day => cursor,
            Bucket::Week => cursor + Duration::days(6),
            Bucket::Month => month_end(cursor),
        };
        points.push(bucket_counts(specimens, cursor, end));
        cursor = match bucket {
            Bucket::Day => cursor + Duration::days(1),
            Bucket::Week => cursor + Duration::days(7),
            Bucket::Month => next_month(cursor),
        };
    }
    Ok(points)
}

fn bucket_counts(specimens: &[SpecimenRecord], label: NaiveDate, end: NaiveDate) -> TimeSeriesPoint {
    let collected = |s: &SpecimenRecord| {
        s.collected_at
            .is_some_and(|at| at.date_naive() <= end)
    };
    let collected_count = specimens.iter().filter(|s| collected(s)).count();
    let pending_count = specimens
        .iter()
        .filter(|s| s.created_at.date_naive() <= end && !collected(s))
        .count();
    TimeSeriesPoint {
        date: label,
        pending_count,
        collected_count,
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

fn month_end(date: NaiveDate) -> NaiveDate {
    next_month(date) - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BatchId, SpecimenId, SpecimenKind, SubjectDetails,
    };
    use chrono::{TimeZone, Weekday};
    use lst_types::{BatchPosition, NonEmptyText};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn specimen(created: NaiveDate, collected: Option<NaiveDate>) -> SpecimenRecord {
        let at_noon = |d: NaiveDate| {
            Utc.with_ymd_and_hms(d.year(), d.month(), d.day(), 12, 0, 0)
                .single()
                .expect("ts")
        };
        SpecimenRecord {
            id: SpecimenId::random(),
            batch_id: BatchId::random(),
            facility_id: FacilityId::random(),
            position: BatchPosition::FIRST,
            subject: SubjectDetails {
                name: NonEmptyText::new("Subject").expect("name"),
                barcode: None,
                maternal_id: None,
                patient_id: None,
            },
            kind: SpecimenKind::DbsCard,
            pcr_round: None,
            created_at: at_noon(created),
            collected_at: collected.map(at_noon),
            received_at: None,
            tested_at: None,
            verified_at: None,
            result: None,
            package_label: None,
        }
    }

    #[test]
    fn short_ranges_bucket_by_day() {
        let today = date(2026, 7, 20);
        let specimens = [
            specimen(date(2026, 7, 15), Some(date(2026, 7, 17))),
            specimen(date(2026, 7, 18), None),
        ];

        let series = build_series(&specimens, today, DateRange::Days(7)).expect("series");
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, date(2026, 7, 14));
        assert_eq!(series[6].date, today);

        // Created on the 15th: pending until collection on the 17th.
        assert_eq!(series[0].pending_count, 0);
        assert_eq!(series[1].pending_count, 1);
        assert_eq!(series[2].pending_count, 1);
        assert_eq!(series[3].collected_count, 1);
        assert_eq!(series[3].pending_count, 0);

        // Second specimen appears as pending from the 18th.
        assert_eq!(series[4].pending_count, 1);
        assert_eq!(series[6].pending_count, 1);
        assert_eq!(series[6].collected_count, 1);
    }

    #[test]
    fn counts_are_cumulative_and_final_bucket_covers_everything() {
        let today = date(2026, 7, 20);
        let specimens: Vec<_> = (1..=10)
            .map(|d| specimen(date(2026, 7, d), (d % 2 == 0).then(|| date(2026, 7, d))))
            .collect();

        let series = build_series(&specimens, today, DateRange::Days(30)).expect("series");
        let totals: Vec<usize> = series
            .iter()
            .map(|p| p.pending_count + p.collected_count)
            .collect();
        assert!(totals.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*totals.last().expect("non-empty"), specimens.len());
    }

    #[test]
    fn medium_ranges_bucket_by_iso_week_starting_monday() {
        let today = date(2026, 7, 20); // a Monday
        let specimens = [specimen(date(2026, 5, 1), None)];

        let series = build_series(&specimens, today, DateRange::Days(180)).expect("series");
        for point in &series {
            assert_eq!(point.date.weekday(), Weekday::Mon);
        }
        assert_eq!(series[0].date, week_start(today - Duration::days(179)));
        assert_eq!(series.last().expect("non-empty").date, today);
    }

    #[test]
    fn bucket_kind_switches_at_the_named_thresholds() {
        let today = date(2026, 7, 20);
        let specimens = [];

        let daily = build_series(&specimens, today, DateRange::Days(90)).expect("series");
        assert_eq!(daily.len(), 90);

        let weekly = build_series(&specimens, today, DateRange::Days(91)).expect("series");
        assert!(weekly.len() < 20);
        assert_eq!(weekly[0].date.weekday(), Weekday::Mon);

        let monthly = build_series(&specimens, today, DateRange::Days(366)).expect("series");
        assert!(monthly.iter().all(|p| p.date.day() == 1));
    }

    #[test]
    fn all_time_starts_at_the_earliest_specimen_month() {
        let today = date(2026, 7, 20);
        let specimens = [
            specimen(date(2025, 11, 9), Some(date(2025, 11, 12))),
            specimen(date(2026, 2, 1), None),
        ];

        let series = build_series(&specimens, today, DateRange::AllTime).expect("series");
        assert_eq!(series[0].date, date(2025, 11, 1));
        assert_eq!(series.last().expect("non-empty").date, date(2026, 7, 1));

        // November's bucket covers the whole month, so the first specimen is
        // already collected in it.
        assert_eq!(series[0].collected_count, 1);
        assert_eq!(series[0].pending_count, 0);
    }

    #[test]
    fn all_time_with_no_specimens_falls_back_thirty_days() {
        let today = date(2026, 7, 20);
        let series = build_series(&[], today, DateRange::AllTime).expect("series");
        assert_eq!(series[0].date, month_start(today - Duration::days(30)));
        assert!(series.iter().all(|p| p.pending_count == 0 && p.collected_count == 0));
    }

    #[test]
    fn zero_day_range_is_rejected() {
        let err = build_series(&[], date(2026, 7, 20), DateRange::Days(0)).expect_err("zero");
        assert!(matches!(err, TrackerError::InvalidInput(_)));
    }

    #[test]
    fn december_rolls_into_january() {
        assert_eq!(next_month(date(2025, 12, 15)), date(2026, 1, 1));
        assert_eq!(month_end(date(2026, 2, 1)), date(2026, 2, 28));
    }
}
