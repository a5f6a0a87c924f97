use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use std::collections::BTreeMap;

use crate::{
    model::{ConditionMain, DailyPoint, ForecastBundle, HourlyPoint},
    provider::HourlySeries,
};

/// Hard ceiling on daily entries regardless of configuration.
pub const MAX_DAILY_POINTS: usize = 7;

/// Sorts by timestamp and drops repeated timestamps, keeping the first.
pub fn normalize_hourly(mut points: Vec<HourlyPoint>) -> Vec<HourlyPoint> {
    points.sort_by_key(|p| p.epoch_seconds);
    points.dedup_by_key(|p| p.epoch_seconds);
    points
}

struct DayAccumulator {
    min: f64,
    max: f64,
    condition_main: ConditionMain,
    condition_description: String,
    humidity_sum: f64,
    wind_sum: f64,
    samples: usize,
}

impl DayAccumulator {
    fn new(first: &HourlyPoint) -> Self {
        Self {
            min: first.temp_c,
            max: first.temp_c,
            condition_main: first.condition_main,
            condition_description: first.condition_description.clone(),
            humidity_sum: 0.0,
            wind_sum: 0.0,
            samples: 0,
        }
    }

    fn add(&mut self, point: &HourlyPoint) {
        self.min = self.min.min(point.temp_c);
        self.max = self.max.max(point.temp_c);
        self.humidity_sum += f64::from(point.humidity_pct);
        self.wind_sum += point.wind_speed_ms;
        self.samples += 1;
    }

    fn finish(self, date: NaiveDate) -> DailyPoint {
        let n = self.samples.max(1) as f64;
        DailyPoint {
            date,
            temp_min_c: self.min,
            temp_max_c: self.max,
            condition_main: self.condition_main,
            condition_description: self.condition_description,
            humidity_pct: (self.humidity_sum / n).round().clamp(0.0, 100.0) as u8,
            wind_speed_ms: self.wind_sum / n,
        }
    }
}

/// Groups hourly samples by the calendar date of their own timestamps (shifted
/// by `utc_offset_secs`) and keeps the first `max_days` dates.
///
/// Min/max come from every sample of the date, so `temp_min_c <= temp_max_c`
/// always holds. The day's condition is that of its earliest sample; humidity
/// and wind are averaged.
pub fn aggregate_daily(
    points: &[HourlyPoint],
    utc_offset_secs: i32,
    max_days: usize,
) -> Vec<DailyPoint> {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| Utc.fix());

    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    let mut ordered: Vec<&HourlyPoint> = points.iter().collect();
    ordered.sort_by_key(|p| p.epoch_seconds);

    for point in ordered {
        let Some(ts) = DateTime::from_timestamp(point.epoch_seconds, 0) else {
            continue;
        };
        let date = ts.with_timezone(&offset).date_naive();
        days.entry(date).or_insert_with(|| DayAccumulator::new(point)).add(point);
    }

    days.into_iter()
        .take(max_days.min(MAX_DAILY_POINTS))
        .map(|(date, acc)| acc.finish(date))
        .collect()
}

/// Turns a provider's hourly series into the bundle handed to callers.
pub fn build_bundle(series: HourlySeries, max_days: usize) -> ForecastBundle {
    let hourly = normalize_hourly(series.points);
    let daily = aggregate_daily(&hourly, series.utc_offset_secs, max_days);

    ForecastBundle {
        location_id: series.location_id,
        hourly,
        daily,
        is_synthetic: series.is_synthetic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;
    // 2023-11-14T00:00:00Z
    const MIDNIGHT: i64 = 1_699_920_000;

    fn point(epoch_seconds: i64, temp_c: f64) -> HourlyPoint {
        HourlyPoint {
            epoch_seconds,
            temp_c,
            feels_like_c: temp_c,
            humidity_pct: 50,
            pressure_hpa: 1012.0,
            wind_speed_ms: 2.0,
            precip_probability_pct: 10,
            condition_main: ConditionMain::Clouds,
            condition_description: "broken clouds".into(),
        }
    }

    #[test]
    fn min_max_per_date() {
        let points = vec![
            point(MIDNIGHT + 3 * 3600, 12.0),
            point(MIDNIGHT + 12 * 3600, 21.5),
            point(MIDNIGHT + 21 * 3600, 9.0),
            point(MIDNIGHT + DAY + 3600, 14.0),
        ];

        let daily = aggregate_daily(&points, 0, 7);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date.to_string(), "2023-11-14");
        assert_eq!(daily[0].temp_min_c, 9.0);
        assert_eq!(daily[0].temp_max_c, 21.5);
        assert_eq!(daily[1].temp_min_c, 14.0);
        assert_eq!(daily[1].temp_max_c, 14.0);
        assert!(daily.iter().all(|d| d.temp_min_c <= d.temp_max_c));
    }

    #[test]
    fn count_equals_distinct_dates_capped() {
        let points: Vec<_> = (0..10).map(|d| point(MIDNIGHT + d * DAY + 3600, d as f64)).collect();

        assert_eq!(aggregate_daily(&points, 0, 5).len(), 5);
        assert_eq!(aggregate_daily(&points, 0, 7).len(), 7);
        assert_eq!(aggregate_daily(&points, 0, 50).len(), MAX_DAILY_POINTS);
        assert_eq!(aggregate_daily(&points[..3], 0, 5).len(), 3);
    }

    #[test]
    fn offset_moves_samples_across_midnight() {
        // 22:00Z on the 14th is 03:30 on the 15th in UTC+5:30.
        let points = vec![point(MIDNIGHT + 10 * 3600, 20.0), point(MIDNIGHT + 22 * 3600, 25.0)];

        assert_eq!(aggregate_daily(&points, 0, 7).len(), 1);

        let shifted = aggregate_daily(&points, 19_800, 7);
        assert_eq!(shifted.len(), 2);
        assert_eq!(shifted[1].date.to_string(), "2023-11-15");
    }

    #[test]
    fn unordered_input_is_aggregated_chronologically() {
        let points = vec![
            point(MIDNIGHT + DAY + 3600, 5.0),
            point(MIDNIGHT + 3600, 7.0),
            point(MIDNIGHT + 2 * DAY, 3.0),
        ];
        let daily = aggregate_daily(&points, 0, 7);
        assert!(daily.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn bundle_hourly_is_strictly_ascending() {
        let series = HourlySeries {
            location_id: "x".into(),
            points: vec![
                point(MIDNIGHT + 7200, 2.0),
                point(MIDNIGHT, 1.0),
                point(MIDNIGHT + 7200, 99.0),
            ],
            utc_offset_secs: 0,
            is_synthetic: false,
        };

        let bundle = build_bundle(series, 5);
        let stamps: Vec<_> = bundle.hourly.iter().map(|p| p.epoch_seconds).collect();
        assert_eq!(stamps, vec![MIDNIGHT, MIDNIGHT + 7200]);
        assert_eq!(bundle.hourly[1].temp_c, 2.0);
        assert_eq!(bundle.daily.len(), 1);
    }
}
