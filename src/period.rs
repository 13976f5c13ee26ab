use chrono::{Datelike, NaiveDate, NaiveTime};

const API_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The calendar month a report covers, first and last day inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

impl ReportPeriod {
    /// The calendar month before the one containing `today`.
    pub fn previous_month(today: NaiveDate) -> Self {
        let first_of_this_month = today.with_day(1).unwrap_or(today);
        let last_day = first_of_this_month
            .pred_opt()
            .unwrap_or(first_of_this_month);
        let first_day = last_day.with_day(1).unwrap_or(last_day);
        Self { first_day, last_day }
    }

    /// `startDate` for stats requests: first day at 00:00:00 UTC.
    pub fn start_date(&self) -> String {
        self.first_day.and_time(NaiveTime::MIN).format(API_DATE_FORMAT).to_string()
    }

    /// `endDate` for stats requests: last day at 23:59:59 UTC.
    pub fn end_date(&self) -> String {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        self.last_day.and_time(end_of_day).format(API_DATE_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_previous_month_mid_month() {
        let period = ReportPeriod::previous_month(date(2024, 3, 15));
        assert_eq!(period.first_day, date(2024, 2, 1));
        assert_eq!(period.last_day, date(2024, 2, 29));
        assert_eq!(period.start_date(), "2024-02-01T00:00:00Z");
        assert_eq!(period.end_date(), "2024-02-29T23:59:59Z");
    }

    #[test]
    fn test_previous_month_across_year_boundary() {
        let period = ReportPeriod::previous_month(date(2025, 1, 1));
        assert_eq!(period.first_day, date(2024, 12, 1));
        assert_eq!(period.last_day, date(2024, 12, 31));
    }

    #[test]
    fn test_previous_month_on_last_day() {
        let period = ReportPeriod::previous_month(date(2023, 5, 31));
        assert_eq!(period.first_day, date(2023, 4, 1));
        assert_eq!(period.last_day, date(2023, 4, 30));
        assert_eq!(period.end_date(), "2023-04-30T23:59:59Z");
    }
}
