//! Billing period model.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// The calendar month being billed: always the month before the run date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    start: NaiveDate,
}

impl BillingPeriod {
    /// The period preceding `today`'s month.
    ///
    /// # Panics
    ///
    /// If `today` falls in chrono's earliest representable month, which has
    /// no predecessor.
    pub fn from_today(today: NaiveDate) -> Self {
        let start = match today.month() {
            1 => NaiveDate::from_ymd_opt(today.year() - 1, 12, 1),
            month => NaiveDate::from_ymd_opt(today.year(), month - 1, 1),
        };
        Self {
            start: start.expect("no billing period precedes the earliest supported month"),
        }
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// First day of the period.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn month_label(&self) -> &'static str {
        month_label(self.month())
    }

    /// Note attached to every payment request, e.g. `"Dec Utilities"`.
    pub fn note(&self) -> String {
        format!("{} Utilities", self.month_label())
    }

    /// Gmail search expression selecting mail received since the period start.
    pub fn search_query(&self) -> String {
        format!("after:{}", self.start().format("%Y/%m/%d"))
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.month())
    }
}

/// First day of the month preceding `today`'s month.
pub fn previous_month_start(today: NaiveDate) -> NaiveDate {
    BillingPeriod::from_today(today).start()
}

/// Short month name used in payment notes.
pub fn month_label(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "July",
        8 => "Aug",
        9 => "Sept",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "Unknown",
    }
}
