use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive calendar-day range derived from a period selector. Never
/// persisted; recomputed on every filter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Period selector. Custom selectors with an unset month/year resolve
/// to a window that matches nothing: the user is prompted to complete
/// the selection rather than shown everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Period {
    All,
    Today,
    Tomorrow,
    ThisWeek,
    ThisMonth,
    LastMonth,
    CustomMonth { year: i32, month: Option<u32> },
    FinancialYear,
    CustomFinancialYear { start_year: Option<i32> },
}

impl Default for Period {
    fn default() -> Self {
        Self::All
    }
}

impl Period {
    /// Short slug used in export file names.
    pub fn slug(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Today => "today".to_string(),
            Self::Tomorrow => "tomorrow".to_string(),
            Self::ThisWeek => "this-week".to_string(),
            Self::ThisMonth => "this-month".to_string(),
            Self::LastMonth => "last-month".to_string(),
            Self::CustomMonth { year, month } => match month {
                Some(month) => format!("{year}-{month:02}"),
                None => "month-unset".to_string(),
            },
            Self::FinancialYear => "fy".to_string(),
            Self::CustomFinancialYear { start_year } => match start_year {
                Some(year) => format!("fy-{year}"),
                None => "fy-unset".to_string(),
            },
        }
    }
}

/// Outcome of resolving a period against a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowResolution {
    /// No restriction; every record passes, dated or not.
    Unbounded,
    Window(TimeWindow),
    /// Deliberate empty result for incomplete custom selections.
    MatchNothing,
}

impl WindowResolution {
    /// Calendar-day admission test for a record's governing date.
    pub fn admits(&self, day: Option<NaiveDate>) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Window(window) => day.is_some_and(|day| window.contains(day)),
            Self::MatchNothing => false,
        }
    }

    pub fn is_match_nothing(&self) -> bool {
        matches!(self, Self::MatchNothing)
    }
}

pub fn resolve(period: Period, reference_now: NaiveDate) -> WindowResolution {
    match period {
        Period::All => WindowResolution::Unbounded,
        Period::Today => single_day(reference_now),
        Period::Tomorrow => single_day(reference_now + Duration::days(1)),
        Period::ThisWeek => {
            // Sunday-start week containing the reference date.
            let back = reference_now.weekday().num_days_from_sunday() as i64;
            let start = reference_now - Duration::days(back);
            WindowResolution::Window(TimeWindow {
                start,
                end: start + Duration::days(6),
            })
        }
        Period::ThisMonth => month_window(reference_now.year(), reference_now.month()),
        Period::LastMonth => {
            let (year, month) = if reference_now.month() == 1 {
                (reference_now.year() - 1, 12)
            } else {
                (reference_now.year(), reference_now.month() - 1)
            };
            month_window(year, month)
        }
        Period::CustomMonth { year, month } => match month {
            Some(month) => month_window(year, month),
            None => WindowResolution::MatchNothing,
        },
        Period::FinancialYear => {
            // April 1 – March 31, India-style.
            let start_year = if reference_now.month() >= 4 {
                reference_now.year()
            } else {
                reference_now.year() - 1
            };
            financial_year_window(start_year)
        }
        Period::CustomFinancialYear { start_year } => match start_year {
            Some(year) => financial_year_window(year),
            None => WindowResolution::MatchNothing,
        },
    }
}

fn single_day(day: NaiveDate) -> WindowResolution {
    WindowResolution::Window(TimeWindow {
        start: day,
        end: day,
    })
}

fn month_window(year: i32, month: u32) -> WindowResolution {
    let Some(start) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return WindowResolution::MatchNothing;
    };
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match next_month {
        Some(next) => WindowResolution::Window(TimeWindow {
            start,
            end: next - Duration::days(1),
        }),
        None => WindowResolution::MatchNothing,
    }
}

fn financial_year_window(start_year: i32) -> WindowResolution {
    match (
        NaiveDate::from_ymd_opt(start_year, 4, 1),
        NaiveDate::from_ymd_opt(start_year + 1, 3, 31),
    ) {
        (Some(start), Some(end)) => WindowResolution::Window(TimeWindow { start, end }),
        _ => WindowResolution::MatchNothing,
    }
}
