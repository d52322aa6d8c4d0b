//! Calendar bucketing by due date.

use crate::types::Task;
use chrono::{Datelike, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// First day of a calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// The week-start day on or before `date`, or `None` when that day is
    /// before the first representable date.
    pub fn start_of_week(&self, date: NaiveDate) -> Option<NaiveDate> {
        let offset = match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        };
        date.checked_sub_days(Days::new(u64::from(offset)))
    }

    /// The seven dates of the week containing `date`, or `None` when the week
    /// runs past either end of the representable range.
    pub fn week_of(&self, date: NaiveDate) -> Option<[NaiveDate; 7]> {
        let start = self.start_of_week(date)?;
        start.checked_add_days(Days::new(6))?;
        Some(std::array::from_fn(|i| start + Days::new(i as u64)))
    }
}

/// One cell of the month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// False for the leading/trailing days borrowed from adjacent months.
    pub in_month: bool,
    pub task_ids: Vec<String>,
}

/// Tasks due on a local calendar date.
pub fn tasks_due_on<'a, Tz: TimeZone>(tasks: &'a [Task], date: NaiveDate, tz: &Tz) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| {
            t.due_date
                .is_some_and(|due| due.with_timezone(tz).date_naive() == date)
        })
        .collect()
}

/// Full-week grid for a month: from the start of the week holding the 1st
/// to the end of the week holding the last day. `None` for an invalid month
/// or when the grid would leave the representable date range.
pub fn calendar_month<Tz: TimeZone>(
    tasks: &[Task],
    year: i32,
    month: u32,
    week_start: WeekStart,
    tz: &Tz,
) -> Option<Vec<CalendarDay>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(chrono::Months::new(1))?.pred_opt()?;

    let grid_start = week_start.start_of_week(first)?;
    let grid_end = week_start
        .start_of_week(last)?
        .checked_add_days(Days::new(6))?;

    let days = grid_start
        .iter_days()
        .take_while(|d| *d <= grid_end)
        .map(|date| CalendarDay {
            date,
            in_month: date.month() == month && date.year() == year,
            task_ids: tasks_due_on(tasks, date, tz)
                .into_iter()
                .map(|t| t.id.clone())
                .collect(),
        })
        .collect();
    Some(days)
}
