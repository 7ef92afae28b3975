//! Month calendar model: week-aligned grid, per-day event counts and the
//! selected-day agenda. Pure local-calendar arithmetic, no I/O.

use crate::models::AgendaItem;
use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use std::collections::HashMap;

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub is_today: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridCell {
    Blank,
    Day(DayCell),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthGrid {
    pub month_label: String,
    /// Rows of exactly seven cells, Sunday first.
    pub weeks: Vec<Vec<GridCell>>,
}

#[cfg(test)]
impl MonthGrid {
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.weeks.iter().flatten()
    }

    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.cells().filter_map(|cell| match cell {
            GridCell::Day(day) => Some(day),
            GridCell::Blank => None,
        })
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Builds the grid for the month containing `reference`. `today` only drives
/// the `is_today` flag, so it may fall outside the displayed month.
pub fn compute_grid(reference: NaiveDate, today: NaiveDate) -> MonthGrid {
    let first = first_of_month(reference);
    let leading = first.weekday().num_days_from_sunday() as usize;

    let mut cells: Vec<GridCell> = Vec::with_capacity(42);
    cells.extend(std::iter::repeat_n(GridCell::Blank, leading));
    cells.extend(
        first
            .iter_days()
            .take_while(|date| date.month() == first.month())
            .map(|date| {
                GridCell::Day(DayCell {
                    date,
                    day: date.day(),
                    is_today: date == today,
                })
            }),
    );
    let trailing = (7 - cells.len() % 7) % 7;
    cells.extend(std::iter::repeat_n(GridCell::Blank, trailing));

    MonthGrid {
        month_label: first.format("%B %Y").to_string(),
        weeks: cells.chunks(7).map(|row| row.to_vec()).collect(),
    }
}

/// Events whose date equals `date`, in their original order.
pub fn agenda_for(events: &[AgendaItem], date: NaiveDate) -> Vec<&AgendaItem> {
    events.iter().filter(|item| item.date == date).collect()
}

pub fn events_by_date(events: &[AgendaItem]) -> HashMap<NaiveDate, usize> {
    let mut counts = HashMap::new();
    for item in events {
        *counts.entry(item.date).or_insert(0) += 1;
    }
    counts
}

pub fn event_count_label(count: usize) -> String {
    if count == 1 {
        "1 event".to_string()
    } else {
        format!("{count} events")
    }
}

/// Transient view state of the calendar panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthView {
    reference_month: NaiveDate,
    selected_date: NaiveDate,
}

impl MonthView {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            reference_month: first_of_month(today),
            selected_date: today,
        }
    }

    pub fn reference_month(&self) -> NaiveDate {
        self.reference_month
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    /// The selection may lie outside the displayed month.
    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    pub fn go_to_previous_month(&mut self) {
        self.reference_month = self
            .reference_month
            .checked_sub_months(Months::new(1))
            .unwrap_or(self.reference_month);
    }

    pub fn go_to_next_month(&mut self) {
        self.reference_month = self
            .reference_month
            .checked_add_months(Months::new(1))
            .unwrap_or(self.reference_month);
    }

    pub fn go_to_today(&mut self) {
        self.go_to_date(Local::now().date_naive());
    }

    pub fn go_to_date(&mut self, date: NaiveDate) {
        self.reference_month = first_of_month(date);
        self.select_date(date);
    }

    /// Keyboard navigation. Starts from day 1 of the displayed month when the
    /// selection is elsewhere, and follows the selection across months.
    pub fn move_selection(&mut self, days: i64) {
        let start = if self.is_displayed(self.selected_date) {
            self.selected_date
        } else {
            self.reference_month
        };
        let Some(next) = start.checked_add_signed(Duration::days(days)) else {
            return;
        };
        self.select_date(next);
        if !self.is_displayed(next) {
            self.reference_month = first_of_month(next);
        }
    }

    pub fn grid(&self, today: NaiveDate) -> MonthGrid {
        compute_grid(self.reference_month, today)
    }

    fn is_displayed(&self, date: NaiveDate) -> bool {
        date.year() == self.reference_month.year() && date.month() == self.reference_month.month()
    }
}
