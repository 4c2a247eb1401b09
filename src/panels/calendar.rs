use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::Panel;
use crate::mock;
use crate::model::{CalendarEvent, CalendarEventKind};

const EVENT_COUNT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarViewMode {
    #[default]
    Month,
    Week,
    List,
}

/// Events falling on one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub events: usize,
    pub scheduled_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarView {
    pub mode: CalendarViewMode,
    pub selected_date: NaiveDate,
    /// Inclusive range covered by the current mode
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub events: Vec<CalendarEvent>,
    pub days: Vec<DaySummary>,
    /// Events on the selected date
    pub selected_day: Vec<CalendarEvent>,
    pub overdue: usize,
}

/// Business timeline calendar panel
#[derive(Debug)]
pub struct BusinessTimelineCalendar {
    events: Arc<Vec<CalendarEvent>>,
    mode: CalendarViewMode,
    selected_date: NaiveDate,
    kind_filter: Option<CalendarEventKind>,
}

impl Default for BusinessTimelineCalendar {
    fn default() -> Self {
        Self {
            events: Arc::default(),
            mode: CalendarViewMode::default(),
            selected_date: Utc::now().date_naive(),
            kind_filter: None,
        }
    }
}

fn range_for(mode: CalendarViewMode, date: NaiveDate) -> (NaiveDate, NaiveDate) {
    match mode {
        CalendarViewMode::Month => {
            let start = date.with_day(1).unwrap_or(date);
            let next_month = if start.month() == 12 {
                NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
            };
            let end = next_month.map(|d| d - Duration::days(1)).unwrap_or(start);
            (start, end)
        }
        CalendarViewMode::Week => {
            let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            (start, start + Duration::days(6))
        }
        CalendarViewMode::List => (NaiveDate::MIN, NaiveDate::MAX),
    }
}

impl BusinessTimelineCalendar {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let mut panel = Self::default();
        panel.refresh(rng);
        panel
    }

    pub fn set_mode(&mut self, mode: CalendarViewMode) {
        self.mode = mode;
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    pub fn filter_kind(&mut self, kind: Option<CalendarEventKind>) {
        self.kind_filter = kind;
    }

    /// Move the selection by one period of the current mode
    pub fn step(&mut self, forward: bool) {
        let sign = if forward { 1 } else { -1 };
        self.selected_date = match self.mode {
            CalendarViewMode::Month => {
                let (start, end) = range_for(CalendarViewMode::Month, self.selected_date);
                if forward {
                    end + Duration::days(1)
                } else {
                    range_for(CalendarViewMode::Month, start - Duration::days(1)).0
                }
            }
            CalendarViewMode::Week => self.selected_date + Duration::days(7 * sign),
            CalendarViewMode::List => self.selected_date + Duration::days(sign),
        };
    }
}

impl Panel for BusinessTimelineCalendar {
    type View = CalendarView;
    const TITLE: &'static str = "Business Timeline";

    fn refresh(&mut self, rng: &mut dyn RngCore) {
        self.events = Arc::new(mock::calendar_events(rng, EVENT_COUNT));
    }

    fn view(&self) -> Arc<CalendarView> {
        let (range_start, range_end) = range_for(self.mode, self.selected_date);
        let today = Utc::now().date_naive();

        let events: Vec<CalendarEvent> = self
            .events
            .iter()
            .filter(|e| self.kind_filter.map_or(true, |k| e.kind == k))
            .filter(|e| e.date >= range_start && e.date <= range_end)
            .cloned()
            .collect();

        let mut by_day: BTreeMap<NaiveDate, DaySummary> = BTreeMap::new();
        for event in &events {
            let day = by_day.entry(event.date).or_insert(DaySummary {
                date: event.date,
                events: 0,
                scheduled_minutes: 0,
            });
            day.events += 1;
            day.scheduled_minutes += event.duration_minutes;
        }

        Arc::new(CalendarView {
            mode: self.mode,
            selected_date: self.selected_date,
            range_start,
            range_end,
            selected_day: events.iter().filter(|e| e.date == self.selected_date).cloned().collect(),
            overdue: events.iter().filter(|e| e.date < today && !e.completed).count(),
            days: by_day.into_values().collect(),
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ranges() {
        assert_eq!(
            range_for(CalendarViewMode::Month, date(2024, 2, 14)),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
        assert_eq!(
            range_for(CalendarViewMode::Month, date(2023, 12, 31)),
            (date(2023, 12, 1), date(2023, 12, 31))
        );
        // 2024-05-15 is a Wednesday
        assert_eq!(
            range_for(CalendarViewMode::Week, date(2024, 5, 15)),
            (date(2024, 5, 13), date(2024, 5, 19))
        );
    }

    #[test]
    fn test_step_month() {
        let mut panel = BusinessTimelineCalendar::default();
        panel.select_date(date(2024, 1, 31));
        panel.step(true);
        assert_eq!(panel.selected_date, date(2024, 2, 1));
        panel.step(false);
        assert_eq!(panel.selected_date, date(2024, 1, 1));
    }

    #[test]
    fn test_list_mode_shows_everything() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut panel = BusinessTimelineCalendar::new(&mut rng);
        panel.set_mode(CalendarViewMode::List);
        let view = panel.view();
        assert_eq!(view.events.len(), EVENT_COUNT);
        let total: usize = view.days.iter().map(|d| d.events).sum();
        assert_eq!(total, EVENT_COUNT);
    }
}
