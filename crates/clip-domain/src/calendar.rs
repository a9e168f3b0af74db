//! Claves de calendario usadas por el pipeline de pagos.
//!
//! - `WeekKey`: semana ISO (lunes a domingo) con formato `YYYY-Www`. El año
//!   es el año ISO, no el civil: el lunes 2025-12-29 pertenece a `2026-W01`.
//! - `MonthKey`: mes calendario con formato `YYYY-MM`.
//! - `WeekWindow`: intervalo semiabierto `[lunes, lunes siguiente)` en UTC.
//!
//! Toda la aritmética de semanas se apoya en `chrono::IsoWeek` y
//! `NaiveDate::from_isoywd_opt`; no se calcula el día de la semana a mano.
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Semana ISO en formato `YYYY-Www`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekKey(String);

impl WeekKey {
    pub fn for_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self(format!("{}-W{:02}", iso.year(), iso.week()))
    }

    /// Valida y construye a partir de texto (`2026-W07`).
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let (year, week) = raw.split_once("-W")
                              .ok_or_else(|| DomainError::ValidationError(format!("week key inválida: {raw}")))?;
        let year: i32 = year.parse()
                            .map_err(|_| DomainError::ValidationError(format!("año inválido en {raw}")))?;
        let week: u32 = week.parse()
                            .map_err(|_| DomainError::ValidationError(format!("semana inválida en {raw}")))?;
        let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .ok_or_else(|| DomainError::InvalidDate(format!("semana ISO inexistente: {raw}")))?;
        Ok(Self::for_date(monday))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mes calendario en formato `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthKey(String);

impl MonthKey {
    pub fn for_date(date: NaiveDate) -> Self {
        Self(format!("{}-{:02}", date.year(), date.month()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Medianoche UTC del primer día del mes que contiene `date`.
    pub fn month_start(date: NaiveDate) -> Result<DateTime<Utc>, DomainError> {
        let first = date.with_day(1)
                        .ok_or_else(|| DomainError::InvalidDate(format!("sin día 1 para {date}")))?;
        Ok(midnight_utc(first))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ventana semanal `[start, end)` con su clave ISO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekWindow {
    pub key: WeekKey,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    /// Semana ISO que contiene `date`.
    pub fn containing(date: NaiveDate) -> Result<Self, DomainError> {
        let iso = date.iso_week();
        let monday = NaiveDate::from_isoywd_opt(iso.year(), iso.week(), Weekday::Mon)
            .ok_or_else(|| DomainError::InvalidDate(format!("sin lunes ISO para {date}")))?;
        let next_monday = monday.checked_add_signed(Duration::days(7))
                                .ok_or_else(|| DomainError::InvalidDate(format!("overflow tras {monday}")))?;
        Ok(Self { key: WeekKey::for_date(monday),
                  start: midnight_utc(monday),
                  end: midnight_utc(next_monday) })
    }

    /// "La semana pasada" respecto a `today`: la semana ISO completa anterior
    /// a la que contiene `today`.
    pub fn previous(today: NaiveDate) -> Result<Self, DomainError> {
        let current = Self::containing(today)?;
        let last_sunday = current.start.date_naive()
                                 .pred_opt()
                                 .ok_or_else(|| DomainError::InvalidDate(format!("sin día previo a {today}")))?;
        Self::containing(last_sunday)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(midnight_utc(date))
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn previous_week_from_midweek() {
        // jueves 2026-10-15 -> semana pasada empieza el lunes 2026-10-05
        let w = WeekWindow::previous(d(2026, 10, 15)).unwrap();
        assert_eq!(w.start.date_naive(), d(2026, 10, 5));
        assert_eq!(w.end.date_naive(), d(2026, 10, 12));
        assert_eq!(w.key.as_str(), "2026-W41");
    }

    #[test]
    fn previous_week_on_monday_is_the_full_prior_week() {
        let w = WeekWindow::previous(d(2026, 10, 12)).unwrap();
        assert_eq!(w.start.date_naive(), d(2026, 10, 5));
        assert!(w.contains_date(d(2026, 10, 11)));
        assert!(!w.contains_date(d(2026, 10, 12)));
    }

    #[test]
    fn iso_year_boundary_53_week_year() {
        // 2020 tiene 53 semanas ISO
        let w = WeekWindow::previous(d(2021, 1, 6)).unwrap();
        assert_eq!(w.key.as_str(), "2020-W53");
        assert_eq!(w.start.date_naive(), d(2020, 12, 28));
    }

    #[test]
    fn iso_year_differs_from_civil_year() {
        // el lunes 2025-12-29 abre la semana 2026-W01
        let w = WeekWindow::previous(d(2026, 1, 5)).unwrap();
        assert_eq!(w.key.as_str(), "2026-W01");
        assert_eq!(w.start.date_naive(), d(2025, 12, 29));
    }

    #[test]
    fn week_key_parse_roundtrip_and_rejects_garbage() {
        assert_eq!(WeekKey::parse("2026-W07").unwrap().as_str(), "2026-W07");
        assert!(WeekKey::parse("2026-07").is_err());
        assert!(WeekKey::parse("2021-W53").is_err());
    }

    #[test]
    fn month_key_and_start() {
        assert_eq!(MonthKey::for_date(d(2026, 3, 9)).as_str(), "2026-03");
        let start = MonthKey::month_start(d(2026, 3, 9)).unwrap();
        assert_eq!(start.date_naive(), d(2026, 3, 1));
    }
}
