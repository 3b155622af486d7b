//! Pause windows during which the gateway is expected to be offline

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

use crate::config::PauseWindowsConfig;
use crate::error::{Result, SentinelError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct MaintenanceWindow {
    timezone: Tz,
    start: NaiveTime,
    end: NaiveTime,
}

impl MaintenanceWindow {
    fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            // wraps past midnight
            time >= self.start || time <= self.end
        }
    }
}

/// Parsed pause windows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PauseSchedule {
    weekends: Option<Tz>,
    maintenance: Option<MaintenanceWindow>,
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| SentinelError::Config(format!("Unknown time zone '{}': {}", name, e)))
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| {
        SentinelError::Config(format!("Invalid time '{}', expected HH:MM: {}", value, e))
    })
}

impl PauseSchedule {
    pub fn from_config(config: &PauseWindowsConfig) -> Result<Self> {
        let weekends = config
            .weekends
            .as_ref()
            .map(|w| parse_timezone(&w.timezone))
            .transpose()?;

        let maintenance = config
            .daily_maintenance
            .as_ref()
            .map(|m| -> Result<MaintenanceWindow> {
                Ok(MaintenanceWindow {
                    timezone: parse_timezone(&m.timezone)?,
                    start: parse_time(&m.start)?,
                    end: parse_time(&m.end)?,
                })
            })
            .transpose()?;

        Ok(Self {
            weekends,
            maintenance,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.weekends.is_none() && self.maintenance.is_none()
    }

    /// Why monitoring is paused at `now`, if it is
    pub fn pause_reason(&self, now: DateTime<Utc>) -> Option<String> {
        if let Some(tz) = self.weekends {
            let local = now.with_timezone(&tz);
            if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
                return Some(format!("Weekend in {}", tz));
            }
        }

        if let Some(window) = &self.maintenance {
            let local = now.with_timezone(&window.timezone);
            if window.contains(local.time()) {
                return Some(format!(
                    "Daily maintenance window ({}-{} {})",
                    window.start.format("%H:%M"),
                    window.end.format("%H:%M"),
                    window.timezone
                ));
            }
        }

        None
    }
}
