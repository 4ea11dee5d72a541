use chrono::{DateTime, TimeZone};
use log::{info, warn};

use crate::alarm::model::{AlarmDefinition, AlarmStore};
use crate::error::ClockError;
use crate::notify::{AlertReport, NotificationSink};

#[derive(Debug, Clone, Default)]
pub struct CheckOutcome {
    pub fired: Vec<FiredAlarm>,
}

#[derive(Debug, Clone)]
pub struct FiredAlarm {
    pub id: i64,
    pub time: String,
    pub label: Option<String>,
    pub report: AlertReport,
}

pub struct AlarmScheduler {
    alarms: Vec<AlarmDefinition>,
    store: Box<dyn AlarmStore>,
}

impl AlarmScheduler {
    /// Loads whatever the store holds; unreadable data starts an empty list.
    pub fn from_store(store: Box<dyn AlarmStore>) -> Self {
        let alarms = store.load();
        info!("loaded {} alarm(s) from {}", alarms.len(), store.describe());
        Self { alarms, store }
    }

    pub fn alarms(&self) -> &[AlarmDefinition] {
        &self.alarms
    }

    /// Appends a new alarm stamped with `created_ms`, bumped past existing ids if needed.
    pub fn add(
        &mut self,
        time: &str,
        label: Option<&str>,
        created_ms: i64,
    ) -> Result<&AlarmDefinition, ClockError> {
        let next_free = self
            .alarms
            .iter()
            .map(|alarm| alarm.id.saturating_add(1))
            .max()
            .unwrap_or(i64::MIN);
        let alarm = AlarmDefinition::new(time, label, created_ms.max(next_free))?;
        info!("added alarm {} at {}", alarm.id, alarm.time);
        self.alarms.push(alarm);
        self.persist();
        Ok(&self.alarms[self.alarms.len() - 1])
    }

    /// Out-of-range indexes are ignored.
    pub fn remove(&mut self, index: usize) -> Option<AlarmDefinition> {
        if index >= self.alarms.len() {
            return None;
        }
        let removed = self.alarms.remove(index);
        info!("removed alarm {} at {}", removed.id, removed.time);
        self.persist();
        Some(removed)
    }

    /// Fires every alarm whose `HH:MM` equals the minute of `now`, once per calendar day.
    pub fn check<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
        sink: &mut dyn NotificationSink,
    ) -> CheckOutcome {
        let local = now.naive_local();
        let today = local.date();
        let current = local.format("%H:%M").to_string();

        let mut outcome = CheckOutcome::default();
        for alarm in &mut self.alarms {
            if alarm.fired_on(today) || alarm.time != current {
                continue;
            }
            let report = sink.fire(alarm);
            alarm.last_fired = Some(today);
            info!(
                "alarm {} fired at {current} ({:?}, tone {:?})",
                alarm.id, report.delivery, report.tone
            );
            outcome.fired.push(FiredAlarm {
                id: alarm.id,
                time: alarm.time.clone(),
                label: alarm.label.clone(),
                report,
            });
        }

        if !outcome.fired.is_empty() {
            self.persist();
        }
        outcome
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.write(&self.alarms) {
            warn!(
                "failed to persist alarms to {}: {err:#}",
                self.store.describe()
            );
        }
    }
}
