use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClockError;

pub const STORAGE_KEY: &str = "clock_app_alarms_v1";

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AlarmDefinition {
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub id: i64,
    #[serde(
        rename = "_firedToday",
        default,
        skip_serializing_if = "Option::is_none",
        with = "fired_marker"
    )]
    pub last_fired: Option<NaiveDate>,
}

impl AlarmDefinition {
    pub fn new(time: &str, label: Option<&str>, id: i64) -> Result<Self, ClockError> {
        Ok(Self {
            time: normalize_alarm_time(time)?,
            label: normalize_label(label),
            id,
            last_fired: None,
        })
    }

    pub fn fired_on(&self, date: NaiveDate) -> bool {
        self.last_fired == Some(date)
    }

    /// Text shown when no label was given.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.time)
    }
}

/// Accepts `H:MM`, `HH:MM` and `HH:MM:SS`; always yields zero-padded `HH:MM`.
pub fn normalize_alarm_time(input: &str) -> Result<String, ClockError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ClockError::EmptyAlarmTime);
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map(|time| time.format("%H:%M").to_string())
        .map_err(|_| ClockError::InvalidAlarmTime(trimmed.to_string()))
}

fn normalize_label(label: Option<&str>) -> Option<String> {
    label
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Persistence collaborator for the alarm list.
pub trait AlarmStore: Send {
    /// Strict read; corrupt data is an error.
    fn read(&self) -> Result<Vec<AlarmDefinition>>;
    fn write(&mut self, alarms: &[AlarmDefinition]) -> Result<()>;
    fn describe(&self) -> String;

    fn load(&self) -> Vec<AlarmDefinition> {
        match self.read() {
            Ok(alarms) => alarms,
            Err(err) => {
                warn!(
                    "ignoring unreadable alarm data in {}: {err:#}",
                    self.describe()
                );
                Vec::new()
            }
        }
    }
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_text(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("unable to read alarm file {}", self.path.display())),
        }
    }
}

impl AlarmStore for JsonFileStore {
    fn read(&self) -> Result<Vec<AlarmDefinition>> {
        match self.read_text()? {
            Some(text) => Ok(parse_store_document(&text)?),
            None => Ok(Vec::new()),
        }
    }

    fn write(&mut self, alarms: &[AlarmDefinition]) -> Result<()> {
        let existing = self.read_text().ok().flatten();
        let text = render_store_document(existing.as_deref(), alarms)?;
        fs::write(&self.path, text)
            .with_context(|| format!("unable to write alarm file {}", self.path.display()))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Option<String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(text: impl Into<String>) -> Self {
        Self {
            document: Some(text.into()),
        }
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }
}

#[cfg(test)]
impl AlarmStore for MemoryStore {
    fn read(&self) -> Result<Vec<AlarmDefinition>> {
        match self.document.as_deref() {
            Some(text) => Ok(parse_store_document(text)?),
            None => Ok(Vec::new()),
        }
    }

    fn write(&mut self, alarms: &[AlarmDefinition]) -> Result<()> {
        self.document = Some(render_store_document(self.document.as_deref(), alarms)?);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}

pub fn parse_store_document(text: &str) -> Result<Vec<AlarmDefinition>, ClockError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let document = serde_json::from_str::<Map<String, Value>>(text).map_err(|err| {
        let line = err.line();
        let column = err.column();
        ClockError::PersistenceCorruption(format!(
            "invalid JSON at line {line}, column {column}: {err}"
        ))
    })?;
    let Some(entry) = document.get(STORAGE_KEY) else {
        return Ok(Vec::new());
    };

    let mut alarms = serde_json::from_value::<Vec<AlarmDefinition>>(entry.clone())
        .map_err(|err| ClockError::PersistenceCorruption(format!("'{STORAGE_KEY}': {err}")))?;
    for alarm in &mut alarms {
        alarm.time = normalize_alarm_time(&alarm.time).map_err(|err| {
            ClockError::PersistenceCorruption(format!("alarm {}: {err}", alarm.id))
        })?;
        alarm.label = normalize_label(alarm.label.as_deref());
    }
    Ok(alarms)
}

/// Replaces the alarm entry of `existing`, keeping any other keys it holds.
pub fn render_store_document(existing: Option<&str>, alarms: &[AlarmDefinition]) -> Result<String> {
    let mut document = existing
        .and_then(|text| serde_json::from_str::<Map<String, Value>>(text).ok())
        .unwrap_or_default();
    document.insert(STORAGE_KEY.to_string(), serde_json::to_value(alarms)?);
    let text = serde_json::to_string_pretty(&Value::Object(document))?;
    Ok(format!("{text}\n"))
}

mod fired_marker {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%a %b %d %Y";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(text) => NaiveDate::parse_from_str(&text, FORMAT)
                .or_else(|_| NaiveDate::parse_from_str(&text, "%Y-%m-%d"))
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid fired marker '{text}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parses_stored_record_shape() {
        let text = r#"
{
  "clock_app_alarms_v1": [
    { "time": "07:30", "label": "Wake up", "id": 1760000000000 },
    { "time": "18:05", "label": "", "id": 1760000000001, "_firedToday": "Mon Oct 19 2026" }
  ]
}
"#;
        let alarms = parse_store_document(text).expect("valid document");
        assert_eq!(alarms.len(), 2);
        assert_eq!(alarms[0].label.as_deref(), Some("Wake up"));
        assert_eq!(alarms[1].label, None);
        assert_eq!(
            alarms[1].last_fired,
            Some(NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"))
        );
    }

    #[test]
    fn corrupt_documents_are_reported_as_corruption() {
        for text in [
            "{ not-valid-json ",
            r#"{ "clock_app_alarms_v1": "nope" }"#,
            r#"{ "clock_app_alarms_v1": [ { "time": "25:99", "id": 1 } ] }"#,
            r#"{ "clock_app_alarms_v1": [ { "time": "07:00", "id": 1, "_firedToday": "soon" } ] }"#,
            "[]",
        ] {
            let err = parse_store_document(text).expect_err("corrupt data should fail");
            assert!(matches!(err, ClockError::PersistenceCorruption(_)), "{text}");
        }
    }

    #[test]
    fn corrupt_store_loads_as_empty() {
        let store = MemoryStore::with_document("{\"clock_app_alarms_v1\": [1, 2, 3]}");
        assert!(store.read().is_err());
        assert!(store.load().is_empty());
    }

    #[test]
    fn missing_key_or_blank_document_is_empty() {
        assert!(parse_store_document("").expect("blank").is_empty());
        assert!(
            parse_store_document(r#"{ "theme": "dark" }"#)
                .expect("other keys")
                .is_empty()
        );
    }

    #[test]
    fn normalizes_alarm_times() {
        assert_eq!(normalize_alarm_time("7:05").expect("short hour"), "07:05");
        assert_eq!(normalize_alarm_time("23:59:30").expect("seconds"), "23:59");
        assert_eq!(normalize_alarm_time("   "), Err(ClockError::EmptyAlarmTime));
        assert_eq!(
            normalize_alarm_time("noon"),
            Err(ClockError::InvalidAlarmTime("noon".to_string()))
        );
    }

    #[test]
    fn file_store_round_trips_and_keeps_foreign_keys() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("alarms.json");
        fs::write(&path, r#"{ "theme": "dark" }"#).expect("seed file");

        let mut store = JsonFileStore::new(&path);
        let mut alarm = AlarmDefinition::new("06:45", Some(" gym "), 42).expect("alarm");
        alarm.last_fired = NaiveDate::from_ymd_opt(2026, 10, 5);
        store.write(&[alarm.clone()]).expect("write");

        let text = fs::read_to_string(&path).expect("read back");
        assert!(text.contains("\"theme\": \"dark\""));
        assert!(text.contains("\"_firedToday\": \"Mon Oct 05 2026\""));
        assert_eq!(store.read().expect("read"), vec![alarm]);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.read().expect("absent file").is_empty());
    }
}
