use thiserror::Error;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ClockError {
    #[error("alarm time is required")]
    EmptyAlarmTime,
    #[error("invalid alarm time '{0}', expected HH:MM")]
    InvalidAlarmTime(String),
    #[error("enter a time for the timer (mm:ss or hh:mm:ss)")]
    EmptyTimerDuration,
    #[error("stored alarm data is corrupt: {0}")]
    PersistenceCorruption(String),
}

impl ClockError {
    /// True for mistakes the user can fix by editing the form.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            ClockError::EmptyAlarmTime
                | ClockError::InvalidAlarmTime(_)
                | ClockError::EmptyTimerDuration
        )
    }
}
