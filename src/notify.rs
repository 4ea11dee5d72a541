use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::alarm::model::AlarmDefinition;

pub const ALARM_TONE: Duration = Duration::from_millis(2_500);
pub const TIMER_TONE: Duration = Duration::from_millis(1_000);
const APP_NAME: &str = "deskclock";

const TONE_CANDIDATES: [(&str, &str); 3] = [
    ("paplay", "/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga"),
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/alsa/Front_Center.wav"),
];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Permission {
    /// Not requested yet.
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Delivery {
    Notified,
    /// Notifications unavailable; the user got a prompt instead.
    Prompted,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ToneOutcome {
    Played,
    Unavailable,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    pub prompt: String,
}

impl Alert {
    pub fn for_alarm(alarm: &AlarmDefinition) -> Self {
        Self {
            title: "Alarm".to_string(),
            body: alarm
                .label
                .clone()
                .unwrap_or_else(|| "Alarm ringing".to_string()),
            prompt: format!("Alarm: {}", alarm.display_label()),
        }
    }

    pub fn timer_finished() -> Self {
        Self {
            title: "Timer".to_string(),
            body: "Timer finished".to_string(),
            prompt: "Timer finished".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AlertReport {
    pub delivery: Delivery,
    pub tone: ToneOutcome,
}

pub trait NotificationSink {
    fn request_permission(&mut self) -> Permission;
    /// Delivers `alert`, falling back to `prompt` when notifications are unavailable.
    fn notify(&mut self, alert: &Alert) -> Delivery;
    fn tone(&mut self, duration: Duration) -> ToneOutcome;
    fn prompt(&mut self, message: &str);

    fn fire(&mut self, alarm: &AlarmDefinition) -> AlertReport {
        let tone = self.tone(ALARM_TONE);
        let delivery = self.notify(&Alert::for_alarm(alarm));
        AlertReport { delivery, tone }
    }

    /// Countdown completion always ends in a prompt, even after a notification.
    fn timer_finished(&mut self) -> AlertReport {
        let alert = Alert::timer_finished();
        let tone = self.tone(TIMER_TONE);
        let delivery = self.notify(&alert);
        if delivery == Delivery::Notified {
            self.prompt(&alert.prompt);
        }
        AlertReport { delivery, tone }
    }
}

#[derive(Debug, Clone)]
pub struct TonePlayer {
    command: &'static str,
    sound_file: PathBuf,
}

impl TonePlayer {
    pub fn detect() -> Option<Self> {
        TONE_CANDIDATES
            .iter()
            .find(|(_, file)| Path::new(file).exists())
            .map(|&(command, file)| Self {
                command,
                sound_file: PathBuf::from(file),
            })
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.command, self.sound_file.display())
    }

    fn play(&self, duration: Duration) -> std::io::Result<()> {
        let mut child = Command::new(self.command)
            .arg(&self.sound_file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        thread::spawn(move || {
            thread::sleep(duration);
            let _ = child.kill();
            let _ = child.wait();
        });
        Ok(())
    }
}

/// System notifications plus a prompt queue drained by the active surface.
pub struct DesktopNotifier {
    permission: Permission,
    notifications_enabled: bool,
    tone_player: Option<TonePlayer>,
    prompts: VecDeque<String>,
}

impl DesktopNotifier {
    pub fn new(notifications_enabled: bool, tones_enabled: bool) -> Self {
        let tone_player = if tones_enabled {
            TonePlayer::detect()
        } else {
            None
        };
        Self {
            permission: Permission::Default,
            notifications_enabled,
            tone_player,
            prompts: VecDeque::new(),
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn tone_player(&self) -> Option<&TonePlayer> {
        self.tone_player.as_ref()
    }

    pub fn take_prompts(&mut self) -> Vec<String> {
        self.prompts.drain(..).collect()
    }
}

impl NotificationSink for DesktopNotifier {
    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = if self.notifications_enabled {
                Permission::Granted
            } else {
                Permission::Denied
            };
            debug!("notification permission: {:?}", self.permission);
        }
        self.permission
    }

    fn notify(&mut self, alert: &Alert) -> Delivery {
        if self.permission == Permission::Granted {
            match show_system_notification(alert) {
                Ok(()) => return Delivery::Notified,
                Err(err) => {
                    warn!("system notification failed, falling back to prompts: {err}");
                    self.permission = Permission::Denied;
                }
            }
        }
        self.prompt(&alert.prompt);
        Delivery::Prompted
    }

    fn tone(&mut self, duration: Duration) -> ToneOutcome {
        let Some(player) = &self.tone_player else {
            return ToneOutcome::Unavailable;
        };
        match player.play(duration) {
            Ok(()) => ToneOutcome::Played,
            Err(err) => {
                info!("tone unavailable ({}): {err}", player.command);
                ToneOutcome::Unavailable
            }
        }
    }

    fn prompt(&mut self, message: &str) {
        self.prompts.push_back(message.to_string());
    }
}

fn show_system_notification(alert: &Alert) -> Result<(), String> {
    notify_rust::Notification::new()
        .summary(&alert.title)
        .body(&alert.body)
        .appname(APP_NAME)
        .show()
        .map(|_| ())
        .map_err(|err| err.to_string())
}
