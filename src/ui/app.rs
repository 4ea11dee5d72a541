use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Result;
use eframe::egui::{
    self, Align2, CentralPanel, Color32, RichText, ScrollArea, TextEdit, TopBottomPanel, Ui,
};

use crate::countdown::{CountdownPhase, CountdownStart, format_hms};
use crate::error::ClockError;
use crate::notify::DesktopNotifier;
use crate::runtime::{AdvanceOutcome, ClockRuntime};
use crate::stopwatch::format_stopwatch;
use crate::ui::render::{
    ALERT, CLOCK_MAIN, MUTED, OK, WARN, configure_theme, muted, readout, section_heading,
};

const STATUS_TTL: Duration = Duration::from_secs(4);
const MIN_REPAINT: Duration = Duration::from_millis(10);

pub fn run_gui(runtime: ClockRuntime, notifier: DesktopNotifier) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("deskclock")
            .with_inner_size([1080.0, 620.0])
            .with_min_inner_size([760.0, 480.0]),
        ..Default::default()
    };

    let app = ClockApp::new(runtime, notifier);
    eframe::run_native(
        "deskclock",
        native_options,
        Box::new(move |cc| {
            configure_theme(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch deskclock window: {err}"))?;

    Ok(())
}

struct ClockApp {
    runtime: ClockRuntime,
    notifier: DesktopNotifier,
    alarm_time_input: String,
    alarm_label_input: String,
    timer_input: String,
    prompts: VecDeque<String>,
    status_message: Option<(String, Color32, Instant)>,
}

impl ClockApp {
    fn new(runtime: ClockRuntime, notifier: DesktopNotifier) -> Self {
        Self {
            runtime,
            notifier,
            alarm_time_input: String::new(),
            alarm_label_input: String::new(),
            timer_input: String::new(),
            prompts: VecDeque::new(),
            status_message: None,
        }
    }

    fn set_status(&mut self, text: impl Into<String>, color: Color32) {
        self.status_message = Some((text.into(), color, Instant::now() + STATUS_TTL));
    }

    fn report_error(&mut self, err: &ClockError) {
        let color = if err.is_user_input() { WARN } else { ALERT };
        self.set_status(err.to_string(), color);
    }

    fn absorb(&mut self, outcome: &AdvanceOutcome) {
        for fired in &outcome.fired {
            let label = fired.label.as_deref().unwrap_or("Alarm ringing");
            self.set_status(format!("Alarm {}: {label}", fired.time), OK);
        }
        if outcome.countdown_finished.is_some() {
            self.set_status("Timer finished.", OK);
        }
        self.prompts.extend(self.notifier.take_prompts());
    }

    fn show_clock(&self, ui: &mut Ui) {
        let now = self.runtime.wall_now();
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("deskclock").size(26.0).color(MUTED).strong());
            ui.separator();
            ui.label(
                RichText::new(now.format("%H:%M:%S").to_string())
                    .size(30.0)
                    .color(CLOCK_MAIN)
                    .strong(),
            );
            ui.separator();
            ui.label(
                RichText::new(now.format("%A, %B %d %Y").to_string())
                    .size(18.0)
                    .color(MUTED),
            );
        });
    }

    fn show_status(&self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            match &self.status_message {
                Some((text, color, _)) => {
                    ui.label(RichText::new(text.as_str()).color(*color).strong());
                }
                None => muted(ui, "Alarms only ring while this window is open."),
            }
            ui.separator();
            muted(ui, &format!("Notifications: {:?}", self.notifier.permission()));
        });
    }

    fn show_alarms(&mut self, ui: &mut Ui) {
        section_heading(ui, "Alarms");

        let mut submitted = false;
        ui.horizontal(|ui| {
            let time = ui.add(
                TextEdit::singleline(&mut self.alarm_time_input)
                    .hint_text("HH:MM")
                    .desired_width(64.0),
            );
            let label = ui.add(
                TextEdit::singleline(&mut self.alarm_label_input)
                    .hint_text("Label (optional)")
                    .desired_width(140.0),
            );
            let entered = (time.lost_focus() || label.lost_focus())
                && ui.input(|input| input.key_pressed(egui::Key::Enter));
            submitted = ui.button("Add").clicked() || entered;
        });
        if submitted {
            let label = self.alarm_label_input.clone();
            match self
                .runtime
                .add_alarm(&self.alarm_time_input, Some(label.as_str()))
            {
                Ok(alarm) => {
                    self.set_status(format!("Alarm set for {}.", alarm.time), OK);
                    self.alarm_time_input.clear();
                    self.alarm_label_input.clear();
                }
                Err(err) => self.report_error(&err),
            }
        }
        ui.add_space(6.0);

        if self.runtime.alarms().is_empty() {
            muted(ui, "No alarms yet.");
            return;
        }

        let mut remove_index = None;
        ScrollArea::vertical()
            .id_salt("alarms_scroll")
            .show(ui, |ui| {
                egui::Grid::new("alarms_grid")
                    .striped(true)
                    .num_columns(3)
                    .show(ui, |ui| {
                        for (index, alarm) in self.runtime.alarms().iter().enumerate() {
                            ui.label(RichText::new(alarm.time.as_str()).monospace().strong());
                            ui.label(alarm.label.as_deref().unwrap_or(""));
                            if ui
                                .button(RichText::new("Delete").color(ALERT))
                                .clicked()
                            {
                                remove_index = Some(index);
                            }
                            ui.end_row();
                        }
                    });
            });

        if let Some(index) = remove_index
            && let Some(removed) = self.runtime.remove_alarm(index)
        {
            self.set_status(format!("Removed alarm {}.", removed.time), MUTED);
        }
    }

    fn show_countdown(&mut self, ui: &mut Ui) {
        section_heading(ui, "Timer");
        let countdown = self.runtime.countdown();
        let color = match countdown.phase() {
            CountdownPhase::Running => CLOCK_MAIN,
            CountdownPhase::Paused => WARN,
            CountdownPhase::Idle => MUTED,
        };
        readout(ui, &countdown.display(), color);

        ui.add(
            TextEdit::singleline(&mut self.timer_input)
                .hint_text("mm:ss or hh:mm:ss")
                .desired_width(160.0),
        );
        ui.horizontal(|ui| {
            if ui.button("Start").clicked() {
                match self.runtime.start_countdown(&self.timer_input) {
                    Ok(CountdownStart::Started { remaining_secs }) => {
                        let text = format!("Timer set for {}.", format_hms(remaining_secs));
                        self.set_status(text, OK);
                    }
                    Ok(CountdownStart::Resumed { remaining_secs }) => {
                        let text = format!("Timer resumed at {}.", format_hms(remaining_secs));
                        self.set_status(text, OK);
                    }
                    Ok(CountdownStart::AlreadyRunning) => {}
                    Err(err) => self.report_error(&err),
                }
            }
            if ui.button("Pause").clicked() {
                self.runtime.pause_countdown();
            }
            if ui.button("Reset").clicked() {
                self.runtime.reset_countdown();
            }
        });
    }

    fn show_stopwatch(&mut self, ui: &mut Ui) {
        section_heading(ui, "Stopwatch");
        let stopwatch = self.runtime.stopwatch();
        let color = if stopwatch.is_running() {
            CLOCK_MAIN
        } else {
            MUTED
        };
        readout(ui, &stopwatch.display(), color);

        ui.horizontal(|ui| {
            if ui.button("Start").clicked() {
                self.runtime.start_stopwatch();
            }
            if ui.button("Stop").clicked() {
                self.runtime.stop_stopwatch();
            }
            if ui.button("Reset").clicked() {
                self.runtime.reset_stopwatch();
            }
            if ui.button("Lap").clicked() {
                self.runtime.lap_stopwatch();
            }
        });
        ui.add_space(6.0);

        ScrollArea::vertical()
            .id_salt("laps_scroll")
            .show(ui, |ui| {
                let laps = self.runtime.stopwatch().laps();
                for lap in laps {
                    ui.label(RichText::new(format_stopwatch(lap)).monospace());
                }
            });
    }

    fn show_prompt(&mut self, ctx: &egui::Context) {
        let Some(message) = self.prompts.front().cloned() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("deskclock")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(RichText::new(message.as_str()).size(20.0).strong());
                ui.add_space(8.0);
                dismissed = ui.button("OK").clicked();
            });
        if dismissed {
            let _ = self.prompts.pop_front();
        }
    }
}

impl eframe::App for ClockApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some((_, _, expires_at)) = &self.status_message
            && Instant::now() >= *expires_at
        {
            self.status_message = None;
        }

        let outcome = self.runtime.advance(&mut self.notifier);
        self.absorb(&outcome);

        TopBottomPanel::top("clock")
            .resizable(false)
            .show(ctx, |ui| self.show_clock(ui));
        TopBottomPanel::bottom("status")
            .resizable(false)
            .show(ctx, |ui| self.show_status(ui));

        // A pending prompt blocks the controls until dismissed.
        let blocked = !self.prompts.is_empty();
        CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!blocked, |ui| {
                ui.columns(3, |columns| {
                    self.show_alarms(&mut columns[0]);
                    self.show_countdown(&mut columns[1]);
                    self.show_stopwatch(&mut columns[2]);
                });
            });
        });
        self.show_prompt(ctx);

        if outcome.stopwatch_redraw {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(self.runtime.next_wakeup().max(MIN_REPAINT));
        }
    }
}

impl Drop for ClockApp {
    fn drop(&mut self) {
        self.runtime.shutdown();
    }
}
