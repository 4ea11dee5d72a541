use eframe::egui::{self, Color32, RichText, Ui};

pub const ACCENT: Color32 = Color32::from_rgb(96, 228, 206);
pub const CLOCK_MAIN: Color32 = Color32::from_rgb(255, 214, 117);
pub const MUTED: Color32 = Color32::from_rgb(161, 180, 201);
pub const OK: Color32 = Color32::from_rgb(111, 228, 134);
pub const WARN: Color32 = Color32::from_rgb(255, 183, 95);
pub const ALERT: Color32 = Color32::from_rgb(255, 106, 106);

pub fn configure_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.override_text_color = Some(Color32::from_rgb(226, 234, 246));
    visuals.panel_fill = Color32::from_rgb(8, 16, 26);
    visuals.window_fill = Color32::from_rgb(12, 20, 32);
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(16, 24, 38);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(26, 42, 62);
    visuals.widgets.active.bg_fill = Color32::from_rgb(34, 60, 88);
    visuals.selection.bg_fill = Color32::from_rgb(43, 148, 178);
    ctx.set_visuals(visuals);
}

pub fn section_heading(ui: &mut Ui, text: &str) {
    ui.heading(RichText::new(text).color(ACCENT).strong());
    ui.separator();
}

pub fn readout(ui: &mut Ui, text: &str, color: Color32) {
    ui.label(RichText::new(text).size(34.0).monospace().color(color).strong());
}

pub fn muted(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(MUTED));
}
