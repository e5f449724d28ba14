//! Reusable UI components
//!
//! Standalone widgets shared by the form sidebar and the result panel.

use crate::theme;
use eframe::egui;

/// Scale an image to fit inside `max`, never upscaling.
pub fn fit_size(image: egui::Vec2, max: egui::Vec2) -> egui::Vec2 {
    if image.x <= 0.0 || image.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (max.x / image.x).min(max.y / image.y).min(1.0);
    image * scale
}

/// Small uppercase section label
pub fn field_label(ui: &mut egui::Ui, text: &str) {
    ui.add(
        egui::Label::new(
            egui::RichText::new(text)
                .color(theme::TEXT_DIM)
                .size(theme::FONT_SMALL),
        )
        .selectable(false),
    );
}

/// Label/value row used for template name and caption lines
pub fn caption_row(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.horizontal_wrapped(|ui| {
        ui.label(
            egui::RichText::new(format!("{}:", label))
                .color(theme::TEXT_MUTED)
                .size(theme::FONT_LABEL),
        );
        ui.label(
            egui::RichText::new(value)
                .color(theme::TEXT_PRIMARY)
                .size(theme::FONT_BODY),
        );
    });
}

/// Error banner with a warning icon. Returns true if the close icon was clicked.
pub fn error_banner(ui: &mut egui::Ui, message: &str) -> bool {
    let mut dismissed = false;
    ui.scope(|ui| {
        ui.style_mut().spacing.item_spacing.x = 0.0;
        theme::error_frame().show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.horizontal(|ui| {
                let text = format!("{}  {}", egui_phosphor::regular::WARNING, message);
                ui.add(
                    egui::Label::new(egui::RichText::new(text).color(theme::ERROR_TEXT)).wrap(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let close = ui.add(
                        egui::Label::new(
                            egui::RichText::new(egui_phosphor::regular::X).color(theme::ERROR_TEXT),
                        )
                        .sense(egui::Sense::click()),
                    );
                    if close.hovered() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                    }
                    dismissed = close.clicked();
                });
            });
        });
    });
    dismissed
}

/// Green/red dot followed by a component name
pub fn status_line(ui: &mut egui::Ui, name: &str, ok: bool) {
    ui.horizontal(|ui| {
        let color = if ok {
            theme::STATUS_SUCCESS
        } else {
            theme::STATUS_ERROR
        };
        let (rect, _) = ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
        ui.painter().circle_filled(rect.center(), 4.0, color);
        ui.label(egui::RichText::new(name.replace('_', " ")).size(theme::FONT_LABEL));
    });
}
