//! View rendering (form sidebar, result panel)

use super::App;
use crate::constants::*;
use crate::controller::Phase;
use crate::theme;
use crate::types::Style;
use crate::ui::components::{caption_row, error_banner, field_label, fit_size, status_line};
use eframe::egui;

/// What the user clicked in the result panel, applied after rendering
enum ResultAction {
    Save,
    OpenInBrowser,
    GenerateAnother,
    DismissError,
}

impl App {
    pub(crate) fn render_sidebar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let avail_w = ui.available_width();

        // Header with logo, centered
        ui.add_space(12.0);
        ui.with_layout(egui::Layout::top_down(egui::Align::Center), |ui| {
            if let Some(texture) = self.logo_texture(ctx, avail_w * 0.3) {
                let aspect = texture.size()[1] as f32 / texture.size()[0] as f32;
                let logo_w = avail_w * 0.3;
                ui.image(egui::load::SizedTexture::new(
                    texture.id(),
                    egui::vec2(logo_w, logo_w * aspect),
                ));
            }
            ui.add_space(theme::SPACING_SM);
            ui.add(
                egui::Label::new(
                    egui::RichText::new("MEME STUDIO")
                        .size(theme::FONT_SMALL)
                        .color(theme::TEXT_DIM),
                )
                .selectable(false),
            );
        });
        ui.add_space(theme::SPACING_LG);

        let mut submit = false;
        theme::section_frame().show(ui, |ui| {
            ui.set_min_width(ui.available_width());

            // Topic
            field_label(ui, "TOPIC");
            let topic = ui.add(
                egui::TextEdit::singleline(&mut self.controller.form.topic)
                    .hint_text("e.g. working from home")
                    .desired_width(f32::INFINITY),
            );
            if self.controller.take_focus_request() {
                topic.request_focus();
            }
            if topic.gained_focus() {
                self.show_suggestions = false;
            }
            if topic.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }

            ui.add_space(theme::SPACING_MD);

            // Template, with suggestions filtered as you type
            field_label(ui, "TEMPLATE (OPTIONAL)");
            let template = ui.add(
                egui::TextEdit::singleline(&mut self.controller.form.template)
                    .hint_text("Leave blank to let the AI pick")
                    .desired_width(f32::INFINITY),
            );
            if template.gained_focus() || template.changed() {
                self.show_suggestions = true;
            }
            if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                self.show_suggestions = false;
            }
            if self.show_suggestions {
                self.render_suggestions(ui);
            }

            ui.add_space(theme::SPACING_MD);

            // Style
            field_label(ui, "STYLE");
            egui::ComboBox::from_id_salt("style_picker")
                .selected_text(self.controller.form.style.label())
                .width(ui.available_width())
                .show_ui(ui, |ui| {
                    for style in Style::ALL {
                        ui.selectable_value(&mut self.controller.form.style, style, style.label());
                    }
                });

            ui.add_space(theme::SPACING_LG);

            let enabled = self.controller.submit_enabled();
            let label = if self.controller.is_loading() {
                format!("{}  Generating...", egui_phosphor::regular::HOURGLASS)
            } else {
                format!("{}  Generate Meme", egui_phosphor::regular::MAGIC_WAND)
            };
            let generate = ui.add_enabled(
                enabled,
                theme::button_accent(label, enabled)
                    .min_size(egui::vec2(ui.available_width(), theme::BUTTON_HEIGHT_LARGE)),
            );
            if generate.clicked() {
                submit = true;
            }

            ui.add_space(theme::SPACING_SM);
            let can_preview = enabled && !self.controller.caption_loading();
            let preview = ui.add_enabled(
                can_preview,
                theme::button(format!("{}  Preview caption", egui_phosphor::regular::CHAT_TEXT))
                    .min_size(egui::vec2(ui.available_width(), 28.0)),
            );
            if preview.clicked() {
                self.show_suggestions = false;
                self.controller.preview_caption();
            }

            if self.controller.caption_loading() {
                ui.add_space(theme::SPACING_SM);
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new("Writing caption...").color(theme::TEXT_MUTED));
                });
            } else if let Some(preview) = self.controller.caption_preview() {
                ui.add_space(theme::SPACING_SM);
                caption_row(ui, "Top", &preview.top_text);
                caption_row(ui, "Bottom", &preview.bottom_text);
            } else if let Some(message) = self.controller.caption_error() {
                ui.add_space(theme::SPACING_SM);
                ui.label(
                    egui::RichText::new(format!("{}  {}", egui_phosphor::regular::WARNING, message))
                        .color(theme::STATUS_ERROR),
                );
            }
        });

        if submit {
            self.show_suggestions = false;
            self.controller.generate_meme();
        }

        ui.add_space(theme::SPACING_LG);
        self.render_stats(ui);
    }

    fn render_suggestions(&mut self, ui: &mut egui::Ui) {
        let matches: Vec<String> = self
            .controller
            .matching_suggestions(&self.controller.form.template)
            .into_iter()
            .filter(|name| *name != self.controller.form.template)
            .map(String::from)
            .collect();
        if matches.is_empty() {
            return;
        }

        let mut picked = None;
        egui::Frame::new()
            .fill(theme::BG_ELEVATED)
            .stroke(egui::Stroke::new(theme::STROKE_DEFAULT, theme::BORDER_SUBTLE))
            .corner_radius(theme::RADIUS_DEFAULT)
            .inner_margin(egui::Margin::same(4))
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(theme::SUGGESTION_LIST_HEIGHT)
                    .show(ui, |ui| {
                        for name in &matches {
                            if theme::suggestion_item(ui, name) {
                                picked = Some(name.clone());
                            }
                        }
                    });
            });

        if let Some(name) = picked {
            self.controller.form.template = name;
            self.show_suggestions = false;
        }
    }

    fn render_stats(&self, ui: &mut egui::Ui) {
        let response = ui
            .horizontal(|ui| {
                ui.label(
                    egui::RichText::new(egui_phosphor::regular::IMAGES)
                        .color(theme::ACCENT)
                        .size(theme::FONT_HEADING),
                );
                ui.label(egui::RichText::new("Templates loaded:").color(theme::TEXT_MUTED));
                ui.label(egui::RichText::new(self.controller.template_count()).strong());
            })
            .response;

        response.on_hover_ui(|ui| {
            ui.label(egui::RichText::new(&self.api_base_url).color(theme::TEXT_DIM));
            match self.controller.health() {
                Some(health) => {
                    ui.label(format!("Status: {}", health.status));
                    for (name, ok) in &health.components {
                        status_line(ui, name, *ok);
                    }
                }
                None => {
                    ui.label(format!("Status: {}", STATS_PLACEHOLDER));
                }
            }
        });
    }

    pub(crate) fn render_result_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let texture = self.meme_texture(ctx);
        let mut action = None;

        match self.controller.phase() {
            Phase::Idle => {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("Enter a topic and hit Generate")
                            .color(theme::TEXT_DIM)
                            .size(theme::FONT_HEADING),
                    );
                });
            }
            Phase::Loading => {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() * 0.4);
                    ui.add(egui::Spinner::new().size(32.0).color(theme::ACCENT));
                    ui.add_space(theme::SPACING_MD);
                    ui.label(
                        egui::RichText::new("Cooking up your meme...").color(theme::TEXT_MUTED),
                    );
                });
            }
            Phase::Error(message) => {
                if error_banner(ui, message) {
                    action = Some(ResultAction::DismissError);
                }
            }
            Phase::Result(view) => {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    theme::card_frame().show(ui, |ui| {
                        ui.set_min_width(ui.available_width());
                        ui.vertical_centered(|ui| {
                            match &texture {
                                Some(texture) => {
                                    let max = egui::vec2(ui.available_width(), theme::MEME_MAX_HEIGHT);
                                    let size = fit_size(texture.size_vec2(), max);
                                    ui.image(egui::load::SizedTexture::new(texture.id(), size))
                                        .on_hover_text(&view.alt_text);
                                }
                                None => {
                                    ui.add_space(theme::SPACING_XL);
                                    ui.spinner();
                                    ui.label(
                                        egui::RichText::new("Loading image...")
                                            .color(theme::TEXT_MUTED),
                                    );
                                    ui.add_space(theme::SPACING_XL);
                                }
                            }
                        });

                        ui.add_space(theme::SPACING_LG);
                        ui.label(
                            egui::RichText::new(&view.template_name)
                                .size(theme::FONT_TITLE)
                                .strong(),
                        );
                        caption_row(ui, "Top text", &view.top_text);
                        caption_row(ui, "Bottom text", &view.bottom_text);

                        ui.add_space(theme::SPACING_LG);
                        ui.horizontal(|ui| {
                            let loaded = view.image.is_some();
                            let save = ui.add_enabled(
                                loaded,
                                theme::button_accent(
                                    format!("{}  Save meme", egui_phosphor::regular::DOWNLOAD_SIMPLE),
                                    loaded,
                                ),
                            );
                            if save.clicked() {
                                action = Some(ResultAction::Save);
                            }
                            if ui
                                .add(theme::button(format!(
                                    "{}  Open in browser",
                                    egui_phosphor::regular::ARROW_SQUARE_OUT
                                )))
                                .on_hover_text(&view.meme_url)
                                .clicked()
                            {
                                action = Some(ResultAction::OpenInBrowser);
                            }
                            if ui
                                .add(theme::button(format!(
                                    "{}  Generate another",
                                    egui_phosphor::regular::ARROW_CLOCKWISE
                                )))
                                .clicked()
                            {
                                action = Some(ResultAction::GenerateAnother);
                            }
                        });
                    });
                });
            }
        }

        match action {
            Some(ResultAction::Save) => self.save_meme(),
            Some(ResultAction::OpenInBrowser) => self.open_in_browser(),
            Some(ResultAction::GenerateAnother) => {
                self.show_suggestions = false;
                self.controller.reset();
            }
            Some(ResultAction::DismissError) => self.controller.dismiss_error(),
            None => {}
        }
    }
}
