//! App module - contains the window state and wires it to the controller

mod export;
mod images;
mod views;

use crate::api::ApiClient;
use crate::controller::Controller;
use crate::settings::Settings;
use crate::theme;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) controller: Controller,
    pub(crate) settings: Settings,
    pub(crate) api_base_url: String,
    pub(crate) logo_texture: Option<egui::TextureHandle>,
    // Texture for the current result, keyed by its request sequence number
    pub(crate) meme_texture: Option<(u64, egui::TextureHandle)>,
    pub(crate) show_suggestions: bool,
    pub(crate) download_path: PathBuf,
    // Central panel rect for toast positioning
    pub(crate) central_panel_rect: Option<egui::Rect>,
    // Toast notification
    pub(crate) toast_message: Option<String>,
    pub(crate) toast_is_error: bool,
    pub(crate) toast_start: Option<std::time::Instant>,
    // Window geometry, saved on exit
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
    pub(crate) data_dir: PathBuf,
    // Declared last so the controller (and its task handles) drop first
    pub(crate) runtime: tokio::runtime::Runtime,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        data_dir: PathBuf,
    ) -> Result<Self, DynError> {
        // Force dark theme
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        // Add Phosphor icons font
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        // Apply theme from theme.rs
        theme::apply_visuals(&cc.egui_ctx);

        let runtime = tokio::runtime::Runtime::new()?;
        let api_base_url = settings.effective_api_url();
        let client = ApiClient::new(&api_base_url, settings.request_timeout())?;
        info!(url = %client.base_url(), "API client ready");

        let mut controller =
            Controller::new(Arc::new(client), runtime.handle().clone(), settings.default_style);
        let repaint_ctx = cc.egui_ctx.clone();
        controller.attach(Arc::new(move || repaint_ctx.request_repaint()));

        Ok(Self {
            controller,
            download_path: settings.download_path_or_default(),
            settings,
            api_base_url,
            logo_texture: None,
            meme_texture: None,
            show_suggestions: false,
            central_panel_rect: None,
            toast_message: None,
            toast_is_error: false,
            toast_start: None,
            window_pos: None,
            window_size: None,
            needs_center: false,
            data_dir,
            runtime,
        })
    }

    pub fn save_settings(&self) {
        let settings = Settings {
            window_x: self.window_pos.map(|p| p.x),
            window_y: self.window_pos.map(|p| p.y),
            window_w: self.window_size.map(|s| s.x),
            window_h: self.window_size.map(|s| s.y),
            download_path: Some(self.download_path.to_string_lossy().to_string()),
            ..self.settings.clone()
        };
        settings.save(&self.data_dir);
    }

    pub fn show_toast(&mut self, message: impl Into<String>, is_error: bool) {
        self.toast_message = Some(message.into());
        self.toast_is_error = is_error;
        self.toast_start = Some(std::time::Instant::now());
    }

    /// Stop background work before the runtime goes away.
    pub fn shutdown(&mut self) {
        self.controller.detach();
    }
}
