//! Texture loading for the logo and the generated meme

use super::App;
use crate::controller::Phase;
use crate::utils;
use eframe::egui;
use tracing::{debug, warn};

impl App {
    pub fn logo_texture(&mut self, ctx: &egui::Context, width: f32) -> Option<egui::TextureHandle> {
        if let Some(texture) = &self.logo_texture {
            return Some(texture.clone());
        }
        let Some((pixels, w, h)) = utils::rasterize_logo((width * 2.0) as u32) else {
            warn!("Failed to rasterize logo");
            return None;
        };
        let texture = ctx.load_texture(
            "logo",
            egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &pixels),
            egui::TextureOptions::LINEAR,
        );
        self.logo_texture = Some(texture.clone());
        Some(texture)
    }

    /// Texture for the meme currently on display, uploaded once per result.
    pub fn meme_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        let Phase::Result(view) = self.controller.phase() else {
            self.meme_texture = None;
            return None;
        };
        let image = view.image.as_ref()?;

        if let Some((id, texture)) = &self.meme_texture {
            if *id == view.id {
                return Some(texture.clone());
            }
        }

        debug!(id = view.id, width = image.width, height = image.height, "Uploading meme texture");
        let texture = ctx.load_texture(
            format!("meme_{}", view.id),
            egui::ColorImage::from_rgba_unmultiplied(
                [image.width as usize, image.height as usize],
                &image.rgba,
            ),
            egui::TextureOptions::LINEAR,
        );
        self.meme_texture = Some((view.id, texture.clone()));
        Some(texture)
    }
}
