//! Saving and opening the generated meme

use super::App;
use crate::controller::Phase;
use crate::utils::format_bytes;
use std::path::Path;
use tracing::{error, info};

/// Write the image bytes exactly as fetched, creating the parent folder if needed.
pub(crate) fn write_meme(dest: &Path, bytes: &[u8]) -> std::io::Result<u64> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(dest, bytes)?;
    Ok(bytes.len() as u64)
}

impl App {
    pub fn save_meme(&mut self) {
        let Phase::Result(view) = self.controller.phase() else {
            return;
        };
        let Some(image) = &view.image else {
            return;
        };
        let file_name = view.download_name.clone();
        let bytes = image.encoded.clone();

        let picked = rfd::FileDialog::new()
            .set_title("Save meme")
            .set_directory(&self.download_path)
            .set_file_name(&file_name)
            .add_filter("Image", &["jpg", "jpeg", "png"])
            .save_file();
        let Some(dest) = picked else {
            return;
        };

        match write_meme(&dest, &bytes) {
            Ok(size) => {
                info!(path = %dest.display(), size, "Meme saved");
                if let Some(parent) = dest.parent() {
                    self.download_path = parent.to_path_buf();
                }
                let name = dest
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or(file_name);
                self.show_toast(format!("Saved {} ({})", name, format_bytes(size)), false);
            }
            Err(e) => {
                error!(error = %e, path = %dest.display(), "Failed to save meme");
                self.show_toast(format!("Could not save meme: {}", e), true);
            }
        }
    }

    pub fn open_in_browser(&self) {
        let Phase::Result(view) = self.controller.phase() else {
            return;
        };
        let url = view.meme_url.clone();
        // Some platforms block until the browser has started
        self.runtime.spawn_blocking(move || {
            if let Err(e) = open::that(&url) {
                error!(error = %e, url = %url, "Failed to open meme in browser");
            }
        });
    }
}
