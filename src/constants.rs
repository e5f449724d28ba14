//! Application constants and configuration

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "Meme Studio";

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
/// Overrides the configured API base URL for the current session
pub const API_URL_ENV: &str = "MEME_API_URL";

// API routes
pub const GENERATE_PATH: &str = "/api/generate";
pub const CAPTION_PATH: &str = "/api/caption";
pub const TEMPLATES_PATH: &str = "/api/templates";
pub const HEALTH_PATH: &str = "/api/health";

pub const TEMPLATE_SUGGESTION_LIMIT: usize = 100;
pub const HEALTHY_STATUS: &str = "healthy";

// User-facing messages
pub const MSG_EMPTY_TOPIC: &str = "Please enter a topic for your meme";
pub const MSG_GENERATE_FAILED: &str = "Failed to generate meme";
pub const MSG_CAPTION_FAILED: &str = "Failed to generate caption";
pub const MSG_NETWORK_ERROR: &str = "Network error. Please check your connection and try again.";
pub const MSG_IMAGE_FAILED: &str = "Failed to load meme image";

// Display placeholders
pub const CAPTION_PLACEHOLDER: &str = "(none)";
pub const STATS_PLACEHOLDER: &str = "N/A";
pub const STATS_PENDING: &str = "...";
