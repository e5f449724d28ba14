//! UI controller - owns form input, display regions and the request lifecycle
//!
//! The controller knows nothing about egui. Background requests run on the
//! tokio runtime and report back through a channel; `poll` applies them on the
//! UI thread, so every state change happens in one place.

use crate::api::{ApiError, MemeBackend};
use crate::constants::*;
use crate::types::*;
use std::future::Future;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Called from background tasks after they queue a result (e.g. request a repaint).
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Editable form fields
#[derive(Debug, Clone, PartialEq)]
pub struct MemeForm {
    pub topic: String,
    pub template: String,
    pub style: Style,
}

impl MemeForm {
    pub fn with_style(style: Style) -> Self {
        Self {
            topic: String::new(),
            template: String::new(),
            style,
        }
    }
}

/// A generated meme as shown in the result panel
#[derive(Debug, Clone)]
pub struct MemeView {
    /// Sequence number of the request that produced it
    pub id: u64,
    pub meme_url: String,
    pub alt_text: String,
    pub template_name: String,
    pub top_text: String,
    pub bottom_text: String,
    pub download_name: String,
    pub image: Option<MemeImage>,
}

#[derive(Debug, Clone)]
pub enum Phase {
    Idle,
    Loading,
    Result(MemeView),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionPreview {
    pub top_text: String,
    pub bottom_text: String,
}

enum Event {
    Templates(Result<TemplateList, ApiError>),
    Health(Result<HealthStatus, ApiError>),
    Generated {
        seq: u64,
        result: Result<GenerationResult, ApiError>,
    },
    Image {
        seq: u64,
        result: Result<MemeImage, String>,
    },
    Caption {
        seq: u64,
        result: Result<CaptionResult, ApiError>,
    },
}

/// Events are tagged with the attach epoch that spawned them
struct Envelope {
    epoch: u64,
    event: Event,
}

pub struct Controller {
    backend: Arc<dyn MemeBackend>,
    runtime: tokio::runtime::Handle,
    events_tx: Sender<Envelope>,
    events_rx: Receiver<Envelope>,
    notifier: Option<Notifier>,
    cancel_token: Option<CancellationToken>,
    epoch: u64,
    default_style: Style,
    pub form: MemeForm,
    phase: Phase,
    submit_enabled: bool,
    suggestions: Vec<String>,
    template_count: String,
    health: Option<HealthStatus>,
    caption_preview: Option<CaptionPreview>,
    caption_error: Option<String>,
    caption_loading: bool,
    generation_seq: u64,
    caption_seq: u64,
    focus_topic: bool,
}

fn caption_text(text: Option<&str>) -> String {
    match text {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => CAPTION_PLACEHOLDER.to_string(),
    }
}

fn error_text(error: Option<String>, fallback: &str) -> String {
    error
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

impl Controller {
    pub fn new(
        backend: Arc<dyn MemeBackend>,
        runtime: tokio::runtime::Handle,
        default_style: Style,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            backend,
            runtime,
            events_tx,
            events_rx,
            notifier: None,
            cancel_token: None,
            epoch: 0,
            default_style,
            form: MemeForm::with_style(default_style),
            phase: Phase::Idle,
            submit_enabled: true,
            suggestions: Vec::new(),
            template_count: STATS_PENDING.to_string(),
            health: None,
            caption_preview: None,
            caption_error: None,
            caption_loading: false,
            generation_seq: 0,
            caption_seq: 0,
            focus_topic: true,
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Start listening and kick off the two independent startup fetches.
    pub fn attach(&mut self, notifier: Notifier) {
        if self.is_attached() {
            return;
        }
        self.epoch += 1;
        self.cancel_token = Some(CancellationToken::new());
        self.notifier = Some(notifier);
        self.template_count = STATS_PENDING.to_string();
        info!(epoch = self.epoch, "Controller attached");

        let backend = self.backend.clone();
        self.spawn(
            async move { backend.templates(TEMPLATE_SUGGESTION_LIMIT).await },
            Event::Templates,
        );
        let backend = self.backend.clone();
        self.spawn(async move { backend.health().await }, Event::Health);
    }

    /// Cancel in-flight work. Results that still arrive are discarded.
    pub fn detach(&mut self) {
        let Some(token) = self.cancel_token.take() else {
            return;
        };
        token.cancel();
        self.notifier = None;
        self.caption_loading = false;
        // A result whose image never arrived would wait forever
        let pending = match &self.phase {
            Phase::Loading => true,
            Phase::Result(view) => view.image.is_none(),
            _ => false,
        };
        if pending {
            self.phase = Phase::Idle;
        }
        self.submit_enabled = true;
        info!(epoch = self.epoch, "Controller detached");
    }

    pub fn is_attached(&self) -> bool {
        self.cancel_token.is_some()
    }

    fn spawn<T, Fut, W>(&self, work: Fut, wrap: W)
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        W: FnOnce(T) -> Event + Send + 'static,
    {
        let Some(token) = self.cancel_token.clone() else {
            return;
        };
        let tx = self.events_tx.clone();
        let notifier = self.notifier.clone();
        let epoch = self.epoch;

        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                out = work => {
                    // The receiver only goes away with the controller itself
                    if tx.send(Envelope { epoch, event: wrap(out) }).is_ok() {
                        if let Some(notify) = notifier {
                            notify();
                        }
                    }
                }
            }
        });
    }

    // ========================================================================
    // USER ACTIONS
    // ========================================================================

    fn validated_request(&self) -> Option<GenerationRequest> {
        let topic = self.form.topic.trim();
        if topic.is_empty() {
            return None;
        }
        let template = self.form.template.trim();
        let template_name = (!template.is_empty()).then(|| template.to_string());
        Some(GenerationRequest::new(topic, template_name, self.form.style))
    }

    /// Submit the form. Ignored while the submit control is disabled.
    pub fn generate_meme(&mut self) {
        if !self.submit_enabled {
            debug!("Submit ignored, request already in flight");
            return;
        }
        let Some(request) = self.validated_request() else {
            self.show_error(MSG_EMPTY_TOPIC);
            return;
        };
        if !self.is_attached() {
            warn!("Generate requested while controller is detached");
            return;
        }

        self.show_loading();
        self.cancel_caption();
        self.generation_seq += 1;
        let seq = self.generation_seq;
        info!(
            seq,
            topic = %request.topic,
            template = ?request.template_name,
            style = %request.style,
            "Generating meme"
        );

        let backend = self.backend.clone();
        self.spawn(async move { backend.generate(&request).await }, move |result| {
            Event::Generated { seq, result }
        });
    }

    /// Fetch a caption for the current form without rendering a meme.
    ///
    /// Outcomes land in the preview area only; the result panel and the
    /// submit control are never touched.
    pub fn preview_caption(&mut self) {
        if !self.submit_enabled || self.caption_loading {
            return;
        }
        self.caption_preview = None;
        let Some(request) = self.validated_request() else {
            self.caption_error = Some(MSG_EMPTY_TOPIC.to_string());
            return;
        };
        if !self.is_attached() {
            return;
        }

        self.caption_loading = true;
        self.caption_error = None;
        self.caption_seq += 1;
        let seq = self.caption_seq;
        let request = CaptionRequest::from(&request);
        debug!(seq, topic = %request.topic, "Previewing caption");

        let backend = self.backend.clone();
        self.spawn(async move { backend.caption(&request).await }, move |result| {
            Event::Caption { seq, result }
        });
    }

    /// "Generate another": hide the result and clear the form.
    pub fn reset(&mut self) {
        // Drops any generation or image still in flight for the hidden result
        self.generation_seq += 1;
        self.cancel_caption();
        self.phase = Phase::Idle;
        self.submit_enabled = true;
        self.form = MemeForm::with_style(self.default_style);
        self.focus_topic = true;
    }

    pub fn dismiss_error(&mut self) {
        if matches!(self.phase, Phase::Error(_)) {
            self.phase = Phase::Idle;
        }
    }

    // ========================================================================
    // STATE TRANSITIONS
    // ========================================================================

    /// Forget the current preview and drop any preview response still in flight.
    fn cancel_caption(&mut self) {
        self.caption_seq += 1;
        self.caption_loading = false;
        self.caption_preview = None;
        self.caption_error = None;
    }

    fn show_loading(&mut self) {
        self.phase = Phase::Loading;
        self.submit_enabled = false;
    }

    fn show_error(&mut self, message: &str) {
        self.phase = Phase::Error(message.to_string());
        self.submit_enabled = true;
    }

    fn display_meme(&mut self, seq: u64, result: GenerationResult) {
        let (Some(meme_url), Some(template)) = (result.meme_url, result.template) else {
            warn!(seq, "Successful response is missing meme_url or template");
            self.show_error(MSG_NETWORK_ERROR);
            return;
        };
        let caption = result.caption.unwrap_or_default();
        let meme_url = self.backend.resolve_url(&meme_url);

        let view = MemeView {
            id: seq,
            meme_url: meme_url.clone(),
            alt_text: format!("{} meme", template.name),
            template_name: template.name,
            top_text: caption_text(caption.top_text.as_deref()),
            bottom_text: caption_text(caption.bottom_text.as_deref()),
            download_name: format!("meme_{}.jpg", chrono::Utc::now().timestamp_millis()),
            image: None,
        };
        info!(seq, url = %view.meme_url, template = %view.template_name, "Meme generated");
        self.phase = Phase::Result(view);

        // Submit stays disabled until the image is actually displayable
        let backend = self.backend.clone();
        self.spawn(
            async move {
                match backend.fetch_image(&meme_url).await {
                    Ok(bytes) => MemeImage::decode(bytes).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                }
            },
            move |result| Event::Image { seq, result },
        );
    }

    fn on_image_loaded(&mut self, image: MemeImage) {
        if let Phase::Result(view) = &mut self.phase {
            debug!(width = image.width, height = image.height, "Meme image loaded");
            view.image = Some(image);
        }
        self.submit_enabled = true;
    }

    fn on_image_failed(&mut self, reason: &str) {
        warn!(error = %reason, "Meme image failed to load");
        self.show_error(MSG_IMAGE_FAILED);
    }

    // ========================================================================
    // EVENT PUMP
    // ========================================================================

    /// Apply every background result that has arrived. Call once per frame.
    pub fn poll(&mut self) {
        while let Ok(envelope) = self.events_rx.try_recv() {
            self.apply(envelope);
        }
    }

    fn apply(&mut self, Envelope { epoch, event }: Envelope) {
        if !self.is_attached() || epoch != self.epoch {
            debug!(epoch, current = self.epoch, "Dropping stale event");
            return;
        }

        match event {
            Event::Templates(Ok(list)) if list.success => {
                debug!(count = list.templates.len(), "Template suggestions loaded");
                self.suggestions = list.templates.into_iter().map(|t| t.name).collect();
            }
            Event::Templates(Ok(_)) => warn!("Template list request reported failure"),
            Event::Templates(Err(e)) => warn!(error = %e, "Failed to load template suggestions"),

            Event::Health(Ok(health)) => {
                self.template_count = if health.status == HEALTHY_STATUS {
                    health.templates_loaded.to_string()
                } else {
                    STATS_PLACEHOLDER.to_string()
                };
                debug!(status = %health.status, templates = health.templates_loaded, "Health loaded");
                self.health = Some(health);
            }
            Event::Health(Err(e)) => {
                warn!(error = %e, "Failed to load stats");
                self.template_count = STATS_PLACEHOLDER.to_string();
            }

            Event::Generated { seq, result } => {
                if seq != self.generation_seq || !matches!(self.phase, Phase::Loading) {
                    debug!(seq, "Dropping superseded generation result");
                    return;
                }
                match result {
                    Ok(res) if res.success => self.display_meme(seq, res),
                    Ok(res) => {
                        let message = error_text(res.error, MSG_GENERATE_FAILED);
                        warn!(seq, error = %message, "Meme generation failed");
                        self.show_error(&message);
                    }
                    Err(e) => {
                        warn!(seq, error = %e, "Error generating meme");
                        self.show_error(MSG_NETWORK_ERROR);
                    }
                }
            }

            Event::Image { seq, result } => {
                let current = matches!(&self.phase, Phase::Result(view) if view.id == seq);
                if !current {
                    return;
                }
                match result {
                    Ok(image) => self.on_image_loaded(image),
                    Err(reason) => self.on_image_failed(&reason),
                }
            }

            Event::Caption { seq, result } => {
                if seq != self.caption_seq {
                    return;
                }
                self.caption_loading = false;
                match result {
                    Ok(res) if res.success => {
                        let caption = res.caption.unwrap_or_default();
                        self.caption_preview = Some(CaptionPreview {
                            top_text: caption_text(caption.top_text.as_deref()),
                            bottom_text: caption_text(caption.bottom_text.as_deref()),
                        });
                    }
                    Ok(res) => {
                        let message = error_text(res.error, MSG_CAPTION_FAILED);
                        warn!(seq, error = %message, "Caption preview failed");
                        self.caption_error = Some(message);
                    }
                    Err(e) => {
                        warn!(seq, error = %e, "Error previewing caption");
                        self.caption_error = Some(MSG_NETWORK_ERROR.to_string());
                    }
                }
            }
        }
    }

    /// Block until one background result has been applied.
    #[cfg(test)]
    fn wait_for_event(&mut self, timeout: std::time::Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(envelope) => {
                self.apply(envelope);
                true
            }
            Err(_) => false,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn template_count(&self) -> &str {
        &self.template_count
    }

    pub fn health(&self) -> Option<&HealthStatus> {
        self.health.as_ref()
    }

    /// Template names containing `query`, case-insensitive, in fetch order.
    pub fn matching_suggestions(&self, query: &str) -> Vec<&str> {
        let query = query.trim().to_lowercase();
        self.suggestions
            .iter()
            .filter(|name| query.is_empty() || name.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }

    pub fn caption_preview(&self) -> Option<&CaptionPreview> {
        self.caption_preview.as_ref()
    }

    pub fn caption_error(&self) -> Option<&str> {
        self.caption_error.as_deref()
    }

    pub fn caption_loading(&self) -> bool {
        self.caption_loading
    }

    /// Returns true once after a reset so the view can focus the topic field.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    /// Canned backend. `None` replies simulate an undecodable/failed transport.
    #[derive(Default)]
    struct FakeBackend {
        generate: Option<GenerationResult>,
        caption: Option<CaptionResult>,
        templates: Option<TemplateList>,
        health: Option<HealthStatus>,
        image: Option<Vec<u8>>,
        delay: Duration,
        caption_delay: Duration,
        generate_calls: AtomicUsize,
        caption_calls: AtomicUsize,
        image_calls: AtomicUsize,
    }

    fn transport_error() -> ApiError {
        ApiError::Decode(serde_json::from_str::<serde_json::Value>("<html>").unwrap_err())
    }

    fn reply<T: Clone>(value: &Option<T>) -> Result<T, ApiError> {
        value.clone().ok_or_else(transport_error)
    }

    #[async_trait]
    impl MemeBackend for FakeBackend {
        async fn generate(&self, _req: &GenerationRequest) -> Result<GenerationResult, ApiError> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            reply(&self.generate)
        }

        async fn caption(&self, _req: &CaptionRequest) -> Result<CaptionResult, ApiError> {
            self.caption_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.caption_delay).await;
            reply(&self.caption)
        }

        async fn templates(&self, _limit: usize) -> Result<TemplateList, ApiError> {
            tokio::time::sleep(self.delay).await;
            reply(&self.templates)
        }

        async fn health(&self) -> Result<HealthStatus, ApiError> {
            tokio::time::sleep(self.delay).await;
            reply(&self.health)
        }

        async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>, ApiError> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            self.image
                .clone()
                .ok_or(ApiError::Status(reqwest::StatusCode::NOT_FOUND))
        }

        fn resolve_url(&self, url: &str) -> String {
            format!("http://backend.test{}", url)
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn success_response(top: Option<&str>, bottom: Option<&str>) -> GenerationResult {
        GenerationResult {
            success: true,
            meme_url: Some("/generated_memes/meme_1.jpg".into()),
            template: Some(TemplateInfo {
                name: "Distracted Boyfriend".into(),
            }),
            caption: Some(Caption {
                top_text: top.map(String::from),
                bottom_text: bottom.map(String::from),
            }),
            error: None,
        }
    }

    struct Harness {
        controller: Controller,
        backend: Arc<FakeBackend>,
        // Dropped last so background tasks outlive the controller
        _runtime: tokio::runtime::Runtime,
    }

    impl Harness {
        fn new(backend: FakeBackend) -> Self {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let backend = Arc::new(backend);
            let mut controller =
                Controller::new(backend.clone(), runtime.handle().clone(), Style::Funny);
            controller.attach(Arc::new(|| {}));
            Self {
                controller,
                backend,
                _runtime: runtime,
            }
        }

        /// Apply the two startup events, in whatever order they land.
        fn settle_startup(&mut self) {
            assert!(self.controller.wait_for_event(WAIT));
            assert!(self.controller.wait_for_event(WAIT));
        }

        fn submit(&mut self, topic: &str) {
            self.controller.form.topic = topic.to_string();
            self.controller.generate_meme();
        }
    }

    fn result_view(controller: &Controller) -> &MemeView {
        match controller.phase() {
            Phase::Result(view) => view,
            other => panic!("expected result, got {:?}", other),
        }
    }

    fn error_message(controller: &Controller) -> &str {
        match controller.phase() {
            Phase::Error(message) => message,
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn empty_topic_never_hits_the_network() {
        let mut h = Harness::new(FakeBackend::default());
        h.submit("   ");

        assert_eq!(error_message(&h.controller), MSG_EMPTY_TOPIC);
        assert!(h.controller.submit_enabled());
        assert_eq!(h.backend.generate_calls.load(Ordering::SeqCst), 0);

        h.controller.dismiss_error();
        h.controller.preview_caption();
        assert_eq!(h.backend.caption_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.controller.caption_error(), Some(MSG_EMPTY_TOPIC));
        assert!(matches!(h.controller.phase(), Phase::Idle));
    }

    #[test]
    fn healthy_backend_shows_template_count() {
        let mut h = Harness::new(FakeBackend {
            health: Some(HealthStatus {
                status: "healthy".into(),
                templates_loaded: 42,
                ..Default::default()
            }),
            templates: Some(TemplateList {
                success: true,
                templates: vec![
                    TemplateSuggestion { name: "Drake Hotline Bling".into() },
                    TemplateSuggestion { name: "Two Buttons".into() },
                ],
            }),
            ..Default::default()
        });
        assert_eq!(h.controller.template_count(), STATS_PENDING);
        h.settle_startup();

        assert_eq!(h.controller.template_count(), "42");
        assert_eq!(
            h.controller.matching_suggestions(""),
            vec!["Drake Hotline Bling", "Two Buttons"]
        );
        assert_eq!(h.controller.matching_suggestions("drake"), vec!["Drake Hotline Bling"]);
        assert_eq!(h.controller.matching_suggestions("  BUTTONS "), vec!["Two Buttons"]);
    }

    #[test]
    fn unhealthy_or_unreachable_backend_shows_placeholder() {
        let mut h = Harness::new(FakeBackend {
            health: Some(HealthStatus {
                status: "degraded".into(),
                templates_loaded: 42,
                ..Default::default()
            }),
            ..Default::default()
        });
        h.settle_startup();
        assert_eq!(h.controller.template_count(), STATS_PLACEHOLDER);
        assert!(h.controller.matching_suggestions("").is_empty());

        let mut h = Harness::new(FakeBackend::default());
        h.settle_startup();
        assert_eq!(h.controller.template_count(), STATS_PLACEHOLDER);
    }

    #[test]
    fn success_renders_result_and_waits_for_image() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(success_response(None, Some("NOBODY"))),
            image: Some(png_bytes()),
            ..Default::default()
        });
        h.settle_startup();
        h.submit("  cats  ");
        assert!(h.controller.is_loading());
        assert!(!h.controller.submit_enabled());

        assert!(h.controller.wait_for_event(WAIT));
        let view = result_view(&h.controller);
        assert_eq!(view.top_text, CAPTION_PLACEHOLDER);
        assert_eq!(view.bottom_text, "NOBODY");
        assert_eq!(view.template_name, "Distracted Boyfriend");
        assert_eq!(view.alt_text, "Distracted Boyfriend meme");
        assert_eq!(view.meme_url, "http://backend.test/generated_memes/meme_1.jpg");
        assert!(view.download_name.starts_with("meme_") && view.download_name.ends_with(".jpg"));
        assert!(view.image.is_none());
        assert!(!h.controller.submit_enabled());

        assert!(h.controller.wait_for_event(WAIT));
        let image = result_view(&h.controller).image.as_ref().unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert!(h.controller.submit_enabled());
    }

    #[test]
    fn empty_caption_text_also_falls_back() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(success_response(Some(""), None)),
            image: Some(png_bytes()),
            ..Default::default()
        });
        h.settle_startup();
        h.submit("cats");
        assert!(h.controller.wait_for_event(WAIT));
        let view = result_view(&h.controller);
        assert_eq!(view.top_text, CAPTION_PLACEHOLDER);
        assert_eq!(view.bottom_text, CAPTION_PLACEHOLDER);
    }

    #[test]
    fn image_failure_shows_error_and_reenables_submit() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(success_response(Some("A"), Some("B"))),
            image: None,
            ..Default::default()
        });
        h.settle_startup();
        h.submit("cats");
        assert!(h.controller.wait_for_event(WAIT));
        assert!(h.controller.wait_for_event(WAIT));

        assert_eq!(error_message(&h.controller), MSG_IMAGE_FAILED);
        assert!(h.controller.submit_enabled());
        assert_eq!(h.backend.image_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn server_failure_without_message_uses_fallback() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(GenerationResult::default()),
            ..Default::default()
        });
        h.settle_startup();
        h.submit("cats");
        assert!(h.controller.wait_for_event(WAIT));
        assert_eq!(error_message(&h.controller), MSG_GENERATE_FAILED);
        assert!(h.controller.submit_enabled());
    }

    #[test]
    fn server_failure_message_is_shown_verbatim() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(GenerationResult {
                error: Some(r#"Template "Nope" not found"#.into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        h.settle_startup();
        h.controller.form.template = "Nope".into();
        h.submit("cats");
        assert!(h.controller.wait_for_event(WAIT));
        assert_eq!(error_message(&h.controller), r#"Template "Nope" not found"#);
    }

    #[test]
    fn transport_failure_shows_network_error() {
        let mut h = Harness::new(FakeBackend::default());
        h.settle_startup();
        h.submit("cats");
        assert!(!h.controller.submit_enabled());
        assert!(h.controller.wait_for_event(WAIT));

        assert_eq!(error_message(&h.controller), MSG_NETWORK_ERROR);
        assert!(h.controller.submit_enabled());
    }

    #[test]
    fn submit_is_ignored_while_loading() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(GenerationResult::default()),
            delay: Duration::from_millis(50),
            ..Default::default()
        });
        h.submit("cats");
        h.submit("dogs");
        h.settle_startup();
        assert!(h.controller.wait_for_event(WAIT));
        assert_eq!(h.backend.generate_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn generate_another_clears_form_and_result() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(success_response(Some("A"), Some("B"))),
            image: Some(png_bytes()),
            ..Default::default()
        });
        h.settle_startup();
        // The topic field is focused on first show
        assert!(h.controller.take_focus_request());
        h.controller.form.template = "Two Buttons".into();
        h.controller.form.style = Style::Dark;
        h.submit("cats");
        assert!(h.controller.wait_for_event(WAIT));
        assert!(!h.controller.take_focus_request());

        h.controller.reset();
        assert!(matches!(h.controller.phase(), Phase::Idle));
        assert_eq!(h.controller.form, MemeForm::with_style(Style::Funny));
        assert!(h.controller.submit_enabled());
        assert!(h.controller.take_focus_request());

        // The image for the hidden result must not resurrect it
        assert!(h.controller.wait_for_event(WAIT));
        assert!(matches!(h.controller.phase(), Phase::Idle));
    }

    #[test]
    fn caption_preview_uses_placeholder() {
        let mut h = Harness::new(FakeBackend {
            caption: Some(CaptionResult {
                success: true,
                caption: Some(Caption {
                    top_text: Some("WHEN THE BUILD PASSES".into()),
                    bottom_text: None,
                }),
                error: None,
            }),
            ..Default::default()
        });
        h.settle_startup();
        h.controller.form.topic = "ci".into();
        h.controller.preview_caption();
        assert!(h.controller.caption_loading());
        assert!(h.controller.wait_for_event(WAIT));

        assert!(!h.controller.caption_loading());
        assert_eq!(
            h.controller.caption_preview(),
            Some(&CaptionPreview {
                top_text: "WHEN THE BUILD PASSES".into(),
                bottom_text: CAPTION_PLACEHOLDER.into(),
            })
        );
    }

    #[test]
    fn caption_preview_failure_stays_in_preview_area() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(success_response(Some("A"), Some("B"))),
            image: Some(png_bytes()),
            caption: Some(CaptionResult {
                success: false,
                caption: None,
                error: None,
            }),
            ..Default::default()
        });
        h.settle_startup();
        h.submit("cats");
        assert!(h.controller.wait_for_event(WAIT));
        assert!(h.controller.wait_for_event(WAIT));
        assert!(result_view(&h.controller).image.is_some());

        h.controller.preview_caption();
        assert!(h.controller.wait_for_event(WAIT));

        assert_eq!(h.controller.caption_error(), Some(MSG_CAPTION_FAILED));
        assert!(!h.controller.caption_loading());
        assert_eq!(result_view(&h.controller).template_name, "Distracted Boyfriend");
        assert!(h.controller.submit_enabled());
    }

    #[test]
    fn generating_drops_pending_caption_preview() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(GenerationResult::default()),
            caption: None,
            delay: Duration::from_millis(300),
            ..Default::default()
        });
        h.settle_startup();
        h.controller.form.topic = "cats".into();
        h.controller.preview_caption();
        h.controller.generate_meme();
        assert!(!h.controller.caption_loading());

        // The failed preview lands first and must not end the generation
        assert!(h.controller.wait_for_event(WAIT));
        assert!(h.controller.is_loading());
        assert!(!h.controller.submit_enabled());
        assert_eq!(h.controller.caption_error(), None);

        h.controller.generate_meme();
        assert_eq!(h.backend.generate_calls.load(Ordering::SeqCst), 1);

        assert!(h.controller.wait_for_event(WAIT));
        assert_eq!(error_message(&h.controller), MSG_GENERATE_FAILED);
        assert!(h.controller.submit_enabled());
    }

    #[test]
    fn caption_preview_after_reset_is_dropped() {
        let mut h = Harness::new(FakeBackend {
            caption: Some(CaptionResult {
                success: false,
                caption: None,
                error: Some("boom".into()),
            }),
            caption_delay: Duration::from_millis(50),
            ..Default::default()
        });
        h.settle_startup();
        h.controller.form.topic = "cats".into();
        h.controller.preview_caption();
        h.controller.reset();
        assert!(!h.controller.caption_loading());

        assert!(h.controller.wait_for_event(WAIT));
        assert!(matches!(h.controller.phase(), Phase::Idle));
        assert_eq!(h.controller.caption_error(), None);
        assert_eq!(h.controller.caption_preview(), None);
    }

    #[test]
    fn generation_after_reset_is_dropped() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(success_response(Some("A"), Some("B"))),
            image: Some(png_bytes()),
            delay: Duration::from_millis(50),
            ..Default::default()
        });
        h.settle_startup();
        h.submit("cats");
        h.controller.reset();
        assert!(h.controller.submit_enabled());

        assert!(h.controller.wait_for_event(WAIT));
        assert!(matches!(h.controller.phase(), Phase::Idle));
        assert!(h.controller.submit_enabled());
        assert_eq!(h.backend.image_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn detach_while_image_loads_returns_to_idle() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(success_response(Some("A"), Some("B"))),
            image: Some(png_bytes()),
            ..Default::default()
        });
        h.settle_startup();
        h.submit("cats");
        assert!(h.controller.wait_for_event(WAIT));
        assert!(result_view(&h.controller).image.is_none());

        h.controller.detach();
        assert!(matches!(h.controller.phase(), Phase::Idle));
        assert!(h.controller.submit_enabled());

        std::thread::sleep(Duration::from_millis(100));
        h.controller.poll();
        assert!(matches!(h.controller.phase(), Phase::Idle));
    }

    #[test]
    fn detach_discards_late_results() {
        let mut h = Harness::new(FakeBackend {
            generate: Some(success_response(Some("A"), Some("B"))),
            health: Some(HealthStatus {
                status: "healthy".into(),
                templates_loaded: 7,
                ..Default::default()
            }),
            delay: Duration::from_millis(50),
            ..Default::default()
        });
        h.submit("cats");
        h.controller.detach();
        assert!(!h.controller.is_attached());
        assert!(matches!(h.controller.phase(), Phase::Idle));
        assert!(h.controller.submit_enabled());

        std::thread::sleep(Duration::from_millis(200));
        h.controller.poll();
        assert!(matches!(h.controller.phase(), Phase::Idle));
        assert_eq!(h.controller.template_count(), STATS_PENDING);
    }

    #[test]
    fn reattach_runs_startup_again() {
        let mut h = Harness::new(FakeBackend {
            health: Some(HealthStatus {
                status: "healthy".into(),
                templates_loaded: 3,
                ..Default::default()
            }),
            ..Default::default()
        });
        h.controller.detach();
        h.controller.attach(Arc::new(|| {}));
        h.controller.attach(Arc::new(|| {}));

        // Only the second epoch's two events are applied
        let mut applied = 0;
        while h.controller.wait_for_event(Duration::from_millis(500)) {
            applied += 1;
        }
        assert!(applied >= 2);
        assert_eq!(h.controller.template_count(), "3");
    }
}
