use eframe::{egui, NativeOptions};
use egui::{
    Align2, CentralPanel, Color32, ColorImage, FontId, Rect, RichText, ScrollArea, Sense,
    TopBottomPanel,
};
use log::{debug, error, info, warn};
use reqwest::Client as ReqwestClient;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

// Project Modules
mod arena;
mod config;
mod errors;
mod media;
mod model;
mod pagination;
mod playlist;
mod session;
mod slideshow;

use arena::ArenaClient;
use errors::{ApiError, MediaError};
use media::TextureStore;
use model::{ArenaChannel, ArenaUser, Block, SelectedChannel, SelectedUser, TokenResponse};
use pagination::{PageRequest, PaginationController, CONTENTS_PAGE_SIZE};
use playlist::filter_unique_images;
use session::SessionState;
use slideshow::{Slideshow, SlideshowCommand};

// --- Constants ---
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
const VISIBLE_DURATION_CHOICES_MS: [u64; 3] = [2500, 5000, 10000];
const GRID_TILE_SIZE: f32 = 220.0;

/// Results of the spawned network tasks, drained at the top of each frame.
enum AppEvent {
    TokenExchanged(Result<TokenResponse, ApiError>),
    SearchResults {
        query: String,
        users: Result<Vec<ArenaUser>, ApiError>,
        channels: Result<Vec<ArenaChannel>, ApiError>,
    },
    UserChannels {
        user_id: u64,
        result: Result<Vec<ArenaChannel>, ApiError>,
    },
    ContentsPage {
        request: PageRequest,
        result: Result<Vec<Block>, ApiError>,
    },
    ImageLoaded {
        url: String,
        result: Result<ColorImage, MediaError>,
    },
}

/// UI interactions collected while the panels borrow the app, applied after.
enum UiAction {
    ExchangeCode(String),
    SelectUser(ArenaUser),
    SelectChannel {
        channel: ArenaChannel,
        from_search: bool,
    },
    ResetAll,
    ClearChannelSelection,
    StartPlayback,
    StopPlayback,
    CycleDuration,
    Logout,
}

struct ArenaApp {
    client: Option<ArenaClient>,
    config_error: Option<String>,
    authorize_url: String,
    session: SessionState,
    session_path: PathBuf,
    egui_ctx: egui::Context,
    tx: mpsc::Sender<AppEvent>,
    rx: mpsc::Receiver<AppEvent>,

    // Authorization
    code_input: String,
    exchanging: bool,
    auth_error: Option<String>,

    // Search
    search_input: String,
    search_edited: Option<Instant>,
    searching: bool,
    search_users: Vec<ArenaUser>,
    search_channels: Vec<ArenaChannel>,

    // Selected user's channels
    user_channels: Vec<ArenaChannel>,
    loading_channels: bool,

    // Channel contents
    pagination: PaginationController,
    loading_contents: bool,

    // Playback
    slideshow: Slideshow,
    textures: TextureStore,
}

impl ArenaApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        info!("Initializing ArenaApp...");
        let (tx, rx) = mpsc::channel();
        let config_path = std::env::args()
            .nth(1)
            .unwrap_or_else(|| "arena-frame.conf".to_string());

        let mut client = None;
        let mut config_error = None;
        let mut authorize_url = String::new();
        match config::load_config(&config_path) {
            Ok(cfg) => {
                authorize_url = cfg.authorize_url();
                client = Some(ArenaClient::new(&cfg, ReqwestClient::new()));
            }
            Err(e) => {
                let msg = format!("Failed to load configuration from '{}': {}", config_path, e);
                error!("{}", msg);
                config_error = Some(msg);
            }
        }

        let session_path = session::default_session_path();
        let session = SessionState::load(&session_path);

        let mut app = Self {
            client,
            config_error,
            authorize_url,
            session,
            session_path,
            egui_ctx: cc.egui_ctx.clone(),
            tx,
            rx,
            code_input: String::new(),
            exchanging: false,
            auth_error: None,
            search_input: String::new(),
            search_edited: None,
            searching: false,
            search_users: Vec::new(),
            search_channels: Vec::new(),
            user_channels: Vec::new(),
            loading_channels: false,
            pagination: PaginationController::new(CONTENTS_PAGE_SIZE),
            loading_contents: false,
            slideshow: Slideshow::new(),
            textures: TextureStore::new(),
        };

        if app.client.is_some() {
            if app.session.access_token.is_some() {
                app.restore_selection();
            } else if let Some(code) = app.session.pending_code.clone() {
                info!("Found pending authorization code, attempting exchange");
                app.exchanging = true;
                app.spawn_token_exchange(code);
            }
        }
        app
    }

    fn persist(&self) {
        self.session.save(&self.session_path);
    }

    /// A restored user triggers a channels fetch; a restored channel
    /// triggers a contents fetch.
    fn restore_selection(&mut self) {
        if let Some(user) = self.session.selected_user.clone() {
            info!("Restoring selected user: {} ({})", user.full_name, user.id);
            self.loading_channels = true;
            self.spawn_user_channels(user.id);
        }
        if let Some(channel) = self.session.selected_channel.clone() {
            info!("Restoring selected channel: {} ({})", channel.title, channel.id);
            self.loading_contents = true;
            let request = self.pagination.begin(channel.id);
            self.spawn_contents(request);
        }
    }

    // --- Spawned fetch tasks ---

    fn spawn_token_exchange(&self, code: String) {
        let Some(client) = self.client.clone() else {
            return;
        };
        let tx = self.tx.clone();
        let ctx = self.egui_ctx.clone();
        debug!("Spawning token exchange task");
        tokio::spawn(async move {
            let result = client.exchange_code(&code).await;
            let _ = tx.send(AppEvent::TokenExchanged(result));
            ctx.request_repaint();
        });
    }

    fn spawn_search(&self, query: String) {
        let Some(client) = self.client.clone() else {
            return;
        };
        let Some(token) = self.session.access_token.clone() else {
            return;
        };
        let tx = self.tx.clone();
        let ctx = self.egui_ctx.clone();
        debug!("Spawning combined search task for '{}'", query);
        tokio::spawn(async move {
            let users = client.search_users(&token, &query).await;
            let channels = client.search_channels(&token, &query).await;
            let _ = tx.send(AppEvent::SearchResults {
                query,
                users,
                channels,
            });
            ctx.request_repaint();
        });
    }

    fn spawn_user_channels(&self, user_id: u64) {
        let Some(client) = self.client.clone() else {
            return;
        };
        let Some(token) = self.session.access_token.clone() else {
            return;
        };
        let tx = self.tx.clone();
        let ctx = self.egui_ctx.clone();
        debug!("Spawning channel listing task for user {}", user_id);
        tokio::spawn(async move {
            let result = client.user_channels(&token, user_id).await;
            let _ = tx.send(AppEvent::UserChannels { user_id, result });
            ctx.request_repaint();
        });
    }

    fn spawn_contents(&self, request: PageRequest) {
        let Some(client) = self.client.clone() else {
            return;
        };
        let Some(token) = self.session.access_token.clone() else {
            return;
        };
        let tx = self.tx.clone();
        let ctx = self.egui_ctx.clone();
        debug!(
            "Spawning contents fetch for channel {} page {} (append: {})",
            request.channel_id, request.page, request.append
        );
        tokio::spawn(async move {
            let result = client
                .channel_contents(&token, request.channel_id, request.page, request.per)
                .await;
            let _ = tx.send(AppEvent::ContentsPage { request, result });
            ctx.request_repaint();
        });
    }

    fn spawn_image_fetch(&self, url: String) {
        let Some(client) = self.client.clone() else {
            return;
        };
        let tx = self.tx.clone();
        let ctx = self.egui_ctx.clone();
        tokio::spawn(async move {
            let result = media::fetch_image(client.http(), &url).await;
            let _ = tx.send(AppEvent::ImageLoaded { url, result });
            ctx.request_repaint();
        });
    }

    // --- Event handling ---

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::TokenExchanged(result) => {
                self.exchanging = false;
                match result {
                    Ok(token) => {
                        info!("Access token obtained");
                        self.session.access_token = Some(token.access_token);
                        self.session.pending_code = None;
                        self.auth_error = None;
                        self.persist();
                        self.restore_selection();
                    }
                    Err(e) => {
                        error!("Token exchange failed: {}", e);
                        // A failed or malformed exchange forces re-authorization.
                        self.session.clear_auth();
                        self.persist();
                        self.auth_error = Some(e.to_string());
                    }
                }
            }
            AppEvent::SearchResults {
                query,
                users,
                channels,
            } => {
                if query != self.search_input.trim() {
                    debug!("Discarding stale search results for '{}'", query);
                    return;
                }
                self.searching = false;
                self.search_users = users.unwrap_or_else(|e| {
                    warn!("User search failed: {}", e);
                    Vec::new()
                });
                self.search_channels = channels.unwrap_or_else(|e| {
                    warn!("Channel search failed: {}", e);
                    Vec::new()
                });
            }
            AppEvent::UserChannels { user_id, result } => {
                if self.session.selected_user.as_ref().map(|u| u.id) != Some(user_id) {
                    warn!(
                        "Discarding stale channel listing for user {} (selection moved on)",
                        user_id
                    );
                    return;
                }
                self.loading_channels = false;
                self.user_channels = result.unwrap_or_else(|e| {
                    warn!("Channel listing for user {} failed: {}", user_id, e);
                    Vec::new()
                });
            }
            AppEvent::ContentsPage { request, result } => {
                let applied = self.pagination.apply(request, result);
                if applied {
                    if !request.append {
                        self.loading_contents = false;
                    }
                    if self.slideshow.is_playing() {
                        let filtered = filter_unique_images(self.pagination.raw());
                        self.slideshow.absorb_growth(&filtered, &mut rand::rng());
                    }
                }
            }
            AppEvent::ImageLoaded { url, result } => match result {
                Ok(image) => self.textures.insert(&self.egui_ctx, &url, image),
                Err(e) => {
                    warn!("Image fetch for '{}' failed: {}", url, e);
                    self.textures.mark_failed(&url);
                }
            },
        }
    }

    // --- UI actions ---

    fn apply_action(&mut self, action: UiAction) {
        match action {
            UiAction::ExchangeCode(code) => {
                info!("Starting authorization code exchange");
                self.session.pending_code = Some(code.clone());
                self.persist();
                self.exchanging = true;
                self.auth_error = None;
                self.spawn_token_exchange(code);
            }
            UiAction::SelectUser(user) => self.select_user(&user),
            UiAction::SelectChannel {
                channel,
                from_search,
            } => self.select_channel(&channel, from_search),
            UiAction::ResetAll => {
                info!("Resetting user and channel selection");
                self.session.selected_user = None;
                self.session.selected_channel = None;
                self.persist();
                self.slideshow.stop();
                self.user_channels.clear();
                self.loading_channels = false;
                self.pagination.clear();
                self.loading_contents = false;
                self.textures.clear();
                self.search_input.clear();
                self.search_users.clear();
                self.search_channels.clear();
                self.searching = false;
                self.search_edited = None;
            }
            UiAction::ClearChannelSelection => {
                info!("Clearing channel selection");
                self.session.selected_channel = None;
                self.persist();
                self.slideshow.stop();
                self.pagination.clear();
                self.loading_contents = false;
                self.textures.clear();
                self.search_input.clear();
            }
            UiAction::StartPlayback => {
                let filtered = filter_unique_images(self.pagination.raw());
                if self
                    .slideshow
                    .start(&filtered, &mut rand::rng(), Instant::now())
                {
                    info!("Starting slideshow with {} images", filtered.len());
                } else {
                    warn!("Refusing to start slideshow: no image blocks loaded");
                }
            }
            UiAction::StopPlayback => self.slideshow.stop(),
            UiAction::CycleDuration => {
                let current = self.slideshow.visible_duration().as_millis() as u64;
                let position = VISIBLE_DURATION_CHOICES_MS
                    .iter()
                    .position(|&ms| ms == current)
                    .unwrap_or(1);
                let next =
                    VISIBLE_DURATION_CHOICES_MS[(position + 1) % VISIBLE_DURATION_CHOICES_MS.len()];
                info!("Visible duration set to {} ms", next);
                self.slideshow
                    .set_visible_duration(Duration::from_millis(next));
            }
            UiAction::Logout => {
                info!("Logging out");
                self.session.clear_auth();
                self.persist();
                self.slideshow.stop();
                self.user_channels.clear();
                self.loading_channels = false;
                self.pagination.clear();
                self.loading_contents = false;
                self.textures.clear();
                self.search_input.clear();
                self.search_users.clear();
                self.search_channels.clear();
                self.searching = false;
                self.search_edited = None;
                self.code_input.clear();
            }
        }
    }

    /// Selecting a user clears any previously selected channel and its
    /// loaded contents, then fetches the user's channels.
    fn select_user(&mut self, user: &ArenaUser) {
        let selected = SelectedUser::from(user);
        info!("Selected user: {} ({})", selected.full_name, selected.id);
        self.session.selected_user = Some(selected);
        self.session.selected_channel = None;
        self.persist();
        self.slideshow.stop();
        self.pagination.clear();
        self.textures.clear();
        self.user_channels.clear();
        self.search_input.clear();
        self.search_users.clear();
        self.search_channels.clear();
        self.searching = false;
        self.search_edited = None;
        self.loading_contents = false;
        self.loading_channels = true;
        self.spawn_user_channels(user.id);
    }

    /// Selecting a channel is valid with or without a selected user; a
    /// channel reached through free-text search drops the persisted user.
    fn select_channel(&mut self, channel: &ArenaChannel, from_search: bool) {
        let selected = SelectedChannel::from(channel);
        info!("Selected channel: {} ({})", selected.title, selected.id);
        self.session.selected_channel = Some(selected);
        if from_search {
            self.session.selected_user = None;
            self.user_channels.clear();
        }
        self.persist();
        self.slideshow.stop();
        self.textures.clear();
        self.search_input.clear();
        self.search_users.clear();
        self.search_channels.clear();
        self.searching = false;
        self.search_edited = None;
        self.loading_contents = true;
        let request = self.pagination.begin(channel.id);
        self.spawn_contents(request);
    }

    fn handle_search_debounce(&mut self, ctx: &egui::Context) {
        // Typing filters a selected user's channel list locally instead.
        if self.session.selected_user.is_some() {
            self.search_edited = None;
            return;
        }
        let Some(edited) = self.search_edited else {
            return;
        };
        if self.search_input.trim().is_empty() {
            self.search_edited = None;
            self.search_users.clear();
            self.search_channels.clear();
            self.searching = false;
            return;
        }
        let elapsed = edited.elapsed();
        if elapsed >= SEARCH_DEBOUNCE {
            self.search_edited = None;
            self.searching = true;
            self.spawn_search(self.search_input.trim().to_string());
        } else {
            ctx.request_repaint_after(SEARCH_DEBOUNCE - elapsed);
        }
    }

    /// Prefetches the textures playback is about to need: the current and
    /// upcoming slides.
    fn prefetch_slideshow_images(&mut self) {
        let mut wanted = Vec::new();
        for block in [
            self.slideshow.current_block(),
            self.slideshow.next_block(),
        ]
        .into_iter()
        .flatten()
        {
            if let Some(url) = block.image.as_ref().and_then(|i| i.slide_url()) {
                wanted.push(url.to_string());
            }
        }
        for url in wanted {
            if self.textures.needs_fetch(&url) {
                self.spawn_image_fetch(url);
            }
        }
    }

    // --- Panels ---

    fn ui_authorize(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.25);
            ui.heading("Arena Frame");
            ui.add_space(12.0);
            if self.exchanging {
                ui.spinner();
                ui.label("Exchanging authorization code...");
                return;
            }
            ui.label("Authorize this app with your Are.na account, then paste the code below.");
            ui.add_space(4.0);
            ui.hyperlink_to("Open the Are.na authorization page", &self.authorize_url);
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                ui.add_space(ui.available_width() / 2.0 - 180.0);
                ui.add(
                    egui::TextEdit::singleline(&mut self.code_input)
                        .hint_text("Authorization code")
                        .desired_width(260.0),
                );
                let ready = !self.code_input.trim().is_empty();
                if ui.add_enabled(ready, egui::Button::new("Connect")).clicked() {
                    actions.push(UiAction::ExchangeCode(self.code_input.trim().to_string()));
                    self.code_input.clear();
                }
            });
            if let Some(err) = &self.auth_error {
                ui.add_space(8.0);
                ui.colored_label(Color32::RED, err);
            }
        });
    }

    fn ui_controls(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            if ui.button("Are.na").clicked() {
                actions.push(UiAction::ResetAll);
            }
            ui.label(RichText::new("/").weak());

            if let Some(user) = self.session.selected_user.clone() {
                if ui.button(&user.full_name).clicked() {
                    actions.push(UiAction::ClearChannelSelection);
                }
                ui.label(RichText::new("/").weak());
            }

            if let Some(channel) = self.session.selected_channel.clone() {
                ui.label(RichText::new(&channel.title).strong());
                ui.label(RichText::new("/").weak());
                if self.loading_contents {
                    ui.label(RichText::new("Loading blocks...").weak());
                } else {
                    let count = self.pagination.raw().len();
                    let noun = if count == 1 { "block" } else { "blocks" };
                    ui.label(RichText::new(format!("{} {}", count, noun)).weak());
                }

                let ready = !self.pagination.raw().is_empty() && !self.slideshow.is_playing();
                if ui.add_enabled(ready, egui::Button::new("Play")).clicked() {
                    actions.push(UiAction::StartPlayback);
                }
                let secs = self.slideshow.visible_duration().as_millis() as f32 / 1000.0;
                let label = if secs.fract() == 0.0 {
                    format!("{}s", secs as u64)
                } else {
                    format!("{:.1}s", secs)
                };
                if ui.add_enabled(ready, egui::Button::new(label)).clicked() {
                    actions.push(UiAction::CycleDuration);
                }
            } else {
                let hint = if self.session.selected_user.is_some() {
                    "Filter channels"
                } else {
                    "Search for a user or channel"
                };
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.search_input)
                        .hint_text(hint)
                        .desired_width(320.0),
                );
                if response.changed() {
                    self.search_edited = Some(Instant::now());
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Logout").clicked() {
                    actions.push(UiAction::Logout);
                }
            });
        });

        if self.session.selected_channel.is_none() {
            self.ui_results_dropdown(ui, actions);
        }
    }

    fn ui_results_dropdown(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        if self.session.selected_user.is_some() {
            self.ui_user_channels_list(ui, actions);
            return;
        }
        if self.searching {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new("Loading...").weak());
            });
            return;
        }
        if self.search_input.trim().is_empty() {
            return;
        }
        if self.search_users.is_empty() && self.search_channels.is_empty() {
            ui.label(RichText::new("No users or channels found").weak());
            return;
        }

        ui.columns(2, |columns| {
            columns[0].label(RichText::new("Users").small().weak());
            ScrollArea::vertical()
                .id_source("user_results")
                .max_height(320.0)
                .show(&mut columns[0], |ui| {
                    for user in &self.search_users {
                        let text = format!(
                            "{}  ({} channels)",
                            user.display_name(),
                            user.channel_count
                        );
                        if ui.button(text).clicked() {
                            actions.push(UiAction::SelectUser(user.clone()));
                        }
                    }
                    if self.search_users.is_empty() {
                        ui.label(RichText::new("No users found").weak());
                    }
                });

            columns[1].label(RichText::new("Channels").small().weak());
            ScrollArea::vertical()
                .id_source("channel_results")
                .max_height(320.0)
                .show(&mut columns[1], |ui| {
                    for channel in &self.search_channels {
                        if ui.button(channel_label(channel)).clicked() {
                            actions.push(UiAction::SelectChannel {
                                channel: channel.clone(),
                                from_search: true,
                            });
                        }
                    }
                    if self.search_channels.is_empty() {
                        ui.label(RichText::new("No channels found").weak());
                    }
                });
        });
    }

    fn ui_user_channels_list(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        if self.loading_channels {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new("Loading channels...").weak());
            });
            return;
        }
        if self.user_channels.is_empty() {
            ui.label(RichText::new("This user has no public channels").weak());
            return;
        }
        let filter = self.search_input.trim().to_lowercase();
        let visible: Vec<&ArenaChannel> = self
            .user_channels
            .iter()
            .filter(|ch| {
                filter.is_empty()
                    || ch.title.to_lowercase().contains(&filter)
                    || ch.slug.to_lowercase().contains(&filter)
            })
            .collect();
        if visible.is_empty() {
            ui.label(RichText::new("No channels match").weak());
            return;
        }
        ScrollArea::vertical()
            .id_source("user_channels")
            .max_height(320.0)
            .show(ui, |ui| {
                for channel in visible {
                    if ui.button(channel_label(channel)).clicked() {
                        actions.push(UiAction::SelectChannel {
                            channel: channel.clone(),
                            from_search: false,
                        });
                    }
                }
            });
    }

    fn ui_grid(&mut self, ui: &mut egui::Ui) {
        let filtered = filter_unique_images(self.pagination.raw());
        if filtered.is_empty() {
            if !self.loading_contents {
                ui.centered_and_justified(|ui| {
                    ui.label("No image blocks in this channel.");
                });
            }
            return;
        }
        let mut to_fetch = Vec::new();
        ScrollArea::vertical().show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for block in &filtered {
                    let Some(url) = block.image.as_ref().and_then(|i| i.grid_url()) else {
                        continue;
                    };
                    if let Some(texture) = self.textures.get(url) {
                        ui.add(
                            egui::Image::new(texture)
                                .fit_to_exact_size(egui::vec2(GRID_TILE_SIZE, GRID_TILE_SIZE)),
                        )
                        .on_hover_text(block.caption());
                    } else {
                        to_fetch.push(url.to_string());
                        let (rect, _) = ui.allocate_exact_size(
                            egui::vec2(GRID_TILE_SIZE, GRID_TILE_SIZE),
                            Sense::hover(),
                        );
                        ui.painter().rect_filled(rect, 4.0, Color32::from_gray(30));
                    }
                }
            });
        });
        for url in to_fetch {
            if self.textures.needs_fetch(&url) {
                self.spawn_image_fetch(url);
            }
        }
    }

    fn ui_playback(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, Sense::click());
        // A click anywhere on the slideshow surface dismisses it.
        if response.clicked() {
            actions.push(UiAction::StopPlayback);
        }

        let now = Instant::now();
        if let Some(block) = self.slideshow.previous_block() {
            let alpha = self.slideshow.previous_alpha(now);
            draw_slide(ui, &self.textures, block, rect, alpha);
        }
        let mut drew_current = false;
        if let Some(block) = self.slideshow.current_block() {
            let alpha = self.slideshow.current_alpha(now);
            drew_current = draw_slide(ui, &self.textures, block, rect, alpha);
        }
        if !drew_current {
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Loading image...",
                FontId::proportional(16.0),
                Color32::from_gray(140),
            );
        }
    }
}

/// Paints one slide aspect-fitted into `rect` with the given opacity.
/// Returns false when the texture is not cached yet.
fn draw_slide(
    ui: &egui::Ui,
    textures: &TextureStore,
    block: &Block,
    rect: Rect,
    alpha: f32,
) -> bool {
    let Some(url) = block.image.as_ref().and_then(|i| i.slide_url()) else {
        return false;
    };
    let Some(texture) = textures.get(url) else {
        return false;
    };
    let size = texture.size_vec2();
    let draw_rect = calculate_draw_rect(size.x, size.y, rect);
    let tint = Color32::from_white_alpha((alpha.clamp(0.0, 1.0) * 255.0) as u8);
    let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    ui.painter().image(texture.id(), draw_rect, uv, tint);
    true
}

fn channel_label(channel: &ArenaChannel) -> String {
    let mut label = channel.title.clone();
    if let Some(length) = channel.length {
        label.push_str(&format!("  ·  {} blocks", length));
    }
    if let Some(followers) = channel.follower_count.filter(|&f| f > 0) {
        label.push_str(&format!("  ·  {} followers", followers));
    }
    label
}

fn calculate_draw_rect(media_width: f32, media_height: f32, available_rect: Rect) -> Rect {
    let aspect_ratio = media_width / media_height;
    let mut draw_width = available_rect.width();
    let mut draw_height = available_rect.width() / aspect_ratio;
    if draw_height > available_rect.height() {
        draw_height = available_rect.height();
        draw_width = available_rect.height() * aspect_ratio;
    }
    Rect::from_center_size(available_rect.center(), egui::vec2(draw_width, draw_height))
}

impl eframe::App for ArenaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
        }

        if let Some(err) = &self.config_error {
            let err = err.clone();
            CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.colored_label(Color32::RED, format!("Error: {}", err));
                });
            });
            return;
        }

        self.handle_search_debounce(ctx);

        let mut actions = Vec::new();

        if self.slideshow.is_playing() {
            if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
                actions.push(UiAction::StopPlayback);
            }
            if let Some(SlideshowCommand::LoadNextPage) = self.slideshow.tick(Instant::now()) {
                if let Some(request) = self.pagination.next_request() {
                    self.spawn_contents(request);
                }
            }
            self.prefetch_slideshow_images();
            // Keep the crossfade smooth.
            ctx.request_repaint_after(Duration::from_millis(1000 / 30));
        }

        if self.session.access_token.is_none() {
            CentralPanel::default().show(ctx, |ui| {
                self.ui_authorize(ui, &mut actions);
            });
        } else if self.slideshow.is_playing() {
            CentralPanel::default()
                .frame(egui::Frame::none().fill(Color32::BLACK))
                .show(ctx, |ui| {
                    self.ui_playback(ui, &mut actions);
                });
        } else {
            TopBottomPanel::top("controls").show(ctx, |ui| {
                ui.add_space(6.0);
                self.ui_controls(ui, &mut actions);
                ui.add_space(6.0);
            });
            CentralPanel::default().show(ctx, |ui| {
                if self.session.selected_channel.is_some() {
                    if self.loading_contents && self.pagination.raw().is_empty() {
                        ui.centered_and_justified(|ui| {
                            ui.spinner();
                        });
                    } else {
                        self.ui_grid(ui);
                    }
                }
            });
        }

        for action in actions {
            self.apply_action(action);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    info!("Starting arena-frame...");
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Arena Frame",
        options,
        Box::new(|cc| Box::new(ArenaApp::new(cc))),
    )
}
