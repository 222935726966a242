//! Image fetching, decoding, and texture caching.
//!
//! Block images are downloaded with the shared `reqwest` client, decoded via
//! the `image` crate, and uploaded to the GPU as egui textures keyed by URL.
//! [`TextureStore`] tracks what is cached, what is being fetched, and what
//! failed, so the same URL is never requested twice in one session.

use egui::{ColorImage, TextureHandle, TextureOptions};
use log::{debug, error, trace};
use reqwest::Client;
use std::collections::{HashMap, HashSet};

use super::errors::MediaError;

/// Downloads and decodes one block image into an egui color image.
#[must_use = "fetching an image can fail; the Result must be handled"]
pub async fn fetch_image(client: &Client, url: &str) -> Result<ColorImage, MediaError> {
    debug!("Fetching image: {}", url);
    let response = client.get(url).send().await.map_err(|e| {
        error!("Request error fetching image '{}': {:?}", url, e);
        MediaError::Download(e)
    })?;
    let response = response.error_for_status().map_err(|e| {
        error!("HTTP error fetching image '{}': {}", url, e);
        MediaError::Download(e)
    })?;
    let bytes = response.bytes().await.map_err(|e| {
        error!("Error reading image bytes for '{}': {:?}", url, e);
        MediaError::Download(e)
    })?;

    trace!("Decoding image: {}", url);
    let decoded = image::load_from_memory(&bytes).map_err(|e| {
        error!("Error decoding image '{}': {:?}", url, e);
        MediaError::Decode(e)
    })?;
    let size = [decoded.width() as usize, decoded.height() as usize];
    let rgba = decoded.to_rgba8();
    let pixels = rgba.as_flat_samples();
    Ok(ColorImage::from_rgba_unmultiplied(size, pixels.as_slice()))
}

/// GPU texture cache keyed by image URL.
#[derive(Default)]
pub struct TextureStore {
    textures: HashMap<String, TextureHandle>,
    pending: HashSet<String>,
    failed: HashSet<String>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&TextureHandle> {
        self.textures.get(url)
    }

    /// Returns true exactly once per URL: the caller should spawn a fetch
    /// and later resolve it via [`TextureStore::insert`] or
    /// [`TextureStore::mark_failed`].
    pub fn needs_fetch(&mut self, url: &str) -> bool {
        if self.textures.contains_key(url)
            || self.pending.contains(url)
            || self.failed.contains(url)
        {
            return false;
        }
        self.pending.insert(url.to_string());
        true
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.pending.contains(url)
    }

    pub fn insert(&mut self, ctx: &egui::Context, url: &str, image: ColorImage) {
        self.pending.remove(url);
        let texture = ctx.load_texture(url, image, TextureOptions::LINEAR);
        debug!("Cached texture for {}", url);
        self.textures.insert(url.to_string(), texture);
    }

    pub fn mark_failed(&mut self, url: &str) {
        self.pending.remove(url);
        self.failed.insert(url.to_string());
    }

    /// Drops everything; used when the channel selection changes so one
    /// channel's textures do not accumulate under another.
    pub fn clear(&mut self) {
        if !self.textures.is_empty() || !self.pending.is_empty() {
            debug!(
                "Clearing texture store ({} cached, {} pending)",
                self.textures.len(),
                self.pending.len()
            );
        }
        self.textures.clear();
        self.pending.clear();
        self.failed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_fetch_is_one_shot_per_url() {
        let mut store = TextureStore::new();
        assert!(store.needs_fetch("http://x/a.jpg"));
        assert!(!store.needs_fetch("http://x/a.jpg"));
        assert!(store.is_pending("http://x/a.jpg"));
        assert!(store.needs_fetch("http://x/b.jpg"));
    }

    #[test]
    fn test_failed_urls_are_not_retried() {
        let mut store = TextureStore::new();
        assert!(store.needs_fetch("http://x/a.jpg"));
        store.mark_failed("http://x/a.jpg");
        assert!(!store.is_pending("http://x/a.jpg"));
        assert!(!store.needs_fetch("http://x/a.jpg"));
    }

    #[test]
    fn test_clear_allows_refetch() {
        let mut store = TextureStore::new();
        assert!(store.needs_fetch("http://x/a.jpg"));
        store.mark_failed("http://x/a.jpg");
        store.clear();
        assert!(store.needs_fetch("http://x/a.jpg"));
    }
}
