//! On-demand page fetching for a channel's contents.
//!
//! [`PaginationController`] owns the raw block collection and the page
//! cursor for the currently selected channel. It never performs I/O itself:
//! the app asks it for a [`PageRequest`], runs the fetch, and feeds the
//! tagged outcome back through [`PaginationController::apply`]. The tag is
//! the request itself, which lets a result that arrives after the selection
//! has moved on be discarded instead of bleeding another channel's blocks
//! into the view.
//!
//! A single in-flight request is tracked per controller; while one is
//! outstanding no append request is issued, so rapid playback advances
//! cannot stack up duplicate fetches.

use log::{debug, info, warn};

use super::errors::ApiError;
use super::model::Block;

/// Page size used for channel content views.
pub const CONTENTS_PAGE_SIZE: usize = 52;

/// A single page fetch the controller has asked for. Doubles as the tag used
/// to match results back to the state that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub channel_id: u64,
    /// 1-based page number.
    pub page: u32,
    pub per: usize,
    /// false replaces the raw collection, true concatenates.
    pub append: bool,
}

/// Fetches channel content pages on demand, appends results, and tracks
/// exhaustion.
///
/// Exhaustion strictly compares the raw returned count against the requested
/// page size, independent of how many items survive image filtering; a page
/// full of non-image blocks still counts as non-exhausted.
#[derive(Debug)]
pub struct PaginationController {
    channel_id: Option<u64>,
    /// Last successfully loaded page (1-based); 0 before any page landed.
    page: u32,
    per: usize,
    exhausted: bool,
    in_flight: Option<PageRequest>,
    raw: Vec<Block>,
}

impl PaginationController {
    pub fn new(per: usize) -> Self {
        Self {
            channel_id: None,
            page: 0,
            per,
            exhausted: false,
            in_flight: None,
            raw: Vec::new(),
        }
    }

    /// Starts loading a channel from scratch: resets the cursor to page 1
    /// and returns the replace-mode request for it. Any fetch still in
    /// flight for the previous channel is forgotten; its result will no
    /// longer match and gets discarded on arrival.
    pub fn begin(&mut self, channel_id: u64) -> PageRequest {
        info!("Beginning contents load for channel {}", channel_id);
        let request = PageRequest {
            channel_id,
            page: 1,
            per: self.per,
            append: false,
        };
        self.channel_id = Some(channel_id);
        self.page = 0;
        self.exhausted = false;
        self.in_flight = Some(request);
        request
    }

    /// Returns the next append-mode request, or `None` when there is no
    /// channel, the channel is exhausted, or a fetch is already in flight.
    pub fn next_request(&mut self) -> Option<PageRequest> {
        let channel_id = self.channel_id?;
        if self.exhausted || self.in_flight.is_some() {
            return None;
        }
        let request = PageRequest {
            channel_id,
            page: self.page + 1,
            per: self.per,
            append: true,
        };
        debug!(
            "Requesting page {} for channel {} (append)",
            request.page, channel_id
        );
        self.in_flight = Some(request);
        Some(request)
    }

    /// Applies a fetch outcome. Returns `true` when the result belonged to
    /// the current cursor and was absorbed; stale results (the selection
    /// changed while the fetch was out) are discarded untouched.
    pub fn apply(&mut self, request: PageRequest, result: Result<Vec<Block>, ApiError>) -> bool {
        if self.in_flight != Some(request) {
            warn!(
                "Discarding stale contents result for channel {} page {} (current channel: {:?})",
                request.channel_id, request.page, self.channel_id
            );
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(blocks) => {
                // Exhaustion is judged on the raw count, before any filtering.
                self.exhausted = blocks.len() < request.per;
                self.page = request.page;
                info!(
                    "Channel {} page {} delivered {} raw blocks (exhausted: {})",
                    request.channel_id,
                    request.page,
                    blocks.len(),
                    self.exhausted
                );
                if request.append {
                    self.raw.extend(blocks);
                } else {
                    self.raw = blocks;
                }
            }
            Err(e) => {
                if request.append {
                    // Partial failure is non-fatal: keep what is already
                    // displayed and stop asking for more.
                    warn!(
                        "Append fetch for channel {} page {} failed, freezing pagination: {}",
                        request.channel_id, request.page, e
                    );
                    self.exhausted = true;
                } else {
                    warn!(
                        "Initial contents fetch for channel {} failed, clearing view: {}",
                        request.channel_id, e
                    );
                    self.raw.clear();
                    self.exhausted = true;
                }
            }
        }
        true
    }

    /// Forgets the channel and all loaded blocks (channel deselected).
    pub fn clear(&mut self) {
        self.channel_id = None;
        self.page = 0;
        self.exhausted = false;
        self.in_flight = None;
        self.raw.clear();
    }

    pub fn channel_id(&self) -> Option<u64> {
        self.channel_id
    }

    pub fn raw(&self) -> &[Block] {
        &self.raw
    }

    pub fn exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: u64, with_image: bool) -> Block {
        let json = if with_image {
            format!(r#"{{"id": {}, "image": {{"thumb": {{"url": "http://x/{}.jpg"}}}}}}"#, id, id)
        } else {
            format!(r#"{{"id": {}}}"#, id)
        };
        serde_json::from_str(&json).unwrap()
    }

    fn blocks(ids: &[u64]) -> Vec<Block> {
        ids.iter().map(|&id| block(id, true)).collect()
    }

    #[test]
    fn test_full_page_is_not_exhausted() {
        let mut controller = PaginationController::new(5);
        let request = controller.begin(1);
        assert!(controller.apply(request, Ok(blocks(&[1, 2, 3, 4, 5]))));
        assert!(!controller.exhausted());
        assert_eq!(controller.raw().len(), 5);
    }

    #[test]
    fn test_short_page_is_exhausted() {
        let mut controller = PaginationController::new(5);
        let request = controller.begin(1);
        controller.apply(request, Ok(blocks(&[1, 2])));
        assert!(controller.exhausted());
        assert!(controller.next_request().is_none());
    }

    #[test]
    fn test_exhaustion_ignores_image_filtering() {
        // A page full of non-image blocks still counts as non-exhausted.
        let mut controller = PaginationController::new(3);
        let request = controller.begin(1);
        let page: Vec<Block> = (1..=3).map(|id| block(id, false)).collect();
        controller.apply(request, Ok(page));
        assert!(!controller.exhausted());
    }

    #[test]
    fn test_append_concatenates_and_advances_page() {
        let mut controller = PaginationController::new(5);
        let first = controller.begin(9);
        controller.apply(first, Ok(blocks(&[1, 2, 3, 4, 5])));

        let second = controller.next_request().unwrap();
        assert_eq!(second.page, 2);
        assert!(second.append);
        controller.apply(second, Ok(blocks(&[6, 7])));
        assert!(controller.exhausted());
        let ids: Vec<u64> = controller.raw().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_in_flight_suppresses_duplicate_appends() {
        let mut controller = PaginationController::new(5);
        let first = controller.begin(9);
        controller.apply(first, Ok(blocks(&[1, 2, 3, 4, 5])));

        let second = controller.next_request().unwrap();
        // Rapid playback advances must not stack another fetch.
        assert!(controller.next_request().is_none());
        controller.apply(second, Ok(blocks(&[6, 7, 8, 9, 10])));
        assert!(controller.next_request().is_some());
    }

    #[test]
    fn test_stale_result_from_previous_channel_is_discarded() {
        let mut controller = PaginationController::new(5);
        let for_first = controller.begin(1);
        // Selection moves on before the first channel's fetch resolves.
        let for_second = controller.begin(2);
        assert!(!controller.apply(for_first, Ok(blocks(&[100, 101, 102, 103, 104]))));
        assert!(controller.raw().is_empty());
        // The live request still lands normally.
        assert!(controller.apply(for_second, Ok(blocks(&[1, 2]))));
        let ids: Vec<u64> = controller.raw().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_replace_failure_clears_collection() {
        let mut controller = PaginationController::new(5);
        let first = controller.begin(9);
        controller.apply(first, Ok(blocks(&[1, 2, 3, 4, 5])));

        let reload = controller.begin(9);
        controller.apply(
            reload,
            Err(ApiError::MissingParam("q")),
        );
        assert!(controller.raw().is_empty());
        assert!(controller.next_request().is_none());
    }

    #[test]
    fn test_append_failure_keeps_items_and_freezes() {
        let mut controller = PaginationController::new(5);
        let first = controller.begin(9);
        controller.apply(first, Ok(blocks(&[1, 2, 3, 4, 5])));

        let second = controller.next_request().unwrap();
        controller.apply(second, Err(ApiError::MissingParam("q")));
        assert_eq!(controller.raw().len(), 5);
        assert!(controller.exhausted());
        assert!(controller.next_request().is_none());
    }

    #[test]
    fn test_two_page_scenario_with_mixed_image_blocks() {
        // Page 1: 5 raw blocks, 3 with images. Page 2: 2 raw blocks, 1 with
        // an image. Exhaustion tracks raw counts only.
        let mut controller = PaginationController::new(5);
        let first = controller.begin(1);
        let page1 = vec![
            block(1, true),
            block(2, false),
            block(3, true),
            block(4, false),
            block(5, true),
        ];
        controller.apply(first, Ok(page1));
        assert!(!controller.exhausted());

        let second = controller.next_request().unwrap();
        controller.apply(second, Ok(vec![block(6, false), block(7, true)]));
        assert!(controller.exhausted());

        let filtered = crate::playlist::filter_unique_images(controller.raw());
        let ids: Vec<u64> = filtered.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut controller = PaginationController::new(5);
        let request = controller.begin(1);
        controller.apply(request, Ok(blocks(&[1, 2, 3, 4, 5])));
        controller.clear();
        assert!(controller.raw().is_empty());
        assert_eq!(controller.channel_id(), None);
        assert!(controller.next_request().is_none());
    }
}
