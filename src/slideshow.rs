//! The auto-advancing playback engine.
//!
//! [`Slideshow`] is a two-state machine (`Stopped`/`Playing`) driven by
//! deadline checks: the app calls [`Slideshow::tick`] with the current
//! instant each frame, and the engine walks through its phases when their
//! deadlines pass. There are no detached timers to cancel; [`Slideshow::stop`]
//! clears the deadline, after which `tick` is a no-op no matter how far the
//! clock advances.
//!
//! Each cycle holds the current image for the visible duration, then
//! advances the cursor and crossfades over [`FADE_DURATION`]: the previous
//! index renders the outgoing frame fading out while the new current image
//! fades in, giving a total cycle period of `visible + fade`. At the moment
//! the cursor advances past `length - 2` the engine emits
//! [`SlideshowCommand::LoadNextPage`]; fetching never blocks the advance,
//! playback simply wraps over the loaded list while the page arrives.

use log::{debug, info, warn};
use rand::Rng;
use std::time::{Duration, Instant};

use super::model::Block;
use super::playlist::PlaybackList;

/// Fixed crossfade duration for both the outgoing and incoming image.
pub const FADE_DURATION: Duration = Duration::from_millis(1500);

/// Default hold duration; the UI can select others.
pub const DEFAULT_VISIBLE_DURATION: Duration = Duration::from_millis(5000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Current image fully visible.
    Visible,
    /// Previous image fading out while the freshly advanced current image
    /// fades in.
    Fading,
}

/// Side effect requested by an advance; the caller decides whether the
/// pagination controller can actually honor it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlideshowCommand {
    LoadNextPage,
}

/// Slideshow playback state. See the module docs for the cycle shape.
#[derive(Debug)]
pub struct Slideshow {
    playing: bool,
    list: PlaybackList,
    current: usize,
    /// Index shown immediately before the current one; renders the outgoing
    /// crossfade frame.
    previous: Option<usize>,
    phase: Phase,
    deadline: Option<Instant>,
    visible_duration: Duration,
}

impl Default for Slideshow {
    fn default() -> Self {
        Self::new()
    }
}

impl Slideshow {
    pub fn new() -> Self {
        Self {
            playing: false,
            list: PlaybackList::default(),
            current: 0,
            previous: None,
            phase: Phase::Visible,
            deadline: None,
            visible_duration: DEFAULT_VISIBLE_DURATION,
        }
    }

    /// Enters `Playing` with a freshly shuffled copy of the filtered list.
    /// Refuses an empty list and never arms a deadline for one.
    pub fn start(&mut self, filtered: &[Block], rng: &mut impl Rng, now: Instant) -> bool {
        if filtered.is_empty() {
            warn!("Refusing to start playback with no images");
            return false;
        }
        self.list = PlaybackList::shuffled_from(filtered, rng);
        self.current = 0;
        self.previous = None;
        self.phase = Phase::Visible;
        self.deadline = Some(now + self.visible_duration);
        self.playing = true;
        info!(
            "Playback started with {} images (visible {:?}, fade {:?})",
            self.list.len(),
            self.visible_duration,
            FADE_DURATION
        );
        true
    }

    /// Leaves `Playing` and cancels the pending advance deadline, so a later
    /// `tick` observes nothing to do.
    pub fn stop(&mut self) {
        if self.playing {
            info!("Playback stopped at index {}", self.current);
        }
        self.playing = false;
        self.deadline = None;
        self.current = 0;
        self.previous = None;
        self.phase = Phase::Visible;
        self.list = PlaybackList::default();
    }

    /// Folds filtered-list growth into the playing order; new unique items
    /// are appended in a shuffled sub-batch, the playing prefix is untouched.
    pub fn absorb_growth(&mut self, filtered: &[Block], rng: &mut impl Rng) {
        if !self.playing || filtered.len() <= self.list.absorbed() {
            return;
        }
        debug!(
            "Absorbing {} new images into playback order",
            filtered.len() - self.list.absorbed()
        );
        self.list.absorb(filtered, rng);
    }

    /// Walks the phase machine through any deadlines that have passed.
    /// Returns a look-ahead command when the cursor advanced near the end of
    /// the loaded list.
    pub fn tick(&mut self, now: Instant) -> Option<SlideshowCommand> {
        if !self.playing || self.list.is_empty() {
            return None;
        }
        let mut command = None;
        while let Some(deadline) = self.deadline {
            if now < deadline {
                break;
            }
            match self.phase {
                Phase::Visible => {
                    let len = self.list.len();
                    let next = self.current + 1;
                    if next >= len.saturating_sub(2) {
                        command = Some(SlideshowCommand::LoadNextPage);
                    }
                    self.previous = Some(self.current);
                    self.current = next % len;
                    debug!("Advanced playback cursor to {} of {}", self.current, len);
                    self.phase = Phase::Fading;
                    self.deadline = Some(deadline + FADE_DURATION);
                }
                Phase::Fading => {
                    self.phase = Phase::Visible;
                    self.deadline = Some(deadline + self.visible_duration);
                }
            }
        }
        command
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_visible_duration(&mut self, duration: Duration) {
        self.visible_duration = duration;
    }

    pub fn visible_duration(&self) -> Duration {
        self.visible_duration
    }

    /// Next instant at which `tick` will do work, for repaint scheduling.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.playing {
            self.deadline
        } else {
            None
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn image_count(&self) -> usize {
        self.list.len()
    }

    pub fn current_block(&self) -> Option<&Block> {
        self.list.get(self.current)
    }

    /// The slide that will be shown after the current one, for prefetching.
    pub fn next_block(&self) -> Option<&Block> {
        let len = self.list.len();
        if len == 0 {
            return None;
        }
        self.list.get((self.current + 1) % len)
    }

    /// The outgoing crossfade frame. Only present mid-fade, and never when
    /// the list wraps a single image onto itself.
    pub fn previous_block(&self) -> Option<&Block> {
        if self.phase != Phase::Fading {
            return None;
        }
        let previous = self.previous?;
        if previous == self.current {
            return None;
        }
        self.list.get(previous)
    }

    fn remaining_fraction(&self, now: Instant) -> f32 {
        match self.deadline {
            Some(deadline) => (deadline.saturating_duration_since(now).as_secs_f32()
                / FADE_DURATION.as_secs_f32())
            .clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    /// Opacity of the current image at `now`; it fades in over the crossfade
    /// window unless it is the only image redisplaying itself.
    pub fn current_alpha(&self, now: Instant) -> f32 {
        match self.phase {
            Phase::Visible => 1.0,
            Phase::Fading if self.list.len() < 2 => 1.0,
            Phase::Fading => 1.0 - self.remaining_fraction(now),
        }
    }

    /// Opacity of the outgoing image at `now`.
    pub fn previous_alpha(&self, now: Instant) -> f32 {
        if self.previous_block().is_none() {
            return 0.0;
        }
        self.remaining_fraction(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn image_block(id: u64) -> Block {
        serde_json::from_str(&format!(
            r#"{{"id": {}, "image": {{"large": {{"url": "http://x/{}.jpg"}}}}}}"#,
            id, id
        ))
        .unwrap()
    }

    fn images(count: u64) -> Vec<Block> {
        (1..=count).map(image_block).collect()
    }

    fn cycle(show: &Slideshow) -> Duration {
        show.visible_duration() + FADE_DURATION
    }

    #[test]
    fn test_empty_list_never_starts_or_arms() {
        let mut show = Slideshow::new();
        let mut rng = StdRng::seed_from_u64(1);
        let t0 = Instant::now();
        assert!(!show.start(&[], &mut rng, t0));
        assert!(!show.is_playing());
        assert!(show.next_deadline().is_none());
        assert_eq!(show.tick(t0 + Duration::from_secs(60)), None);
    }

    #[test]
    fn test_start_shuffles_a_permutation() {
        let mut show = Slideshow::new();
        let mut rng = StdRng::seed_from_u64(2);
        assert!(show.start(&images(3), &mut rng, Instant::now()));
        assert_eq!(show.image_count(), 3);
        let mut ids: Vec<u64> = (0..3)
            .map(|_| {
                let id = show.current_block().unwrap().id;
                show.tick(show.next_deadline().unwrap() + FADE_DURATION);
                id
            })
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_cursor_is_k_mod_len_after_k_advances() {
        let mut show = Slideshow::new();
        let mut rng = StdRng::seed_from_u64(3);
        let t0 = Instant::now();
        show.start(&images(4), &mut rng, t0);
        for k in 1..=9u32 {
            show.tick(t0 + cycle(&show) * k);
            assert_eq!(show.current_index(), (k as usize) % 4);
        }
    }

    #[test]
    fn test_single_image_wraps_onto_itself() {
        let mut show = Slideshow::new();
        let mut rng = StdRng::seed_from_u64(4);
        let t0 = Instant::now();
        show.start(&images(1), &mut rng, t0);
        show.tick(t0 + cycle(&show) * 3);
        assert_eq!(show.current_index(), 0);
        assert!(show.current_block().is_some());
        // Redisplaying the same item renders no outgoing frame and holds
        // full opacity through the fade window.
        let mid_fade = t0 + cycle(&show) * 3 + show.visible_duration() + FADE_DURATION / 2;
        show.tick(mid_fade);
        assert!(show.previous_block().is_none());
        assert_eq!(show.current_alpha(mid_fade), 1.0);
    }

    #[test]
    fn test_lookahead_emitted_near_end_of_list() {
        let mut show = Slideshow::new();
        let mut rng = StdRng::seed_from_u64(5);
        let t0 = Instant::now();
        show.start(&images(5), &mut rng, t0);
        // Advances to index 1 and 2: still far from the end.
        assert_eq!(show.tick(t0 + cycle(&show)), None);
        assert_eq!(show.tick(t0 + cycle(&show) * 2), None);
        // Advance to index 3 == len - 2: time to look ahead.
        assert_eq!(
            show.tick(t0 + cycle(&show) * 3),
            Some(SlideshowCommand::LoadNextPage)
        );
    }

    #[test]
    fn test_stop_cancels_pending_advances() {
        let mut show = Slideshow::new();
        let mut rng = StdRng::seed_from_u64(6);
        let t0 = Instant::now();
        show.start(&images(3), &mut rng, t0);
        // Stop mid-fade.
        show.tick(t0 + show.visible_duration() + FADE_DURATION / 2);
        show.stop();
        assert!(!show.is_playing());
        assert!(show.next_deadline().is_none());
        // Advancing the clock arbitrarily far observes no state change.
        assert_eq!(show.tick(t0 + Duration::from_secs(3600)), None);
        assert_eq!(show.current_index(), 0);
        assert_eq!(show.image_count(), 0);
    }

    #[test]
    fn test_growth_absorbed_mid_playback_keeps_prefix() {
        let mut show = Slideshow::new();
        let mut rng = StdRng::seed_from_u64(7);
        let t0 = Instant::now();
        let mut filtered = images(3);
        show.start(&filtered, &mut rng, t0);
        let prefix: Vec<u64> = (0..3)
            .map(|i| show.list.get(i).unwrap().id)
            .collect();

        filtered.extend((4..=6).map(image_block));
        show.absorb_growth(&filtered, &mut rng);

        assert_eq!(show.image_count(), 6);
        let after: Vec<u64> = (0..3).map(|i| show.list.get(i).unwrap().id).collect();
        assert_eq!(after, prefix);
        let mut appended: Vec<u64> = (3..6).map(|i| show.list.get(i).unwrap().id).collect();
        appended.sort_unstable();
        assert_eq!(appended, vec![4, 5, 6]);
    }

    #[test]
    fn test_crossfade_alphas_over_one_cycle() {
        let mut show = Slideshow::new();
        let mut rng = StdRng::seed_from_u64(8);
        let t0 = Instant::now();
        show.start(&images(3), &mut rng, t0);

        // Fully visible during the hold, no outgoing frame.
        show.tick(t0 + Duration::from_millis(100));
        assert_eq!(show.current_alpha(t0 + Duration::from_millis(100)), 1.0);
        assert_eq!(show.previous_alpha(t0 + Duration::from_millis(100)), 0.0);
        assert!(show.previous_block().is_none());

        // Halfway through the fade the cursor has advanced; the outgoing
        // image is half gone and the new current one half present.
        let mid_fade = t0 + show.visible_duration() + FADE_DURATION / 2;
        show.tick(mid_fade);
        assert_eq!(show.current_index(), 1);
        assert!(show.previous_block().is_some());
        let outgoing = show.previous_alpha(mid_fade);
        let incoming = show.current_alpha(mid_fade);
        assert!((outgoing - 0.5).abs() < 0.01, "got {}", outgoing);
        assert!((incoming - 0.5).abs() < 0.01, "got {}", incoming);

        // When the fade completes the current image is fully visible and
        // the outgoing frame is gone.
        let after = t0 + show.visible_duration() + FADE_DURATION;
        show.tick(after);
        assert_eq!(show.current_index(), 1);
        assert_eq!(show.current_alpha(after), 1.0);
        assert!(show.previous_block().is_none());
    }

    #[test]
    fn test_visible_duration_is_selectable() {
        let mut show = Slideshow::new();
        show.set_visible_duration(Duration::from_millis(2500));
        let mut rng = StdRng::seed_from_u64(9);
        let t0 = Instant::now();
        show.start(&images(4), &mut rng, t0);
        show.tick(t0 + Duration::from_millis(2500 + 1500));
        assert_eq!(show.current_index(), 1);
    }
}
