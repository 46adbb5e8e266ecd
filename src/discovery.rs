//! Homepage "discovery" feed.
//!
//! Holds the fetched events and a search term, and keeps a derived sample of at
//! most [`SAMPLE_SIZE`] events up to date. Sampling is a shuffle followed by a
//! slice, so two refreshes over the same input may differ. Seed the feed with
//! [`EventFeed::with_seed`] when a reproducible sample is needed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::EventWithOrganizer;

pub const SAMPLE_SIZE: usize = 9;

pub struct EventFeed {
    events: Vec<EventWithOrganizer>,
    search_term: String,
    filtered: Vec<EventWithOrganizer>,
    rng: StdRng,
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFeed {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            events: Vec::new(),
            search_term: String::new(),
            filtered: Vec::new(),
            rng,
        }
    }

    pub fn set_events(&mut self, events: Vec<EventWithOrganizer>) {
        self.events = events;
        self.refresh();
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.refresh();
    }

    pub fn events(&self) -> &[EventWithOrganizer] {
        &self.events
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filtered(&self) -> &[EventWithOrganizer] {
        &self.filtered
    }

    pub fn into_filtered(self) -> Vec<EventWithOrganizer> {
        self.filtered
    }

    fn refresh(&mut self) {
        self.filtered = filter_events(&self.search_term, &self.events, &mut self.rng);
    }
}

/// Matches `term` (trimmed, case-insensitive) against title, city and address,
/// then samples up to [`SAMPLE_SIZE`] of the matches. A blank term samples from
/// every event.
pub fn filter_events<R>(
    term: &str,
    events: &[EventWithOrganizer],
    rng: &mut R,
) -> Vec<EventWithOrganizer>
where
    R: Rng + ?Sized,
{
    let needle = term.trim().to_lowercase();
    let candidates: Vec<EventWithOrganizer> = if needle.is_empty() {
        events.to_vec()
    } else {
        events
            .iter()
            .filter(|e| e.event.matches(&needle))
            .cloned()
            .collect()
    };
    pick_random(candidates, SAMPLE_SIZE, rng)
}

pub fn pick_random<T, R>(mut items: Vec<T>, n: usize, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    items.shuffle(rng);
    items.truncate(n);
    items
}
