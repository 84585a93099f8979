//! Filtered, cursor-paginated list state.
//!
//! One `ListController` instance backs each remotely-paginated feed (orders,
//! operators, trucks, work costs). The controller owns the item buffer, the
//! active filter set, and request sequencing; it knows nothing about HTTP or
//! rendering. Operations return [`FeedCommand`]s which the app layer turns
//! into capability calls, and completions come back through
//! [`ListController::apply_page`] / [`ListController::apply_failure`] tagged
//! with the generation that was current when the request was issued.
//! A response whose generation is no longer current is discarded, never
//! appended.

use serde::{Deserialize, Serialize};

use crate::SEARCH_DEBOUNCE_MS;

/// Opaque continuation token handed back by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(pub String);

impl Cursor {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    #[default]
    Idle,
    LoadingFirstPage,
    LoadingMore,
    Refreshing,
    Failed,
}

impl LoadPhase {
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(
            self,
            Self::LoadingFirstPage | Self::LoadingMore | Self::Refreshing
        )
    }

    /// True while a first-page request (initial load or pull-to-refresh) is
    /// outstanding.
    #[must_use]
    pub const fn is_first_page_load(self) -> bool {
        matches!(self, Self::LoadingFirstPage | Self::Refreshing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Date,
    Search,
    Status,
    Location,
}

impl FilterKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Search => "search",
            Self::Status => "status",
            Self::Location => "location",
        }
    }
}

/// Active filter values, all optional. Values are carried as the strings the
/// backend accepts; typed enums in the domain model convert via `as_str`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FilterSet {
    pub date: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
}

impl FilterSet {
    /// Replaces one entry. Returns false when the value is unchanged, in
    /// which case no reload should fire.
    pub fn set(&mut self, key: FilterKey, value: Option<String>) -> bool {
        let slot = match key {
            FilterKey::Date => &mut self.date,
            FilterKey::Search => &mut self.search,
            FilterKey::Status => &mut self.status,
            FilterKey::Location => &mut self.location,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    #[must_use]
    pub fn get(&self, key: FilterKey) -> Option<&str> {
        match key {
            FilterKey::Date => self.date.as_deref(),
            FilterKey::Search => self.search.as_deref(),
            FilterKey::Status => self.status.as_deref(),
            FilterKey::Location => self.location.as_deref(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.search.is_none()
            && self.status.is_none()
            && self.location.is_none()
    }
}

/// One page of results as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub next: Option<Cursor>,
    pub count: Option<u64>,
}

/// What the app layer must do next. `FetchPage` with `cursor: None` means
/// page one (replace on arrival); with a cursor it means continuation
/// (append on arrival).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCommand {
    FetchPage {
        generation: u64,
        cursor: Option<Cursor>,
        filters: FilterSet,
    },
    StartDebounce {
        token: u64,
        delay_ms: u64,
    },
}

/// Outcome of feeding a completion into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Replaced,
    Appended,
    Failed,
    /// The initiating request's filter/cursor snapshot is no longer current;
    /// the completion was dropped without touching any state.
    Stale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListController<T> {
    items: Vec<T>,
    cursor: Option<Cursor>,
    total_count: Option<u64>,
    phase: LoadPhase,
    filters: FilterSet,
    generation: u64,
    debounce_token: u64,
    debounce_pending: bool,
}

impl<T> Default for ListController<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            total_count: None,
            phase: LoadPhase::Idle,
            filters: FilterSet::default(),
            generation: 0,
            debounce_token: 0,
            debounce_pending: false,
        }
    }
}

impl<T> ListController<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    #[must_use]
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    #[must_use]
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Whether the backend has announced further pages for the current
    /// filter set.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Called when the feed's screen mounts or regains focus: resets the
    /// state wholesale and starts the first-page load.
    pub fn open(&mut self) -> FeedCommand {
        let filters = std::mem::take(&mut self.filters);
        *self = Self::default();
        self.filters = filters;
        self.begin_reload(LoadPhase::LoadingFirstPage)
    }

    /// Called when the feed's screen unmounts. State is discarded, not
    /// incrementally patched.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Updates one filter entry. Search-text changes are applied to the
    /// filter set immediately but the reload waits for debounce quiescence;
    /// every other key reloads from page one at once.
    pub fn set_filter(&mut self, key: FilterKey, value: Option<String>) -> Option<FeedCommand> {
        if !self.filters.set(key, value) {
            return None;
        }

        if key == FilterKey::Search {
            self.debounce_token = self.debounce_token.wrapping_add(1);
            self.debounce_pending = true;
            return Some(FeedCommand::StartDebounce {
                token: self.debounce_token,
                delay_ms: SEARCH_DEBOUNCE_MS,
            });
        }

        // An immediate reload carries the latest search text too, so any
        // pending debounce becomes redundant.
        self.debounce_pending = false;
        Some(self.begin_reload(LoadPhase::LoadingFirstPage))
    }

    /// Completion of a debounce timer. Only the most recently issued token
    /// triggers the reload; earlier timers were superseded by further typing
    /// or by an immediate reload.
    pub fn debounce_elapsed(&mut self, token: u64) -> Option<FeedCommand> {
        if !self.debounce_pending || token != self.debounce_token {
            return None;
        }
        self.debounce_pending = false;
        Some(self.begin_reload(LoadPhase::LoadingFirstPage))
    }

    /// Requests the next page. Silently ignored while a load is in flight or
    /// once the cursor is exhausted; permitted from `Failed` so the user can
    /// retry a failed load-more.
    pub fn load_more(&mut self) -> Option<FeedCommand> {
        if self.phase.is_loading() {
            return None;
        }
        let cursor = self.cursor.clone()?;
        self.phase = LoadPhase::LoadingMore;
        Some(FeedCommand::FetchPage {
            generation: self.generation,
            cursor: Some(cursor),
            filters: self.filters.clone(),
        })
    }

    /// Pull-to-refresh: discards items and cursor and re-fetches page one
    /// with the current filters. Safe to call while a load-more is in
    /// flight; the generation bump makes that response stale on arrival.
    pub fn refresh(&mut self) -> FeedCommand {
        self.begin_reload(LoadPhase::Refreshing)
    }

    /// Optimistically removes the first item matching `pred`. Returns
    /// whether anything was removed. The remote delete is the caller's
    /// concern; there is no rollback on failure.
    pub fn remove_item<F>(&mut self, pred: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.items.len();
        let mut pred = pred;
        if let Some(pos) = self.items.iter().position(&mut pred) {
            self.items.remove(pos);
        }
        self.items.len() != before
    }

    /// Applies a successful page. First-page responses replace the buffer,
    /// continuations append to it; either way the cursor advances and the
    /// phase returns to `Idle`.
    pub fn apply_page(&mut self, generation: u64, page: Page<T>) -> Applied {
        if generation != self.generation {
            return Applied::Stale;
        }

        let applied = if self.phase.is_first_page_load() {
            self.items = page.results;
            Applied::Replaced
        } else {
            self.items.extend(page.results);
            Applied::Appended
        };

        self.cursor = page.next;
        self.total_count = page.count.or(self.total_count);
        self.phase = LoadPhase::Idle;
        applied
    }

    /// Applies a failed load. Items keep their last known-good value: a
    /// reload already cleared them when it started, a load-more leaves the
    /// existing buffer intact.
    pub fn apply_failure(&mut self, generation: u64) -> Applied {
        if generation != self.generation {
            return Applied::Stale;
        }
        self.phase = LoadPhase::Failed;
        Applied::Failed
    }

    fn begin_reload(&mut self, phase: LoadPhase) -> FeedCommand {
        debug_assert!(phase.is_first_page_load());
        self.items.clear();
        self.cursor = None;
        self.total_count = None;
        self.generation += 1;
        self.debounce_pending = false;
        self.phase = phase;
        FeedCommand::FetchPage {
            generation: self.generation,
            cursor: None,
            filters: self.filters.clone(),
        }
    }
}
