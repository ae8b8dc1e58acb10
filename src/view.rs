//! View-facing load state and stale-response fencing
//!
//! Fetches are never cancelled; instead every fetch carries a generation
//! token and only the response matching the latest token may update visible
//! state. A slow response to a superseded filter selection is discarded.

use std::fmt::Display;

/// Opaque generation token handed out when a fetch begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Monotonically increasing fetch-generation counter
#[derive(Debug, Default)]
pub struct RequestTracker {
  current: u64,
}

impl RequestTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start a new generation, superseding any in-flight fetch
  pub fn begin(&mut self) -> RequestToken {
    self.current += 1;
    RequestToken(self.current)
  }

  pub fn is_current(&self, token: RequestToken) -> bool {
    token.0 == self.current
  }
}

/// What a view renders for one data family. Empty results are a rendered
/// state of their own, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
  Loading,
  Empty,
  Ready(T),
  Failed,
}

impl<T> LoadState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, LoadState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      LoadState::Ready(data) => Some(data),
      _ => None,
    }
  }
}

/// One view's data slot: current load state plus the fetch-generation fence
pub struct ViewState<T> {
  tracker: RequestTracker,
  state: LoadState<T>,
}

impl<T> Default for ViewState<T> {
  fn default() -> Self {
    Self {
      tracker: RequestTracker::new(),
      state: LoadState::Loading,
    }
  }
}

impl<T> ViewState<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> &LoadState<T> {
    &self.state
  }

  /// Enter loading and obtain the token for the fetch about to start
  pub fn begin(&mut self) -> RequestToken {
    self.state = LoadState::Loading;
    self.tracker.begin()
  }

  /// Apply a finished fetch. `Ok(None)` means the fetch succeeded but found
  /// nothing. Returns false when the response was stale and discarded.
  pub fn resolve<E: Display>(
    &mut self,
    token: RequestToken,
    result: Result<Option<T>, E>,
  ) -> bool {
    if !self.tracker.is_current(token) {
      log::debug!("Discarding stale fetch response");
      return false;
    }

    self.state = match result {
      Ok(Some(data)) => LoadState::Ready(data),
      Ok(None) => LoadState::Empty,
      Err(e) => {
        log::warn!("Fetch failed: {}", e);
        LoadState::Failed
      }
    };
    true
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
