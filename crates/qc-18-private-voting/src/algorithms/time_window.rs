//! # Time Window Guard
//!
//! Maps the logical clock onto the five phase windows.
//!
//! Window `k` (1..=4) is `[marker[k-1], marker[k])`; the refund window is
//! `[marker[4], inf)`.

use crate::domain::{invariant_markers_ascending, ElectionError, Timestamp, Window, MARKER_COUNT};
use serde::{Deserialize, Serialize};

/// Validated phase markers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindowGuard {
    markers: [Timestamp; MARKER_COUNT],
}

impl TimeWindowGuard {
    /// Validate markers against the clock at construction.
    pub fn new(markers: [Timestamp; MARKER_COUNT], now: Timestamp) -> Result<Self, ElectionError> {
        invariant_markers_ascending(&markers, now)?;
        Ok(Self { markers })
    }

    /// Inclusive start and exclusive end of `window`.
    pub fn bounds(&self, window: Window) -> (Timestamp, Option<Timestamp>) {
        let n = window.number();
        let end = self.markers.get(n).copied();
        (self.markers[n - 1], end)
    }

    /// Is `now` inside `window`?
    pub fn is_open(&self, window: Window, now: Timestamp) -> bool {
        let (start, end) = self.bounds(window);
        now >= start && end.map_or(true, |end| now < end)
    }

    /// Fail with a phase error unless `now` is inside `window`.
    pub fn ensure_open(&self, window: Window, now: Timestamp) -> Result<(), ElectionError> {
        if self.is_open(window, now) {
            return Ok(());
        }
        let (start, end) = self.bounds(window);
        Err(ElectionError::OutsideWindow {
            window,
            now,
            start,
            end,
        })
    }

    /// Window containing `now`, or `None` before the first marker.
    pub fn active_window(&self, now: Timestamp) -> Option<Window> {
        Window::ALL
            .into_iter()
            .rev()
            .find(|w| now >= self.bounds(*w).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> TimeWindowGuard {
        TimeWindowGuard::new([5, 10, 15, 20, 25], 0).unwrap()
    }

    #[test]
    fn test_bounds() {
        let g = guard();
        assert_eq!(g.bounds(Window::Registration), (5, Some(10)));
        assert_eq!(g.bounds(Window::Tallying), (20, Some(25)));
        assert_eq!(g.bounds(Window::Refund), (25, None));
    }

    #[test]
    fn test_window_edges() {
        let g = guard();
        assert!(!g.is_open(Window::Confirmation, 9));
        assert!(g.is_open(Window::Confirmation, 10));
        assert!(g.is_open(Window::Confirmation, 14));
        assert!(!g.is_open(Window::Confirmation, 15));
        assert!(g.is_open(Window::Refund, 25));
        assert!(g.is_open(Window::Refund, u64::MAX));
    }

    #[test]
    fn test_ensure_open_error() {
        let result = guard().ensure_open(Window::Casting, 21);
        assert_eq!(
            result,
            Err(ElectionError::OutsideWindow {
                window: Window::Casting,
                now: 21,
                start: 15,
                end: Some(20),
            })
        );
    }

    #[test]
    fn test_active_window() {
        let g = guard();
        assert_eq!(g.active_window(4), None);
        assert_eq!(g.active_window(5), Some(Window::Registration));
        assert_eq!(g.active_window(16), Some(Window::Casting));
        assert_eq!(g.active_window(1_000), Some(Window::Refund));
    }

    #[test]
    fn test_rejects_bad_markers() {
        assert!(TimeWindowGuard::new([5, 4, 15, 20, 25], 0).is_err());
        assert!(TimeWindowGuard::new([5, 10, 15, 20, 25], 7).is_err());
    }
}
