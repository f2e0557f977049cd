//! Viewport sizing.
//!
//! Owns the logical width/height all distance and position math uses,
//! plus the device scale factor mapping logical pixels to the physical
//! backing store. A host can hand us a zero-sized container (hidden tab,
//! collapsed panel); that defers initialization with a doubling retry
//! schedule instead of failing.

use glam::Vec2;

/// Frames to wait before the first deferred-size retry.
const RETRY_BASE_FRAMES: u32 = 8;
/// Cap on the retry interval.
const RETRY_MAX_FRAMES: u32 = 256;

/// Result of applying a container size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeOutcome {
    /// Size accepted and changed; the particle set must be recreated.
    Changed,
    /// Size accepted but identical to the current one.
    Unchanged,
    /// Non-positive dimensions; initialization deferred, retry later.
    Deferred,
}

/// Viewport state: logical size plus device scale factor.
#[derive(Debug)]
pub struct Viewport {
    logical: Option<Vec2>,
    scale_factor: f32,
    retry_attempts: u32,
    retry_countdown: u32,
}

impl Viewport {
    /// Create a viewport from an initial container size. Non-positive
    /// dimensions leave it uninitialized with a pending retry.
    pub fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        let mut vp = Self {
            logical: None,
            scale_factor: scale_factor.max(0.1),
            retry_attempts: 0,
            retry_countdown: 0,
        };
        vp.apply(width, height);
        vp
    }

    /// Apply a container size in logical pixels.
    pub fn apply(&mut self, width: f32, height: f32) -> SizeOutcome {
        if width <= 0.0 || height <= 0.0 {
            let wait = (RETRY_BASE_FRAMES << self.retry_attempts.min(5)).min(RETRY_MAX_FRAMES);
            self.retry_attempts += 1;
            self.retry_countdown = wait;
            return SizeOutcome::Deferred;
        }
        self.retry_attempts = 0;
        self.retry_countdown = 0;
        let next = Vec2::new(width, height);
        if self.logical == Some(next) {
            SizeOutcome::Unchanged
        } else {
            self.logical = Some(next);
            SizeOutcome::Changed
        }
    }

    pub fn set_scale_factor(&mut self, scale: f32) {
        self.scale_factor = scale.max(0.1);
    }

    /// Count down one frame of a pending retry. Returns `true` when the
    /// caller should re-query the container size now.
    pub fn tick_retry(&mut self) -> bool {
        if self.logical.is_some() || self.retry_countdown == 0 {
            return false;
        }
        self.retry_countdown -= 1;
        self.retry_countdown == 0
    }

    /// Logical size, if initialized.
    #[inline]
    pub fn logical_size(&self) -> Option<Vec2> {
        self.logical
    }

    /// Whether a usable size has been established.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.logical.is_some()
    }

    #[inline]
    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// Backing-store size in physical pixels.
    pub fn physical_size(&self) -> Option<(u32, u32)> {
        self.logical.map(|l| {
            (
                (l.x * self.scale_factor).round().max(1.0) as u32,
                (l.y * self.scale_factor).round().max(1.0) as u32,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_size_is_ready() {
        let vp = Viewport::new(400.0, 300.0, 2.0);
        assert!(vp.is_ready());
        assert_eq!(vp.logical_size(), Some(Vec2::new(400.0, 300.0)));
        assert_eq!(vp.physical_size(), Some((800, 600)));
    }

    #[test]
    fn test_zero_size_defers() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0);
        assert!(!vp.is_ready());
        assert_eq!(vp.physical_size(), None);

        // First retry fires after the base interval.
        let mut fired_after = 0;
        for frame in 1..=RETRY_BASE_FRAMES {
            if vp.tick_retry() {
                fired_after = frame;
            }
        }
        assert_eq!(fired_after, RETRY_BASE_FRAMES);
    }

    #[test]
    fn test_retry_interval_doubles() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0);
        // Second failed attempt waits twice as long.
        assert_eq!(vp.apply(0.0, -5.0), SizeOutcome::Deferred);
        let mut fired_after = 0;
        for frame in 1..=(RETRY_BASE_FRAMES * 4) {
            if vp.tick_retry() {
                fired_after = frame;
                break;
            }
        }
        assert_eq!(fired_after, RETRY_BASE_FRAMES * 2);
    }

    #[test]
    fn test_recovery_after_deferral() {
        let mut vp = Viewport::new(-1.0, 10.0, 1.0);
        assert!(!vp.is_ready());
        assert_eq!(vp.apply(640.0, 480.0), SizeOutcome::Changed);
        assert!(vp.is_ready());
        // Same size again is a no-op.
        assert_eq!(vp.apply(640.0, 480.0), SizeOutcome::Unchanged);
    }

    #[test]
    fn test_resize_reports_change() {
        let mut vp = Viewport::new(100.0, 100.0, 1.0);
        assert_eq!(vp.apply(200.0, 100.0), SizeOutcome::Changed);
        assert_eq!(vp.logical_size(), Some(Vec2::new(200.0, 100.0)));
    }
}
