//! # Slot Layout
//!
//! Where slot sizes come from. The fitter itself never asks a UI for its
//! geometry: callers hold a [`SlotSizeProvider`] per slot and query it once
//! per render cycle.
//!
//! [`GridLayout`] reproduces the conference grid: the number of active feeds
//! picks the rows/columns, each cell gets an equal share of the display, and
//! a small padding/border keeps neighbouring tiles apart.

use std::sync::atomic::{AtomicU64, Ordering};

use fit_scale::plan::Size;

/// Maximum number of feeds the grid lays out.
pub const MAX_FEEDS: usize = 16;

/// Source of a slot's current pixel size.
///
/// Sizes are signed because UI toolkits report `0` (or less) for widgets
/// that have not been realized yet.
pub trait SlotSizeProvider: Send + Sync {
    fn current_size(&self) -> (i32, i32);
}

impl<F> SlotSizeProvider for F
where
    F: Fn() -> (i32, i32) + Send + Sync,
{
    fn current_size(&self) -> (i32, i32) {
        self()
    }
}

/// A slot whose size never changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedSlotSize {
    pub width: i32,
    pub height: i32,
}

impl FixedSlotSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl SlotSizeProvider for FixedSlotSize {
    fn current_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }
}

/// Slot size shared between a UI thread (writer) and render workers (readers).
///
/// Both sides live in one `AtomicU64`, so a reader never sees the width of
/// one update paired with the height of another.
#[derive(Debug, Default)]
pub struct SharedSlotSize {
    packed: AtomicU64,
}

impl SharedSlotSize {
    /// Starts unrealized (0x0).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: i32, height: i32) -> Self {
        let cell = Self::new();
        cell.set(width, height);
        cell
    }

    pub fn set(&self, width: i32, height: i32) {
        let packed = ((width as u32 as u64) << 32) | height as u32 as u64;
        self.packed.store(packed, Ordering::Release);
    }
}

impl SlotSizeProvider for SharedSlotSize {
    fn current_size(&self) -> (i32, i32) {
        let packed = self.packed.load(Ordering::Acquire);
        ((packed >> 32) as u32 as i32, packed as u32 as i32)
    }
}

/// Grid rows and columns for `feeds` active videos.
///
/// 1 → 1x1, up to 4 → 2x2, up to 6 → 2x3, up to 9 → 3x3, otherwise 4x4.
pub fn grid_dims(feeds: usize) -> (u32, u32) {
    match feeds {
        0 | 1 => (1, 1),
        2..=4 => (2, 2),
        5..=6 => (2, 3),
        7..=9 => (3, 3),
        _ => (4, 4),
    }
}

/// Position and size of one laid-out slot, in display pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRect {
    pub index: usize,
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SlotRect {
    /// Size as a provider would report it.
    pub fn as_provider(&self) -> FixedSlotSize {
        FixedSlotSize::new(self.width as i32, self.height as i32)
    }
}

/// Equal-cell grid over a display area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    pub display: Size,
    /// Space on each side of a slot inside its cell.
    pub padding: u32,
    /// Border drawn inside the padding on each side.
    pub border: u32,
    pub max_feeds: usize,
}

impl GridLayout {
    pub fn new(display: Size) -> Self {
        Self {
            display,
            padding: 1,
            border: 0,
            max_feeds: MAX_FEEDS,
        }
    }

    pub fn with_spacing(mut self, padding: u32, border: u32) -> Self {
        self.padding = padding;
        self.border = border;
        self
    }

    pub fn with_max_feeds(mut self, max_feeds: usize) -> Self {
        self.max_feeds = max_feeds.clamp(1, MAX_FEEDS);
        self
    }

    /// Size of one slot when `feeds` videos are shown. Sides that the
    /// spacing eats completely come out as 0.
    pub fn slot_size(&self, feeds: usize) -> Size {
        let (rows, cols) = grid_dims(feeds.min(self.max_feeds));
        let inset = 2 * (self.padding + self.border);
        Size::new(
            (self.display.w / cols).saturating_sub(inset),
            (self.display.h / rows).saturating_sub(inset),
        )
    }

    /// One rect per shown feed, row-major. Feeds beyond `max_feeds` are not laid out.
    pub fn slot_rects(&self, feeds: usize) -> Vec<SlotRect> {
        let shown = feeds.min(self.max_feeds);
        let (rows, cols) = grid_dims(shown);
        let cell = Size::new(self.display.w / cols, self.display.h / rows);
        let slot = self.slot_size(shown);
        let inset = self.padding + self.border;

        (0..shown)
            .map(|index| {
                let row = index as u32 / cols;
                let col = index as u32 % cols;
                SlotRect {
                    index,
                    row,
                    col,
                    x: col * cell.w + inset.min(cell.w),
                    y: row * cell.h + inset.min(cell.h),
                    width: slot.w,
                    height: slot.h,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn grid_dims_follow_feed_count() {
        assert_eq!(grid_dims(1), (1, 1));
        assert_eq!(grid_dims(3), (2, 2));
        assert_eq!(grid_dims(4), (2, 2));
        assert_eq!(grid_dims(5), (2, 3));
        assert_eq!(grid_dims(6), (2, 3));
        assert_eq!(grid_dims(9), (3, 3));
        assert_eq!(grid_dims(10), (4, 4));
        assert_eq!(grid_dims(40), (4, 4));
    }

    #[test]
    fn slot_size_subtracts_spacing() {
        let grid = GridLayout::new(Size::new(1280, 720));
        // 2x2 cells of 640x360, minus 1px padding per side
        assert_eq!(grid.slot_size(4), Size::new(638, 358));

        let grid = grid.with_spacing(0, 0);
        assert_eq!(grid.slot_size(1), Size::new(1280, 720));
    }

    #[test]
    fn tiny_display_gives_unrealized_slot() {
        let grid = GridLayout::new(Size::new(6, 6)).with_spacing(2, 1);
        assert_eq!(grid.slot_size(16), Size::new(0, 0));
    }

    #[test]
    fn slot_rects_are_row_major_and_capped() {
        let grid = GridLayout::new(Size::new(900, 600)).with_spacing(0, 0);
        let rects = grid.slot_rects(5);
        assert_eq!(rects.len(), 5);
        assert_eq!((rects[4].row, rects[4].col), (1, 1));
        assert_eq!((rects[4].x, rects[4].y), (300, 300));
        assert_eq!((rects[4].width, rects[4].height), (300, 300));

        assert_eq!(grid.slot_rects(20).len(), MAX_FEEDS);
        assert_eq!(grid.with_max_feeds(4).slot_rects(20).len(), 4);
    }

    #[test]
    fn shared_size_round_trips_negative_values() {
        let cell = SharedSlotSize::new();
        assert_eq!(cell.current_size(), (0, 0));
        cell.set(-1, 240);
        assert_eq!(cell.current_size(), (-1, 240));
        cell.set(1920, 1080);
        assert_eq!(cell.current_size(), (1920, 1080));
    }

    #[test]
    fn closures_and_shared_handles_are_providers() {
        let provider = || (320, 240);
        assert_eq!(provider.current_size(), (320, 240));
        let shared: Arc<dyn SlotSizeProvider> = Arc::new(FixedSlotSize::new(1, 2));
        assert_eq!(shared.current_size(), (1, 2));
    }
}
