//! Layout configuration

/// Rendered card width in pixels (w-24 card)
pub const DEFAULT_CARD_WIDTH_PX: f64 = 96.0;
/// Rendered card height in pixels
pub const DEFAULT_CARD_HEIGHT_PX: f64 = 96.0;
/// Proximity threshold in percent of canvas, applied on both axes
pub const DEFAULT_PROXIMITY_PCT: f64 = 5.0;

/// 布局配置 - card footprint and proximity threshold
///
/// | 字段 | 默认值 | 说明 |
/// |------|--------|------|
/// | card_width_px | 96 | card width used for child spacing and collision span |
/// | card_height_px | 96 | card height, used as the row height for collisions |
/// | proximity_pct | 5.0 | "close" threshold for drop-to-join and collisions |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub card_width_px: f64,
    pub card_height_px: f64,
    pub proximity_pct: f64,
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self {
            card_width_px: DEFAULT_CARD_WIDTH_PX,
            card_height_px: DEFAULT_CARD_HEIGHT_PX,
            proximity_pct: DEFAULT_PROXIMITY_PCT,
        }
    }

    /// Set the card size in pixels
    pub fn with_card_size(mut self, width_px: f64, height_px: f64) -> Self {
        self.card_width_px = width_px;
        self.card_height_px = height_px;
        self
    }

    /// Set the proximity threshold (percent of canvas)
    pub fn with_proximity_pct(mut self, pct: f64) -> Self {
        self.proximity_pct = pct;
        self
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new()
    }
}
