pub const DENSITY_XHIGH: u32 = 320;
pub const DENSITY_XXHIGH: u32 = 480;
pub const DENSITY_XXXHIGH: u32 = 640;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScreenLayoutSize {
    Undefined,
    Small,
    Normal,
    Large,
    XLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayContext {
    pub screen_layout: ScreenLayoutSize,
    pub density_dpi: u32,
}

pub trait TabletDetector {
    fn is_tablet(&self, display: Option<&DisplayContext>) -> bool;
}

/// Large layouts and the xhigh density buckets count as tablets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayMetricsDetector;

impl TabletDetector for DisplayMetricsDetector {
    fn is_tablet(&self, display: Option<&DisplayContext>) -> bool {
        let Some(display) = display else {
            return false;
        };
        display.screen_layout >= ScreenLayoutSize::Large
            || matches!(
                display.density_dpi,
                DENSITY_XHIGH | DENSITY_XXHIGH | DENSITY_XXXHIGH
            )
    }
}
