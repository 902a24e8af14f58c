//! Dock theme parameters derived from the dock layout and the shell panel.
//!
//! The dock expresses paddings in tenths of the icon size, so every absolute
//! pixel value goes through [`scale`] before it is written.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// Absolute paddings in pixels.
const HORIZ_PADDING_VERTICAL: f64 = 10.0;
const HORIZ_PADDING_HORIZONTAL: f64 = 2.0;
const TOP_PADDING_VERTICAL: f64 = 19.0;
const TOP_PADDING_HORIZONTAL: f64 = 15.0;
const ITEM_PADDING_VERTICAL: f64 = 29.0;
const ITEM_PADDING_HORIZONTAL: f64 = 32.0;

// Indicators grow once icons get large.
const INDICATOR_LARGE_THRESHOLD: i32 = 92;
const INDICATOR_LARGE: f64 = 34.0;
const INDICATOR_SMALL: f64 = 24.0;

/// Theme file section the parameters live in.
pub const THEME_GROUP: &str = "PlankDockTheme";

/// Screen edge the dock is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DockPosition {
    Left,
    Right,
    Top,
    #[default]
    Bottom,
}

impl DockPosition {
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

impl FromStr for DockPosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            other => Err(Error::InvalidLayout {
                kind: "position",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        })
    }
}

/// Alignment of the dock along its edge. `Fill` makes it a full-length panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DockAlignment {
    Fill,
    Start,
    End,
    #[default]
    Center,
}

impl FromStr for DockAlignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fill" => Ok(Self::Fill),
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "center" => Ok(Self::Center),
            other => Err(Error::InvalidLayout {
                kind: "alignment",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DockAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fill => "fill",
            Self::Start => "start",
            Self::End => "end",
            Self::Center => "center",
        })
    }
}

/// The dock settings the theme depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockLayout {
    pub icon_size: i32,
    pub position: DockPosition,
    pub alignment: DockAlignment,
}

impl Default for DockLayout {
    fn default() -> Self {
        Self {
            icon_size: 48,
            position: DockPosition::default(),
            alignment: DockAlignment::default(),
        }
    }
}

/// Convert an absolute pixel value to the theme's unit (tenths of the icon
/// size).
pub fn scale(pixels: f64, icon_size: i32) -> f64 {
    pixels * 10.0 / f64::from(icon_size)
}

/// Computed theme values, already scaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeParameters {
    pub horiz_padding: f64,
    pub top_padding: f64,
    pub bottom_padding: f64,
    pub item_padding: f64,
    pub indicator_size: f64,
}

impl ThemeParameters {
    /// Recompute every parameter from scratch.
    pub fn compute(layout: &DockLayout, panel_height: u32) -> Result<Self> {
        let icon_size = layout.icon_size;
        if icon_size <= 0 {
            return Err(Error::InvalidIconSize(icon_size));
        }

        let vertical = layout.position.is_vertical();
        let panel_mode = layout.alignment == DockAlignment::Fill;
        let panel_height = f64::from(panel_height);

        let padding_x = if vertical {
            if panel_mode {
                panel_height
            } else {
                HORIZ_PADDING_VERTICAL
            }
        } else {
            HORIZ_PADDING_HORIZONTAL
        };
        let padding_top = if vertical {
            TOP_PADDING_VERTICAL
        } else {
            TOP_PADDING_HORIZONTAL
        };
        let padding_bottom = if layout.position == DockPosition::Top {
            panel_height + padding_top
        } else {
            padding_top
        };
        let padding_item = if vertical {
            ITEM_PADDING_VERTICAL
        } else {
            ITEM_PADDING_HORIZONTAL
        };
        let indicator = if icon_size > INDICATOR_LARGE_THRESHOLD {
            INDICATOR_LARGE
        } else {
            INDICATOR_SMALL
        };

        Ok(Self {
            horiz_padding: scale(padding_x, icon_size),
            top_padding: scale(padding_top, icon_size),
            bottom_padding: scale(padding_bottom, icon_size),
            item_padding: scale(padding_item, icon_size),
            indicator_size: scale(indicator, icon_size),
        })
    }

    /// Theme file keys and their values formatted with two decimals.
    /// `IndicatorSize` is only included when `with_indicator` is set.
    pub fn entries(&self, with_indicator: bool) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("HorizPadding", format_value(self.horiz_padding)),
            ("TopPadding", format_value(self.top_padding)),
            ("BottomPadding", format_value(self.bottom_padding)),
            ("ItemPadding", format_value(self.item_padding)),
        ];
        if with_indicator {
            entries.push(("IndicatorSize", format_value(self.indicator_size)));
        }
        entries
    }
}

fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(icon_size: i32, position: DockPosition, alignment: DockAlignment) -> DockLayout {
        DockLayout {
            icon_size,
            position,
            alignment,
        }
    }

    fn entry<'a>(entries: &'a [(&'static str, String)], key: &str) -> &'a str {
        entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_scale() {
        assert_eq!(scale(32.0, 64), 5.0);
        assert_eq!(scale(10.0, 100), 1.0);
    }

    #[test]
    fn test_vertical_fill_uses_panel_height() {
        let params =
            ThemeParameters::compute(&layout(64, DockPosition::Left, DockAlignment::Fill), 32)
                .unwrap();
        let entries = params.entries(true);

        assert_eq!(entry(&entries, "HorizPadding"), "5.00");
        assert_eq!(entry(&entries, "TopPadding"), "2.97");
        assert_eq!(entry(&entries, "BottomPadding"), "2.97");
        assert_eq!(entry(&entries, "ItemPadding"), "4.53");
        assert_eq!(entry(&entries, "IndicatorSize"), "3.75");
    }

    #[test]
    fn test_vertical_centered_uses_fixed_padding() {
        let params =
            ThemeParameters::compute(&layout(50, DockPosition::Right, DockAlignment::Center), 32)
                .unwrap();
        assert_eq!(params.horiz_padding, 2.0);
    }

    #[test]
    fn test_top_dock_clears_the_panel() {
        let params =
            ThemeParameters::compute(&layout(64, DockPosition::Top, DockAlignment::Fill), 32)
                .unwrap();
        let entries = params.entries(false);

        // Horizontal docks ignore alignment for the side padding.
        assert_eq!(entry(&entries, "HorizPadding"), "0.31");
        assert_eq!(entry(&entries, "TopPadding"), "2.34");
        assert_eq!(entry(&entries, "BottomPadding"), "7.34");
        assert_eq!(entry(&entries, "ItemPadding"), "5.00");
        assert_eq!(entries.len(), 4);
    }

    #[test]
    fn test_bottom_dock_has_symmetric_padding() {
        let params =
            ThemeParameters::compute(&layout(48, DockPosition::Bottom, DockAlignment::Center), 32)
                .unwrap();
        assert_eq!(params.top_padding, params.bottom_padding);
    }

    #[test]
    fn test_indicator_threshold() {
        let small =
            ThemeParameters::compute(&layout(92, DockPosition::Bottom, DockAlignment::Center), 0)
                .unwrap();
        let large =
            ThemeParameters::compute(&layout(100, DockPosition::Bottom, DockAlignment::Center), 0)
                .unwrap();
        assert_eq!(small.indicator_size, scale(24.0, 92));
        assert_eq!(large.indicator_size, 3.4);
    }

    #[test]
    fn test_zero_icon_size_is_rejected() {
        let result = ThemeParameters::compute(&layout(0, DockPosition::Bottom, DockAlignment::Fill), 32);
        assert!(matches!(result, Err(Error::InvalidIconSize(0))));
    }

    #[test]
    fn test_parse_layout_values() {
        assert_eq!("left".parse::<DockPosition>().unwrap(), DockPosition::Left);
        assert_eq!("fill".parse::<DockAlignment>().unwrap(), DockAlignment::Fill);
        assert!("diagonal".parse::<DockPosition>().is_err());
        assert_eq!(DockPosition::Top.to_string(), "top");
    }
}
