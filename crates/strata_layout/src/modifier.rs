//! Layout modifiers
//!
//! A [`LayoutModifier`] is the per-item layout intent a controller reads:
//! flex grow/shrink/basis, size bounds, margin, positioning and
//! self-alignment. It is a plain value; clone it to duplicate or inherit a
//! modifier from another item.
//!
//! ```rust
//! use strata_layout::LayoutModifier;
//!
//! let sidebar = LayoutModifier::new().w(240.0).shrink(0.0);
//! let wide = sidebar.clone().w(320.0);
//! assert_ne!(sidebar, wide);
//! ```

use taffy::prelude::*;

/// Per-item layout style
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutModifier {
    style: Style,
}

impl LayoutModifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a solver style directly
    pub fn from_style(style: Style) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    // =========================================================================
    // Size
    // =========================================================================

    /// Set width in pixels
    pub fn w(mut self, px: f32) -> Self {
        self.style.size.width = Dimension::Length(px);
        self
    }

    /// Set height in pixels
    pub fn h(mut self, px: f32) -> Self {
        self.style.size.height = Dimension::Length(px);
        self
    }

    /// Set both dimensions in pixels
    pub fn size(self, w: f32, h: f32) -> Self {
        self.w(w).h(h)
    }

    /// Set width as a fraction of the parent (1.0 = 100%)
    pub fn w_pct(mut self, fraction: f32) -> Self {
        self.style.size.width = Dimension::Percent(fraction);
        self
    }

    /// Set height as a fraction of the parent (1.0 = 100%)
    pub fn h_pct(mut self, fraction: f32) -> Self {
        self.style.size.height = Dimension::Percent(fraction);
        self
    }

    pub fn min_w(mut self, px: f32) -> Self {
        self.style.min_size.width = Dimension::Length(px);
        self
    }

    pub fn min_h(mut self, px: f32) -> Self {
        self.style.min_size.height = Dimension::Length(px);
        self
    }

    pub fn max_w(mut self, px: f32) -> Self {
        self.style.max_size.width = Dimension::Length(px);
        self
    }

    pub fn max_h(mut self, px: f32) -> Self {
        self.style.max_size.height = Dimension::Length(px);
        self
    }

    // =========================================================================
    // Flex
    // =========================================================================

    pub fn grow(mut self, factor: f32) -> Self {
        self.style.flex_grow = factor;
        self
    }

    pub fn shrink(mut self, factor: f32) -> Self {
        self.style.flex_shrink = factor;
        self
    }

    /// Set flex-basis in pixels
    pub fn basis(mut self, px: f32) -> Self {
        self.style.flex_basis = Dimension::Length(px);
        self
    }

    pub fn basis_auto(mut self) -> Self {
        self.style.flex_basis = Dimension::Auto;
        self
    }

    /// Grow to fill, ignoring intrinsic size (`flex: 1 1 0`)
    pub fn flex_1(mut self) -> Self {
        self.style.flex_grow = 1.0;
        self.style.flex_shrink = 1.0;
        self.style.flex_basis = Dimension::Length(0.0);
        self
    }

    pub fn align_self(mut self, align: AlignSelf) -> Self {
        self.style.align_self = Some(align);
        self
    }

    // =========================================================================
    // Margin
    // =========================================================================

    /// Set margin on all sides in pixels
    pub fn margin(mut self, px: f32) -> Self {
        let val = LengthPercentageAuto::Length(px);
        self.style.margin = Rect {
            left: val,
            right: val,
            top: val,
            bottom: val,
        };
        self
    }

    /// Set horizontal and vertical margin in pixels
    pub fn margin_xy(mut self, x: f32, y: f32) -> Self {
        self.style.margin.left = LengthPercentageAuto::Length(x);
        self.style.margin.right = LengthPercentageAuto::Length(x);
        self.style.margin.top = LengthPercentageAuto::Length(y);
        self.style.margin.bottom = LengthPercentageAuto::Length(y);
        self
    }

    /// Set auto horizontal margin (centering)
    pub fn mx_auto(mut self) -> Self {
        self.style.margin.left = LengthPercentageAuto::Auto;
        self.style.margin.right = LengthPercentageAuto::Auto;
        self
    }

    // =========================================================================
    // Position
    // =========================================================================

    /// Take the item out of flow and place it at `(left, top)` in the parent
    pub fn absolute(mut self, left: f32, top: f32) -> Self {
        self.style.position = Position::Absolute;
        self.style.inset.left = LengthPercentageAuto::Length(left);
        self.style.inset.top = LengthPercentageAuto::Length(top);
        self
    }

    /// Offset from the in-flow position
    pub fn offset(mut self, x: f32, y: f32) -> Self {
        self.style.position = Position::Relative;
        self.style.inset.left = LengthPercentageAuto::Length(x);
        self.style.inset.top = LengthPercentageAuto::Length(y);
        self
    }

    pub fn is_absolute(&self) -> bool {
        self.style.position == Position::Absolute
    }
}

impl From<Style> for LayoutModifier {
    fn from(style: Style) -> Self {
        Self::from_style(style)
    }
}
