//! Layout controllers
//!
//! A controller is the per-driver algorithm that turns the driver's children
//! and constraint into rectangles. [`FlexController`] delegates to Taffy: each
//! pass builds a single-level Taffy tree (the driver as container, its
//! in-layout children as leaves), solves it, and applies the result. Child
//! drivers with their own controller are then recalculated in nested mode
//! inside the same pass.

use strata_core::{Rect, Size};
use taffy::prelude::*;

use crate::error::Result;
use crate::pass::LayoutPass;

pub trait LayoutController {
    /// Lay out the pass's driver
    fn layout(&mut self, pass: &mut LayoutPass<'_>) -> Result<()>;
}

/// Flexbox container settings
#[derive(Clone, Debug, PartialEq)]
pub struct FlexController {
    direction: FlexDirection,
    wrap: FlexWrap,
    gap: f32,
    padding: f32,
    align_items: Option<AlignItems>,
    justify_content: Option<JustifyContent>,
}

impl Default for FlexController {
    fn default() -> Self {
        Self {
            direction: FlexDirection::Row,
            wrap: FlexWrap::NoWrap,
            gap: 0.0,
            padding: 0.0,
            align_items: None,
            justify_content: None,
        }
    }
}

impl FlexController {
    /// Row container
    pub fn row() -> Self {
        Self::default()
    }

    /// Column container
    pub fn column() -> Self {
        Self {
            direction: FlexDirection::Column,
            ..Self::default()
        }
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = FlexWrap::Wrap;
        self
    }

    /// Gap between children in pixels
    pub fn gap(mut self, px: f32) -> Self {
        self.gap = px;
        self
    }

    /// Padding on all sides in pixels
    pub fn padding(mut self, px: f32) -> Self {
        self.padding = px;
        self
    }

    pub fn align_items(mut self, align: AlignItems) -> Self {
        self.align_items = Some(align);
        self
    }

    pub fn justify_content(mut self, justify: JustifyContent) -> Self {
        self.justify_content = Some(justify);
        self
    }

    pub fn boxed(self) -> Box<dyn LayoutController> {
        Box::new(self)
    }

    fn container_style(&self, size: Size) -> Style {
        let padding = LengthPercentage::Length(self.padding);
        Style {
            display: Display::Flex,
            flex_direction: self.direction,
            flex_wrap: self.wrap,
            gap: taffy::Size {
                width: LengthPercentage::Length(self.gap),
                height: LengthPercentage::Length(self.gap),
            },
            padding: taffy::Rect {
                left: padding,
                right: padding,
                top: padding,
                bottom: padding,
            },
            align_items: self.align_items,
            justify_content: self.justify_content,
            size: taffy::Size {
                width: Dimension::Length(size.width),
                height: Dimension::Length(size.height),
            },
            ..Style::default()
        }
    }
}

impl LayoutController for FlexController {
    fn layout(&mut self, pass: &mut LayoutPass<'_>) -> Result<()> {
        let constraint = pass.constraint()?;
        let children = pass.children()?;

        let mut taffy: TaffyTree<()> = TaffyTree::new();
        let mut nodes = Vec::with_capacity(children.len());
        for &child in &children {
            let style = pass
                .modifier(child)?
                .map(|modifier| modifier.style().clone())
                .unwrap_or_default();
            nodes.push(taffy.new_leaf(style)?);
        }
        let container = taffy.new_with_children(self.container_style(constraint), &nodes)?;

        taffy.compute_layout(
            container,
            taffy::Size {
                width: AvailableSpace::Definite(constraint.width),
                height: AvailableSpace::Definite(constraint.height),
            },
        )?;

        let own = taffy.layout(container)?.size;
        pass.apply_own_size(Size::new(own.width, own.height))?;

        for (&child, &node) in children.iter().zip(&nodes) {
            let layout = taffy.layout(node)?;
            let rect = Rect::new(
                layout.location.x,
                layout.location.y,
                layout.size.width,
                layout.size.height,
            );
            pass.apply(child, rect)?;
            if pass.has_controller(child)? {
                pass.recalculate(child)?;
            }
        }

        tracing::trace!(
            "FlexController: laid out {} children in {}x{}",
            children.len(),
            constraint.width,
            constraint.height
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::LayoutModifier;
    use crate::tree::LayoutTree;

    fn approx(a: Rect, b: Rect) -> bool {
        (a.x() - b.x()).abs() < 0.01
            && (a.y() - b.y()).abs() < 0.01
            && (a.width() - b.width()).abs() < 0.01
            && (a.height() - b.height()).abs() < 0.01
    }

    #[test]
    fn test_row_grow() {
        let mut tree = LayoutTree::new();
        let root = tree.create_driver(Some(FlexController::row().boxed()));
        tree.set_available_space(root, Size::new(300.0, 100.0)).unwrap();

        let fixed = tree.create_item();
        let fill = tree.create_item();
        tree.add_child(root, fixed).unwrap();
        tree.add_child(root, fill).unwrap();
        tree.set_modifier(fixed, Some(LayoutModifier::new().w(100.0))).unwrap();
        tree.set_modifier(fill, Some(LayoutModifier::new().flex_1())).unwrap();

        tree.on_late_update().unwrap();

        assert!(approx(tree.rect(root).unwrap(), Rect::new(0.0, 0.0, 300.0, 100.0)));
        assert!(approx(tree.rect(fixed).unwrap(), Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(approx(tree.rect(fill).unwrap(), Rect::new(100.0, 0.0, 200.0, 100.0)));
    }

    #[test]
    fn test_column_with_gap_and_padding() {
        let mut tree = LayoutTree::new();
        let root = tree.create_driver(Some(FlexController::column().gap(10.0).padding(5.0).boxed()));
        tree.set_available_space(root, Size::new(200.0, 200.0)).unwrap();

        let a = tree.create_item();
        let b = tree.create_item();
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        tree.set_modifier(a, Some(LayoutModifier::new().h(20.0))).unwrap();
        tree.set_modifier(b, Some(LayoutModifier::new().h(30.0))).unwrap();

        tree.on_late_update().unwrap();

        assert!(approx(tree.rect(a).unwrap(), Rect::new(5.0, 5.0, 190.0, 20.0)));
        assert!(approx(tree.rect(b).unwrap(), Rect::new(5.0, 35.0, 190.0, 30.0)));
    }

    #[test]
    fn test_nested_driver_uses_assigned_size() {
        let mut tree = LayoutTree::new();
        let root = tree.create_driver(Some(FlexController::row().boxed()));
        tree.set_available_space(root, Size::new(400.0, 100.0)).unwrap();

        let panel = tree.create_driver(Some(FlexController::column().boxed()));
        tree.add_child(root, panel).unwrap();
        tree.set_modifier(panel, Some(LayoutModifier::new().w(150.0))).unwrap();
        // Ignored: nested passes never apply their own available space
        tree.set_available_space(panel, Size::new(999.0, 999.0)).unwrap();

        let row = tree.create_item();
        tree.add_child(panel, row).unwrap();
        tree.set_modifier(row, Some(LayoutModifier::new().h(40.0))).unwrap();

        assert_eq!(tree.on_late_update(), Ok(1));

        assert!(approx(tree.rect(panel).unwrap(), Rect::new(0.0, 0.0, 150.0, 100.0)));
        assert!(approx(tree.rect(row).unwrap(), Rect::new(0.0, 0.0, 150.0, 40.0)));
    }

    #[test]
    fn test_absolute_child() {
        let mut tree = LayoutTree::new();
        let root = tree.create_driver(Some(FlexController::row().boxed()));
        tree.set_available_space(root, Size::new(100.0, 100.0)).unwrap();

        let badge = tree.create_item();
        tree.add_child(root, badge).unwrap();
        tree.set_modifier(badge, Some(LayoutModifier::new().absolute(60.0, 5.0).size(20.0, 10.0)))
            .unwrap();

        tree.on_late_update().unwrap();
        assert!(approx(tree.rect(badge).unwrap(), Rect::new(60.0, 5.0, 20.0, 10.0)));
    }
}
