//! Headless block layout.
//!
//! Elements stack vertically unless one of their classes is a row class, in which case their
//! children share a line and the row is as tall as its tallest child. Form controls have a
//! fixed height. Text wraps at a fixed number of characters per line.

use bevy_ecs::prelude::*;

use crate::{
    config::LayoutConfig,
    dom::child_entities,
    ecs::{DomRoot, Element, TextNode},
    styling::{StyleClass, commit_style_animations},
};

/// Border box of a laid-out element, in document coordinates.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutBox {
    pub top: f32,
    pub height: f32,
    pub width: f32,
}

impl LayoutBox {
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Visible region of the document.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[must_use]
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            scroll_top: 0.0,
            width: config.viewport_width,
            height: config.viewport_height,
        }
    }

    /// Whether `target` touches the viewport grown by `margin` on every side.
    #[must_use]
    pub fn intersects(&self, target: &LayoutBox, margin: f32) -> bool {
        let top = self.scroll_top - margin;
        let bottom = self.scroll_top + self.height + margin;
        target.top <= bottom && target.bottom() >= top
    }
}

/// Layout metrics, kept as a resource so layout can run without the full config.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LayoutMetrics(pub LayoutConfig);

impl LayoutMetrics {
    fn text_height(&self, text: &str) -> f32 {
        let chars = text.chars().count();
        if chars == 0 {
            return 0.0;
        }
        let per_line = self.0.chars_per_line.max(1);
        chars.div_ceil(per_line) as f32 * self.0.line_height
    }

    fn is_row(&self, classes: Option<&StyleClass>) -> bool {
        classes.is_some_and(|classes| {
            self.0
                .row_classes
                .iter()
                .any(|row_class| classes.contains(row_class))
        })
    }

    fn padding(&self, classes: Option<&StyleClass>) -> f32 {
        if classes.is_some_and(|classes| classes.contains("card")) {
            self.0.card_padding
        } else {
            0.0
        }
    }
}

/// Lay out every document root, stacking roots vertically.
pub fn layout_document(world: &mut World) {
    let Some(metrics) = world.get_resource::<LayoutMetrics>().cloned() else {
        return;
    };
    let width = world
        .get_resource::<Viewport>()
        .map_or(metrics.0.viewport_width, |viewport| viewport.width);

    let mut roots = world.query_filtered::<Entity, With<DomRoot>>();
    let roots = roots.iter(world).collect::<Vec<_>>();

    let mut boxes = Vec::new();
    let mut top = 0.0;
    for root in roots {
        top += measure(world, &metrics, root, top, width, &mut boxes);
    }

    for (entity, layout_box) in boxes {
        world.entity_mut(entity).insert(layout_box);
    }
}

fn measure(
    world: &World,
    metrics: &LayoutMetrics,
    entity: Entity,
    top: f32,
    width: f32,
    boxes: &mut Vec<(Entity, LayoutBox)>,
) -> f32 {
    if let Some(TextNode(text)) = world.get::<TextNode>(entity) {
        return metrics.text_height(text);
    }
    let Some(element) = world.get::<Element>(entity) else {
        return 0.0;
    };

    let classes = world.get::<StyleClass>(entity);
    let height = match element.tag.as_str() {
        "input" | "button" | "select" | "textarea" => metrics.0.control_height,
        _ => {
            let padding = metrics.padding(classes);
            let content_top = top + padding;
            let children = child_entities(world, entity);
            let content = if metrics.is_row(classes) {
                children
                    .into_iter()
                    .map(|child| measure(world, metrics, child, content_top, width, boxes))
                    .fold(0.0, f32::max)
            } else {
                let mut cursor = content_top;
                for child in children {
                    cursor += measure(world, metrics, child, cursor, width, boxes);
                }
                cursor - content_top
            };
            content + padding * 2.0
        }
    };

    boxes.push((entity, LayoutBox { top, height, width }));
    height
}

/// Force a synchronous layout and style commit, returning the element's width
/// (`offsetWidth`).
pub fn force_reflow(world: &mut World, entity: Entity) -> f32 {
    layout_document(world);
    commit_style_animations(world);
    world
        .get::<LayoutBox>(entity)
        .map_or(0.0, |layout_box| layout_box.width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{h, mount};

    fn world_with_root() -> (World, Entity) {
        let mut world = World::new();
        let config = LayoutConfig {
            chars_per_line: 10,
            ..LayoutConfig::default()
        };
        world.insert_resource(Viewport::from_config(&config));
        world.insert_resource(LayoutMetrics(config));
        let root = world.spawn((DomRoot, Element::new("div"))).id();
        (world, root)
    }

    #[test]
    fn blocks_stack_and_rows_share_a_line() {
        let (mut world, root) = world_with_root();
        let input = h("input", [], []);
        let go = h("button", [], ["Go".into()]);
        let bar = h("div", [("class", "bar".into())], [input.into(), go.into()]);
        let bar = mount(&mut world, root, &bar);
        let text = h("p", [], ["twenty-one characters".into()]);
        let text = mount(&mut world, root, &text);

        layout_document(&mut world);

        let bar_box = world.get::<LayoutBox>(bar).copied().unwrap_or_default();
        let text_box = world.get::<LayoutBox>(text).copied().unwrap_or_default();
        assert_eq!(bar_box.height, 36.0);
        assert_eq!(text_box.top, 36.0);
        assert_eq!(text_box.height, 60.0);
    }

    #[test]
    fn cards_are_padded_on_both_sides() {
        let (mut world, root) = world_with_root();
        let title = h("h3", [], ["Fact".into()]);
        let card = h("div", [("class", "card".into())], [title.into()]);
        let card = mount(&mut world, root, &card);

        layout_document(&mut world);

        let card_box = world.get::<LayoutBox>(card).copied().unwrap_or_default();
        assert_eq!(card_box.height, 20.0 + 32.0);
    }

    #[test]
    fn viewport_margin_pre_triggers_intersection() {
        let viewport = Viewport {
            scroll_top: 0.0,
            width: 400.0,
            height: 800.0,
        };
        let below = LayoutBox {
            top: 950.0,
            height: 0.0,
            width: 400.0,
        };
        assert!(!viewport.intersects(&below, 0.0));
        assert!(viewport.intersects(&below, 200.0));
    }

    #[test]
    fn force_reflow_reports_width() {
        let (mut world, root) = world_with_root();
        let p = mount(&mut world, root, &h("p", [], ["x".into()]));
        assert_eq!(force_reflow(&mut world, p), 420.0);
    }
}
