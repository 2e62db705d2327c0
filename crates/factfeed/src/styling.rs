use std::collections::BTreeSet;

use bevy_ecs::prelude::*;
use tracing::trace;

/// CSS-like class names attached to an element.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleClass(pub Vec<String>);

impl StyleClass {
    #[must_use]
    pub fn contains(&self, class_name: &str) -> bool {
        self.0.iter().any(|class| class == class_name)
    }

    pub fn add(&mut self, class_name: &str) {
        if !self.contains(class_name) {
            self.0.push(class_name.to_string());
        }
    }

    pub fn remove(&mut self, class_name: &str) {
        self.0.retain(|class| class != class_name);
    }
}

/// Classes whose presence runs a keyframe animation.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct AnimatedClasses(pub BTreeSet<String>);

impl Default for AnimatedClasses {
    fn default() -> Self {
        Self(BTreeSet::from([LIKE_BURST_CLASS.to_string()]))
    }
}

/// Class that plays the heart "burst" animation.
pub const LIKE_BURST_CLASS: &str = "like-burst";

/// Committed animation state of an element.
///
/// An animation starts when a style commit first observes its class on the element. Removing
/// and re-adding the class between two commits does not restart it.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleAnimation {
    pub running: Option<String>,
    pub starts: u32,
}

/// Commit class changes into [`StyleAnimation`] state.
pub fn commit_style_animations(world: &mut World) {
    let animated = world
        .get_resource::<AnimatedClasses>()
        .cloned()
        .unwrap_or_default();

    let mut query = world.query::<(Entity, &StyleClass, Option<&StyleAnimation>)>();
    let updates = query
        .iter(world)
        .filter_map(|(entity, classes, animation)| {
            let current = classes.0.iter().find(|class| animated.0.contains(*class));
            let previous = animation.and_then(|animation| animation.running.as_ref());
            match (current, previous) {
                (Some(current), Some(previous)) if current == previous => None,
                (Some(current), _) => {
                    let starts = animation.map_or(0, |animation| animation.starts) + 1;
                    Some((
                        entity,
                        StyleAnimation {
                            running: Some(current.clone()),
                            starts,
                        },
                    ))
                }
                (None, Some(_)) => Some((
                    entity,
                    StyleAnimation {
                        running: None,
                        starts: animation.map_or(0, |animation| animation.starts),
                    },
                )),
                (None, None) => None,
            }
        })
        .collect::<Vec<_>>();

    for (entity, animation) in updates {
        trace!(?entity, running = ?animation.running, starts = animation.starts, "style commit");
        world.entity_mut(entity).insert(animation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(world: &World, entity: Entity) -> u32 {
        world
            .get::<StyleAnimation>(entity)
            .map_or(0, |animation| animation.starts)
    }

    #[test]
    fn adding_an_animated_class_starts_once() {
        let mut world = World::new();
        world.init_resource::<AnimatedClasses>();
        let heart = world.spawn(StyleClass(vec!["heart".to_string()])).id();

        if let Some(mut classes) = world.get_mut::<StyleClass>(heart) {
            classes.add(LIKE_BURST_CLASS);
        }
        commit_style_animations(&mut world);
        commit_style_animations(&mut world);

        assert_eq!(starts(&world, heart), 1);
    }

    #[test]
    fn remove_and_add_without_commit_is_coalesced() {
        let mut world = World::new();
        world.init_resource::<AnimatedClasses>();
        let heart = world
            .spawn(StyleClass(vec![LIKE_BURST_CLASS.to_string()]))
            .id();
        commit_style_animations(&mut world);

        if let Some(mut classes) = world.get_mut::<StyleClass>(heart) {
            classes.remove(LIKE_BURST_CLASS);
            classes.add(LIKE_BURST_CLASS);
        }
        commit_style_animations(&mut world);
        assert_eq!(starts(&world, heart), 1);

        if let Some(mut classes) = world.get_mut::<StyleClass>(heart) {
            classes.remove(LIKE_BURST_CLASS);
        }
        commit_style_animations(&mut world);
        if let Some(mut classes) = world.get_mut::<StyleClass>(heart) {
            classes.add(LIKE_BURST_CLASS);
        }
        commit_style_animations(&mut world);
        assert_eq!(starts(&world, heart), 2);
    }

    #[test]
    fn class_list_helpers_do_not_duplicate() {
        let mut classes = StyleClass::default();
        classes.add("card");
        classes.add("card");
        assert_eq!(classes.0, vec!["card"]);
        classes.remove("card");
        assert!(!classes.contains("card"));
    }
}
