use tracing::{trace, warn};

use crate::events::{FakeInputEvent, PointerEventKind};
use crate::hit::EntityId;

pub const DEFAULT_MAX_HANDLER_DEPTH: usize = 64;

/// Parent-linked entity tree whose nodes may implement pointer handlers.
pub trait HandlerTree {
    fn parent(&self, entity: EntityId) -> Option<EntityId>;
    fn supports(&self, entity: EntityId, kind: PointerEventKind) -> bool;
    fn invoke(&mut self, entity: EntityId, kind: PointerEventKind, event: &FakeInputEvent);
}

/// Nearest node, starting at `root` itself, that implements `kind`.
pub fn find_handler<T: HandlerTree + ?Sized>(
    tree: &T,
    root: EntityId,
    kind: PointerEventKind,
    max_depth: usize,
) -> Option<EntityId> {
    let mut current = Some(root);
    let mut visited = 0usize;
    while let Some(entity) = current {
        if visited >= max_depth {
            warn!(root = ?root, ?kind, max_depth, "handler_walk_depth_exceeded");
            return None;
        }
        if tree.supports(entity, kind) {
            return Some(entity);
        }
        visited += 1;
        current = tree.parent(entity);
    }
    None
}

/// Routes `event` to the nearest handler of `kind` on the ancestor chain of
/// `root`. Returns the entity that handled it; `None` means nothing wanted
/// the event and it was dropped.
pub fn execute_hierarchy<T: HandlerTree + ?Sized>(
    tree: &mut T,
    root: EntityId,
    kind: PointerEventKind,
    event: &FakeInputEvent,
    max_depth: usize,
) -> Option<EntityId> {
    let handler = find_handler(tree, root, kind, max_depth);
    match handler {
        Some(entity) => {
            tree.invoke(entity, kind, event);
            trace!(root = ?root, handler = ?entity, ?kind, "pointer_event_handled");
        }
        None => trace!(root = ?root, ?kind, "pointer_event_dropped"),
    }
    handler
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::events::HandlerSet;
    use crate::geometry::ScreenPoint;

    #[derive(Default)]
    struct Chain {
        parents: HashMap<EntityId, EntityId>,
        handlers: HashMap<EntityId, HandlerSet>,
        invoked: Vec<(EntityId, PointerEventKind)>,
    }

    impl HandlerTree for Chain {
        fn parent(&self, entity: EntityId) -> Option<EntityId> {
            self.parents.get(&entity).copied()
        }

        fn supports(&self, entity: EntityId, kind: PointerEventKind) -> bool {
            self.handlers
                .get(&entity)
                .is_some_and(|set| set.supports(kind))
        }

        fn invoke(&mut self, entity: EntityId, kind: PointerEventKind, _event: &FakeInputEvent) {
            self.invoked.push((entity, kind));
        }
    }

    fn linear_chain(len: u64) -> Chain {
        let mut chain = Chain::default();
        for id in 1..len {
            chain.parents.insert(EntityId(id), EntityId(id - 1));
        }
        chain
    }

    fn event() -> FakeInputEvent {
        FakeInputEvent::primary_at(ScreenPoint::new(1.0, 1.0))
    }

    #[test]
    fn root_handles_its_own_event() {
        let mut chain = linear_chain(3);
        chain
            .handlers
            .insert(EntityId(2), HandlerSet::empty().with(PointerEventKind::Down));
        chain
            .handlers
            .insert(EntityId(0), HandlerSet::empty().with(PointerEventKind::Down));

        let handled = execute_hierarchy(
            &mut chain,
            EntityId(2),
            PointerEventKind::Down,
            &event(),
            DEFAULT_MAX_HANDLER_DEPTH,
        );
        assert_eq!(handled, Some(EntityId(2)));
        assert_eq!(chain.invoked, vec![(EntityId(2), PointerEventKind::Down)]);
    }

    #[test]
    fn event_bubbles_to_nearest_ancestor() {
        let mut chain = linear_chain(4);
        chain
            .handlers
            .insert(EntityId(1), HandlerSet::empty().with(PointerEventKind::Click));
        chain
            .handlers
            .insert(EntityId(0), HandlerSet::all());

        let handled = execute_hierarchy(
            &mut chain,
            EntityId(3),
            PointerEventKind::Click,
            &event(),
            DEFAULT_MAX_HANDLER_DEPTH,
        );
        assert_eq!(handled, Some(EntityId(1)));
    }

    #[test]
    fn unhandled_event_is_dropped_without_invocation() {
        let mut chain = linear_chain(3);
        chain
            .handlers
            .insert(EntityId(1), HandlerSet::empty().with(PointerEventKind::Up));

        let handled = execute_hierarchy(
            &mut chain,
            EntityId(2),
            PointerEventKind::Down,
            &event(),
            DEFAULT_MAX_HANDLER_DEPTH,
        );
        assert_eq!(handled, None);
        assert!(chain.invoked.is_empty());
    }

    #[test]
    fn walk_stops_at_depth_bound() {
        let mut chain = linear_chain(10);
        chain.handlers.insert(EntityId(0), HandlerSet::all());

        assert_eq!(
            find_handler(&chain, EntityId(9), PointerEventKind::Down, 10),
            Some(EntityId(0))
        );
        assert_eq!(
            find_handler(&chain, EntityId(9), PointerEventKind::Down, 9),
            None
        );
    }

    #[test]
    fn cyclic_parent_links_terminate() {
        let mut chain = Chain::default();
        chain.parents.insert(EntityId(0), EntityId(1));
        chain.parents.insert(EntityId(1), EntityId(0));

        assert_eq!(
            find_handler(&chain, EntityId(0), PointerEventKind::Down, 16),
            None
        );
    }
}
