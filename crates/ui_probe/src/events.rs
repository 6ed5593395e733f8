use serde::{Deserialize, Serialize};

use crate::geometry::ScreenPoint;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerEventKind {
    Down,
    Up,
    Click,
}

const EVENT_KIND_COUNT: usize = 3;

impl PointerEventKind {
    pub const ALL: [PointerEventKind; EVENT_KIND_COUNT] = [
        PointerEventKind::Down,
        PointerEventKind::Up,
        PointerEventKind::Click,
    ];

    const fn index(self) -> usize {
        match self {
            PointerEventKind::Down => 0,
            PointerEventKind::Up => 1,
            PointerEventKind::Click => 2,
        }
    }
}

/// Synthetic pointer event shared by the down, up and click steps of one
/// simulated click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FakeInputEvent {
    pub position: ScreenPoint,
    pub button: PointerButton,
}

impl FakeInputEvent {
    pub fn primary_at(position: ScreenPoint) -> Self {
        Self {
            position,
            button: PointerButton::Primary,
        }
    }
}

/// Which pointer handlers an entity implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerSet {
    supported: [bool; EVENT_KIND_COUNT],
}

impl HandlerSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            supported: [true; EVENT_KIND_COUNT],
        }
    }

    pub fn with(mut self, kind: PointerEventKind) -> Self {
        self.set(kind, true);
        self
    }

    pub fn set(&mut self, kind: PointerEventKind, supported: bool) {
        self.supported[kind.index()] = supported;
    }

    pub fn supports(&self, kind: PointerEventKind) -> bool {
        self.supported[kind.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.supported.iter().all(|supported| !supported)
    }
}

impl FromIterator<PointerEventKind> for HandlerSet {
    fn from_iter<I: IntoIterator<Item = PointerEventKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), HandlerSet::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_set_tracks_each_kind_independently() {
        let set = HandlerSet::empty().with(PointerEventKind::Click);
        assert!(set.supports(PointerEventKind::Click));
        assert!(!set.supports(PointerEventKind::Down));
        assert!(!set.supports(PointerEventKind::Up));
        assert!(!set.is_empty());
        assert!(HandlerSet::empty().is_empty());
    }

    #[test]
    fn handler_set_collects_from_kinds() {
        let set: HandlerSet = [PointerEventKind::Down, PointerEventKind::Up]
            .into_iter()
            .collect();
        assert!(set.supports(PointerEventKind::Down));
        assert!(set.supports(PointerEventKind::Up));
        assert!(!set.supports(PointerEventKind::Click));
        assert_eq!(
            PointerEventKind::ALL.into_iter().collect::<HandlerSet>(),
            HandlerSet::all()
        );
    }

    #[test]
    fn fake_event_defaults_to_primary_button() {
        let event = FakeInputEvent::primary_at(ScreenPoint::new(3.0, 4.0));
        assert_eq!(event.button, PointerButton::Primary);
        assert_eq!(event.position, ScreenPoint::new(3.0, 4.0));
    }
}
