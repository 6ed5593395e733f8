use std::cmp::Ordering;

use tracing::debug;

use super::candidate::{Candidate, EntityId, HitTestHost, RoutingModule};
use crate::geometry::ScreenPoint;

/// Orders two candidates so that the one more in front comes first
/// (`Ordering::Less`).
///
/// Precedence:
/// 1. different routing modules: camera depth (only when both modules have a
///    camera), then sort-order priority, then render-order priority, all
///    greater-first; candidates from the same module skip straight to 2.
/// 2. sorting-layer ordinal, higher first.
/// 3. sorting order, greater first.
/// 4. render depth, greater first.
/// 5. distance from the viewer, smaller first.
/// 6. discovery index, smaller first.
pub fn compare_candidates<H: HitTestHost>(
    host: &H,
    lhs: &Candidate<H::Module>,
    rhs: &Candidate<H::Module>,
) -> Ordering {
    compare_with_layer_values(
        lhs,
        host.sorting_layer_value(lhs.sorting_layer),
        rhs,
        host.sorting_layer_value(rhs.sorting_layer),
    )
}

fn compare_with_layer_values<M: RoutingModule>(
    lhs: &Candidate<M>,
    lhs_layer_value: i32,
    rhs: &Candidate<M>,
    rhs_layer_value: i32,
) -> Ordering {
    compare_modules(&lhs.module, &rhs.module)
        .then_with(|| rhs_layer_value.cmp(&lhs_layer_value))
        .then_with(|| rhs.sorting_order.cmp(&lhs.sorting_order))
        .then_with(|| rhs.depth.cmp(&lhs.depth))
        .then_with(|| lhs.distance.total_cmp(&rhs.distance))
        .then_with(|| lhs.index.cmp(&rhs.index))
}

// An inconclusive module comparison falls through to the layer rules exactly
// like a same-module pair does.
fn compare_modules<M: RoutingModule>(lhs: &M, rhs: &M) -> Ordering {
    if lhs.module_id() == rhs.module_id() {
        return Ordering::Equal;
    }

    if let (Some(lhs_depth), Some(rhs_depth)) = (lhs.camera_depth(), rhs.camera_depth()) {
        let by_depth = rhs_depth.total_cmp(&lhs_depth);
        if by_depth != Ordering::Equal {
            return by_depth;
        }
    }

    rhs.sort_order_priority()
        .cmp(&lhs.sort_order_priority())
        .then_with(|| rhs.render_order_priority().cmp(&lhs.render_order_priority()))
}

/// Sorts `candidates` front to back with a stable merge sort.
///
/// Camera depth only orders pairs whose modules both have a camera, so a set
/// mixing camera and camera-less modules can contain cycles. The merge sort
/// accepts that and yields the same order for the same input.
pub fn sort_candidates<H: HitTestHost>(
    host: &H,
    candidates: Vec<Candidate<H::Module>>,
) -> Vec<Candidate<H::Module>> {
    let keyed = candidates
        .into_iter()
        .map(|candidate| (host.sorting_layer_value(candidate.sorting_layer), candidate))
        .collect::<Vec<_>>();
    let mut compare = |lhs: &(i32, Candidate<H::Module>), rhs: &(i32, Candidate<H::Module>)| {
        compare_with_layer_values(&lhs.1, lhs.0, &rhs.1, rhs.0)
    };
    merge_sort_by(keyed, &mut compare)
        .into_iter()
        .map(|(_, candidate)| candidate)
        .collect()
}

fn merge_sort_by<T, F>(mut items: Vec<T>, compare: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort_by(items, compare);
    let right = merge_sort_by(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        // Ties keep the left element first.
        let take_right = match (left.peek(), right.peek()) {
            (Some(lhs), Some(rhs)) => compare(rhs, lhs) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        merged.extend(if take_right { right.next() } else { left.next() });
    }
    merged
}

/// All candidates at `point`, front to back.
pub fn ranked_candidates<H: HitTestHost>(
    host: &H,
    point: ScreenPoint,
) -> Vec<Candidate<H::Module>> {
    sort_candidates(host, host.raycast_all(point))
}

/// The entity that should receive pointer events at `point`, skipping
/// candidates whose entity was destroyed after the raycast. `None` means
/// nothing is there, which is a valid outcome.
pub fn resolve_topmost<H: HitTestHost>(host: &H, point: ScreenPoint) -> Option<EntityId> {
    let ranked = ranked_candidates(host, point);
    let winner = ranked
        .iter()
        .map(|candidate| candidate.entity)
        .find(|entity| host.is_alive(*entity));
    debug!(
        x = point.x,
        y = point.y,
        candidate_count = ranked.len(),
        winner = ?winner,
        "hit_test_resolved"
    );
    winner
}
