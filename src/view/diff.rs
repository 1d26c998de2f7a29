//! Turning a before/after visibility snapshot of an updated row range into
//! scoped view events.
//!
//! Each backing row in the range is classified into a [`RowAction`]. Rows
//! invisible both before and after drop out, the rest are run-length encoded
//! front to back, and the runs must fit `[Update] [Insert | Delete] [Update]`
//! with every part optional. Anything else, including a mix of inserts and
//! deletes, cannot be expressed as contiguous position ranges and becomes a
//! single [`ViewEvent::Reset`].

use roaring::RoaringBitmap;
use smallvec::{smallvec, SmallVec};

use super::{ColumnScope, ViewChanges, ViewEvent};

/// What happened to one backing row's visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    /// Visible before and after.
    Update,
    /// Newly visible.
    Insert,
    /// Newly hidden.
    Delete,
    /// Hidden before and after.
    None,
}

impl RowAction {
    pub fn classify(was_visible: bool, is_visible: bool) -> Self {
        match (was_visible, is_visible) {
            (true, true) => RowAction::Update,
            (false, true) => RowAction::Insert,
            (true, false) => RowAction::Delete,
            (false, false) => RowAction::None,
        }
    }
}

type Runs = SmallVec<[(RowAction, usize); 4]>;

/// Run-length encode `actions`, skipping [`RowAction::None`].
pub fn runs<It>(actions: It) -> Runs
where
    It: IntoIterator<Item = RowAction>,
{
    let mut runs = Runs::new();
    for action in actions {
        if action == RowAction::None {
            continue;
        }
        match runs.last_mut() {
            Some((last, len)) if *last == action => *len += 1,
            _ => runs.push((action, 1)),
        }
    }
    runs
}

/// The accepted three-part decomposition of a run list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateShape {
    pub leading: usize,
    pub structural: Option<(RowAction, usize)>,
    pub trailing: usize,
}

impl UpdateShape {
    /// `None` when the runs do not fit the accepted pattern.
    pub fn from_runs(runs: &[(RowAction, usize)]) -> Option<Self> {
        let mut shape = UpdateShape::default();
        let mut rest = runs;
        if let [(RowAction::Update, n), tail @ ..] = rest {
            shape.leading = *n;
            rest = tail;
        }
        if let [(action @ (RowAction::Insert | RowAction::Delete), n), tail @ ..] = rest {
            shape.structural = Some((*action, *n));
            rest = tail;
        }
        if shape.structural.is_some() {
            if let [(RowAction::Update, n), tail @ ..] = rest {
                shape.trailing = *n;
                rest = tail;
            }
        }
        rest.is_empty().then_some(shape)
    }
}

/// Position of backing row `row` among `row_map`, or the position it would
/// take if it were visible.
pub fn position_of(row_map: &[usize], row: usize) -> usize {
    match row_map.binary_search(&row) {
        Ok(pos) | Err(pos) => pos,
    }
}

/// Number of rows in `first..=last` set in `bitmap`.
pub fn visible_in_range(bitmap: &RoaringBitmap, first: usize, last: usize) -> usize {
    (first..=last)
        .filter(|&row| u32::try_from(row).is_ok_and(|row| bitmap.contains(row)))
        .count()
}

/// Events describing how the backing rows `first..=last` moved from `old` to
/// `new` visibility. `old_row_map` is the view's row map before the change.
pub fn events_for_update(
    old: &RoaringBitmap,
    new: &RoaringBitmap,
    old_row_map: &[usize],
    first: usize,
    last: usize,
    column: ColumnScope,
) -> ViewChanges {
    let actions = (first..=last).map(|row| {
        let row = u32::try_from(row).ok();
        let was = row.is_some_and(|r| old.contains(r));
        let is = row.is_some_and(|r| new.contains(r));
        RowAction::classify(was, is)
    });
    let runs = runs(actions);
    let Some(shape) = UpdateShape::from_runs(&runs) else {
        log::debug!(
            "rows {first}..={last}: {} runs do not form a contiguous change, resetting",
            runs.len()
        );
        return smallvec![ViewEvent::Reset];
    };

    let start = position_of(old_row_map, first);
    let mut events = ViewChanges::new();
    if shape.leading > 0 {
        events.push(ViewEvent::CellsUpdated {
            first: start,
            last: start + shape.leading - 1,
            column,
        });
    }
    let mut next = start + shape.leading;
    if let Some((action, n)) = shape.structural {
        let (first, last) = (next, next + n - 1);
        if action == RowAction::Insert {
            events.push(ViewEvent::RowsInserted { first, last });
            next += n;
        } else {
            events.push(ViewEvent::RowsDeleted { first, last });
        }
    }
    if shape.trailing > 0 {
        events.push(ViewEvent::CellsUpdated {
            first: next,
            last: next + shape.trailing - 1,
            column,
        });
    }
    events
}
