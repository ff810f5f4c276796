// Render Surface - what the UI shows for the current position

use crate::domain::{Lead, QueueItem};

#[derive(Debug, Clone, PartialEq)]
pub enum FocusView {
    /// Every item has been worked through
    Finished,
    /// No current item (empty queue, failed load, or unknown start id)
    Empty,
    /// Associated record lookup in progress
    Loading { item: QueueItem },
    /// Current item has no associated record
    NoAssociatedRecord { item: QueueItem },
    /// Details plus the logging form
    Ready { item: QueueItem, lead: Lead },
}

/// Pure mapping from session state to a view. Never fetches.
pub fn render(
    item: Option<QueueItem>,
    lead: Option<Lead>,
    loading: bool,
    finished: bool,
) -> FocusView {
    if finished {
        return FocusView::Finished;
    }
    match (item, lead) {
        (None, _) => FocusView::Empty,
        (Some(item), Some(lead)) => FocusView::Ready { item, lead },
        (Some(item), None) if loading => FocusView::Loading { item },
        (Some(item), None) => FocusView::NoAssociatedRecord { item },
    }
}
