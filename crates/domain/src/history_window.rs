//! Prompt window selection over the history log.
//!
//! The log grows without bound but only `max_posts` entries may be sent to the
//! model. Once the log outgrows the window, the oldest entries of the window
//! are summarised into cards ("compaction") and the rollback watermark moves
//! up to the first entry that still fits the window.

use crate::entities::HistoryEntry;
use crate::ids::HistoryEntryId;

/// Window sizes, already normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    max_posts: usize,
    tail_posts: usize,
}

impl HistoryLimits {
    pub const DEFAULT_MAX_POSTS: i64 = 40;
    pub const DEFAULT_TAIL_POSTS: i64 = 10;

    /// `max_posts` is floored at 1 and `tail_posts` clamped into
    /// `0..=max_posts`.
    pub fn new(max_posts: i64, tail_posts: i64) -> Self {
        let max_posts = max_posts.max(1);
        let tail_posts = tail_posts.clamp(0, max_posts);
        Self {
            max_posts: usize::try_from(max_posts).unwrap_or(usize::MAX),
            tail_posts: usize::try_from(tail_posts).unwrap_or(usize::MAX),
        }
    }

    pub fn max_posts(&self) -> usize {
        self.max_posts
    }

    pub fn tail_posts(&self) -> usize {
        self.tail_posts
    }

    pub fn compaction_enabled(&self) -> bool {
        self.tail_posts > 0
    }
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_POSTS, Self::DEFAULT_TAIL_POSTS)
    }
}

/// What to do with the history before rendering a prompt.
///
/// All offsets index into the id-ordered history the plan was computed from,
/// and every window is a suffix of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPlan {
    /// Send `history[start..]` without calling the model.
    Verbatim { start: usize },
    /// Summarise `history[tail_start..]` into cards, move the watermark to
    /// `cutoff`, then send `history[window_start..]`.
    Compact {
        cutoff: HistoryEntryId,
        tail_start: usize,
        window_start: usize,
    },
}

impl WindowPlan {
    /// The entries that go into the prompt under this plan, whether or not
    /// compaction succeeds.
    pub fn window<'a>(&self, history: &'a [HistoryEntry]) -> &'a [HistoryEntry] {
        let start = match *self {
            Self::Verbatim { start } => start,
            Self::Compact { window_start, .. } => window_start,
        };
        history.get(start..).unwrap_or_default()
    }

    pub fn tail<'a>(&self, history: &'a [HistoryEntry]) -> &'a [HistoryEntry] {
        match *self {
            Self::Verbatim { .. } => &[],
            Self::Compact { tail_start, .. } => history.get(tail_start..).unwrap_or_default(),
        }
    }
}

/// Decides how to bring `history` (ordered by id ascending) within `limits`.
///
/// At most one compaction is planned per call; a log that is several windows
/// behind catches up one window per turn.
pub fn plan_window(
    history: &[HistoryEntry],
    floor: Option<HistoryEntryId>,
    limits: HistoryLimits,
) -> WindowPlan {
    let total = history.len();
    let max_posts = limits.max_posts();

    if total <= max_posts {
        return WindowPlan::Verbatim { start: 0 };
    }
    let window_start = total - max_posts;
    if !limits.compaction_enabled() {
        return WindowPlan::Verbatim {
            start: window_start,
        };
    }
    if let Some(floor) = floor {
        let start = history.partition_point(|entry| entry.id < floor);
        if total - start <= max_posts {
            return WindowPlan::Verbatim { start };
        }
    }

    WindowPlan::Compact {
        cutoff: history[window_start].id,
        tail_start: total.saturating_sub(limits.tail_posts()),
        window_start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::HistoryRole;
    use crate::ids::AdventureId;
    use chrono::Utc;
    use serde_json::Map;

    fn history(ids: impl IntoIterator<Item = i64>) -> Vec<HistoryEntry> {
        ids.into_iter()
            .map(|id| HistoryEntry {
                id: HistoryEntryId::new(id),
                adventure_id: AdventureId::new(1),
                role: if id % 2 == 0 {
                    HistoryRole::Ai
                } else {
                    HistoryRole::User
                },
                content: format!("post {id}"),
                metadata: Map::new(),
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn limits_are_normalised() {
        let limits = HistoryLimits::new(0, 5);
        assert_eq!(limits.max_posts(), 1);
        assert_eq!(limits.tail_posts(), 1);

        let limits = HistoryLimits::new(10, -3);
        assert_eq!(limits.tail_posts(), 0);
        assert!(!limits.compaction_enabled());

        let limits = HistoryLimits::default();
        assert_eq!((limits.max_posts(), limits.tail_posts()), (40, 10));
    }

    #[test]
    fn short_history_is_sent_verbatim() {
        let entries = history(1..=5);
        let plan = plan_window(&entries, None, HistoryLimits::new(5, 2));
        assert_eq!(plan, WindowPlan::Verbatim { start: 0 });
        assert_eq!(plan.window(&entries).len(), 5);
    }

    #[test]
    fn disabled_compaction_keeps_latest_posts() {
        let entries = history(1..=12);
        let plan = plan_window(&entries, None, HistoryLimits::new(5, 0));
        let window = plan.window(&entries);
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].id, HistoryEntryId::new(8));
    }

    #[test]
    fn existing_watermark_avoids_recompaction() {
        let entries = history(1..=7);
        let plan = plan_window(
            &entries,
            Some(HistoryEntryId::new(3)),
            HistoryLimits::new(5, 2),
        );
        assert_eq!(plan, WindowPlan::Verbatim { start: 2 });
        assert_eq!(plan.window(&entries)[0].id, HistoryEntryId::new(3));
    }

    #[test]
    fn overflow_plans_a_single_compaction() {
        let entries = history(1..=9);
        let plan = plan_window(
            &entries,
            Some(HistoryEntryId::new(2)),
            HistoryLimits::new(5, 2),
        );
        assert_eq!(
            plan,
            WindowPlan::Compact {
                cutoff: HistoryEntryId::new(5),
                tail_start: 7,
                window_start: 4,
            }
        );
        let tail: Vec<_> = plan.tail(&entries).iter().map(|e| e.id.get()).collect();
        assert_eq!(tail, vec![8, 9]);
    }

    #[test]
    fn window_never_exceeds_max_posts() {
        let limits = HistoryLimits::new(4, 2);
        for len in 0..30 {
            let entries = history(1..=len);
            for floor in [None, Some(HistoryEntryId::new(len / 2))] {
                let plan = plan_window(&entries, floor, limits);
                assert!(plan.window(&entries).len() <= 4, "len={len} floor={floor:?}");
            }
        }
    }

    #[test]
    fn sparse_ids_use_order_not_values() {
        let entries = history([3, 10, 11, 40, 41, 42, 90]);
        let plan = plan_window(
            &entries,
            Some(HistoryEntryId::new(12)),
            HistoryLimits::new(4, 1),
        );
        assert_eq!(plan, WindowPlan::Verbatim { start: 3 });
    }
}
