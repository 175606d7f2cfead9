use std::collections::{BTreeMap, BTreeSet};

use async_graphql::{Enum, SimpleObject};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum NavigatorStatus {
    NotVisited,
    NotAnswered,
    Answered,
    MarkedOnly,
    AnsweredAndMarked,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, SimpleObject)]
pub struct NavigatorCell {
    pub index: u32,
    pub status: NavigatorStatus,
    pub is_current: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, SimpleObject)]
pub struct NavigatorCounts {
    pub not_visited: u32,
    pub not_answered: u32,
    pub answered: u32,
    pub marked_only: u32,
    pub answered_and_marked: u32,
}

impl NavigatorCounts {
    pub fn total(&self) -> u32 {
        self.not_visited
            + self.not_answered
            + self.answered
            + self.marked_only
            + self.answered_and_marked
    }

    fn bump(&mut self, status: NavigatorStatus) {
        match status {
            NavigatorStatus::NotVisited => self.not_visited += 1,
            NavigatorStatus::NotAnswered => self.not_answered += 1,
            NavigatorStatus::Answered => self.answered += 1,
            NavigatorStatus::MarkedOnly => self.marked_only += 1,
            NavigatorStatus::AnsweredAndMarked => self.answered_and_marked += 1,
        }
    }
}

/// Progress grid over a session. Recomputed from scratch on every read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, SimpleObject)]
pub struct NavigatorView {
    pub total_questions: u32,
    pub current_index: u32,
    pub cells: Vec<NavigatorCell>,
    pub counts: NavigatorCounts,
}

pub fn classify(
    index: usize,
    answers: &BTreeMap<usize, usize>,
    marked_for_review: &BTreeSet<usize>,
    visited: &BTreeSet<usize>,
) -> NavigatorStatus {
    match (
        answers.contains_key(&index),
        marked_for_review.contains(&index),
    ) {
        (true, true) => NavigatorStatus::AnsweredAndMarked,
        (true, false) => NavigatorStatus::Answered,
        (false, true) => NavigatorStatus::MarkedOnly,
        (false, false) if visited.contains(&index) => NavigatorStatus::NotAnswered,
        (false, false) => NavigatorStatus::NotVisited,
    }
}

pub fn build_navigator(
    total_questions: usize,
    answers: &BTreeMap<usize, usize>,
    marked_for_review: &BTreeSet<usize>,
    visited: &BTreeSet<usize>,
    current_index: usize,
) -> NavigatorView {
    let mut counts = NavigatorCounts::default();
    let cells = (0..total_questions)
        .map(|index| {
            let status = classify(index, answers, marked_for_review, visited);
            counts.bump(status);
            NavigatorCell {
                index: index as u32,
                status,
                is_current: index == current_index,
            }
        })
        .collect();

    NavigatorView {
        total_questions: total_questions as u32,
        current_index: current_index as u32,
        cells,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_covers_every_category() {
        let answers = BTreeMap::from([(1, 2), (3, 0)]);
        let marked = BTreeSet::from([3, 4]);
        let visited = BTreeSet::from([0, 1, 3]);

        let view = build_navigator(6, &answers, &marked, &visited, 1);
        let statuses: Vec<NavigatorStatus> = view.cells.iter().map(|c| c.status).collect();

        assert_eq!(
            statuses,
            vec![
                NavigatorStatus::NotAnswered,
                NavigatorStatus::Answered,
                NavigatorStatus::NotVisited,
                NavigatorStatus::AnsweredAndMarked,
                NavigatorStatus::MarkedOnly,
                NavigatorStatus::NotVisited,
            ]
        );
        assert!(view.cells[1].is_current);
        assert_eq!(view.cells.iter().filter(|c| c.is_current).count(), 1);
    }

    #[test]
    fn counts_always_sum_to_total() {
        let answers = BTreeMap::from([(0, 1), (2, 3), (7, 0)]);
        let marked = BTreeSet::from([2, 5, 9]);
        let visited = BTreeSet::from([0, 1, 2, 3, 7]);

        let view = build_navigator(10, &answers, &marked, &visited, 0);

        assert_eq!(view.counts.total(), 10);
        assert_eq!(view.counts.answered, 2);
        assert_eq!(view.counts.answered_and_marked, 1);
        assert_eq!(view.counts.marked_only, 2);
        assert_eq!(view.counts.not_answered, 2);
        assert_eq!(view.counts.not_visited, 3);
    }

    #[test]
    fn empty_session_is_all_not_visited() {
        let view = build_navigator(15, &BTreeMap::new(), &BTreeSet::new(), &BTreeSet::new(), 0);

        assert_eq!(view.counts.not_visited, 15);
        assert_eq!(view.counts.total(), view.total_questions);
    }
}
