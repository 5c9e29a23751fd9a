// ── Top-N ranking ──

use crate::model::{IpHit, TopBlock};

/// A row that can be ranked by a single count.
pub trait Ranked {
    fn rank_count(&self) -> u64;
}

impl Ranked for TopBlock {
    fn rank_count(&self) -> u64 {
        self.count
    }
}

impl Ranked for IpHit {
    fn rank_count(&self) -> u64 {
        self.request_count
    }
}

/// Keep the `limit` highest-count rows, count descending.
///
/// The sort is stable, so ties keep the order the server returned them in.
pub fn rank<T: Ranked>(mut rows: Vec<T>, limit: usize) -> Vec<T> {
    rows.sort_by(|a, b| b.rank_count().cmp(&a.rank_count()));
    rows.truncate(limit);
    rows
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row(&'static str, u64);

    impl Ranked for Row {
        fn rank_count(&self) -> u64 {
            self.1
        }
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let rows = vec![Row("a", 3), Row("b", 10), Row("c", 1), Row("d", 7)];
        assert_eq!(rank(rows, 2), vec![Row("b", 10), Row("d", 7)]);
    }

    #[test]
    fn ties_keep_server_order() {
        let rows = vec![
            Row("first", 5),
            Row("big", 9),
            Row("second", 5),
            Row("third", 5),
        ];
        assert_eq!(
            rank(rows, 10),
            vec![
                Row("big", 9),
                Row("first", 5),
                Row("second", 5),
                Row("third", 5)
            ]
        );
    }

    #[test]
    fn never_returns_more_than_limit() {
        for limit in 0..6 {
            let rows: Vec<Row> = (0..4).map(|i| Row("r", i)).collect();
            let ranked = rank(rows, limit);
            assert!(ranked.len() <= limit);
            assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }
}
