use serde::{Deserialize, Serialize};

use crate::models::{StageStatus, StatusSnapshot};

/// 所有节点计数的合计，每次 `replace` 重新计算。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub successed: u64,
    pub processed: u64,
    pub pending: u64,
    pub failed: u64,
    pub duplicated: u64,
    pub active: usize,
    pub total_nodes: usize,
}

impl StatusSummary {
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        snapshot
            .iter()
            .fold(Self::default(), |mut summary, (_, status)| {
                summary.successed += status.tasks_successed;
                summary.processed += status.tasks_processed;
                summary.pending += status.tasks_pending;
                summary.failed += status.tasks_failed;
                summary.duplicated += status.tasks_duplicated;
                if status.status == StageStatus::Running {
                    summary.active += 1;
                }
                summary.total_nodes += 1;
                summary
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusModel {
    snapshot: StatusSnapshot,
    summary: StatusSummary,
}

impl StatusModel {
    /// 整体替换，不合并、不保留旧键。
    pub fn replace(&mut self, snapshot: StatusSnapshot) {
        self.summary = StatusSummary::from_snapshot(&snapshot);
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    pub fn summary(&self) -> &StatusSummary {
        &self.summary
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> StatusSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn summary_sums_counters_and_counts_running() {
        let mut model = StatusModel::default();
        model.replace(snapshot(json!({
            "A": {"status": 1, "tasks_processed": 8, "tasks_pending": 2},
            "B": {"status": 2, "tasks_processed": 10, "tasks_pending": 0},
        })));
        let summary = model.summary();
        assert_eq!(summary.processed, 18);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.total_nodes, 2);
    }

    #[test]
    fn replace_drops_absent_nodes() {
        let mut model = StatusModel::default();
        model.replace(snapshot(json!({"A": {"status": 1}, "B": {"status": 1}})));
        model.replace(snapshot(json!({"B": {"status": 0, "tasks_failed": 3}})));
        assert!(model.snapshot().get("A").is_none());
        assert_eq!(model.snapshot().names().collect::<Vec<_>>(), vec!["B"]);
        assert_eq!(model.summary().active, 0);
        assert_eq!(model.summary().failed, 3);
    }

    #[test]
    fn replacing_with_identical_snapshot_is_idempotent() {
        let data = snapshot(json!({"A": {"status": 1, "tasks_processed": 4}}));
        let mut model = StatusModel::default();
        model.replace(data.clone());
        let first = model.summary().clone();
        model.replace(data);
        assert_eq!(&first, model.summary());
    }
}
