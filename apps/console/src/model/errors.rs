use crate::models::{ErrorRecord, StatusSnapshot};

pub const PAGE_SIZE: usize = 10;

/// 后端下发的完整错误列表，客户端不修改、不去重。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorLog {
    records: Vec<ErrorRecord>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorPage {
    pub rows: Vec<ErrorRecord>,
    /// 1 起始，已夹到有效范围内
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

impl ErrorLog {
    pub fn replace(&mut self, records: Vec<ErrorRecord>) {
        self.records = records;
    }

    /// 按节点精确过滤后按时间倒序；同一时间保持到达顺序。
    pub fn filtered(&self, node: Option<&str>) -> Vec<&ErrorRecord> {
        let mut rows: Vec<&ErrorRecord> = self
            .records
            .iter()
            .filter(|record| node.map_or(true, |node| record.node == node))
            .collect();
        rows.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));
        rows
    }

    pub fn page(&self, node: Option<&str>, requested: usize) -> ErrorPage {
        let rows = self.filtered(node);
        let total = rows.len();
        let page_count = page_count(total, PAGE_SIZE);
        let page = clamp_page(requested, page_count);
        let start = (page - 1) * PAGE_SIZE;
        ErrorPage {
            rows: rows
                .into_iter()
                .skip(start)
                .take(PAGE_SIZE)
                .cloned()
                .collect(),
            page,
            page_count,
            total,
        }
    }
}

pub fn page_count(filtered: usize, page_size: usize) -> usize {
    filtered.div_ceil(page_size.max(1))
}

/// 越界的页码夹到 `[1, max(page_count, 1)]`，不拒绝。
pub fn clamp_page(requested: usize, page_count: usize) -> usize {
    requested.clamp(1, page_count.max(1))
}

/// 下拉框选项：当前快照中的节点名，按到达顺序。
pub fn filter_options(snapshot: &StatusSnapshot) -> Vec<String> {
    snapshot.names().map(str::to_string).collect()
}

/// 之前选中的节点已不存在时回到“全部”。
pub fn retain_filter(current: Option<&str>, options: &[String]) -> Option<String> {
    current
        .filter(|node| options.iter().any(|option| option == node))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(node: &str, task: usize, timestamp: f64) -> ErrorRecord {
        ErrorRecord {
            error: format!("TaskError({task})"),
            node: node.to_string(),
            task_id: format!("task_{task:03}"),
            timestamp,
        }
    }

    /// 23 条记录，其中 Processor 7 条。
    fn sample_log() -> ErrorLog {
        let mut log = ErrorLog::default();
        let records = (0..23)
            .map(|i| {
                let node = if i % 3 == 0 && i < 21 { "Processor" } else { "Root" };
                record(node, i, 1_000.0 + i as f64)
            })
            .collect();
        log.replace(records);
        log
    }

    #[test]
    fn pages_are_full_then_remainder() {
        let log = sample_log();
        let first = log.page(None, 1);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.rows.len(), 10);
        assert_eq!(first.rows[0].task_id, "task_022");
        let last = log.page(None, 3);
        assert_eq!(last.rows.len(), 3);
        assert!(last
            .rows
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    }

    #[test]
    fn filter_shrinks_page_count_and_clamps() {
        let log = sample_log();
        let k = log.filtered(Some("Processor")).len();
        assert_eq!(k, 7);
        let page = log.page(Some("Processor"), 99);
        assert_eq!(page.page_count, k.div_ceil(PAGE_SIZE));
        assert_eq!(page.page, 1);
        assert!(page.rows.iter().all(|row| row.node == "Processor"));
        assert_eq!(page.rows.len(), 7);
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let log = sample_log();
        assert_eq!(log.page(None, 99).page, 3);
        assert_eq!(log.page(None, 0).page, 1);
    }

    #[test]
    fn empty_log_points_at_page_one() {
        let log = ErrorLog::default();
        let page = log.page(Some("ghost"), 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_count, 0);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn ties_keep_arrival_order() {
        let mut log = ErrorLog::default();
        log.replace(vec![
            record("A", 1, 5.0),
            record("A", 2, 9.0),
            record("A", 3, 5.0),
            record("A", 4, 5.0),
        ]);
        let ids: Vec<&str> = log
            .filtered(None)
            .iter()
            .map(|row| row.task_id.as_str())
            .collect();
        assert_eq!(ids, vec!["task_002", "task_001", "task_003", "task_004"]);
    }

    #[test]
    fn filter_resets_when_node_disappears() {
        let snapshot: StatusSnapshot =
            serde_json::from_value(json!({"Root": {}, "Processor": {}})).unwrap();
        let options = filter_options(&snapshot);
        assert_eq!(options, vec!["Root", "Processor"]);
        assert_eq!(
            retain_filter(Some("Processor"), &options).as_deref(),
            Some("Processor")
        );
        assert_eq!(retain_filter(Some("Gone"), &options), None);
        assert_eq!(retain_filter(None, &options), None);
    }
}
