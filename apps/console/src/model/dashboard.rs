use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::format::{format_time_value, DeltaText};
use crate::models::{NodeStatus, StageStatus, StatusSnapshot};

/// 进度分子的取法，整个界面统一使用同一种。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBasis {
    /// `tasks_processed / (tasks_processed + tasks_pending)`
    #[default]
    Processed,
    /// `(tasks_processed + tasks_failed) / (tasks_processed + tasks_failed + tasks_pending)`
    ProcessedPlusFailed,
}

impl ProgressBasis {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "processed" => Some(Self::Processed),
            "processed_plus_failed" | "processed+failed" => Some(Self::ProcessedPlusFailed),
            _ => None,
        }
    }
}

/// 向下取整的百分比；分母为零时为 0。
pub fn progress_percent(status: &NodeStatus, basis: ProgressBasis) -> u8 {
    let done = match basis {
        ProgressBasis::Processed => status.tasks_processed as u128,
        ProgressBasis::ProcessedPlusFailed => {
            status.tasks_processed as u128 + status.tasks_failed as u128
        }
    };
    let total = done + status.tasks_pending as u128;
    if total == 0 {
        return 0;
    }
    (done * 100 / total).min(100) as u8
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Badge {
    Inactive,
    Running,
    Completed,
}

impl Badge {
    pub fn from_status(status: StageStatus) -> Self {
        match status {
            StageStatus::NotRunning => Self::Inactive,
            StageStatus::Running => Self::Running,
            StageStatus::Stopped => Self::Completed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Inactive => "未运行",
            Self::Running => "运行中",
            Self::Completed => "已停止",
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Inactive => "badge badge-inactive",
            Self::Running => "badge badge-running",
            Self::Completed => "badge badge-completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CardView {
    pub name: String,
    pub badge: Badge,
    pub successed: DeltaText,
    pub pending: DeltaText,
    pub failed: DeltaText,
    pub duplicated: DeltaText,
    pub stage_mode: String,
    pub execution_mode: String,
    pub start_time: String,
    pub elapsed: String,
    pub remaining: String,
    pub avg_time: String,
    pub progress: u8,
}

impl CardView {
    pub fn build(name: &str, status: &NodeStatus, basis: ProgressBasis) -> Self {
        Self {
            name: name.to_string(),
            badge: Badge::from_status(status.status),
            successed: DeltaText::new(status.tasks_successed, status.add_tasks_successed),
            pending: DeltaText::new(status.tasks_pending, status.add_tasks_pending),
            failed: DeltaText::new(status.tasks_failed, status.add_tasks_failed),
            duplicated: DeltaText::new(status.tasks_duplicated, status.add_tasks_duplicated),
            stage_mode: status.stage_mode.clone(),
            execution_mode: status.execution_mode.clone(),
            start_time: format_time_value(status.start_time.as_ref(), true),
            elapsed: format_time_value(status.elapsed_time.as_ref(), false),
            remaining: format_time_value(status.remaining_time.as_ref(), false),
            avg_time: status.task_avg_time.clone(),
            progress: progress_percent(status, basis),
        }
    }
}

/// 按持久化顺序稳定排序；不在顺序表中的节点排在最后，并保持到达顺序。
pub fn order_entries<'a>(
    snapshot: &'a StatusSnapshot,
    card_order: &[String],
) -> Vec<(&'a str, &'a NodeStatus)> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(card_order.len());
    for (position, name) in card_order.iter().enumerate() {
        index.entry(name.as_str()).or_insert(position);
    }

    let mut entries: Vec<(&str, &NodeStatus)> = snapshot.iter().collect();
    entries.sort_by(|(a, _), (b, _)| match (index.get(a), index.get(b)) {
        (Some(left), Some(right)) => left.cmp(right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    entries
}

/// 拖拽中的卡片不参与本轮渲染。
pub fn build_cards(
    snapshot: &StatusSnapshot,
    card_order: &[String],
    dragging: Option<&str>,
    basis: ProgressBasis,
) -> Vec<CardView> {
    order_entries(snapshot, card_order)
        .into_iter()
        .filter(|(name, _)| Some(*name) != dragging)
        .map(|(name, status)| CardView::build(name, status, basis))
        .collect()
}

/// 把 `dragged` 移到 `target` 之前；没有目标时移到末尾。
pub fn reorder(displayed: &[String], dragged: &str, target: Option<&str>) -> Vec<String> {
    let mut order: Vec<String> = displayed
        .iter()
        .filter(|name| name.as_str() != dragged)
        .cloned()
        .collect();
    let position = target
        .filter(|target| *target != dragged)
        .and_then(|target| order.iter().position(|name| name == target))
        .unwrap_or(order.len());
    order.insert(position, dragged.to_string());
    order
}
