use std::collections::BTreeSet;

use crate::format::{format_clock, series_color};
use crate::models::StatusSnapshot;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: f64,
    pub processed: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub node: String,
    pub color: &'static str,
    pub points: Vec<SeriesPoint>,
    pub hidden: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartData {
    /// 取自快照中第一个节点的采样时间；该节点无采样时为空
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// 可见序列的时间与数值范围，供绘图缩放。
    pub fn bounds(&self) -> Option<ChartBounds> {
        let mut points = self
            .series
            .iter()
            .filter(|series| !series.hidden)
            .flat_map(|series| series.points.iter());
        let first = points.next()?;
        let init = ChartBounds {
            min_ts: first.timestamp,
            max_ts: first.timestamp,
            max_value: first.processed,
        };
        Some(points.fold(init, |mut bounds, point| {
            bounds.min_ts = bounds.min_ts.min(point.timestamp);
            bounds.max_ts = bounds.max_ts.max(point.timestamp);
            bounds.max_value = bounds.max_value.max(point.processed);
            bounds
        }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartBounds {
    pub min_ts: f64,
    pub max_ts: f64,
    pub max_value: u64,
}

/// 有历史采样的节点才产生序列；采样顺序沿用后端下发的顺序。
/// 隐藏状态按节点名匹配，与序列位置无关。
pub fn extract_series(snapshot: &StatusSnapshot, hidden: &BTreeSet<String>) -> ChartData {
    let series: Vec<Series> = snapshot
        .iter()
        .filter(|(_, status)| !status.history.is_empty())
        .enumerate()
        .map(|(index, (node, status))| Series {
            node: node.to_string(),
            color: series_color(index),
            points: status
                .history
                .iter()
                .map(|sample| SeriesPoint {
                    timestamp: sample.timestamp,
                    processed: sample.tasks_processed,
                })
                .collect(),
            hidden: hidden.contains(node),
        })
        .collect();

    let labels = snapshot
        .iter()
        .next()
        .map(|(_, first)| {
            first
                .history
                .iter()
                .map(|sample| format_clock(sample.timestamp))
                .collect()
        })
        .unwrap_or_default();

    ChartData { labels, series }
}
