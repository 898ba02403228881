use serde_json::Value;
use thiserror::Error;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::{info, warn};

use crate::api::{ClientError, DashboardClient};
use crate::models::{StageStatus, StatusSnapshot};

pub const TERMINATION_PRESET: &str = r#"["TERMINATION_SIGNAL"]"#;

#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("请至少选择一个节点")]
    NoNodeSelected,
    #[error("任务数据不是合法的 JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("任务数据必须是 JSON 数组")]
    NotAnArray,
    #[error("无法生成提交时间: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("节点 {node} 注入失败: {source}")]
    Push {
        node: String,
        #[source]
        source: ClientError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeOption {
    pub name: String,
    pub selectable: bool,
}

/// 候选节点，名称包含搜索词（不区分大小写）；已停止的节点不可选。
pub fn selectable_nodes(snapshot: &StatusSnapshot, search: &str) -> Vec<NodeOption> {
    let needle = search.trim().to_lowercase();
    snapshot
        .iter()
        .filter(|(name, _)| needle.is_empty() || name.to_lowercase().contains(&needle))
        .map(|(name, status)| NodeOption {
            name: name.to_string(),
            selectable: status.status != StageStatus::Stopped,
        })
        .collect()
}

pub fn parse_task_datas(input: &str) -> Result<Vec<Value>, InjectionError> {
    match serde_json::from_str::<Value>(input.trim())? {
        Value::Array(items) => Ok(items),
        _ => Err(InjectionError::NotAnArray),
    }
}

/// UTC 的 ISO-8601 时间，精确到毫秒，例如 `2024-05-01T08:30:00.250Z`。
pub fn injection_timestamp(now: OffsetDateTime) -> Result<String, InjectionError> {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    Ok(now.to_offset(UtcOffset::UTC).format(&format)?)
}

/// 逐个节点串行提交，遇到第一个失败即停止。返回成功提交的节点数。
pub async fn submit(
    client: &DashboardClient,
    nodes: &[String],
    input: &str,
) -> Result<usize, InjectionError> {
    if nodes.is_empty() {
        return Err(InjectionError::NoNodeSelected);
    }
    let task_datas = parse_task_datas(input)?;
    let timestamp = injection_timestamp(OffsetDateTime::now_utc())?;

    for node in nodes {
        client
            .push_injection_tasks(node, &task_datas, &timestamp)
            .await
            .map_err(|source| {
                warn!(%node, %source, "task injection failed");
                InjectionError::Push {
                    node: node.clone(),
                    source,
                }
            })?;
    }

    info!(nodes = nodes.len(), tasks = task_datas.len(), "tasks injected");
    Ok(nodes.len())
}
