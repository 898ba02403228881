use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnNull};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum StageStatus {
    #[default]
    NotRunning,
    Running,
    Stopped,
}

impl From<u8> for StageStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopped,
            _ => Self::NotRunning,
        }
    }
}

impl From<StageStatus> for u8 {
    fn from(value: StageStatus) -> Self {
        match value {
            StageStatus::NotRunning => 0,
            StageStatus::Running => 1,
            StageStatus::Stopped => 2,
        }
    }
}

/// 后端可能给出秒数，也可能给出已经格式化好的文本。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(f64),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub tasks_processed: u64,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStatus {
    pub status: StageStatus,

    pub tasks_successed: u64,
    pub tasks_processed: u64,
    pub tasks_pending: u64,
    pub tasks_failed: u64,
    pub tasks_duplicated: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_tasks_successed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_tasks_processed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_tasks_pending: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_tasks_failed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_tasks_duplicated: Option<i64>,

    #[serde_as(as = "DefaultOnNull")]
    pub stage_mode: String,
    #[serde_as(as = "DefaultOnNull")]
    pub execution_mode: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<TimeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<TimeValue>,
    #[serde_as(as = "DefaultOnNull")]
    pub task_avg_time: String,

    #[serde_as(as = "DefaultOnNull")]
    pub history: Vec<HistorySample>,
}

/// 一次 `get_status` 的完整快照，保留后端下发的键顺序。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusSnapshot {
    entries: Vec<(String, NodeStatus)>,
}

impl StatusSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名节点后到者覆盖，但保留首次出现的位置。
    pub fn insert(&mut self, name: impl Into<String>, status: NodeStatus) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = status;
        } else {
            self.entries.push((name, status));
        }
    }

    pub fn get(&self, name: &str) -> Option<&NodeStatus> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, status)| status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeStatus)> {
        self.entries
            .iter()
            .map(|(name, status)| (name.as_str(), status))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for StatusSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, status) in &self.entries {
            map.serialize_entry(name, status)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StatusSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = StatusSnapshot;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of node name to node status")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(StatusSnapshot::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut snapshot = StatusSnapshot::new();
                while let Some((name, status)) = access.next_entry::<String, NodeStatus>()? {
                    snapshot.insert(name, status);
                }
                Ok(snapshot)
            }
        }

        deserializer.deserialize_any(SnapshotVisitor)
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskTreeNode {
    pub stage_name: String,
    #[serde(default)]
    pub func_name: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub next_stages: Vec<TaskTreeNode>,
}

impl TaskTreeNode {
    /// 与状态快照对应的节点键：`{stage_name}[{func_name}]`。
    pub fn status_tag(&self) -> String {
        format!("{}[{}]", self.stage_name, self.func_name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub timestamp: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSummary {
    pub total_successed: u64,
    pub total_pending: u64,
    pub total_failed: u64,
    pub total_duplicated: u64,
    pub total_nodes: u64,
    pub total_remain: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntervalUpdate {
    pub interval: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InjectionRequest {
    pub node: String,
    pub task_datas: Vec<Value>,
    pub timestamp: String,
}
