use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{nearest_refresh_choice, DEFAULT_REFRESH_MS};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// 兼容未经 JSON 编码的旧值（直接写入的 `dark` / `light`）。
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().trim_matches('"') {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn body_class(self) -> &'static str {
        match self {
            Self::Light => "",
            Self::Dark => "dark-theme",
        }
    }
}

/// 跨轮询、跨会话保留的界面状态。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub refresh_interval_ms: u32,
    pub card_order: Vec<String>,
    pub hidden_series: BTreeSet<String>,
    pub theme: Theme,
    pub collapsed_nodes: BTreeSet<String>,
    pub error_filter_node: Option<String>,
    pub error_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_MS,
            card_order: Vec::new(),
            hidden_series: BTreeSet::new(),
            theme: Theme::default(),
            collapsed_nodes: BTreeSet::new(),
            error_filter_node: None,
            error_page: 1,
        }
    }
}

impl ViewState {
    pub fn set_refresh_interval(&mut self, ms: u32) -> u32 {
        self.refresh_interval_ms = nearest_refresh_choice(ms);
        self.refresh_interval_ms
    }

    /// 返回切换后该序列是否隐藏。
    pub fn toggle_series(&mut self, node: &str) -> bool {
        if self.hidden_series.remove(node) {
            false
        } else {
            self.hidden_series.insert(node.to_string());
            true
        }
    }

    pub fn toggle_collapsed(&mut self, node_id: &str) -> bool {
        if self.collapsed_nodes.remove(node_id) {
            false
        } else {
            self.collapsed_nodes.insert(node_id.to_string());
            true
        }
    }

    /// 空串与字面量 `all` 表示不过滤，其余取值按节点名原样匹配；切换过滤条件总是回到第一页。
    pub fn set_error_filter(&mut self, input: Option<&str>) {
        self.error_filter_node = normalize_filter(input);
        self.error_page = 1;
    }
}

pub fn normalize_filter(input: Option<&str>) -> Option<String> {
    input
        .filter(|value| !value.is_empty() && *value != "all")
        .map(str::to_string)
}
