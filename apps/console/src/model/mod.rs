//! 纯数据层：轮询结果进来，渲染帧出去，不接触 DOM 与网络。

pub mod dashboard;
pub mod errors;
pub mod status;
pub mod timeseries;
pub mod topology;
pub mod view;

use tracing::debug;

use crate::models::{BackendSummary, TaskTreeNode};
use crate::scheduler::TickOutcome;

use self::dashboard::{build_cards, order_entries, reorder, CardView, ProgressBasis};
use self::errors::{filter_options, retain_filter, ErrorLog, ErrorPage};
use self::status::{StatusModel, StatusSummary};
use self::timeseries::{extract_series, ChartData};
use self::topology::{compile_graph, GraphDescription};
use self::view::ViewState;

/// 正在拖拽的卡片。拖拽期间轮询照常刷新其余卡片，这张卡片保持拖起时的内容。
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub name: String,
    pub card: CardView,
    pub from_index: usize,
}

/// 一次渲染的全部产物。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub graph: GraphDescription,
    pub mermaid: String,
    pub summary: StatusSummary,
    pub backend_summary: Option<BackendSummary>,
    pub cards: Vec<CardView>,
    pub chart: ChartData,
    pub error_page: ErrorPage,
    pub filter_options: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardModel {
    pub status: StatusModel,
    pub topology: Vec<TaskTreeNode>,
    pub errors: ErrorLog,
    pub backend_summary: Option<BackendSummary>,
    pub view: ViewState,
    pub dragging: Option<DragSession>,
    pub frame: Frame,
}

impl DashboardModel {
    pub fn new(view: ViewState) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    /// 拉取失败的资源保留上一次的值。
    pub fn apply(&mut self, outcome: TickOutcome, basis: ProgressBasis) {
        if let Some(snapshot) = outcome.status {
            self.status.replace(snapshot);
            self.release_vanished_drag();
        }
        if let Some(forest) = outcome.structure {
            self.topology = forest;
        }
        if let Some(records) = outcome.errors {
            self.errors.replace(records);
        }
        if let Some(summary) = outcome.summary {
            self.backend_summary = Some(summary);
        }
        self.render(basis);
    }

    // 卡片随节点一起消失时收不到 dragend，会话就地作废
    fn release_vanished_drag(&mut self) {
        let vanished = self
            .dragging
            .as_ref()
            .is_some_and(|session| self.status.snapshot().get(&session.name).is_none());
        if vanished {
            if let Some(session) = self.dragging.take() {
                debug!(card = %session.name, "dragged card vanished, drag released");
            }
        }
    }

    /// 依次生成结构图、汇总、卡片、曲线、错误页与过滤选项。
    pub fn render(&mut self, basis: ProgressBasis) {
        let snapshot = self.status.snapshot();

        let graph = compile_graph(&self.topology, snapshot);
        let mermaid = graph.to_mermaid();
        let summary = self.status.summary().clone();
        let dragging = self.dragging.as_ref().map(|session| session.name.as_str());
        let cards = build_cards(snapshot, &self.view.card_order, dragging, basis);
        let chart = extract_series(snapshot, &self.view.hidden_series);

        let options = filter_options(snapshot);
        let retained = retain_filter(self.view.error_filter_node.as_deref(), &options);
        if retained != self.view.error_filter_node {
            debug!(previous = ?self.view.error_filter_node, "error filter node vanished, showing all");
            self.view.error_filter_node = retained;
            self.view.error_page = 1;
        }
        let error_page = self
            .errors
            .page(self.view.error_filter_node.as_deref(), self.view.error_page);
        self.view.error_page = error_page.page;

        self.frame = Frame {
            graph,
            mermaid,
            summary,
            backend_summary: self.backend_summary.clone(),
            cards,
            chart,
            error_page,
            filter_options: options,
        };
    }

    /// 当前应显示的卡片；拖拽中的卡片按拖起时的位置放回。
    pub fn visible_cards(&self) -> Vec<CardView> {
        let mut cards = self.frame.cards.clone();
        if let Some(session) = &self.dragging {
            let at = session.from_index.min(cards.len());
            cards.insert(at, session.card.clone());
        }
        cards
    }

    pub fn begin_drag(&mut self, name: &str, basis: ProgressBasis) -> bool {
        if self.dragging.is_some() {
            return false;
        }
        let Some(from_index) = self.frame.cards.iter().position(|card| card.name == name) else {
            return false;
        };
        let card = self.frame.cards[from_index].clone();
        self.dragging = Some(DragSession {
            name: name.to_string(),
            card,
            from_index,
        });
        self.render(basis);
        true
    }

    /// 放下卡片，返回需要持久化的新顺序。
    pub fn drop_card(&mut self, target: Option<&str>, basis: ProgressBasis) -> Option<Vec<String>> {
        let session = self.dragging.take()?;
        let displayed: Vec<String> = order_entries(self.status.snapshot(), &self.view.card_order)
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect();
        let order = reorder(&displayed, &session.name, target);
        self.view.card_order = order.clone();
        self.render(basis);
        Some(order)
    }

    /// 拖拽被取消，顺序不变。
    pub fn end_drag(&mut self, basis: ProgressBasis) {
        if self.dragging.take().is_some() {
            self.render(basis);
        }
    }

    pub fn set_error_filter(&mut self, node: Option<&str>, basis: ProgressBasis) {
        self.view.set_error_filter(node);
        self.render(basis);
    }

    pub fn set_error_page(&mut self, page: usize, basis: ProgressBasis) {
        self.view.error_page = page;
        self.render(basis);
    }

    pub fn toggle_series(&mut self, node: &str, basis: ProgressBasis) -> bool {
        let hidden = self.view.toggle_series(node);
        self.render(basis);
        hidden
    }

    pub fn error_page(&self) -> &ErrorPage {
        &self.frame.error_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorRecord;
    use serde_json::json;

    const BASIS: ProgressBasis = ProgressBasis::Processed;

    fn outcome(status: serde_json::Value, errors: Vec<ErrorRecord>) -> TickOutcome {
        TickOutcome {
            status: Some(serde_json::from_value(status).unwrap()),
            structure: Some(
                serde_json::from_value(json!([
                    {"stage_name": "A", "func_name": "f", "next_stages": [
                        {"stage_name": "B", "func_name": "g"}
                    ]}
                ]))
                .unwrap(),
            ),
            errors: Some(errors),
            summary: Some(BackendSummary::default()),
        }
    }

    fn errors_for(node: &str, count: usize) -> Vec<ErrorRecord> {
        (0..count)
            .map(|i| ErrorRecord {
                error: "boom".into(),
                node: node.into(),
                task_id: format!("t{i}"),
                timestamp: i as f64,
            })
            .collect()
    }

    fn card_names(model: &DashboardModel) -> Vec<String> {
        model.visible_cards().into_iter().map(|card| card.name).collect()
    }

    #[test]
    fn apply_renders_every_section() {
        let mut model = DashboardModel::default();
        model.apply(
            outcome(
                json!({"A[f]": {"status": 1, "tasks_processed": 3,
                        "history": [{"timestamp": 1.0, "tasks_processed": 3}]},
                       "B[g]": {}}),
                errors_for("A[f]", 12),
            ),
            BASIS,
        );
        let frame = &model.frame;
        assert_eq!(frame.graph.nodes.len(), 2);
        assert!(frame.mermaid.contains("class A greenNode;"));
        assert_eq!(frame.summary.active, 1);
        assert_eq!(frame.cards.len(), 2);
        assert_eq!(frame.chart.series.len(), 1);
        assert_eq!(frame.error_page.page_count, 2);
        assert_eq!(frame.filter_options, vec!["A[f]", "B[g]"]);
        assert!(frame.backend_summary.is_some());
    }

    #[test]
    fn failed_resources_keep_previous_values() {
        let mut model = DashboardModel::default();
        model.apply(outcome(json!({"A[f]": {}}), errors_for("A[f]", 3)), BASIS);
        model.apply(TickOutcome::default(), BASIS);
        assert_eq!(model.frame.cards.len(), 1);
        assert_eq!(model.frame.error_page.total, 3);
        assert_eq!(model.topology.len(), 1);
    }

    #[test]
    fn rendering_twice_is_idempotent() {
        let mut model = DashboardModel::default();
        model.apply(outcome(json!({"A[f]": {}, "B[g]": {}}), errors_for("B[g]", 4)), BASIS);
        let first = model.frame.clone();
        model.render(BASIS);
        assert_eq!(model.frame, first);
    }

    #[test]
    fn vanished_filter_node_resets_to_all() {
        let mut model = DashboardModel::default();
        model.apply(outcome(json!({"A[f]": {}, "B[g]": {}}), errors_for("B[g]", 4)), BASIS);
        model.set_error_filter(Some("B[g]"), BASIS);
        assert_eq!(model.frame.error_page.total, 4);

        model.apply(outcome(json!({"A[f]": {}}), errors_for("B[g]", 4)), BASIS);
        assert_eq!(model.view.error_filter_node, None);
        assert_eq!(model.view.error_page, 1);
        assert_eq!(model.frame.error_page.total, 4);
    }

    #[test]
    fn page_is_clamped_and_written_back() {
        let mut model = DashboardModel::default();
        model.apply(outcome(json!({"A[f]": {}}), errors_for("A[f]", 23)), BASIS);
        model.set_error_page(99, BASIS);
        assert_eq!(model.view.error_page, 3);
        assert_eq!(model.error_page().rows.len(), 3);

        model.apply(outcome(json!({"A[f]": {}}), errors_for("A[f]", 5)), BASIS);
        assert_eq!(model.view.error_page, 1);
    }

    #[test]
    fn drag_keeps_card_in_place_while_ticks_arrive() {
        let mut model = DashboardModel::default();
        model.apply(outcome(json!({"A": {}, "B": {}, "C": {}}), Vec::new()), BASIS);
        assert!(model.begin_drag("B", BASIS));
        assert!(!model.begin_drag("C", BASIS));
        assert_eq!(model.frame.cards.len(), 2);

        model.apply(
            outcome(json!({"A": {}, "B": {"tasks_successed": 9}, "C": {}}), Vec::new()),
            BASIS,
        );
        assert_eq!(card_names(&model), vec!["A", "B", "C"]);
        let dragged = &model.visible_cards()[1];
        assert_eq!(dragged.successed.value, "0");

        let order = model.drop_card(Some("A"), BASIS).unwrap();
        assert_eq!(order, vec!["B", "A", "C"]);
        assert_eq!(model.view.card_order, order);
        assert_eq!(card_names(&model), vec!["B", "A", "C"]);
        assert_eq!(model.frame.cards[0].successed.value, "9");
    }

    #[test]
    fn cancelled_drag_keeps_order() {
        let mut model = DashboardModel::default();
        model.apply(outcome(json!({"A": {}, "B": {}}), Vec::new()), BASIS);
        assert!(model.begin_drag("A", BASIS));
        model.end_drag(BASIS);
        assert!(model.dragging.is_none());
        assert_eq!(card_names(&model), vec!["A", "B"]);
        assert_eq!(model.drop_card(None, BASIS), None);
    }

    #[test]
    fn drag_is_released_when_card_vanishes() {
        let mut model = DashboardModel::default();
        model.apply(outcome(json!({"A": {}, "B": {}}), Vec::new()), BASIS);
        assert!(model.begin_drag("B", BASIS));

        model.apply(outcome(json!({"A": {}}), Vec::new()), BASIS);
        assert!(model.dragging.is_none());
        assert_eq!(card_names(&model), vec!["A"]);
        assert!(model.begin_drag("A", BASIS));
    }

    #[test]
    fn failed_status_fetch_keeps_drag_session() {
        let mut model = DashboardModel::default();
        model.apply(outcome(json!({"A": {}, "B": {}}), Vec::new()), BASIS);
        assert!(model.begin_drag("B", BASIS));
        model.apply(TickOutcome::default(), BASIS);
        assert!(model.dragging.is_some());
    }

    #[test]
    fn unknown_card_cannot_be_dragged() {
        let mut model = DashboardModel::default();
        model.apply(outcome(json!({"A": {}}), Vec::new()), BASIS);
        assert!(!model.begin_drag("ghost", BASIS));
    }
}
