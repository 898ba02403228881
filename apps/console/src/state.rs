use dioxus::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::dashboard::ProgressBasis;
use crate::model::view::{Theme, ViewState};
use crate::model::DashboardModel;
use crate::scheduler::{SchedulerHandle, TickOutcome};
use crate::storage::PersistedStore;

pub type AppSignal = Signal<AppState>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationState {
    pub last_message: Option<String>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollerState {
    pub paused: bool,
    pub ticks: u64,
    pub last_failures: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub model: DashboardModel,
    pub progress_basis: ProgressBasis,
    pub poller: PollerState,
    pub operation: OperationState,
}

impl AppState {
    pub fn new(view: ViewState, progress_basis: ProgressBasis) -> Self {
        Self {
            model: DashboardModel::new(view),
            progress_basis,
            ..Self::default()
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.model.view
    }
}

/// 界面状态的唯一写入口；偏好类修改同时落盘。
#[derive(Clone)]
pub struct AppActions {
    state: AppSignal,
    store: PersistedStore,
    scheduler: Option<SchedulerHandle>,
}

impl AppActions {
    pub fn new(state: AppSignal, store: PersistedStore, scheduler: Option<SchedulerHandle>) -> Self {
        Self {
            state,
            store,
            scheduler,
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut signal = self.state;
        let mut state = signal.write();
        f(&mut state)
    }

    pub fn apply_tick(&self, outcome: TickOutcome) {
        self.update(|state| {
            let failures = outcome.failures();
            let basis = state.progress_basis;
            state.model.apply(outcome, basis);
            state.poller.ticks += 1;
            state.poller.last_failures = failures;
            debug!(tick = state.poller.ticks, failures, "dashboard re-rendered");
        });
    }

    pub fn set_refresh_interval(&self, ms: u32) {
        let interval = self.update(|state| state.model.view.set_refresh_interval(ms));
        self.store.save_refresh_interval(interval);
        if let Some(scheduler) = &self.scheduler {
            scheduler.set_interval(interval);
        }
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = self.update(|state| {
            state.model.view.theme = state.model.view.theme.toggled();
            state.model.view.theme
        });
        self.store.save_theme(theme);
        theme
    }

    pub fn toggle_series(&self, node: &str) {
        let hidden = self.update(|state| {
            let basis = state.progress_basis;
            state.model.toggle_series(node, basis);
            state.model.view.hidden_series.clone()
        });
        self.store.save_hidden_series(&hidden);
    }

    pub fn toggle_collapsed(&self, node_id: &str) {
        let collapsed = self.update(|state| {
            state.model.view.toggle_collapsed(node_id);
            state.model.view.collapsed_nodes.clone()
        });
        self.store.save_collapsed_nodes(&collapsed);
    }

    pub fn begin_drag(&self, name: &str) -> bool {
        self.update(|state| {
            let basis = state.progress_basis;
            state.model.begin_drag(name, basis)
        })
    }

    pub fn drop_card(&self, target: Option<&str>) {
        let order = self.update(|state| {
            let basis = state.progress_basis;
            state.model.drop_card(target, basis)
        });
        if let Some(order) = order {
            self.store.save_card_order(&order);
        }
    }

    pub fn end_drag(&self) {
        self.update(|state| {
            let basis = state.progress_basis;
            state.model.end_drag(basis);
        });
    }

    pub fn set_error_filter(&self, node: Option<&str>) {
        self.update(|state| {
            let basis = state.progress_basis;
            state.model.set_error_filter(node, basis);
        });
    }

    pub fn set_error_page(&self, page: usize) {
        self.update(|state| {
            let basis = state.progress_basis;
            state.model.set_error_page(page, basis);
        });
    }

    pub fn set_paused(&self, paused: bool) {
        self.update(|state| state.poller.paused = paused);
        if let Some(scheduler) = &self.scheduler {
            if paused {
                scheduler.pause();
            } else {
                scheduler.resume();
            }
        }
    }

    pub fn set_operation_success(&self, context: impl Into<String>, message: String) {
        self.update(|state| {
            state.operation = OperationState {
                last_message: Some(message),
                error: None,
                context: Some(context.into()),
            };
        });
    }

    pub fn set_operation_error(&self, context: impl Into<String>, message: String) {
        self.update(|state| {
            state.operation = OperationState {
                last_message: None,
                error: Some(message),
                context: Some(context.into()),
            };
        });
    }

    pub fn clear_operation_status(&self) {
        self.update(|state| state.operation = OperationState::default());
    }
}

pub fn use_app_state() -> AppSignal {
    use_context::<AppSignal>()
}

pub fn use_app_actions() -> AppActions {
    let state = use_app_state();
    let store = use_context::<PersistedStore>();
    let scheduler = try_use_context::<SchedulerHandle>();
    AppActions::new(state, store, scheduler)
}
