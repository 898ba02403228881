use dioxus::prelude::*;
use tracing::warn;

use crate::scheduler::{BrowserTimer, PollScheduler, SchedulerHandle};
use crate::state::{use_app_state, AppActions};
use crate::storage::PersistedStore;
use crate::API_CLIENT;

/// 启动轮询调度，并把控制句柄放进上下文供子组件使用。
pub fn use_pipeline_poller() -> SchedulerHandle {
    let state = use_app_state();
    let store = use_context::<PersistedStore>();

    let (scheduler, handle) = use_hook(|| {
        let interval = state.peek().model.view.refresh_interval_ms;
        let (scheduler, handle) = PollScheduler::new(interval);
        provide_context(handle.clone());
        (Signal::new(Some(scheduler)), handle)
    });

    let _ = use_future(move || {
        let actions = AppActions::new(state, store.clone(), None);
        let mut slot = scheduler;
        async move {
            let Some(scheduler) = slot.write().take() else {
                return;
            };
            let Some(client) = API_CLIENT.get().cloned() else {
                warn!("dashboard client not initialized, polling disabled");
                return;
            };
            scheduler
                .run(client, BrowserTimer, move |outcome| actions.apply_tick(outcome))
                .await;
        }
    });

    let stop = handle.clone();
    use_drop(move || stop.stop());

    handle
}
