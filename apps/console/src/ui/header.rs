use dioxus::prelude::*;
use tracing::{info, warn};

use crate::config::REFRESH_CHOICES_MS;
use crate::model::view::Theme;
use crate::state::{use_app_actions, use_app_state};
use crate::ui::confirm;
use crate::API_CLIENT;

fn refresh_label(ms: u32) -> String {
    if ms >= 60_000 {
        format!("{} 分钟", ms / 60_000)
    } else {
        format!("{} 秒", ms / 1_000)
    }
}

#[component]
pub fn HeaderBar() -> Element {
    let actions = use_app_actions();
    let snapshot = use_app_state().read().clone();
    let view = snapshot.view();
    let interval = view.refresh_interval_ms;
    let theme = view.theme;
    let paused = snapshot.poller.paused;
    let failures = snapshot.poller.last_failures;
    let endpoint = API_CLIENT
        .get()
        .map(|client| client.config().api_base_url.clone())
        .unwrap_or_else(|| "未配置 API 地址".to_string());

    let on_interval = {
        let actions = actions.clone();
        move |evt: FormEvent| match evt.value().parse::<u32>() {
            Ok(ms) => actions.set_refresh_interval(ms),
            Err(err) => warn!(value = %evt.value(), %err, "ignored refresh interval"),
        }
    };

    let on_pause = {
        let actions = actions.clone();
        move |_: MouseEvent| actions.set_paused(!paused)
    };

    let on_theme = {
        let actions = actions.clone();
        move |_: MouseEvent| {
            actions.toggle_theme();
        }
    };

    let on_shutdown = {
        let actions = actions.clone();
        move |_: MouseEvent| {
            if !confirm("确定要停止后端服务吗？") {
                return;
            }
            let Some(client) = API_CLIENT.get().cloned() else {
                actions.set_operation_error("停止服务", "客户端未初始化".to_string());
                return;
            };
            let actions = actions.clone();
            spawn(async move {
                match client.shutdown().await {
                    Ok(text) => {
                        info!("shutdown acknowledged");
                        actions.set_operation_success("停止服务", text);
                    }
                    Err(err) => {
                        warn!(%err, status = ?err.status(), "shutdown request failed");
                        actions.set_operation_error("停止服务", err.to_string());
                    }
                }
            });
        }
    };

    let theme_label = match theme {
        Theme::Light => "深色模式",
        Theme::Dark => "浅色模式",
    };

    rsx! {
        header { class: "flex flex-wrap items-center justify-between gap-3 rounded-lg border border-slate-200 bg-white p-4 shadow-sm",
            div { class: "space-y-1",
                h1 { class: "text-xl font-semibold text-slate-900", "任务流水线监控" }
                p { class: "text-xs text-slate-500", "后端: {endpoint}" }
                if failures > 0 {
                    p { class: "text-xs text-amber-600", "最近一次刷新有 {failures} 个接口失败，显示上次数据" }
                }
            }
            div { class: "flex flex-wrap items-center gap-2 text-sm",
                label { class: "text-slate-600", "刷新间隔" }
                select {
                    class: "rounded border border-slate-300 px-2 py-1",
                    value: "{interval}",
                    onchange: on_interval,
                    for ms in REFRESH_CHOICES_MS {
                        option { value: "{ms}", selected: ms == interval, {refresh_label(ms)} }
                    }
                }
                button {
                    class: "rounded bg-slate-100 px-3 py-1 text-slate-700 hover:bg-slate-200",
                    onclick: on_pause,
                    if paused { "继续刷新" } else { "暂停刷新" }
                }
                button {
                    class: "rounded bg-slate-100 px-3 py-1 text-slate-700 hover:bg-slate-200",
                    onclick: on_theme,
                    "{theme_label}"
                }
                button {
                    class: "rounded bg-red-600 px-3 py-1 text-white hover:bg-red-700",
                    onclick: on_shutdown,
                    "停止服务"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_labels() {
        assert_eq!(refresh_label(1_000), "1 秒");
        assert_eq!(refresh_label(30_000), "30 秒");
        assert_eq!(refresh_label(60_000), "1 分钟");
    }
}
