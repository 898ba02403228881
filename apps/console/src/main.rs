#![allow(non_snake_case)]

mod api;
mod config;
mod format;
mod hooks;
mod model;
mod models;
mod scheduler;
mod services;
mod state;
mod storage;
mod ui;

use api::{ClientError, DashboardClient};
use config::AppConfig;
use dioxus::prelude::*;
use dioxus_router::prelude::*;
use hooks::poller::use_pipeline_poller;
use model::view::ViewState;
use once_cell::sync::OnceCell;
use state::{use_app_state, AppState};
use storage::persisted_store;
use tracing::{error, info};
use ui::cards::DashboardCards;
use ui::chart::ProgressChart;
use ui::errors::ErrorTable;
use ui::graph::GraphPanel;
use ui::header::HeaderBar;
use ui::injection::InjectionPanel;
use ui::notifications::NotificationCenter;
use ui::summary::SummaryPanel;

pub(crate) static APP_CONFIG: OnceCell<AppConfig> = OnceCell::new();
pub(crate) static API_CLIENT: OnceCell<DashboardClient> = OnceCell::new();

fn main() {
    console_error_panic_hook::set_once();
    init_logging();
    bootstrap_infrastructure();
    launch(App);
}

fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = dioxus_logger::init(tracing::Level::INFO);
    });
}

fn bootstrap_infrastructure() {
    let config = AppConfig::from_env();
    info!(
        profile = ?config.profile,
        api_base_url = %config.api_base_url,
        refresh_ms = config.default_refresh_ms,
        "configuration loaded"
    );
    let _ = APP_CONFIG.set(config.clone());

    match DashboardClient::new(config) {
        Ok(client) => {
            let _ = API_CLIENT.set(client);
            info!("dashboard client initialized");
        }
        Err(err) => {
            report_client_error("初始化后端客户端失败", &err);
        }
    }
}

fn report_client_error(context: &str, err: &ClientError) {
    error!(%context, ?err, status = ?err.status(), "api bootstrap error");
}

#[component]
fn App() -> Element {
    let store = use_hook(persisted_store);
    use_context_provider(|| store.clone());

    let app_state = use_signal(|| {
        let config = APP_CONFIG.get().cloned().unwrap_or_default();
        let defaults = ViewState {
            refresh_interval_ms: config.default_refresh_ms,
            ..ViewState::default()
        };
        AppState::new(store.load_view_state(defaults), config.progress_basis)
    });
    use_context_provider(|| app_state);

    use_pipeline_poller();

    use_effect(move || {
        let theme = app_state.read().model.view.theme;
        ui::apply_body_theme(theme.body_class());
    });

    rsx! {
        div { class: "relative",
            Router::<Route> {}
            NotificationCenter {}
        }
    }
}

#[derive(Clone, Routable, Debug, PartialEq)]
enum Route {
    #[layout(Shell)]
    #[route("/")]
    Dashboard {},
    #[route("/inject")]
    Inject {},
}

#[component]
fn Shell() -> Element {
    let class = use_app_state().read().model.view.theme.body_class();

    rsx! {
        div { class: "app-shell space-y-4 p-4 {class}",
            HeaderBar {}
            nav { class: "flex gap-4 text-sm",
                Link { to: Route::Dashboard {}, active_class: "font-semibold text-sky-700", "监控面板" }
                Link { to: Route::Inject {}, active_class: "font-semibold text-sky-700", "任务注入" }
            }
            Outlet::<Route> {}
        }
    }
}

#[component]
fn Dashboard() -> Element {
    rsx! {
        GraphPanel {}
        SummaryPanel {}
        DashboardCards {}
        ProgressChart {}
        ErrorTable {}
    }
}

#[component]
fn Inject() -> Element {
    rsx! {
        InjectionPanel {}
    }
}
