pub mod cards;
pub mod chart;
pub mod errors;
pub mod graph;
pub mod header;
pub mod injection;
pub mod notifications;
pub mod summary;

/// 浏览器确认框；非浏览器环境直接放行。
pub fn confirm(message: &str) -> bool {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window()
            .and_then(|window| window.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        true
    }
}

/// 移动端浏览器上关闭拖拽排序。
pub fn is_mobile() -> bool {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window()
            .and_then(|window| window.navigator().user_agent().ok())
            .map(|agent| is_mobile_agent(&agent))
            .unwrap_or(false)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        false
    }
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn is_mobile_agent(agent: &str) -> bool {
    const MARKERS: [&str; 8] = [
        "Android",
        "webOS",
        "iPhone",
        "iPad",
        "iPod",
        "BlackBerry",
        "IEMobile",
        "Opera Mini",
    ];
    MARKERS.iter().any(|marker| agent.contains(marker))
}

/// 主题 class 挂在 `body` 上。
pub fn apply_body_theme(class: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(body) = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.body())
        else {
            return;
        };
        let classes = body.class_list();
        let _ = classes.remove_1("dark-theme");
        if !class.is_empty() {
            let _ = classes.add_1(class);
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = class;
    }
}
