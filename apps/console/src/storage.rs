//! 界面偏好的本地持久化。值以 JSON 文本写入；读不出或解析失败时回到默认值。

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::config::nearest_refresh_choice;
use crate::model::view::{Theme, ViewState};

pub mod keys {
    pub const REFRESH_RATE: &str = "refreshRate";
    pub const THEME: &str = "theme";
    pub const CARD_ORDER: &str = "dashboardOrder";
    pub const HIDDEN_SERIES: &str = "hiddenNodes";
    pub const COLLAPSED_NODES: &str = "collapsedNodes";
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait KeyValueBackend {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// 浏览器 `localStorage`。不可用时（隐私模式、被禁用）读取视为缺失，写入返回错误。
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalBackend;

#[cfg(target_arch = "wasm32")]
impl LocalBackend {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueBackend for LocalBackend {
    fn read(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = Self::storage()
            .ok_or_else(|| StorageError::Backend("localStorage is unavailable".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|err| StorageError::Backend(format!("{err:?}")))
    }
}

/// 非浏览器环境与测试使用的内存实现；克隆共享同一份数据。
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    entries: std::rc::Rc<std::cell::RefCell<std::collections::HashMap<String, String>>>,
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub type PersistedStore = ViewStore<LocalBackend>;
#[cfg(not(target_arch = "wasm32"))]
pub type PersistedStore = ViewStore<MemoryBackend>;

#[derive(Clone, Debug, Default)]
pub struct ViewStore<B> {
    backend: B,
}

impl<B: KeyValueBackend> ViewStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.backend.read(key) else {
            return default;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, %err, "malformed stored value, using default");
                default
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        self.backend.write(key, &text)
    }

    /// 缺失或损坏的键取 `defaults` 中的值。
    pub fn load_view_state(&self, defaults: ViewState) -> ViewState {
        let refresh = self.get(keys::REFRESH_RATE, defaults.refresh_interval_ms);
        ViewState {
            refresh_interval_ms: nearest_refresh_choice(refresh),
            card_order: self.get(keys::CARD_ORDER, defaults.card_order),
            hidden_series: self.get(keys::HIDDEN_SERIES, defaults.hidden_series),
            theme: self.load_theme(),
            collapsed_nodes: self.get(keys::COLLAPSED_NODES, defaults.collapsed_nodes),
            ..defaults
        }
    }

    fn load_theme(&self) -> Theme {
        self.backend
            .read(keys::THEME)
            .and_then(|raw| {
                serde_json::from_str::<Theme>(&raw)
                    .ok()
                    .or_else(|| Theme::from_raw(&raw))
            })
            .unwrap_or_default()
    }

    pub fn save_refresh_interval(&self, ms: u32) {
        self.persist(keys::REFRESH_RATE, &ms);
    }

    pub fn save_theme(&self, theme: Theme) {
        self.persist(keys::THEME, &theme);
    }

    pub fn save_card_order(&self, order: &[String]) {
        self.persist(keys::CARD_ORDER, order);
    }

    pub fn save_hidden_series(&self, hidden: &BTreeSet<String>) {
        self.persist(keys::HIDDEN_SERIES, hidden);
    }

    pub fn save_collapsed_nodes(&self, collapsed: &BTreeSet<String>) {
        self.persist(keys::COLLAPSED_NODES, collapsed);
    }

    // 写失败只影响下次会话，界面继续工作
    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(err) = self.set(key, value) {
            warn!(key, %err, "failed to persist view preference");
        }
    }
}

pub fn persisted_store() -> PersistedStore {
    #[cfg(target_arch = "wasm32")]
    {
        ViewStore::new(LocalBackend)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        ViewStore::new(MemoryBackend::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (ViewStore<MemoryBackend>, MemoryBackend) {
        let backend = MemoryBackend::default();
        (ViewStore::new(backend.clone()), backend)
    }

    struct UnavailableBackend;

    impl KeyValueBackend for UnavailableBackend {
        fn read(&self, _key: &str) -> Option<String> {
            None
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("localStorage is unavailable".to_string()))
        }
    }

    #[test]
    fn unavailable_storage_defaults_and_swallows_writes() {
        let store = ViewStore::new(UnavailableBackend);
        let defaults = ViewState {
            refresh_interval_ms: 2_000,
            ..ViewState::default()
        };
        assert_eq!(store.load_view_state(defaults.clone()), defaults);
        store.save_theme(Theme::Dark);
        store.save_card_order(&["A".to_string()]);
        assert!(store.set(keys::THEME, &Theme::Dark).is_err());
        assert_eq!(store.load_view_state(defaults.clone()), defaults);
    }

    #[test]
    fn hidden_series_round_trip_as_set() {
        let (store, _) = store();
        let hidden: BTreeSet<String> = ["B", "A"].iter().map(|s| s.to_string()).collect();
        store.save_hidden_series(&hidden);
        let loaded = store.load_view_state(ViewState::default());
        assert_eq!(loaded.hidden_series, hidden);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let (store, backend) = store();
        backend.write(keys::CARD_ORDER, "{not json").unwrap();
        backend.write(keys::HIDDEN_SERIES, "42").unwrap();
        let loaded = store.load_view_state(ViewState::default());
        assert!(loaded.card_order.is_empty());
        assert!(loaded.hidden_series.is_empty());
    }

    #[test]
    fn missing_keys_use_defaults() {
        let (store, _) = store();
        assert_eq!(store.load_view_state(ViewState::default()), ViewState::default());
    }

    #[test]
    fn theme_accepts_raw_legacy_value() {
        let (store, backend) = store();
        backend.write(keys::THEME, "dark").unwrap();
        assert_eq!(store.load_view_state(ViewState::default()).theme, Theme::Dark);

        store.save_theme(Theme::Light);
        assert_eq!(backend.read(keys::THEME).as_deref(), Some("\"light\""));
        assert_eq!(store.load_view_state(ViewState::default()).theme, Theme::Light);
    }

    #[test]
    fn configured_refresh_applies_until_user_picks_one() {
        let (store, _) = store();
        let defaults = ViewState {
            refresh_interval_ms: 2_000,
            ..ViewState::default()
        };
        assert_eq!(store.load_view_state(defaults.clone()).refresh_interval_ms, 2_000);
        store.save_refresh_interval(30_000);
        assert_eq!(store.load_view_state(defaults).refresh_interval_ms, 30_000);
    }

    #[test]
    fn refresh_rate_snaps_to_a_choice() {
        let (store, backend) = store();
        backend.write(keys::REFRESH_RATE, "7000").unwrap();
        let loaded = store.load_view_state(ViewState::default());
        assert!(crate::config::REFRESH_CHOICES_MS.contains(&loaded.refresh_interval_ms));
    }

    #[test]
    fn card_order_and_collapsed_persist() {
        let (store, _) = store();
        store.save_card_order(&["C".to_string(), "A".to_string()]);
        let collapsed: BTreeSet<String> = ["Root".to_string()].into_iter().collect();
        store.save_collapsed_nodes(&collapsed);
        store.save_refresh_interval(10_000);
        let loaded = store.load_view_state(ViewState::default());
        assert_eq!(loaded.card_order, vec!["C", "A"]);
        assert_eq!(loaded.collapsed_nodes, collapsed);
        assert_eq!(loaded.refresh_interval_ms, 10_000);
    }
}
