//! Browser storage backend for the core storage trait.
//!
//! Session-scoped keys live in per-tab `sessionStorage`; the persisted
//! developer flag lives in `localStorage` so it survives the tab. Both
//! handles are resolved once; pages that deny storage access (private
//! browsing quirks, sandboxed frames) degrade to a no-op backend.

use vottery_core::security::DEV_MODE_KEY;
use vottery_core::EphemeralStorage;

pub struct TabStorage {
    session: Option<web_sys::Storage>,
    local: Option<web_sys::Storage>,
}

impl TabStorage {
    pub fn from_window() -> Self {
        let window = web_sys::window();
        Self {
            session: window
                .as_ref()
                .and_then(|w| w.session_storage().ok().flatten()),
            local: window
                .as_ref()
                .and_then(|w| w.local_storage().ok().flatten()),
        }
    }

    fn backing(&self, key: &str) -> Option<&web_sys::Storage> {
        if key == DEV_MODE_KEY {
            self.local.as_ref()
        } else {
            self.session.as_ref()
        }
    }
}

impl EphemeralStorage for TabStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.backing(key)?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(store) = self.backing(key) {
            // Quota and access errors are swallowed per the trait contract
            let _ = store.set_item(key, value);
        }
    }

    fn remove(&self, key: &str) {
        if let Some(store) = self.backing(key) {
            let _ = store.remove_item(key);
        }
    }
}
