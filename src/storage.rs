//! Persistent key-value cache collaborator.
//!
//! The core reads and writes a handful of fixed keys (auth token, role id,
//! admin flag, user info, project config, open-tab list, dark-mode flag) and
//! leaves the actual persistence mechanism to the host. [`Storage`] is the
//! seam; [`MemoryStorage`] is the in-process implementation used by tests and
//! headless hosts.
//!
//! [`CacheStore`] pairs a session-tier and a durable-tier storage and routes
//! auth-related entries to whichever tier
//! [`ProjectConfig::permission_cache_type`](crate::settings::ProjectConfig)
//! selects. Values are JSON strings so arbitrary serde types round-trip.

use crate::error::NavError;
use crate::settings::CacheType;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// Fixed cache keys owned by the navigation core.
pub mod keys {
    /// Project configuration.
    pub const PROJ_CFG_KEY: &str = "PROJ__CFG__KEY__";
    /// Auth token.
    pub const TOKEN_KEY: &str = "TOKEN__";
    /// Role id of the logged-in user.
    pub const ROLE_KEY: &str = "ROLE__";
    /// Admin flag of the logged-in user.
    pub const IS_ADMIN_KEY: &str = "IS_ADMIN__";
    /// Serialized user info.
    pub const USER_INFO_KEY: &str = "USER__INFO__";
    /// Serialized open-tab list.
    pub const MULTIPLE_TABS_KEY: &str = "MULTIPLE_TABS__KEY__";
    /// Dark-mode flag.
    pub const APP_DARK_MODE_KEY: &str = "__APP__DARK__MODE__";
}

/// A flat string key-value store.
///
/// Implementations decide durability; the core only specifies the keys and
/// the JSON encoding of structured values.
pub trait Storage {
    /// Read a raw value.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a raw value.
    fn set(&mut self, key: &str, value: String);
    /// Remove a single entry.
    fn remove(&mut self, key: &str);
    /// Remove everything.
    fn clear(&mut self);
}

/// In-memory [`Storage`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Session- and durable-tier storage with tier selection for auth entries.
pub struct CacheStore {
    session: Box<dyn Storage>,
    local: Box<dyn Storage>,
    auth_tier: CacheType,
}

impl CacheStore {
    /// Create a store over the two tiers.
    pub fn new(session: Box<dyn Storage>, local: Box<dyn Storage>, auth_tier: CacheType) -> Self {
        Self {
            session,
            local,
            auth_tier,
        }
    }

    /// An all-in-memory store; auth entries go to the durable tier.
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryStorage::new()),
            Box::new(MemoryStorage::new()),
            CacheType::Local,
        )
    }

    /// Change which tier auth entries use.
    pub fn set_auth_tier(&mut self, tier: CacheType) {
        self.auth_tier = tier;
    }

    fn tier(&self, tier: CacheType) -> &dyn Storage {
        match tier {
            CacheType::Session => self.session.as_ref(),
            CacheType::Local => self.local.as_ref(),
        }
    }

    fn tier_mut(&mut self, tier: CacheType) -> &mut dyn Storage {
        match tier {
            CacheType::Session => self.session.as_mut(),
            CacheType::Local => self.local.as_mut(),
        }
    }

    /// Read an auth-tier entry (raw).
    pub fn get_auth(&self, key: &str) -> Option<String> {
        self.tier(self.auth_tier).get(key)
    }

    /// Write an auth-tier entry (raw).
    pub fn set_auth(&mut self, key: &str, value: String) {
        let tier = self.auth_tier;
        self.tier_mut(tier).set(key, value);
    }

    /// Read a JSON value from the auth tier.
    pub fn get_auth_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_auth(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("discarding corrupt cache entry '{}': {}", key, err);
                None
            }
        }
    }

    /// Write a JSON value to the auth tier.
    pub fn set_auth_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), NavError> {
        let raw = serde_json::to_string(value)?;
        self.set_auth(key, raw);
        Ok(())
    }

    /// Read a JSON value from the durable tier.
    pub fn get_local_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.tier(CacheType::Local).get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("discarding corrupt cache entry '{}': {}", key, err);
                None
            }
        }
    }

    /// Write a JSON value to the durable tier.
    pub fn set_local_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), NavError> {
        let raw = serde_json::to_string(value)?;
        self.tier_mut(CacheType::Local).set(key, raw);
        Ok(())
    }

    /// Remove an entry from both tiers.
    pub fn remove(&mut self, key: &str) {
        self.session.remove(key);
        self.local.remove(key);
    }

    /// Wipe both tiers.
    pub fn clear_all(&mut self) {
        self.session.clear();
        self.local.clear();
    }
}
