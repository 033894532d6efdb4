// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime-mutable administrative settings with whole-file write-through.
//!
//! [`SettingsManager`] owns the flat keyed record that administrators mutate
//! at runtime: feature flags, the AI service set with its two current
//! selectors, the tool-server registry, persona text, the admin set, and the
//! group allow-list.
//!
//! Every mutation persists the whole record immediately. Mutators are
//! read-modify-write idempotent: applying an already-set value returns
//! `false` ("unchanged") without touching disk. A missing or corrupt record
//! at load time yields defaults rather than failing startup, and a failed
//! persist is logged without rolling back the in-memory state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// A named, addressable model-service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiService {
    /// Unique name used to address this entry.
    pub name: String,
    pub api_key: String,
    pub api_url: String,
    /// Model identifier passed to the service.
    pub model: String,
}

/// Transport configuration for one external tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolTransport {
    /// Server-sent events transport.
    Sse {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
    /// Child-process transport.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
}

/// One registered tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServer {
    #[serde(flatten)]
    pub transport: ToolTransport,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// The persisted administrative record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub admins: Vec<String>,
    pub enabled_groups: Vec<String>,
    pub chat_enabled: bool,
    /// Base participation level installed by a scheduler renewal, in [0, 1].
    pub base_activity: f64,
    pub persona: String,
    pub services: Vec<AiService>,
    /// Index of the service used for chat generation.
    pub current_chat: Option<usize>,
    /// Index of the service used for image recognition.
    pub current_vision: Option<usize>,
    pub image_recognition_enabled: bool,
    pub search_enabled: bool,
    /// Master switch for the tool-augmentation feature.
    pub tools_enabled: bool,
    pub tool_servers: BTreeMap<String, ToolServer>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            enabled_groups: Vec::new(),
            chat_enabled: true,
            base_activity: 1.0,
            persona: String::new(),
            services: Vec::new(),
            current_chat: None,
            current_vision: None,
            image_recognition_enabled: false,
            search_enabled: false,
            tools_enabled: false,
            tool_servers: BTreeMap::new(),
        }
    }
}

/// Owns the administrative record and serializes every mutation behind one
/// exclusive-access section.
pub struct SettingsManager {
    path: PathBuf,
    state: RwLock<Settings>,
}

impl SettingsManager {
    /// Loads the record at `path`, falling back to defaults when the file is
    /// missing or malformed.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Settings>(&raw) {
                Ok(settings) => {
                    info!(path = %path.display(), "settings record loaded");
                    settings
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "malformed settings record, using defaults");
                    Settings::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no settings record found, using defaults");
                Settings::default()
            }
        };
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    /// Returns a snapshot of the whole record.
    pub fn snapshot(&self) -> Settings {
        self.state.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    // --- Feature flags ---

    pub fn chat_enabled(&self) -> bool {
        self.read(|s| s.chat_enabled)
    }

    pub fn set_chat_enabled(&self, enabled: bool) -> bool {
        self.mutate(|s| {
            if s.chat_enabled == enabled {
                return false;
            }
            s.chat_enabled = enabled;
            true
        })
    }

    pub fn search_enabled(&self) -> bool {
        self.read(|s| s.search_enabled)
    }

    pub fn set_search_enabled(&self, enabled: bool) -> bool {
        self.mutate(|s| {
            if s.search_enabled == enabled {
                return false;
            }
            s.search_enabled = enabled;
            true
        })
    }

    pub fn image_recognition_enabled(&self) -> bool {
        self.read(|s| s.image_recognition_enabled)
    }

    pub fn set_image_recognition_enabled(&self, enabled: bool) -> bool {
        self.mutate(|s| {
            if s.image_recognition_enabled == enabled {
                return false;
            }
            s.image_recognition_enabled = enabled;
            true
        })
    }

    pub fn tools_enabled(&self) -> bool {
        self.read(|s| s.tools_enabled)
    }

    pub fn set_tools_enabled(&self, enabled: bool) -> bool {
        self.mutate(|s| {
            if s.tools_enabled == enabled {
                return false;
            }
            s.tools_enabled = enabled;
            true
        })
    }

    // --- Participation and persona ---

    pub fn base_activity(&self) -> f64 {
        self.read(|s| s.base_activity)
    }

    /// Sets the base participation level. Rejects values outside [0, 1].
    pub fn set_base_activity(&self, level: f64) -> bool {
        if !(0.0..=1.0).contains(&level) {
            return false;
        }
        self.mutate(|s| {
            if s.base_activity == level {
                return false;
            }
            s.base_activity = level;
            true
        })
    }

    pub fn persona(&self) -> String {
        self.read(|s| s.persona.clone())
    }

    pub fn set_persona(&self, persona: &str) -> bool {
        self.mutate(|s| {
            if s.persona == persona {
                return false;
            }
            s.persona = persona.to_string();
            true
        })
    }

    // --- Admins and group allow-list ---

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.read(|s| s.admins.iter().any(|a| a == user_id))
    }

    pub fn admins(&self) -> Vec<String> {
        self.read(|s| s.admins.clone())
    }

    pub fn add_admin(&self, user_id: &str) -> bool {
        self.mutate(|s| {
            if s.admins.iter().any(|a| a == user_id) {
                return false;
            }
            s.admins.push(user_id.to_string());
            true
        })
    }

    pub fn remove_admin(&self, user_id: &str) -> bool {
        self.mutate(|s| {
            let before = s.admins.len();
            s.admins.retain(|a| a != user_id);
            s.admins.len() != before
        })
    }

    pub fn is_group_enabled(&self, group_id: &str) -> bool {
        self.read(|s| s.enabled_groups.iter().any(|g| g == group_id))
    }

    pub fn enable_group(&self, group_id: &str) -> bool {
        self.mutate(|s| {
            if s.enabled_groups.iter().any(|g| g == group_id) {
                return false;
            }
            s.enabled_groups.push(group_id.to_string());
            true
        })
    }

    pub fn disable_group(&self, group_id: &str) -> bool {
        self.mutate(|s| {
            let before = s.enabled_groups.len();
            s.enabled_groups.retain(|g| g != group_id);
            s.enabled_groups.len() != before
        })
    }

    // --- AI services and the two current selectors ---

    pub fn services(&self) -> Vec<AiService> {
        self.read(|s| s.services.clone())
    }

    /// Adds a service. The first entry added becomes the current selection
    /// for any selector still unset. Rejects duplicate names.
    pub fn add_service(&self, service: AiService) -> bool {
        self.mutate(|s| {
            if s.services.iter().any(|c| c.name == service.name) {
                return false;
            }
            s.services.push(service);
            let idx = s.services.len() - 1;
            if s.current_chat.is_none() {
                s.current_chat = Some(idx);
            }
            if s.current_vision.is_none() {
                s.current_vision = Some(idx);
            }
            true
        })
    }

    /// Removes the named service, repointing either current selector if it
    /// referenced the removed entry: selectors past the removed index shift
    /// down, a selector at the removed index clamps to the last remaining
    /// entry, and an emptied set clears both selectors.
    pub fn remove_service(&self, name: &str) -> bool {
        self.mutate(|s| {
            let Some(idx) = s.services.iter().position(|c| c.name == name) else {
                return false;
            };
            s.services.remove(idx);
            s.current_chat = repoint_selector(s.current_chat, idx, s.services.len());
            s.current_vision = repoint_selector(s.current_vision, idx, s.services.len());
            true
        })
    }

    /// Selects the named service for chat generation.
    pub fn select_chat_service(&self, name: &str) -> bool {
        self.mutate(|s| {
            let Some(idx) = s.services.iter().position(|c| c.name == name) else {
                return false;
            };
            if s.current_chat == Some(idx) {
                return false;
            }
            s.current_chat = Some(idx);
            true
        })
    }

    /// Selects the named service for image recognition.
    pub fn select_vision_service(&self, name: &str) -> bool {
        self.mutate(|s| {
            let Some(idx) = s.services.iter().position(|c| c.name == name) else {
                return false;
            };
            if s.current_vision == Some(idx) {
                return false;
            }
            s.current_vision = Some(idx);
            true
        })
    }

    pub fn current_chat_service(&self) -> Option<AiService> {
        self.read(|s| s.current_chat.and_then(|i| s.services.get(i).cloned()))
    }

    pub fn current_vision_service(&self) -> Option<AiService> {
        self.read(|s| s.current_vision.and_then(|i| s.services.get(i).cloned()))
    }

    // --- Tool servers ---

    pub fn tool_servers(&self) -> BTreeMap<String, ToolServer> {
        self.read(|s| s.tool_servers.clone())
    }

    /// Tool servers with their per-server switch on.
    pub fn enabled_tool_servers(&self) -> BTreeMap<String, ToolServer> {
        self.read(|s| {
            s.tool_servers
                .iter()
                .filter(|(_, srv)| srv.enabled)
                .map(|(name, srv)| (name.clone(), srv.clone()))
                .collect()
        })
    }

    /// Registers a tool server. Rejects duplicate names.
    pub fn add_tool_server(&self, name: &str, server: ToolServer) -> bool {
        self.mutate(|s| {
            if s.tool_servers.contains_key(name) {
                return false;
            }
            s.tool_servers.insert(name.to_string(), server);
            true
        })
    }

    pub fn remove_tool_server(&self, name: &str) -> bool {
        self.mutate(|s| s.tool_servers.remove(name).is_some())
    }

    pub fn set_tool_server_enabled(&self, name: &str, enabled: bool) -> bool {
        self.mutate(|s| match s.tool_servers.get_mut(name) {
            Some(srv) if srv.enabled != enabled => {
                srv.enabled = enabled;
                true
            }
            _ => false,
        })
    }

    // --- Internals ---

    fn read<T>(&self, f: impl FnOnce(&Settings) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(|p| p.into_inner());
        f(&guard)
    }

    /// Applies a mutation under the write lock and persists if it reported a
    /// change. The lock spans read-modify-persist so concurrent mutations
    /// cannot interleave.
    fn mutate(&self, f: impl FnOnce(&mut Settings) -> bool) -> bool {
        let mut guard = self.state.write().unwrap_or_else(|p| p.into_inner());
        let changed = f(&mut guard);
        if changed {
            self.persist(&guard);
        }
        changed
    }

    /// Whole-file overwrite via temp file + rename. Failure is logged; the
    /// in-memory record stays authoritative for the running process.
    fn persist(&self, settings: &Settings) {
        if let Err(e) = write_record(&self.path, settings) {
            warn!(path = %self.path.display(), error = %e, "failed to persist settings record");
        }
    }
}

fn repoint_selector(selector: Option<usize>, removed: usize, remaining: usize) -> Option<usize> {
    let idx = selector?;
    if remaining == 0 {
        return None;
    }
    if idx > removed {
        Some(idx - 1)
    } else if idx == removed {
        // Clamp to the last remaining entry.
        Some(idx.min(remaining - 1))
    } else {
        Some(idx)
    }
}

fn write_record(path: &Path, settings: &Settings) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_vec_pretty(settings)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, raw)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (tempfile::TempDir, SettingsManager) {
        let dir = tempfile::tempdir().unwrap();
        let mgr = SettingsManager::load(dir.path().join("settings.json"));
        (dir, mgr)
    }

    fn svc(name: &str) -> AiService {
        AiService {
            name: name.to_string(),
            api_key: "k".to_string(),
            api_url: "https://api.example.com/v1".to_string(),
            model: "m".to_string(),
        }
    }

    #[test]
    fn flag_mutators_report_unchanged_on_reapply() {
        let (_dir, mgr) = manager();
        assert!(mgr.chat_enabled());
        assert!(mgr.set_chat_enabled(false));
        assert!(!mgr.set_chat_enabled(false));
        assert!(!mgr.chat_enabled());
    }

    #[test]
    fn first_service_becomes_current_for_both_selectors() {
        let (_dir, mgr) = manager();
        assert!(mgr.current_chat_service().is_none());
        assert!(mgr.add_service(svc("a")));
        assert_eq!(mgr.current_chat_service().unwrap().name, "a");
        assert_eq!(mgr.current_vision_service().unwrap().name, "a");
        // Duplicate names rejected.
        assert!(!mgr.add_service(svc("a")));
    }

    #[test]
    fn removing_selected_service_repoints_selectors() {
        let (_dir, mgr) = manager();
        mgr.add_service(svc("a"));
        mgr.add_service(svc("b"));
        mgr.add_service(svc("c"));
        mgr.select_chat_service("b");
        mgr.select_vision_service("c");

        // Removing "b" (index 1): chat was at 1, clamps to remaining index 1
        // ("c"); vision was at 2, shifts down to "c" as well.
        assert!(mgr.remove_service("b"));
        assert_eq!(mgr.current_chat_service().unwrap().name, "c");
        assert_eq!(mgr.current_vision_service().unwrap().name, "c");

        // Removing the last entries clears the selectors.
        mgr.remove_service("c");
        assert_eq!(mgr.current_chat_service().unwrap().name, "a");
        mgr.remove_service("a");
        assert!(mgr.current_chat_service().is_none());
        assert!(mgr.current_vision_service().is_none());
    }

    #[test]
    fn selector_never_dangles_after_tail_removal() {
        let (_dir, mgr) = manager();
        mgr.add_service(svc("a"));
        mgr.add_service(svc("b"));
        mgr.select_chat_service("b");
        assert!(mgr.remove_service("b"));
        // Selector was at the removed tail index; it must clamp, not dangle.
        assert_eq!(mgr.current_chat_service().unwrap().name, "a");
    }

    #[test]
    fn select_reports_unchanged_when_already_current() {
        let (_dir, mgr) = manager();
        mgr.add_service(svc("a"));
        assert!(!mgr.select_chat_service("a"));
        assert!(!mgr.select_chat_service("missing"));
    }

    #[test]
    fn mutations_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        {
            let mgr = SettingsManager::load(&path);
            mgr.set_persona("terse and direct");
            mgr.add_admin("1000");
            mgr.enable_group("42");
            mgr.add_service(svc("a"));
            mgr.set_tools_enabled(true);
        }
        let mgr = SettingsManager::load(&path);
        assert_eq!(mgr.persona(), "terse and direct");
        assert!(mgr.is_admin("1000"));
        assert!(mgr.is_group_enabled("42"));
        assert_eq!(mgr.current_chat_service().unwrap().name, "a");
        assert!(mgr.tools_enabled());
    }

    #[test]
    fn corrupt_record_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let mgr = SettingsManager::load(&path);
        assert_eq!(mgr.snapshot(), Settings::default());
    }

    #[test]
    fn base_activity_rejects_out_of_range() {
        let (_dir, mgr) = manager();
        assert!(!mgr.set_base_activity(1.5));
        assert!(!mgr.set_base_activity(-0.1));
        assert!(mgr.set_base_activity(0.5));
        assert_eq!(mgr.base_activity(), 0.5);
    }

    #[test]
    fn tool_server_enable_toggle_is_idempotent() {
        let (_dir, mgr) = manager();
        let server = ToolServer {
            transport: ToolTransport::Sse {
                url: "https://tools.example.com/sse".to_string(),
                headers: BTreeMap::new(),
            },
            enabled: true,
        };
        assert!(mgr.add_tool_server("search", server.clone()));
        assert!(!mgr.add_tool_server("search", server));
        assert!(mgr.set_tool_server_enabled("search", false));
        assert!(!mgr.set_tool_server_enabled("search", false));
        assert!(mgr.enabled_tool_servers().is_empty());
        assert_eq!(mgr.tool_servers().len(), 1);
    }
}
