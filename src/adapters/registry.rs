//! Immutable adapter/plugin registry built once at startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::adapters::local_key::LocalKeyAdapter;
use crate::adapters::node_accounts::NodeAccountsAdapter;
use crate::adapters::plugin::{AdapterPlugin, ChainGuardPlugin};
use crate::adapters::types::{AdapterDescriptor, WalletAdapter};
use crate::config::schema::{AdapterKind, AppConfig, PluginKind};
use crate::error::{WalletError, WalletResult};

enum Pending {
    Descriptor(AdapterDescriptor),
    Instance {
        adapter: Arc<dyn WalletAdapter>,
        priority: i32,
    },
}

impl Pending {
    fn name(&self) -> &str {
        match self {
            Pending::Descriptor(d) => &d.name,
            Pending::Instance { adapter, .. } => adapter.name(),
        }
    }
}

/// Collects adapters and plugins before the registry is frozen.
///
/// Registering a second adapter under an existing name replaces the first
/// one in place (upsert), keeping its registration slot.
#[derive(Default)]
pub struct AdapterRegistryBuilder {
    adapters: Vec<Pending>,
    plugins: Vec<Arc<dyn AdapterPlugin>>,
}

impl AdapterRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from the `[[adapters]]` and `[[plugins]]` tables.
    pub fn from_config(config: &AppConfig) -> WalletResult<Self> {
        let mut builder = Self::new();
        for adapter in &config.adapters {
            builder = builder.with_adapter(AdapterDescriptor {
                name: adapter.name.clone(),
                kind: adapter.kind,
                settings: adapter.settings.clone(),
                priority: adapter.priority,
            });
        }
        for plugin in &config.plugins {
            let built: Arc<dyn AdapterPlugin> = match plugin.kind {
                PluginKind::ChainGuard => {
                    Arc::new(ChainGuardPlugin::from_settings(&plugin.name, &plugin.settings)?)
                }
            };
            builder = builder.with_plugin(built);
        }
        Ok(builder)
    }

    fn upsert(&mut self, entry: Pending) {
        match self.adapters.iter().position(|p| p.name() == entry.name()) {
            Some(idx) => {
                tracing::debug!(adapter = %entry.name(), "Replacing adapter registration");
                self.adapters[idx] = entry;
            }
            None => self.adapters.push(entry),
        }
    }

    /// Register (or replace) an adapter built from a descriptor.
    pub fn with_adapter(mut self, descriptor: AdapterDescriptor) -> Self {
        self.upsert(Pending::Descriptor(descriptor));
        self
    }

    /// Register (or replace) an already constructed adapter.
    pub fn with_instance(mut self, adapter: Arc<dyn WalletAdapter>, priority: i32) -> Self {
        self.upsert(Pending::Instance { adapter, priority });
        self
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn AdapterPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Construct every adapter and freeze the registry.
    pub fn build(self) -> WalletResult<AdapterRegistry> {
        if self.adapters.is_empty() {
            return Err(WalletError::Initialization(
                "no wallet adapters registered".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(self.adapters.len());
        for pending in self.adapters {
            let entry = match pending {
                Pending::Descriptor(d) => {
                    let adapter: Arc<dyn WalletAdapter> = match d.kind {
                        AdapterKind::LocalKey => {
                            Arc::new(LocalKeyAdapter::from_settings(&d.name, &d.settings)?)
                        }
                        AdapterKind::NodeAccounts => {
                            Arc::new(NodeAccountsAdapter::from_settings(&d.name, &d.settings)?)
                        }
                    };
                    RegisteredAdapter {
                        adapter,
                        priority: d.priority,
                    }
                }
                Pending::Instance { adapter, priority } => RegisteredAdapter { adapter, priority },
            };
            entries.push(entry);
        }

        entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.adapter.name().cmp(b.adapter.name()))
        });

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.adapter.name().to_string(), i))
            .collect();

        tracing::info!(
            adapters = entries.len(),
            plugins = self.plugins.len(),
            "Adapter registry built"
        );

        Ok(AdapterRegistry {
            entries,
            index,
            plugins: self.plugins,
        })
    }
}

struct RegisteredAdapter {
    adapter: Arc<dyn WalletAdapter>,
    priority: i32,
}

/// Frozen set of named adapters and the plugins that augment them.
pub struct AdapterRegistry {
    entries: Vec<RegisteredAdapter>,
    index: HashMap<String, usize>,
    plugins: Vec<Arc<dyn AdapterPlugin>>,
}

impl AdapterRegistry {
    pub fn builder() -> AdapterRegistryBuilder {
        AdapterRegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn WalletAdapter>> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].adapter.clone())
    }

    /// Adapter names, highest priority first, then by name.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.adapter.name()).collect()
    }

    /// Highest priority adapter.
    pub fn default_adapter(&self) -> Arc<dyn WalletAdapter> {
        self.entries[0].adapter.clone()
    }

    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn WalletAdapter>> {
        self.entries.iter().map(|e| &e.adapter)
    }

    pub fn plugins(&self) -> &[Arc<dyn AdapterPlugin>] {
        &self.plugins
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
