//! Protocol registry and descriptors.
//!
//! # Responsibilities
//! - Describe how to reach and interpret one protocol (descriptor)
//! - Build the registry from the enabled protocol list at startup
//! - Look up descriptors by protocol id
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookup via HashMap
//! - Unknown ids in configuration are a startup error, never a runtime one

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::quake3::Quake3;
use super::source::SourceEngine;
use super::{PortRole, ProtocolPlugin, Transport};
use crate::config::ProtocolsConfig;

/// Every protocol id this build knows how to query.
pub const CATALOGUE: &[&str] = &[
    "quake3",
    "openarena",
    "urbanterror",
    "wolfet",
    "source",
    "css",
    "tf2",
    "csgo",
    "gmod",
];

/// Error type for registry construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown protocol id '{0}'")]
    UnknownProtocol(String),

    #[error("Protocol id '{0}' is listed more than once")]
    Duplicate(String),
}

/// Static description of one queryable protocol.
#[derive(Debug, Clone)]
pub struct ProtocolDescriptor {
    id: String,
    name: String,
    plugin: Arc<dyn ProtocolPlugin>,
    transport: Transport,
    port_role: PortRole,
    actions: Option<&'static str>,
    timeout: Option<Duration>,
}

impl ProtocolDescriptor {
    /// Create a descriptor that queries the query port with the default deadline.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        plugin: Arc<dyn ProtocolPlugin>,
        transport: Transport,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            plugin,
            transport,
            port_role: PortRole::Query,
            actions: None,
            timeout: None,
        }
    }

    /// Restrict actions to the given alphabet of lowercase letters.
    pub fn with_actions(mut self, actions: &'static str) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Override the configured default deadline for this protocol.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_port_role(mut self, role: PortRole) -> Self {
        self.port_role = role;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin(&self) -> &dyn ProtocolPlugin {
        self.plugin.as_ref()
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn port_role(&self) -> PortRole {
        self.port_role
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether `letter` is an action this protocol understands.
    ///
    /// Descriptors without a declared alphabet accept any letter.
    pub fn supports_action(&self, letter: char) -> bool {
        self.actions.map_or(true, |alphabet| alphabet.contains(letter))
    }
}

/// Read-only map from protocol id to descriptor.
#[derive(Debug, Default)]
pub struct ProtocolRegistry {
    descriptors: HashMap<String, ProtocolDescriptor>,
}

impl ProtocolRegistry {
    /// Build the registry from the enabled list in configuration.
    pub fn from_config(config: &ProtocolsConfig) -> Result<Self, RegistryError> {
        let mut descriptors = Vec::with_capacity(config.enabled.len());
        for id in &config.enabled {
            let descriptor = catalogue_entry(id)
                .ok_or_else(|| RegistryError::UnknownProtocol(id.clone()))?;
            descriptors.push(descriptor);
        }
        Self::from_descriptors(descriptors)
    }

    /// Build a registry from explicit descriptors.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ProtocolDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut map = HashMap::new();
        for descriptor in descriptors {
            if map.contains_key(descriptor.id()) {
                return Err(RegistryError::Duplicate(descriptor.id));
            }
            map.insert(descriptor.id.clone(), descriptor);
        }

        tracing::info!(protocols = map.len(), "Protocol registry built");
        Ok(Self { descriptors: map })
    }

    pub fn get(&self, id: &str) -> Option<&ProtocolDescriptor> {
        self.descriptors.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Look up a compiled-in protocol by id.
pub fn catalogue_entry(id: &str) -> Option<ProtocolDescriptor> {
    let quake3 = |name: &str| {
        ProtocolDescriptor::new(id, name, Arc::new(Quake3), Transport::Udp)
            .with_actions("bsep")
    };
    // A2S needs a challenge round trip per section.
    let source = |name: &str| {
        ProtocolDescriptor::new(id, name, Arc::new(SourceEngine), Transport::Udp)
            .with_actions("bsep")
            .with_timeout(Duration::from_millis(2000))
    };

    let descriptor = match id {
        "quake3" => quake3("Quake III Arena"),
        "openarena" => quake3("OpenArena"),
        "urbanterror" => quake3("Urban Terror"),
        "wolfet" => quake3("Wolfenstein: Enemy Territory"),
        "source" => source("Source Engine"),
        "css" => source("Counter-Strike: Source"),
        "tf2" => source("Team Fortress 2"),
        "csgo" => source("Counter-Strike: Global Offensive"),
        "gmod" => source("Garry's Mod"),
        _ => return None,
    };
    Some(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_is_complete() {
        for id in CATALOGUE {
            let descriptor = catalogue_entry(id).expect("catalogue id without entry");
            assert_eq!(descriptor.id(), *id);
        }
        assert!(catalogue_entry("test").is_none());
    }

    #[test]
    fn test_from_config_rejects_unknown() {
        let config = ProtocolsConfig {
            enabled: vec!["quake3".into(), "doom3".into()],
        };
        let err = ProtocolRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownProtocol(id) if id == "doom3"));
    }

    #[test]
    fn test_from_config_rejects_duplicates() {
        let config = ProtocolsConfig {
            enabled: vec!["tf2".into(), "tf2".into()],
        };
        assert!(matches!(
            ProtocolRegistry::from_config(&config),
            Err(RegistryError::Duplicate(_))
        ));
    }

    #[test]
    fn test_lookup() {
        let registry = ProtocolRegistry::from_config(&ProtocolsConfig::default()).unwrap();
        assert_eq!(registry.len(), CATALOGUE.len());

        let tf2 = registry.get("tf2").unwrap();
        assert_eq!(tf2.transport(), Transport::Udp);
        assert_eq!(tf2.timeout(), Some(Duration::from_millis(2000)));
        assert!(tf2.supports_action('p'));
        assert!(tf2.supports_action('b'));
        assert!(!tf2.supports_action('x'));

        assert!(registry.get("TF2").is_none());
        assert!(!registry.contains("test"));
    }
}
