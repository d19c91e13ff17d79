//! Handle → identifier resolution
//!
//! Handles are only meaningful within one capture. Discovery lines bind them to
//! identifiers; later accesses refer to the handle alone. A handle with no
//! binding resolves to a fallback label, never to an error.

use crate::types::{AddressMap, Handle, LogEvent, UNKNOWN_HANDLE_LABEL};

/// Accumulates handle bindings for one run
#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    map: AddressMap,
}

impl AddressResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register characteristic discoveries; other events are ignored
    ///
    /// A rediscovered handle is rebound (last discovery wins).
    pub fn observe(&mut self, event: &LogEvent) {
        if let LogEvent::CharacteristicDiscovered {
            identifier,
            handle,
            line,
            ..
        } = event
        {
            if let Some(previous) = self.map.insert(*handle, identifier.clone()) {
                if previous != *identifier {
                    log::debug!(
                        "line {}: handle {} rebound from {} to {}",
                        line,
                        handle,
                        previous,
                        identifier
                    );
                }
            }
        }
    }

    /// Bound identifier for a handle, if any
    pub fn lookup(&self, handle: Handle) -> Option<&str> {
        self.map.get(&handle).map(String::as_str)
    }

    /// Identifier for a handle, or `Handle_<hex>`
    pub fn resolve(&self, handle: Handle) -> String {
        self.lookup(handle)
            .map(str::to_string)
            .unwrap_or_else(|| handle.fallback_label())
    }

    /// Identifier for an access event
    ///
    /// Precedence: bound handle, identifier mentioned on the line, handle
    /// fallback label, `Handle_unknown`.
    pub fn resolve_entry(&self, handle: Option<Handle>, mentioned: Option<&str>) -> String {
        if let Some(id) = handle.and_then(|h| self.lookup(h)) {
            return id.to_string();
        }
        if let Some(id) = mentioned {
            return id.to_string();
        }
        match handle {
            Some(handle) => handle.fallback_label(),
            None => UNKNOWN_HANDLE_LABEL.to_string(),
        }
    }

    /// Current map contents
    pub fn snapshot(&self) -> AddressMap {
        self.map.clone()
    }

    pub fn into_map(self) -> AddressMap {
        self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovered(identifier: &str, handle: u16) -> LogEvent {
        LogEvent::CharacteristicDiscovered {
            line: 1,
            timestamp: None,
            identifier: identifier.to_string(),
            handle: Handle(handle),
        }
    }

    #[test]
    fn test_unregistered_handle_falls_back() {
        let resolver = AddressResolver::new();
        assert_eq!(resolver.resolve(Handle(0x12)), "Handle_0012");
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_registered_handle() {
        let mut resolver = AddressResolver::new();
        resolver.observe(&discovered("FFF3", 0x12));
        assert_eq!(resolver.resolve(Handle(0x0012)), "FFF3");
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_last_discovery_wins() {
        let mut resolver = AddressResolver::new();
        resolver.observe(&discovered("FFF3", 0x12));
        resolver.observe(&discovered("FFF4", 0x12));
        assert_eq!(resolver.resolve(Handle(0x12)), "FFF4");
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_shared_identifier() {
        let mut resolver = AddressResolver::new();
        resolver.observe(&discovered("FFF3", 0x12));
        resolver.observe(&discovered("FFF3", 0x14));
        assert_eq!(resolver.resolve(Handle(0x14)), "FFF3");
        assert_eq!(resolver.snapshot().len(), 2);
    }

    #[test]
    fn test_other_events_are_ignored() {
        let mut resolver = AddressResolver::new();
        resolver.observe(&LogEvent::ServiceDiscovered {
            line: 1,
            timestamp: None,
            identifier: "FFF0".to_string(),
        });
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_entry_precedence() {
        let mut resolver = AddressResolver::new();
        resolver.observe(&discovered("FFF3", 0x12));
        assert_eq!(resolver.resolve_entry(Some(Handle(0x12)), Some("FFF7")), "FFF3");
        assert_eq!(resolver.resolve_entry(Some(Handle(0x20)), Some("FFF7")), "FFF7");
        assert_eq!(resolver.resolve_entry(Some(Handle(0x20)), None), "Handle_0020");
        assert_eq!(resolver.resolve_entry(None, None), "Handle_unknown");
    }
}
