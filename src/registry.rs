//! Type-to-config binding.
//!
//! Hosts register each concrete [`View`] type under the class binding used in
//! the configuration table. Loading the table then builds a lookup from Rust
//! type identity to the view's declaration.

use crate::config::ViewConfigEntry;
use crate::error::{ViewError, ViewResult};
use crate::view::View;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
struct TypeBinding {
    type_id: TypeId,
    type_name: &'static str,
}

/// Class bindings known to the host, in registration order.
#[derive(Debug, Default, Clone)]
pub struct ViewTypes {
    bindings: HashMap<String, TypeBinding>,
    order: Vec<String>,
}

impl ViewTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `T` to `class_binding`. The first type registered for a binding keeps it.
    pub fn register<T: View>(&mut self, class_binding: &str) -> &mut Self {
        let binding = TypeBinding {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        };

        if let Some(existing) = self.bindings.get(class_binding) {
            warn!(
                "Class binding '{}' already bound to {}; ignoring {}",
                class_binding, existing.type_name, binding.type_name
            );
            return self;
        }

        self.bindings.insert(class_binding.to_string(), binding);
        self.order.push(class_binding.to_string());
        self
    }

    /// Builder form of [`ViewTypes::register`].
    pub fn with<T: View>(mut self, class_binding: &str) -> Self {
        self.register::<T>(class_binding);
        self
    }

    fn lookup(&self, class_binding: &str) -> Option<TypeBinding> {
        self.bindings.get(class_binding).copied()
    }

    pub fn class_bindings(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Immutable mapping from view type to its declaration.
#[derive(Debug, Default, Clone)]
pub struct ViewConfigRegistry {
    by_type: HashMap<TypeId, Arc<ViewConfigEntry>>,
    entries: Vec<Arc<ViewConfigEntry>>,
}

impl ViewConfigRegistry {
    /// Build the registry from table entries.
    ///
    /// Entries whose class binding has no registered type are skipped. When two
    /// entries resolve to the same type, the earlier one wins.
    pub fn load(raw_entries: &[ViewConfigEntry], types: &ViewTypes) -> Self {
        let mut registry = Self::default();

        for entry in raw_entries {
            let Some(binding) = types.lookup(&entry.class_binding) else {
                debug!(
                    "Skipping view '{}': class binding '{}' is not registered",
                    entry.view_name, entry.class_binding
                );
                continue;
            };

            if registry.by_type.contains_key(&binding.type_id) {
                debug!(
                    "Skipping view '{}': {} already has a config entry",
                    entry.view_name, binding.type_name
                );
                continue;
            }

            let entry = Arc::new(entry.clone());
            registry.by_type.insert(binding.type_id, Arc::clone(&entry));
            registry.entries.push(entry);
        }

        debug!("View registry built with {} entries", registry.entries.len());
        registry
    }

    /// Look up the declaration for a type id.
    pub fn resolve(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> ViewResult<&Arc<ViewConfigEntry>> {
        self.by_type
            .get(&type_id)
            .ok_or(ViewError::UnregisteredViewType { type_name })
    }

    pub fn resolve_type<T: View>(&self) -> ViewResult<&Arc<ViewConfigEntry>> {
        self.resolve(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    pub fn contains<T: View>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Registered entries in table order.
    pub fn entries(&self) -> &[Arc<ViewConfigEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ViewStart;
    struct ViewShop;
    struct ViewUnlisted;

    impl View for ViewStart {
        type Args = ();
        fn create(_: ()) -> Self {
            ViewStart
        }
    }

    impl View for ViewShop {
        type Args = ();
        fn create(_: ()) -> Self {
            ViewShop
        }
    }

    impl View for ViewUnlisted {
        type Args = ();
        fn create(_: ()) -> Self {
            ViewUnlisted
        }
    }

    fn types() -> ViewTypes {
        ViewTypes::new()
            .with::<ViewStart>("Game.ViewStart")
            .with::<ViewShop>("Game.ViewShop")
    }

    #[test]
    fn test_resolve_registered_type() {
        let registry = ViewConfigRegistry::load(
            &[ViewConfigEntry::new("Start", "Game.ViewStart", "UI/Start")],
            &types(),
        );

        let entry = registry.resolve_type::<ViewStart>().expect("start entry");
        assert_eq!(entry.asset_path, "UI/Start");
        assert!(registry.contains::<ViewStart>());
        assert!(!registry.contains::<ViewShop>());
    }

    #[test]
    fn test_unresolved_bindings_are_skipped() {
        let registry = ViewConfigRegistry::load(
            &[
                ViewConfigEntry::new("Ghost", "Game.Missing", "UI/Ghost"),
                ViewConfigEntry::new("Shop", "Game.ViewShop", "UI/Shop"),
            ],
            &types(),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].view_name, "Shop");
    }

    #[test]
    fn test_first_entry_wins_on_duplicates() {
        let registry = ViewConfigRegistry::load(
            &[
                ViewConfigEntry::new("ShopA", "Game.ViewShop", "UI/ShopA"),
                ViewConfigEntry::new("ShopB", "Game.ViewShop", "UI/ShopB"),
            ],
            &types(),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.resolve_type::<ViewShop>().unwrap().view_name,
            "ShopA"
        );
    }

    #[test]
    fn test_unregistered_type_is_a_distinct_error() {
        let registry = ViewConfigRegistry::load(&[], &types());
        let err = registry.resolve_type::<ViewUnlisted>().unwrap_err();
        assert!(matches!(err, ViewError::UnregisteredViewType { type_name } if type_name.ends_with("ViewUnlisted")));
    }

    #[test]
    fn test_first_type_keeps_binding() {
        let mut types = ViewTypes::new();
        types
            .register::<ViewStart>("Game.Shared")
            .register::<ViewShop>("Game.Shared");
        assert_eq!(types.len(), 1);

        let registry = ViewConfigRegistry::load(
            &[ViewConfigEntry::new("Shared", "Game.Shared", "UI/Shared")],
            &types,
        );
        assert!(registry.contains::<ViewStart>());
        assert!(!registry.contains::<ViewShop>());
    }
}
