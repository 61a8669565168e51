//! Micro app registry.
//!
//! Keeps the ordered list of registered apps. Registration is idempotent by
//! name: an app whose name is already known is silently skipped, including
//! a repeat of a name earlier in the same batch.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::app::{AppName, RegistrableApp};

/// Ordered registry of micro apps, keyed by [`AppName`].
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: RwLock<Vec<Arc<RegistrableApp>>>,
}

impl AppRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit every app whose name is not yet registered.
    ///
    /// The whole batch is admitted under one write lock, so readers observe
    /// either none or all of it. Returns the admitted apps in input order.
    pub async fn admit(&self, apps: Vec<RegistrableApp>) -> Vec<Arc<RegistrableApp>> {
        let mut registered = self.apps.write().await;
        let mut admitted = Vec::new();

        for app in apps {
            if registered.iter().any(|known| known.name == app.name) {
                debug!(app = %app.name, "app already registered; skipping");
                continue;
            }
            let app = Arc::new(app);
            registered.push(Arc::clone(&app));
            admitted.push(app);
        }

        admitted
    }

    /// All registered apps in registration order.
    pub async fn snapshot(&self) -> Vec<Arc<RegistrableApp>> {
        self.apps.read().await.clone()
    }

    /// Look up an app by name.
    pub async fn get(&self, name: &AppName) -> Option<Arc<RegistrableApp>> {
        self.apps
            .read()
            .await
            .iter()
            .find(|app| &app.name == name)
            .cloned()
    }

    /// Whether an app with this name is registered.
    pub async fn contains(&self, name: &AppName) -> bool {
        self.get(name).await.is_some()
    }

    /// Registered names in registration order.
    pub async fn names(&self) -> Vec<AppName> {
        self.apps
            .read()
            .await
            .iter()
            .map(|app| app.name.clone())
            .collect()
    }

    /// Number of registered apps.
    pub async fn len(&self) -> usize {
        self.apps.read().await.len()
    }

    /// Whether no apps are registered.
    pub async fn is_empty(&self) -> bool {
        self.apps.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, entry: &str) -> RegistrableApp {
        RegistrableApp::new(AppName::from_static(name), entry, format!("/{name}"))
    }

    #[tokio::test]
    async fn test_admit_new_apps() {
        let registry = AppRegistry::new();
        let admitted = registry.admit(vec![app("a", "//a"), app("b", "//b")]).await;

        assert_eq!(admitted.len(), 2);
        assert_eq!(registry.len().await, 2);
        assert_eq!(registry.names().await, vec![AppName::from_static("a"), AppName::from_static("b")]);
    }

    #[tokio::test]
    async fn test_duplicate_names_skipped_first_wins() {
        let registry = AppRegistry::new();
        registry.admit(vec![app("a", "//first")]).await;

        let admitted = registry.admit(vec![app("a", "//second"), app("c", "//c")]).await;

        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].name, "c");
        let a = registry.get(&AppName::from_static("a")).await.unwrap();
        assert_eq!(a.entry, "//first");
    }

    #[tokio::test]
    async fn test_duplicates_within_batch() {
        let registry = AppRegistry::new();
        let admitted = registry
            .admit(vec![app("x", "//one"), app("x", "//two")])
            .await;

        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].entry, "//one");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let registry = AppRegistry::new();
        assert!(registry.admit(Vec::new()).await.is_empty());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_contains() {
        let registry = AppRegistry::new();
        registry.admit(vec![app("a", "//a")]).await;
        assert!(registry.contains(&AppName::from_static("a")).await);
        assert!(!registry.contains(&AppName::from_static("b")).await);
    }

    #[tokio::test]
    async fn test_concurrent_registration_admits_each_name_once() {
        let registry = Arc::new(AppRegistry::new());
        let mut handles = Vec::new();
        for i in 0..4 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .admit(vec![app("shared", &format!("//{i}")), app(&format!("own{i}"), "//own")])
                    .await
                    .len()
            }));
        }

        let mut total = 0_usize;
        for handle in handles {
            total = total.saturating_add(handle.await.unwrap());
        }

        assert_eq!(total, 5);
        assert_eq!(registry.len().await, 5);
    }
}
