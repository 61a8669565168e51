//! Background prefetch of registered apps.

use std::sync::Arc;

use tessera_config::{ImportEntryOpts, PrefetchStrategy};
use tracing::{debug, info};

use crate::app::RegistrableApp;

/// Schedules background fetching of app entries.
///
/// Implementations decide timing (idle callbacks, after first mount, ...)
/// and which apps to fetch for a given strategy.
pub trait PrefetchScheduler: Send + Sync {
    /// Hand the scheduler the apps known at start and the strategy to apply.
    fn do_prefetch_strategy(
        &self,
        apps: &[Arc<RegistrableApp>],
        strategy: &PrefetchStrategy,
        import_entry: &ImportEntryOpts,
    );
}

/// A scheduler that never prefetches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrefetch;

impl PrefetchScheduler for NoPrefetch {
    fn do_prefetch_strategy(
        &self,
        _apps: &[Arc<RegistrableApp>],
        _strategy: &PrefetchStrategy,
        _import_entry: &ImportEntryOpts,
    ) {
    }
}

/// Hand `apps` to the scheduler if `strategy` enables prefetching.
///
/// Returns whether the scheduler was invoked.
pub fn trigger_prefetch(
    scheduler: &dyn PrefetchScheduler,
    apps: &[Arc<RegistrableApp>],
    strategy: &PrefetchStrategy,
    import_entry: &ImportEntryOpts,
) -> bool {
    if !strategy.is_enabled() {
        debug!("prefetch disabled");
        return false;
    }

    info!(apps = apps.len(), strategy = %strategy, "scheduling prefetch");
    scheduler.do_prefetch_strategy(apps, strategy, import_entry);
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::app::AppName;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(Vec<String>, PrefetchStrategy)>>,
    }

    impl PrefetchScheduler for Recorder {
        fn do_prefetch_strategy(
            &self,
            apps: &[Arc<RegistrableApp>],
            strategy: &PrefetchStrategy,
            _import_entry: &ImportEntryOpts,
        ) {
            let names = apps.iter().map(|a| a.name.to_string()).collect();
            self.calls.lock().unwrap().push((names, strategy.clone()));
        }
    }

    fn apps() -> Vec<Arc<RegistrableApp>> {
        ["a", "b"]
            .into_iter()
            .map(|n| Arc::new(RegistrableApp::new(AppName::from_static(n), "//cdn", "/")))
            .collect()
    }

    #[test]
    fn test_disabled_skips_scheduler() {
        let recorder = Recorder::default();
        let fired = trigger_prefetch(
            &recorder,
            &apps(),
            &PrefetchStrategy::Disabled,
            &ImportEntryOpts::new(),
        );
        assert!(!fired);
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_enabled_forwards_apps_and_strategy() {
        let recorder = Recorder::default();
        let strategy = PrefetchStrategy::Named(vec!["b".into()]);

        let fired = trigger_prefetch(&recorder, &apps(), &strategy, &ImportEntryOpts::new());

        assert!(fired);
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec!["a", "b"]);
        assert_eq!(calls[0].1, strategy);
    }

    #[test]
    fn test_no_prefetch_is_silent() {
        assert!(trigger_prefetch(
            &NoPrefetch,
            &apps(),
            &PrefetchStrategy::All,
            &ImportEntryOpts::new()
        ));
    }
}
