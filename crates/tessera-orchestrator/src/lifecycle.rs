//! Lifecycle functions, bundles and framework hooks.
//!
//! A loaded app exposes its lifecycle as a [`LifecycleBundle`]. Each phase
//! is a single async function or an ordered sequence of them, run one after
//! another with the same props.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::app::{LoadableApp, LoadingIndicator};
use crate::error::OrchestratorResult;

/// The boxed future every lifecycle function returns.
pub type LifecycleFuture = BoxFuture<'static, OrchestratorResult<()>>;

/// An async lifecycle function taking the app's props.
#[derive(Clone)]
pub struct LifecycleFn(Arc<dyn Fn(Value) -> LifecycleFuture + Send + Sync>);

impl LifecycleFn {
    /// Wrap an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OrchestratorResult<()>> + Send + 'static,
    {
        Self(Arc::new(move |props| Box::pin(f(props))))
    }

    /// A step that does nothing.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|_| async { Ok(()) })
    }

    /// Invoke the function.
    #[must_use]
    pub fn call(&self, props: Value) -> LifecycleFuture {
        (self.0)(props)
    }
}

impl fmt::Debug for LifecycleFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LifecycleFn")
    }
}

/// One lifecycle phase: a single function or an ordered sequence.
#[derive(Debug, Clone)]
pub enum Lifecycle {
    /// A single function.
    Single(LifecycleFn),
    /// Functions run in order; the first error stops the sequence.
    Sequence(Vec<LifecycleFn>),
}

impl Lifecycle {
    /// Normalize into an ordered list of steps.
    #[must_use]
    pub fn into_steps(self) -> Vec<LifecycleFn> {
        match self {
            Self::Single(step) => vec![step],
            Self::Sequence(steps) => steps,
        }
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Sequence(steps) => steps.len(),
        }
    }

    /// Whether there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every step in order.
    ///
    /// # Errors
    ///
    /// Returns the first error a step produces. Later steps are not run.
    pub async fn run(&self, props: &Value) -> OrchestratorResult<()> {
        match self {
            Self::Single(step) => step.call(props.clone()).await,
            Self::Sequence(steps) => {
                for step in steps {
                    step.call(props.clone()).await?;
                }
                Ok(())
            },
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::Sequence(Vec::new())
    }
}

impl From<LifecycleFn> for Lifecycle {
    fn from(step: LifecycleFn) -> Self {
        Self::Single(step)
    }
}

impl From<Vec<LifecycleFn>> for Lifecycle {
    fn from(steps: Vec<LifecycleFn>) -> Self {
        Self::Sequence(steps)
    }
}

/// Lifecycle phase, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// One-time initialization.
    Bootstrap,
    /// Attach to the page.
    Mount,
    /// Detach from the page.
    Unmount,
    /// Props changed while mounted.
    Update,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bootstrap => write!(f, "bootstrap"),
            Self::Mount => write!(f, "mount"),
            Self::Unmount => write!(f, "unmount"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Everything the lifecycle engine needs to drive a loaded app.
#[derive(Debug, Clone, Default)]
pub struct LifecycleBundle {
    /// Runs once before the first mount.
    pub bootstrap: Lifecycle,
    /// Attaches the app.
    pub mount: Lifecycle,
    /// Detaches the app.
    pub unmount: Lifecycle,
    /// Optional props update.
    pub update: Option<Lifecycle>,
}

impl LifecycleBundle {
    /// A bundle with the given mount and unmount phases and an empty bootstrap.
    pub fn new(mount: impl Into<Lifecycle>, unmount: impl Into<Lifecycle>) -> Self {
        Self {
            bootstrap: Lifecycle::default(),
            mount: mount.into(),
            unmount: unmount.into(),
            update: None,
        }
    }

    /// Set the bootstrap phase.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: impl Into<Lifecycle>) -> Self {
        self.bootstrap = bootstrap.into();
        self
    }

    /// Set the update phase.
    #[must_use]
    pub fn with_update(mut self, update: impl Into<Lifecycle>) -> Self {
        self.update = Some(update.into());
        self
    }

    /// Bracket the mount phase with loading signals.
    ///
    /// The mount phase becomes `[signal(true), ..mount, signal(false)]`.
    /// Every other phase is untouched. If a mount step fails, the closing
    /// `signal(false)` never runs and the indicator stays in loading state.
    #[must_use]
    pub fn with_loading_bracket(mut self, indicator: &LoadingIndicator) -> Self {
        let raise = indicator.clone();
        let lower = indicator.clone();

        let mut steps = vec![LifecycleFn::new(move |_| {
            let raise = raise.clone();
            async move {
                raise.signal(true);
                Ok(())
            }
        })];
        steps.extend(std::mem::take(&mut self.mount).into_steps());
        steps.push(LifecycleFn::new(move |_| {
            let lower = lower.clone();
            async move {
                lower.signal(false);
                Ok(())
            }
        }));

        self.mount = Lifecycle::Sequence(steps);
        self
    }
}

/// The hook points exposed to framework-level observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Before the entry is fetched.
    BeforeLoad,
    /// Before the app mounts.
    BeforeMount,
    /// After the app mounted.
    AfterMount,
    /// Before the app unmounts.
    BeforeUnmount,
    /// After the app unmounted.
    AfterUnmount,
}

/// A framework-level hook, called with the app being processed.
pub type LifecycleHook = Arc<dyn Fn(LoadableApp) -> LifecycleFuture + Send + Sync>;

/// Framework-level hooks, forwarded to the entry loader untouched.
#[derive(Clone, Default)]
pub struct FrameworkLifeCycles {
    before_load: Vec<LifecycleHook>,
    before_mount: Vec<LifecycleHook>,
    after_mount: Vec<LifecycleHook>,
    before_unmount: Vec<LifecycleHook>,
    after_unmount: Vec<LifecycleHook>,
}

impl FrameworkLifeCycles {
    /// No hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to a phase.
    #[must_use]
    pub fn with_hook<F, Fut>(mut self, phase: HookPhase, f: F) -> Self
    where
        F: Fn(LoadableApp) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OrchestratorResult<()>> + Send + 'static,
    {
        let hook: LifecycleHook = Arc::new(move |app| Box::pin(f(app)));
        self.hooks_mut(phase).push(hook);
        self
    }

    /// Hooks registered for a phase, in order.
    #[must_use]
    pub fn hooks(&self, phase: HookPhase) -> &[LifecycleHook] {
        match phase {
            HookPhase::BeforeLoad => &self.before_load,
            HookPhase::BeforeMount => &self.before_mount,
            HookPhase::AfterMount => &self.after_mount,
            HookPhase::BeforeUnmount => &self.before_unmount,
            HookPhase::AfterUnmount => &self.after_unmount,
        }
    }

    fn hooks_mut(&mut self, phase: HookPhase) -> &mut Vec<LifecycleHook> {
        match phase {
            HookPhase::BeforeLoad => &mut self.before_load,
            HookPhase::BeforeMount => &mut self.before_mount,
            HookPhase::AfterMount => &mut self.after_mount,
            HookPhase::BeforeUnmount => &mut self.before_unmount,
            HookPhase::AfterUnmount => &mut self.after_unmount,
        }
    }

    /// Run a phase's hooks in order.
    ///
    /// # Errors
    ///
    /// Returns the first hook error.
    pub async fn run(&self, phase: HookPhase, app: &LoadableApp) -> OrchestratorResult<()> {
        for hook in self.hooks(phase) {
            hook(app.clone()).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for FrameworkLifeCycles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameworkLifeCycles")
            .field("before_load", &self.before_load.len())
            .field("before_mount", &self.before_mount.len())
            .field("after_mount", &self.after_mount.len())
            .field("before_unmount", &self.before_unmount.len())
            .field("after_unmount", &self.after_unmount.len())
            .finish()
    }
}
