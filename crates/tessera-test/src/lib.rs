//! Shared test utilities for the Tessera orchestrator.
//!
//! Mock collaborators plus fixtures, used by integration tests as a
//! dev-dependency.
//!
//! ```toml
//! [dev-dependencies]
//! tessera-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera_test::{EventLog, MockEntryLoader, MockLifecycleEngine, test_app};
//!
//! #[tokio::test]
//! async fn test_activation() {
//!     let events = EventLog::new();
//!     let engine = Arc::new(MockLifecycleEngine::new(events.clone()));
//!     let orchestrator = tessera_orchestrator::Orchestrator::builder()
//!         .engine(engine.clone())
//!         .entry_loader(Arc::new(MockEntryLoader::new(events.clone())))
//!         .build()
//!         .unwrap();
//!
//!     orchestrator.register_micro_apps(vec![test_app("a")], None).await;
//!     orchestrator.start(Default::default()).await.unwrap();
//!     engine.activate("a").await.unwrap();
//!
//!     assert!(events.contains("mount:a"));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
