//! vaultflow Cloud Infrastructure
//!
//! This crate provides the cloud provider abstraction for vaultflow and the
//! small engine that applies what providers register.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 vaultflow CLI                    │
//! │            (vaultflow up/preview)                │
//! └─────────────────┬───────────────────────────────┘
//!                   │ deploy()
//! ┌─────────────────▼───────────────────────────────┐
//! │               vaultflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait CloudProvider { deploy() }         │   │
//! │  └──────────────────┬───────────────────────┘   │
//! │                     │ register_resource()        │
//! │  ┌──────────────────▼───┐  ┌──────────────┐     │
//! │  │  Stack (Output<T>)   │──│  State Mgmt  │     │
//! │  └──────────────────┬───┘  └──────────────┘     │
//! └─────────────────────┼───────────────────────────┘
//!                       │ trait ResourceBackend
//!               ┌───────▼───────┐
//!               │     koyeb     │
//!               │   provider    │
//!               └───────────────┘
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod output;
pub mod provider;
pub mod resource;
pub mod state;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use engine::{ResourceBackend, Stack, UpResult};
pub use error::{CloudError, Result};
pub use output::{Output, OutputResolver};
pub use provider::{CloudProvider, ServiceHandle, ServiceStatus};
pub use resource::{ProviderBinding, ResourceConfig, ResourceOptions};
pub use state::{GlobalState, ResourceState, ResourceStatus, StateLock, StateManager};
