//! Workflow-automation integration.
//!
//! # Data Flow
//! ```text
//! template.json (bundled)
//!     → template.rs (substitute device id)
//!     → served as-is, or
//!     → client.rs (POST to the caller's automation instance)
//!
//! welcome.rs: variables seeded next to a new subscription
//! ```

pub mod client;
pub mod template;
pub mod welcome;

pub use client::{WorkflowClient, WorkflowTarget};
pub use template::{personalize, workflow_template, PLACEHOLDER};
pub use welcome::{default_welcome_variables, WelcomeVariable};
