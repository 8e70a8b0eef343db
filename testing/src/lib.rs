//! # Agentflow Testing
//!
//! Testing utilities and helpers for Agentflow pipelines.
//!
//! This crate provides:
//! - A scripted [`Generator`](agentflow_core::Generator) for deterministic runs
//! - Open-stream accounting for cancellation tests
//! - A Given-When-Then harness for pipelines
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use agentflow_testing::{PipelineTest, ScriptedGenerator};
//!
//! #[tokio::test]
//! async fn test_spec_extraction() {
//!     let generator = Arc::new(
//!         ScriptedGenerator::new()
//!             .respond_when("Extract", "CPU: 3.5 GHz, 16GB RAM, 1TB SSD")
//!             .respond_when("Transform", r#"{"cpu":"3.5 GHz","memory":"16GB","storage":"1TB"}"#),
//!     );
//!
//!     PipelineTest::new(&spec_extraction_chain(generator)?)
//!         .given_input("text_input", "a laptop with 16GB of RAM and 1TB of storage")
//!         .then_output(|output| assert_eq!(output.as_structured().unwrap()["memory"], "16GB"))
//!         .run()
//!         .await;
//! }
//! ```

/// Scripted generation collaborator
pub mod scripted;

/// Stream connection accounting
pub mod tracker;

/// Given-When-Then harness for pipelines
pub mod pipeline_test;

/// Test helpers and utilities
pub mod helpers {
    /// Install a test-friendly tracing subscriber
    ///
    /// Honors `RUST_LOG` and writes through the test harness so output is
    /// captured per test. Safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Valid state keys (`[A-Za-z_][A-Za-z0-9_]*`)
    pub fn state_key() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_]{0,15}"
    }

    /// Template-safe literal text: no braces
    pub fn literal_text() -> impl Strategy<Value = String> {
        "[^{}]{0,40}"
    }

    /// Generated replies made of space-separated words
    pub fn reply_text() -> impl Strategy<Value = String> {
        prop::collection::vec("[A-Za-z0-9.,]{1,10}", 0..20).prop_map(|words| words.join(" "))
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use pipeline_test::PipelineTest;
pub use scripted::{RecordedCall, ScriptedGenerator, word_fragments};
pub use tracker::{ConnectionGuard, ConnectionTracker};

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::StateKey;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn generated_keys_are_valid(key in properties::state_key()) {
            prop_assert!(StateKey::is_valid(&key));
        }

        #[test]
        fn reply_fragments_reassemble(text in properties::reply_text()) {
            prop_assert_eq!(word_fragments(&text).concat(), text);
        }
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
    }
}
