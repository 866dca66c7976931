//! End-to-end pipeline scenarios with deterministic providers.

mod lifecycle_scenarios;
mod support;
