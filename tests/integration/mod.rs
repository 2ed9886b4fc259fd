//! Integration Tests Module
//!
//! End-to-end tests for the orchestration core, driven by a scripted
//! provider that records every request it receives.

// Mock provider, fixture tools, and harness
mod support;

// Continuation chaining, budget accounting, dispatch failures
mod orchestrator_test;

// Built-in tool catalog through the orchestrator
mod catalog_test;

// Batch loop and provider auto-switch
mod batch_test;

// Provider availability and registry lookups
mod providers_test;
