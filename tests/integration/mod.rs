//! Integration tests for the dashboard orchestrator
//!
//! Every component is driven against the scripted `MockSiteApi` in `support`.


mod aggregation_test;
mod conversation_test;
mod dashboard_test;
