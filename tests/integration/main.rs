//! Integration test modules.

mod cascade_test;
mod dashboard_test;
mod logbook_scenarios_test;
