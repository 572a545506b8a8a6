//! Scenario tests spanning the parser, scopes and dataset helpers.

mod scope_integration_tests;
