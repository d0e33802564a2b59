//! Integration tests against a local fixture upstream

mod e2e;
mod fixtures;
