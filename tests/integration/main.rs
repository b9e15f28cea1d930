#[path = "../common/mod.rs"]
mod common;

mod placement_tests;
mod settlement_tests;
