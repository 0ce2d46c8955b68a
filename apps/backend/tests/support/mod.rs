#![allow(dead_code)]

pub mod app_builder;
pub mod tenants;
pub mod test_state;
