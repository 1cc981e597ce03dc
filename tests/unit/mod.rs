// Unit tests organized by module

#[path = "../common/mod.rs"]
mod common;

mod test_policy_create;
mod test_properties;
