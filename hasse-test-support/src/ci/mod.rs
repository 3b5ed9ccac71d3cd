//! Environment-driven knobs shared by the CI property suites.

pub mod property_test_profile;
