pub mod health_tests;
pub mod lifecycle_tests;
pub mod membership_tests;
