//! HTTP and end-to-end flow tests.

mod gate_tests;
mod health_tests;
mod login_tests;
mod route_guard_tests;
