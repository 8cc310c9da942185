//! Integration tests for the goscript binary.

#![cfg(unix)]

mod build_tests;
mod run_tests;
