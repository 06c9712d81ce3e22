#![cfg(all(test, unix))]
//! Cross-crate tests that drive the real process plumbing against stub
//! scanner scripts written to a temporary directory.

mod discovery;
mod scanner;
mod support;
