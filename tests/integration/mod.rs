//! End-to-end installer tests against in-process fakes.

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod install_flow;
mod uninstall_flow;
