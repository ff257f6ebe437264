//! Environment binder: links a Python virtual environment to the IRIS embedded
//! Python installation by writing a `.pth` record into its site-packages.
//!
//! Callers (the CLI) build a [`BindConfig`](irisbind_core::config::BindConfig)
//! once and pass it to [`binder::bind`], [`binder::unbind`] or [`binder::status`].

pub mod binder;
pub mod cpf;
pub mod fsutil;
pub mod install;
pub mod instance;
pub mod libpython;
pub mod linkage;
pub mod venv;

pub use binder::{bind, status, unbind, BindOptions, BindOutcome, UnbindOutcome};
