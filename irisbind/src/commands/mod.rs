//! CLI commands. Each builds nothing itself: it takes the `BindConfig` built once
//! in `run_cli`, calls into `irisbind_env::binder`, and prints the report.

pub mod bind;
pub mod status;
