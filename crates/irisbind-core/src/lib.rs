pub mod config;
pub mod error;
pub mod iris_version;
pub mod observability;
pub mod platform;

pub use error::{BindError, ErrorKind};
pub use platform::Platform;
