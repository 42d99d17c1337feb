//! Tool implementations available to agents
//!
//! ## Providers
//!
//! - [`RuntimeToolProvider`]: the runtime built-ins (`shell.execute`,
//!   `filesystem.read_text`), attached to an agent directly or hosted by an
//!   in-process server
//! - [`FunctionToolProvider`]: async Rust functions registered as tools

pub mod filesystem;
pub mod function;
pub mod runtime;
pub mod shell;

pub use filesystem::FILESYSTEM_READ_TEXT;
pub use function::FunctionToolProvider;
pub use runtime::{DEFAULT_SHELL_TIMEOUT, RUNTIME_TOOLS, RuntimeToolProvider};
pub use shell::SHELL_EXECUTE;
