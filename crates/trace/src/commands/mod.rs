//! Command handlers, one module per subcommand.

pub mod add;
pub mod axis;
pub mod completion;
pub mod edit;
pub mod eval;
pub mod init;
pub mod list;
pub mod mv;
pub mod rm;
pub mod set;
pub mod version;
