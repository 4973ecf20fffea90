//! `Agora` Common Library
//!
//! Authorization vocabulary shared by the engine and its transport adapters.

pub mod error;
pub mod path;
pub mod role;

pub use error::{ErrorCode, Issue};
pub use path::ArgumentPath;
pub use role::{ParseRoleError, Role};
