//! Authentication
//!
//! Resolves the acting principal from request credentials.

mod error;
pub mod jwt;
mod principal;

pub use error::{AuthError, AuthResult};
pub use jwt::generate_access_token;
pub use principal::{JwtPrincipalResolver, Principal, PrincipalResolver, RequestContext};
