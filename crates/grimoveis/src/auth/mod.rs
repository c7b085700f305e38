//! Account registration, login, and the bearer-token gate for mutating routes.

pub mod domain;
pub mod gate;
pub mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod token;


pub use domain::{AuthenticatedUser, LoginSession, User, UserId};
pub use gate::require_bearer;
pub use repository::{CredentialRepository, InMemoryCredentialRepository};
pub use router::{auth_router, CredentialsPayload};
pub use service::{AuthService, AuthServiceError};
pub use token::{Claims, TokenAuthority, TokenError};
