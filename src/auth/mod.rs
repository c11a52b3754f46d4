pub mod authenticated;
pub mod credentials;
pub mod error;
pub mod jwt;

pub use authenticated::{authenticate, bearer_token, Authenticated};
pub use credentials::{CredentialsError, TokenCredentials};
pub use error::AuthError;
pub use jwt::{Audience, TokenClaims, TokenValidator};
