mod helpers;
mod login;
mod middleware;
mod token;

pub use helpers::{AuthedIdentity, validate_session};
pub use login::{LoginOutcome, login, logout};
pub use middleware::{AuthError, RequireAdmin, RequireUser};
pub use token::{MintedToken, SessionTokens, token_lookup};
