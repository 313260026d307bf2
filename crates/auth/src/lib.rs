//! `onboard-auth`: credentials, sessions and the authentication gate.
//!
//! This crate is intentionally decoupled from HTTP. Storage is reached only
//! through `onboard_core::AccountRepository` and the `SessionStore` trait.

pub mod error;
pub mod gate;
pub mod identity;
pub mod password;
pub mod roles;
pub mod session;
pub mod token;

pub use error::AuthError;
pub use gate::AuthGate;
pub use identity::Identity;
pub use password::{
    PasswordHashError, hash_password, hash_password_blocking, verify_password,
    verify_password_blocking,
};
pub use roles::Role;
pub use session::{InMemorySessionStore, Session, SessionStore};
pub use token::generate_token;
