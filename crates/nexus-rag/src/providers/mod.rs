//! External collaborator boundaries: completion gateway and authentication

pub mod auth;
pub mod completion;
pub mod gateway;

pub use auth::{AuthProvider, StaticTokenAuth};
pub use completion::{CompletionProvider, TokenStream};
pub use gateway::GatewayClient;
