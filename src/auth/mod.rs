mod log_in;
mod middleware;
mod register;
mod token;

pub use log_in::{LogInRequest, log_in_endpoint};
pub use middleware::{AuthState, auth_guard};
pub use register::{CredentialsState, RegisterRequest, register_endpoint};
pub use token::{AuthResponse, Claims, decode_token, encode_token};
