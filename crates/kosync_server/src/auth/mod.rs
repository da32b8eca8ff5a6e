mod gate;
mod middleware;

pub use gate::{AuthGate, AuthUser, Credentials};
pub use middleware::{RequireAuth, require_accept_header};
