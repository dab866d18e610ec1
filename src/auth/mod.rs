mod bootstrap;
mod gate;
mod middleware;
mod password;
mod session;

pub use bootstrap::{bootstrap_state, check_first_run};
pub use gate::{AdminAction, AuthGate, Caller, SessionDirective};
pub use middleware::{AuthError, RequireAdmin, SessionToken};
pub use password::PasswordHasher;
pub use session::SessionStore;
