mod auth;
mod observe;

pub use auth::auth_middleware;
pub use observe::observe_requests;
