pub mod capability;
pub mod middleware;
pub mod password;
pub mod session;

pub use capability::{authorize, Action, Viewer};
pub use middleware::{MaybeUser, RequireUser};
pub use password::{hash_password, normalize_email, verify_password};
pub use session::{
    clear_session_cookie, generate_session_token, session_cookie, session_token_from_cookies,
    SessionDuration,
};
