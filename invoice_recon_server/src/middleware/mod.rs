mod callback_auth;

pub use callback_auth::{CallbackAuthMiddlewareFactory, CallbackAuthMiddlewareService};
