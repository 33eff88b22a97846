mod callback_signature;

pub use callback_signature::{sign_callback, verify_callback, verify_callback_at, SignatureError, REPLAY_WINDOW_SECS};
