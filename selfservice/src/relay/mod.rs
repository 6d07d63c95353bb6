mod action;
mod context;
mod envelope;
mod errors;
mod proxy;

pub use action::RelayAction;
pub use context::{LOGIN_REQUIRED_STATUS, context, pre_context, split_user_realm};
pub use envelope::{
    DEFAULT_ERROR_CODE, EnvelopeError, EnvelopeResult, ErrorCode, ErrorEnvelope, version_string,
};
pub use errors::RelayError;
pub use proxy::{RelayReply, call_remote, relay};
