//! selfservice - session relay core for a two-factor token self-service front-end
//!
//! This crate authenticates end users against a remote token-management
//! service, remembers the remote session in a signed composite identity and
//! relays user actions to the remote service on their behalf.

mod auth;
mod config;
mod identity;
mod login;
mod relay;
mod session;
mod transport;
mod utils;

pub use auth::{AuthError, Credentials, authenticate, enrich};

pub use config::{
    ConfigError, DEFAULT_IDENTITY_COOKIE, DEFAULT_LOCAL_SESSION_COOKIE, DEFAULT_REMOTE_COOKIE_NAME,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SESSION_COMPARE_LEN, HERE_PLACEHOLDER, SelfServiceConfig,
    SelfServiceConfigBuilder, TlsFiles, substitute_here,
};

pub use identity::{CompositeId, Identity, IdentityError, open_identity, seal_identity};

pub use login::{
    ChallengeOutcome, FAILURE_REASON_HEADER, LoginChallenge, LoginForm, POST_LOGIN_REDIRECT,
    combine_password, parse_params, split_combined_password,
};

pub use relay::{
    DEFAULT_ERROR_CODE, EnvelopeError, EnvelopeResult, ErrorCode, ErrorEnvelope,
    LOGIN_REQUIRED_STATUS, RelayAction, RelayError, RelayReply, call_remote, context, pre_context,
    relay, split_user_realm, version_string,
};

pub use session::{SESSION_KEY_LENGTH, SessionError, SessionGuard};

pub use transport::{
    Connection, Params, RemoteErrorDetail, RemoteReply, RemoteResponse, RemoteResult,
    TransportError, accept_language_headers, is_truthy, transport_security_warning,
};

pub use utils::{
    CookieOptions, UtilError, base32_decode, base32_encode, gen_random_string,
    header_expire_cookie, header_set_cookie,
};
