mod challenge;
mod form;
mod types;

pub use challenge::{
    FAILURE_REASON_HEADER, LoginChallenge, POST_LOGIN_REDIRECT, combine_password,
    split_combined_password,
};
pub use form::{LoginForm, parse_params};
pub use types::ChallengeOutcome;
