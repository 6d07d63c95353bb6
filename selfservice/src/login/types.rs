use http::{HeaderMap, StatusCode};

/// Decision of the challenge and guard components, applied by the web layer
#[derive(Debug, Clone, PartialEq)]
pub enum ChallengeOutcome {
    /// Proceed with the request
    Continue,
    /// Answer with `302 Found` to `location`, adding `headers`
    Redirect { location: String, headers: HeaderMap },
    /// Answer with `status` and `reason` and no further processing
    Reject { status: StatusCode, reason: String },
}

impl ChallengeOutcome {
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn reject(status: StatusCode, reason: impl Into<String>) -> Self {
        Self::Reject {
            status,
            reason: reason.into(),
        }
    }
}
