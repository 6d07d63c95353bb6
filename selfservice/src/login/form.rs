use url::form_urlencoded;

use crate::transport::Params;

/// Decode an `application/x-www-form-urlencoded` string. Later keys win.
pub fn parse_params(encoded: &str) -> Params {
    form_urlencoded::parse(encoded.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Fields of a login form submission
///
/// Values from the query string take precedence over form body values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    fields: Params,
}

impl LoginForm {
    pub fn new(query: &str, body: &str) -> Self {
        let mut fields = parse_params(body);
        fields.extend(parse_params(query));
        Self { fields }
    }

    pub fn from_params(fields: Params) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn login(&self) -> Option<&str> {
        self.get("login")
    }

    pub fn password(&self) -> Option<&str> {
        self.get("password")
    }

    pub fn realm(&self) -> Option<&str> {
        self.get("realm").filter(|r| !r.is_empty())
    }

    pub fn otp(&self) -> &str {
        self.get("otp").unwrap_or_default()
    }
}
