use std::fmt;
use std::str::FromStr;

use super::errors::RelayError;

/// A user action forwarded to `/userservice/<action>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayAction {
    Enable,
    Disable,
    Delete,
    Reset,
    Unassign,
    /// Legacy spelling still served by older remote versions
    Unassigne,
    Setpin,
    Setmpin,
    Resync,
    Assign,
    Enroll,
    Webprovision,
    Getmultiotp,
    GetSerialByOtp,
    History,
    Activateocratoken,
    Finshocratoken,
    Finshocra2token,
    TokenCall,
    LoadForm,
}

impl RelayAction {
    pub const ALL: [RelayAction; 20] = [
        Self::Enable,
        Self::Disable,
        Self::Delete,
        Self::Reset,
        Self::Unassign,
        Self::Unassigne,
        Self::Setpin,
        Self::Setmpin,
        Self::Resync,
        Self::Assign,
        Self::Enroll,
        Self::Webprovision,
        Self::Getmultiotp,
        Self::GetSerialByOtp,
        Self::History,
        Self::Activateocratoken,
        Self::Finshocratoken,
        Self::Finshocra2token,
        Self::TokenCall,
        Self::LoadForm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Delete => "delete",
            Self::Reset => "reset",
            Self::Unassign => "unassign",
            Self::Unassigne => "unassigne",
            Self::Setpin => "setpin",
            Self::Setmpin => "setmpin",
            Self::Resync => "resync",
            Self::Assign => "assign",
            Self::Enroll => "enroll",
            Self::Webprovision => "webprovision",
            Self::Getmultiotp => "getmultiotp",
            Self::GetSerialByOtp => "getSerialByOtp",
            Self::History => "history",
            Self::Activateocratoken => "activateocratoken",
            Self::Finshocratoken => "finshocratoken",
            Self::Finshocra2token => "finshocra2token",
            Self::TokenCall => "token_call",
            Self::LoadForm => "load_form",
        }
    }

    pub fn path(&self) -> String {
        format!("/userservice/{}", self.as_str())
    }

    /// Whether the local session guard must pass before relaying
    pub fn requires_session_guard(&self) -> bool {
        !matches!(self, Self::LoadForm)
    }

    /// Whether the remote reply is relayed as raw text instead of JSON
    pub fn returns_text(&self) -> bool {
        matches!(self, Self::LoadForm)
    }
}

impl fmt::Display for RelayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelayAction {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|action| action.as_str() == s)
            .copied()
            .ok_or_else(|| RelayError::UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_action() {
        for action in RelayAction::ALL {
            assert_eq!(action.as_str().parse::<RelayAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(
            "getSerialByOtp".parse::<RelayAction>().unwrap(),
            RelayAction::GetSerialByOtp
        );
        assert!("getserialbyotp".parse::<RelayAction>().is_err());
        assert!(matches!(
            "drop_tables".parse::<RelayAction>(),
            Err(RelayError::UnknownAction(name)) if name == "drop_tables"
        ));
    }

    #[test]
    fn test_only_load_form_is_unguarded() {
        let unguarded: Vec<_> = RelayAction::ALL
            .iter()
            .filter(|a| !a.requires_session_guard())
            .collect();
        assert_eq!(unguarded, vec![&RelayAction::LoadForm]);
        assert!(RelayAction::LoadForm.returns_text());
        assert!(!RelayAction::Enable.returns_text());
    }

    #[test]
    fn test_path() {
        assert_eq!(RelayAction::TokenCall.path(), "/userservice/token_call");
    }
}
