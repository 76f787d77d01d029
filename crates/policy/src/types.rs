use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Failure to parse a role, origin or action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyParseError {
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("unknown session origin '{0}'")]
    UnknownOrigin(String),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

/// Who is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Finance,
    Auditor,
    ApiUser,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Finance,
        Role::Auditor,
        Role::ApiUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super-admin",
            Role::Admin => "admin",
            Role::Finance => "finance",
            Role::Auditor => "auditor",
            Role::ApiUser => "api-user",
        }
    }
}

/// Where the session comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrigin {
    Web,
    Api,
    Automated,
    Mobile,
}

impl SessionOrigin {
    pub const ALL: [SessionOrigin; 4] = [
        SessionOrigin::Web,
        SessionOrigin::Api,
        SessionOrigin::Automated,
        SessionOrigin::Mobile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOrigin::Web => "web",
            SessionOrigin::Api => "api",
            SessionOrigin::Automated => "automated",
            SessionOrigin::Mobile => "mobile",
        }
    }
}

/// A gated UI/API capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "edit:journal")]
    EditJournal,
    #[serde(rename = "view:revisions")]
    ViewRevisions,
    #[serde(rename = "trigger:webhook")]
    TriggerWebhook,
    #[serde(rename = "access:admin-panel")]
    AccessAdminPanel,
    #[serde(rename = "create:entry")]
    CreateEntry,
    #[serde(rename = "override:auditLock")]
    OverrideAuditLock,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::EditJournal,
        Action::ViewRevisions,
        Action::TriggerWebhook,
        Action::AccessAdminPanel,
        Action::CreateEntry,
        Action::OverrideAuditLock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::EditJournal => "edit:journal",
            Action::ViewRevisions => "view:revisions",
            Action::TriggerWebhook => "trigger:webhook",
            Action::AccessAdminPanel => "access:admin-panel",
            Action::CreateEntry => "create:entry",
            Action::OverrideAuditLock => "override:auditLock",
        }
    }
}

/// Session modifiers beyond role and origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFlags {
    /// Absent counts as off.
    #[serde(default)]
    pub is_audit_mode: bool,
}

impl AuditFlags {
    pub fn audit_mode() -> Self {
        Self { is_audit_mode: true }
    }
}

macro_rules! str_enum {
    ($ty:ty, $err:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = PolicyParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| PolicyParseError::$err(s.to_string()))
            }
        }
    };
}

str_enum!(Role, UnknownRole);
str_enum!(SessionOrigin, UnknownOrigin);
str_enum!(Action, UnknownAction);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        for origin in SessionOrigin::ALL {
            assert_eq!(origin.to_string().parse::<SessionOrigin>().unwrap(), origin);
        }
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_names_are_errors() {
        assert_eq!(
            "root".parse::<Role>(),
            Err(PolicyParseError::UnknownRole("root".to_string()))
        );
        assert!("desktop".parse::<SessionOrigin>().is_err());
        assert!("override:auditlock".parse::<Action>().is_err());
    }

    #[test]
    fn serde_names_match_display() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"super-admin\"");
        assert_eq!(serde_json::to_string(&Role::ApiUser).unwrap(), "\"api-user\"");
        assert_eq!(serde_json::to_string(&SessionOrigin::Automated).unwrap(), "\"automated\"");
        for action in Action::ALL {
            assert_eq!(
                serde_json::to_string(&action).unwrap(),
                format!("\"{}\"", action.as_str())
            );
        }
    }

    #[test]
    fn audit_flags_default_off() {
        let flags: AuditFlags = serde_json::from_str("{}").unwrap();
        assert_eq!(flags, AuditFlags::default());
        assert!(!flags.is_audit_mode);

        let on: AuditFlags = serde_json::from_str(r#"{"isAuditMode": true}"#).unwrap();
        assert_eq!(on, AuditFlags::audit_mode());
    }
}
