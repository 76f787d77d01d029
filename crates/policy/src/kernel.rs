use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Action, AuditFlags, Role, SessionOrigin};

/// Which actions the UI should expose for a session.
///
/// Serialized with the action names as keys, e.g. `{"edit:journal": true, ...}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxPolicy {
    #[serde(rename = "edit:journal")]
    pub edit_journal: bool,
    #[serde(rename = "view:revisions")]
    pub view_revisions: bool,
    #[serde(rename = "trigger:webhook")]
    pub trigger_webhook: bool,
    #[serde(rename = "access:admin-panel")]
    pub access_admin_panel: bool,
    #[serde(rename = "create:entry")]
    pub create_entry: bool,
    #[serde(rename = "override:auditLock")]
    pub override_audit_lock: bool,
}

impl UxPolicy {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::EditJournal => self.edit_journal,
            Action::ViewRevisions => self.view_revisions,
            Action::TriggerWebhook => self.trigger_webhook,
            Action::AccessAdminPanel => self.access_admin_panel,
            Action::CreateEntry => self.create_entry,
            Action::OverrideAuditLock => self.override_audit_lock,
        }
    }

    /// Allowed actions in declaration order.
    pub fn granted(&self) -> Vec<Action> {
        Action::ALL.into_iter().filter(|a| self.allows(*a)).collect()
    }
}

/// Derive the UX policy for a role, session origin and audit mode.
///
/// Pure and total: every combination yields a policy. Auditors and automated
/// sessions are read-only; super-admins bypass everything except that the
/// audit lock can only be overridden while audit mode is on.
pub fn compute_access_policy(role: Role, origin: SessionOrigin, flags: &AuditFlags) -> UxPolicy {
    let is_super = role == Role::SuperAdmin;
    let is_read_only = role == Role::Auditor || origin == SessionOrigin::Automated;
    let is_web_admin = origin == SessionOrigin::Web && role == Role::Admin;

    let policy = UxPolicy {
        edit_journal: is_super || (!is_read_only && matches!(role, Role::Admin | Role::Finance)),
        view_revisions: role != Role::ApiUser,
        trigger_webhook: is_super || is_web_admin,
        access_admin_panel: is_super || role == Role::Admin,
        create_entry: !is_read_only,
        override_audit_lock: is_super && flags.is_audit_mode,
    };
    debug!(%role, %origin, audit_mode = flags.is_audit_mode, granted = ?policy.granted(), "computed access policy");
    policy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(role: Role, origin: SessionOrigin) -> UxPolicy {
        compute_access_policy(role, origin, &AuditFlags::default())
    }

    #[test]
    fn super_admin_gets_everything_but_the_audit_lock() {
        for origin in SessionOrigin::ALL {
            let p = policy(Role::SuperAdmin, origin);
            assert!(p.edit_journal, "{origin}");
            assert!(p.view_revisions);
            assert!(p.trigger_webhook);
            assert!(p.access_admin_panel);
            assert!(!p.override_audit_lock);
        }
        // Automated sessions are read-only, even for super-admins.
        assert!(!policy(Role::SuperAdmin, SessionOrigin::Automated).create_entry);
        assert!(policy(Role::SuperAdmin, SessionOrigin::Web).create_entry);
    }

    #[test]
    fn audit_lock_needs_super_admin_and_audit_mode() {
        let on = AuditFlags::audit_mode();
        for role in Role::ALL {
            for origin in SessionOrigin::ALL {
                let p = compute_access_policy(role, origin, &on);
                assert_eq!(p.override_audit_lock, role == Role::SuperAdmin, "{role}/{origin}");
            }
        }
    }

    #[test]
    fn admin_webhook_only_from_web() {
        assert!(policy(Role::Admin, SessionOrigin::Web).trigger_webhook);
        assert!(!policy(Role::Admin, SessionOrigin::Api).trigger_webhook);
        assert!(!policy(Role::Admin, SessionOrigin::Mobile).trigger_webhook);
        assert!(!policy(Role::Finance, SessionOrigin::Web).trigger_webhook);
    }

    #[test]
    fn admin_and_finance_edit_unless_automated() {
        for role in [Role::Admin, Role::Finance] {
            assert!(policy(role, SessionOrigin::Web).edit_journal);
            assert!(policy(role, SessionOrigin::Mobile).edit_journal);
            assert!(policy(role, SessionOrigin::Api).edit_journal);
            assert!(!policy(role, SessionOrigin::Automated).edit_journal);
        }
        assert!(policy(Role::Admin, SessionOrigin::Automated).access_admin_panel);
    }

    #[test]
    fn auditor_is_read_only() {
        for origin in SessionOrigin::ALL {
            let p = policy(Role::Auditor, origin);
            assert_eq!(p.granted(), vec![Action::ViewRevisions], "{origin}");
        }
    }

    #[test]
    fn api_user_creates_but_never_views_revisions() {
        let p = policy(Role::ApiUser, SessionOrigin::Api);
        assert_eq!(p.granted(), vec![Action::CreateEntry]);
        assert!(policy(Role::ApiUser, SessionOrigin::Automated).granted().is_empty());
    }

    #[test]
    fn full_matrix_is_consistent_with_allows() {
        for role in Role::ALL {
            for origin in SessionOrigin::ALL {
                for flags in [AuditFlags::default(), AuditFlags::audit_mode()] {
                    let p = compute_access_policy(role, origin, &flags);
                    let granted = p.granted();
                    for action in Action::ALL {
                        assert_eq!(granted.contains(&action), p.allows(action));
                    }
                    // Only the audit lock depends on audit mode.
                    let mut off = compute_access_policy(role, origin, &AuditFlags::default());
                    off.override_audit_lock = p.override_audit_lock;
                    assert_eq!(off, p);
                }
            }
        }
    }

    #[test]
    fn serializes_with_action_keys() {
        let p = policy(Role::Finance, SessionOrigin::Web);
        let value = serde_json::to_value(p).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "edit:journal": true,
                "view:revisions": true,
                "trigger:webhook": false,
                "access:admin-panel": false,
                "create:entry": true,
                "override:auditLock": false,
            })
        );
        let back: UxPolicy = serde_json::from_value(value).unwrap();
        assert_eq!(back, p);
    }
}
