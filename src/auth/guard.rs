//! Authorization Guard
//! Mission: Decide whether an authenticated principal may act on a target

use crate::auth::models::{User, UserRole};
use crate::error::{AppError, AppResult};

/// The identity behind an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        match self.role {
            UserRole::Admin => true,
            UserRole::Teacher | UserRole::Student => false,
        }
    }
}

/// Admin, or the same principal as the target
pub fn authorize(principal: &Principal, target_id: i64) -> AppResult<&Principal> {
    if principal.is_admin() || principal.id == target_id {
        Ok(principal)
    } else {
        Err(AppError::forbidden("Access denied."))
    }
}

pub fn require_admin<'a>(principal: &'a Principal, action: &str) -> AppResult<&'a Principal> {
    require_role(principal, &[UserRole::Admin], action)
}

/// Principal's role must be one of `allowed`
pub fn require_role<'a>(
    principal: &'a Principal,
    allowed: &[UserRole],
    action: &str,
) -> AppResult<&'a Principal> {
    if allowed.contains(&principal.role) {
        Ok(principal)
    } else {
        Err(AppError::forbidden(format!(
            "Only {} can {}.",
            describe(allowed),
            action
        )))
    }
}

fn describe(roles: &[UserRole]) -> String {
    let names: Vec<&str> = roles
        .iter()
        .map(|role| match role {
            UserRole::Admin => "admins",
            UserRole::Teacher => "teachers",
            UserRole::Student => "students",
        })
        .collect();
    names.join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: i64, role: UserRole) -> Principal {
        Principal {
            id,
            username: format!("user{}", id),
            role,
        }
    }

    #[test]
    fn test_admin_permitted_for_any_target() {
        let admin = principal(1, UserRole::Admin);
        for target in [1, 2, 42, -7] {
            assert!(authorize(&admin, target).is_ok());
        }
    }

    #[test]
    fn test_non_admin_only_self() {
        for role in [UserRole::Teacher, UserRole::Student] {
            let p = principal(5, role);
            assert!(authorize(&p, 5).is_ok());
            assert!(matches!(authorize(&p, 6), Err(AppError::Forbidden(_))));
        }
    }

    #[test]
    fn test_require_role() {
        let teacher = principal(2, UserRole::Teacher);
        let student = principal(3, UserRole::Student);

        assert!(require_role(&teacher, &[UserRole::Admin, UserRole::Teacher], "create topics").is_ok());
        assert!(require_role(&student, &[UserRole::Admin, UserRole::Teacher], "create topics").is_err());
        assert!(require_admin(&teacher, "approve notes").is_err());
        assert!(require_admin(&principal(1, UserRole::Admin), "approve notes").is_ok());
    }

    #[test]
    fn test_forbidden_message_names_roles() {
        let student = principal(3, UserRole::Student);
        match require_role(&student, &[UserRole::Teacher], "create notes") {
            Err(AppError::Forbidden(msg)) => assert_eq!(msg, "Only teachers can create notes."),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }
}
