use uuid::Uuid;

use crate::principal::Principal;
use crate::principal::Role;

/// The authenticated caller of one request.
///
/// Resolved once per request from the bearer token and passed explicitly
/// to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub principal_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<&Principal> for Caller {
    fn from(principal: &Principal) -> Self {
        Self {
            principal_id: principal.id,
            username: principal.username.clone(),
            role: principal.role,
        }
    }
}

/// Owner of the resource a request touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner<'a> {
    Nobody,
    Id(&'a Uuid),
    Username(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Require role `required`, or ownership of the resource.
pub fn authorize(caller: &Caller, required: Role, owner: Owner<'_>) -> Access {
    let owns = match owner {
        Owner::Nobody => false,
        Owner::Id(id) => caller.principal_id == *id,
        Owner::Username(username) => caller.username == username,
    };

    if caller.role.grants(required) || owns {
        Access::Allow
    } else {
        Access::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> Caller {
        Caller {
            principal_id: Uuid::new_v4(),
            username: "alice".to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_passes_every_guard() {
        let admin = caller(Role::Admin);
        let someone_else = Uuid::new_v4();

        assert_eq!(authorize(&admin, Role::Admin, Owner::Nobody), Access::Allow);
        assert_eq!(
            authorize(&admin, Role::Admin, Owner::Id(&someone_else)),
            Access::Allow
        );
        assert_eq!(authorize(&admin, Role::User, Owner::Nobody), Access::Allow);
    }

    #[test]
    fn test_user_needs_ownership_for_admin_guard() {
        let user = caller(Role::User);
        let own_id = user.principal_id;
        let other_id = Uuid::new_v4();

        assert_eq!(authorize(&user, Role::Admin, Owner::Id(&own_id)), Access::Allow);
        assert_eq!(authorize(&user, Role::Admin, Owner::Id(&other_id)), Access::Deny);
        assert_eq!(authorize(&user, Role::Admin, Owner::Nobody), Access::Deny);
    }

    #[test]
    fn test_ownership_by_username() {
        let user = caller(Role::User);

        assert_eq!(
            authorize(&user, Role::Admin, Owner::Username("alice")),
            Access::Allow
        );
        assert_eq!(
            authorize(&user, Role::Admin, Owner::Username("bob")),
            Access::Deny
        );
    }

    #[test]
    fn test_any_authenticated_user_passes_user_guard() {
        let user = caller(Role::User);

        assert_eq!(authorize(&user, Role::User, Owner::Nobody), Access::Allow);
    }
}
