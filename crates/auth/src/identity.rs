use serde::Serialize;

use onboard_core::{CompanyId, UserId, UserRecord};

use crate::Role;

/// An authenticated, currently active user.
///
/// Built fresh from the user row on every `AuthGate::authenticate` call; never
/// cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub email: String,
    pub role: Role,
}

impl From<UserRecord> for Identity {
    fn from(user: UserRecord) -> Self {
        Self {
            user_id: user.id,
            company_id: user.company_id,
            email: user.email,
            role: Role::new(user.role),
        }
    }
}
