//! Directory entries the engine reads to pick detector subjects and
//! notification recipients.

use serde::{Deserialize, Serialize};

/// Directory role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Supervisor,
    Admin,
}

impl Role {
    /// Role whose members are subjects of activity monitoring
    pub const MONITORED: Role = Role::Student;

    /// Roles that receive alert fan-out
    pub const SUPERVISORY: [Role; 2] = [Role::Supervisor, Role::Admin];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}
