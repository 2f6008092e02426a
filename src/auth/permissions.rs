use anyhow::Error;
use once_cell::sync::Lazy;
use rocket::serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnAttendance,
    ViewOwnResults,
    ViewOwnNotifications,
    ApplyLeave,
    SubmitFeedback,
    ViewBooks,

    TakeAttendance,
    RecordResults,
    ManageLibrary,

    ManageAcademics,
    ManageUsers,
    ReviewRequests,
    SendNotifications,
    ViewAllSubjects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Student,
}

static MEMBER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnNotifications);
    permissions.insert(Permission::ApplyLeave);
    permissions.insert(Permission::SubmitFeedback);
    permissions.insert(Permission::ViewBooks);

    permissions
});

static STUDENT_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(MEMBER_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ViewOwnAttendance);
    permissions.insert(Permission::ViewOwnResults);

    permissions
});

static STAFF_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(MEMBER_PERMISSIONS.iter().copied());

    permissions.insert(Permission::TakeAttendance);
    permissions.insert(Permission::RecordResults);
    permissions.insert(Permission::ManageLibrary);

    permissions
});

// Admins review requests but never file them.
static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewBooks);
    permissions.insert(Permission::ManageLibrary);
    permissions.insert(Permission::TakeAttendance);
    permissions.insert(Permission::RecordResults);
    permissions.insert(Permission::ManageAcademics);
    permissions.insert(Permission::ManageUsers);
    permissions.insert(Permission::ReviewRequests);
    permissions.insert(Permission::SendNotifications);
    permissions.insert(Permission::ViewAllSubjects);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Admin => &ADMIN_PERMISSIONS,
            Role::Staff => &STAFF_PERMISSIONS,
            Role::Student => &STUDENT_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Student => "student",
        }
    }

    /// Accepts the role name or the portal's numeric user type (1, 2, 3).
    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "admin" | "1" => Ok(Role::Admin),
            "staff" | "2" => Ok(Role::Staff),
            "student" | "3" => Ok(Role::Student),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
