//! Role-aware navigation: menu tables, route/screen mapping, and the
//! logout stack reset.

use crate::session::{Result, SessionStore};
use ams_types::{EntityKind, Role, Session};
use tracing::info;

/// Route names exposed at the navigation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Unauthenticated entry route.
    GetStarted,
    /// Staff/admin landing screen.
    Dashboard,
    /// Student landing screen.
    StudentDashboard,
    Attendance,
    Students,
    Classes,
    Instructors,
    Notifications,
    Parents,
    Relationships,
}

impl Route {
    /// String identifier used by the navigation boundary. The admin
    /// landing route keeps its historical name `Home`.
    pub fn name(&self) -> &'static str {
        match self {
            Route::GetStarted => "GetStarted",
            Route::Dashboard => "Home",
            Route::StudentDashboard => "StudentDashboard",
            Route::Attendance => "Attendance",
            Route::Students => "Students",
            Route::Classes => "Classes",
            Route::Instructors => "Instructors",
            Route::Notifications => "Notifications",
            Route::Parents => "Parents",
            Route::Relationships => "Relationships",
        }
    }

    /// Entity kind behind this route, for the seven CRUD screens.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Route::Attendance => Some(EntityKind::Attendance),
            Route::Students => Some(EntityKind::Student),
            Route::Classes => Some(EntityKind::Class),
            Route::Instructors => Some(EntityKind::Instructor),
            Route::Notifications => Some(EntityKind::Notification),
            Route::Parents => Some(EntityKind::Parent),
            Route::Relationships => Some(EntityKind::Relationship),
            _ => None,
        }
    }
}

/// One drawer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub icon: &'static str,
    pub label: &'static str,
    pub route: Route,
}

/// Menu table for admin/staff users.
pub const ADMIN_MENU: [MenuEntry; 8] = [
    MenuEntry {
        icon: "home-outline",
        label: "Dashboard",
        route: Route::Dashboard,
    },
    MenuEntry {
        icon: "calendar-outline",
        label: "Attendance",
        route: Route::Attendance,
    },
    MenuEntry {
        icon: "people-outline",
        label: "Students",
        route: Route::Students,
    },
    MenuEntry {
        icon: "school-outline",
        label: "Classes",
        route: Route::Classes,
    },
    MenuEntry {
        icon: "person-outline",
        label: "Instructors",
        route: Route::Instructors,
    },
    MenuEntry {
        icon: "notifications-outline",
        label: "Notifications",
        route: Route::Notifications,
    },
    MenuEntry {
        icon: "people-circle-outline",
        label: "Parents",
        route: Route::Parents,
    },
    MenuEntry {
        icon: "git-branch-outline",
        label: "Relations",
        route: Route::Relationships,
    },
];

/// Menu table for student users.
pub const STUDENT_MENU: [MenuEntry; 4] = [
    MenuEntry {
        icon: "home-outline",
        label: "Dashboard",
        route: Route::StudentDashboard,
    },
    MenuEntry {
        icon: "calendar-outline",
        label: "My Attendance",
        route: Route::Attendance,
    },
    MenuEntry {
        icon: "school-outline",
        label: "My Classes",
        route: Route::Classes,
    },
    MenuEntry {
        icon: "notifications-outline",
        label: "Notifications",
        route: Route::Notifications,
    },
];

/// The navigation stack. Routes pushed on top can be popped with
/// back-navigation; a reset discards all history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavStack {
    stack: Vec<Route>,
}

impl NavStack {
    pub fn entry(route: Route) -> Self {
        Self { stack: vec![route] }
    }

    pub fn current(&self) -> Route {
        *self.stack.last().expect("stack is never empty")
    }

    pub fn push(&mut self, route: Route) {
        self.stack.push(route);
    }

    /// Pop the current route; returns the newly current one, or
    /// `None` at the entry route.
    pub fn back(&mut self) -> Option<Route> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.stack.pop();
        Some(self.current())
    }

    /// Discard all history and land on `route`.
    pub fn reset(&mut self, route: Route) {
        self.stack.clear();
        self.stack.push(route);
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Resolves menus and entry routes from the current session and owns
/// the logout transition.
#[derive(Clone)]
pub struct NavigationRouter {
    sessions: SessionStore,
}

impl NavigationRouter {
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions }
    }

    /// The ordered drawer entries for a session. Unauthenticated users
    /// get no drawer at all.
    pub fn menu_for(session: Option<&Session>) -> &'static [MenuEntry] {
        match session {
            None => &[],
            Some(session) => match session.role() {
                Role::Student => &STUDENT_MENU,
                Role::Staff => &ADMIN_MENU,
            },
        }
    }

    /// Entry route for a session: landing screen per role, or the
    /// unauthenticated entry route.
    pub fn entry_route_for(session: Option<&Session>) -> Route {
        match session {
            None => Route::GetStarted,
            Some(session) => match session.role() {
                Role::Student => Route::StudentDashboard,
                Role::Staff => Route::Dashboard,
            },
        }
    }

    pub async fn menu(&self) -> Result<&'static [MenuEntry]> {
        let session = self.sessions.get().await?;
        Ok(Self::menu_for(session.as_ref()))
    }

    pub async fn entry_route(&self) -> Result<Route> {
        let session = self.sessions.get().await?;
        Ok(Self::entry_route_for(session.as_ref()))
    }

    /// Clear the persisted session and reset navigation to the
    /// unauthenticated entry route. The returned stack has no history:
    /// nothing before `GetStarted` is reachable via back-navigation.
    pub async fn logout(&self) -> Result<NavStack> {
        self.sessions.clear().await?;
        info!("Session cleared, navigation reset");
        Ok(NavStack::entry(Route::GetStarted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::JsonFileStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn session_with_role(role: &str) -> Session {
        Session::new("Casey Test", Some(role.to_string()))
    }

    #[test]
    fn student_role_resolves_case_insensitively() {
        for role in ["Student", "STUDENT", "student"] {
            let session = session_with_role(role);
            let menu = NavigationRouter::menu_for(Some(&session));
            assert_eq!(menu.len(), 4, "role {role:?}");
            assert_eq!(menu[0].route, Route::StudentDashboard);
        }
    }

    #[test]
    fn other_roles_get_the_admin_menu() {
        for role in ["Staff", "admin", "Teacher"] {
            let session = session_with_role(role);
            assert_eq!(NavigationRouter::menu_for(Some(&session)).len(), 8);
        }
        // Absent role defaults to the admin table too.
        let session = Session::new("Casey Test", None);
        assert_eq!(NavigationRouter::menu_for(Some(&session)).len(), 8);
    }

    #[test]
    fn unauthenticated_users_get_no_drawer() {
        assert!(NavigationRouter::menu_for(None).is_empty());
        assert_eq!(NavigationRouter::entry_route_for(None), Route::GetStarted);
    }

    #[test]
    fn entry_routes_are_role_specific() {
        let staff = session_with_role("Staff");
        let student = session_with_role("student");
        assert_eq!(
            NavigationRouter::entry_route_for(Some(&staff)),
            Route::Dashboard
        );
        assert_eq!(
            NavigationRouter::entry_route_for(Some(&student)),
            Route::StudentDashboard
        );
    }

    #[test]
    fn every_menu_route_maps_to_a_screen() {
        for entry in ADMIN_MENU.iter().chain(STUDENT_MENU.iter()) {
            // Entity routes carry a kind; landing routes do not.
            match entry.route {
                Route::Dashboard | Route::StudentDashboard => {
                    assert!(entry.route.entity_kind().is_none())
                }
                route => assert!(route.entity_kind().is_some(), "{}", route.name()),
            }
        }
    }

    #[tokio::test]
    async fn logout_clears_the_session_and_history() {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::new(Arc::new(JsonFileStore::new(
            dir.path().join("session.json"),
        )));
        sessions.set(&session_with_role("Staff")).await.unwrap();

        let router = NavigationRouter::new(sessions.clone());
        assert_eq!(router.menu().await.unwrap().len(), 8);

        // Simulate some navigation before logging out.
        let mut stack = NavStack::entry(Route::Dashboard);
        stack.push(Route::Students);
        stack.push(Route::Parents);
        assert_eq!(stack.depth(), 3);
        stack.reset(Route::Dashboard);
        assert_eq!(stack.depth(), 1);

        let stack = router.logout().await.unwrap();
        assert_eq!(sessions.get().await.unwrap(), None);
        assert_eq!(stack.current(), Route::GetStarted);
        assert_eq!(stack.depth(), 1);

        let mut stack = stack;
        assert_eq!(stack.back(), None);
        assert!(router.menu().await.unwrap().is_empty());
    }
}
