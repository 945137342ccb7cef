use crate::session::{Role, SessionSnapshot};

/// Access flags attached to a route. Matched-chain metadata is OR-merged, so
/// a child of an auth-gated subtree is auth-gated without restating it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
    pub requires_teacher: bool,
}

impl RouteMeta {
    const NONE: RouteMeta = RouteMeta {
        requires_auth: false,
        requires_admin: false,
        requires_teacher: false,
    };

    const AUTH: RouteMeta = RouteMeta {
        requires_auth: true,
        ..RouteMeta::NONE
    };

    fn merge(self, other: RouteMeta) -> RouteMeta {
        RouteMeta {
            requires_auth: self.requires_auth || other.requires_auth,
            requires_admin: self.requires_admin || other.requires_admin,
            requires_teacher: self.requires_teacher || other.requires_teacher,
        }
    }
}

/// Static route descriptor. `path` is relative to the parent; `""` marks the
/// index child. `:name` segments capture path parameters.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub view: &'static str,
    pub redirect: Option<&'static str>,
    pub meta: RouteMeta,
    pub children: &'static [Route],
}

const fn view(path: &'static str, name: &'static str, view: &'static str) -> Route {
    Route {
        path,
        name,
        view,
        redirect: None,
        meta: RouteMeta::NONE,
        children: &[],
    }
}

const fn redirect(path: &'static str, target: &'static str) -> Route {
    Route {
        path,
        name: "",
        view: "",
        redirect: Some(target),
        meta: RouteMeta::NONE,
        children: &[],
    }
}

const DASHBOARD_CHILDREN: &[Route] = &[
    view("", "Home", "Home"),
    view("courses", "Courses", "Courses"),
    view("courses/:id", "CourseDetail", "CourseDetail"),
    view("exercises", "Exercises", "Exercises"),
    view("exercises/:id", "ExerciseDetail", "ExerciseDetail"),
    view("chat", "Chat", "Chat"),
    view("chat/:id", "ChatSession", "ChatSession"),
    view("profile", "Profile", "Profile"),
    Route {
        meta: RouteMeta {
            requires_admin: true,
            ..RouteMeta::NONE
        },
        ..view("admin", "Admin", "Admin")
    },
];

const TEACHER_CHILDREN: &[Route] = &[
    redirect("", "/teacher/dashboard"),
    view("dashboard", "TeacherHome", "TeacherHome"),
    view("courses", "TeacherCourses", "TeacherCourses"),
    view("courses/create", "TeacherCourseCreate", "TeacherCourseCreate"),
    view("courses/:id", "TeacherCourseDetail", "TeacherCourseDetail"),
    view("materials", "TeacherMaterials", "TeacherMaterials"),
    view("exercises", "TeacherExercises", "TeacherExercises"),
    view("exercises/create", "TeacherExerciseCreate", "TeacherExerciseCreate"),
    view("exercises/ai-generate", "TeacherExerciseGenerate", "TeacherExerciseGenerate"),
    view("students", "TeacherStudents", "TeacherStudents"),
    view("students/progress", "TeacherStudentProgress", "TeacherStudentProgress"),
    view("students/performance", "TeacherStudentPerformance", "TeacherStudentPerformance"),
    view("chat", "TeacherChat", "TeacherChat"),
    view("lesson-plan", "TeacherLessonPlan", "TeacherLessonPlan"),
    view("analytics", "TeacherAnalytics", "TeacherAnalytics"),
    view("profile", "TeacherProfile", "TeacherProfile"),
];

const ROUTES: &[Route] = &[
    redirect("/", "/login"),
    view("/login", "Login", "Login"),
    view("/register", "Register", "Register"),
    Route {
        meta: RouteMeta::AUTH,
        children: DASHBOARD_CHILDREN,
        ..view("/dashboard", "Dashboard", "Dashboard")
    },
    Route {
        meta: RouteMeta {
            requires_auth: true,
            requires_teacher: true,
            ..RouteMeta::NONE
        },
        children: TEACHER_CHILDREN,
        ..view("/teacher", "TeacherDashboard", "TeacherDashboard")
    },
];

pub fn routes() -> &'static [Route] {
    ROUTES
}

/// A matched navigation target: the requested path (after table redirects),
/// the merged metadata of the matched chain, and any captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub path: String,
    pub name: &'static str,
    pub view: &'static str,
    pub meta: RouteMeta,
    pub params: Vec<(&'static str, String)>,
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(String),
}

/// Match a path against the route table, following table redirects.
pub fn resolve(path: &str) -> Option<ResolvedRoute> {
    resolve_inner(path, 0)
}

fn resolve_inner(path: &str, depth: u8) -> Option<ResolvedRoute> {
    // The table's redirects are static and shallow; the depth cap only
    // protects against a future edit introducing a cycle.
    if depth > 4 {
        return None;
    }
    let normalized = normalize(path);
    let segments: Vec<&str> = normalized
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let mut params = Vec::new();
    let (route, meta) = match_chain(ROUTES, &segments, RouteMeta::NONE, &mut params)?;
    if let Some(target) = route.redirect {
        return resolve_inner(target, depth + 1);
    }
    Some(ResolvedRoute {
        path: normalized,
        name: route.name,
        view: route.view,
        meta,
        params,
    })
}

fn match_chain<'r>(
    routes: &'r [Route],
    segments: &[&str],
    inherited: RouteMeta,
    params: &mut Vec<(&'static str, String)>,
) -> Option<(&'r Route, RouteMeta)> {
    for route in routes {
        let checkpoint = params.len();
        let Some(consumed) = match_prefix(route.path, segments, params) else {
            continue;
        };
        let meta = inherited.merge(route.meta);
        let rest = &segments[consumed..];
        if rest.is_empty() {
            // An index child takes over an exact match on its parent.
            if route.redirect.is_none() {
                if let Some(index) = route.children.iter().find(|child| child.path.is_empty()) {
                    return Some((index, meta.merge(index.meta)));
                }
            }
            return Some((route, meta));
        }
        if !route.children.is_empty() {
            if let Some(matched) = match_chain(route.children, rest, meta, params) {
                return Some(matched);
            }
        }
        params.truncate(checkpoint);
    }
    None
}

/// Match a pattern against the head of `segments`, returning how many
/// segments it consumed. `:name` matches any single segment.
fn match_prefix(
    pattern: &'static str,
    segments: &[&str],
    params: &mut Vec<(&'static str, String)>,
) -> Option<usize> {
    let pattern_segments: Vec<&'static str> = pattern
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    if pattern_segments.len() > segments.len() {
        return None;
    }
    let checkpoint = params.len();
    for (pattern_segment, segment) in pattern_segments.iter().zip(segments) {
        if let Some(name) = pattern_segment.strip_prefix(':') {
            params.push((name, (*segment).to_string()));
        } else if pattern_segment != segment {
            params.truncate(checkpoint);
            return None;
        }
    }
    Some(pattern_segments.len())
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    let without_trailing = trimmed.trim_end_matches('/');
    if without_trailing.is_empty() {
        return "/".to_string();
    }
    if without_trailing.starts_with('/') {
        without_trailing.to_string()
    } else {
        format!("/{without_trailing}")
    }
}

/// The pre-navigation guard. Pure and synchronous; evaluated in a fixed
/// order where the first matching rule wins. Advisory only: the backend
/// still authorizes every request.
pub fn guard(route: &ResolvedRoute, session: &SessionSnapshot) -> NavigationDecision {
    if route.meta.requires_auth && !session.is_authenticated {
        return NavigationDecision::Redirect("/login".to_string());
    }
    if route.meta.requires_admin && session.role != Some(Role::Admin) {
        return NavigationDecision::Redirect("/dashboard".to_string());
    }
    if route.meta.requires_teacher && session.role != Some(Role::Teacher) {
        return NavigationDecision::Redirect("/dashboard".to_string());
    }
    if route.path == "/login" && session.is_authenticated {
        let home = if session.role == Some(Role::Teacher) {
            "/teacher/dashboard"
        } else {
            "/dashboard"
        };
        return NavigationDecision::Redirect(home.to_string());
    }
    NavigationDecision::Allow
}

/// Resolve and guard in one step. A path outside the table is allowed
/// through unchanged; the view layer owns its not-found handling.
pub fn decide(path: &str, session: &SessionSnapshot) -> NavigationDecision {
    match resolve(path) {
        Some(route) => guard(&route, session),
        None => NavigationDecision::Allow,
    }
}
