//! Name-convention routes
//!
//! A controller can attach a table of named actions to its type. Names ending
//! in `Route` become routes: `fooPostRoute` registers `POST /foo`, `barRoute`
//! registers `GET /bar`, `listAllRoute` registers `ALL /list`. Other names are
//! ignored.

use std::collections::HashSet;
use std::fmt;

use super::{Action, Route, RouteMethod, RoutePath};

const ROUTE_SUFFIX: &str = "Route";

const VERB_SUFFIXES: [(&str, RouteMethod); 3] = [
    ("post", RouteMethod::Post),
    ("get", RouteMethod::Get),
    ("all", RouteMethod::All),
];

/// Derive the verb and path segment encoded in an action name.
///
/// Returns `None` for names that are not routable.
pub fn parse_route_name(name: &str) -> Option<(RouteMethod, String)> {
    let stem = name.strip_suffix(ROUTE_SUFFIX)?;

    for (verb, method) in VERB_SUFFIXES {
        if stem.len() < verb.len() {
            continue;
        }
        let split = stem.len() - verb.len();
        if !stem.is_char_boundary(split) {
            continue;
        }
        let (head, tail) = stem.split_at(split);
        if tail.eq_ignore_ascii_case(verb) {
            return Some((method, format!("/{head}")));
        }
    }

    Some((RouteMethod::Get, format!("/{stem}")))
}

/// Action registered under a conventional name
pub struct NamedAction<C> {
    pub name: &'static str,
    pub action: Action<C>,
}

impl<C> NamedAction<C> {
    pub fn new(name: &'static str, action: Action<C>) -> Self {
        Self { name, action }
    }
}

impl<C> fmt::Debug for NamedAction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedAction").field(&self.name).finish()
    }
}

/// Turn a named-action table into routes.
///
/// Names are deduplicated with the first declaration winning, so a controller
/// composing another one lists its own actions first to override.
pub fn convention_routes<C>(actions: Vec<NamedAction<C>>) -> Vec<Route<C>> {
    let mut seen = HashSet::new();
    let mut routes = Vec::new();

    for named in actions {
        if !seen.insert(named.name) {
            continue;
        }
        let Some((method, path)) = parse_route_name(named.name) else {
            continue;
        };
        tracing::debug!(name = named.name, method = %method, path = %path, "Convention route");
        routes.push(Route {
            path: RoutePath::Single(path),
            method,
            action: named.action,
        });
    }

    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::Arc;

    struct Dummy;

    fn named(name: &'static str, status: StatusCode) -> NamedAction<Dummy> {
        NamedAction::new(
            name,
            Action::new(move |_this: Arc<Dummy>, _req| async move { Ok(status) }),
        )
    }

    #[test]
    fn test_parse_route_name() {
        assert_eq!(
            parse_route_name("fooPostRoute"),
            Some((RouteMethod::Post, "/foo".to_string()))
        );
        assert_eq!(
            parse_route_name("barRoute"),
            Some((RouteMethod::Get, "/bar".to_string()))
        );
        assert_eq!(
            parse_route_name("createTestPostRoute"),
            Some((RouteMethod::Post, "/createTest".to_string()))
        );
        assert_eq!(
            parse_route_name("testPostRoutePostRoute"),
            Some((RouteMethod::Post, "/testPostRoute".to_string()))
        );
        assert_eq!(
            parse_route_name("pingALLRoute"),
            Some((RouteMethod::All, "/ping".to_string()))
        );
        assert_eq!(
            parse_route_name("statusgetRoute"),
            Some((RouteMethod::Get, "/status".to_string()))
        );
    }

    #[test]
    fn test_non_routable_names_ignored() {
        assert_eq!(parse_route_name("render"), None);
        assert_eq!(parse_route_name("routes"), None);
        assert_eq!(parse_route_name("fooroute"), None);
    }

    #[test]
    fn test_convention_routes_dedup_first_wins() {
        let routes = convention_routes(vec![
            named("testrewriteRoute", StatusCode::CREATED),
            named("helper", StatusCode::OK),
            named("testrewriteRoute", StatusCode::OK),
            named("fooPostRoute", StatusCode::OK),
        ]);

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].path, RoutePath::Single("/testrewrite".to_string()));
        assert_eq!(routes[0].method, RouteMethod::Get);
        assert_eq!(routes[1].path, RoutePath::Single("/foo".to_string()));
        assert_eq!(routes[1].method, RouteMethod::Post);
    }
}
