//! Request-entry guard for page paths.
//!
//! Sends anonymous visitors away from the dashboard to a locale-qualified
//! sign-in page and sends signed-in users away from the sign-in/sign-up pages.
//! Everything else goes through locale resolution: the default locale never
//! carries a path prefix, and other locales always do.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::{cookie, resolve_session};
use crate::state::AppState;

pub const LOCALES: [&str; 2] = ["en", "ru"];
pub const DEFAULT_LOCALE: &str = "en";
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

const DASHBOARD: &str = "/dashboard";
const SIGN_IN: &str = "/auth/signin";
const SIGN_UP: &str = "/auth/signup";

/// The locale a page request was resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale(pub &'static str);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRoute {
    Redirect(String),
    Continue(Locale),
}

fn known_locale(tag: &str) -> Option<&'static str> {
    LOCALES
        .iter()
        .copied()
        .find(|l| l.eq_ignore_ascii_case(tag))
}

/// Splits `/ru/events` into `(Some("ru"), "/events")`.
pub fn split_locale(path: &str) -> (Option<&'static str>, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (first, rest) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, "/"),
    };
    match LOCALES.iter().copied().find(|l| *l == first) {
        Some(locale) => (Some(locale), rest),
        None => (None, path),
    }
}

/// Prefixes `path` with `locale` unless it is the default.
pub fn localize(locale: &str, path: &str) -> String {
    if locale == DEFAULT_LOCALE {
        path.to_string()
    } else if path == "/" {
        format!("/{locale}")
    } else {
        format!("/{locale}{path}")
    }
}

/// Collapses leading slashes and backslashes so the target stays on this host.
fn same_origin(path: &str) -> String {
    format!("/{}", path.trim_start_matches(['/', '\\']))
}

fn under(path: &str, section: &str) -> bool {
    path == section
        || path
            .strip_prefix(section)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Best supported locale from an `Accept-Language` header, by q-value.
pub fn negotiate(accept_language: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, f32)> = None;
    for entry in accept_language.split(',') {
        let mut parts = entry.trim().split(';');
        let tag = parts.next().unwrap_or_default().trim();
        let quality = parts
            .find_map(|p| p.trim().strip_prefix("q="))
            .and_then(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);
        let primary = tag.split('-').next().unwrap_or_default();
        if let Some(locale) = known_locale(primary) {
            if quality > 0.0 && best.map_or(true, |(_, q)| quality > q) {
                best = Some((locale, quality));
            }
        }
    }
    best.map(|(locale, _)| locale)
}

/// Locale preference from the locale cookie, falling back to `Accept-Language`.
pub fn preferred_locale(headers: &HeaderMap) -> Option<&'static str> {
    cookie(headers, LOCALE_COOKIE)
        .and_then(known_locale)
        .or_else(|| {
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .and_then(negotiate)
        })
}

pub fn route_page(path: &str, authenticated: bool, preferred: Option<&'static str>) -> PageRoute {
    let (prefix, rest) = split_locale(path);
    let locale = prefix.or(preferred).unwrap_or(DEFAULT_LOCALE);

    if !authenticated && under(rest, DASHBOARD) {
        return PageRoute::Redirect(localize(locale, SIGN_IN));
    }
    if authenticated && (under(rest, SIGN_IN) || under(rest, SIGN_UP)) {
        return PageRoute::Redirect(localize(locale, DASHBOARD));
    }

    match prefix {
        Some(DEFAULT_LOCALE) => PageRoute::Redirect(same_origin(rest)),
        Some(other) => PageRoute::Continue(Locale(other)),
        None => match preferred {
            Some(wanted) if wanted != DEFAULT_LOCALE => PageRoute::Redirect(localize(wanted, path)),
            _ => PageRoute::Continue(Locale(DEFAULT_LOCALE)),
        },
    }
}

/// API routes, the health probe and static assets bypass the guard.
pub fn is_page_path(path: &str) -> bool {
    let is_api = under(path, "/api") || under(path, "/health") || under(path, "/_next");
    let last = path.rsplit('/').next().unwrap_or_default();
    !is_api && !last.contains('.')
}

pub async fn page_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !is_page_path(&path) {
        return next.run(request).await;
    }

    let headers = request.headers();
    let authenticated = resolve_session(&state.sessions, headers).is_some();
    let preferred = preferred_locale(headers);

    match route_page(&path, authenticated, preferred) {
        PageRoute::Redirect(target) => {
            let target = match request.uri().query() {
                Some(query) => format!("{target}?{query}"),
                None => target,
            };
            tracing::debug!(from = %path, to = %target, authenticated, "Page redirect");
            Redirect::temporary(&target).into_response()
        }
        PageRoute::Continue(locale) => {
            request.extensions_mut().insert(locale);
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert(header::CONTENT_LANGUAGE, HeaderValue::from_static(locale.0));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect(to: &str) -> PageRoute {
        PageRoute::Redirect(to.to_string())
    }

    #[test]
    fn test_split_locale() {
        assert_eq!(split_locale("/ru/events/1"), (Some("ru"), "/events/1"));
        assert_eq!(split_locale("/ru"), (Some("ru"), "/"));
        assert_eq!(split_locale("/events"), (None, "/events"));
        assert_eq!(split_locale("/rush"), (None, "/rush"));
    }

    #[test]
    fn test_anonymous_dashboard_goes_to_signin() {
        assert_eq!(route_page("/dashboard", false, None), redirect("/auth/signin"));
        assert_eq!(
            route_page("/ru/dashboard/events/new", false, None),
            redirect("/ru/auth/signin")
        );
        assert_eq!(
            route_page("/dashboard", false, Some("ru")),
            redirect("/ru/auth/signin")
        );
    }

    #[test]
    fn test_dashboard_lookalikes_are_not_guarded() {
        assert_eq!(
            route_page("/dashboards", false, None),
            PageRoute::Continue(Locale("en"))
        );
    }

    #[test]
    fn test_signed_in_user_skips_auth_pages() {
        assert_eq!(route_page("/auth/signin", true, None), redirect("/dashboard"));
        assert_eq!(route_page("/ru/auth/signup", true, None), redirect("/ru/dashboard"));
        assert_eq!(
            route_page("/auth/signin", false, None),
            PageRoute::Continue(Locale("en"))
        );
    }

    #[test]
    fn test_locale_prefix_as_needed() {
        assert_eq!(route_page("/en/about", false, None), redirect("/about"));
        assert_eq!(
            route_page("/ru/about", false, None),
            PageRoute::Continue(Locale("ru"))
        );
        assert_eq!(route_page("/about", false, Some("ru")), redirect("/ru/about"));
        assert_eq!(route_page("/", false, Some("ru")), redirect("/ru"));
        assert_eq!(
            route_page("/about", false, Some("en")),
            PageRoute::Continue(Locale("en"))
        );
    }

    #[test]
    fn test_stripped_prefix_never_leaves_the_host() {
        assert_eq!(route_page("/en//evil.com/login", false, None), redirect("/evil.com/login"));
        assert_eq!(route_page("/en/\\evil.com", false, None), redirect("/evil.com"));
        assert_eq!(route_page("/en", false, None), redirect("/"));
    }

    #[test]
    fn test_negotiate_accept_language() {
        assert_eq!(negotiate("ru-RU,ru;q=0.9,en;q=0.8"), Some("ru"));
        assert_eq!(negotiate("de-DE,en;q=0.5,ru;q=0.7"), Some("ru"));
        assert_eq!(negotiate("de-DE,fr"), None);
        assert_eq!(negotiate("ru;q=0"), None);
    }

    #[test]
    fn test_cookie_beats_accept_language() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ru"));
        headers.insert(header::COOKIE, HeaderValue::from_static("NEXT_LOCALE=en"));
        assert_eq!(preferred_locale(&headers), Some("en"));
    }

    #[test]
    fn test_page_path_detection() {
        assert!(is_page_path("/dashboard"));
        assert!(is_page_path("/"));
        assert!(!is_page_path("/api/events"));
        assert!(!is_page_path("/health"));
        assert!(!is_page_path("/favicon.ico"));
    }
}
