//! Integration tests for route matching and target resolution.

use std::collections::HashMap;

use axum::http::Method;
use tollgate::config::model::{Route, Target};
use tollgate::proxy::routing::RouteTable;
use tollgate::proxy::target::resolve;

fn make_route(method: &str, path: &str, target_path: &str, query_params: &[&str]) -> Route {
    Route {
        path: path.into(),
        method: method.into(),
        target: Target {
            host: "http://backend".into(),
            path: target_path.into(),
            method: None,
        },
        query_params: query_params.iter().map(|s| (*s).to_string()).collect(),
        limit: 0,
    }
}

fn resolve_url(table: &RouteTable, method: Method, path: &str, query: Option<&str>) -> String {
    let m = table.match_route(&method, path).unwrap();
    let route = table.get(m.index).unwrap();
    resolve(route, &method, query, &m.params)
        .unwrap()
        .url
        .to_string()
}

#[test]
fn end_to_end_rewrite() {
    let table = RouteTable::compile(&[make_route("GET", "/api/{id}", "/v1/items/{id}", &["verbose"])])
        .unwrap();
    assert_eq!(
        resolve_url(&table, Method::GET, "/api/7", Some("verbose=true&skip=1")),
        "http://backend/v1/items/7?verbose=true"
    );
}

#[test]
fn registration_order_decides_overlaps() {
    let table = RouteTable::compile(&[
        make_route("GET", "/users/{id}", "/by-id/{id}", &[]),
        make_route("GET", "/users/me", "/me", &[]),
    ])
    .unwrap();
    assert_eq!(
        resolve_url(&table, Method::GET, "/users/me", None),
        "http://backend/by-id/me"
    );
}

#[test]
fn method_selects_between_same_paths() {
    let table = RouteTable::compile(&[
        make_route("GET", "/items/{id}", "/read/{id}", &[]),
        make_route("DELETE", "/items/{id}", "/remove/{id}", &[]),
    ])
    .unwrap();
    assert_eq!(
        resolve_url(&table, Method::DELETE, "/items/3", None),
        "http://backend/remove/3"
    );
    assert!(table.match_route(&Method::PUT, "/items/3").is_none());
}

#[test]
fn multiple_variables_are_bound() {
    let table = RouteTable::compile(&[make_route(
        "GET",
        "/orgs/{org}/repos/{repo}",
        "/r/{repo}/o/{org}",
        &[],
    )])
    .unwrap();
    let m = table.match_route(&Method::GET, "/orgs/acme/repos/gate").unwrap();
    assert_eq!(
        m.params,
        HashMap::from([
            ("org".to_string(), "acme".to_string()),
            ("repo".to_string(), "gate".to_string()),
        ])
    );
    assert_eq!(
        resolve_url(&table, Method::GET, "/orgs/acme/repos/gate", None),
        "http://backend/r/gate/o/acme"
    );
}

#[test]
fn query_filter_variants() {
    let table = RouteTable::compile(&[
        make_route("GET", "/some", "/some", &["a", "b"]),
        make_route("GET", "/all", "/all", &["*"]),
        make_route("GET", "/none", "/none", &[]),
    ])
    .unwrap();
    let q = Some("a=1&b=2&c=3");
    assert_eq!(resolve_url(&table, Method::GET, "/some", q), "http://backend/some?a=1&b=2");
    assert_eq!(resolve_url(&table, Method::GET, "/all", q), "http://backend/all?a=1&b=2&c=3");
    assert_eq!(resolve_url(&table, Method::GET, "/none", q), "http://backend/none");
}

#[test]
fn trailing_slash_is_a_different_path() {
    let table = RouteTable::compile(&[
        make_route("GET", "/health", "/up", &[]),
        make_route("GET", "/api/{id}", "/v1/items/{id}", &[]),
    ])
    .unwrap();
    assert!(table.match_route(&Method::GET, "/health").is_some());
    assert!(table.match_route(&Method::GET, "/health/").is_none());
    assert!(table.match_route(&Method::GET, "/healthz").is_none());
    assert!(table.match_route(&Method::GET, "/api/7/").is_none());
    assert!(table.match_route(&Method::GET, "//api//7").is_none());
}

#[test]
fn variables_cannot_climb_out_of_the_target_template() {
    let table = RouteTable::compile(&[make_route("GET", "/api/{id}", "/v1/items/{id}", &[])])
        .unwrap();
    for path in ["/api/..", "/api/.", "/api/%2e%2e", "/api/%2E%2E"] {
        assert!(table.match_route(&Method::GET, path).is_none(), "{path}");
    }
    assert_eq!(
        resolve_url(&table, Method::GET, "/api/a..b", None),
        "http://backend/v1/items/a..b"
    );
}
