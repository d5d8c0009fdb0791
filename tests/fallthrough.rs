//! Resolution and fallthrough dispatch through the public API.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use multiroute::observability::tracing::{CallOutcome, Telemetry};
use multiroute::routing::{
    handler_fn, multiurl, Arguments, CatchSet, DispatchError, HandlerError, Include, MatchInfo,
    Outcome, Route, RouteSlot, Router, RoutingContext, SharedPattern,
};

mod common;

use common::{person, place, thing, word_route, CallLog};

fn catchall() -> Router<RouteSlot, String> {
    Router::new(vec![multiurl(vec![
        word_route(person(), "person"),
        word_route(place(), "place"),
        word_route(thing(), "thing"),
    ])
    .into_shared()])
}

fn no_fallthrough() -> Router<RouteSlot, String> {
    Router::new(vec![multiurl(vec![
        word_route(person(), "person"),
        word_route(place(), "place"),
    ])
    .into_shared()])
}

fn handle(router: &Router<RouteSlot, String>, path: &str) -> Result<String, DispatchError> {
    router.handle(path, &mut RouteSlot::new())
}

#[test]
fn test_resolve_match_first() {
    assert_eq!(handle(&catchall(), "/jane/").unwrap(), "Person: Jane Doe");
}

#[test]
fn test_resolve_match_middle() {
    assert_eq!(handle(&catchall(), "/sf/").unwrap(), "Place: San Francisco");
}

#[test]
fn test_resolve_match_last() {
    assert_eq!(handle(&catchall(), "/bacon/").unwrap(), "Thing: Bacon");
}

#[test]
fn test_resolve_match_fallthrough() {
    let router = no_fallthrough();
    let matched = router.resolve("/bacon/").unwrap();
    assert_eq!(matched.candidates().len(), 2);

    match matched.dispatch(&mut RouteSlot::new()) {
        Err(DispatchError::NotFound(nf)) => {
            assert_eq!(nf.path, "/bacon/");
            assert!(!nf.tried.is_empty());
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_no_match() {
    let err = catchall().resolve("/eggs/and/bacon/").unwrap_err();
    assert_eq!(err.path, "/eggs/and/bacon/");
    // One chain per leaf, each under the multiurl that tried it.
    assert_eq!(err.tried.len(), 3);
    assert!(err.tried.iter().all(|chain| chain.len() == 2 && chain[0].starts_with("multiurl[")));
    assert_eq!(err.tried[2][1], r"^(\w+)/$ [name='thing']");
}

#[test]
fn test_reverse() {
    let router = catchall();
    let joe = vec!["joe".to_string()];
    let none = BTreeMap::new();

    assert_eq!(router.reverse("person", &joe, &none).unwrap(), "/joe/");
    assert_eq!(router.reverse("place", &joe, &none).unwrap(), "/joe/");
    assert_eq!(router.reverse("thing", &joe, &none).unwrap(), "/joe/");
    assert!(router.reverse("argh", &["xyz".to_string()], &none).is_err());
    assert!(router.reverse("person", &[], &none).is_err());
}

#[test]
fn test_reverse_overlapping_templates() {
    let handler = |name: &'static str| {
        handler_fn(name, |_: &mut RouteSlot, _: &Arguments| Ok(Outcome::<String>::Decline))
    };
    let router = Router::new(vec![multiurl(vec![
        Route::path("{name}/", handler("person")).unwrap().name("person").into_shared(),
        Route::path("{name}/", handler("place")).unwrap().name("place").into_shared(),
        Route::path("{name}/", handler("thing")).unwrap().name("thing").into_shared(),
    ])
    .into_shared()]);

    let joe = vec!["joe".to_string()];
    for name in ["person", "place", "thing"] {
        assert_eq!(router.reverse(name, &joe, &BTreeMap::new()).unwrap(), "/joe/");
    }
    assert!(router.reverse("person", &[], &BTreeMap::new()).is_err());
    assert!(router.reverse("argh", &["xyz".to_string()], &BTreeMap::new()).is_err());
}

#[test]
fn test_include() {
    let router = Router::new(vec![multiurl(vec![
        Include::regex(r"^find/", vec![word_route(thing(), "thing")])
            .unwrap()
            .into_shared(),
        word_route(person(), "person"),
        word_route(place(), "place"),
    ])
    .into_shared()]);

    assert_eq!(handle(&router, "/find/bacon/").unwrap(), "Thing: Bacon");
}

fn multi_include() -> Router<RouteSlot, String> {
    Router::new(vec![multiurl(vec![
        Include::regex(
            r"^find/",
            vec![multiurl(vec![
                word_route(person(), "person"),
                word_route(place(), "place"),
                word_route(thing(), "thing"),
            ])
            .into_shared()],
        )
        .unwrap()
        .into_shared(),
        Include::regex(r"^empty/", vec![word_route(thing(), "empty")])
            .unwrap()
            .into_shared(),
    ])
    .into_shared()])
}

#[test]
fn test_multi_include_person() {
    assert_eq!(handle(&multi_include(), "/find/john/").unwrap(), "Person: John Smith");
}

#[test]
fn test_multi_include_place() {
    assert_eq!(handle(&multi_include(), "/find/nyc/").unwrap(), "Place: New York City");
}

#[test]
fn test_multi_include_thing() {
    assert_eq!(handle(&multi_include(), "/find/rock/").unwrap(), "Thing: Rock");
}

#[test]
fn test_multi_include_surfaces_every_candidate() {
    let matched = multi_include().resolve("/find/rock/").unwrap();
    let names: Vec<_> = matched.candidates().iter().map(|c| c.url_name().unwrap()).collect();
    assert_eq!(names, vec!["person", "place", "thing"]);
    assert_eq!(matched.candidates()[2].info().route, r"^find/^(\w+)/$");
}

#[test]
fn test_first_responder_wins_and_later_never_run() {
    let log = CallLog::default();
    let router = Router::new(vec![multiurl(vec![
        Route::path("x/", log.handler("A", || Ok(Outcome::Decline))).unwrap().into_shared(),
        Route::path("x/", log.handler("B", || Ok(Outcome::Respond("B".into())))).unwrap().into_shared(),
        Route::path("x/", log.handler("C", || Ok(Outcome::Respond("C".into())))).unwrap().into_shared(),
    ])
    .into_shared()]);

    assert_eq!(handle(&router, "/x/").unwrap(), "B");
    assert_eq!(log.calls(), vec!["A", "B"]);
}

#[test]
fn test_all_decline_is_not_found_with_trail() {
    let log = CallLog::default();
    let a = Route::path("x/", log.handler("A", || Ok(Outcome::Decline))).unwrap().name("a");
    let b = Route::path("x/", log.handler("B", || Err(HandlerError::continue_resolving())))
        .unwrap()
        .name("b");
    let resolver = multiurl(vec![a.into_shared(), b.into_shared()]);

    let matched = resolver.resolve("x/").unwrap();
    let mut slot = RouteSlot::new();
    let previous = MatchInfo {
        url_name: Some("outer".into()),
        ..MatchInfo::default()
    };
    slot.replace_active_route(Some(previous.clone()));

    match matched.dispatch(&mut slot) {
        Err(DispatchError::NotFound(nf)) => {
            assert_eq!(nf.path, "x/");
            assert_eq!(
                nf.tried,
                vec![vec!["x/ [name='a']".to_string()], vec!["x/ [name='b']".to_string()]]
            );
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(log.calls(), vec!["A", "B"]);
    assert_eq!(slot.active_route(), Some(&previous), "active route restored");
}

#[test]
fn test_resolution_miss_and_dispatch_miss_have_same_shape() {
    let decline = || handler_fn("d", |_: &mut RouteSlot, _: &Arguments| Ok(Outcome::<String>::Decline));
    let resolver = multiurl(vec![
        Route::path("x/", decline()).unwrap().into_shared(),
        Route::path("y/", decline()).unwrap().into_shared(),
    ]);

    let resolve_miss = resolver.resolve("z/").unwrap_err();
    let dispatch_miss = match resolver.resolve("x/").unwrap().dispatch(&mut RouteSlot::new()) {
        Err(DispatchError::NotFound(nf)) => nf,
        other => panic!("expected NotFound, got {other:?}"),
    };
    assert_eq!(resolve_miss.tried.len(), dispatch_miss.tried.len());
    assert_eq!(resolve_miss.to_string().replace("z/", "x/"), dispatch_miss.to_string());
}

#[test]
fn test_router_all_declined_trail_lists_each_candidate() {
    let router = no_fallthrough();
    let resolve_miss = router.resolve("/eggs/and/bacon/").unwrap_err();
    let dispatch_miss = match handle(&router, "/bacon/") {
        Err(DispatchError::NotFound(nf)) => nf,
        other => panic!("expected NotFound, got {other:?}"),
    };

    assert_eq!(dispatch_miss.tried.len(), 2);
    assert_eq!(dispatch_miss.tried[0][1], r"^(\w+)/$ [name='person']");
    assert_eq!(dispatch_miss.tried[1][1], r"^(\w+)/$ [name='place']");
    assert_eq!(dispatch_miss.tried, resolve_miss.tried);
}

#[test]
fn test_uncaught_error_stops_dispatch() {
    let log = CallLog::default();
    let resolver = multiurl(vec![
        Route::path("x/", log.handler("A", || Err(HandlerError::new("database", "down"))))
            .unwrap()
            .into_shared(),
        Route::path("x/", log.handler("B", || Ok(Outcome::Respond("B".into())))).unwrap().into_shared(),
    ]);

    let err = resolver.resolve("x/").unwrap().dispatch(&mut RouteSlot::new()).unwrap_err();
    assert!(matches!(err, DispatchError::Handler(ref e) if e.kind() == "database"));
    assert_eq!(log.calls(), vec!["A"]);
}

#[test]
fn test_custom_catch_kind() {
    let log = CallLog::default();
    let resolver = multiurl(vec![
        Route::path("x/", log.handler("A", || Err(HandlerError::new("permission_denied", "no"))))
            .unwrap()
            .into_shared(),
        Route::path("x/", log.handler("B", || Ok(Outcome::Respond("B".into())))).unwrap().into_shared(),
    ])
    .catch(CatchSet::default().with_kind("permission_denied"));

    assert_eq!(resolver.resolve("x/").unwrap().dispatch(&mut RouteSlot::new()).unwrap(), "B");
}

#[test]
fn test_redispatch_is_idempotent() {
    let log = CallLog::default();
    let resolver = multiurl(vec![
        Route::path("x/", log.handler("A", || Ok(Outcome::Decline))).unwrap().into_shared(),
        Route::path("x/", log.handler("B", || Ok(Outcome::Respond("B".into())))).unwrap().into_shared(),
    ]);
    let matched = resolver.resolve("x/").unwrap();

    for _ in 0..3 {
        log.clear();
        assert_eq!(matched.dispatch(&mut RouteSlot::new()).unwrap(), "B");
        assert_eq!(log.calls(), vec!["A", "B"]);
    }
    assert_eq!(log.total(), 6);
}

#[test]
fn test_nested_namespaces_compose() {
    let inner = multiurl(vec![
        Route::path("{name}/", thing()).unwrap().name("thing").into_shared(),
    ])
    .namespace("inner")
    .into_shared();
    let include: SharedPattern<RouteSlot, String> = Include::path("find/", vec![inner])
        .unwrap()
        .namespace("search")
        .into_shared();
    let router = Router::new(vec![multiurl(vec![include]).namespace("outer").into_shared()]);

    let matched = router.resolve("/find/rock/").unwrap();
    let info = matched.first().unwrap().info();
    assert_eq!(info.namespaces, vec!["outer", "search", "inner"]);
    assert_eq!(info.view_name().as_deref(), Some("outer:search:inner:thing"));
    assert_eq!(info.arguments.kwargs["name"], "rock");

    let args = vec!["rock".to_string()];
    assert_eq!(
        router.reverse("outer:search:inner:thing", &args, &BTreeMap::new()).unwrap(),
        "/find/rock/"
    );
}

#[test]
fn test_concurrent_dispatch_shares_nothing() {
    let router = Arc::new(catchall());
    let handles: Vec<_> = ["jane", "sf", "bacon", "nyc"]
        .into_iter()
        .map(|name| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || handle(&router, &format!("/{}/", name)).unwrap())
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        vec!["Person: Jane Doe", "Place: San Francisco", "Thing: Bacon", "Place: New York City"]
    );
}

#[derive(Debug, Default)]
struct Recorder {
    transactions: Mutex<Vec<String>>,
    calls: Mutex<Vec<(String, CallOutcome)>>,
}

impl Telemetry for Recorder {
    fn is_enabled(&self) -> bool {
        true
    }

    fn set_transaction_name(&self, name: &str) {
        self.transactions.lock().unwrap().push(name.to_string());
    }

    fn record_call(&self, name: &str, _elapsed: Duration, outcome: CallOutcome) {
        self.calls.lock().unwrap().push((name.to_string(), outcome));
    }
}

#[test]
fn test_telemetry_names_and_records_each_candidate() {
    let recorder = Arc::new(Recorder::default());
    let router = Router::new(vec![multiurl(vec![
        word_route(person(), "person"),
        word_route(place(), "place"),
        word_route(thing(), "thing"),
    ])
    .into_shared()])
    .with_telemetry(recorder.clone());

    assert_eq!(handle(&router, "/rock/").unwrap(), "Thing: Rock");
    assert_eq!(
        *recorder.transactions.lock().unwrap(),
        vec!["views::person", "views::place", "views::thing"]
    );
    assert_eq!(
        *recorder.calls.lock().unwrap(),
        vec![
            ("views::person".to_string(), CallOutcome::Declined),
            ("views::place".to_string(), CallOutcome::Declined),
            ("views::thing".to_string(), CallOutcome::Responded),
        ]
    );
}

#[test]
fn test_nested_multiurl_telemetry_applies_under_router() {
    let recorder = Arc::new(Recorder::default());
    let nested = multiurl(vec![word_route(person(), "person"), word_route(thing(), "thing")])
        .telemetry(recorder.clone())
        .into_shared();
    let router = Router::new(vec![Include::path("find/", vec![nested]).unwrap().into_shared()]);

    assert_eq!(handle(&router, "/find/rock/").unwrap(), "Thing: Rock");
    assert_eq!(
        *recorder.transactions.lock().unwrap(),
        vec!["views::person", "views::thing"]
    );
    assert_eq!(
        *recorder.calls.lock().unwrap(),
        vec![
            ("views::person".to_string(), CallOutcome::Declined),
            ("views::thing".to_string(), CallOutcome::Responded),
        ]
    );
}
