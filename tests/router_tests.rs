use strutrouter::router::Router;
use strutrouter::CompileError;

fn zoo() -> Router<&'static str> {
    Router::build(vec![
        ("/".to_string(), "root"),
        ("/zoo/animals".to_string(), "animals"),
        ("/zoo/animals/{id}".to_string(), "animal"),
        ("/zoo/animals/{id}/toys/{toy_id}".to_string(), "toy"),
        ("/zoo/animals/search".to_string(), "search"),
        (
            "/zoo/{category}/animals/{id}/habitats/{habitat_id}".to_string(),
            "habitat",
        ),
    ])
    .unwrap()
}

#[test]
fn test_literal_and_parameter_routes() {
    let router = zoo();

    assert_eq!(*router.route("/").unwrap().route, "root");
    assert_eq!(*router.route("/zoo/animals").unwrap().route, "animals");
    assert_eq!(*router.route("/zoo/animals/search").unwrap().route, "search");

    let m = router.route("/zoo/animals/42").unwrap();
    assert_eq!(*m.route, "animal");
    assert_eq!(m.get_path_param("id"), Some("42"));
}

#[test]
fn test_nested_parameters() {
    let router = zoo();
    let m = router.route("/zoo/animals/7/toys/ball").unwrap();
    assert_eq!(*m.route, "toy");
    assert_eq!(m.get_path_param("id"), Some("7"));
    assert_eq!(m.get_path_param("toy_id"), Some("ball"));

    let m = router.route("/zoo/mammals/animals/3/habitats/9").unwrap();
    let params = m.path_params_map();
    assert_eq!(params.len(), 3);
    assert_eq!(params["category"], "mammals");
    assert_eq!(params["habitat_id"], "9");
}

#[test]
fn test_unmatched_paths() {
    let router = zoo();
    for path in ["/zoo", "/zoo/animals/1/toys", "/keepers", "/zoo/animals/1/2/3"] {
        assert!(router.route(path).is_none(), "{path}");
    }
}

#[test]
fn test_trailing_slash_matches() {
    let router = zoo();
    assert_eq!(*router.route("/zoo/animals/").unwrap().route, "animals");
}

#[test]
fn test_templates_in_insertion_order() {
    let router = zoo();
    assert_eq!(router.templates()[0], "/");
    assert_eq!(router.templates().len(), 6);
}

#[test]
fn test_ambiguous_templates() {
    let err = Router::build(vec![
        ("/zoo/{id}".to_string(), 1),
        ("/zoo/{name}".to_string(), 2),
    ])
    .err()
    .unwrap();
    assert_eq!(
        err,
        CompileError::DuplicateRoute {
            first: "/zoo/{id}".to_string(),
            second: "/zoo/{name}".to_string(),
        }
    );
}
