use super::Router;

fn router(templates: &[&str]) -> Router<String> {
    Router::build(templates.iter().map(|t| (t.to_string(), t.to_string()))).unwrap()
}

#[test]
fn test_extracted_values_equal_path_substrings() {
    let templates = [
        "/a/{x}",
        "/a/{x}/b/{y}",
        "/v/{version}/orgs/{org}/teams/{team}/members/{member}",
        "/{first}/fixed/{second}",
    ];
    let r = router(&templates);
    let values = ["1", "abc", "with-dash", "x.y", "%20", "UPPER"];

    for template in templates {
        for value in values {
            let mut expected = Vec::new();
            let concrete: Vec<String> = template
                .split('/')
                .map(|segment| {
                    match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                        Some(name) => {
                            let v = format!("{value}{}", expected.len());
                            expected.push((name.to_string(), v.clone()));
                            v
                        }
                        None => segment.to_string(),
                    }
                })
                .collect();
            let path = concrete.join("/");

            let m = r.route(&path).unwrap_or_else(|| panic!("no match for {path}"));
            assert_eq!(*m.route, template, "wrong route for {path}");
            for (name, v) in &expected {
                assert_eq!(m.get_path_param(name), Some(v.as_str()), "{path}");
            }
            assert_eq!(m.path_params.len(), expected.len());
        }
    }
}

#[test]
fn test_literal_route_wins_over_parameter() {
    let r = router(&["/items/{id}", "/items/special"]);
    assert_eq!(*r.route("/items/special").unwrap().route, "/items/special");
    assert_eq!(*r.route("/items/7").unwrap().route, "/items/{id}");
}

#[test]
fn test_unmatched_paths() {
    let r = router(&["/pets", "/pets/{id}"]);
    assert!(r.route("/dogs").is_none());
    assert!(r.route("/pets/1/toys").is_none());
}

#[test]
fn test_trailing_slash_matches_same_route() {
    let r = router(&["/pets/{id}"]);
    let m = r.route("/pets/9/").unwrap();
    assert_eq!(m.get_path_param("id"), Some("9"));
    assert_eq!(m.path_params_map().get("id").map(String::as_str), Some("9"));
}

#[test]
fn test_ambiguous_templates_fail_build() {
    let result = Router::build(vec![
        ("/items/{id}".to_string(), 1),
        ("/items/{name}".to_string(), 2),
    ]);
    assert!(result.is_err());
}

#[test]
fn test_templates_listed_in_insertion_order() {
    let r = router(&["/b", "/a"]);
    assert_eq!(r.templates(), &["/b".to_string(), "/a".to_string()]);
}
