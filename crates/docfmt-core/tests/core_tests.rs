use docfmt_core::path;
use docfmt_core::{Error, JsonDocument, Mapping, Node};

fn fields(pairs: &[(&str, &str)]) -> Mapping {
    pairs.iter().map(|&(k, v)| (k, v)).collect()
}

#[test]
fn flat_element_scenario() {
    let mut doc = JsonDocument::new();
    doc.add_element("1984", fields(&[("author", "?")]));
    doc.update_element(
        "1984",
        fields(&[("author", "George Orwell"), ("year", "1950")]),
    )
    .unwrap();
    let expected = Node::from(fields(&[("author", "George Orwell"), ("year", "1950")]));
    assert_eq!(doc.get_element("1984"), Some(&expected));
    assert!(doc.has_key("1984"));
    match doc.delete_element("Brave New World") {
        Err(Error::KeyNotFound(k)) => assert_eq!(k, "Brave New World"),
        other => panic!("expected KeyNotFound, got {:?}", other),
    }
    assert!(matches!(
        doc.update_element("Brave New World", "x"),
        Err(Error::KeyNotFound(_))
    ));
    doc.delete_element("1984").unwrap();
    assert!(!doc.has_key("1984"));
    assert!(doc.get_element("1984").is_none());
}

#[test]
fn add_element_is_idempotent() {
    let mut once = JsonDocument::new();
    once.add_element("a", 1i64);
    once.add_element("k", fields(&[("x", "y")]));
    let mut twice = once.clone();
    twice.add_element("k", fields(&[("x", "y")]));
    assert_eq!(once, twice);
    assert_eq!(once.serialize(false).unwrap(), twice.serialize(false).unwrap());
}

#[test]
fn overwrite_keeps_insertion_position() {
    let mut doc = JsonDocument::new();
    doc.add_element("b", 1i64);
    doc.add_element("a", 2i64);
    doc.add_element("b", 3i64);
    assert_eq!(doc.serialize(false).unwrap(), r#"{"b":3,"a":2}"#);
}

#[test]
fn nested_set_then_get_returns_value() {
    let mut root = Mapping::new();
    let cases: Vec<(Vec<&str>, Node)> = vec![
        (vec!["a"], Node::from("top")),
        (vec!["books", "1984", "author"], Node::from("George Orwell")),
        (vec!["books", "1984", "year"], Node::from(1949i64)),
        (vec!["books", "Dune"], Node::from(fields(&[("author", "Herbert")]))),
        (vec!["x", "y", "z", "w"], Node::from(true)),
    ];
    for (p, v) in &cases {
        path::set(&mut root, p, v.clone()).unwrap();
        assert_eq!(path::get(&root, p), Some(v));
    }
    // earlier writes under the same parent survive
    assert_eq!(
        path::get(&root, &["books", "1984", "author"]),
        Some(&Node::from("George Orwell"))
    );
    assert!(path::get(&root, &["books", "missing", "author"]).is_none());
    assert!(path::get(&root, &["a", "under-a-scalar"]).is_none());
    assert!(path::get::<&str>(&root, &[]).is_none());
}

#[test]
fn set_through_scalar_fails_without_changes() {
    let mut doc = JsonDocument::parse(r#"{"book":{"title":"1984"}}"#).unwrap();
    let before = doc.clone();
    match doc.add_nested_element(&["book", "title", "sub"], "x") {
        Err(Error::NotAMapping { segment }) => assert_eq!(segment, "title"),
        other => panic!("expected NotAMapping, got {:?}", other),
    }
    assert_eq!(doc, before);
    assert!(matches!(
        doc.add_nested_element::<&str>(&[], "x"),
        Err(Error::EmptyPath)
    ));
}

#[test]
fn delete_missing_intermediate_names_segment() {
    let mut doc = JsonDocument::parse(r#"{"a":{"b":{"c":1,"d":2}}}"#).unwrap();
    let before = doc.clone();
    match doc.delete_nested_element(&["a", "nope", "c"]) {
        Err(Error::PathNotFound { segment, path }) => {
            assert_eq!(segment, "nope");
            assert_eq!(path, "a/nope");
        }
        other => panic!("expected PathNotFound, got {:?}", other),
    }
    assert_eq!(doc, before);
    assert!(matches!(
        doc.delete_nested_element::<&str>(&[]),
        Err(Error::EmptyPath)
    ));

    doc.delete_nested_element(&["a", "b", "c"]).unwrap();
    assert_eq!(doc.serialize(false).unwrap(), r#"{"a":{"b":{"d":2}}}"#);
    // absent final key is a no-op
    doc.delete_nested_element(&["a", "b", "zzz"]).unwrap();
    assert_eq!(doc.serialize(false).unwrap(), r#"{"a":{"b":{"d":2}}}"#);
}

#[test]
fn json_parse_edge_cases() {
    assert!(JsonDocument::parse("").unwrap().root().is_empty());
    assert!(JsonDocument::parse("  \n").unwrap().root().is_empty());
    assert!(JsonDocument::parse("null").unwrap().root().is_empty());
    assert!(matches!(JsonDocument::parse("{"), Err(Error::MalformedJson(_))));
    assert!(matches!(JsonDocument::parse("42"), Err(Error::MalformedJson(_))));

    let list = JsonDocument::parse(r#"["a","b"]"#).unwrap();
    assert!(list.root().is_list());
    assert_eq!(list.get_element("1"), Some(&Node::from("b")));
    assert_eq!(list.serialize(false).unwrap(), r#"["a","b"]"#);
}

#[test]
fn json_round_trip_preserves_order_and_arrays() {
    let text = r#"{"z":{"tags":["x","y"],"n":1.5,"ok":false,"none":null},"a":{},"m":[{"k":"v"}]}"#;
    let doc = JsonDocument::parse(text).unwrap();
    let out = doc.serialize(false).unwrap();
    assert_eq!(out, text);
    assert_eq!(JsonDocument::parse(&out).unwrap(), doc);

    let pretty = doc.serialize(true).unwrap();
    assert!(pretty.starts_with("{\n  \"z\": {\n    \"tags\": ["));
    assert_eq!(JsonDocument::parse(&pretty).unwrap(), doc);
}

#[test]
fn json_file_load_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    match JsonDocument::load_from_path(&missing) {
        Err(Error::FileNotFound(p)) => assert_eq!(p, missing),
        other => panic!("expected FileNotFound, got {:?}", other),
    }

    let out = dir.path().join("books.json");
    let mut doc = JsonDocument::new();
    doc.add_nested_element(&["1984", "author"], "George Orwell")
        .unwrap();
    doc.save_to_path(&out).unwrap();
    let s = std::fs::read_to_string(&out).unwrap();
    assert!(s.contains("\n    \"author\": \"George Orwell\""));
    assert_eq!(JsonDocument::load_from_path(&out).unwrap(), doc);
}

#[test]
fn root_replacement() {
    let mut doc = JsonDocument::new();
    doc.replace_root(fields(&[("k", "v")]));
    assert_eq!(doc.get_nested_element(&["k"]), Some(&Node::from("v")));
    let root = doc.into_root();
    assert_eq!(JsonDocument::from_root(root.clone()).root(), &root);
}

#[test]
fn slash_paths_split_and_join() {
    assert_eq!(path::split_path("/a/b~1c/d~0e"), vec!["a", "b/c", "d~e"]);
    assert_eq!(path::split_path("a"), vec!["a"]);
    assert!(path::split_path("/").is_empty());
    assert_eq!(path::join_path(&["a", "b/c"]), "a/b~1c");
}
