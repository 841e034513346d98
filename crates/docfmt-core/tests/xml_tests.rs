use std::path::Path;

use docfmt_core::catalog;
use docfmt_core::{Error, JsonDocument, Node, XmlDocument, XmlOpts, parse_table};

const LIBRARY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- sample -->
<library>
  <book lang="en">
    <title>1984</title>
    <author>George Orwell</author>
  </book>
  <book lang="fr">
    <title>Candide</title>
    <author>Voltaire</author>
  </book>
  <magazine>
    <title>Wired</title>
  </magazine>
</library>
"#;

fn titles(doc: &XmlDocument, query: &str) -> Vec<String> {
    doc.query(query)
        .unwrap()
        .iter()
        .map(|r| doc.element(r).unwrap().text_content())
        .collect()
}

#[test]
fn empty_document_is_library() {
    let doc = XmlDocument::new();
    assert_eq!(doc.root().name, "library");
    assert!(doc.root().children.is_empty());
    let s = doc.serialize(true).unwrap();
    assert!(s.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(s.contains("<library/>"));

    let custom = XmlDocument::with_opts(XmlOpts {
        root_name: "catalog".into(),
        indent: 4,
    });
    assert_eq!(custom.root().name, "catalog");
}

#[test]
fn add_book_escapes_markup() {
    let mut doc = XmlDocument::new();
    doc.add_book("A & B", "O'Brien <x>", "1949", "Secker & Warburg");
    let s = doc.serialize(true).unwrap();
    assert!(s.contains("<title>A &amp; B</title>"));
    assert!(s.contains("O&apos;Brien &lt;x&gt;"));
    assert!(s.contains("Secker &amp; Warburg"));
    assert!(!s.contains("A & B"));

    // stored unescaped, so a re-parse gives the same text back
    let back = XmlDocument::parse(&s).unwrap();
    assert_eq!(titles(&back, "/library/book/title"), vec!["A & B"]);
    assert_eq!(back, doc);
}

#[test]
fn pretty_output_indents_children() {
    let mut doc = XmlDocument::new();
    doc.add_book("1984", "George Orwell", "1949", "Secker & Warburg");
    let s = doc.serialize(true).unwrap();
    assert!(s.contains("\n  <book>"));
    assert!(s.contains("\n    <title>1984</title>"));
    assert!(s.contains("\n    <publisher>Secker &amp; Warburg</publisher>"));
    assert!(s.ends_with("</library>\n"));

    let compact = doc.serialize(false).unwrap();
    assert!(compact.contains("<library><book><title>1984</title>"));
}

#[test]
fn parse_round_trip_ignores_formatting() {
    let doc = XmlDocument::parse(LIBRARY).unwrap();
    assert_eq!(doc.root().children.len(), 3);
    let again = XmlDocument::parse(&doc.serialize(true).unwrap()).unwrap();
    assert_eq!(again, doc);
    let compact = XmlDocument::parse(&doc.serialize(false).unwrap()).unwrap();
    assert_eq!(compact, doc);
}

#[test]
fn leaf_text_survives_round_trip() {
    let mut doc = XmlDocument::new();
    let b = doc.add_book(" 1984 ", "George Orwell\n", "1949", "Secker & Warburg <UK>");
    doc.add_element(&b, "note", Some("   ")).unwrap();
    doc.add_element(&b, "lines", Some("first\n  second\n")).unwrap();
    doc.add_attribute(&b, "id", " padded ").unwrap();

    for pretty in [true, false] {
        let back = XmlDocument::parse(&doc.serialize(pretty).unwrap()).unwrap();
        assert_eq!(back, doc, "pretty = {}", pretty);
    }
    let back = XmlDocument::parse(&doc.serialize(true).unwrap()).unwrap();
    assert_eq!(titles(&back, "/library/book/title"), vec![" 1984 "]);
    assert_eq!(titles(&back, "//note"), vec!["   "]);
    assert_eq!(back.query("//book[title=' 1984 ']").unwrap().len(), 1);
}

#[test]
fn layout_whitespace_between_elements_is_dropped() {
    let doc = XmlDocument::parse("<library>\n\t<book>\n   <title> A </title>\n</book>\n</library>")
        .unwrap();
    assert_eq!(doc.root().text, "");
    let book = &doc.root().children[0];
    assert_eq!(book.text, "");
    assert_eq!(book.children[0].text, " A ");
}

#[test]
fn malformed_xml_is_rejected() {
    for bad in ["", "   ", "<a><b></a>", "<a>", "<a/><b/>", "text<a/>", "<a>&bogus;</a>"] {
        assert!(
            matches!(XmlDocument::parse(bad), Err(Error::MalformedXml(_))),
            "accepted {:?}",
            bad
        );
    }
}

#[test]
fn xpath_queries() {
    let doc = XmlDocument::parse(LIBRARY).unwrap();
    assert_eq!(doc.query("/library/book").unwrap().len(), 2);
    assert_eq!(
        titles(&doc, "//title"),
        vec!["1984", "Candide", "Wired"]
    );
    assert_eq!(titles(&doc, "book[@lang='fr']/title"), vec!["Candide"]);
    assert_eq!(titles(&doc, "//book[title=\"1984\"]/author"), vec!["George Orwell"]);
    assert_eq!(titles(&doc, "/library/book[2]/title"), vec!["Candide"]);
    assert_eq!(titles(&doc, "/library/book[last()]/title"), vec!["Candide"]);
    assert_eq!(doc.query("/library/*").unwrap().len(), 3);
    assert_eq!(doc.query("//title/..").unwrap().len(), 3);
    assert_eq!(doc.query("//book[@lang]").unwrap().len(), 2);
    assert_eq!(doc.query("//*[title]").unwrap().len(), 3);
    assert_eq!(titles(&doc, "//title[text()='Wired']"), vec!["Wired"]);
    assert_eq!(doc.query("/library//author").unwrap().len(), 2);
    assert_eq!(doc.query("/").unwrap().len(), 0);

    let root = doc.query("/library").unwrap();
    assert_eq!(root.len(), 1);
    assert!(root[0].is_root());

    assert!(doc.query("/library/nothing").unwrap().is_empty());
    assert!(doc.query("/shelf/book").unwrap().is_empty());
    assert!(matches!(
        doc.query("/library/book["),
        Err(Error::InvalidQuery { .. })
    ));
}

#[test]
fn delete_by_query() {
    let mut doc = XmlDocument::parse(LIBRARY).unwrap();
    assert_eq!(doc.delete_elements("//book[author='Voltaire']").unwrap(), 1);
    assert_eq!(titles(&doc, "/library/book/title"), vec!["1984"]);
    assert_eq!(doc.delete_elements("//nothing").unwrap(), 0);
    // root can't be removed
    assert_eq!(doc.delete_elements("/library").unwrap(), 0);
    assert_eq!(doc.root().name, "library");
    // unions are not supported
    assert!(doc.delete_elements("//book | //title").is_err());
    // ancestors and their descendants both match
    assert_eq!(doc.delete_elements("//*").unwrap(), 5);
    assert!(doc.root().children.is_empty());
}

#[test]
fn elements_and_attributes() {
    let mut doc = XmlDocument::new();
    let b = doc.add_book("1984", "George Orwell", "1949", "Secker & Warburg");
    doc.add_attribute(&b, "id", "a\"1").unwrap();
    let isbn = doc.add_element(&b, "isbn", Some("978 & more")).unwrap();
    assert_eq!(isbn.depth(), 2);
    doc.add_element(&b, "notes", None).unwrap();

    let s = doc.serialize(true).unwrap();
    assert!(s.contains(r#"<book id="a&quot;1">"#));
    assert!(s.contains("<isbn>978 &amp; more</isbn>"));
    assert!(s.contains("<notes/>"));
    assert_eq!(doc.element(&b).unwrap().attributes["id"], "a\"1");

    assert!(matches!(
        doc.add_element(&b, "1bad", None),
        Err(Error::InvalidName(_))
    ));
    assert!(matches!(
        doc.add_attribute(&b, "has space", "x"),
        Err(Error::InvalidName(_))
    ));

    doc.delete_elements("/library/book").unwrap();
    assert!(matches!(
        doc.add_attribute(&b, "id", "2"),
        Err(Error::StaleElement)
    ));
}

#[test]
fn tree_store_collects_repeated_siblings() {
    let doc = XmlDocument::parse(LIBRARY).unwrap();
    let tree = doc.to_tree_store();
    let books = tree.get("book").and_then(Node::as_mapping).unwrap();
    assert!(books.is_list());
    assert_eq!(books.len(), 2);
    assert_eq!(
        doc.to_json(false).unwrap(),
        concat!(
            r#"{"book":[{"@attributes":{"lang":"en"},"title":"1984","author":"George Orwell"},"#,
            r#"{"@attributes":{"lang":"fr"},"title":"Candide","author":"Voltaire"}],"#,
            r#""magazine":{"title":"Wired"}}"#
        )
    );

    let rebuilt = XmlDocument::from_tree_store(&tree).unwrap();
    assert_eq!(rebuilt, doc);
}

#[test]
fn tree_store_text_and_empty_elements() {
    let doc = XmlDocument::parse(r#"<library><note kind="x">hi</note><empty/></library>"#).unwrap();
    assert_eq!(
        doc.to_json(false).unwrap(),
        r##"{"note":{"@attributes":{"kind":"x"},"#text":"hi"},"empty":{}}"##
    );
    assert_eq!(XmlDocument::from_tree_store(&doc.to_tree_store()).unwrap(), doc);
}

#[test]
fn from_json_tree() {
    let json = JsonDocument::parse(
        r#"{"book":[{"title":"A"},{"title":"B"}],"flag":true,"n":3,"none":null}"#,
    )
    .unwrap();
    let doc = XmlDocument::from_tree_store(json.root()).unwrap();
    assert_eq!(titles(&doc, "/library/book/title"), vec!["A", "B"]);
    let s = doc.serialize(false).unwrap();
    assert!(s.contains("<flag>true</flag><n>3</n><none/>"));

    let keyed = JsonDocument::parse(r#"{"1984":{"author":"George Orwell"}}"#).unwrap();
    assert!(matches!(
        XmlDocument::from_tree_store(keyed.root()),
        Err(Error::InvalidName(k)) if k == "1984"
    ));
}

#[test]
fn json_files_and_xml_files() {
    let dir = tempfile::tempdir().unwrap();
    let doc = XmlDocument::parse(LIBRARY).unwrap();

    let json_path = dir.path().join("library.json");
    doc.save_to_json(&json_path).unwrap();
    let mut loaded = XmlDocument::new();
    loaded.load_from_json(&json_path).unwrap();
    assert_eq!(loaded, doc);

    let xml_path = dir.path().join("library.xml");
    doc.save_to_path(&xml_path).unwrap();
    assert_eq!(XmlDocument::load_from_path(&xml_path).unwrap(), doc);

    assert!(matches!(
        XmlDocument::load_from_path(&dir.path().join("nope.xml")),
        Err(Error::FileNotFound(_))
    ));
}

#[test]
fn collaborators_receive_serialized_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = XmlDocument::new();
    doc.add_book("1984", "George Orwell", "1949", "Secker & Warburg");

    let validator = |xml: &str, schema: &Path| -> docfmt_core::Result<bool> {
        Ok(schema.ends_with("books.xsd") && xml.contains("<book>"))
    };
    assert!(doc.validate_against(&validator, Path::new("books.xsd")).unwrap());
    assert!(!doc.validate_against(&validator, Path::new("other.xsd")).unwrap());

    let processor = |xml: &str, _: &Path| -> docfmt_core::Result<Vec<u8>> {
        Ok(xml.to_uppercase().into_bytes())
    };
    let out = dir.path().join("out.html");
    doc.transform_with(&processor, Path::new("books.xsl"), &out)
        .unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("<TITLE>1984</TITLE>"));

    let failing = |_: &str, _: &Path| -> docfmt_core::Result<bool> {
        Err(Error::Collaborator("schema not found".into()))
    };
    assert!(matches!(
        doc.validate_against(&failing, Path::new("x.xsd")),
        Err(Error::Collaborator(_))
    ));
}

#[test]
fn csv_books_to_xml() {
    let table = parse_table(
        "title,author,year,publisher\n1984,George Orwell,1949,Secker & Warburg\n",
    )
    .unwrap();
    let mut doc = XmlDocument::new();
    assert_eq!(catalog::table_to_xml(&table, &mut doc), 1);
    let books = doc.query("/library/book").unwrap();
    assert_eq!(books.len(), 1);
    let book = doc.element(&books[0]).unwrap();
    let names: Vec<&str> = book.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, catalog::BOOK_COLUMNS);
    let texts: Vec<&str> = book.children.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["1984", "George Orwell", "1949", "Secker & Warburg"]);
    assert!(
        doc.serialize(true)
            .unwrap()
            .contains("<publisher>Secker &amp; Warburg</publisher>")
    );
}
