use atomxml::atom::{Entry, Feed, Text};
use atomxml::{ames, from_str, parse_document, thr, Error, FromXml, ToXml};

#[test]
fn test_minimal_feed_decodes_to_defaults() {
    let feed: Feed = from_str(r#"<feed xmlns="http://www.w3.org/2005/Atom"/>"#).unwrap();
    assert_eq!(feed, Feed::default());
}

#[test]
fn test_decode_never_fails_on_malformed_fields() {
    let feed: Feed = from_str(
        r#"<feed xmlns="http://www.w3.org/2005/Atom">
             <updated>the twelfth of never</updated>
             <link href="x" length="not-a-number"/>
             <entry><published>???</published></entry>
           </feed>"#,
    )
    .unwrap();
    assert_eq!(feed.source.meta.updated, None);
    assert_eq!(feed.source.meta.links[0].length, None);
    assert_eq!(feed.entries[0].published, None);
}

#[test]
fn test_unknown_children_are_skipped_without_loss() {
    let entry: Entry = from_str(
        r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:x="urn:x">
             <x:rating>5</x:rating>
             <title type="text">kept</title>
             <x:more><deeply><nested/></deeply></x:more>
           </entry>"#,
    )
    .unwrap();
    assert_eq!(
        entry.meta.title.as_ref().and_then(Text::as_plain),
        Some("kept")
    );
}

#[test]
fn test_root_tag_mismatch() {
    let err = from_str::<Feed>(r#"<entry xmlns="http://www.w3.org/2005/Atom"/>"#).unwrap_err();
    match err {
        Error::RootTag { expected, found } => {
            assert_eq!(expected.local, "feed");
            assert_eq!(found.local, "entry");
        }
        other => panic!("expected root-tag error, got {other}"),
    }
}

#[test]
fn test_malformed_xml_is_parse_error() {
    let err = from_str::<Feed>("<feed xmlns='http://www.w3.org/2005/Atom'>").unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_prefix_choice_does_not_matter() {
    let a: Feed = from_str(
        r#"<atom:feed xmlns:atom="http://www.w3.org/2005/Atom">
             <atom:id>urn:f</atom:id>
           </atom:feed>"#,
    )
    .unwrap();
    let b: Feed = from_str(
        r#"<ns0:feed xmlns:ns0="http://www.w3.org/2005/Atom">
             <ns0:id>urn:f</ns0:id>
           </ns0:feed>"#,
    )
    .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_required_fields_checked_most_specific_first() {
    // id satisfied, title missing: the title check fires, not some
    // deeper or later one
    let entry: Entry = from_str(
        r#"<entry xmlns="http://www.w3.org/2005/Atom"><id>urn:1</id></entry>"#,
    )
    .unwrap();
    assert_eq!(
        entry.encode_root().unwrap_err(),
        Error::Incomplete {
            type_name: "atom::Entry",
            field: "title"
        }
    );
}

#[test]
fn test_nested_incomplete_node_aborts_encode() {
    use atomxml::atom::{Date, Meta, Person};
    use time::macros::datetime;

    let entry = Entry {
        meta: Meta {
            id: Some("urn:1".to_string()),
            title: Some(Text::plain("t")),
            updated: Some(Date::from(datetime!(2012-12-13 08:29:29 UTC))),
            authors: vec![Person::default()],
            ..Meta::default()
        },
        ..Entry::default()
    };
    assert_eq!(
        entry.encode_root().unwrap_err(),
        Error::Incomplete {
            type_name: "atom::Person",
            field: "name"
        }
    );
}

#[test]
fn test_dispatch_override_decodes_thr_links() {
    // the same document read as a plain entry and as a threaded entry:
    // the threaded type's dispatch override must win
    let doc = r#"<entry xmlns="http://www.w3.org/2005/Atom"
                        xmlns:thr="http://purl.org/syndication/thread/1.0">
                   <link rel="replies" href="http://example.org/replies"
                         thr:count="3"/>
                 </entry>"#;
    let element = parse_document(doc).unwrap();

    let plain = Entry::from_xml(&element);
    assert_eq!(plain.meta.links.len(), 1);

    let threaded = thr::Entry::from_xml(&element);
    assert!(threaded.entry.meta.links.is_empty());
    assert_eq!(threaded.links.len(), 1);
    assert_eq!(threaded.links[0].count, Some(3));
}

#[test]
fn test_ames_post_document() {
    let post: ames::Post = from_str(
        r#"<post xmlns="http://www.alipedis.com/2012/ames"
                 xmlns:atom="http://www.w3.org/2005/Atom">
             <atom:id>urn:message:1</atom:id>
             <atom:updated>2012-12-13T08:29:29Z</atom:updated>
             <atom:content type="text">psst!</atom:content>
           </post>"#,
    )
    .unwrap();
    assert_eq!(post.entry.meta.id.as_deref(), Some("urn:message:1"));
    let xml = atomxml::to_string(&post).unwrap();
    assert!(xml.contains("ames:post"));
    let again: ames::Post = from_str(&xml).unwrap();
    assert_eq!(again, post);
}
