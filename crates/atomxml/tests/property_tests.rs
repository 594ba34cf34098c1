//! Property-based tests
//!
//! 1. Round-trip: a valid node encodes to XML and decodes back to an
//!    equal node.
//! 2. The writer and parser agree on escaping for arbitrary text and
//!    attribute values.

use proptest::prelude::*;
use time::OffsetDateTime;

use atomxml::atom::{Category, Date, Entry, Feed, Link, Meta, Person, Source, Text};
use atomxml::{from_str, parse_document, to_string, Element, QName};

fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,20}"
}

fn arb_iri() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_map(|tail| format!("http://example.net/{tail}"))
}

fn arb_timestamp() -> impl Strategy<Value = OffsetDateTime> {
    // anywhere in 1970..=2500, whole seconds
    (0i64..16_725_225_600).prop_map(|secs| {
        OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    })
}

fn arb_link() -> impl Strategy<Value = Link> {
    (
        arb_iri(),
        proptest::option::of("[a-z]{1,10}"),
        proptest::option::of(proptest::num::u64::ANY),
    )
        .prop_map(|(href, rel, length)| Link {
            href: Some(href),
            rel,
            length,
            ..Link::default()
        })
}

fn arb_person() -> impl Strategy<Value = Person> {
    (arb_name(), proptest::option::of(arb_iri())).prop_map(|(name, uri)| Person {
        name: Some(name),
        uri,
        ..Person::default()
    })
}

fn arb_category() -> impl Strategy<Value = Category> {
    (arb_name(), proptest::option::of(arb_name())).prop_map(|(term, label)| Category {
        term: Some(term),
        label,
        ..Category::default()
    })
}

fn arb_meta() -> impl Strategy<Value = Meta> {
    (
        arb_iri(),
        arb_name(),
        arb_timestamp(),
        proptest::collection::vec(arb_link(), 0..4),
        proptest::collection::vec(arb_person(), 0..3),
        proptest::collection::vec(arb_category(), 0..3),
    )
        .prop_map(|(id, title, updated, links, authors, categories)| Meta {
            id: Some(id),
            title: Some(Text::plain(title)),
            updated: Some(Date::from(updated)),
            links,
            authors,
            categories,
            ..Meta::default()
        })
}

fn arb_entry() -> impl Strategy<Value = Entry> {
    (arb_meta(), proptest::option::of(arb_name())).prop_map(|(meta, summary)| Entry {
        meta,
        summary: summary.map(Text::plain),
        ..Entry::default()
    })
}

fn arb_feed() -> impl Strategy<Value = Feed> {
    (arb_meta(), proptest::collection::vec(arb_entry(), 0..4)).prop_map(|(meta, entries)| Feed {
        source: Source {
            meta,
            ..Source::default()
        },
        entries,
    })
}

proptest! {
    #[test]
    fn prop_feed_round_trips(feed in arb_feed()) {
        let xml = to_string(&feed).expect("valid feed encodes");
        let reparsed: Feed = from_str(&xml).expect("encoded feed parses");
        prop_assert_eq!(reparsed, feed);
    }

    #[test]
    fn prop_link_lists_keep_order(links in proptest::collection::vec(arb_link(), 0..8)) {
        let feed = Feed {
            source: Source {
                meta: Meta {
                    id: Some("urn:f".to_string()),
                    title: Some(Text::plain("t")),
                    updated: Some(Date::from(OffsetDateTime::UNIX_EPOCH)),
                    links: links.clone(),
                    ..Meta::default()
                },
                ..Source::default()
            },
            entries: Vec::new(),
        };
        let xml = to_string(&feed).expect("valid feed encodes");
        let reparsed: Feed = from_str(&xml).expect("encoded feed parses");
        prop_assert_eq!(reparsed.source.meta.links, links);
    }

    #[test]
    fn prop_text_and_attributes_escape_cleanly(
        text in "[ -~]{1,40}",
        value in "[ -~]{0,40}",
    ) {
        prop_assume!(!text.trim().is_empty());
        let mut element = Element::new(QName::unqualified("e"));
        element.set_text(text.clone());
        element.set_attr(QName::unqualified("a"), value.clone());

        let written = atomxml::xml::writer::element_string(&element);
        let reparsed = parse_document(&written).expect("own output parses");
        prop_assert_eq!(reparsed.first_text(), Some(text.as_str()));
        prop_assert_eq!(reparsed.attr_local("a"), Some(value.as_str()));
    }
}
