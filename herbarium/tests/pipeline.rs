//! End-to-end pass: a REST source and a bulk file registered on one
//! engine, looked up and searched together.

use herbarium::{
    BulkSource, CacheRequest, Config, Converter, FieldRule, Herbarium, RestSource, SourceError,
    Trait, Unit,
};
use herbarium_cache::testing::{ScriptedResponse, ScriptedTransport};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

const API: &str = "http://api.example/plants";

fn rest_pages(transport: &ScriptedTransport) {
    let first = json!({
        "items": [
            {
                "scientific_name": "Symphytum officinale",
                "common_names": ["Comfrey", "Consoude"],
                "height": "120"
            },
            // Nameless, dropped during iteration.
            {"common_names": ["Mystery plant"]}
        ],
        "next_cursor": "p2"
    });
    let second = json!({
        "items": [
            {
                "scientific_name": "Symphytum x uplandicum",
                "common_names": ["Consoude russe", "Rusian comfrey"]
            }
        ],
        "next_cursor": null
    });
    transport.respond(
        &CacheRequest::get(API),
        ScriptedResponse::ok(first.to_string().as_bytes()).with_max_age(3600),
    );
    transport.respond(
        &CacheRequest::get(API).with_param("cursor", "p2"),
        ScriptedResponse::ok(second.to_string().as_bytes()).with_max_age(3600),
    );
}

fn bulk_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        "scientific name,common names,height\n\
         Salix alba,White willow,20\n\
         Malus domestica,Apple,4\n"
    )
    .expect("write csv");
    file
}

fn engine(transport: Arc<ScriptedTransport>, bulk: &tempfile::NamedTempFile) -> Herbarium {
    let engine =
        Herbarium::with_transport(&Config::default(), transport).expect("engine");
    engine
        .register("rest", |config| {
            let converter = Converter::new(
                "rest",
                [("height", "height", FieldRule::Measure(Unit::Centimeters))],
            );
            Ok(Box::new(RestSource::new(
                "rest",
                config.cache(),
                API,
                converter,
            )))
        })
        .expect("register rest");
    let bulk_path = bulk.path().to_path_buf();
    engine
        .register("bulk", move |_| {
            let converter = Converter::new(
                "bulk",
                [("height", "height", FieldRule::Measure(Unit::Meters))],
            );
            Ok(Box::new(BulkSource::new("bulk", &bulk_path, converter)?))
        })
        .expect("register bulk");
    engine
}

#[test]
fn test_sources_are_singletons_per_engine() {
    let bulk = bulk_file();
    let engine = engine(Arc::new(ScriptedTransport::new()), &bulk);
    let first = engine.database("bulk").expect("bulk");
    let second = engine.database("bulk").expect("bulk");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(engine.sources(), vec!["rest", "bulk"]);
}

#[test]
fn test_lookup_crosses_sources() {
    let transport = Arc::new(ScriptedTransport::new());
    rest_pages(&transport);
    let bulk = bulk_file();
    let engine = engine(Arc::clone(&transport), &bulk);

    let comfrey = engine.lookup("Symphytum officinale").expect("rest record");
    assert!(matches!(
        comfrey.characteristics.get("height"),
        Some(Trait::Measure(_))
    ));

    let willow = engine.lookup("salix alba").expect("bulk record");
    assert!(willow.common_names.contains("white willow"));

    assert!(matches!(
        engine.lookup("quercus robur"),
        Err(SourceError::NotFound(_))
    ));
}

#[test]
fn test_search_spans_all_sources() {
    let transport = Arc::new(ScriptedTransport::new());
    rest_pages(&transport);
    let bulk = bulk_file();
    let engine = engine(Arc::clone(&transport), &bulk);

    assert_eq!(engine.search("Consoude").unwrap(), vec!["symphytum officinale"]);
    assert_eq!(
        engine.search("consoude russe").unwrap(),
        vec!["symphytum x uplandicum"]
    );
    assert_eq!(engine.search("willow").unwrap(), vec!["salix alba"]);
}

#[test]
fn test_index_build_survives_malformed_item() {
    let transport = Arc::new(ScriptedTransport::new());
    rest_pages(&transport);
    let bulk = bulk_file();
    let engine = engine(Arc::clone(&transport), &bulk);

    // The nameless REST item is dropped, not fatal to the build.
    assert_eq!(engine.search("comfrey").unwrap(), vec!["symphytum officinale"]);
    assert!(engine.search("mystery plant").unwrap().is_empty());
}

#[test]
fn test_repeated_iteration_hits_the_cache() {
    let transport = Arc::new(ScriptedTransport::new());
    rest_pages(&transport);
    let bulk = bulk_file();
    let engine = engine(Arc::clone(&transport), &bulk);

    let rest = engine.database("rest").expect("rest");
    assert_eq!(rest.iterate().count(), 2);
    assert_eq!(rest.iterate().count(), 2);
    assert_eq!(transport.calls(), 2);
}
