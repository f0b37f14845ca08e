use catsearch_core::alt_name::{alternate_name, alternate_query};
use catsearch_core::config::{expand_path, CacheBackendKind, Config, DEFAULT_INDEX_DIR};
use catsearch_core::document::{DocumentBuilder, PriorityClassifier};
use catsearch_core::types::{AttributeValue, CatalogEntity, StockStatus};
use figment::providers::{Format, Toml};
use figment::Figment;
use proptest::prelude::*;

#[test]
fn alternate_name_strips_first_char_of_long_tokens() {
    assert_eq!(alternate_name("Santa Julia Malbec"), "anta ulia albec");
    assert_eq!(alternate_name("Zuccardi Q"), "uccardi q");
}

#[test]
fn alternate_name_edge_inputs() {
    assert_eq!(alternate_name(""), "");
    assert_eq!(alternate_name("   \t\n "), "");
    assert_eq!(alternate_name("Vino  de   la Casa"), "ino de la asa");
    assert_eq!(alternate_name("AB cd"), "ab cd");
}

#[test]
fn alternate_query_reports_no_op() {
    assert_eq!(alternate_query("ab cd"), None);
    assert_eq!(alternate_query("AB CD"), None);
    assert_eq!(alternate_query(""), None);
    assert_eq!(alternate_query("zanta jul"), Some("anta ul".to_string()));
}

#[test]
fn alternate_query_matches_index_side_transform() {
    let name = "Santa Julia Malbec";
    assert_eq!(alternate_query(name).as_deref(), Some(alternate_name(name).as_str()));
}

proptest! {
    #[test]
    fn transform_preserves_token_count(words in proptest::collection::vec("[a-zA-Zñáé]{1,12}", 0..6)) {
        let input = words.join(" ");
        let out = alternate_name(&input);
        let out_tokens: Vec<&str> = out.split_whitespace().collect();
        prop_assert_eq!(out_tokens.len(), words.len());
        for (word, token) in words.iter().zip(out_tokens) {
            let len = word.to_lowercase().chars().count();
            let expected = if len > 2 { len - 1 } else { len };
            prop_assert_eq!(token.chars().count(), expected);
        }
    }

    #[test]
    fn transform_is_deterministic(input in "\\PC{0,40}") {
        prop_assert_eq!(alternate_name(&input), alternate_name(&input));
    }
}

fn sample_entity() -> CatalogEntity {
    let mut entity = CatalogEntity::new(42, "Santa Julia Malbec")
        .with_categories(["Vinos", "Tintos"])
        .with_attribute("pa_marca", "Santa Julia")
        .with_attribute("País", "Argentina")
        .with_attribute("varietal", AttributeValue::Many(vec!["Malbec".into(), "Syrah".into()]));
    entity.sku = "SJ-750".into();
    entity.price = 39.9;
    entity.stock_status = StockStatus::OutOfStock;
    entity.image_url = "https://shop.example/img/sj.jpg".into();
    entity.permalink = "https://shop.example/p/santa-julia".into();
    entity
}

#[test]
fn builder_maps_entity_fields() {
    let doc = DocumentBuilder::default().build(&sample_entity());
    assert_eq!(doc.id, 42);
    assert_eq!(doc.name_alt, "anta ulia albec");
    assert_eq!(doc.sku, "SJ-750");
    assert!(!doc.in_stock);
    assert_eq!(doc.stock_status, StockStatus::OutOfStock);
    assert_eq!(doc.image, "https://shop.example/img/sj.jpg");
    assert_eq!(doc.url, "https://shop.example/p/santa-julia");
    assert_eq!(doc.priority, 1);
}

#[test]
fn builder_extracts_all_six_attributes() {
    let doc = DocumentBuilder::default().build(&sample_entity());
    assert_eq!(doc.attributes.brand, "Santa Julia");
    assert_eq!(doc.attributes.country, "Argentina");
    assert_eq!(doc.attributes.varietal, "Malbec, Syrah");
    assert_eq!(doc.attributes.region, "");
    assert_eq!(doc.attributes.kind, "");
    assert_eq!(doc.attributes.volume, "");

    let json = serde_json::to_value(&doc).expect("serialize");
    for key in ["brand", "country", "region", "kind", "varietal", "volume"] {
        assert!(json.get(key).is_some(), "attribute field {} present", key);
    }
}

#[test]
fn accessory_categories_get_low_priority() {
    let builder = DocumentBuilder::default();
    let accessory = CatalogEntity::new(1, "Copa Riedel").with_categories(["Accesorios", "Cristalería"]);
    let wine = CatalogEntity::new(2, "Catena Zapata").with_categories(["Vinos"]);
    assert_eq!(builder.build(&accessory).priority, 0);
    assert_eq!(builder.build(&wine).priority, 1);
    assert_eq!(builder.build(&CatalogEntity::new(3, "Sin categoria")).priority, 1);
}

#[test]
fn custom_priority_pattern_is_case_insensitive() {
    let classifier = PriorityClassifier::new("gadget").expect("pattern");
    assert_eq!(classifier.priority(&["Bar GADGETS".to_string()]), 0);
    assert!(PriorityClassifier::new("(unclosed").is_err());
}

#[test]
fn negative_price_is_clamped() {
    let mut entity = CatalogEntity::new(5, "Oferta");
    entity.price = -3.0;
    assert_eq!(DocumentBuilder::default().build(&entity).price, 0.0);
}

#[test]
fn entity_deserializes_with_defaults() {
    let entity: CatalogEntity = serde_json::from_str(r#"{"id": 7, "name": "Tacama", "stock_status": "outofstock"}"#).expect("parse");
    assert!(entity.published);
    assert_eq!(entity.stock_status, StockStatus::OutOfStock);
    assert!(entity.categories.is_empty());
}

#[test]
fn config_defaults_and_overrides() {
    let config = Config::from_figment(Figment::new());
    let settings = config.settings().expect("defaults are valid");
    assert_eq!(settings.cache.ttl_secs, 300);
    assert_eq!(settings.sync.batch_size, 50);
    assert_eq!(settings.search.min_query_len, 2);
    assert_eq!(settings.engine.index_dir.as_deref(), Some(DEFAULT_INDEX_DIR));

    let config = Config::from_figment(Figment::new().merge(Toml::string(
        r#"
        [cache]
        backend = "memory"
        ttl_secs = 60

        [search]
        max_limit = 30
        "#,
    )));
    let settings = config.settings().expect("valid");
    assert_eq!(settings.cache.backend, CacheBackendKind::Memory);
    assert_eq!(settings.cache.ttl_secs, 60);
    assert_eq!(settings.search.max_limit, 30);
    assert_eq!(config.get::<u64>("cache.ttl_secs").expect("get"), 60);
}

#[test]
fn config_rejects_invalid_values() {
    let zero_batch = Config::from_figment(Figment::new().merge(Toml::string("[sync]\nbatch_size = 0\n")));
    assert!(zero_batch.settings().is_err());

    let bad_regex = Config::from_figment(Figment::new().merge(Toml::string("[priority]\nlow_priority_pattern = \"(\"\n")));
    assert!(bad_regex.settings().is_err());
}

#[test]
fn default_index_dir_is_persistent_and_expanded() {
    let dir = expand_path(DEFAULT_INDEX_DIR);
    assert!(!dir.starts_with("~"), "home directory is expanded");
    assert!(dir.ends_with(".catsearch/index"));

    std::env::set_var("CATSEARCH_TEST_ROOT", "/srv/search");
    assert_eq!(expand_path("${CATSEARCH_TEST_ROOT}/index"), std::path::PathBuf::from("/srv/search/index"));
}
