//! 属性源：占位符求值、复合合并与硬失败路径。

use std::sync::Arc;

use forge_assembly::{
    AssemblyError, Candidate, ClassMetadata, MapEnvironment, MapPropertyLoader, MetadataCatalog,
    PropertySource, PropertySourceDecl,
};

use crate::fixtures::builder;

fn loader() -> MapPropertyLoader {
    let mut loader = MapPropertyLoader::new();
    loader.insert("config/prod/app.properties", [("db.host", "prod-db")]);
    loader.insert("config/base.properties", [("db.host", "base-db"), ("db.port", "5432")]);
    loader.insert("config/override.properties", [("db.host", "override-db")]);
    loader
}

fn environment() -> MapEnvironment {
    let mut env = MapEnvironment::new();
    env.set("profile", "prod");
    env
}

#[test]
fn placeholders_in_locations_are_resolved() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Root")
            .marked()
            .with_property_source(PropertySourceDecl::anonymous([
                "config/${profile}/app.properties",
            ])),
    );

    let outcome = builder(catalog)
        .environment(Arc::new(environment()))
        .property_loader(Arc::new(loader()))
        .build()
        .parse([Candidate::of("app::Root")])
        .expect("parse should succeed");

    assert!(outcome
        .property_sources
        .contains("config/prod/app.properties"));
    assert_eq!(outcome.property_sources.get("db.host"), Some("prod-db"));
}

#[test]
fn named_multi_location_declarations_become_composites() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Root")
            .marked()
            .with_property_source(PropertySourceDecl::named(
                "db",
                ["config/base.properties", "config/override.properties"],
            )),
    );

    let outcome = builder(catalog)
        .property_loader(Arc::new(loader()))
        .build()
        .parse([Candidate::of("app::Root")])
        .expect("parse should succeed");

    assert_eq!(outcome.property_sources.len(), 1);
    let source = &outcome.property_sources.sources()[0];
    assert_eq!(source.name(), "db");
    assert!(matches!(source, PropertySource::Composite { .. }));
    // 复合内部按位置顺序查找，首个命中生效。
    assert_eq!(source.get("db.host"), Some("base-db"));
    assert_eq!(source.get("db.port"), Some("5432"));
}

#[test]
fn same_logical_name_across_classes_merges_with_newest_first() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::First")
            .marked()
            .with_property_source(PropertySourceDecl::named("db", ["config/base.properties"])),
    );
    catalog.register(
        ClassMetadata::configuration("app::Second")
            .marked()
            .with_property_source(PropertySourceDecl::named(
                "db",
                ["config/override.properties"],
            )),
    );

    let outcome = builder(catalog)
        .property_loader(Arc::new(loader()))
        .build()
        .parse([Candidate::of("app::First"), Candidate::of("app::Second")])
        .expect("parse should succeed");

    // 同一逻辑名就地合并为复合来源，较新的声明在键冲突时获胜。
    assert_eq!(outcome.property_sources.len(), 1);
    assert_eq!(outcome.property_sources.get("db.host"), Some("override-db"));
    assert_eq!(outcome.property_sources.get("db.port"), Some("5432"));
}

#[test]
fn empty_location_list_is_a_declaration_error() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Root")
            .marked()
            .with_property_source(PropertySourceDecl::anonymous(Vec::<String>::new())),
    );

    let error = builder(catalog)
        .build()
        .parse([Candidate::of("app::Root")])
        .unwrap_err();
    assert!(matches!(error, AssemblyError::PropertySourceInvalid { .. }));
}

#[test]
fn unresolved_placeholder_fails_fast() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Root")
            .marked()
            .with_property_source(PropertySourceDecl::anonymous([
                "config/${absent}/app.properties",
            ])),
    );

    let error = builder(catalog)
        .build()
        .parse([Candidate::of("app::Root")])
        .unwrap_err();
    assert!(matches!(error, AssemblyError::Placeholder { .. }));
}

#[test]
fn missing_location_fails_fast() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Root")
            .marked()
            .with_property_source(PropertySourceDecl::anonymous(["config/nowhere.properties"])),
    );

    let error = builder(catalog)
        .property_loader(Arc::new(loader()))
        .build()
        .parse([Candidate::of("app::Root")])
        .unwrap_err();
    match error {
        AssemblyError::PropertyLoad { location, .. } => {
            assert_eq!(location, "config/nowhere.properties");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
