//! 注册器、组件扫描、条件排除与候选再遭遇语义。

use std::sync::Arc;

use forge_assembly::{
    Candidate, ClassMetadata, ClassName, ComponentScanDecl, FactoryMethod, MetadataCatalog,
    ProblemKind, SkipListed,
};

use crate::fixtures::{builder, names, parse, StaticRegistrar, StaticSelector};

#[test]
fn registrars_contribute_definitions_after_parse() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Root")
            .marked()
            .with_import("app::WireUp"),
    );
    catalog.register(ClassMetadata::registrar(
        "app::WireUp",
        Arc::new(StaticRegistrar::new(&[("gateway", "app::Gateway")])),
    ));

    let outcome = parse(catalog, &["app::Root"]);

    // 注册器类自身不入闭包，贡献体现在定义快照里。
    assert_eq!(names(&outcome), ["app::Root"]);
    assert_eq!(outcome.definitions.len(), 1);
    assert_eq!(outcome.definitions[0].name, "gateway");
    assert_eq!(outcome.definitions[0].class, ClassName::new("app::Gateway"));
}

#[test]
fn component_scans_register_and_recurse() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Root")
            .marked()
            .with_component_scan(ComponentScanDecl::new(["domain"])),
    );
    catalog.register(ClassMetadata::configuration("domain::OrderService"));
    // 扫描命中的配置类会被递归解析，其导入继续展开。
    catalog.register(
        ClassMetadata::configuration("domain::OrderAssembly")
            .marked()
            .with_import("app::Extra"),
    );
    catalog.register(ClassMetadata::configuration("app::Extra").marked());

    let scanner = {
        let mut scan_catalog = MetadataCatalog::new();
        scan_catalog.register(ClassMetadata::configuration("domain::OrderService"));
        scan_catalog.register(
            ClassMetadata::configuration("domain::OrderAssembly")
                .marked()
                .with_import("app::Extra"),
        );
        Arc::new(scan_catalog)
    };

    let outcome = builder(catalog)
        .component_scanner(scanner)
        .build()
        .parse([Candidate::of("app::Root")])
        .expect("parse should succeed");

    let mut registered: Vec<_> = outcome
        .definitions
        .iter()
        .map(|definition| definition.name.as_str())
        .collect();
    registered.sort_unstable();
    assert_eq!(registered, ["orderAssembly", "orderService"]);

    assert!(outcome.contains_class(&ClassName::new("domain::OrderAssembly")));
    assert!(outcome.contains_class(&ClassName::new("app::Extra")));
    // 普通组件不满足配置类判定，不入闭包。
    assert!(!outcome.contains_class(&ClassName::new("domain::OrderService")));
}

#[test]
fn explicit_candidates_evict_imported_nodes() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Importer")
            .marked()
            .with_import("app::Shared"),
    );
    catalog.register(ClassMetadata::configuration("app::Shared").marked());

    let outcome = builder(catalog)
        .build()
        .parse([
            Candidate::of("app::Importer"),
            Candidate::named("app::Shared", "sharedAssembly"),
        ])
        .expect("parse should succeed");

    // 显式定义取代被导入节点，并移动到重处理后的位置。
    assert_eq!(names(&outcome), ["app::Importer", "app::Shared"]);
    let shared = outcome.class(&ClassName::new("app::Shared")).unwrap();
    assert_eq!(shared.bean_name(), Some("sharedAssembly"));
    assert!(!shared.is_imported());
}

#[test]
fn duplicate_factory_methods_across_the_chain_are_diagnosed() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Child")
            .marked()
            .with_superclass("app::Base")
            .with_factory_method(FactoryMethod::new("service")),
    );
    catalog.register(
        ClassMetadata::configuration("app::Base")
            .with_factory_method(FactoryMethod::new("service")),
    );

    let outcome = parse(catalog, &["app::Child"]);

    assert_eq!(outcome.problems.len(), 1);
    match &outcome.problems[0].kind {
        ProblemKind::DuplicateFactoryMethod { class, method } => {
            assert_eq!(class, &ClassName::new("app::Child"));
            assert_eq!(method, "service");
        }
        other => panic!("unexpected problem: {other:?}"),
    }
}

#[test]
fn excluded_importers_run_no_selectors_or_registrars() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Excluded")
            .marked()
            .with_import("app::Pick")
            .with_import("app::WireUp"),
    );
    catalog.register(ClassMetadata::selector(
        "app::Pick",
        Arc::new(StaticSelector::immediate(&["app::Chosen"])),
    ));
    catalog.register(ClassMetadata::registrar(
        "app::WireUp",
        Arc::new(StaticRegistrar::new(&[("gateway", "app::Gateway")])),
    ));
    catalog.register(ClassMetadata::configuration("app::Chosen").marked());

    let outcome = builder(catalog)
        .condition_evaluator(Arc::new(SkipListed::new(["app::Excluded"])))
        .build()
        .parse([Candidate::of("app::Excluded")])
        .expect("parse should succeed");

    assert!(!outcome.contains_class(&ClassName::new("app::Chosen")));
    assert!(outcome.definitions.is_empty());
}

#[test]
fn excluded_importers_tolerate_unreadable_import_candidates() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Excluded")
            .marked()
            .with_import("app::Vanished"),
    );

    let outcome = builder(catalog)
        .condition_evaluator(Arc::new(SkipListed::new(["app::Excluded"])))
        .build()
        .parse([Candidate::of("app::Excluded")])
        .expect("excluded importer should tolerate the unreadable candidate");

    assert_eq!(names(&outcome), ["app::Excluded"]);
}

#[test]
fn imported_resources_are_carried_on_the_node() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Root")
            .marked()
            .with_imported_resource("legacy/wiring.xml"),
    );

    let outcome = parse(catalog, &["app::Root"]);
    let root = outcome.class(&ClassName::new("app::Root")).unwrap();
    assert_eq!(root.imported_resources(), ["legacy/wiring.xml"]);
}
