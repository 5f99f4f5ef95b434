//! 超类链折叠：声明合并、平台终止与读取失败的容忍语义。

use std::sync::{Arc, Mutex};

use forge_assembly::{
    AssemblyError, Candidate, ClassMetadata, ClassName, FactoryMethod, MetadataCatalog,
    MetadataError, MetadataReader, SkipListed,
};

use crate::fixtures::{builder, names, parse};

/// 记录每次读取的包装读取器，用于断言某些名字从未被加载。
struct RecordingReader {
    inner: MetadataCatalog,
    reads: Arc<Mutex<Vec<ClassName>>>,
}

impl MetadataReader for RecordingReader {
    fn read(&self, name: &ClassName) -> Result<ClassMetadata, MetadataError> {
        self.reads.lock().unwrap().push(name.clone());
        self.inner.read(name)
    }
}

#[test]
fn superclass_declarations_fold_into_the_child() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Child")
            .marked()
            .with_superclass("app::Middle")
            .with_factory_method(FactoryMethod::new("child_service")),
    );
    catalog.register(
        ClassMetadata::configuration("app::Middle")
            .with_superclass("app::Base")
            .with_factory_method(FactoryMethod::new("middle_service")),
    );
    catalog.register(
        ClassMetadata::configuration("app::Base")
            .with_factory_method(FactoryMethod::new("base_service")),
    );

    let outcome = parse(catalog, &["app::Child"]);

    // 超类不单独成节点，声明按链序折叠进子类。
    assert_eq!(names(&outcome), ["app::Child"]);
    let child = outcome.class(&ClassName::new("app::Child")).unwrap();
    let methods: Vec<_> = child
        .factory_methods()
        .iter()
        .map(|method| method.name.as_ref())
        .collect();
    assert_eq!(methods, ["child_service", "middle_service", "base_service"]);
}

#[test]
fn platform_superclasses_terminate_without_a_read() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Child")
            .marked()
            .with_superclass("std::marker::PhantomData"),
    );

    let reads = Arc::new(Mutex::new(Vec::new()));
    let reader = RecordingReader {
        inner: catalog,
        reads: reads.clone(),
    };
    let outcome = forge_assembly::AssemblyParser::builder(Arc::new(reader))
        .build()
        .parse([Candidate::of("app::Child")])
        .expect("parse should succeed");

    assert_eq!(names(&outcome), ["app::Child"]);
    assert!(reads
        .lock()
        .unwrap()
        .iter()
        .all(|name| !name.is_platform()));
}

#[test]
fn shared_superclasses_are_folded_only_once() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::First")
            .marked()
            .with_superclass("app::Base"),
    );
    catalog.register(
        ClassMetadata::configuration("app::Second")
            .marked()
            .with_superclass("app::Base"),
    );
    catalog.register(
        ClassMetadata::configuration("app::Base")
            .with_factory_method(FactoryMethod::new("base_service")),
    );

    let outcome = parse(catalog, &["app::First", "app::Second"]);

    let first = outcome.class(&ClassName::new("app::First")).unwrap();
    assert_eq!(first.factory_methods().len(), 1);
    // 已登记的超类不会被第二个子类重复折叠。
    let second = outcome.class(&ClassName::new("app::Second")).unwrap();
    assert!(second.factory_methods().is_empty());
}

#[test]
fn unreadable_superclass_is_fatal_for_included_classes() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Child")
            .marked()
            .with_superclass("app::Vanished"),
    );

    let error = builder(catalog)
        .build()
        .parse([Candidate::of("app::Child")])
        .unwrap_err();
    match error {
        AssemblyError::SuperclassUnreadable {
            class, superclass, ..
        } => {
            assert_eq!(class, ClassName::new("app::Child"));
            assert_eq!(superclass, ClassName::new("app::Vanished"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unreadable_superclass_is_tolerated_for_excluded_classes() {
    let mut catalog = MetadataCatalog::new();
    catalog.register(
        ClassMetadata::configuration("app::Child")
            .marked()
            .with_superclass("app::Vanished"),
    );

    let outcome = builder(catalog)
        .condition_evaluator(Arc::new(SkipListed::new(["app::Child"])))
        .build()
        .parse([Candidate::of("app::Child")])
        .expect("excluded class should tolerate the missing superclass");

    assert_eq!(names(&outcome), ["app::Child"]);
}
