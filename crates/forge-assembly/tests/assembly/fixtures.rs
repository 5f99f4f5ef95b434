//! 测试共用的元数据目录装配与协作方桩实现。

use std::sync::{Arc, Mutex};

use forge_assembly::{
    AssemblyOutcome, AssemblyParser, AssemblyParserBuilder, Candidate, ClassMetadata, ClassName,
    Definition, DefinitionRegistrar, DefinitionRegistry, ImportSelector, MetadataCatalog, Problem,
    ProblemReporter, RegistryError, SelectorTiming,
};

/// 以目录构造解析器构建器。
pub fn builder(catalog: MetadataCatalog) -> AssemblyParserBuilder {
    AssemblyParser::builder(Arc::new(catalog))
}

/// 以匿名候选解析并断言成功。
pub fn parse(catalog: MetadataCatalog, roots: &[&'static str]) -> AssemblyOutcome {
    parse_with(builder(catalog), roots)
}

/// 以给定构建器解析匿名候选并断言成功。
pub fn parse_with(builder: AssemblyParserBuilder, roots: &[&'static str]) -> AssemblyOutcome {
    builder
        .build()
        .parse(roots.iter().map(|root| Candidate::of(*root)))
        .expect("parse should succeed")
}

/// 结果集中的类名快照，保持解析完成顺序。
pub fn names(outcome: &AssemblyOutcome) -> Vec<&str> {
    outcome
        .configuration_classes
        .iter()
        .map(|class| class.name().as_str())
        .collect()
}

/// 返回固定名单的选择器桩。
pub struct StaticSelector {
    targets: Vec<&'static str>,
    timing: SelectorTiming,
}

impl StaticSelector {
    pub fn immediate(targets: &[&'static str]) -> Self {
        Self {
            targets: targets.to_vec(),
            timing: SelectorTiming::Immediate,
        }
    }

    pub fn deferred(order: i32, targets: &[&'static str]) -> Self {
        Self {
            targets: targets.to_vec(),
            timing: SelectorTiming::Deferred { order },
        }
    }
}

impl ImportSelector for StaticSelector {
    fn timing(&self) -> SelectorTiming {
        self.timing
    }

    fn select_imports(&self, _importer: &ClassMetadata) -> Vec<ClassName> {
        self.targets.iter().map(|name| ClassName::new(*name)).collect()
    }
}

/// 把每次执行记入共享日志的延迟选择器桩。
pub struct LoggingSelector {
    label: i32,
    order: i32,
    targets: Vec<&'static str>,
    log: Arc<Mutex<Vec<i32>>>,
}

impl LoggingSelector {
    pub fn new(label: i32, order: i32, targets: &[&'static str], log: Arc<Mutex<Vec<i32>>>) -> Self {
        Self {
            label,
            order,
            targets: targets.to_vec(),
            log,
        }
    }
}

impl ImportSelector for LoggingSelector {
    fn timing(&self) -> SelectorTiming {
        SelectorTiming::Deferred { order: self.order }
    }

    fn select_imports(&self, _importer: &ClassMetadata) -> Vec<ClassName> {
        self.log.lock().unwrap().push(self.label);
        self.targets.iter().map(|name| ClassName::new(*name)).collect()
    }
}

/// 贡献固定定义的注册器桩。
pub struct StaticRegistrar {
    definitions: Vec<(&'static str, &'static str)>,
}

impl StaticRegistrar {
    pub fn new(definitions: &[(&'static str, &'static str)]) -> Self {
        Self {
            definitions: definitions.to_vec(),
        }
    }
}

impl DefinitionRegistrar for StaticRegistrar {
    fn register_definitions(
        &self,
        _importer: &ClassMetadata,
        registry: &mut dyn DefinitionRegistry,
    ) -> Result<(), RegistryError> {
        for (name, class) in &self.definitions {
            registry.register(Definition::new(*name, *class))?;
        }
        Ok(())
    }
}

/// 写入共享缓冲的诊断观察者，供断言观察者回调与结果列表一致。
pub struct SharedReporter(pub Arc<Mutex<Vec<Problem>>>);

impl ProblemReporter for SharedReporter {
    fn report(&mut self, problem: Problem) {
        self.0.lock().unwrap().push(problem);
    }
}
