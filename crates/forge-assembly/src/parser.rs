use alloc::{
    boxed::Box,
    collections::{BTreeMap, BTreeSet},
    string::String,
    sync::Arc,
    vec::Vec,
};
use core::mem;

use crate::{
    class::{ClassName, ConfigurationClass},
    condition::{AlwaysInclude, ConditionEvaluator},
    environment::{Environment, MapEnvironment},
    error::AssemblyError,
    import::{DeferredImport, ImportStack, SelectorTiming},
    metadata::{ClassKind, ClassMetadata, MetadataError, MetadataReader},
    problem::{Problem, ProblemReporter},
    property::{
        MapPropertyLoader, PropertyLoader, PropertySource, PropertySourceChain,
        PropertySourceDecl,
    },
    registry::{Definition, DefinitionRegistry, InMemoryDefinitionRegistry},
    scan::ComponentScanner,
};

/// 一个起始解析候选：类名加可选的显式定义名。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub class: ClassName,
    pub bean_name: Option<String>,
}

impl Candidate {
    /// 匿名候选。
    pub fn of(class: impl Into<ClassName>) -> Self {
        Self {
            class: class.into(),
            bean_name: None,
        }
    }

    /// 携带显式定义名的候选。
    pub fn named(class: impl Into<ClassName>, bean_name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            bean_name: Some(bean_name.into()),
        }
    }
}

/// 一次解析的全部产出。
///
/// ## 契约定义（What）
/// - `configuration_classes`：闭包内全部配置类节点，按处理完成顺序排列，
///   同名节点至多出现一次；
/// - `property_sources`：装配期发现并加载的属性源链；
/// - `definitions`：组件扫描与注册器写入注册表的定义快照；
/// - `problems`：聚合的非致命诊断（环路、工厂方法重名）；
/// - `import_attribution`：被导入类到最近一次导入方的映射。
#[derive(Debug)]
pub struct AssemblyOutcome {
    pub configuration_classes: Vec<ConfigurationClass>,
    pub property_sources: PropertySourceChain,
    pub definitions: Vec<Definition>,
    pub problems: Vec<Problem>,
    pub import_attribution: BTreeMap<ClassName, ClassName>,
}

impl AssemblyOutcome {
    /// 按名称查找结果集中的配置类。
    pub fn class(&self, name: &ClassName) -> Option<&ConfigurationClass> {
        self.configuration_classes
            .iter()
            .find(|node| node.name() == name)
    }

    /// 结果集中是否包含指定配置类。
    pub fn contains_class(&self, name: &ClassName) -> bool {
        self.class(name).is_some()
    }
}

/// 配置类导入闭包解析器。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 给定一组起始候选配置类，求出经由直接导入、元注解携带导入、嵌套成员类、
///     组件扫描与延迟选择器可达的完整配置类闭包；环形导入链被上报为诊断而非
///     致命错误，互不相关的分支照常展开。
/// - **设计要点 (How)**
///   - 深度优先遍历，环路检测使用显式路径向量（按类名相等判定重入）；
///   - 每个类的直接导入与元注解携带的导入先收集为有序去重名单再统一分发；
///   - 延迟选择器在整个初始遍历结束后按声明优先级稳定排序统一执行，
///     使其产出的导入能观察到稳定、完整的既有配置视图；
///   - 超类链逐级迭代折叠，按名字建表防止重复处理，平台类型名处终止且不读取；
///   - 横切依赖（环境、属性加载器、条件评估、注册表、扫描器、诊断观察者）
///     全部经 [`AssemblyParserBuilder`] 显式注入。
/// - **契约 (What)**
///   - `parse` 消耗解析器本身：全部状态为单次解析私有，用后即弃，
///     不支持复用或并发调用；
///   - 元数据声明错误与非排除类的读取失败快速失败；被条件排除的类，
///     其导入候选与超类的读取失败被容忍。
pub struct AssemblyParser {
    reader: Arc<dyn MetadataReader>,
    environment: Arc<dyn Environment>,
    property_loader: Arc<dyn PropertyLoader>,
    evaluator: Arc<dyn ConditionEvaluator>,
    scanner: Option<Arc<dyn ComponentScanner>>,
    observer: Option<Box<dyn ProblemReporter>>,
    registry: Box<dyn DefinitionRegistry>,
    metadata_cache: BTreeMap<ClassName, ClassMetadata>,
    classes: BTreeMap<ClassName, Option<ConfigurationClass>>,
    order: Vec<ClassName>,
    known_superclasses: BTreeMap<ClassName, ClassName>,
    import_stack: ImportStack,
    deferred: Vec<DeferredImport>,
    property_chain: PropertySourceChain,
    problems: Vec<Problem>,
}

/// 再次遭遇已知节点时的处置。
enum Encounter {
    Fresh,
    Merge,
    Evict,
    Busy,
}

impl AssemblyParser {
    /// 以元数据读取器为起点创建构建器。
    pub fn builder(reader: Arc<dyn MetadataReader>) -> AssemblyParserBuilder {
        AssemblyParserBuilder::new(reader)
    }

    /// 解析给定候选集合，返回完整闭包。
    ///
    /// ## 执行步骤（How）
    /// 1. 逐个处理起始候选（深度优先展开其导入闭包）；
    /// 2. 按优先级稳定排序并执行全部延迟选择器，期间新出现的延迟选择器
    ///    按批次继续排空；
    /// 3. 校验各节点的工厂方法声明，重名产生诊断；
    /// 4. 将收集到的注册器贡献写入注册表。
    pub fn parse<I>(mut self, candidates: I) -> Result<AssemblyOutcome, AssemblyError>
    where
        I: IntoIterator<Item = Candidate>,
    {
        for candidate in candidates {
            let node = ConfigurationClass::candidate(candidate.class, candidate.bean_name);
            self.process_configuration_class(node)?;
        }
        self.process_deferred_imports()?;
        self.validate();
        self.apply_registrars()?;

        let definitions = self.registry.definitions();
        let Self {
            mut classes,
            order,
            import_stack,
            property_chain,
            problems,
            ..
        } = self;

        let mut configuration_classes = Vec::with_capacity(order.len());
        for name in &order {
            if let Some(Some(node)) = classes.remove(name) {
                configuration_classes.push(node);
            }
        }

        Ok(AssemblyOutcome {
            configuration_classes,
            property_sources: property_chain,
            definitions,
            problems,
            import_attribution: import_stack.into_attribution(),
        })
    }

    /// 处理一个配置类节点，含再遭遇处置与超类链折叠。
    ///
    /// ## 再遭遇规则（What）
    /// - 显式定义名遇到同名“被导入”节点：驱逐旧节点（连同其超类登记）并重新处理；
    /// - 被导入身份遇到已知节点：仅合并导入方集合，不重复处理；
    /// - 节点暂时被延迟导入流程借出时，视为已访问。
    fn process_configuration_class(
        &mut self,
        class: ConfigurationClass,
    ) -> Result<(), AssemblyError> {
        let encounter = match self.classes.get(class.name()) {
            None => Encounter::Fresh,
            Some(None) => Encounter::Busy,
            Some(Some(existing)) => {
                if class.bean_name().is_some() && existing.is_imported() {
                    Encounter::Evict
                } else {
                    Encounter::Merge
                }
            }
        };

        match encounter {
            Encounter::Busy => return Ok(()),
            Encounter::Merge => {
                if class.is_imported() {
                    let importers = class.imported_by().clone();
                    if let Some(Some(existing)) = self.classes.get_mut(class.name()) {
                        existing.merge_imported_by(importers);
                    }
                }
                return Ok(());
            }
            Encounter::Evict => self.evict(class.name().clone()),
            Encounter::Fresh => {}
        }

        let metadata = self.read_metadata(class.name()).map_err(|source| {
            AssemblyError::MetadataUnreadable {
                class: class.name().clone(),
                source,
            }
        })?;

        // 迭代折叠超类链：do_process 返回下一级超类的元数据，直到链终止。
        let mut node = class;
        let mut current = Some(metadata);
        while let Some(meta) = current {
            current = self.do_process(&mut node, &meta)?;
        }

        self.insert_class(node);
        Ok(())
    }

    /// 处理一层元数据，返回待继续折叠的超类元数据。
    fn do_process(
        &mut self,
        node: &mut ConfigurationClass,
        metadata: &ClassMetadata,
    ) -> Result<Option<ClassMetadata>, AssemblyError> {
        self.process_member_classes(node, metadata)?;

        for decl in &metadata.property_sources {
            self.process_property_source(node.name(), decl)?;
        }

        self.process_component_scans(node, metadata)?;

        let imports = self.collect_imports(metadata);
        if !imports.is_empty() {
            self.process_imports(node, metadata, &imports, true)?;
        }

        for location in &metadata.imported_resources {
            node.add_imported_resource(location.clone());
        }

        for method in &metadata.factory_methods {
            node.add_factory_method(method.clone());
        }

        if let Some(superclass) = &metadata.superclass {
            if !self.known_superclasses.contains_key(superclass) {
                self.known_superclasses
                    .insert(superclass.clone(), node.name().clone());
                // 平台基础类型处终止，且绝不经读取器加载。
                if superclass.is_platform() {
                    return Ok(None);
                }
                return match self.read_metadata(superclass) {
                    Ok(meta) => Ok(Some(meta)),
                    Err(source) => {
                        if self.evaluator.should_skip(metadata) {
                            // 所属类已被条件排除，超类读取失败被容忍。
                            Ok(None)
                        } else {
                            Err(AssemblyError::SuperclassUnreadable {
                                class: node.name().clone(),
                                superclass: superclass.clone(),
                                source,
                            })
                        }
                    }
                };
            }
        }

        Ok(None)
    }

    /// 将满足配置类判定的嵌套成员类并入闭包，归属记为包含类。
    fn process_member_classes(
        &mut self,
        node: &mut ConfigurationClass,
        metadata: &ClassMetadata,
    ) -> Result<(), AssemblyError> {
        for member in &metadata.member_classes {
            let member_meta = self.read_metadata(member).map_err(|source| {
                AssemblyError::MetadataUnreadable {
                    class: member.clone(),
                    source,
                }
            })?;
            if !member_meta.configuration_candidate() {
                continue;
            }
            if self.import_stack.contains(member) {
                let problem =
                    Problem::circular_import(member.clone(), self.import_stack.chain().to_vec());
                self.report(problem);
                continue;
            }
            self.import_stack.push(node.name().clone());
            let result = self.process_configuration_class(ConfigurationClass::imported(
                member.clone(),
                node.name().clone(),
            ));
            self.import_stack.pop();
            result?;
        }
        Ok(())
    }

    /// 执行组件扫描声明：注册命中候选，并递归解析其中的配置类。
    fn process_component_scans(
        &mut self,
        node: &mut ConfigurationClass,
        metadata: &ClassMetadata,
    ) -> Result<(), AssemblyError> {
        if metadata.component_scans.is_empty() || self.evaluator.should_skip(metadata) {
            return Ok(());
        }
        let Some(scanner) = self.scanner.clone() else {
            return Ok(());
        };
        for decl in &metadata.component_scans {
            for candidate in scanner.scan(decl) {
                // 已注册的名称视为先前扫描的产物，跳过以保证幂等。
                if self.registry.contains(&candidate.bean_name) {
                    continue;
                }
                self.registry
                    .register(Definition::new(
                        candidate.bean_name.clone(),
                        candidate.class.clone(),
                    ))
                    .map_err(|source| AssemblyError::DefinitionConflict {
                        class: node.name().clone(),
                        source,
                    })?;
                let meta = self.read_metadata(&candidate.class).map_err(|source| {
                    AssemblyError::MetadataUnreadable {
                        class: candidate.class.clone(),
                        source,
                    }
                })?;
                if meta.configuration_candidate() {
                    self.process_configuration_class(ConfigurationClass::candidate(
                        candidate.class,
                        Some(candidate.bean_name),
                    ))?;
                }
            }
        }
        Ok(())
    }

    /// 收集一个类的全部导入声明：直接导入加上元注解携带的导入。
    ///
    /// 结果有序且去重；访问表防止元注解被重复展开。
    /// 注解元数据读取失败按尽力而为处理，静默跳过。
    fn collect_imports(&mut self, metadata: &ClassMetadata) -> Vec<ClassName> {
        let mut imports = Vec::new();
        let mut seen = BTreeSet::new();
        let mut visited = BTreeSet::new();
        self.collect_imports_into(metadata, &mut imports, &mut seen, &mut visited);
        imports
    }

    fn collect_imports_into(
        &mut self,
        metadata: &ClassMetadata,
        imports: &mut Vec<ClassName>,
        seen: &mut BTreeSet<ClassName>,
        visited: &mut BTreeSet<ClassName>,
    ) {
        if !visited.insert(metadata.name.clone()) {
            return;
        }
        for annotation in &metadata.annotations {
            if annotation.is_platform() || visited.contains(annotation) {
                continue;
            }
            if let Ok(meta) = self.read_metadata(annotation) {
                self.collect_imports_into(&meta, imports, seen, visited);
            }
        }
        for import in &metadata.imports {
            if seen.insert(import.clone()) {
                imports.push(import.clone());
            }
        }
    }

    /// 分发一组导入候选。
    ///
    /// ## 环路语义（What）
    /// - `check_circular` 为真且导入方已在当前路径上时，上报一条环路诊断并
    ///   截断该分支，其余候选与分支不受影响；
    /// - 选择器产出的名单以 `check_circular = false` 再分发，重入交由更深层的
    ///   展开点检测。
    fn process_imports(
        &mut self,
        node: &mut ConfigurationClass,
        importer_meta: &ClassMetadata,
        candidates: &[ClassName],
        check_circular: bool,
    ) -> Result<(), AssemblyError> {
        if check_circular && self.import_stack.contains(node.name()) {
            let problem =
                Problem::circular_import(node.name().clone(), self.import_stack.chain().to_vec());
            self.report(problem);
            return Ok(());
        }

        self.import_stack.push(node.name().clone());
        let mut result = Ok(());
        for candidate in candidates {
            if let Err(error) = self.process_import_candidate(node, importer_meta, candidate) {
                result = Err(error);
                break;
            }
        }
        self.import_stack.pop();
        result
    }

    /// 按能力分类处理单个导入候选。
    fn process_import_candidate(
        &mut self,
        node: &mut ConfigurationClass,
        importer_meta: &ClassMetadata,
        candidate: &ClassName,
    ) -> Result<(), AssemblyError> {
        let meta = match self.read_metadata(candidate) {
            Ok(meta) => meta,
            Err(source) => {
                if self.evaluator.should_skip(importer_meta) {
                    // 导入方已被条件排除，候选读取失败被容忍。
                    return Ok(());
                }
                return Err(AssemblyError::MetadataUnreadable {
                    class: candidate.clone(),
                    source,
                });
            }
        };

        match &meta.kind {
            ClassKind::Selector(handle) => {
                if self.evaluator.should_skip(importer_meta) {
                    return Ok(());
                }
                match handle.timing() {
                    SelectorTiming::Deferred { order } => {
                        self.deferred.push(DeferredImport {
                            importer: node.name().clone(),
                            metadata: importer_meta.clone(),
                            selector: handle.clone(),
                            order,
                        });
                    }
                    SelectorTiming::Immediate => {
                        let names = handle.select_imports(importer_meta);
                        if !names.is_empty() {
                            self.process_imports(node, importer_meta, &names, false)?;
                        }
                    }
                }
            }
            ClassKind::Registrar(handle) => {
                if !self.evaluator.should_skip(importer_meta) {
                    node.add_registrar(handle.clone());
                }
            }
            ClassKind::Configuration => {
                self.import_stack.register_import(node.name(), candidate);
                self.process_configuration_class(ConfigurationClass::imported(
                    candidate.clone(),
                    node.name().clone(),
                ))?;
            }
        }
        Ok(())
    }

    /// 排空延迟导入：按声明优先级稳定排序，逐个执行。
    ///
    /// 执行期间新登记的延迟导入进入下一批次继续排空，直至列表为空。
    fn process_deferred_imports(&mut self) -> Result<(), AssemblyError> {
        loop {
            let mut batch = mem::take(&mut self.deferred);
            if batch.is_empty() {
                return Ok(());
            }
            batch.sort_by_key(|holder| holder.order);
            for holder in batch {
                let names = holder.selector.select_imports(&holder.metadata);
                if names.is_empty() {
                    continue;
                }
                let mut node = self.take_class(&holder.importer).unwrap_or_else(|| {
                    ConfigurationClass::candidate(holder.importer.clone(), None)
                });
                let result = self.process_imports(&mut node, &holder.metadata, &names, false);
                self.restore_class(node);
                result?;
            }
        }
    }

    /// 校验全部节点的工厂方法声明，重名产生诊断。
    fn validate(&mut self) {
        let mut found = Vec::new();
        for name in &self.order {
            let Some(Some(node)) = self.classes.get(name) else {
                continue;
            };
            let mut seen = BTreeSet::new();
            for method in node.factory_methods() {
                if !seen.insert(method.name.clone()) {
                    found.push(Problem::duplicate_factory_method(
                        node.name().clone(),
                        method.name.clone(),
                    ));
                }
            }
        }
        for problem in found {
            self.report(problem);
        }
    }

    /// 将各节点收集的注册器贡献写入注册表。
    fn apply_registrars(&mut self) -> Result<(), AssemblyError> {
        let targets: Vec<_> = self
            .order
            .iter()
            .filter_map(|name| self.classes.get(name).and_then(|slot| slot.as_ref()))
            .filter(|node| !node.registrars().is_empty())
            .map(|node| (node.name().clone(), node.registrars().to_vec()))
            .collect();

        for (name, registrars) in targets {
            let metadata = self.read_metadata(&name).map_err(|source| {
                AssemblyError::MetadataUnreadable {
                    class: name.clone(),
                    source,
                }
            })?;
            for registrar in registrars {
                registrar
                    .register_definitions(&metadata, self.registry.as_mut())
                    .map_err(|source| AssemblyError::DefinitionConflict {
                        class: name.clone(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// 处理一条属性源声明：校验、占位符求值、加载并入链。
    fn process_property_source(
        &mut self,
        owner: &ClassName,
        decl: &PropertySourceDecl,
    ) -> Result<(), AssemblyError> {
        if decl.locations.is_empty() {
            return Err(AssemblyError::PropertySourceInvalid {
                class: owner.clone(),
                detail: String::from("at least one location is required"),
            });
        }

        let mut resolved = Vec::with_capacity(decl.locations.len());
        for location in &decl.locations {
            let value = self
                .environment
                .resolve_required_placeholders(location)
                .map_err(|source| AssemblyError::Placeholder {
                    class: owner.clone(),
                    location: location.clone(),
                    source,
                })?;
            resolved.push(value);
        }

        match &decl.name {
            None => {
                for location in resolved {
                    let entries = self.load_location(owner, &location)?;
                    self.property_chain
                        .push(PropertySource::named(location, entries));
                }
            }
            Some(name) if resolved.len() == 1 => {
                let location = resolved.into_iter().next().unwrap_or_default();
                let entries = self.load_location(owner, &location)?;
                self.property_chain
                    .push(PropertySource::named(name.clone(), entries));
            }
            Some(name) => {
                let mut constituents = Vec::with_capacity(resolved.len());
                for location in resolved {
                    let entries = self.load_location(owner, &location)?;
                    constituents.push(PropertySource::named(location, entries));
                }
                self.property_chain
                    .push(PropertySource::composite(name.clone(), constituents));
            }
        }
        Ok(())
    }

    fn load_location(
        &mut self,
        owner: &ClassName,
        location: &str,
    ) -> Result<BTreeMap<String, String>, AssemblyError> {
        self.property_loader
            .load(location)
            .map_err(|source| AssemblyError::PropertyLoad {
                class: owner.clone(),
                location: String::from(location),
                source,
            })
    }

    fn read_metadata(&mut self, name: &ClassName) -> Result<ClassMetadata, MetadataError> {
        if let Some(meta) = self.metadata_cache.get(name) {
            return Ok(meta.clone());
        }
        let meta = self.reader.read(name)?;
        self.metadata_cache.insert(name.clone(), meta.clone());
        Ok(meta)
    }

    fn report(&mut self, problem: Problem) {
        if let Some(observer) = self.observer.as_mut() {
            observer.report(problem.clone());
        }
        self.problems.push(problem);
    }

    /// 将处理完成的节点并入结果集。
    ///
    /// 同名节点已存在时保留先完成者，仅合并导入方集合；这覆盖了
    /// 环路分支先行注册同名节点的少见情形。
    fn insert_class(&mut self, node: ConfigurationClass) {
        let name = node.name().clone();
        if let Some(Some(existing)) = self.classes.get_mut(&name) {
            existing.merge_imported_by(node.imported_by().clone());
            return;
        }
        if !self.classes.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.classes.insert(name, Some(node));
    }

    fn take_class(&mut self, name: &ClassName) -> Option<ConfigurationClass> {
        self.classes.get_mut(name).and_then(Option::take)
    }

    fn restore_class(&mut self, node: ConfigurationClass) {
        match self.classes.get_mut(node.name()) {
            Some(slot) => *slot = Some(node),
            None => self.insert_class(node),
        }
    }

    fn evict(&mut self, name: ClassName) {
        self.classes.remove(&name);
        self.order.retain(|entry| entry != &name);
        self.known_superclasses.retain(|_, owner| owner != &name);
    }
}

/// 解析器构建器，显式注入全部横切协作方。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 解析器依赖的协作方较多，构建器给出带合理默认值的装配入口：
///     空环境、空属性加载器、从不排除的条件评估、内存注册表；
///     扫描器与诊断观察者默认缺省。
/// - **契约 (What)**
///   - `build` 产出的解析器只供单次 `parse` 使用；
///   - 注入的读取器与协作方须满足线程安全约束（`Send + Sync`），
///     以便宿主在装配线程之外构造它们。
pub struct AssemblyParserBuilder {
    reader: Arc<dyn MetadataReader>,
    environment: Arc<dyn Environment>,
    property_loader: Arc<dyn PropertyLoader>,
    evaluator: Arc<dyn ConditionEvaluator>,
    scanner: Option<Arc<dyn ComponentScanner>>,
    observer: Option<Box<dyn ProblemReporter>>,
    registry: Box<dyn DefinitionRegistry>,
}

impl AssemblyParserBuilder {
    fn new(reader: Arc<dyn MetadataReader>) -> Self {
        Self {
            reader,
            environment: Arc::new(MapEnvironment::new()),
            property_loader: Arc::new(MapPropertyLoader::new()),
            evaluator: Arc::new(AlwaysInclude),
            scanner: None,
            observer: None,
            registry: Box::new(InMemoryDefinitionRegistry::new()),
        }
    }

    /// 注入环境实现。
    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    /// 注入属性加载器。
    pub fn property_loader(mut self, loader: Arc<dyn PropertyLoader>) -> Self {
        self.property_loader = loader;
        self
    }

    /// 注入条件评估器。
    pub fn condition_evaluator(mut self, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// 注入组件扫描器。
    pub fn component_scanner(mut self, scanner: Arc<dyn ComponentScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// 注入诊断观察者；无论是否注入，解析结果都会携带完整诊断列表。
    pub fn problem_observer(mut self, observer: Box<dyn ProblemReporter>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// 注入定义注册表后端。
    pub fn registry(mut self, registry: Box<dyn DefinitionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// 完成装配。
    pub fn build(self) -> AssemblyParser {
        AssemblyParser {
            reader: self.reader,
            environment: self.environment,
            property_loader: self.property_loader,
            evaluator: self.evaluator,
            scanner: self.scanner,
            observer: self.observer,
            registry: self.registry,
            metadata_cache: BTreeMap::new(),
            classes: BTreeMap::new(),
            order: Vec::new(),
            known_superclasses: BTreeMap::new(),
            import_stack: ImportStack::new(),
            deferred: Vec::new(),
            property_chain: PropertySourceChain::new(),
            problems: Vec::new(),
        }
    }
}
