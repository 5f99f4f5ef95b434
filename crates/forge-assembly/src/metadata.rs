use alloc::{
    collections::BTreeMap,
    string::String,
    vec::Vec,
};
use core::fmt;

use crate::{
    class::{ClassName, FactoryMethod},
    import::{RegistrarHandle, SelectorHandle},
    property::PropertySourceDecl,
    scan::ComponentScanDecl,
};

/// 导入候选的能力分类。
///
/// ## 设计目的（Why）
/// - 导入语义按能力分为三种：计算进一步导入名单的选择器、直接贡献定义的注册器、
///   以及被递归解析的普通配置类。以带标签的枚举建模，消除运行期类型探测。
///
/// ## 契约定义（What）
/// - `Configuration`：普通配置类，解析器会递归展开；
/// - `Selector`：携带选择器句柄，由解析器按其时机（立即或延迟）调用；
/// - `Registrar`：携带注册器句柄，记录在导入方节点上，本身不再被继续展开。
#[derive(Clone)]
pub enum ClassKind {
    Configuration,
    Selector(SelectorHandle),
    Registrar(RegistrarHandle),
}

impl fmt::Debug for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Configuration => f.write_str("ClassKind::Configuration"),
            ClassKind::Selector(_) => f.write_str("ClassKind::Selector"),
            ClassKind::Registrar(_) => f.write_str("ClassKind::Registrar"),
        }
    }
}

/// 单个类的注解元数据视图。
///
/// ## 设计目的（Why）
/// - 解析器不做任何反射或类加载，所有“注解”信息以纯数据形式经
///   [`MetadataReader`] 提供，由宿主在启动前装配完成。
/// - 字段覆盖解析算法需要的全部输入：直接导入、元注解携带的导入、
///   嵌套成员类、属性源与组件扫描声明、工厂方法以及超类链。
///
/// ## 契约定义（What）
/// - `annotations` 列出类上的注解类型名；注解类型本身也是可读取元数据的类，
///   其 `imports` 会在导入收集阶段被递归合并；
/// - `superclass` 为 `None` 表示链到此为止；平台类型名不会被读取；
/// - 所有序列字段保持声明顺序，解析器依赖该顺序产生确定性结果。
#[derive(Clone, Debug)]
pub struct ClassMetadata {
    pub name: ClassName,
    pub kind: ClassKind,
    pub marked_configuration: bool,
    pub superclass: Option<ClassName>,
    pub member_classes: Vec<ClassName>,
    pub imports: Vec<ClassName>,
    pub annotations: Vec<ClassName>,
    pub property_sources: Vec<PropertySourceDecl>,
    pub component_scans: Vec<ComponentScanDecl>,
    pub imported_resources: Vec<String>,
    pub factory_methods: Vec<FactoryMethod>,
}

impl ClassMetadata {
    /// 构造一个普通配置类的空白元数据。
    pub fn configuration(name: impl Into<ClassName>) -> Self {
        Self::with_kind(name, ClassKind::Configuration)
    }

    /// 构造一个选择器类的元数据。
    pub fn selector(name: impl Into<ClassName>, handle: SelectorHandle) -> Self {
        Self::with_kind(name, ClassKind::Selector(handle))
    }

    /// 构造一个注册器类的元数据。
    pub fn registrar(name: impl Into<ClassName>, handle: RegistrarHandle) -> Self {
        Self::with_kind(name, ClassKind::Registrar(handle))
    }

    fn with_kind(name: impl Into<ClassName>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            marked_configuration: false,
            superclass: None,
            member_classes: Vec::new(),
            imports: Vec::new(),
            annotations: Vec::new(),
            property_sources: Vec::new(),
            component_scans: Vec::new(),
            imported_resources: Vec::new(),
            factory_methods: Vec::new(),
        }
    }

    /// 标记该类显式声明为配置类。
    pub fn marked(mut self) -> Self {
        self.marked_configuration = true;
        self
    }

    /// 设置超类名。
    pub fn with_superclass(mut self, superclass: impl Into<ClassName>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// 追加一个嵌套成员类。
    pub fn with_member_class(mut self, member: impl Into<ClassName>) -> Self {
        self.member_classes.push(member.into());
        self
    }

    /// 追加一条直接导入声明。
    pub fn with_import(mut self, import: impl Into<ClassName>) -> Self {
        self.imports.push(import.into());
        self
    }

    /// 追加一个注解类型名，注解自身的导入会在收集阶段被递归展开。
    pub fn with_annotation(mut self, annotation: impl Into<ClassName>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// 追加一条属性源声明。
    pub fn with_property_source(mut self, decl: PropertySourceDecl) -> Self {
        self.property_sources.push(decl);
        self
    }

    /// 追加一条组件扫描声明。
    pub fn with_component_scan(mut self, decl: ComponentScanDecl) -> Self {
        self.component_scans.push(decl);
        self
    }

    /// 追加一条外部资源导入声明。
    pub fn with_imported_resource(mut self, location: impl Into<String>) -> Self {
        self.imported_resources.push(location.into());
        self
    }

    /// 追加一个工厂方法声明。
    pub fn with_factory_method(mut self, method: FactoryMethod) -> Self {
        self.factory_methods.push(method);
        self
    }

    /// 判断该类是否值得作为配置类处理。
    ///
    /// 嵌套成员类与组件扫描结果只有满足该判定才会被递归解析，
    /// 避免把普通组件类卷入配置闭包。
    pub fn configuration_candidate(&self) -> bool {
        if !matches!(self.kind, ClassKind::Configuration) {
            return false;
        }
        self.marked_configuration
            || !self.factory_methods.is_empty()
            || !self.imports.is_empty()
            || !self.component_scans.is_empty()
    }
}

/// 读取类元数据时的失败形态。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataError {
    /// 名称未注册或资源不存在。
    NotFound { class: ClassName },
    /// 底层读取失败，`detail` 描述原因。
    Unreadable { class: ClassName, detail: String },
}

impl MetadataError {
    /// 失败涉及的类名。
    pub fn class(&self) -> &ClassName {
        match self {
            MetadataError::NotFound { class } | MetadataError::Unreadable { class, .. } => class,
        }
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::NotFound { class } => {
                write!(f, "metadata for `{class}` is not available")
            }
            MetadataError::Unreadable { class, detail } => {
                write!(f, "metadata for `{class}` could not be read: {detail}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MetadataError {}

/// 元数据读取协作方。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 解析器与元数据来源解耦：宿主可以从编译期生成的目录、外部描述文件或
///     任何别的来源实现该契约，而解析算法保持不变。
/// - **契约 (What)**
///   - 同一名称的多次读取应返回一致结果；解析器会对成功结果做实例内缓存；
///   - 平台基础类型名不会出现在 `read` 的调用参数中；
///   - 读取失败通过 [`MetadataError`] 表达，解析器按调用点语义决定容忍或传播。
pub trait MetadataReader: Send + Sync {
    /// 读取指定类名的注解元数据。
    fn read(&self, name: &ClassName) -> Result<ClassMetadata, MetadataError>;
}

/// 以 `BTreeMap` 承载的内存元数据目录。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 为宿主与测试提供开箱即用的 [`MetadataReader`] 实现：启动阶段把全部
///     配置类的元数据登记进目录，解析阶段只做只读查询。
/// - **设计要点 (How)**
///   - `BTreeMap` 保证遍历顺序稳定，组件扫描等基于目录枚举的能力因此可确定重放；
///   - 重复登记同名元数据采用“后登记覆盖”，便于宿主在分层装配时覆写默认项。
/// - **风险提示 (Trade-offs)**
///   - 目录不做惰性加载，超大应用应考虑实现按需读取的 `MetadataReader`。
#[derive(Clone, Debug, Default)]
pub struct MetadataCatalog {
    entries: BTreeMap<ClassName, ClassMetadata>,
}

impl MetadataCatalog {
    /// 创建空目录。
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一条元数据，同名条目被覆盖。
    pub fn register(&mut self, metadata: ClassMetadata) {
        self.entries.insert(metadata.name.clone(), metadata);
    }

    /// 目录中登记的全部类名，按名称升序。
    pub fn names(&self) -> impl Iterator<Item = &ClassName> {
        self.entries.keys()
    }

    /// 查询单条元数据。
    pub fn get(&self, name: &ClassName) -> Option<&ClassMetadata> {
        self.entries.get(name)
    }

    /// 目录条目数。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 目录是否为空。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataReader for MetadataCatalog {
    fn read(&self, name: &ClassName) -> Result<ClassMetadata, MetadataError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound {
                class: name.clone(),
            })
    }
}
