use alloc::{
    borrow::Cow,
    collections::BTreeSet,
    string::String,
    vec::Vec,
};
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::import::RegistrarHandle;

/// 平台基础类型的名称前缀。
///
/// 装配解析只面向应用侧的配置类，超类链一旦走到平台类型即终止，
/// 绝不通过元数据读取器加载这些名字。
pub const PLATFORM_PREFIXES: &[&str] = &["std::", "core::", "alloc::"];

/// 配置类的稳定标识符。
///
/// ## 设计目的（Why）
/// - 解析过程中的访问表、导入归属表与环路检测全部以“类名相等”为判定依据，
///   因此需要一个可排序、可哈希且零拷贝友好的名称类型。
/// - 采用 `Cow<'static, str>` 允许常量与动态注册并存，兼顾性能与灵活性。
///
/// ## 契约定义（What）
/// - 名称使用 `::` 作为路径分隔符，例如 `app::config::RootAssembly`；
/// - 比较、排序与哈希均基于完整字符串，不做大小写折叠；
/// - 以 `std::`、`core::` 或 `alloc::` 开头的名称视为平台基础类型。
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassName(Cow<'static, str>);

impl ClassName {
    /// 构造类名，接受静态或动态字符串。
    pub fn new<N>(name: N) -> Self
    where
        N: Into<Cow<'static, str>>,
    {
        Self(name.into())
    }

    /// 返回完整名称。
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 返回最后一个路径段，用于日志与诊断信息的紧凑呈现。
    pub fn simple_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }

    /// 判断名称是否属于平台基础类型。
    ///
    /// ## 契约（What）
    /// - 返回 `true` 时调用方不得再通过 [`MetadataReader`](crate::metadata::MetadataReader)
    ///   读取该名称，超类链在此终止。
    pub fn is_platform(&self) -> bool {
        PLATFORM_PREFIXES
            .iter()
            .any(|prefix| self.0.starts_with(prefix))
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ClassName {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// 配置类声明的工厂方法描述。
///
/// ## 设计目的（Why）
/// - 配置类通过工厂方法声明组件的组装方式，解析阶段只登记描述，不执行任何构造逻辑。
/// - 超类链上的声明会折叠进同一个配置类节点，便于后续校验重名。
///
/// ## 契约定义（What）
/// - `name`：方法名，在同一配置类内应当唯一，重名会在校验阶段产生诊断；
/// - `product`：可选的产物类型名，供注册阶段与文档输出使用。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryMethod {
    pub name: Cow<'static, str>,
    pub product: Option<ClassName>,
}

impl FactoryMethod {
    /// 构造仅含方法名的描述。
    pub fn new<N>(name: N) -> Self
    where
        N: Into<Cow<'static, str>>,
    {
        Self {
            name: name.into(),
            product: None,
        }
    }

    /// 附带产物类型名。
    pub fn with_product(mut self, product: impl Into<ClassName>) -> Self {
        self.product = Some(product.into());
        self
    }
}

/// 导入闭包中的一个配置类节点。
///
/// ## 设计目的（Why）
/// - 解析一个候选配置类可能展开为任意多个节点（配置类之间可以相互导入），
///   每个节点聚合自身与超类链上折叠下来的全部声明。
/// - `imported_by` 记录反向归属：一个类可以被多个类同时导入，合并而非覆盖。
///
/// ## 契约定义（What）
/// - `bean_name` 仅在候选来源于显式定义时存在；显式定义会取代同名的被导入节点；
/// - 节点相等性由类名决定，解析器保证同名节点在结果集中至多出现一次；
/// - 注册器句柄由导入语义收集，解析完成后统一施加到定义注册表。
#[derive(Clone)]
pub struct ConfigurationClass {
    name: ClassName,
    bean_name: Option<String>,
    imported_by: BTreeSet<ClassName>,
    factory_methods: Vec<FactoryMethod>,
    imported_resources: Vec<String>,
    registrars: Vec<RegistrarHandle>,
}

impl ConfigurationClass {
    /// 以显式候选身份构造节点，`bean_name` 来自起始定义。
    pub fn candidate(name: impl Into<ClassName>, bean_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            bean_name,
            imported_by: BTreeSet::new(),
            factory_methods: Vec::new(),
            imported_resources: Vec::new(),
            registrars: Vec::new(),
        }
    }

    /// 以被导入身份构造节点，记录首个导入方。
    pub fn imported(name: impl Into<ClassName>, importer: ClassName) -> Self {
        let mut imported_by = BTreeSet::new();
        imported_by.insert(importer);
        Self {
            name: name.into(),
            bean_name: None,
            imported_by,
            factory_methods: Vec::new(),
            imported_resources: Vec::new(),
            registrars: Vec::new(),
        }
    }

    /// 节点的类名。
    #[inline]
    pub fn name(&self) -> &ClassName {
        &self.name
    }

    /// 显式定义名，仅候选来源于显式注册时存在。
    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }

    /// 是否为被导入节点（不存在显式定义名且至少有一个导入方）。
    pub fn is_imported(&self) -> bool {
        self.bean_name.is_none() && !self.imported_by.is_empty()
    }

    /// 导入方集合。
    pub fn imported_by(&self) -> &BTreeSet<ClassName> {
        &self.imported_by
    }

    /// 合并另一次遭遇记录下的导入方。
    pub fn merge_imported_by(&mut self, importers: BTreeSet<ClassName>) {
        self.imported_by.extend(importers);
    }

    /// 登记一个工厂方法声明，超类折叠时按出现顺序追加。
    pub fn add_factory_method(&mut self, method: FactoryMethod) {
        self.factory_methods.push(method);
    }

    /// 已登记的工厂方法，顺序与声明一致。
    pub fn factory_methods(&self) -> &[FactoryMethod] {
        &self.factory_methods
    }

    /// 登记一条外部资源导入声明，内容按原样保留。
    pub fn add_imported_resource(&mut self, location: impl Into<String>) {
        self.imported_resources.push(location.into());
    }

    /// 外部资源导入声明。
    pub fn imported_resources(&self) -> &[String] {
        &self.imported_resources
    }

    /// 记录由导入语义贡献的注册器句柄。
    pub fn add_registrar(&mut self, registrar: RegistrarHandle) {
        self.registrars.push(registrar);
    }

    /// 该节点收集到的注册器句柄。
    pub fn registrars(&self) -> &[RegistrarHandle] {
        &self.registrars
    }
}

impl fmt::Debug for ConfigurationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationClass")
            .field("name", &self.name)
            .field("bean_name", &self.bean_name)
            .field("imported_by", &self.imported_by)
            .field("factory_methods", &self.factory_methods)
            .field("imported_resources", &self.imported_resources)
            .field("registrars", &self.registrars.len())
            .finish()
    }
}
