use alloc::{
    collections::BTreeMap,
    string::String,
    sync::Arc,
    vec::Vec,
};
use core::fmt;

use crate::{
    class::ClassName,
    metadata::ClassMetadata,
    registry::{DefinitionRegistry, RegistryError},
};

/// 选择器的执行时机。
///
/// ## 契约定义（What）
/// - `Immediate`：在导入展开的当前位置立即计算并递归分发结果；
/// - `Deferred`：收集为延迟导入，等整个初始遍历完成后按 `order` 升序统一执行，
///   使其产出的导入能够观察到稳定、完整的既有配置视图。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorTiming {
    Immediate,
    Deferred { order: i32 },
}

/// 计算式导入贡献者。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 选择器根据导入方的元数据动态计算进一步的导入名单，
///     是配置闭包中唯一携带决策逻辑的扩展点。
/// - **契约 (What)**
///   - `timing` 返回执行时机，默认立即执行；
///   - `select_imports` 的输入是导入方（而非选择器自身）的元数据；
///   - 返回名单按给定顺序分发，实现方应保证结果可重放。
/// - **风险提示 (Trade-offs)**
///   - 选择器的结果不做环路预检，恶意返回导入方自身会在后续展开中被环路检测拦截。
pub trait ImportSelector: Send + Sync {
    /// 声明执行时机。
    fn timing(&self) -> SelectorTiming {
        SelectorTiming::Immediate
    }

    /// 依据导入方元数据计算进一步的导入名单。
    fn select_imports(&self, importer: &ClassMetadata) -> Vec<ClassName>;
}

/// 直接注册式导入贡献者。
///
/// 注册器不会被继续展开，解析器只记录句柄；解析完成后以导入方元数据为输入，
/// 把贡献的定义写入注入的注册表。
pub trait DefinitionRegistrar: Send + Sync {
    /// 向注册表贡献定义。
    fn register_definitions(
        &self,
        importer: &ClassMetadata,
        registry: &mut dyn DefinitionRegistry,
    ) -> Result<(), RegistryError>;
}

/// 共享的选择器句柄。
pub type SelectorHandle = Arc<dyn ImportSelector>;

/// 共享的注册器句柄。
pub type RegistrarHandle = Arc<dyn DefinitionRegistrar>;

/// 当前解析路径与导入归属表。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 环路检测需要“当前正在解析哪些类”的有序视图，归属查询需要
///     “谁导入了谁”的反向映射，两者共享同一生命周期，合并为一个结构。
/// - **设计要点 (How)**
///   - 路径使用显式 `Vec<ClassName>`，按类名相等判定成员资格；
///   - 归属表使用 `BTreeMap`，后写覆盖，记录最近一次导入方；
/// - **契约 (What)**
///   - 启用环路检测的展开点在重入时上报环路而非入栈；选择器名单的再分发
///     会重复压入导入方，这是预期内的路径形态；
///   - `Display` 以 `Foo->Bar->Baz` 形式呈现路径，用于诊断消息。
#[derive(Clone, Debug, Default)]
pub struct ImportStack {
    path: Vec<ClassName>,
    imports: BTreeMap<ClassName, ClassName>,
}

impl ImportStack {
    /// 创建空栈。
    pub fn new() -> Self {
        Self::default()
    }

    /// 将类名压入当前解析路径。
    pub fn push(&mut self, name: ClassName) {
        self.path.push(name);
    }

    /// 弹出路径顶部。
    pub fn pop(&mut self) -> Option<ClassName> {
        self.path.pop()
    }

    /// 按类名相等判断是否已在当前路径上。
    pub fn contains(&self, name: &ClassName) -> bool {
        self.path.iter().any(|entry| entry == name)
    }

    /// 当前路径顶部。
    pub fn top(&self) -> Option<&ClassName> {
        self.path.last()
    }

    /// 当前路径快照，自底向顶。
    pub fn chain(&self) -> &[ClassName] {
        &self.path
    }

    /// 登记一条导入归属：`imported` 由 `importer` 导入。
    pub fn register_import(&mut self, importer: &ClassName, imported: &ClassName) {
        self.imports.insert(imported.clone(), importer.clone());
    }

    /// 查询某个类最近一次的导入方。
    pub fn importer_of(&self, imported: &ClassName) -> Option<&ClassName> {
        self.imports.get(imported)
    }

    /// 拆出归属表，供解析结果对外暴露。
    pub fn into_attribution(self) -> BTreeMap<ClassName, ClassName> {
        self.imports
    }
}

impl fmt::Display for ImportStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ImportStack: [")?;
        let mut first = true;
        for entry in &self.path {
            if !first {
                f.write_str("->")?;
            }
            f.write_str(entry.simple_name())?;
            first = false;
        }
        f.write_str("]")
    }
}

/// 延迟导入持有者。
///
/// 将导入方的名称与元数据快照同延迟选择器配对，初始遍历结束后按
/// `order` 稳定排序并统一执行。相同 `order` 保持发现顺序。
#[derive(Clone)]
pub struct DeferredImport {
    pub importer: ClassName,
    pub metadata: ClassMetadata,
    pub selector: SelectorHandle,
    pub order: i32,
}

impl fmt::Debug for DeferredImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredImport")
            .field("importer", &self.importer)
            .field("order", &self.order)
            .finish()
    }
}

/// 诊断消息中使用的路径渲染，避免调用方手工拼接。
pub(crate) fn render_chain(chain: &[ClassName]) -> String {
    let mut rendered = String::from("[");
    for (index, entry) in chain.iter().enumerate() {
        if index > 0 {
            rendered.push_str("->");
        }
        rendered.push_str(entry.simple_name());
    }
    rendered.push(']');
    rendered
}
