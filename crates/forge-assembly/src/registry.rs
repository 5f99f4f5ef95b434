use alloc::{
    collections::BTreeMap,
    string::String,
    vec::Vec,
};
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::class::ClassName;

/// 一条组件定义：名称加上承载它的类。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub class: ClassName,
}

impl Definition {
    /// 构造定义。
    pub fn new(name: impl Into<String>, class: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
        }
    }
}

/// 注册定义时可能遇到的错误。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// 名称已被占用，禁止重复注册。
    Duplicate { name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Duplicate { name } => {
                write!(f, "definition `{name}` already registered")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RegistryError {}

/// 定义注册表契约，承接组件扫描与注册器贡献的副作用。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 解析器只负责发现，发现结果写入哪里由宿主决定；
///     以最小契约注入注册表，宿主可以对接任何后端。
/// - **契约 (What)**
///   - `register` 在名称冲突时返回结构化错误，调用链把它包装为硬失败；
///   - `definitions` 返回当前全部定义的快照，顺序必须稳定。
pub trait DefinitionRegistry: Send {
    /// 注册一条定义。
    fn register(&mut self, definition: Definition) -> Result<(), RegistryError>;

    /// 是否已存在同名定义。
    fn contains(&self, name: &str) -> bool;

    /// 全部定义的快照，按稳定顺序。
    fn definitions(&self) -> Vec<Definition>;
}

/// 以 `BTreeMap` 承载的内存注册表。
///
/// `BTreeMap` 保证快照顺序稳定，便于测试断言与文档输出；
/// 命名冲突在注册时即被捕获，避免后续阶段才暴露问题。
#[derive(Clone, Debug, Default)]
pub struct InMemoryDefinitionRegistry {
    entries: BTreeMap<String, Definition>,
}

impl InMemoryDefinitionRegistry {
    /// 创建空注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册表条目数。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 注册表是否为空。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DefinitionRegistry for InMemoryDefinitionRegistry {
    fn register(&mut self, definition: Definition) -> Result<(), RegistryError> {
        if self.entries.contains_key(&definition.name) {
            return Err(RegistryError::Duplicate {
                name: definition.name,
            });
        }
        self.entries.insert(definition.name.clone(), definition);
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn definitions(&self) -> Vec<Definition> {
        self.entries.values().cloned().collect()
    }
}
