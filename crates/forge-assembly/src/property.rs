use alloc::{
    collections::BTreeMap,
    string::String,
    vec::Vec,
};
use core::fmt;

use serde::{Deserialize, Serialize};

/// 属性源声明，对应配置类上的一条注解。
///
/// ## 契约定义（What）
/// - `locations` 至少包含一个位置，否则属于声明错误，解析时快速失败；
/// - `name` 为逻辑名：命名声明在多位置时会合并为复合源，
///   不同声明共享同一逻辑名时在链上就地合并；
/// - 位置字符串允许携带 `${key}` 占位符，解析时经环境求值。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySourceDecl {
    pub name: Option<String>,
    pub locations: Vec<String>,
}

impl PropertySourceDecl {
    /// 匿名声明，每个位置各自成为一个源。
    pub fn anonymous<I, L>(locations: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            name: None,
            locations: locations.into_iter().map(Into::into).collect(),
        }
    }

    /// 命名声明，多位置时合并为复合源。
    pub fn named<N, I, L>(name: N, locations: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            name: Some(name.into()),
            locations: locations.into_iter().map(Into::into).collect(),
        }
    }
}

/// 已加载的属性源。
///
/// ## 设计目的（Why）
/// - 单一来源与复合来源共享同一查找接口，链上的合并逻辑不关心内部形态。
///
/// ## 契约定义（What）
/// - `Named`：一个逻辑名加一组键值对，键查找为精确匹配；
/// - `Composite`：同一逻辑名下的多个成员，查找按成员顺序首个命中生效，
///   成员顺序由合并规则决定（较新的声明排在前面）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertySource {
    Named {
        name: String,
        entries: BTreeMap<String, String>,
    },
    Composite {
        name: String,
        constituents: Vec<PropertySource>,
    },
}

impl PropertySource {
    /// 构造单一来源。
    pub fn named(name: impl Into<String>, entries: BTreeMap<String, String>) -> Self {
        PropertySource::Named {
            name: name.into(),
            entries,
        }
    }

    /// 构造复合来源，成员按给定顺序参与查找。
    pub fn composite(name: impl Into<String>, constituents: Vec<PropertySource>) -> Self {
        PropertySource::Composite {
            name: name.into(),
            constituents,
        }
    }

    /// 来源的逻辑名。
    pub fn name(&self) -> &str {
        match self {
            PropertySource::Named { name, .. } | PropertySource::Composite { name, .. } => name,
        }
    }

    /// 查找键值；复合来源按成员顺序返回首个命中。
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            PropertySource::Named { entries, .. } => entries.get(key).map(String::as_str),
            PropertySource::Composite { constituents, .. } => {
                constituents.iter().find_map(|source| source.get(key))
            }
        }
    }
}

/// 属性源链，装配期发现的来源按声明顺序入栈。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 多个配置类可以各自声明属性源，查找语义必须全局一致：
///     后声明者优先，同一逻辑名合并为一个复合视图。
/// - **设计要点 (How)**
///   - 入栈时若链上已存在同名来源，则就地替换为复合来源，新成员排在最前，
///     链上的位置保持不变；这样既保留首次声明的相对次序，
///     又让较新的声明在键冲突时获胜。
///   - 查找自顶向底遍历（后声明的来源先被询问）。
/// - **契约 (What)**
///   - `get` 返回首个命中的值；未命中返回 `None`；
///   - `sources` 暴露只读快照，顺序即链序（自底向顶）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertySourceChain {
    sources: Vec<PropertySource>,
}

impl PropertySourceChain {
    /// 创建空链。
    pub fn new() -> Self {
        Self::default()
    }

    /// 入栈一个来源；同逻辑名时就地合并为复合来源，新成员优先。
    pub fn push(&mut self, source: PropertySource) {
        if let Some(position) = self
            .sources
            .iter()
            .position(|existing| existing.name() == source.name())
        {
            let existing = self.sources.remove(position);
            let name = String::from(existing.name());
            let mut constituents = Vec::new();
            match source {
                PropertySource::Composite {
                    constituents: newer,
                    ..
                } => constituents.extend(newer),
                newer => constituents.push(newer),
            }
            match existing {
                PropertySource::Composite {
                    constituents: older,
                    ..
                } => constituents.extend(older),
                older => constituents.push(older),
            }
            self.sources
                .insert(position, PropertySource::composite(name, constituents));
        } else {
            self.sources.push(source);
        }
    }

    /// 自顶向底查找键值，后声明的来源优先。
    pub fn get(&self, key: &str) -> Option<&str> {
        self.sources.iter().rev().find_map(|source| source.get(key))
    }

    /// 链上来源的只读视图，自底向顶。
    pub fn sources(&self) -> &[PropertySource] {
        &self.sources
    }

    /// 链上是否存在指定逻辑名的来源。
    pub fn contains(&self, name: &str) -> bool {
        self.sources.iter().any(|source| source.name() == name)
    }

    /// 链上来源数量。
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// 链是否为空。
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// 加载属性位置时的失败形态。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyLoadError {
    /// 位置不存在。
    Missing { location: String },
    /// 读取失败。
    Io { location: String, detail: String },
    /// 内容格式非法，`line` 为出错行号（从 1 起）。
    Malformed { location: String, line: usize },
}

impl fmt::Display for PropertyLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyLoadError::Missing { location } => {
                write!(f, "property location `{location}` does not exist")
            }
            PropertyLoadError::Io { location, detail } => {
                write!(f, "failed to read property location `{location}`: {detail}")
            }
            PropertyLoadError::Malformed { location, line } => {
                write!(
                    f,
                    "property location `{location}` is malformed at line {line}"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PropertyLoadError {}

/// 属性位置加载协作方。
///
/// 解析器对位置字符串完成占位符求值后，将其交给加载器换取键值对。
/// 位置不存在属于硬失败，由解析器包装上下文后向上传播。
pub trait PropertyLoader: Send + Sync {
    /// 加载一个位置的全部键值对。
    fn load(&self, location: &str) -> Result<BTreeMap<String, String>, PropertyLoadError>;
}

/// 内存属性加载器，按位置名登记键值对。
#[derive(Clone, Debug, Default)]
pub struct MapPropertyLoader {
    locations: BTreeMap<String, BTreeMap<String, String>>,
}

impl MapPropertyLoader {
    /// 创建空加载器。
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个位置的键值对，重复登记覆盖。
    pub fn insert<L, I, K, V>(&mut self, location: L, entries: I)
    where
        L: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.locations.insert(
            location.into(),
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
    }
}

impl PropertyLoader for MapPropertyLoader {
    fn load(&self, location: &str) -> Result<BTreeMap<String, String>, PropertyLoadError> {
        self.locations
            .get(location)
            .cloned()
            .ok_or_else(|| PropertyLoadError::Missing {
                location: String::from(location),
            })
    }
}

/// 从文件系统加载 `key=value` 行格式的属性加载器。
///
/// 空行与 `#` 开头的行被忽略；缺少 `=` 的行视为格式错误。
#[cfg(feature = "std")]
#[derive(Clone, Debug, Default)]
pub struct FilePropertyLoader;

#[cfg(feature = "std")]
impl PropertyLoader for FilePropertyLoader {
    fn load(&self, location: &str) -> Result<BTreeMap<String, String>, PropertyLoadError> {
        let path = std::path::Path::new(location);
        if !path.exists() {
            return Err(PropertyLoadError::Missing {
                location: String::from(location),
            });
        }
        let content =
            std::fs::read_to_string(path).map_err(|error| PropertyLoadError::Io {
                location: String::from(location),
                detail: alloc::format!("{error}"),
            })?;

        let mut entries = BTreeMap::new();
        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(PropertyLoadError::Malformed {
                    location: String::from(location),
                    line: index + 1,
                });
            };
            entries.insert(String::from(key.trim()), String::from(value.trim()));
        }
        Ok(entries)
    }
}
