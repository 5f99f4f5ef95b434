use alloc::{
    collections::BTreeMap,
    string::String,
};
use core::fmt;

/// 占位符求值失败的形态。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaceholderError {
    /// 占位符引用的键在环境中不存在。
    Unresolved { placeholder: String },
    /// `${` 缺少配对的 `}`。
    Unclosed { input: String },
}

impl fmt::Display for PlaceholderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderError::Unresolved { placeholder } => {
                write!(f, "placeholder `${{{placeholder}}}` could not be resolved")
            }
            PlaceholderError::Unclosed { input } => {
                write!(f, "unclosed placeholder in `{input}`")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlaceholderError {}

/// 环境抽象，为属性源位置提供占位符求值。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 属性源位置经常按部署环境参数化（如 `config/${profile}/app.properties`），
///     求值能力以最小契约注入，避免解析器绑定任何具体配置设施。
/// - **契约 (What)**
///   - `property` 返回键对应的值；
///   - `resolve_required_placeholders` 对输入中的每个 `${key}` 求值，
///     任何一个键缺失即失败，这是一条硬失败路径；
///   - 占位符不支持嵌套，按从左到右的顺序逐个替换。
pub trait Environment: Send + Sync {
    /// 查询单个环境属性。
    fn property(&self, key: &str) -> Option<String>;

    /// 将输入中的全部 `${key}` 占位符替换为对应属性值。
    fn resolve_required_placeholders(&self, input: &str) -> Result<String, PlaceholderError> {
        let mut resolved = String::new();
        let mut rest = input;
        while let Some(start) = rest.find("${") {
            resolved.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                return Err(PlaceholderError::Unclosed {
                    input: String::from(input),
                });
            };
            let key = &after[..end];
            match self.property(key) {
                Some(value) => resolved.push_str(&value),
                None => {
                    return Err(PlaceholderError::Unresolved {
                        placeholder: String::from(key),
                    });
                }
            }
            rest = &after[end + 1..];
        }
        resolved.push_str(rest);
        Ok(resolved)
    }
}

/// 以 `BTreeMap` 承载的内存环境。
#[derive(Clone, Debug, Default)]
pub struct MapEnvironment {
    properties: BTreeMap<String, String>,
}

impl MapEnvironment {
    /// 创建空环境。
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个属性，重复写入覆盖。
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }
}

impl Environment for MapEnvironment {
    fn property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}
