use alloc::{
    string::String,
    vec::Vec,
};

use serde::{Deserialize, Serialize};

use crate::{class::ClassName, metadata::MetadataCatalog};

/// 组件扫描声明，列出待扫描的基础包前缀。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentScanDecl {
    pub base_packages: Vec<String>,
}

impl ComponentScanDecl {
    /// 以基础包前缀构造声明。
    pub fn new<I, P>(base_packages: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            base_packages: base_packages.into_iter().map(Into::into).collect(),
        }
    }
}

/// 扫描产出的一个候选：类名与按约定生成的定义名。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedCandidate {
    pub class: ClassName,
    pub bean_name: String,
}

/// 组件扫描协作方。
///
/// ## 契约定义（What）
/// - 对一条声明返回命中的候选列表，顺序必须稳定；
/// - 候选会被注册进定义注册表，满足配置类判定的候选还会被递归解析；
/// - 实现不应产生重复候选，重名注册会作为硬失败上抛。
pub trait ComponentScanner: Send + Sync {
    /// 执行一次扫描。
    fn scan(&self, decl: &ComponentScanDecl) -> Vec<ScannedCandidate>;
}

/// 目录即扫描域：按名称前缀匹配目录中登记的类。
///
/// 定义名按惯例取简单名并将首字母小写，与注解驱动容器的默认命名一致。
impl ComponentScanner for MetadataCatalog {
    fn scan(&self, decl: &ComponentScanDecl) -> Vec<ScannedCandidate> {
        let mut candidates = Vec::new();
        for name in self.names() {
            let within = decl.base_packages.iter().any(|package| {
                name.as_str()
                    .strip_prefix(package.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
            });
            if within {
                candidates.push(ScannedCandidate {
                    class: name.clone(),
                    bean_name: default_bean_name(name),
                });
            }
        }
        candidates
    }
}

fn default_bean_name(class: &ClassName) -> String {
    let simple = class.simple_name();
    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => {
            let mut name = String::new();
            name.extend(first.to_lowercase());
            name.push_str(chars.as_str());
            name
        }
        None => String::new(),
    }
}
