use alloc::{
    string::String,
    vec::Vec,
};
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{class::ClassName, import::render_chain};

/// 非致命诊断的类别。
///
/// ## 契约定义（What）
/// - `CircularImport`：`attempted` 重入了当前解析路径，`chain` 为自底向顶的路径快照；
/// - `DuplicateFactoryMethod`：同一配置类（含超类折叠）内工厂方法重名。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemKind {
    CircularImport {
        attempted: ClassName,
        chain: Vec<ClassName>,
    },
    DuplicateFactoryMethod {
        class: ClassName,
        method: String,
    },
}

/// 一条非致命诊断。
///
/// 诊断只被聚合上报，从不中断解析：环路所在分支被截断后，
/// 其余分支照常展开。`location` 指出诊断挂靠的配置类。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub kind: ProblemKind,
    pub location: ClassName,
}

impl Problem {
    /// 构造一条环路诊断，挂靠在路径顶部的导入方上。
    pub fn circular_import(attempted: ClassName, chain: Vec<ClassName>) -> Self {
        let location = chain.last().cloned().unwrap_or_else(|| attempted.clone());
        Self {
            kind: ProblemKind::CircularImport { attempted, chain },
            location,
        }
    }

    /// 构造一条工厂方法重名诊断。
    pub fn duplicate_factory_method(class: ClassName, method: impl Into<String>) -> Self {
        Self {
            location: class.clone(),
            kind: ProblemKind::DuplicateFactoryMethod {
                class,
                method: method.into(),
            },
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ProblemKind::CircularImport { attempted, chain } => write!(
                f,
                "a circular import has been detected: illegal attempt by configuration class \
                 `{}` to import class `{}` which is already present in the current import stack {}",
                self.location.simple_name(),
                attempted.simple_name(),
                render_chain(chain),
            ),
            ProblemKind::DuplicateFactoryMethod { class, method } => write!(
                f,
                "configuration class `{}` declares factory method `{method}` more than once",
                class.simple_name(),
            ),
        }
    }
}

/// 诊断接收协作方。
///
/// 解析器在诊断发生时立即回调，调用方可借此接入既有的告警或聚合设施。
/// 无论是否注入观察者，解析结果都会完整携带诊断列表。
pub trait ProblemReporter {
    /// 接收一条诊断。
    fn report(&mut self, problem: Problem);
}

/// 聚合式诊断接收器。
#[derive(Clone, Debug, Default)]
pub struct CollectingReporter {
    problems: Vec<Problem>,
}

impl CollectingReporter {
    /// 创建空接收器。
    pub fn new() -> Self {
        Self::default()
    }

    /// 已聚合的诊断。
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// 拆出全部诊断。
    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }
}

impl ProblemReporter for CollectingReporter {
    fn report(&mut self, problem: Problem) {
        self.problems.push(problem);
    }
}
