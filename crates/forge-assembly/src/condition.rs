use alloc::collections::BTreeSet;

use crate::{class::ClassName, metadata::ClassMetadata};

/// 条件评估协作方。
///
/// ## 教案级注释
/// - **意图 (Why)**
///   - 配置类可以被条件排除：被排除的类不执行组件扫描、不运行选择器与注册器，
///     其关联元数据的读取失败也会被容忍而非传播。
/// - **契约 (What)**
///   - `should_skip` 返回 `true` 表示按当前环境应排除该类；
///   - 同一元数据在一次解析中可能被评估多次，实现必须无副作用且结果稳定。
pub trait ConditionEvaluator: Send + Sync {
    /// 判断给定类在当前环境下是否应被排除。
    fn should_skip(&self, metadata: &ClassMetadata) -> bool;
}

/// 默认评估器：从不排除任何类。
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysInclude;

impl ConditionEvaluator for AlwaysInclude {
    fn should_skip(&self, _metadata: &ClassMetadata) -> bool {
        false
    }
}

/// 按名单排除的评估器，供宿主裁剪装配范围或测试注入排除语义。
#[derive(Clone, Debug, Default)]
pub struct SkipListed {
    names: BTreeSet<ClassName>,
}

impl SkipListed {
    /// 以排除名单构造评估器。
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<ClassName>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ConditionEvaluator for SkipListed {
    fn should_skip(&self, metadata: &ClassMetadata) -> bool {
        self.names.contains(&metadata.name)
    }
}
