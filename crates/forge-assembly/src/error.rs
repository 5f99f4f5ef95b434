//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义装配解析的硬失败语义：与可聚合的诊断（见 [`crate::problem`]）不同，
//!   硬失败会中断本次解析并沿调用链传播；
//! - 每个变体都绑定肇事的类或位置，保证排障时不丢上下文。
//!
//! ## 设计要求（What）
//! - 启用 `std` 特性时派生 `thiserror::Error`，与生态的 `std::error::Error` 兼容；
//! - `no_std` 场景提供等价的手写 `Display` 实现；
//! - 底层原因以结构化子错误保存，`source()` 链路完整。

#[cfg(not(feature = "std"))]
use core::fmt;

use alloc::string::String;

#[cfg(feature = "std")]
use thiserror::Error;

use crate::{
    class::ClassName,
    environment::PlaceholderError,
    metadata::MetadataError,
    property::PropertyLoadError,
    registry::RegistryError,
};

/// 装配解析的硬失败域。
///
/// # 教案式说明
/// - **意图 (Why)**：区分“可继续”的诊断与“必须中止”的失败。声明错误
///   （缺失属性源位置）、必需元数据不可读、占位符无法求值、定义名冲突
///   都属于后者。
/// - **契约 (What)**：
///   - 所有变体均实现 `Send + Sync + 'static`，可安全跨线程传播；
///   - 条件排除会在调用点抑制部分失败（被排除类的元数据读取容忍），
///     能走到该枚举的失败均为不可抑制路径。
#[cfg_attr(feature = "std", derive(Error))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssemblyError {
    /// 非排除类的注解元数据读取失败。
    #[cfg_attr(
        feature = "std",
        error("failed to read metadata for configuration class `{class}`")
    )]
    MetadataUnreadable {
        class: ClassName,
        source: MetadataError,
    },

    /// 超类元数据读取失败，且所属配置类未被条件排除。
    #[cfg_attr(
        feature = "std",
        error("failed to read metadata for `{superclass}`, superclass of `{class}`")
    )]
    SuperclassUnreadable {
        class: ClassName,
        superclass: ClassName,
        source: MetadataError,
    },

    /// 属性源声明不合法，例如缺失位置列表。
    #[cfg_attr(
        feature = "std",
        error("invalid property source declaration on `{class}`: {detail}")
    )]
    PropertySourceInvalid { class: ClassName, detail: String },

    /// 属性源位置中的占位符无法求值。
    #[cfg_attr(
        feature = "std",
        error("failed to resolve placeholders in location `{location}` declared on `{class}`")
    )]
    Placeholder {
        class: ClassName,
        location: String,
        source: PlaceholderError,
    },

    /// 属性源位置加载失败。
    #[cfg_attr(
        feature = "std",
        error("failed to load property source `{location}` declared on `{class}`")
    )]
    PropertyLoad {
        class: ClassName,
        location: String,
        source: PropertyLoadError,
    },

    /// 组件扫描或注册器贡献的定义与既有定义冲突。
    #[cfg_attr(
        feature = "std",
        error("definition contributed by `{class}` conflicts with an existing one")
    )]
    DefinitionConflict {
        class: ClassName,
        source: RegistryError,
    },
}

impl AssemblyError {
    /// 失败涉及的配置类。
    pub fn class(&self) -> &ClassName {
        match self {
            AssemblyError::MetadataUnreadable { class, .. }
            | AssemblyError::SuperclassUnreadable { class, .. }
            | AssemblyError::PropertySourceInvalid { class, .. }
            | AssemblyError::Placeholder { class, .. }
            | AssemblyError::PropertyLoad { class, .. }
            | AssemblyError::DefinitionConflict { class, .. } => class,
        }
    }
}

#[cfg(not(feature = "std"))]
impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::MetadataUnreadable { class, .. } => {
                write!(f, "failed to read metadata for configuration class `{class}`")
            }
            AssemblyError::SuperclassUnreadable {
                class, superclass, ..
            } => write!(
                f,
                "failed to read metadata for `{superclass}`, superclass of `{class}`"
            ),
            AssemblyError::PropertySourceInvalid { class, detail } => {
                write!(f, "invalid property source declaration on `{class}`: {detail}")
            }
            AssemblyError::Placeholder {
                class, location, ..
            } => write!(
                f,
                "failed to resolve placeholders in location `{location}` declared on `{class}`"
            ),
            AssemblyError::PropertyLoad {
                class, location, ..
            } => write!(
                f,
                "failed to load property source `{location}` declared on `{class}`"
            ),
            AssemblyError::DefinitionConflict { class, .. } => {
                write!(f, "definition contributed by `{class}` conflicts with an existing one")
            }
        }
    }
}
