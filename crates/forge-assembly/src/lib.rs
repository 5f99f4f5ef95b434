#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![doc = "forge-assembly: 配置类导入闭包的发现与解析引擎。"]

//! # forge-assembly
//!
//! ## 角色定位（Why）
//! - 给定一组起始候选配置类与一个元数据读取器，求出经由直接导入、
//!   元注解携带导入、嵌套成员类、组件扫描与延迟选择器可达的完整配置类闭包；
//! - 环形导入链作为诊断聚合上报而非致命错误，互不相关的分支照常展开；
//! - 发现与执行分离：本 crate 只产出结构化的解析结果，不实例化任何组件。
//!
//! ## 模块地图（How）
//! - [`class`]：类名标识与配置类节点；
//! - [`metadata`]：注解元数据视图与读取契约；
//! - [`import`]：选择器、注册器与导入路径栈;
//! - [`parser`]：深度优先的闭包解析器与构建器；
//! - [`property`] / [`environment`]：属性源链与占位符求值；
//! - [`condition`] / [`scan`] / [`registry`]：条件排除、组件扫描与定义注册表；
//! - [`problem`] / [`error`]：非致命诊断与硬失败。

#[cfg(not(feature = "alloc"))]
compile_error!(
    "forge-assembly 依赖堆分配能力：请启用默认特性或通过 `--features alloc` 显式打开该功能。",
);

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod class;
pub mod condition;
pub mod environment;
pub mod error;
pub mod import;
pub mod metadata;
pub mod parser;
pub mod problem;
pub mod property;
pub mod registry;
pub mod scan;

pub use class::{ClassName, ConfigurationClass, FactoryMethod};
pub use condition::{AlwaysInclude, ConditionEvaluator, SkipListed};
pub use environment::{Environment, MapEnvironment, PlaceholderError};
pub use error::AssemblyError;
pub use import::{
    DefinitionRegistrar, ImportSelector, ImportStack, RegistrarHandle, SelectorHandle,
    SelectorTiming,
};
pub use metadata::{ClassKind, ClassMetadata, MetadataCatalog, MetadataError, MetadataReader};
pub use parser::{AssemblyOutcome, AssemblyParser, AssemblyParserBuilder, Candidate};
pub use problem::{CollectingReporter, Problem, ProblemKind, ProblemReporter};
pub use property::{
    MapPropertyLoader, PropertyLoadError, PropertyLoader, PropertySource, PropertySourceChain,
    PropertySourceDecl,
};
#[cfg(feature = "std")]
pub use property::FilePropertyLoader;
pub use registry::{Definition, DefinitionRegistry, InMemoryDefinitionRegistry, RegistryError};
pub use scan::{ComponentScanDecl, ComponentScanner, ScannedCandidate};
