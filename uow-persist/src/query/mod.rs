//! 查询规约（Query Specification）
//!
//! 一次仓储调用所需的全部查询描述：过滤条件、预加载图、排序与跟踪开关。
//! `Query` 为一次性对象，由某一次仓储调用消费。
//!
//! 组装顺序固定：跟踪 → 预加载 → 过滤 → 排序 → 投影/分页。
//!
mod include;

pub use include::{
    IncludeBuilder, IncludeGraph, IncludeStep, Navigation, Reference, ReferenceList,
    ThenIncludeBuilder,
};

use crate::change_set::ChangeSet;
use crate::storage::Storage;
use std::cmp::Ordering;
use std::fmt;
use uow_domain::{
    entity::Entity,
    error::DomainResult,
    specification::{AndSpecification, BoxSpecification, Specification},
};

type Comparer<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

pub struct Query<T: Entity> {
    filter: Option<BoxSpecification<T>>,
    include: Option<IncludeGraph<T>>,
    order: Vec<Comparer<T>>,
    tracking: bool,
}

impl<T: Entity> Query<T> {
    pub fn new() -> Self {
        Self {
            filter: None,
            include: None,
            order: Vec::new(),
            tracking: false,
        }
    }

    /// 追加过滤条件；多次调用按 AND 组合
    pub fn filter<S>(mut self, spec: S) -> Self
    where
        S: Specification<T> + 'static,
    {
        self.filter = Some(match self.filter.take() {
            Some(current) => Box::new(AndSpecification::new(current, Box::new(spec))),
            None => Box::new(spec),
        });
        self
    }

    pub fn include(mut self, graph: IncludeGraph<T>) -> Self {
        self.include = Some(graph);
        self
    }

    /// 以构建器描述预加载图
    pub fn include_with<F>(self, build: F) -> Self
    where
        F: FnOnce(IncludeBuilder<T>) -> IncludeGraph<T>,
    {
        self.include(build(IncludeBuilder::new()))
    }

    /// 主排序键（升序），覆盖已有排序
    pub fn order_by<K, F>(mut self, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order.clear();
        self.then_by(key)
    }

    /// 主排序键（降序），覆盖已有排序
    pub fn order_by_desc<K, F>(mut self, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order.clear();
        self.then_by_desc(key)
    }

    /// 次级排序键（升序）
    pub fn then_by<K, F>(mut self, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order.push(Box::new(move |a: &T, b: &T| key(a).cmp(&key(b))));
        self
    }

    /// 次级排序键（降序）
    pub fn then_by_desc<K, F>(mut self, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order.push(Box::new(move |a: &T, b: &T| key(b).cmp(&key(a))));
        self
    }

    /// 是否叠加本工作单元内尚未提交的变更（默认关闭），对预加载的导航目标同样生效
    pub fn tracking(mut self, enabled: bool) -> Self {
        self.tracking = enabled;
        self
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn is_ordered(&self) -> bool {
        !self.order.is_empty()
    }

    /// 在给定的行集上依次执行预加载、过滤与排序（排序稳定）
    ///
    /// 跟踪模式下由调用方传入待提交变更，预加载的导航目标同样叠加这些变更。
    pub(crate) async fn evaluate(
        self,
        storage: &dyn Storage,
        pending: Option<&ChangeSet>,
        mut rows: Vec<T>,
    ) -> DomainResult<Vec<T>> {
        let Query {
            filter,
            include,
            order,
            ..
        } = self;

        if let Some(graph) = include {
            graph.load(storage, pending, &mut rows).await?;
        }

        if let Some(spec) = filter {
            rows.retain(|row| spec.is_satisfied_by(row));
        }

        if !order.is_empty() {
            rows.sort_by(|a, b| {
                order
                    .iter()
                    .fold(Ordering::Equal, |acc, cmp| acc.then_with(|| cmp(a, b)))
            });
        }

        Ok(rows)
    }
}

impl<T: Entity> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("entity", &T::TYPE)
            .field("filtered", &self.filter.is_some())
            .field("include", &self.include)
            .field("order_keys", &self.order.len())
            .field("tracking", &self.tracking)
            .finish()
    }
}
