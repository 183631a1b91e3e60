//! 预加载图（Include Graph）
//!
//! 以类型化的树描述需要一并加载的导航属性：
//! - `include` 在根下新增一个节点；
//! - `then_include` 在当前节点下新增子节点（继续向深处加载）；
//! - 在 `then_include` 之后再次 `include` 会回到根，新增兄弟节点。
//!
//! 导航属性通过 `fn(&mut T) -> &mut N` 访问器定位，`N` 为 `Reference<P>`（对一）
//! 或 `ReferenceList<P>`（对多）。加载时每个节点只读取一次目标表，再递归加载子节点。
//!
//! ```ignore
//! let graph = IncludeBuilder::<Order>::new()
//!     .include(|o| &mut o.customer)
//!     .then_include(|c| &mut c.address)
//!     .include(|o| &mut o.lines)
//!     .build();
//! ```
//!
use crate::change_set::ChangeSet;
use crate::storage::{Storage, load_entities};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use uow_domain::{entity::Entity, error::DomainResult};
use uuid::Uuid;

/// 导航属性：声明引用的目标标识，并在加载后回填目标实体
pub trait Navigation<P>: Send + Sync {
    fn keys(&self) -> Vec<Uuid>;

    fn fill(&mut self, loaded: &HashMap<Uuid, P>);
}

/// 对一导航（外键）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference<P> {
    id: Option<Uuid>,
    #[serde(skip)]
    value: Option<P>,
}

impl<P> Reference<P> {
    pub fn new(id: Uuid) -> Self {
        Self {
            id: Some(id),
            value: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            id: None,
            value: None,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// 已加载的目标实体；未预加载或目标不存在时为 `None`
    pub fn get(&self) -> Option<&P> {
        self.value.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }

    /// 重新指向另一个目标，清除已加载的值
    pub fn set(&mut self, id: Option<Uuid>) {
        self.id = id;
        self.value = None;
    }
}

impl<P> Default for Reference<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P: Clone + Send + Sync> Navigation<P> for Reference<P> {
    fn keys(&self) -> Vec<Uuid> {
        self.id.into_iter().collect()
    }

    fn fill(&mut self, loaded: &HashMap<Uuid, P>) {
        self.value = self.id.and_then(|id| loaded.get(&id).cloned());
    }
}

/// 对多导航（标识列表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceList<P> {
    ids: Vec<Uuid>,
    #[serde(skip)]
    items: Vec<P>,
}

impl<P> ReferenceList<P> {
    pub fn new(ids: Vec<Uuid>) -> Self {
        Self {
            ids,
            items: Vec::new(),
        }
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn push(&mut self, id: Uuid) {
        self.ids.push(id);
    }

    /// 已加载的目标实体，按标识列表顺序排列
    pub fn items(&self) -> &[P] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<P> Default for ReferenceList<P> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<P: Clone + Send + Sync> Navigation<P> for ReferenceList<P> {
    fn keys(&self) -> Vec<Uuid> {
        self.ids.clone()
    }

    fn fill(&mut self, loaded: &HashMap<Uuid, P>) {
        self.items = self
            .ids
            .iter()
            .filter_map(|id| loaded.get(id).cloned())
            .collect();
    }
}

/// 预加载图中的一个可执行节点
///
/// `pending` 为跟踪模式下本工作单元的待提交变更，导航目标会叠加这些变更后再回填。
#[async_trait]
pub trait IncludeStep<T>: Send + Sync {
    async fn load(
        &self,
        storage: &dyn Storage,
        pending: Option<&ChangeSet>,
        parents: &mut [T],
    ) -> DomainResult<()>;
}

struct IncludeNode<T, P, N> {
    accessor: fn(&mut T) -> &mut N,
    children: Vec<Box<dyn IncludeStep<P>>>,
    _marker: PhantomData<fn() -> (T, P)>,
}

#[async_trait]
impl<T, P, N> IncludeStep<T> for IncludeNode<T, P, N>
where
    T: Send + Sync + 'static,
    P: Entity,
    N: Navigation<P> + 'static,
{
    async fn load(
        &self,
        storage: &dyn Storage,
        pending: Option<&ChangeSet>,
        parents: &mut [T],
    ) -> DomainResult<()> {
        let mut keys = HashSet::new();
        for parent in parents.iter_mut() {
            keys.extend((self.accessor)(parent).keys());
        }
        if keys.is_empty() {
            return Ok(());
        }

        let mut candidates = load_entities::<P>(storage).await?;
        if let Some(pending) = pending {
            candidates = pending.overlay(candidates);
        }
        let mut related: Vec<P> = candidates
            .into_iter()
            .filter(|p| keys.contains(&p.id()))
            .collect();

        for child in &self.children {
            child.load(storage, pending, &mut related).await?;
        }

        let loaded: HashMap<Uuid, P> = related.into_iter().map(|p| (p.id(), p)).collect();
        for parent in parents.iter_mut() {
            (self.accessor)(parent).fill(&loaded);
        }
        Ok(())
    }
}

/// 构建完成的预加载图
pub struct IncludeGraph<T> {
    steps: Vec<Box<dyn IncludeStep<T>>>,
}

impl<T: Send + Sync + 'static> IncludeGraph<T> {
    pub fn builder() -> IncludeBuilder<T> {
        IncludeBuilder::new()
    }

    /// 根节点数
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) async fn load(
        &self,
        storage: &dyn Storage,
        pending: Option<&ChangeSet>,
        rows: &mut [T],
    ) -> DomainResult<()> {
        for step in &self.steps {
            step.load(storage, pending, rows).await?;
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for IncludeGraph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncludeGraph")
            .field("roots", &self.steps.len())
            .finish()
    }
}

/// 根层级的构建器
pub struct IncludeBuilder<T> {
    steps: Vec<Box<dyn IncludeStep<T>>>,
}

impl<T: Send + Sync + 'static> IncludeBuilder<T> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// 在根下新增导航节点
    pub fn include<P, N>(self, accessor: fn(&mut T) -> &mut N) -> ThenIncludeBuilder<T, P>
    where
        P: Entity,
        N: Navigation<P> + 'static,
    {
        let IncludeBuilder { mut steps } = self;
        ThenIncludeBuilder {
            children: Vec::new(),
            seal: Box::new(move |children: Vec<Box<dyn IncludeStep<P>>>| {
                steps.push(Box::new(IncludeNode {
                    accessor,
                    children,
                    _marker: PhantomData,
                }));
                IncludeBuilder { steps }
            }),
        }
    }

    pub fn build(self) -> IncludeGraph<T> {
        IncludeGraph { steps: self.steps }
    }
}

impl<T: Send + Sync + 'static> Default for IncludeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

type Seal<T, P> = Box<dyn FnOnce(Vec<Box<dyn IncludeStep<P>>>) -> IncludeBuilder<T>>;

/// 位于某个导航节点上的构建器，`P` 为当前节点的目标实体类型
pub struct ThenIncludeBuilder<T, P> {
    children: Vec<Box<dyn IncludeStep<P>>>,
    seal: Seal<T, P>,
}

impl<T, P> ThenIncludeBuilder<T, P>
where
    T: Send + Sync + 'static,
    P: Entity,
{
    /// 在当前节点下新增子节点
    pub fn then_include<Q, M>(self, accessor: fn(&mut P) -> &mut M) -> ThenIncludeBuilder<T, Q>
    where
        Q: Entity,
        M: Navigation<Q> + 'static,
    {
        let ThenIncludeBuilder {
            mut children,
            seal,
        } = self;
        ThenIncludeBuilder {
            children: Vec::new(),
            seal: Box::new(move |grandchildren: Vec<Box<dyn IncludeStep<Q>>>| {
                children.push(Box::new(IncludeNode {
                    accessor,
                    children: grandchildren,
                    _marker: PhantomData,
                }));
                seal(children)
            }),
        }
    }

    /// 回到根，新增兄弟节点
    pub fn include<Q, M>(self, accessor: fn(&mut T) -> &mut M) -> ThenIncludeBuilder<T, Q>
    where
        Q: Entity,
        M: Navigation<Q> + 'static,
    {
        self.finish().include(accessor)
    }

    pub fn build(self) -> IncludeGraph<T> {
        self.finish().build()
    }

    fn finish(self) -> IncludeBuilder<T> {
        (self.seal)(self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use uow_macros::entity;

    #[entity]
    struct Country {
        name: String,
    }

    #[entity]
    struct City {
        name: String,
        country: Reference<Country>,
    }

    #[entity]
    struct Person {
        name: String,
        home: Reference<City>,
        friends: ReferenceList<Person>,
    }

    #[tokio::test]
    async fn loads_nested_and_sibling_navigations() {
        let storage = InMemoryStorage::new();
        let country = Country {
            id: Uuid::new_v4(),
            name: "Iceland".into(),
        };
        let city = City {
            id: Uuid::new_v4(),
            name: "Reykjavik".into(),
            country: Reference::new(country.id),
        };
        let friend = Person {
            id: Uuid::new_v4(),
            name: "Bjork".into(),
            home: Reference::empty(),
            friends: ReferenceList::default(),
        };
        let person = Person {
            id: Uuid::new_v4(),
            name: "Sigur".into(),
            home: Reference::new(city.id),
            friends: ReferenceList::new(vec![friend.id, Uuid::new_v4()]),
        };
        storage.seed([country]).await;
        storage.seed([city]).await;

        let graph = IncludeBuilder::<Person>::new()
            .include(|p| &mut p.home)
            .then_include(|c| &mut c.country)
            .include(|p| &mut p.friends)
            .build();
        assert_eq!(graph.len(), 2);

        storage.seed([friend.clone(), person.clone()]).await;
        let mut rows = vec![person];
        graph.load(&storage, None, &mut rows).await.unwrap();

        let home = rows[0].home.get().expect("home loaded");
        assert_eq!(home.name, "Reykjavik");
        assert_eq!(home.country.get().map(|c| c.name.as_str()), Some("Iceland"));
        // 不存在的标识被跳过
        assert_eq!(rows[0].friends.len(), 2);
        assert_eq!(rows[0].friends.items().len(), 1);
        assert_eq!(rows[0].friends.items()[0].name, "Bjork");
    }

    #[tokio::test]
    async fn empty_references_skip_loading() {
        let storage = InMemoryStorage::new();
        let graph = IncludeGraph::<City>::builder()
            .include(|c| &mut c.country)
            .build();
        let mut rows = vec![City {
            id: Uuid::new_v4(),
            name: "Nowhere".into(),
            country: Reference::empty(),
        }];
        graph.load(&storage, None, &mut rows).await.unwrap();
        assert!(!rows[0].country.is_loaded());
        assert_eq!(rows[0].country.id(), None);
    }
}
