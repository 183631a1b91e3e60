use super::DomainEvent;
use std::fmt;
use std::slice::Iter;
use std::sync::Arc;

/// 聚合根持有的待发布事件缓冲，按追加顺序排列
///
/// 克隆缓冲只复制事件引用，事件本身不可变。
#[derive(Clone, Default)]
pub struct DomainEvents {
    events: Vec<Arc<dyn DomainEvent>>,
}

impl DomainEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加事件
    pub fn raise<E>(&mut self, event: E)
    where
        E: DomainEvent,
    {
        self.events.push(Arc::new(event));
    }

    /// 追加已共享的事件（例如从另一个缓冲转移而来）
    pub fn push(&mut self, event: Arc<dyn DomainEvent>) {
        self.events.push(event);
    }

    /// 取出全部事件并清空缓冲
    pub fn take(&mut self) -> Vec<Arc<dyn DomainEvent>> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Arc<dyn DomainEvent>> {
        self.events.iter()
    }
}

impl fmt::Debug for DomainEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.events.iter().map(|e| e.event_type()))
            .finish()
    }
}

impl<'a> IntoIterator for &'a DomainEvents {
    type Item = &'a Arc<dyn DomainEvent>;
    type IntoIter = Iter<'a, Arc<dyn DomainEvent>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl Extend<Arc<dyn DomainEvent>> for DomainEvents {
    fn extend<I: IntoIterator<Item = Arc<dyn DomainEvent>>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}
