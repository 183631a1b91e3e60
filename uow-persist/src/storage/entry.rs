use std::any::{Any, TypeId};
use std::fmt;
use uow_domain::{
    auditable::Auditable,
    domain_event::DomainEvents,
    entity::Entity,
    error::{DomainError, DomainResult},
};
use uuid::Uuid;

/// 存储表标识：实体的 Rust 类型与其 `Entity::TYPE` 判别名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId {
    type_id: TypeId,
    name: &'static str,
}

impl TableId {
    pub fn of<T: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: T::TYPE,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: Entity>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 类型擦除后的实体行
///
/// 变更集与存储以 `Box<dyn EntityEntry>` 形式持有不同类型的实体，
/// 拦截器通过能力钩子访问审计字段与事件缓冲。
pub trait EntityEntry: Any + Send + Sync + fmt::Debug {
    fn entity_id(&self) -> Uuid;

    fn table(&self) -> TableId;

    fn clone_entry(&self) -> Box<dyn EntityEntry>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn auditable_mut(&mut self) -> Option<&mut dyn Auditable>;

    fn event_buffer_mut(&mut self) -> Option<&mut DomainEvents>;
}

impl<T: Entity> EntityEntry for T {
    fn entity_id(&self) -> Uuid {
        self.id()
    }

    fn table(&self) -> TableId {
        TableId::of::<T>()
    }

    fn clone_entry(&self) -> Box<dyn EntityEntry> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn auditable_mut(&mut self) -> Option<&mut dyn Auditable> {
        self.as_auditable_mut()
    }

    fn event_buffer_mut(&mut self) -> Option<&mut DomainEvents> {
        Entity::event_buffer_mut(self)
    }
}

impl Clone for Box<dyn EntityEntry> {
    fn clone(&self) -> Self {
        (**self).clone_entry()
    }
}

impl dyn EntityEntry {
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// 还原为具体实体类型
    pub fn downcast<T: Entity>(self: Box<Self>) -> DomainResult<T> {
        let found = self.table().name();
        self.into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| DomainError::TypeMismatch {
                expected: T::TYPE.to_string(),
                found: found.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uow_macros::{aggregate_root, entity};

    #[entity]
    struct Tag {
        label: String,
    }

    #[aggregate_root(auditable)]
    struct Basket {
        items: u32,
    }

    #[test]
    fn entry_exposes_identity_and_capabilities() {
        let id = Uuid::new_v4();
        let mut entry: Box<dyn EntityEntry> = Box::new(Basket {
            id,
            created_at_utc: None,
            modified_at_utc: None,
            domain_events: Default::default(),
            items: 2,
        });
        assert_eq!(entry.entity_id(), id);
        assert_eq!(entry.table(), TableId::of::<Basket>());
        assert_eq!(entry.table().name(), "Basket");
        assert!(entry.auditable_mut().is_some());
        assert!(entry.event_buffer_mut().is_some());

        let cloned = entry.clone();
        assert_eq!(cloned.downcast_ref::<Basket>().map(|b| b.items), Some(2));
        assert!(cloned.downcast_ref::<Tag>().is_none());
    }

    #[test]
    fn downcast_reports_type_mismatch() {
        let entry: Box<dyn EntityEntry> = Box::new(Tag {
            id: Uuid::new_v4(),
            label: "x".into(),
        });
        let err = entry.clone().downcast::<Basket>().unwrap_err();
        assert!(matches!(
            err,
            DomainError::TypeMismatch { ref expected, ref found } if expected == "Basket" && found == "Tag"
        ));
        assert_eq!(entry.downcast::<Tag>().unwrap().label, "x");
    }
}
