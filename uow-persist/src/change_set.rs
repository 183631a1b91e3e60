//! 变更集（ChangeSet）
//!
//! 工作单元内所有仓储写操作只登记 `PendingChange`，不触达存储；
//! 提交时拦截器在变更集上工作，随后整体交给 `Storage::commit` 原子落库。
//!
//! 同一实体的多次登记会被折叠为一次等价变更：
//! - Insert + Update → Insert（取最新值）
//! - Insert + Delete → 移除
//! - Update + Update → Update（取最新值）
//! - Update + Delete → Delete
//! - Delete + Insert → Update
//!
//! 折叠时旧条目上尚未取出的领域事件会并入新条目，保证事件不丢失。
//!
use crate::storage::{EntityEntry, TableId};
use std::slice::{Iter, IterMut};
use uow_domain::entity::Entity;
use uuid::Uuid;

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// 一条待提交的变更
#[derive(Debug, Clone)]
pub struct PendingChange {
    kind: ChangeKind,
    entry: Box<dyn EntityEntry>,
}

impl PendingChange {
    pub fn new(kind: ChangeKind, entry: Box<dyn EntityEntry>) -> Self {
        Self { kind, entry }
    }

    pub fn insert<T: Entity>(entity: T) -> Self {
        Self::new(ChangeKind::Insert, Box::new(entity))
    }

    pub fn update<T: Entity>(entity: T) -> Self {
        Self::new(ChangeKind::Update, Box::new(entity))
    }

    pub fn delete<T: Entity>(entity: T) -> Self {
        Self::new(ChangeKind::Delete, Box::new(entity))
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn id(&self) -> Uuid {
        self.entry.entity_id()
    }

    pub fn table(&self) -> TableId {
        self.entry.table()
    }

    pub fn entry(&self) -> &dyn EntityEntry {
        self.entry.as_ref()
    }

    pub fn entry_mut(&mut self) -> &mut dyn EntityEntry {
        self.entry.as_mut()
    }

    pub fn into_entry(self) -> Box<dyn EntityEntry> {
        self.entry
    }

    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.entry.downcast_ref::<T>()
    }

    fn same_target(&self, other: &PendingChange) -> bool {
        self.table() == other.table() && self.id() == other.id()
    }
}

/// 有序的待提交变更集合
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<PendingChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一条变更，并与同一实体已有的变更折叠
    pub fn stage(&mut self, mut change: PendingChange) {
        let Some(index) = self.changes.iter().position(|c| c.same_target(&change)) else {
            self.changes.push(change);
            return;
        };

        let previous_kind = self.changes[index].kind;
        let merged_kind = match (previous_kind, change.kind) {
            (ChangeKind::Insert, ChangeKind::Update) => Some(ChangeKind::Insert),
            (ChangeKind::Insert, ChangeKind::Delete) => None,
            (ChangeKind::Update, ChangeKind::Update) => Some(ChangeKind::Update),
            (ChangeKind::Update, ChangeKind::Delete) => Some(ChangeKind::Delete),
            (ChangeKind::Delete, ChangeKind::Insert) => Some(ChangeKind::Update),
            (ChangeKind::Delete, ChangeKind::Delete) => return,
            // 其余组合（重复插入、删除后更新）原样追加，由存储在提交时判定冲突
            _ => {
                self.changes.push(change);
                return;
            }
        };

        let mut previous = self.changes.remove(index);
        if let Some(kind) = merged_kind {
            carry_events(previous.entry_mut(), change.entry_mut());
            change.kind = kind;
            self.changes.insert(index, change);
        }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    pub fn iter(&self) -> Iter<'_, PendingChange> {
        self.changes.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, PendingChange> {
        self.changes.iter_mut()
    }

    pub fn into_changes(self) -> Vec<PendingChange> {
        self.changes
    }

    /// 查找某实体当前登记的变更
    pub fn find<T: Entity>(&self, id: Uuid) -> Option<&PendingChange> {
        let table = TableId::of::<T>();
        self.changes
            .iter()
            .find(|c| c.table() == table && c.id() == id)
    }

    pub fn count_of(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// 以本变更集覆盖已提交的行：更新替换原位，删除移除，插入追加在末尾
    pub fn overlay<T: Entity>(&self, mut rows: Vec<T>) -> Vec<T> {
        let table = TableId::of::<T>();
        for change in self.changes.iter().filter(|c| c.table() == table) {
            let Some(entity) = change.downcast_ref::<T>() else {
                continue;
            };
            let position = rows.iter().position(|r| r.id() == entity.id());
            match (change.kind, position) {
                (ChangeKind::Delete, Some(i)) => {
                    rows.remove(i);
                }
                (ChangeKind::Delete, None) => {}
                (_, Some(i)) => rows[i] = entity.clone(),
                (_, None) => rows.push(entity.clone()),
            }
        }
        rows
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a PendingChange;
    type IntoIter = Iter<'a, PendingChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

// 旧条目的事件排在新条目之前
fn carry_events(from: &mut dyn EntityEntry, to: &mut dyn EntityEntry) {
    let Some(older) = from.event_buffer_mut().map(|buffer| buffer.take()) else {
        return;
    };
    if older.is_empty() {
        return;
    }
    if let Some(buffer) = to.event_buffer_mut() {
        let newer = buffer.take();
        buffer.extend(older);
        buffer.extend(newer);
    }
}
