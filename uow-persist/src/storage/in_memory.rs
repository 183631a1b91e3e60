//! 内存版存储（InMemoryStorage）
//!
//! 以 `tokio::sync::RwLock` 保护的表集合实现 `Storage` 协议：
//! 提交时在受影响表的副本上逐条校验并应用变更，全部成功后才整体替换，
//! 任一冲突都不会留下部分写入。
//!
use super::{EntityEntry, Storage, TableId};
use crate::change_set::{ChangeKind, ChangeSet};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tokio::sync::RwLock;
use uow_domain::{
    entity::Entity,
    error::{DomainError, DomainResult},
};

type Table = Vec<Box<dyn EntityEntry>>;

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<HashMap<TableId, Table>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入初始数据（绕过工作单元与拦截器）
    pub async fn seed<T, I>(&self, rows: I)
    where
        T: Entity,
        I: IntoIterator<Item = T>,
    {
        let mut tables = self.tables.write().await;
        let table = tables.entry(TableId::of::<T>()).or_default();
        for row in rows {
            let id = row.id();
            match table.iter().position(|r| r.entity_id() == id) {
                Some(i) => table[i] = Box::new(row),
                None => table.push(Box::new(row)),
            }
        }
    }

    /// 某表当前已提交的行数
    pub async fn len<T: Entity>(&self) -> usize {
        self.tables
            .read()
            .await
            .get(&TableId::of::<T>())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// 某表已提交行的快照
    pub async fn rows<T: Entity>(&self) -> Vec<T> {
        self.tables
            .read()
            .await
            .get(&TableId::of::<T>())
            .map(|table| {
                table
                    .iter()
                    .filter_map(|r| r.downcast_ref::<T>().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn load(&self, table: TableId) -> DomainResult<Vec<Box<dyn EntityEntry>>> {
        Ok(self
            .tables
            .read()
            .await
            .get(&table)
            .cloned()
            .unwrap_or_default())
    }

    async fn commit(&self, changes: ChangeSet) -> DomainResult<usize> {
        let mut tables = self.tables.write().await;
        let mut touched: HashMap<TableId, Table> = HashMap::new();
        let mut affected = 0;

        for change in changes.into_changes() {
            let table = change.table();
            let id = change.id();
            let rows = match touched.entry(table) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(tables.get(&table).cloned().unwrap_or_default()),
            };
            let position = rows.iter().position(|r| r.entity_id() == id);

            match (change.kind(), position) {
                (ChangeKind::Insert, None) => rows.push(change.into_entry()),
                (ChangeKind::Update, Some(i)) => rows[i] = change.into_entry(),
                (ChangeKind::Delete, Some(i)) => {
                    rows.remove(i);
                }
                (ChangeKind::Insert, Some(_)) => {
                    return Err(DomainError::Concurrency {
                        entity_type: table.name(),
                        id,
                        reason: "row already exists".to_string(),
                    });
                }
                (kind, None) => {
                    return Err(DomainError::Concurrency {
                        entity_type: table.name(),
                        id,
                        reason: format!("{kind:?} of a missing row"),
                    });
                }
            }
            affected += 1;
        }

        tables.extend(touched);
        Ok(affected)
    }
}
