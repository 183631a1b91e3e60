mod domain_event;
mod entity;
mod utils;

use entity::EntityKind;
use proc_macro::TokenStream;

/// 实体宏
/// - 追加字段 `id: Uuid`（若缺失）并置于字段最前
/// - `#[entity(auditable)]` 追加 `created_at_utc` / `modified_at_utc` 并实现 `Auditable`
/// - `#[entity(type_name = "...")]` 覆写 `Entity::TYPE`
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item, EntityKind::Entity)
}

/// 聚合根宏
/// - 与 `#[entity]` 相同，另追加 `domain_events` 缓冲并实现 `AggregateRoot`
#[proc_macro_attribute]
pub fn aggregate_root(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item, EntityKind::AggregateRoot)
}

/// 领域事件宏
/// - 适用于结构体或枚举，生成 `DomainEvent` 实现
/// - 参见 `#[domain_event(event_type = "...", version = N)]` 与变体级 `#[event(...)]`
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}
