use uow_domain::aggregate_root::AggregateRoot;
use uow_domain::domain_event::DomainEvent;
use uow_domain::entity::Entity;
use uow_macros::{aggregate_root, domain_event};
use uuid::Uuid;

#[aggregate_root(auditable, type_name = "orders")]
#[derive(serde::Serialize)]
struct Order {
    total_cents: i64,
}

#[domain_event(event_type = "order.placed", version = 3)]
struct OrderPlaced {
    order_id: Uuid,
    total_cents: i64,
}

fn main() {
    let mut order = Order {
        id: Uuid::new_v4(),
        created_at_utc: None,
        modified_at_utc: None,
        domain_events: Default::default(),
        total_cents: 500,
    };
    assert_eq!(Order::TYPE, "orders");

    let placed = OrderPlaced {
        order_id: order.id(),
        total_cents: order.total_cents,
    };
    assert_eq!(placed.event_type(), "order.placed");
    assert_eq!(placed.event_version(), 3);
    order.raise(placed.clone());

    assert_eq!(order.domain_events().len(), 1);
    assert!(order.event_buffer_mut().is_some());
    assert!(order.as_auditable_mut().is_some());

    // 事件缓冲不参与序列化
    let json = serde_json::to_value(&order).unwrap();
    assert!(json.get("domain_events").is_none());
    assert_eq!(json["total_cents"], 500);

    let drained = order.take_domain_events();
    assert_eq!(drained[0].payload().unwrap()["total_cents"], 500);
    assert!(order.domain_events().is_empty());
}
