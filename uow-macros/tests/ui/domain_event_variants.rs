use uow_domain::domain_event::DomainEvent;
use uow_macros::domain_event;

// 单元变体
#[domain_event]
enum AccountEvent {
    Activated,
    Deactivated,
}

// 混合变体与属性覆写
#[domain_event(version = 2)]
enum ShipmentEvent {
    Created,
    Moved(String),
    Delivered { signed_by: String },
    #[event(event_type = "shipment.lost", event_version = 5)]
    Lost,
}

fn main() {
    assert_eq!(AccountEvent::Activated.event_type(), "AccountEvent.Activated");
    assert_eq!(AccountEvent::Deactivated.event_version(), 1);
    assert_ne!(AccountEvent::Activated, AccountEvent::Deactivated);

    let moved = ShipmentEvent::Moved("hub-7".into());
    assert_eq!(moved.event_type(), "ShipmentEvent.Moved");
    assert_eq!(moved.event_version(), 2);
    assert_eq!(moved.payload().unwrap()["Moved"], "hub-7");

    let delivered = ShipmentEvent::Delivered {
        signed_by: "bob".into(),
    };
    assert_eq!(delivered.event_type(), "ShipmentEvent.Delivered");

    assert_eq!(ShipmentEvent::Lost.event_type(), "shipment.lost");
    assert_eq!(ShipmentEvent::Lost.event_version(), 5);
    assert_eq!(ShipmentEvent::Created.event_version(), 2);
}
