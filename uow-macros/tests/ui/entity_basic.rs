use uow_domain::auditable::Auditable;
use uow_domain::entity::Entity;
use uow_macros::entity;
use uuid::Uuid;

#[entity]
struct Customer {
    name: String,
}

#[entity(auditable, type_name = "products")]
#[derive(serde::Serialize)]
struct Product {
    sku: String,
    price_cents: i64,
}

// 已声明 id 的结构体复用原定义
#[entity]
struct Category {
    title: String,
    id: Uuid,
}

fn main() {
    let id = Uuid::new_v4();
    let customer = Customer {
        id,
        name: "alice".into(),
    };
    assert_eq!(customer.id(), id);
    assert_eq!(Customer::TYPE, "Customer");
    assert_eq!(customer.clone().name, "alice");

    let mut product = Product {
        id: Uuid::new_v4(),
        created_at_utc: None,
        modified_at_utc: None,
        sku: "sku-1".into(),
        price_cents: 1999,
    };
    assert_eq!(Product::TYPE, "products");
    let now = chrono::Utc::now();
    product.set_modified_at(now);
    assert_eq!(product.modified_at(), Some(now));
    assert!(product.created_at().is_none());
    assert!(product.as_auditable_mut().is_some());
    assert_eq!(product.price_cents, 1999);

    let json = serde_json::to_value(&product).unwrap();
    assert_eq!(json["sku"], "sku-1");

    let category = Category {
        id,
        title: "books".into(),
    };
    assert_eq!(category.id(), id);
    assert_eq!(category.title, "books");
}
