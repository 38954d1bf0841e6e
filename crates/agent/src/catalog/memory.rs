//! In-memory catalog seeded with demo data.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use shopdesk_core::{
    Category, Customer, CustomerId, CustomerRole, Email, Order, OrderId, OrderLine, OrderStatus,
    Price, Product, ProductId,
};

use super::{CatalogError, CatalogRepository};

/// Catalog held in process memory. Products are fixed; order history grows
/// as orders are placed and is lost on exit.
#[derive(Debug)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
    customers: RwLock<Vec<Customer>>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(products: Vec<Product>, customers: Vec<Customer>) -> Self {
        Self {
            products,
            customers: RwLock::new(customers),
        }
    }

    /// Demo store: a small apparel catalog, one shopper with past orders,
    /// and one staff account.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(demo_products(), demo_customers())
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn products(&self) -> Vec<Product> {
        self.products.clone()
    }

    fn product(&self, id: ProductId) -> Option<Product> {
        self.products.iter().find(|p| p.id == id).cloned()
    }

    fn customers(&self) -> Vec<Customer> {
        self.customers.read().clone()
    }

    fn customer(&self, id: CustomerId) -> Option<Customer> {
        self.customers.read().iter().find(|c| c.id == id).cloned()
    }

    fn orders_for(&self, id: CustomerId) -> Vec<Order> {
        self.customers
            .read()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.orders.clone())
            .unwrap_or_default()
    }

    fn record_order(&self, customer_id: CustomerId, order: Order) -> Result<(), CatalogError> {
        let mut customers = self.customers.write();
        let customer = customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or(CatalogError::UnknownCustomer(customer_id))?;
        customer.record_order(order);
        Ok(())
    }
}

fn product(
    id: i32,
    name: &str,
    category: Category,
    cents: i64,
    in_stock: bool,
    rating: f32,
    review_count: u32,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category,
        price: Price::usd_cents(cents),
        in_stock,
        rating,
        review_count,
    }
}

fn demo_products() -> Vec<Product> {
    vec![
        product(1, "Classic T-Shirt", Category::Tops, 2000, true, 4.5, 128),
        product(2, "Slim Fit Jeans", Category::Bottoms, 5000, true, 4.3, 96),
        product(3, "Running Sneakers", Category::Footwear, 8900, true, 4.7, 210),
        product(4, "Rain Shell Jacket", Category::Outerwear, 12000, true, 4.2, 54),
        product(5, "Leather Belt", Category::Accessories, 3500, true, 4.4, 77),
        product(6, "Linen Button-Down", Category::Tops, 4500, false, 4.1, 33),
        product(7, "Chino Shorts", Category::Bottoms, 3800, true, 4.0, 41),
        product(8, "Suede Chelsea Boots", Category::Footwear, 14000, true, 4.6, 62),
        product(9, "Wool Overcoat", Category::Outerwear, 22000, false, 4.8, 19),
        product(10, "Knit Beanie", Category::Accessories, 1800, true, 4.2, 88),
        product(11, "Graphic Hoodie", Category::Tops, 5500, true, 4.4, 150),
    ]
}

fn seed_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(10, 30, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn demo_customers() -> Vec<Customer> {
    let seeds = [
        (
            1,
            "Alex Rivera",
            "alex.rivera@example.com",
            CustomerRole::Customer,
            vec![
                Order {
                    id: OrderId::new("ORD-3A9F4D17"),
                    created_at: seed_date(2025, 10, 5),
                    status: OrderStatus::Shipped,
                    items: vec![
                        OrderLine {
                            product_id: ProductId::new(1),
                            quantity: 2,
                        },
                        OrderLine {
                            product_id: ProductId::new(10),
                            quantity: 1,
                        },
                    ],
                    total: Price::usd_cents(5800),
                },
                Order {
                    id: OrderId::new("ORD-5C1E8B20"),
                    created_at: seed_date(2025, 9, 2),
                    status: OrderStatus::Delivered,
                    items: vec![OrderLine {
                        product_id: ProductId::new(3),
                        quantity: 1,
                    }],
                    total: Price::usd_cents(8900),
                },
            ],
        ),
        (
            2,
            "Jordan Lee",
            "jordan.lee@shopdesk.example",
            CustomerRole::Admin,
            Vec::new(),
        ),
    ];

    seeds
        .into_iter()
        .filter_map(|(id, name, email, role, orders)| match Email::parse(email) {
            Ok(email) => Some(Customer {
                id: CustomerId::new(id),
                name: name.to_string(),
                email,
                role,
                orders,
            }),
            Err(e) => {
                tracing::warn!(customer = name, error = %e, "skipping demo customer with invalid email");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_seed() {
        let catalog = InMemoryCatalog::demo();
        assert_eq!(catalog.customers().len(), 2);

        let shirt = catalog.product(ProductId::new(1)).expect("shirt");
        assert_eq!(shirt.name, "Classic T-Shirt");
        assert_eq!(shirt.price, Price::usd_cents(2000));

        let jeans = catalog.product(ProductId::new(2)).expect("jeans");
        assert_eq!(jeans.price, Price::usd_cents(5000));

        let roles: Vec<_> = catalog.customers().iter().map(|c| c.role).collect();
        assert_eq!(roles, vec![CustomerRole::Customer, CustomerRole::Admin]);
    }

    #[test]
    fn test_seeded_history_is_most_recent_first() {
        let catalog = InMemoryCatalog::demo();
        let orders = catalog.orders_for(CustomerId::new(1));
        assert_eq!(orders.len(), 2);
        assert!(orders[0].created_at > orders[1].created_at);
    }

    #[test]
    fn test_record_order_prepends() {
        let catalog = InMemoryCatalog::demo();
        let order = Order {
            id: OrderId::new("ORD-00000001"),
            created_at: Utc::now(),
            status: OrderStatus::Processing,
            items: vec![OrderLine {
                product_id: ProductId::new(2),
                quantity: 1,
            }],
            total: Price::usd_cents(5000),
        };
        catalog
            .record_order(CustomerId::new(1), order.clone())
            .expect("record");
        let orders = catalog.orders_for(CustomerId::new(1));
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0], order);
    }

    #[test]
    fn test_record_order_unknown_customer() {
        let catalog = InMemoryCatalog::demo();
        let order = Order {
            id: OrderId::new("ORD-00000002"),
            created_at: Utc::now(),
            status: OrderStatus::Processing,
            items: Vec::new(),
            total: Price::usd_cents(0),
        };
        let err = catalog.record_order(CustomerId::new(42), order).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownCustomer(id) if id == CustomerId::new(42)));
    }
}
