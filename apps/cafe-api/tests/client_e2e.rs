//! The typed client against a real listener.

use std::net::SocketAddr;

use cafe_api::{build_router, ApiConfig, AppState};
use cafe_client::{CafeClient, Cart, ClientConfig, CustomerDetails, Dashboard, OrderAction};
use cafe_core::action::CreateUser;
use cafe_core::{
    FulfillmentMode, ItemStatus, Location, MenuItem, Money, OrderStatus, PaymentMode, Role,
};
use cafe_db::{Database, DbConfig};

const PUBLIC_KEY: &str = "test-public-key";

fn dish(id: &str, name: &str, price: i64, item_order: i64) -> MenuItem {
    MenuItem {
        item_id: id.to_string(),
        name: name.to_string(),
        category: "Test".to_string(),
        category_order: 1,
        item_order,
        price: Money::new(price),
        available: true,
    }
}

async fn serve() -> SocketAddr {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    for item in [
        dish("masala-chai", "Masala Chai", 30, 1),
        dish("grilled-cheese", "Grilled Cheese", 110, 2),
    ] {
        db.menu().upsert(&item).await.unwrap();
    }
    db.menu()
        .upsert_location(
            &Location {
                location_id: "T1".to_string(),
                name: "Table 1".to_string(),
            },
            1,
        )
        .await
        .unwrap();

    let state = AppState::new(db, ApiConfig::for_tests());
    state.bootstrap_admin().await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> CafeClient {
    CafeClient::new(ClientConfig::new(format!("http://{addr}/exec")).public_api_key(PUBLIC_KEY))
        .unwrap()
}

async fn staff(addr: SocketAddr, admin: &CafeClient, username: &str, role: Role) -> CafeClient {
    admin
        .create_user(CreateUser {
            username: username.to_string(),
            password: "secret-1".to_string(),
            name: username.to_string(),
            role,
        })
        .await
        .unwrap();
    let client = client(addr);
    client.login(username, "secret-1").await.unwrap();
    client
}

#[tokio::test]
async fn test_public_order_to_close() {
    let addr = serve().await;

    // Guest at table 1.
    let guest = client(addr);
    let menu = guest.menu().await.unwrap();
    assert_eq!(menu.len(), 2);
    let locations = guest.locations().await.unwrap();
    let mut cart = Cart::for_table(locations[0].location_id.clone());
    for item in &menu {
        cart.change_qty(item, 1).unwrap();
    }
    cart.change_qty(&menu[0], 1).unwrap();
    let expected = cart.totals().total;
    let created = guest.create_order(cart.build_order().unwrap()).await.unwrap();
    assert_eq!(created.total, expected);
    assert_eq!(created.total, Money::new(170));

    let admin = client(addr);
    let admin_user = admin.login("admin", "admin-pass").await.unwrap();
    assert_eq!(admin_user.role, Role::Admin);

    // Kitchen starts and finishes the food.
    let kitchen = staff(addr, &admin, "kavya", Role::Kitchen).await;
    let user = kitchen.session().current().await.unwrap();
    let mut board = Dashboard::new(kitchen, user);
    board.refresh().await.unwrap();
    assert_eq!(board.visible_orders().len(), 1);
    let order = board.visible_orders()[0].clone();
    assert_eq!(
        board.actions_for(&order),
        vec![OrderAction::Advance {
            to: OrderStatus::Preparing
        }]
    );
    board
        .advance(&created.order_id, OrderStatus::Preparing)
        .await
        .unwrap();
    for item in order.food_items() {
        board
            .set_item_status(&created.order_id, &item.item_id, ItemStatus::Ready)
            .await
            .unwrap();
    }
    assert_eq!(
        board.order(&created.order_id).unwrap().status,
        OrderStatus::Ready
    );

    // Waiter serves everything at once.
    let waiter = staff(addr, &admin, "wasim", Role::Waiter).await;
    let user = waiter.session().current().await.unwrap();
    let mut floor = Dashboard::new(waiter, user);
    floor.refresh().await.unwrap();
    assert!(floor.select_tab(OrderStatus::Ready));
    let report = floor.serve_all(&created.order_id).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.updated, 2);
    assert_eq!(
        floor.order(&created.order_id).unwrap().status,
        OrderStatus::Served
    );

    // Manager closes with a discount.
    let manager = staff(addr, &admin, "mira", Role::Manager).await;
    let user = manager.session().current().await.unwrap();
    let mut desk = Dashboard::new(manager, user);
    desk.refresh().await.unwrap();
    let mut form = desk.open_close(&created.order_id).unwrap();
    form.set_percent(10.0);
    form.set_payment_mode(PaymentMode::Card);
    let closed = desk.close(&form).await.unwrap();
    assert_eq!(closed.discount_amount, Money::new(17));
    assert_eq!(closed.final_amount, Money::new(153));
    assert_eq!(
        desk.order(&created.order_id).unwrap().status,
        OrderStatus::Closed
    );

    desk.logout().await.unwrap();
    assert!(desk.is_logged_out());
}

#[tokio::test]
async fn test_delivery_cart_and_rejections() {
    let addr = serve().await;
    let guest = client(addr);
    let menu = guest.menu().await.unwrap();

    let mut cart = Cart::online();
    cart.change_qty(&menu[1], 2).unwrap();
    cart.set_customer(CustomerDetails {
        name: "Asha".to_string(),
        mobile: "9876543210".to_string(),
        address: "12 Lake Road".to_string(),
    });
    assert_eq!(cart.totals().delivery_fee, Money::new(50));
    let created = guest.create_order(cart.build_order().unwrap()).await.unwrap();
    assert_eq!(created.total, Money::new(270));

    // Staff reads need a session; nothing is sent without one.
    let err = guest.orders().await.unwrap_err();
    assert!(err.is_unauthorized());

    let admin = client(addr);
    admin.login("admin", "admin-pass").await.unwrap();
    let waiter = staff(addr, &admin, "wren", Role::Waiter).await;

    // A waiter cannot start cooking.
    let err = waiter
        .update_order_status(&created.order_id, OrderStatus::Preparing, true)
        .await
        .unwrap_err();
    assert!(!err.is_unauthorized());
    assert!(waiter.session().is_logged_in().await);

    let orders = admin.orders().await.unwrap();
    let stored = orders
        .iter()
        .find(|o| o.order_id == created.order_id)
        .unwrap();
    assert_eq!(stored.mode, FulfillmentMode::Delivery);
    assert!(stored.delivery_fee_item().is_some());
}

#[tokio::test]
async fn test_revoked_session_clears_store() {
    let addr = serve().await;
    let admin = client(addr);
    admin.login("admin", "admin-pass").await.unwrap();
    let kitchen = staff(addr, &admin, "kiran", Role::Kitchen).await;

    admin
        .admin_reset_password("kiran", "another-pass")
        .await
        .unwrap();

    let err = kitchen.orders().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!kitchen.session().is_logged_in().await);
}
