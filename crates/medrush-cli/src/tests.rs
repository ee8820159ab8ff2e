use super::*;
use rust_decimal::Decimal;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["medrush"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_locate_with_flags() {
    let cli = Cli::try_parse_from([
        "medrush",
        "locate",
        "--script",
        "walk.json",
        "--resolve",
        "--no-delays",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Locate {
            ref script,
            resolve: true,
            no_delays: true,
        }) if script == &PathBuf::from("walk.json")
    ));
}

#[test]
fn locate_requires_script() {
    assert!(Cli::try_parse_from(["medrush", "locate"]).is_err());
}

#[test]
fn parses_reverse_geocode_with_negative_coordinates() {
    let cli = Cli::try_parse_from(["medrush", "geocode", "reverse", "-33.8688", "151.2093"]).unwrap();
    match cli.command {
        Some(Commands::Geocode {
            command: GeocodeCommands::Reverse {
                latitude,
                longitude,
            },
        }) => {
            assert!((latitude + 33.8688).abs() < f64::EPSILON);
            assert!((longitude - 151.2093).abs() < f64::EPSILON);
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}

#[test]
fn parses_cart_add_with_prices() {
    let cli = Cli::try_parse_from([
        "medrush",
        "cart",
        "add",
        "med-002",
        "Amoxicillin 500mg",
        "--price",
        "120.00",
        "--discount-price",
        "99.50",
        "--strips",
        "2",
        "--rx",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::Cart {
            command:
                CartCommands::Add {
                    id,
                    price,
                    discount_price,
                    quantity,
                    strips,
                    rx,
                    ..
                },
        }) => {
            assert_eq!(id, "med-002");
            assert_eq!(price, Decimal::new(12000, 2));
            assert_eq!(discount_price, Some(Decimal::new(9950, 2)));
            assert_eq!(quantity, 1);
            assert_eq!(strips, 2);
            assert!(rx);
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}

#[test]
fn parses_cart_set_qty_negative() {
    let cli = Cli::try_parse_from(["medrush", "cart", "set-qty", "med-001", "-1"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::SetQty { quantity: -1, .. }
        })
    ));
}

#[test]
fn parses_order_status() {
    let cli =
        Cli::try_parse_from(["medrush", "order", "status", "ord-1", "out_for_delivery"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Order {
            command: OrderCommands::Status {
                status: medrush_dashboard::OrderStatus::OutForDelivery,
                ..
            }
        })
    ));
}

#[test]
fn rejects_unknown_order_status() {
    assert!(Cli::try_parse_from(["medrush", "order", "status", "ord-1", "lost"]).is_err());
}

#[test]
fn parses_address_default_with_uuid() {
    let id = "7f1c2a9e-3b4d-4e5f-8a6b-1c2d3e4f5a6b";
    let cli = Cli::try_parse_from(["medrush", "address", "default", id]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Address {
            command: AddressCommands::Default { id: parsed }
        }) if parsed.to_string() == id
    ));
}

#[test]
fn parses_emergency_request_without_script() {
    let cli = Cli::try_parse_from([
        "medrush",
        "emergency",
        "request",
        "--name",
        "R. Kumar",
        "--phone",
        "+91 90000 00000",
        "--description",
        "chest pain",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Emergency {
            command: EmergencyCommands::Request { script: None, .. }
        })
    ));
}

#[test]
fn price_cart_applies_known_coupon() {
    let summary = commerce::price_cart(Decimal::new(250, 0), Some("first20")).unwrap();
    assert_eq!(summary.discount, Decimal::new(50, 0));
    assert_eq!(summary.total, Decimal::new(240, 0));
}

#[test]
fn price_cart_rejects_unknown_coupon() {
    assert!(commerce::price_cart(Decimal::new(250, 0), Some("NOPE")).is_err());
}

fn sample_order(order_id: &str) -> medrush_dashboard::CreateOrderRequest {
    medrush_dashboard::CreateOrderRequest {
        order_id: order_id.to_owned(),
        customer_name: "R. Kumar".to_owned(),
        phone: "+91 90000 00000".to_owned(),
        delivery_address: "12 MG Road, Bengaluru".to_owned(),
        latitude: 12.9716,
        longitude: 77.5946,
        items: vec![medrush_dashboard::OrderLine {
            product_id: "med-001".to_owned(),
            name: "Paracetamol 650mg".to_owned(),
            quantity: 2,
            strip_quantity: 1,
            unit_price: Decimal::new(3000, 2),
        }],
        subtotal: Decimal::new(6000, 2),
        discount: Decimal::ZERO,
        delivery_fee: Decimal::new(40, 0),
        total: Decimal::new(10000, 2),
        prescription_required: false,
        payment_method: "cod".to_owned(),
        placed_at: "2026-10-18T09:30:00+05:30".to_owned(),
    }
}

fn dashboard_response(local_only: bool) -> medrush_dashboard::DashboardResponse {
    medrush_dashboard::DashboardResponse {
        success: true,
        message: None,
        data: None,
        local_only,
    }
}

fn cart_with_one_line(store: &medrush_cart::MemoryStore) -> medrush_cart::CartStore<&medrush_cart::MemoryStore> {
    let mut cart = medrush_cart::CartStore::load(store).unwrap();
    cart.add_item(medrush_cart::CartLineItem::new(
        "med-001",
        "Paracetamol 650mg",
        Decimal::new(3000, 2),
    ))
    .unwrap();
    cart
}

fn pending(store: &medrush_cart::MemoryStore) -> Vec<medrush_dashboard::CreateOrderRequest> {
    use medrush_cart::KeyValueStore;
    store
        .get(orders::PENDING_ORDERS_KEY)
        .unwrap()
        .unwrap_or_default()
}

#[test]
fn undelivered_order_is_queued_before_cart_is_cleared() {
    let store = medrush_cart::MemoryStore::new();
    let mut cart = cart_with_one_line(&store);
    let order = sample_order("ord-1");

    let queued = orders::settle_order(&store, &mut cart, &order, &dashboard_response(true)).unwrap();

    assert_eq!(queued, Some(1));
    assert!(cart.is_empty());
    assert_eq!(pending(&store), vec![order]);
}

#[test]
fn queued_orders_accumulate() {
    let store = medrush_cart::MemoryStore::new();
    let mut cart = cart_with_one_line(&store);
    orders::settle_order(&store, &mut cart, &sample_order("ord-1"), &dashboard_response(true)).unwrap();
    let queued =
        orders::settle_order(&store, &mut cart, &sample_order("ord-2"), &dashboard_response(true)).unwrap();

    assert_eq!(queued, Some(2));
    let ids: Vec<String> = pending(&store).into_iter().map(|o| o.order_id).collect();
    assert_eq!(ids, vec!["ord-1".to_string(), "ord-2".to_string()]);
}

#[test]
fn accepted_order_is_not_queued() {
    let store = medrush_cart::MemoryStore::new();
    let mut cart = cart_with_one_line(&store);

    let queued =
        orders::settle_order(&store, &mut cart, &sample_order("ord-1"), &dashboard_response(false)).unwrap();

    assert_eq!(queued, None);
    assert!(cart.is_empty());
    assert!(pending(&store).is_empty());
}

#[tokio::test]
async fn sync_keeps_orders_the_dashboard_did_not_take() {
    let store = medrush_cart::MemoryStore::new();
    orders::queue_pending_order(&store, &sample_order("ord-1")).unwrap();
    let dashboard = medrush_dashboard::DashboardClient::new("http://127.0.0.1:1/api", 2, "medrush-test")
        .unwrap()
        .with_retry_policy(medrush_dashboard::RetryPolicy::from_millis(0, 0, 0));

    let (sent, still_pending) = orders::sync_pending_orders(&store, &dashboard).await.unwrap();

    assert_eq!((sent, still_pending), (0, 1));
    assert_eq!(pending(&store).len(), 1);
}

#[test]
fn parses_order_sync() {
    let cli = Cli::try_parse_from(["medrush", "order", "sync"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Order {
            command: OrderCommands::Sync
        })
    ));
}
