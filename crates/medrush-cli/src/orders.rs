//! `order` and `emergency` command handlers: everything that syncs with the
//! admin dashboard.

use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use medrush_cart::{AddressBook, CartStore, KeyValueStore, StoreError};
use medrush_core::{AppConfig, ResolvedAddress};
use medrush_dashboard::{
    CreateOrderRequest, DashboardClient, DashboardResponse, EmergencyRequest, OrderLine, OrderStatus,
    RetryPolicy, UpdateOrderStatusRequest,
};
use medrush_geo::{acquire, locate_and_resolve};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Subcommand)]
pub enum OrderCommands {
    /// Place an order for the current cart, delivered to the default address
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        coupon: Option<String>,
        #[arg(long, default_value = "cod")]
        payment: String,
    },
    /// Resend orders that were queued while the dashboard was unreachable
    Sync,
    /// Push a status change for an order
    Status {
        order_id: String,
        status: OrderStatus,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum EmergencyCommands {
    /// Ask for an emergency delivery at the current position
    Request {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        description: String,
        /// Sensor replay script; without it the default saved address is used
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Check the ETA of an emergency request
    Eta { request_id: String },
}

/// Orders the dashboard did not accept, waiting for `medrush order sync`.
pub(crate) const PENDING_ORDERS_KEY: &str = "pending_orders";

/// Appends `order` to the pending queue and returns the queue length.
pub(crate) fn queue_pending_order<S: KeyValueStore>(
    store: &S,
    order: &CreateOrderRequest,
) -> Result<usize, StoreError> {
    let mut pending: Vec<CreateOrderRequest> = store.get(PENDING_ORDERS_KEY)?.unwrap_or_default();
    pending.push(order.clone());
    store.set(PENDING_ORDERS_KEY, &pending)?;
    tracing::info!(order_id = %order.order_id, pending = pending.len(), "order queued for sync");
    Ok(pending.len())
}

/// Records the outcome of placing `order` and empties the cart. An order the
/// dashboard did not take is queued first, so the cart is only cleared once
/// the order exists somewhere. Returns the queue length when it was queued.
pub(crate) fn settle_order<S: KeyValueStore, C: KeyValueStore>(
    store: &S,
    cart: &mut CartStore<C>,
    order: &CreateOrderRequest,
    response: &DashboardResponse,
) -> Result<Option<usize>, StoreError> {
    let queued = if response.local_only {
        Some(queue_pending_order(store, order)?)
    } else {
        None
    };
    cart.clear()?;
    Ok(queued)
}

/// Resends every queued order. Orders the dashboard still does not accept
/// stay queued. Returns `(sent, still_pending)`.
pub(crate) async fn sync_pending_orders<S: KeyValueStore>(
    store: &S,
    dashboard: &DashboardClient,
) -> Result<(usize, usize), StoreError> {
    let pending: Vec<CreateOrderRequest> = store.get(PENDING_ORDERS_KEY)?.unwrap_or_default();
    let mut remaining = Vec::new();
    let mut sent = 0;
    for order in pending {
        match dashboard.try_create_order(&order).await {
            Ok(_) => sent += 1,
            Err(e) => {
                tracing::warn!(order_id = %order.order_id, error = %e, "order still not accepted");
                remaining.push(order);
            }
        }
    }
    if remaining.is_empty() {
        store.remove(PENDING_ORDERS_KEY)?;
    } else {
        store.set(PENDING_ORDERS_KEY, &remaining)?;
    }
    Ok((sent, remaining.len()))
}

fn dashboard_client(config: &AppConfig) -> anyhow::Result<DashboardClient> {
    let client = DashboardClient::new(
        &config.dashboard_url,
        config.http_timeout_secs,
        &config.user_agent,
    )?
    .with_retry_policy(RetryPolicy::from_millis(
        config.dashboard_max_retries,
        config.dashboard_backoff_base_ms,
        config.dashboard_backoff_cap_ms,
    ));
    Ok(client)
}

/// # Errors
///
/// Returns an error if the cart is empty, there is no default address, the
/// coupon is invalid, or local state cannot be read or written. Dashboard
/// failures do not error; the order is queued under [`PENDING_ORDERS_KEY`].
pub(crate) async fn run_order(config: &AppConfig, command: OrderCommands) -> anyhow::Result<()> {
    let dashboard = dashboard_client(config)?;
    match command {
        OrderCommands::Create {
            name,
            phone,
            coupon,
            payment,
        } => {
            let store = crate::open_store(config)?;
            let mut cart = CartStore::load(&store)?;
            if cart.is_empty() {
                anyhow::bail!("cart is empty; add items with `medrush cart add`");
            }
            let address = AddressBook::new(&store)
                .default_address()?
                .ok_or_else(|| {
                    anyhow::anyhow!("no default address; save one with `medrush address save`")
                })?
                .address;
            let summary = crate::commerce::price_cart(cart.subtotal()?, coupon.as_deref())?;

            let order = CreateOrderRequest {
                order_id: format!("ord-{}", Uuid::new_v4().simple()),
                customer_name: name,
                phone,
                delivery_address: address.full_address,
                latitude: address.latitude,
                longitude: address.longitude,
                items: cart
                    .items()
                    .iter()
                    .map(|i| OrderLine {
                        product_id: i.id.clone(),
                        name: i.name.clone(),
                        quantity: i.quantity,
                        strip_quantity: i.strip_quantity,
                        unit_price: i.effective_price(),
                    })
                    .collect(),
                subtotal: summary.subtotal,
                discount: summary.discount,
                delivery_fee: summary.delivery_fee,
                total: summary.total,
                prescription_required: cart.requires_prescription(),
                payment_method: payment,
                placed_at: Utc::now().to_rfc3339(),
            };

            let response = dashboard.create_order(&order).await;
            println!("order {} placed, total {}", order.order_id, order.total.round_dp(2));
            match settle_order(&store, &mut cart, &order, &response)? {
                Some(pending) => println!(
                    "dashboard unreachable; order queued ({pending} pending), run `medrush order sync` later"
                ),
                None => print_response(&response),
            }
        }
        OrderCommands::Sync => {
            let store = crate::open_store(config)?;
            let (sent, pending) = sync_pending_orders(&store, &dashboard).await?;
            println!("{sent} order(s) sent, {pending} still pending");
        }
        OrderCommands::Status {
            order_id,
            status,
            note,
        } => {
            let response = dashboard
                .update_order_status(&UpdateOrderStatusRequest {
                    order_id,
                    status,
                    note,
                })
                .await;
            print_response(&response);
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the sensor script or saved addresses cannot be read.
pub(crate) async fn run_emergency(
    config: &AppConfig,
    command: EmergencyCommands,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let dashboard = dashboard_client(config)?;
    match command {
        EmergencyCommands::Request {
            name,
            phone,
            description,
            script,
        } => {
            let Some(address) = emergency_location(config, script.as_deref(), cancel).await? else {
                println!("cancelled");
                return Ok(());
            };
            let request = EmergencyRequest {
                request_id: format!("em-{}", Uuid::new_v4().simple()),
                patient_name: name,
                phone,
                latitude: address.latitude,
                longitude: address.longitude,
                address: address.full_address,
                description,
                requested_at: Utc::now().to_rfc3339(),
            };
            let response = dashboard.request_emergency(&request).await;
            println!("emergency request {}", request.request_id);
            print_response(&response);
        }
        EmergencyCommands::Eta { request_id } => {
            let response = dashboard.emergency_eta(&request_id).await;
            match response
                .data
                .as_ref()
                .and_then(|d| d.get("etaMinutes"))
                .and_then(serde_json::Value::as_u64)
            {
                Some(minutes) => println!("ETA: {minutes} min"),
                None => println!("ETA not available yet"),
            }
            print_response(&response);
        }
    }
    Ok(())
}

/// Where to send help: the acquired position when a script is given,
/// otherwise the default saved address, otherwise the configured fallback.
/// `None` means the acquisition was cancelled.
async fn emergency_location(
    config: &AppConfig,
    script: Option<&std::path::Path>,
    cancel: &CancellationToken,
) -> anyhow::Result<Option<ResolvedAddress>> {
    if let Some(script) = script {
        let sensor = crate::location::load_sensor(script)?;
        let options = crate::acquire_options(config, false);
        if let Ok(geocoder) = crate::geocoding_client(config) {
            let located = locate_and_resolve(&sensor, &geocoder, &options, cancel).await;
            return Ok(located.map(|l| l.address));
        }
        tracing::warn!("no maps API key; sending coordinates without an address");
        let fix = acquire(&sensor, &options, cancel).await.into_fix();
        return Ok(fix.map(|f| ResolvedAddress::unknown_at(f.sample.latitude, f.sample.longitude)));
    }

    let store = crate::open_store(config)?;
    if let Some(saved) = AddressBook::new(&store).default_address()? {
        return Ok(Some(saved.address));
    }
    let fallback = config.fallback_location;
    Ok(Some(ResolvedAddress::unknown_at(
        fallback.latitude,
        fallback.longitude,
    )))
}

fn print_response(response: &DashboardResponse) {
    if response.local_only {
        println!("(dashboard unreachable; not synced)");
        return;
    }
    if let Some(message) = &response.message {
        println!("dashboard: {message}");
    }
    if !response.success {
        println!("dashboard reported failure");
    }
}
