//! `cart`, `address` and `checkout` command handlers. All state lives in the
//! JSON file store under `MEDRUSH_DATA_DIR`.

use chrono::Local;
use clap::Subcommand;
use medrush_cart::{
    default_coupons, find_coupon, summarize, validate_card, AddressBook, CardDetails, CartLineItem,
    CartStore, CheckoutSummary, DeliveryPolicy, JsonFileStore, ValidationError,
};
use medrush_core::AppConfig;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Subcommand)]
pub enum CartCommands {
    /// Add a product, or bump its quantity if already present
    Add {
        id: String,
        name: String,
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        discount_price: Option<Decimal>,
        #[arg(long, default_value = "1")]
        quantity: u32,
        #[arg(long, default_value = "1")]
        strips: u32,
        /// Product needs a prescription
        #[arg(long)]
        rx: bool,
    },
    /// Set a line's quantity; zero or less removes it
    SetQty {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set a line's strip count
    SetStrips { id: String, strips: i64 },
    Remove { id: String },
    List,
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum AddressCommands {
    List,
    /// Look up an address and save it
    Save {
        label: String,
        /// Free-text address to geocode
        #[arg(long)]
        query: String,
        /// Make this the default delivery address
        #[arg(long)]
        default: bool,
    },
    Remove { id: Uuid },
    /// Make an address the default
    Default { id: Uuid },
}

#[derive(Debug, Subcommand)]
pub enum CheckoutCommands {
    /// Check card number, expiry and CVV
    Card {
        number: String,
        /// MM/YY
        expiry: String,
        cvv: String,
    },
    /// Price the current cart
    Summary {
        #[arg(long)]
        coupon: Option<String>,
    },
}

/// # Errors
///
/// Returns an error if the cart cannot be loaded or persisted.
pub(crate) fn run_cart(config: &AppConfig, command: CartCommands) -> anyhow::Result<()> {
    let mut cart = CartStore::load(crate::open_store(config)?)?;
    match command {
        CartCommands::Add {
            id,
            name,
            price,
            discount_price,
            quantity,
            strips,
            rx,
        } => {
            let mut item = CartLineItem::new(id, name, price)
                .with_quantity(quantity)
                .with_strip_quantity(strips)
                .prescription_required(rx);
            item.discount_price = discount_price;
            cart.add_item(item)?;
        }
        CartCommands::SetQty { id, quantity } => {
            if !cart.set_quantity(&id, quantity)? {
                println!("no cart line with id {id}");
            }
        }
        CartCommands::SetStrips { id, strips } => {
            if !cart.set_strip_quantity(&id, strips)? {
                println!("no cart line with id {id}");
            }
        }
        CartCommands::Remove { id } => {
            if !cart.remove_item(&id)? {
                println!("no cart line with id {id}");
            }
        }
        CartCommands::Clear => cart.clear()?,
        CartCommands::List => {}
    }
    print_cart(&cart);
    Ok(())
}

fn print_cart(cart: &CartStore<JsonFileStore>) {
    if cart.is_empty() {
        println!("cart is empty");
        return;
    }
    println!(
        "{:<12}{:<32}{:>5}{:>7}{:>12}",
        "ID", "NAME", "QTY", "STRIPS", "TOTAL"
    );
    for item in cart.items() {
        let name = if item.prescription_required {
            format!("{} (Rx)", item.name)
        } else {
            item.name.clone()
        };
        println!(
            "{:<12}{:<32}{:>5}{:>7}{:>12}",
            item.id,
            name,
            item.quantity,
            item.strip_quantity,
            format_amount(item.line_total())
        );
    }
    println!(
        "{} unit(s), subtotal {}",
        cart.item_count(),
        format_amount(cart.subtotal())
    );
    if cart.requires_prescription() {
        println!("a prescription upload is required at checkout");
    }
}

fn format_amount(amount: Result<Decimal, ValidationError>) -> String {
    match amount {
        Ok(amount) => amount.round_dp(2).to_string(),
        Err(e) => format!("({e})"),
    }
}

/// # Errors
///
/// Returns an error if the address list cannot be read or written, or if
/// geocoding fails when saving.
pub(crate) async fn run_address(config: &AppConfig, command: AddressCommands) -> anyhow::Result<()> {
    let book = AddressBook::new(crate::open_store(config)?);
    match command {
        AddressCommands::List => {}
        AddressCommands::Save {
            label,
            query,
            default,
        } => {
            let geocoder = crate::geocoding_client(config)?;
            let address = geocoder.search_address(&query).await?;
            let saved = book.save(&label, address, default)?;
            println!("saved {} as {}", saved.label, saved.id);
        }
        AddressCommands::Remove { id } => {
            if !book.remove(id)? {
                println!("no saved address with id {id}");
            }
        }
        AddressCommands::Default { id } => book.set_default(id)?,
    }

    let entries = book.list()?;
    if entries.is_empty() {
        println!("no saved addresses");
    }
    for entry in entries {
        println!(
            "{} {:<10} {}{}",
            entry.id,
            entry.label,
            entry.address.full_address,
            if entry.is_default { "  [default]" } else { "" }
        );
    }
    Ok(())
}

/// # Errors
///
/// Returns an error for invalid card details, an unknown or inapplicable
/// coupon, or an empty cart.
pub(crate) fn run_checkout(config: &AppConfig, command: CheckoutCommands) -> anyhow::Result<()> {
    match command {
        CheckoutCommands::Card {
            number,
            expiry,
            cvv,
        } => {
            let card = CardDetails {
                number,
                expiry,
                cvv,
            };
            validate_card(&card, Local::now().date_naive())?;
            println!("card details look valid");
        }
        CheckoutCommands::Summary { coupon } => {
            let cart = CartStore::load(crate::open_store(config)?)?;
            let summary = price_cart(cart.subtotal()?, coupon.as_deref())?;
            print_summary(&summary);
        }
    }
    Ok(())
}

/// Prices `subtotal` with an optional coupon under the default delivery policy.
pub(crate) fn price_cart(
    subtotal: Decimal,
    coupon: Option<&str>,
) -> Result<CheckoutSummary, ValidationError> {
    let coupons = default_coupons();
    let coupon = coupon.map(|code| find_coupon(&coupons, code)).transpose()?;
    summarize(subtotal, coupon, &DeliveryPolicy::default())
}

fn print_summary(summary: &CheckoutSummary) {
    println!("subtotal     {:>10}", summary.subtotal.round_dp(2));
    if let Some(code) = &summary.coupon_code {
        println!("coupon {code:<6}-{:>10}", summary.discount.round_dp(2));
    }
    println!("delivery     {:>10}", summary.delivery_fee.round_dp(2));
    println!("total        {:>10}", summary.total.round_dp(2));
}
