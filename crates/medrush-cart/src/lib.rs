//! Local order state: the cart, saved delivery addresses and checkout checks.

pub mod address;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod store;

pub use address::{AddressBook, SavedAddress, SAVED_ADDRESSES_KEY};
pub use cart::{CartLineItem, CartStore, CART_KEY, MAX_QUANTITY_PER_ITEM};
pub use checkout::{
    default_coupons, find_coupon, summarize, validate_card, CardDetails, CheckoutSummary, Coupon,
    CouponDiscount, DeliveryPolicy,
};
pub use error::{StoreError, ValidationError};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
