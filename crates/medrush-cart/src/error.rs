use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored value for key '{key}' is not valid: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid store key '{0}'")]
    InvalidKey(String),

    #[error("no saved address with id {0}")]
    AddressNotFound(String),
}

/// Checkout input rejected locally. Shown inline next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("card number must be 13 to 19 digits")]
    CardNumberLength,

    #[error("card number contains invalid characters")]
    CardNumberCharacters,

    #[error("card number failed checksum")]
    CardNumberChecksum,

    #[error("expiry must be in MM/YY format")]
    ExpiryFormat,

    #[error("card has expired")]
    CardExpired,

    #[error("CVV must be 3 or 4 digits")]
    Cvv,

    #[error("coupon code '{0}' is not valid")]
    UnknownCoupon(String),

    #[error("coupon '{code}' needs a subtotal of at least {minimum}")]
    CouponMinimumNotMet { code: String, minimum: String },

    #[error("cart is empty")]
    EmptyCart,

    #[error("amount is too large to price")]
    AmountOutOfRange,
}
