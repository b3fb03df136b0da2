pub mod currency;
pub mod payment_reference;
pub mod profile_id;

pub use currency::Currency;
pub use payment_reference::PaymentReference;
pub use profile_id::ProfileId;
