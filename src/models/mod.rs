pub mod address;
pub mod token;
pub mod transaction;
pub mod units;

pub use address::{is_null_address, normalize_address, validate_address, AddressError, ZERO_ADDRESS};
pub use token::{Enriched, NativeBalance, ReputationReport, TokenRecord};
pub use transaction::{Block, Receipt, Transaction, TransactionRecord};
pub use units::{adjust_supply, format_units, parse_hex_u64, parse_quantity, QuantityError, MAX_DECIMALS};
