mod balance_ledger;
mod config;
#[cfg(test)]
mod tests;

pub use balance_ledger::{BalanceLedger, PurchaseReceipt, PurchaseRequest};
pub use config::LedgerConfig;
