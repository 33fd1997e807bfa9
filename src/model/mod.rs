//! Types that represent the core data model, such as `Transaction` and `Category`.
mod amount;
mod budget;
mod category;
mod transaction;

pub use amount::{Amount, AmountError};
pub use budget::BudgetTargets;
pub use category::Category;
pub use transaction::{NewTransaction, Transaction, TransactionEdit, TransactionUpdates};
