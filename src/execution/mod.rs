/// Execution Layer
///
/// This layer is responsible for:
/// - Turning proposed actions into pool transactions
/// - Paying out compensations to victims
/// - Confirmations, timeouts and retries
///
/// The core never talks to a chain directly; it hands `Action` and
/// `Compensation` values to an `Executor` and waits for a receipt.

pub mod transaction_executor;

pub use transaction_executor::{DryRunExecutor, ExecutionError, ExecutionReceipt, Executor};
