// 4.0: what-if execution. applies hypothetical buy/stop orders to a snapshot of positions
// and balances and returns the resulting states, liquidation prices and realized pnl.
// deterministic, no I/O.

mod apply;
mod core;
mod order;
mod results;
mod state;

pub use apply::{apply_buy, apply_order, apply_stop, recompute_liquidations, ApplyContext};
pub use core::{simulate, Sandbox, SandboxPhase};
pub use order::{HypotheticalOrder, OrderContext, OrderError, OrderFlags, OrderKind};
pub use results::{ExecutionStepResult, OrderExecutionResult, SandboxError};
pub use state::SandboxState;
