// hedge-sandbox: what-if execution engine for hedged leveraged futures positions.
// applies hypothetical buy/stop orders to a snapshot and reports the resulting state,
// liquidation prices and realized pnl. deterministic, no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Side, Price, Amount, Leverage, Timestamp
//   2.x  symbol.rs: SymbolSpec, settlement coin, rounding and minimums
//   3.x  position.rs: position struct, pnl, increase/reduce, wallet, ticker
//   4.x  sandbox/: snapshot state, hypothetical orders, apply, results
//   5.x  margin.rs: order margin, open/close commission, order cost
//   6.x  liquidation.rs: hedged liquidation price, closed form + reference
//   6.1  hedge.rs: main/support classification, support ratio
//   7.x  grid/: orders grid DSL and grid order construction
//   8.x  checks.rs: pre-trade safety checks on top of the sandbox
//   9.x  provider.rs: snapshot and symbol spec sources
//   11.x config.rs: fees, margin params, support ratios, safety, presets

// core modules
pub mod liquidation;
pub mod margin;
pub mod position;
pub mod symbol;
pub mod types;

// hedge and sandbox
pub mod hedge;
pub mod sandbox;

// around the sandbox
pub mod checks;
pub mod config;
pub mod grid;
pub mod provider;

// re exports for convenience
pub use liquidation::*;
pub use margin::*;
pub use position::*;
pub use symbol::*;
pub use types::*;
pub use checks::{
    liquidation_distance_percent, run_checks, CheckContext, CheckResult, LiquidationDistanceCheck,
    SandboxExecutionCheck, SupportCloseCheck, TradingCheck,
};
pub use config::{ConfigError, FeeConfig, MarginParams, SafetyConfig, SandboxConfig};
pub use grid::{GridErrorKind, GridParseError, LengthAlias, LengthMap, LengthProvider, OrdersGrid, OrdersGridDefinition};
pub use hedge::{Hedge, HedgeError, SupportBracket, SupportRatioConfig};
pub use provider::{SnapshotError, SnapshotProvider, StaticSnapshot, StaticSymbolSpecs, SymbolSpecProvider};
pub use sandbox::{
    simulate, ExecutionStepResult, HypotheticalOrder, OrderContext, OrderError, OrderExecutionResult, OrderFlags,
    OrderKind, Sandbox, SandboxError, SandboxPhase, SandboxState,
};
