//! Hedge sandbox simulation.
//!
//! Walks through liquidation estimates for single and hedged positions, applies
//! hypothetical buy and stop orders, expands an orders grid and runs the
//! pre-trade checks. Set `RUST_LOG=hedge_sandbox=debug` to see each order.

use anyhow::Result;
use hedge_sandbox::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .init();

    println!("Hedge Sandbox Simulation");
    println!("BTCUSDT linear perpetual, 100x\n");

    let mut config = SandboxConfig::default();
    config.verbose = true;
    config.validate()?;
    info!(
        leverage = config.margin.default_leverage,
        mm_rate = %config.margin.maintenance_margin_rate,
        "configuration loaded"
    );

    let specs = StaticSymbolSpecs::defaults();

    scenario_1_single_short(&config)?;
    scenario_2_hedged_pair(&config)?;
    scenario_3_increase_main(&specs, &config)?;
    scenario_4_partial_stop(&specs, &config)?;
    scenario_5_orders_grid()?;
    scenario_6_safety_checks(&config)?;

    println!("\nAll simulations completed.");
    Ok(())
}

fn leverage() -> Result<Leverage> {
    Ok(Leverage::new(100)?)
}

/// Short position alone on the account.
fn scenario_1_single_short(config: &SandboxConfig) -> Result<()> {
    println!("Scenario 1: Single Short\n");

    let spec = SymbolSpec::btc_usdt();
    let calc = LiquidationCalculator::new(&spec, &config.margin);
    let short = Position::open(&spec, Side::Sell, dec!(50000), dec!(0.1), leverage()?)?;
    let free = Amount::new(dec!(20));

    let estimate = calc.handle(&short, None, free);
    println!("  SHORT 0.1 @ 50000, free {}", free);
    println!("  liquidation {} ({} away)", estimate.price, estimate.distance);
    println!("  reference formula diverges by {}\n", calc.divergence(&short, None, free));
    Ok(())
}

/// Short main hedged by a long support.
fn scenario_2_hedged_pair(config: &SandboxConfig) -> Result<()> {
    println!("Scenario 2: Hedged Pair\n");

    let spec = SymbolSpec::btc_usdt();
    let calc = LiquidationCalculator::new(&spec, &config.margin);
    let opened = Timestamp::now();
    let short = Position::open(&spec, Side::Sell, dec!(63422.06), dec!(0.374), leverage()?)?.with_opened_at(opened);
    let long = Position::open(&spec, Side::Buy, dec!(60480.59), dec!(0.284), leverage()?)?
        .with_opened_at(Timestamp::from_millis(opened.as_millis() + 60_000));
    let free = Amount::new(dec!(307.08156));

    let hedge = Hedge::create(&short, &long)?;
    let mark = spec.price(dec!(64500))?;
    println!(
        "  main {} IM {}, support {} IM {}",
        hedge.main_position().side,
        hedge.main_position().initial_margin,
        hedge.support_position().side,
        hedge.support_position().initial_margin
    );
    println!(
        "  support rate {:.2}%, required {:.2}% at mark {}",
        hedge.support_rate(),
        hedge.required_support_rate(&mark, &config.support),
        mark
    );

    let main = calc.handle(&short, Some(&long), free);
    let support = calc.handle(&long, Some(&short), free);
    println!("  main liquidation {}, support liquidation {}", main.price, support.price);
    println!("  need more support: {}\n", hedge.need_increase_support(&mark, &config.support));
    Ok(())
}

/// Adds to the main side and watches the averaged entry.
fn scenario_3_increase_main(specs: &StaticSymbolSpecs, config: &SandboxConfig) -> Result<()> {
    println!("Scenario 3: Increase Main\n");

    let mut sandbox = Sandbox::for_symbol(specs, "BTCUSDT", config.clone())?;
    let spec = sandbox.spec().clone();
    let short = Position::open(&spec, Side::Sell, dec!(67533.43), dec!(0.187), leverage()?)?;
    let state = SandboxState::new(
        spec.name.clone(),
        Ticker::flat(spec.price(dec!(68150))?),
        Amount::new(dec!(1360.2554)),
        Amount::new(dec!(1300)),
    )
    .with_position(short)?;
    sandbox.set_state(state)?;

    let order = HypotheticalOrder::buy(&spec, Side::Sell, dec!(68150), dec!(0.001))?;
    let result = sandbox.process_order(&order)?;
    let after = result
        .output_state()
        .position(Side::Sell)
        .ok_or_else(|| anyhow::anyhow!("short missing after buy"))?;

    println!("  {}", order);
    println!("  entry {} -> {}", dec!(67533.43), after.entry_price.value().round_dp(11));
    println!("  liquidation {}", after.liquidation_price);
    println!("  free {}\n", result.output_state().free_balance());
    Ok(())
}

/// Partially stops the main side of a hedge.
fn scenario_4_partial_stop(specs: &StaticSymbolSpecs, config: &SandboxConfig) -> Result<()> {
    println!("Scenario 4: Partial Stop\n");

    let spec = specs
        .spec("BTCUSDT")
        .ok_or_else(|| anyhow::anyhow!("BTCUSDT spec missing"))?;
    let snapshot = StaticSnapshot::new()
        .with_ticker(&spec.name, Ticker::flat(spec.price(dec!(67850))?))
        .with_wallet(WalletBalance::new(
            Coin::Usdt,
            Amount::new(dec!(97.7787)),
            Amount::new(dec!(34.2720)),
        ))
        .with_position(Position::open(&spec, Side::Sell, dec!(67533.43), dec!(0.188), leverage()?)?)
        .with_position(Position::open(&spec, Side::Buy, dec!(61933.88), dec!(0.1), leverage()?)?);

    let state = SandboxState::from_provider(&snapshot, &spec)?;
    let orders = [
        HypotheticalOrder::stop(&spec, Side::Sell, dec!(67850), dec!(0.001))?,
        HypotheticalOrder::stop(&spec, Side::Sell, dec!(67850), dec!(0.5))?,
    ];
    let step = simulate(&spec, config, &state, &orders)?;

    for item in step.items() {
        let short = item.output_state().position(Side::Sell);
        println!(
            "  {}: size {}, liquidation {}, pnl {}",
            item.order(),
            short.map(|p| p.size).unwrap_or(Decimal::ZERO),
            short.map(|p| p.liquidation_price.to_string()).unwrap_or_else(|| "-".to_string()),
            item.pnl().map(|p| p.to_string()).unwrap_or_default()
        );
    }
    let after = step.state_after();
    println!(
        "  free {}, available {}, short closed: {}",
        after.free_balance(),
        after.available_balance(),
        step.position_closed_through_step(Side::Sell)
    );
    if let Some(total) = step.total_pnl() {
        println!("  total realized pnl {}\n", total);
    }
    Ok(())
}

/// Expands a grid definition into orders.
fn scenario_5_orders_grid() -> Result<()> {
    println!("Scenario 5: Orders Grid\n");

    let spec = SymbolSpec::btc_usdt();
    let lengths = LengthMap::new()
        .with(LengthAlias::VeryShort, dec!(20))
        .with(LengthAlias::Short, dec!(60))
        .with(LengthAlias::Standard, dec!(100))
        .with(LengthAlias::Long, dec!(200))
        .with(LengthAlias::VeryLong, dec!(300))
        .with(LengthAlias::DoubleLong, dec!(400));

    let definition = OrdersGridDefinition::parse("-short..-long-very-short/5|30%|4|wOO,aF", &lengths)?;
    println!("  canonical: {}", definition);

    let reference = spec.price(dec!(67850))?;
    let orders = OrdersGrid::build(&definition, Side::Buy, &reference, dec!(0.2), leverage()?, &spec)?;
    for order in &orders {
        println!("  {} wOO={}", order, order.context().flags.with_opposite_order);
    }

    match OrdersGridDefinition::parse("-short..-medium|30%|4", &lengths) {
        Ok(_) => println!("  unexpectedly parsed"),
        Err(e) => println!("  rejected: {}\n", e),
    }
    Ok(())
}

/// Runs the check chain before closing the support.
fn scenario_6_safety_checks(config: &SandboxConfig) -> Result<()> {
    println!("Scenario 6: Safety Checks\n");

    let spec = SymbolSpec::btc_usdt();
    let state = SandboxState::new(
        spec.name.clone(),
        Ticker::flat(spec.price(dec!(67800))?),
        Amount::new(dec!(97.7787)),
        Amount::new(dec!(34.2720)),
    )
    .with_position(Position::open(&spec, Side::Sell, dec!(67533.43), dec!(0.188), leverage()?)?)?
    .with_position(Position::open(&spec, Side::Buy, dec!(61933.88), dec!(0.1), leverage()?)?)?;

    let checks: [&dyn TradingCheck; 3] = [&SandboxExecutionCheck, &LiquidationDistanceCheck, &SupportCloseCheck];
    for (label, cfg) in [("default", config.clone()), ("conservative", SandboxConfig::conservative())] {
        let ctx = CheckContext {
            spec: &spec,
            config: &cfg,
            state: &state,
            orders: &[],
        };
        match run_checks(&checks, &ctx) {
            CheckResult::Success => println!("  {}: all checks passed", label),
            CheckResult::Failure { reason, retryable } => {
                println!("  {}: {} (retryable: {})", label, reason, retryable)
            }
        }
    }
    println!();
    Ok(())
}
