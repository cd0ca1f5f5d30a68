//! The fourteen signal-analytics modules (§4.4). Each is a pure,
//! synchronous function of its inputs (plus, where the spec calls for
//! it, a small thread-safe ring history owned by the module's struct).
//! Analytics never suspend — no `async fn` anywhere in this tree — and
//! every public entry point follows §7's propagation policy: internal
//! failures return the module's zero-valued result with `error: Some(_)`
//! set rather than panicking or propagating a `Result::Err`.

pub mod adaptive_weights;
pub mod basis;
pub mod divergence;
pub mod execution_metrics;
pub mod funding_arb;
pub mod hedge_ratio;
pub mod liquidation_heatmap;
pub mod macro_predictor;
pub mod microstructure;
pub mod monte_carlo;
pub mod portfolio;
pub mod regime_memory;
pub mod shock;
pub mod stable_flow;
pub mod stablecoin;
pub mod tariff;
