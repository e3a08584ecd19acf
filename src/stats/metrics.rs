// src/stats/metrics.rs
//! Prometheus metrics mirrored from the mining loop

use prometheus::{
    Encoder, Gauge, IntCounter, IntGauge, TextEncoder, register_gauge, register_int_counter,
    register_int_gauge,
};

lazy_static::lazy_static! {
    /// Blocks recorded by the loop
    pub static ref BLOCKS_MINED: IntCounter = register_int_counter!(
        "cryptosim_blocks_mined_total",
        "Total number of blocks mined"
    ).expect("blocks metric registers once");

    /// Rolling-window blocks per second
    pub static ref MINING_RATE: Gauge = register_gauge!(
        "cryptosim_mining_rate",
        "Current mining rate in blocks per second"
    ).expect("rate metric registers once");

    /// 1 while mining
    pub static ref MINING_ACTIVE: IntGauge = register_int_gauge!(
        "cryptosim_mining_active",
        "Mining status (1 = active, 0 = inactive)"
    ).expect("active metric registers once");

    /// Failed random-number fetches
    pub static ref RNG_REQUEST_ERRORS: IntCounter = register_int_counter!(
        "cryptosim_rng_request_errors_total",
        "Total number of failed RNG requests"
    ).expect("rng error metric registers once");

    /// Failed hash requests
    pub static ref HASH_REQUEST_ERRORS: IntCounter = register_int_counter!(
        "cryptosim_hash_request_errors_total",
        "Total number of failed hash requests"
    ).expect("hash error metric registers once");

    /// Loops aborted by a fatal error
    pub static ref LOOP_FAILURES: IntCounter = register_int_counter!(
        "cryptosim_loop_failures_total",
        "Mining loops aborted by an unrecoverable error"
    ).expect("loop failure metric registers once");
}

/// Publishes the mining flag
pub fn set_active(active: bool) {
    MINING_ACTIVE.set(i64::from(active));
    if !active {
        MINING_RATE.set(0.0);
    }
}

/// Renders every registered metric in the text exposition format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
