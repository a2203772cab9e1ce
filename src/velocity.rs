//! Velocity math: per-client averages and the portfolio rollup.

use crate::types::ClientAggregate;

/// Round half away from zero at one decimal place.
///
/// The single rounding rule for every velocity figure on the report;
/// 25 h over 8 periods is 3.125 and must print as 3.1, not 3.2.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute `avg_velocity` for each client, the portfolio velocity, and
/// sort clients by velocity descending. Ties keep input order.
///
/// The portfolio figure sums the already-rounded per-client velocities,
/// then rounds again. That accumulates a small drift versus averaging the
/// raw totals, and it is kept deliberately: the published reports were
/// produced this way and the numbers must reproduce.
pub fn finalize_velocities(clients: &mut [ClientAggregate], period_count: usize) -> f64 {
    for client in clients.iter_mut() {
        client.avg_velocity = round1(client.total_hours_used / period_count as f64);
    }

    let portfolio = round1(clients.iter().map(|c| c.avg_velocity).sum());

    // The slice sort is stable, so equal velocities retain encounter order.
    clients.sort_by(|a, b| b.avg_velocity.total_cmp(&a.avg_velocity));

    portfolio
}
