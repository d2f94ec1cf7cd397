//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of the first `period` price changes
//! - Subsequent: avg = (prev_avg * (period - 1) + current) / period
//!
//! RSI = 100 - 100 / (1 + avg_gain / max(avg_loss, 1e-10))
//!
//! Warmup: counted from the first known input, the first `period` positions
//! are unknown. A change involving an unknown or infinite input leaves that
//! bar unknown and the running averages untouched.

const MIN_AVG_LOSS: f64 = 1e-10;

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss.max(MIN_AVG_LOSS))
}

pub fn calculate_rsi(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }
    let Some(first_known) = values.iter().position(|v| v.is_finite()) else {
        return out;
    };

    let n = period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut seeded = 0usize;

    for i in first_known + 1..values.len() {
        let change = values[i] - values[i - 1];
        if !change.is_finite() {
            continue;
        }
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if seeded < period {
            avg_gain += gain;
            avg_loss += loss;
            seeded += 1;
            if seeded < period {
                continue;
            }
            avg_gain /= n;
            avg_loss /= n;
        } else {
            avg_gain = (avg_gain * (n - 1.0) + gain) / n;
            avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        }

        out[i] = rsi_value(avg_gain, avg_loss);
    }

    out
}
