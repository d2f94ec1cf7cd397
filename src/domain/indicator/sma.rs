//! Simple Moving Average.
//!
//! O(n) sliding window. The first `period - 1` positions are unknown, as is
//! any position whose window contains an unknown input. Infinite inputs
//! count as unknown so they never enter the running sum.

pub fn calculate_sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }

    let mut window_sum = 0.0;
    let mut unknown_in_window = 0usize;

    for (i, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            unknown_in_window += 1;
        } else {
            window_sum += value;
        }

        if i >= period {
            let dropped = values[i - period];
            if !dropped.is_finite() {
                unknown_in_window -= 1;
            } else {
                window_sum -= dropped;
            }
        }

        if i + 1 >= period && unknown_in_window == 0 {
            out[i] = window_sum / period as f64;
        }
    }

    out
}
