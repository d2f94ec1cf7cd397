//! Long-only trade simulator.
//!
//! Walks the bars once, holding at most one position. A flat book opens on
//! an entry signal at that bar's close; an open position closes on a later
//! exit signal at that bar's close. Entry and exit never happen on the same
//! bar. A position still open at the end is closed at the last close.

use crate::domain::rule_eval::Signals;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_pnl: f64,
    pub num_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
}

impl Summary {
    pub fn from_trades(trades: &[Trade]) -> Self {
        let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
        let num_trades = trades.len();
        Self {
            total_pnl: trades.iter().map(|t| t.pnl).sum(),
            num_trades,
            wins,
            losses: num_trades - wins,
            win_rate: if num_trades == 0 {
                0.0
            } else {
                wins as f64 / num_trades as f64
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub summary: Summary,
}

/// Simulate trading `close` on `signals`. Bars beyond the shortest of the
/// three inputs are ignored.
pub fn run_backtest(close: &[f64], signals: &Signals) -> BacktestResult {
    let bars = close.len().min(signals.entry.len()).min(signals.exit.len());
    let mut trades = Vec::new();
    let mut open: Option<(usize, f64)> = None;

    for i in 0..bars {
        match open {
            None if signals.entry[i] => open = Some((i, close[i])),
            Some((entry_index, entry_price)) if signals.exit[i] => {
                trades.push(Trade {
                    entry_index,
                    exit_index: i,
                    entry_price,
                    exit_price: close[i],
                    pnl: close[i] - entry_price,
                });
                open = None;
            }
            _ => {}
        }
    }

    if let Some((entry_index, entry_price)) = open {
        let last = bars - 1;
        trades.push(Trade {
            entry_index,
            exit_index: last,
            entry_price,
            exit_price: close[last],
            pnl: close[last] - entry_price,
        });
    }

    let summary = Summary::from_trades(&trades);
    log::info!(
        "backtest over {} bars: {} trades, total pnl {:.4}, win rate {:.2}",
        bars,
        summary.num_trades,
        summary.total_pnl,
        summary.win_rate
    );
    BacktestResult { trades, summary }
}
