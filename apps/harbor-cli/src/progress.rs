//! Terminal progress line for transfers.

use std::io::{IsTerminal, Write};
use std::sync::Mutex;
use std::time::Duration;

use harbor_client::{ProgressObserver, RateMeter};

struct State {
    meter: RateMeter,
    last_offset: Option<u64>,
}

/// Observer that redraws a progress line on stderr after every chunk.
///
/// Draws nothing when stderr is not a terminal.
pub fn observer() -> ProgressObserver {
    let interactive = std::io::stderr().is_terminal();
    let state = Mutex::new(State {
        meter: RateMeter::default(),
        last_offset: None,
    });

    Box::new(move |offset, total| {
        let Ok(mut state) = state.lock() else {
            return;
        };
        let delta = state
            .last_offset
            .map_or(0, |last| offset.saturating_sub(last));
        state.last_offset = Some(offset);
        state.meter.record(delta);

        if interactive {
            let rate = state.meter.bytes_per_second();
            let eta = state.meter.eta(total.saturating_sub(offset));
            let mut err = std::io::stderr().lock();
            let _ = write!(err, "\r\x1b[2K{}", render(offset, total, rate, eta));
            let _ = err.flush();
        }
    })
}

/// Erases the progress line.
pub fn clear_line() {
    if std::io::stderr().is_terminal() {
        eprint!("\r\x1b[2K");
    }
}

fn render(offset: u64, total: u64, rate: f64, eta: Option<Duration>) -> String {
    let mut line = if total > 0 {
        let pct = (offset as f64 / total as f64 * 100.0).min(100.0);
        format!(
            "{} / {} ({pct:.1}%)",
            human_bytes(offset as f64),
            human_bytes(total as f64)
        )
    } else {
        human_bytes(offset as f64)
    };

    if rate > 0.0 {
        line.push_str(&format!("  {}/s", human_bytes(rate)));
    }
    if let Some(eta) = eta.filter(|_| offset < total) {
        line.push_str(&format!("  eta {}s", eta.as_secs()));
    }
    line
}

fn human_bytes(n: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = n;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
