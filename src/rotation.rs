//! Rotating a whole multi-monitor layout around its center.
//!
//! Every logical monitor is turned a quarter around the pivot of the layout
//! hitbox, the result is recentered to undo the hitbox changing aspect, and
//! finally the layout is moved back so that its top-left corner is the
//! origin. A half turn is two clockwise quarter turns.
//!
//! The pivot and the recentering offset can be half-integers, so the math
//! runs on doubled coordinates. The halves always cancel out.

use tracing::debug;

use crate::display::{DisplayState, LogicalMonitor};
use crate::error::{Error, Result};
use crate::orientation::Rotation;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum QuarterTurn {
    Clockwise,
    CounterClockwise,
}

/// Rotate `logical_monitors`, using `state` for the size of each monitor.
///
/// Returns a new layout; the input is left untouched.
pub fn rotate_layout(
    state: &DisplayState,
    logical_monitors: &[LogicalMonitor],
    rotation: Rotation,
) -> Result<Vec<LogicalMonitor>> {
    let mut rotated = logical_monitors.to_vec();
    match rotation {
        Rotation::None => {}
        Rotation::Clockwise90 => turn(state, &mut rotated, QuarterTurn::Clockwise)?,
        Rotation::Clockwise270 => turn(state, &mut rotated, QuarterTurn::CounterClockwise)?,
        Rotation::Clockwise180 => {
            turn(state, &mut rotated, QuarterTurn::Clockwise)?;
            turn(state, &mut rotated, QuarterTurn::Clockwise)?;
        }
    }
    Ok(rotated)
}

fn turn(state: &DisplayState, monitors: &mut [LogicalMonitor], direction: QuarterTurn) -> Result<()> {
    let hitbox = state.hitbox(monitors)?;
    let pivot = hitbox.pivot();
    let offset2 = i64::from(hitbox.height) - i64::from(hitbox.width);
    debug!(?hitbox, ?direction, "turning layout");

    for logical in monitors.iter_mut() {
        let size = state.representative_size(logical);
        let x2 = 2 * i64::from(logical.x);
        let y2 = 2 * i64::from(logical.y);

        let (new_x2, new_y2) = match direction {
            QuarterTurn::CounterClockwise => (
                pivot.x2 + (y2 - pivot.y2),
                pivot.y2 - (x2 - pivot.x2) - 2 * i64::from(size.width),
            ),
            QuarterTurn::Clockwise => (
                pivot.x2 - (y2 - pivot.y2) - 2 * i64::from(size.height),
                pivot.y2 + (x2 - pivot.x2),
            ),
        };

        let x = halve(new_x2 + offset2, logical)?;
        let y = halve(new_y2 - offset2, logical)?;
        logical.x = x;
        logical.y = y;
        logical.transform = logical.transform
            + match direction {
                QuarterTurn::Clockwise => Rotation::CLOCKWISE,
                QuarterTurn::CounterClockwise => Rotation::COUNTER_CLOCKWISE,
            };
    }

    let moved = state.hitbox(monitors)?;
    for logical in monitors.iter_mut() {
        let x = coordinate(i64::from(logical.x) - i64::from(moved.x), logical)?;
        let y = coordinate(i64::from(logical.y) - i64::from(moved.y), logical)?;
        logical.x = x;
        logical.y = y;
    }

    Ok(())
}

fn halve(doubled: i64, logical: &LogicalMonitor) -> Result<i32> {
    debug_assert_eq!(doubled % 2, 0, "pivot halves must cancel");
    coordinate(doubled / 2, logical)
}

fn coordinate(value: i64, logical: &LogicalMonitor) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidLayoutGeometry {
        x: logical.x,
        y: logical.y,
        reason: format!("rotated coordinate {} is out of range", value),
    })
}
