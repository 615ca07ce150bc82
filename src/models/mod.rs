//! Domain models for cardrank.
//!
//! # Core Concepts
//!
//! - [`Card`]: an orderable item living in one bucket (a board column). Its
//!   `position` is a rank key; sorting a bucket by position gives display order.
//! - [`MoveCardInput`]: a drag-and-drop move as reported by the board, naming
//!   the cards directly above and below the drop slot.
//! - [`PositionAnalysis`] / [`RepairPlan`]: health report and fix-up plan for
//!   positions written outside the board (imports, manual edits).

mod card;
mod repair;

pub use card::*;
pub use repair::*;
