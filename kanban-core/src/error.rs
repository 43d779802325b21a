//! Errors raised while planning a reorder.
//!
//! Planning is pure, so these only describe requests that do not match the
//! sibling lists they were checked against.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The card is not in the column the move claims it comes from
    #[error("card {card_id} is not in the source column {column_id}")]
    CardNotInColumn { card_id: Uuid, column_id: Uuid },

    /// The column is not part of the board being reordered
    #[error("column {column_id} is not on this board")]
    ColumnNotOnBoard { column_id: Uuid },

    /// Source and destination columns belong to different boards
    #[error("cards can only move between columns of the same board")]
    CrossBoard,
}
