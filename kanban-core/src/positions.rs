//! Position reconciliation for columns and cards
//!
//! Sibling groups (the cards of one column, the columns of one board) are
//! ordered by an integer `position`. A move is planned in memory as a
//! remove + insert on the ordered id list, then turned into the list of row
//! writes that make the stored positions match the new display order.
//!
//! Write order for a card move:
//! 1. the moved card: new column and its index in the destination
//! 2. every other card of the destination, re-enumerated `0..n`
//! 3. for cross-column moves, source cards whose position changed, so the
//!    source is `0..m` again
//!
//! Planning never touches storage; callers apply `writes` however they like.

use uuid::Uuid;

use crate::{Card, Column, MoveError};

/// Request to move one card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardMove {
    pub card_id: Uuid,
    pub source_column_id: Uuid,
    pub destination_column_id: Uuid,
    /// Index in the destination after the move; past-the-end appends
    pub new_position: usize,
}

/// A single row update produced by a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionWrite {
    Card {
        card_id: Uuid,
        column_id: Uuid,
        position: i32,
    },
    Column {
        column_id: Uuid,
        position: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardMovePlan {
    pub card_id: Uuid,
    pub from_column: Uuid,
    pub to_column: Uuid,
    /// Index the card landed on
    pub index: usize,
    /// Destination card ids in their new display order
    pub destination: Vec<Uuid>,
    /// Source card ids in their new display order (empty for same-column moves)
    pub source: Vec<Uuid>,
    pub writes: Vec<PositionWrite>,
}

impl CardMovePlan {
    pub fn crosses_columns(&self) -> bool {
        self.from_column != self.to_column
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMovePlan {
    pub column_id: Uuid,
    pub index: usize,
    /// Column ids in their new display order
    pub order: Vec<Uuid>,
    pub writes: Vec<PositionWrite>,
}

/// Sort cards into display order: position, then creation time, then id.
pub fn sort_cards(cards: &mut [Card]) {
    cards.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

/// Sort columns into display order: position, then creation time, then id.
pub fn sort_columns(columns: &mut [Column]) {
    columns.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

/// Position for a row appended after `existing` siblings.
pub fn append_position<I>(existing: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    existing.into_iter().max().map_or(0, |max| max.saturating_add(1))
}

/// Plan a card move.
///
/// `source` and `destination` are the current cards of the two columns in
/// any order. For a same-column reorder pass the same slice twice.
pub fn plan_card_move(
    source: &[Card],
    destination: &[Card],
    request: &CardMove,
) -> Result<CardMovePlan, MoveError> {
    let same_column = request.source_column_id == request.destination_column_id;

    let mut source_sorted = source.to_vec();
    sort_cards(&mut source_sorted);

    let mut source_ids: Vec<Uuid> = source_sorted.iter().map(|c| c.id).collect();
    let from_index = source_ids
        .iter()
        .position(|id| *id == request.card_id)
        .ok_or(MoveError::CardNotInColumn {
            card_id: request.card_id,
            column_id: request.source_column_id,
        })?;
    source_ids.remove(from_index);

    let mut destination_ids = if same_column {
        std::mem::take(&mut source_ids)
    } else {
        let mut destination_sorted = destination.to_vec();
        sort_cards(&mut destination_sorted);
        destination_sorted
            .iter()
            .map(|c| c.id)
            .filter(|id| *id != request.card_id)
            .collect()
    };

    let index = request.new_position.min(destination_ids.len());
    destination_ids.insert(index, request.card_id);

    let mut writes = Vec::with_capacity(destination_ids.len() + source_ids.len());
    writes.push(PositionWrite::Card {
        card_id: request.card_id,
        column_id: request.destination_column_id,
        position: index as i32,
    });

    for (i, id) in destination_ids.iter().enumerate() {
        if *id == request.card_id {
            continue;
        }
        writes.push(PositionWrite::Card {
            card_id: *id,
            column_id: request.destination_column_id,
            position: i as i32,
        });
    }

    if !same_column {
        for (i, id) in source_ids.iter().enumerate() {
            let unchanged = source_sorted
                .iter()
                .any(|c| c.id == *id && c.position == i as i32);
            if !unchanged {
                writes.push(PositionWrite::Card {
                    card_id: *id,
                    column_id: request.source_column_id,
                    position: i as i32,
                });
            }
        }
    }

    Ok(CardMovePlan {
        card_id: request.card_id,
        from_column: request.source_column_id,
        to_column: request.destination_column_id,
        index,
        destination: destination_ids,
        source: source_ids,
        writes,
    })
}

/// Plan moving a column to `new_position` among its board's columns.
///
/// Every column is re-enumerated, so the result is always `0..n`.
pub fn plan_column_move(
    columns: &[Column],
    column_id: Uuid,
    new_position: usize,
) -> Result<ColumnMovePlan, MoveError> {
    let mut sorted = columns.to_vec();
    sort_columns(&mut sorted);

    let mut order: Vec<Uuid> = sorted.iter().map(|c| c.id).collect();
    let from_index = order
        .iter()
        .position(|id| *id == column_id)
        .ok_or(MoveError::ColumnNotOnBoard { column_id })?;
    order.remove(from_index);

    let index = new_position.min(order.len());
    order.insert(index, column_id);

    let writes = order
        .iter()
        .enumerate()
        .map(|(i, id)| PositionWrite::Column {
            column_id: *id,
            position: i as i32,
        })
        .collect();

    Ok(ColumnMovePlan {
        column_id,
        index,
        order,
        writes,
    })
}
