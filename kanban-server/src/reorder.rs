//! Reorder service
//!
//! Loads the sibling lists a move touches, plans it with
//! [`kanban_core::plan_card_move`] / [`kanban_core::plan_column_move`], and
//! hands the writes to the store in one `apply_positions` call. Permission
//! checks and activity logging stay in the handlers.

use uuid::Uuid;

use kanban_core::{
    plan_card_move, plan_column_move, Card, CardMove, CardMovePlan, Column, MoveError,
};

use crate::store::{DbError, KanbanStore};

#[derive(Debug, thiserror::Error)]
pub enum ReorderError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Result of a card move, read back after the writes landed
#[derive(Debug)]
pub struct CardMoveOutcome {
    pub plan: CardMovePlan,
    pub card: Card,
    pub source_column: Column,
    pub destination_column: Column,
    /// Destination cards in display order
    pub destination: Vec<Card>,
    /// Source cards in display order; empty for same-column moves
    pub source: Vec<Card>,
}

/// Move a card within or across columns of one board.
pub async fn move_card(
    store: &dyn KanbanStore,
    request: &CardMove,
) -> Result<CardMoveOutcome, ReorderError> {
    let source_column = store
        .column(request.source_column_id)
        .await?
        .ok_or_else(|| DbError::not_found("column", request.source_column_id))?;

    let destination_column = if request.destination_column_id == request.source_column_id {
        source_column.clone()
    } else {
        store
            .column(request.destination_column_id)
            .await?
            .ok_or_else(|| DbError::not_found("column", request.destination_column_id))?
    };

    if source_column.board_id != destination_column.board_id {
        return Err(MoveError::CrossBoard.into());
    }

    let source_cards = store.cards(source_column.id).await?;
    let plan = if request.source_column_id == request.destination_column_id {
        plan_card_move(&source_cards, &source_cards, request)?
    } else {
        let destination_cards = store.cards(destination_column.id).await?;
        plan_card_move(&source_cards, &destination_cards, request)?
    };

    store.apply_positions(&plan.writes).await?;

    tracing::info!(
        card_id = %plan.card_id,
        from_column = %plan.from_column,
        to_column = %plan.to_column,
        index = plan.index,
        writes = plan.writes.len(),
        "card moved"
    );

    let destination = store.cards(destination_column.id).await?;
    let source = if plan.crosses_columns() {
        store.cards(source_column.id).await?
    } else {
        Vec::new()
    };
    let card = destination
        .iter()
        .find(|c| c.id == plan.card_id)
        .cloned()
        .ok_or_else(|| DbError::not_found("card", plan.card_id))?;

    Ok(CardMoveOutcome {
        plan,
        card,
        source_column,
        destination_column,
        destination,
        source,
    })
}

/// Move a column to `new_position` on its board; returns the new column order.
pub async fn move_column(
    store: &dyn KanbanStore,
    column_id: Uuid,
    new_position: usize,
) -> Result<Vec<Column>, ReorderError> {
    let column = store
        .column(column_id)
        .await?
        .ok_or_else(|| DbError::not_found("column", column_id))?;

    let columns = store.columns(column.board_id).await?;
    let plan = plan_column_move(&columns, column_id, new_position)?;
    store.apply_positions(&plan.writes).await?;

    tracing::info!(
        column_id = %column_id,
        board_id = %column.board_id,
        index = plan.index,
        "column moved"
    );

    Ok(store.columns(column.board_id).await?)
}
