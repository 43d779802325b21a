use chrono::{Duration, Utc};
use kanban_core::{plan_card_move, Card, CardMove, PositionWrite};
use proptest::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

fn column(column_id: Uuid, positions: &[i32]) -> Vec<Card> {
    let base = Utc::now();
    positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Card {
            id: Uuid::new_v4(),
            column_id,
            title: format!("card {i}"),
            description: None,
            position,
            assignee_id: None,
            due_date: None,
            created_at: base + Duration::milliseconds(i as i64),
            updated_at: base,
        })
        .collect()
}

/// Replay writes over the starting rows, like a store would.
fn apply(cards: &[Card], writes: &[PositionWrite]) -> HashMap<Uuid, (Uuid, i32)> {
    let mut rows: HashMap<Uuid, (Uuid, i32)> = cards
        .iter()
        .map(|c| (c.id, (c.column_id, c.position)))
        .collect();
    for write in writes {
        if let PositionWrite::Card {
            card_id,
            column_id,
            position,
        } = write
        {
            rows.insert(*card_id, (*column_id, *position));
        }
    }
    rows
}

fn positions_in(rows: &HashMap<Uuid, (Uuid, i32)>, column_id: Uuid) -> Vec<i32> {
    let mut positions: Vec<i32> = rows
        .values()
        .filter(|(col, _)| *col == column_id)
        .map(|(_, p)| *p)
        .collect();
    positions.sort_unstable();
    positions
}

proptest! {
    /// Property: after a cross-column move both columns are 0..n-1
    #[test]
    fn prop_cross_column_move_is_contiguous(
        src_positions in prop::collection::vec(0i32..50, 1..12),
        dst_positions in prop::collection::vec(0i32..50, 0..12),
        pick in any::<prop::sample::Index>(),
        target in 0usize..20,
    ) {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let src = column(a, &src_positions);
        let dst = column(b, &dst_positions);
        let moving = src[pick.index(src.len())].id;

        let plan = plan_card_move(&src, &dst, &CardMove {
            card_id: moving,
            source_column_id: a,
            destination_column_id: b,
            new_position: target,
        }).unwrap();

        let all: Vec<Card> = src.iter().chain(dst.iter()).cloned().collect();
        let rows = apply(&all, &plan.writes);

        let expected_dst: Vec<i32> = (0..=dst.len() as i32).collect();
        prop_assert_eq!(positions_in(&rows, b), expected_dst);
        let expected_src: Vec<i32> = (0..(src.len() as i32 - 1)).collect();
        prop_assert_eq!(positions_in(&rows, a), expected_src);

        // the moved card sits at the index it was given
        prop_assert_eq!(rows[&moving], (b, target.min(dst.len()) as i32));
    }

    /// Property: display order matches the written positions
    #[test]
    fn prop_destination_order_matches_positions(
        positions in prop::collection::vec(0i32..30, 1..15),
        pick in any::<prop::sample::Index>(),
        target in 0usize..20,
    ) {
        let a = Uuid::new_v4();
        let col = column(a, &positions);
        let moving = col[pick.index(col.len())].id;

        let plan = plan_card_move(&col, &col, &CardMove {
            card_id: moving,
            source_column_id: a,
            destination_column_id: a,
            new_position: target,
        }).unwrap();

        let rows = apply(&col, &plan.writes);
        for (i, id) in plan.destination.iter().enumerate() {
            prop_assert_eq!(rows[id], (a, i as i32));
        }
        prop_assert_eq!(plan.destination.len(), col.len());
    }
}
