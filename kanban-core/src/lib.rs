//! kanban-core: domain model for the kanban board service
//!
//! Records, validated inputs, board roles and the position planner used to
//! reorder columns and cards. No I/O lives here.

pub mod access;
pub mod activity;
pub mod changes;
pub mod error;
pub mod fields;
pub mod positions;
pub mod records;
pub mod validation;

pub use access::{BoardAction, Role};
pub use activity::{ActivityAction, EntityType};
pub use changes::{
    BoardChanges, CardChanges, ColumnChanges, NewActivity, NewBoard, NewCard, NewColumn,
    NewComment, DEFAULT_COLUMNS,
};
pub use error::MoveError;
pub use fields::{CommentBody, Email, Title};
pub use positions::{
    append_position, plan_card_move, plan_column_move, sort_cards, sort_columns, CardMove,
    CardMovePlan, ColumnMovePlan, PositionWrite,
};
pub use records::{
    ActivityEntry, ActivityLog, Board, BoardDetails, BoardMember, BoardSummary, Card,
    CardWithAssignee, Column, ColumnWithCards, Comment, CommentWithAuthor, MemberWithProfile,
    Profile, ProfileSummary,
};
pub use validation::ValidationError;
