//! In-memory store
//!
//! One `RwLock` around all tables, so every method (including
//! `apply_positions`) is atomic with respect to other requests. Nothing
//! survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use kanban_core::{
    append_position, sort_cards, sort_columns, ActivityEntry, ActivityLog, Board, BoardChanges,
    BoardDetails, BoardMember, BoardSummary, Card, CardChanges, CardWithAssignee, Column,
    ColumnChanges, ColumnWithCards, Comment, CommentWithAuthor, Email, MemberWithProfile,
    NewActivity, NewBoard, NewCard, NewColumn, NewComment, PositionWrite, Profile,
    ProfileSummary, Role, DEFAULT_COLUMNS,
};

use super::{DbError, KanbanStore};

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    sessions: HashMap<String, (Uuid, Option<DateTime<Utc>>)>,
    boards: HashMap<Uuid, Board>,
    members: HashMap<Uuid, BoardMember>,
    columns: HashMap<Uuid, Column>,
    cards: HashMap<Uuid, Card>,
    comments: HashMap<Uuid, Comment>,
    activity: Vec<ActivityLog>,
}

impl Tables {
    fn summary(&self, user_id: Uuid) -> Option<ProfileSummary> {
        self.profiles.get(&user_id).map(ProfileSummary::from)
    }

    fn sorted_columns(&self, board_id: Uuid) -> Vec<Column> {
        let mut columns: Vec<Column> = self
            .columns
            .values()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        sort_columns(&mut columns);
        columns
    }

    fn sorted_cards(&self, column_id: Uuid) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .cards
            .values()
            .filter(|c| c.column_id == column_id)
            .cloned()
            .collect();
        sort_cards(&mut cards);
        cards
    }

    fn with_assignee(&self, card: Card) -> CardWithAssignee {
        let assignee = card.assignee_id.and_then(|id| self.summary(id));
        CardWithAssignee { card, assignee }
    }

    fn with_profile(&self, member: BoardMember) -> MemberWithProfile {
        let profile = self.summary(member.user_id);
        MemberWithProfile { member, profile }
    }

    fn with_author(&self, comment: Comment) -> CommentWithAuthor {
        let user = self.summary(comment.user_id);
        CommentWithAuthor { comment, user }
    }

    fn board_members(&self, board_id: Uuid) -> Vec<BoardMember> {
        let mut members: Vec<BoardMember> = self
            .members
            .values()
            .filter(|m| m.board_id == board_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.joined_at);
        members
    }

    fn remove_card(&mut self, card_id: Uuid) {
        self.cards.remove(&card_id);
        self.comments.retain(|_, c| c.card_id != card_id);
    }

    fn remove_column(&mut self, column_id: Uuid) {
        self.columns.remove(&column_id);
        let card_ids: Vec<Uuid> = self
            .cards
            .values()
            .filter(|c| c.column_id == column_id)
            .map(|c| c.id)
            .collect();
        for id in card_ids {
            self.remove_card(id);
        }
    }
}

/// Process-local [`KanbanStore`]
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KanbanStore for MemoryStore {
    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn create_profile(
        &self,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<Profile, DbError> {
        let mut t = self.tables.write().await;
        if t.profiles.values().any(|p| p.email == email.as_str()) {
            return Err(DbError::Conflict(format!(
                "profile '{}' already exists",
                email.as_str()
            )));
        }

        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            email: email.as_str().to_owned(),
            full_name: full_name.map(str::to_owned),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        t.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn profile_by_email(&self, email: &Email) -> Result<Option<Profile>, DbError> {
        let t = self.tables.read().await;
        Ok(t.profiles
            .values()
            .find(|p| p.email == email.as_str())
            .cloned())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), DbError> {
        let mut t = self.tables.write().await;
        if !t.profiles.contains_key(&user_id) {
            return Err(DbError::not_found("profile", user_id));
        }
        t.sessions.insert(token.to_owned(), (user_id, expires_at));
        Ok(())
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<Profile>, DbError> {
        let t = self.tables.read().await;
        let Some((user_id, expires_at)) = t.sessions.get(token) else {
            return Ok(None);
        };
        if expires_at.is_some_and(|at| at <= Utc::now()) {
            return Ok(None);
        }
        Ok(t.profiles.get(user_id).cloned())
    }

    async fn boards_for_user(&self, user_id: Uuid) -> Result<Vec<BoardSummary>, DbError> {
        let t = self.tables.read().await;
        let mut boards: Vec<BoardSummary> = t
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| t.boards.get(&m.board_id))
            .map(|b| BoardSummary {
                board: b.clone(),
                owner: t.summary(b.owner_id),
                member_count: t.members.values().filter(|m| m.board_id == b.id).count() as i64,
            })
            .collect();
        boards.sort_by(|a, b| b.board.created_at.cmp(&a.board.created_at));
        Ok(boards)
    }

    async fn create_board(&self, new: NewBoard) -> Result<Board, DbError> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let board = Board {
            id: Uuid::new_v4(),
            title: new.title.into_string(),
            description: new.description,
            owner_id: new.owner_id,
            created_at: now,
            updated_at: now,
        };

        let owner = BoardMember {
            id: Uuid::new_v4(),
            board_id: board.id,
            user_id: new.owner_id,
            role: Role::Owner,
            joined_at: now,
        };
        t.members.insert(owner.id, owner);

        for (position, title) in DEFAULT_COLUMNS.iter().enumerate() {
            let column = Column {
                id: Uuid::new_v4(),
                board_id: board.id,
                title: (*title).to_owned(),
                position: position as i32,
                created_at: now,
            };
            t.columns.insert(column.id, column);
        }

        t.boards.insert(board.id, board.clone());
        Ok(board)
    }

    async fn board(&self, board_id: Uuid) -> Result<Option<Board>, DbError> {
        Ok(self.tables.read().await.boards.get(&board_id).cloned())
    }

    async fn board_details(&self, board_id: Uuid) -> Result<Option<BoardDetails>, DbError> {
        let t = self.tables.read().await;
        let Some(board) = t.boards.get(&board_id).cloned() else {
            return Ok(None);
        };

        let columns = t
            .sorted_columns(board_id)
            .into_iter()
            .map(|column| {
                let cards = t
                    .sorted_cards(column.id)
                    .into_iter()
                    .map(|c| t.with_assignee(c))
                    .collect();
                ColumnWithCards { column, cards }
            })
            .collect();

        let members = t
            .board_members(board_id)
            .into_iter()
            .map(|m| t.with_profile(m))
            .collect();

        Ok(Some(BoardDetails {
            owner: t.summary(board.owner_id),
            board,
            columns,
            members,
        }))
    }

    async fn update_board(
        &self,
        board_id: Uuid,
        changes: &BoardChanges,
    ) -> Result<Board, DbError> {
        let mut t = self.tables.write().await;
        let board = t
            .boards
            .get_mut(&board_id)
            .ok_or_else(|| DbError::not_found("board", board_id))?;

        if let Some(title) = &changes.title {
            board.title = title.clone();
        }
        if let Some(description) = &changes.description {
            board.description = description.clone();
        }
        board.updated_at = Utc::now();
        Ok(board.clone())
    }

    async fn delete_board(&self, board_id: Uuid) -> Result<(), DbError> {
        let mut t = self.tables.write().await;
        if t.boards.remove(&board_id).is_none() {
            return Err(DbError::not_found("board", board_id));
        }

        t.members.retain(|_, m| m.board_id != board_id);
        t.activity.retain(|a| a.board_id != board_id);
        let column_ids: Vec<Uuid> = t.sorted_columns(board_id).iter().map(|c| c.id).collect();
        for id in column_ids {
            t.remove_column(id);
        }
        Ok(())
    }

    async fn membership(
        &self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BoardMember>, DbError> {
        let t = self.tables.read().await;
        Ok(t.members
            .values()
            .find(|m| m.board_id == board_id && m.user_id == user_id)
            .cloned())
    }

    async fn members(&self, board_id: Uuid) -> Result<Vec<MemberWithProfile>, DbError> {
        let t = self.tables.read().await;
        Ok(t.board_members(board_id)
            .into_iter()
            .map(|m| t.with_profile(m))
            .collect())
    }

    async fn member(&self, member_id: Uuid) -> Result<Option<BoardMember>, DbError> {
        Ok(self.tables.read().await.members.get(&member_id).cloned())
    }

    async fn add_member(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<MemberWithProfile, DbError> {
        let mut t = self.tables.write().await;
        if !t.boards.contains_key(&board_id) {
            return Err(DbError::not_found("board", board_id));
        }
        if t
            .members
            .values()
            .any(|m| m.board_id == board_id && m.user_id == user_id)
        {
            return Err(DbError::Conflict(
                "User is already a member of this board".into(),
            ));
        }

        let member = BoardMember {
            id: Uuid::new_v4(),
            board_id,
            user_id,
            role,
            joined_at: Utc::now(),
        };
        t.members.insert(member.id, member.clone());
        Ok(t.with_profile(member))
    }

    async fn set_member_role(&self, member_id: Uuid, role: Role) -> Result<BoardMember, DbError> {
        let mut t = self.tables.write().await;
        let member = t
            .members
            .get_mut(&member_id)
            .ok_or_else(|| DbError::not_found("member", member_id))?;
        member.role = role;
        Ok(member.clone())
    }

    async fn remove_member(&self, member_id: Uuid) -> Result<(), DbError> {
        let mut t = self.tables.write().await;
        t.members
            .remove(&member_id)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("member", member_id))
    }

    async fn column(&self, column_id: Uuid) -> Result<Option<Column>, DbError> {
        Ok(self.tables.read().await.columns.get(&column_id).cloned())
    }

    async fn columns(&self, board_id: Uuid) -> Result<Vec<Column>, DbError> {
        Ok(self.tables.read().await.sorted_columns(board_id))
    }

    async fn create_column(&self, new: NewColumn) -> Result<Column, DbError> {
        let mut t = self.tables.write().await;
        if !t.boards.contains_key(&new.board_id) {
            return Err(DbError::not_found("board", new.board_id));
        }

        let position = new.position.unwrap_or_else(|| {
            append_position(t.sorted_columns(new.board_id).iter().map(|c| c.position))
        });
        let column = Column {
            id: Uuid::new_v4(),
            board_id: new.board_id,
            title: new.title.into_string(),
            position,
            created_at: Utc::now(),
        };
        t.columns.insert(column.id, column.clone());
        Ok(column)
    }

    async fn update_column(
        &self,
        column_id: Uuid,
        changes: &ColumnChanges,
    ) -> Result<Column, DbError> {
        let mut t = self.tables.write().await;
        let column = t
            .columns
            .get_mut(&column_id)
            .ok_or_else(|| DbError::not_found("column", column_id))?;

        if let Some(title) = &changes.title {
            column.title = title.clone();
        }
        if let Some(position) = changes.position {
            column.position = position;
        }
        Ok(column.clone())
    }

    async fn delete_column(&self, column_id: Uuid) -> Result<(), DbError> {
        let mut t = self.tables.write().await;
        if !t.columns.contains_key(&column_id) {
            return Err(DbError::not_found("column", column_id));
        }
        t.remove_column(column_id);
        Ok(())
    }

    async fn card(&self, card_id: Uuid) -> Result<Option<Card>, DbError> {
        Ok(self.tables.read().await.cards.get(&card_id).cloned())
    }

    async fn cards(&self, column_id: Uuid) -> Result<Vec<Card>, DbError> {
        Ok(self.tables.read().await.sorted_cards(column_id))
    }

    async fn create_card(&self, new: NewCard) -> Result<CardWithAssignee, DbError> {
        let mut t = self.tables.write().await;
        if !t.columns.contains_key(&new.column_id) {
            return Err(DbError::not_found("column", new.column_id));
        }
        if let Some(assignee_id) = new.assignee_id.filter(|id| !t.profiles.contains_key(id)) {
            return Err(DbError::not_found("assignee", assignee_id));
        }

        let position = new.position.unwrap_or_else(|| {
            append_position(t.sorted_cards(new.column_id).iter().map(|c| c.position))
        });
        let now = Utc::now();
        let card = Card {
            id: Uuid::new_v4(),
            column_id: new.column_id,
            title: new.title.into_string(),
            description: new.description,
            position,
            assignee_id: new.assignee_id,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
        };
        t.cards.insert(card.id, card.clone());
        Ok(t.with_assignee(card))
    }

    async fn update_card(
        &self,
        card_id: Uuid,
        changes: &CardChanges,
    ) -> Result<CardWithAssignee, DbError> {
        let mut t = self.tables.write().await;
        if let Some(column_id) = changes.column_id {
            if !t.columns.contains_key(&column_id) {
                return Err(DbError::not_found("column", column_id));
            }
        }
        if let Some(Some(assignee_id)) = changes.assignee_id {
            if !t.profiles.contains_key(&assignee_id) {
                return Err(DbError::not_found("assignee", assignee_id));
            }
        }

        let card = t
            .cards
            .get_mut(&card_id)
            .ok_or_else(|| DbError::not_found("card", card_id))?;

        if let Some(column_id) = changes.column_id {
            card.column_id = column_id;
        }
        if let Some(title) = &changes.title {
            card.title = title.clone();
        }
        if let Some(description) = &changes.description {
            card.description = description.clone();
        }
        if let Some(assignee_id) = changes.assignee_id {
            card.assignee_id = assignee_id;
        }
        if let Some(due_date) = changes.due_date {
            card.due_date = due_date;
        }
        if let Some(position) = changes.position {
            card.position = position;
        }
        card.updated_at = Utc::now();

        let card = card.clone();
        Ok(t.with_assignee(card))
    }

    async fn delete_card(&self, card_id: Uuid) -> Result<(), DbError> {
        let mut t = self.tables.write().await;
        if !t.cards.contains_key(&card_id) {
            return Err(DbError::not_found("card", card_id));
        }
        t.remove_card(card_id);
        Ok(())
    }

    async fn apply_positions(&self, writes: &[PositionWrite]) -> Result<(), DbError> {
        let mut t = self.tables.write().await;

        // validate first so a bad write leaves every row untouched
        for write in writes {
            match write {
                PositionWrite::Card {
                    card_id, column_id, ..
                } => {
                    if !t.cards.contains_key(card_id) {
                        return Err(DbError::not_found("card", card_id));
                    }
                    if !t.columns.contains_key(column_id) {
                        return Err(DbError::not_found("column", column_id));
                    }
                }
                PositionWrite::Column { column_id, .. } => {
                    if !t.columns.contains_key(column_id) {
                        return Err(DbError::not_found("column", column_id));
                    }
                }
            }
        }

        let now = Utc::now();
        for write in writes {
            match *write {
                PositionWrite::Card {
                    card_id,
                    column_id,
                    position,
                } => {
                    if let Some(card) = t.cards.get_mut(&card_id) {
                        card.column_id = column_id;
                        card.position = position;
                        card.updated_at = now;
                    }
                }
                PositionWrite::Column {
                    column_id,
                    position,
                } => {
                    if let Some(column) = t.columns.get_mut(&column_id) {
                        column.position = position;
                    }
                }
            }
        }
        Ok(())
    }

    async fn comments(&self, card_id: Uuid) -> Result<Vec<CommentWithAuthor>, DbError> {
        let t = self.tables.read().await;
        let mut comments: Vec<Comment> = t
            .comments
            .values()
            .filter(|c| c.card_id == card_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments.into_iter().map(|c| t.with_author(c)).collect())
    }

    async fn comment(&self, comment_id: Uuid) -> Result<Option<Comment>, DbError> {
        Ok(self.tables.read().await.comments.get(&comment_id).cloned())
    }

    async fn create_comment(&self, new: NewComment) -> Result<CommentWithAuthor, DbError> {
        let mut t = self.tables.write().await;
        if !t.cards.contains_key(&new.card_id) {
            return Err(DbError::not_found("card", new.card_id));
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            card_id: new.card_id,
            user_id: new.user_id,
            content: new.content,
            created_at: now,
            updated_at: now,
        };
        t.comments.insert(comment.id, comment.clone());
        Ok(t.with_author(comment))
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, DbError> {
        let mut t = self.tables.write().await;
        let comment = t
            .comments
            .get_mut(&comment_id)
            .ok_or_else(|| DbError::not_found("comment", comment_id))?;
        comment.content = content.to_owned();
        comment.updated_at = Utc::now();

        let comment = comment.clone();
        Ok(t.with_author(comment))
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<(), DbError> {
        let mut t = self.tables.write().await;
        t.comments
            .remove(&comment_id)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("comment", comment_id))
    }

    async fn record_activity(&self, new: NewActivity) -> Result<ActivityLog, DbError> {
        let mut t = self.tables.write().await;
        if !t.boards.contains_key(&new.board_id) {
            return Err(DbError::not_found("board", new.board_id));
        }

        let log = ActivityLog {
            id: Uuid::new_v4(),
            board_id: new.board_id,
            user_id: new.user_id,
            action: new.action,
            entity_type: new.entity_type,
            entity_id: new.entity_id,
            metadata: new.metadata,
            created_at: Utc::now(),
        };
        t.activity.push(log.clone());
        Ok(log)
    }

    async fn activity(&self, board_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>, DbError> {
        let t = self.tables.read().await;
        // pushed in insertion order, so reverse iteration is newest first
        Ok(t.activity
            .iter()
            .rev()
            .filter(|a| a.board_id == board_id)
            .take(limit.max(0) as usize)
            .map(|log| ActivityEntry {
                user: t.summary(log.user_id),
                log: log.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::Title;

    async fn seeded() -> (MemoryStore, Profile, Board) {
        let store = MemoryStore::new();
        let owner = store
            .create_profile(&Email::new("owner@example.com").unwrap(), Some("Owner"))
            .await
            .unwrap();
        let board = store
            .create_board(NewBoard {
                owner_id: owner.id,
                title: Title::new("Roadmap").unwrap(),
                description: None,
            })
            .await
            .unwrap();
        (store, owner, board)
    }

    #[tokio::test]
    async fn new_board_has_owner_and_default_columns() {
        let (store, owner, board) = seeded().await;

        let columns = store.columns(board.id).await.unwrap();
        let titles: Vec<&str> = columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, DEFAULT_COLUMNS);
        assert_eq!(
            columns.iter().map(|c| c.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        let membership = store.membership(board.id, owner.id).await.unwrap().unwrap();
        assert_eq!(membership.role, Role::Owner);
    }

    #[tokio::test]
    async fn deleting_a_column_removes_its_cards_and_comments() {
        let (store, owner, board) = seeded().await;
        let column = store.columns(board.id).await.unwrap().remove(0);
        let card = store
            .create_card(NewCard {
                column_id: column.id,
                title: Title::new("Task").unwrap(),
                description: None,
                assignee_id: None,
                due_date: None,
                position: None,
            })
            .await
            .unwrap();
        let comment = store
            .create_comment(NewComment {
                card_id: card.card.id,
                user_id: owner.id,
                content: "looks good".into(),
            })
            .await
            .unwrap();

        store.delete_column(column.id).await.unwrap();

        assert!(store.card(card.card.id).await.unwrap().is_none());
        assert!(store.comment(comment.comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cards_append_by_default() {
        let (store, _owner, board) = seeded().await;
        let column = store.columns(board.id).await.unwrap().remove(0);

        for title in ["a", "b", "c"] {
            store
                .create_card(NewCard {
                    column_id: column.id,
                    title: Title::new(title).unwrap(),
                    description: None,
                    assignee_id: None,
                    due_date: None,
                    position: None,
                })
                .await
                .unwrap();
        }

        let positions: Vec<i32> = store
            .cards(column.id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn duplicate_member_conflicts() {
        let (store, owner, board) = seeded().await;
        let err = store
            .add_member(board.id, owner.id, Role::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn apply_positions_is_all_or_nothing() {
        let (store, _owner, board) = seeded().await;
        let column = store.columns(board.id).await.unwrap().remove(0);

        let err = store
            .apply_positions(&[
                PositionWrite::Column {
                    column_id: column.id,
                    position: 9,
                },
                PositionWrite::Card {
                    card_id: Uuid::new_v4(),
                    column_id: column.id,
                    position: 0,
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { resource: "card", .. }));
        assert_eq!(store.column(column.id).await.unwrap().unwrap().position, 0);
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() {
        let (store, owner, _board) = seeded().await;
        store
            .create_session(owner.id, "live", None)
            .await
            .unwrap();
        store
            .create_session(owner.id, "stale", Some(Utc::now() - chrono::Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(
            store.resolve_session("live").await.unwrap().map(|p| p.id),
            Some(owner.id)
        );
        assert!(store.resolve_session("stale").await.unwrap().is_none());
        assert!(store.resolve_session("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn activity_is_newest_first_and_limited() {
        let (store, owner, board) = seeded().await;
        for action in [
            kanban_core::ActivityAction::Created,
            kanban_core::ActivityAction::Updated,
            kanban_core::ActivityAction::Moved,
        ] {
            store
                .record_activity(NewActivity {
                    board_id: board.id,
                    user_id: owner.id,
                    action,
                    entity_type: kanban_core::EntityType::Board,
                    entity_id: board.id,
                    metadata: serde_json::json!({}),
                })
                .await
                .unwrap();
        }

        let entries = store.activity(board.id, 2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].log.action, kanban_core::ActivityAction::Moved);
        assert_eq!(entries[0].user.as_ref().map(|u| u.id), Some(owner.id));
    }
}
