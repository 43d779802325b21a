//! Schema migrations for the kanban tables
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so this runs on each
//! server start and from `kanban migrate`.

use sqlx::PgPool;

use crate::store::DbError;

const TABLES: &[(&str, &str)] = &[
    (
        "profiles",
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email TEXT NOT NULL UNIQUE,
            full_name TEXT,
            avatar_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "sessions",
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            expires_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "boards",
        r#"
        CREATE TABLE IF NOT EXISTS boards (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT,
            owner_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "board_members",
        r#"
        CREATE TABLE IF NOT EXISTS board_members (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            role TEXT NOT NULL DEFAULT 'member'
                CHECK (role IN ('owner', 'admin', 'member')),
            joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (board_id, user_id)
        )
        "#,
    ),
    (
        "board_columns",
        r#"
        CREATE TABLE IF NOT EXISTS board_columns (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "cards",
        r#"
        CREATE TABLE IF NOT EXISTS cards (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            column_id UUID NOT NULL REFERENCES board_columns(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            assignee_id UUID REFERENCES profiles(id) ON DELETE SET NULL,
            due_date TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "comments",
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            card_id UUID NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "activity_logs",
        r#"
        CREATE TABLE IF NOT EXISTS activity_logs (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            action TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id UUID NOT NULL,
            metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_boards_owner ON boards(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_board_members_user ON board_members(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_board_columns_board ON board_columns(board_id, position)",
    "CREATE INDEX IF NOT EXISTS idx_cards_column ON cards(column_id, position)",
    "CREATE INDEX IF NOT EXISTS idx_cards_assignee ON cards(assignee_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_card ON comments(card_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_activity_board ON activity_logs(board_id, created_at DESC)",
];

/// Create all tables and indexes.
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running kanban migrations...");

    for (table, ddl) in TABLES {
        tracing::debug!(table, "ensuring table");
        sqlx::query(ddl).execute(pool).await?;
    }

    create_indexes(pool).await?;

    tracing::info!("Kanban migrations complete");
    Ok(())
}

async fn create_indexes(pool: &PgPool) -> Result<(), DbError> {
    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_created_parents_first() {
        let order: Vec<&str> = TABLES.iter().map(|(name, _)| *name).collect();
        let index = |name: &str| order.iter().position(|t| *t == name).unwrap();

        assert!(index("profiles") < index("boards"));
        assert!(index("boards") < index("board_columns"));
        assert!(index("board_columns") < index("cards"));
        assert!(index("cards") < index("comments"));
    }

    #[test]
    fn child_tables_cascade() {
        for (table, ddl) in TABLES {
            if ddl.contains("REFERENCES boards")
                || ddl.contains("REFERENCES board_columns")
                || ddl.contains("REFERENCES cards")
            {
                assert!(ddl.contains("ON DELETE CASCADE"), "{table} should cascade");
            }
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_are_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();

        run(&pool).await.unwrap();
        run(&pool).await.unwrap();
    }
}
