use crate::database::models::{TodoItemRecord, TodoListRecord};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteTodoRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_list(row: &Row<'_>) -> rusqlite::Result<TodoListRecord> {
    Ok(TodoListRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        pinned: row.get::<_, i64>(3)? != 0,
        created_at: row.get(4)?,
    })
}

fn map_item(row: &Row<'_>) -> rusqlite::Result<TodoItemRecord> {
    Ok(TodoItemRecord {
        id: row.get(0)?,
        list_id: row.get(1)?,
        text: row.get(2)?,
        completed: row.get::<_, i64>(3)? != 0,
        display_order: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl<'conn> super::TodoRepository for SqliteTodoRepository<'conn> {
    fn create_list(&self, record: &TodoListRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO todo_lists (id, title, description, pinned, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.title,
                record.description,
                if record.pinned { 1 } else { 0 },
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn update_list(&self, id: &str, title: &str, description: Option<&str>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE todo_lists SET title = ?2, description = ?3 WHERE id = ?1",
            params![id, title, description],
        )?;
        Ok(changed > 0)
    }

    fn get_list(&self, id: &str) -> Result<Option<TodoListRecord>> {
        let list = self
            .conn
            .query_row(
                "SELECT id, title, description, pinned, created_at FROM todo_lists WHERE id = ?1",
                params![id],
                map_list,
            )
            .optional()?;
        Ok(list)
    }

    fn list_lists(&self) -> Result<Vec<TodoListRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, pinned, created_at FROM todo_lists ORDER BY pinned DESC, created_at DESC",
        )?;
        let lists = stmt
            .query_map([], map_list)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    fn set_pinned(&self, id: &str, pinned: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE todo_lists SET pinned = ?2 WHERE id = ?1",
            params![id, if pinned { 1 } else { 0 }],
        )?;
        Ok(changed > 0)
    }

    fn count_pinned(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM todo_lists WHERE pinned = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn delete_list(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM todo_lists WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn add_item(&self, record: &TodoItemRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO todo_items (id, list_id, text, completed, display_order, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.list_id,
                record.text,
                if record.completed { 1 } else { 0 },
                record.display_order,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn update_item(&self, id: &str, text: Option<&str>, completed: Option<bool>) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE todo_items SET
                text = COALESCE(?2, text),
                completed = COALESCE(?3, completed)
            WHERE id = ?1
            "#,
            params![id, text, completed.map(|done| if done { 1 } else { 0 })],
        )?;
        Ok(changed > 0)
    }

    fn get_item(&self, id: &str) -> Result<Option<TodoItemRecord>> {
        let item = self
            .conn
            .query_row(
                "SELECT id, list_id, text, completed, display_order, created_at FROM todo_items WHERE id = ?1",
                params![id],
                map_item,
            )
            .optional()?;
        Ok(item)
    }

    fn delete_item(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM todo_items WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn items_for_list(&self, list_id: &str) -> Result<Vec<TodoItemRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, list_id, text, completed, display_order, created_at
            FROM todo_items
            WHERE list_id = ?1
            ORDER BY display_order ASC, created_at ASC
            "#,
        )?;
        let items = stmt
            .query_map(params![list_id], map_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn next_item_order(&self, list_id: &str) -> Result<i64> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(display_order) + 1, 0) FROM todo_items WHERE list_id = ?1",
            params![list_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }
}
