use crate::database::models::{TodoItemRecord, TodoListRecord};
use crate::database::repositories::TodoRepository;
use crate::database::Database;
use crate::error::ServiceError;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_PINNED_LISTS: usize = 3;

#[derive(Clone)]
pub struct TodoService {
    database: Database,
}

impl TodoService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn list(&self) -> Result<Vec<TodoListView>> {
        self.database.with_repositories(|repos| {
            let todos = repos.todos();
            let lists = todos.list_lists()?;
            let mut views = Vec::with_capacity(lists.len());
            for list in lists {
                let items = todos.items_for_list(&list.id)?;
                views.push(TodoListView::from_record(list, items));
            }
            Ok(views)
        })
    }

    pub fn create_list(&self, input: CreateTodoListInput) -> Result<TodoListView> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::invalid("todo list title may not be empty"));
        }
        let record = TodoListRecord {
            id: Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            description: input.description.filter(|d| !d.trim().is_empty()),
            pinned: input.pinned,
            created_at: now_utc_iso(),
        };
        self.database.with_repositories(|repos| {
            let todos = repos.todos();
            if record.pinned {
                ensure_pin_capacity(todos.count_pinned()?)?;
            }
            todos.create_list(&record)
        })?;
        Ok(TodoListView::from_record(record, Vec::new()))
    }

    pub fn update_list(&self, id: &str, input: UpdateTodoListInput) -> Result<()> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::invalid("todo list title may not be empty"));
        }
        let updated = self.database.with_repositories(|repos| {
            repos
                .todos()
                .update_list(id, input.title.trim(), input.description.as_deref())
        })?;
        if !updated {
            return Err(ServiceError::not_found(format!("todo list {id}")));
        }
        Ok(())
    }

    /// Pins or unpins a list. Pinning fails once the pin limit is reached;
    /// re-pinning an already pinned list is a no-op.
    pub fn set_pinned(&self, id: &str, pinned: bool) -> Result<()> {
        self.database.with_repositories(|repos| {
            let todos = repos.todos();
            let list = todos
                .get_list(id)?
                .ok_or_else(|| ServiceError::not_found(format!("todo list {id}")))?;
            if pinned && !list.pinned {
                ensure_pin_capacity(todos.count_pinned()?)?;
            }
            todos.set_pinned(id, pinned)?;
            Ok(())
        })
    }

    pub fn delete_list(&self, id: &str) -> Result<()> {
        let deleted = self
            .database
            .with_repositories(|repos| repos.todos().delete_list(id))?;
        if !deleted {
            return Err(ServiceError::not_found(format!("todo list {id}")));
        }
        Ok(())
    }

    pub fn add_item(&self, list_id: &str, text: &str) -> Result<TodoItemRecord> {
        if text.trim().is_empty() {
            return Err(ServiceError::invalid("todo item text may not be empty"));
        }
        self.database.with_repositories(|repos| {
            let todos = repos.todos();
            if todos.get_list(list_id)?.is_none() {
                return Err(ServiceError::not_found(format!("todo list {list_id}")));
            }
            let record = TodoItemRecord {
                id: Uuid::new_v4().to_string(),
                list_id: list_id.to_string(),
                text: text.trim().to_string(),
                completed: false,
                display_order: todos.next_item_order(list_id)?,
                created_at: now_utc_iso(),
            };
            todos.add_item(&record)?;
            Ok(record)
        })
    }

    pub fn update_item(&self, id: &str, input: UpdateTodoItemInput) -> Result<TodoItemRecord> {
        if let Some(text) = &input.text {
            if text.trim().is_empty() {
                return Err(ServiceError::invalid("todo item text may not be empty"));
            }
        }
        self.database.with_repositories(|repos| {
            let todos = repos.todos();
            let text = input.text.as_deref().map(str::trim);
            if !todos.update_item(id, text, input.completed)? {
                return Err(ServiceError::not_found(format!("todo item {id}")));
            }
            todos
                .get_item(id)?
                .ok_or_else(|| ServiceError::not_found(format!("todo item {id}")))
        })
    }

    pub fn delete_item(&self, id: &str) -> Result<()> {
        let deleted = self
            .database
            .with_repositories(|repos| repos.todos().delete_item(id))?;
        if !deleted {
            return Err(ServiceError::not_found(format!("todo item {id}")));
        }
        Ok(())
    }
}

fn ensure_pin_capacity(currently_pinned: usize) -> Result<()> {
    if currently_pinned >= MAX_PINNED_LISTS {
        return Err(ServiceError::invalid(format!(
            "at most {MAX_PINNED_LISTS} todo lists may be pinned"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTodoListInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoListInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoItemInput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoListView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub pinned: bool,
    pub created_at: String,
    pub items: Vec<TodoItemRecord>,
}

impl TodoListView {
    fn from_record(record: TodoListRecord, items: Vec<TodoItemRecord>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            pinned: record.pinned,
            created_at: record.created_at,
            items,
        }
    }
}
