//! Command-line definitions for the `todo` binary.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use todo_store::TodoItemState;

/// todo - manage todo lists and items in the configured store
#[derive(Parser, Debug)]
#[command(
    name = "todo",
    version,
    about = "Manage todo lists and items",
    long_about = "Manage todo lists and items.\n\n\
                  The store is selected with TODO_STORE_BACKEND (document|memory), \
                  TODO_STORE_ENDPOINT and TODO_STORE_DATABASE."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List todo lists
    Lists {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Create a todo list
    ListCreate {
        /// List name
        name: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show one todo list
    ListShow { list_id: String },

    /// Update a todo list
    ListUpdate {
        list_id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a todo list and all of its items
    ListDelete { list_id: String },

    /// List the items of a todo list
    Items {
        list_id: String,

        /// Only items in this state: todo, inprogress, done
        #[arg(short, long)]
        state: Option<TodoItemState>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Add an item to a todo list
    ItemAdd {
        list_id: String,

        /// Item name
        name: String,

        #[command(flatten)]
        fields: ItemFields,
    },

    /// Show one item of a todo list
    ItemShow { list_id: String, item_id: String },

    /// Update an item of a todo list
    ItemUpdate {
        list_id: String,
        item_id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        fields: ItemFields,
    },

    /// Delete an item of a todo list
    ItemDelete { list_id: String, item_id: String },

    /// Move several items of a list to one state
    ItemsState {
        list_id: String,

        /// Target state: todo, inprogress, done
        state: TodoItemState,

        /// Item ids
        #[arg(required = true)]
        item_ids: Vec<String>,
    },
}

/// Paging window, passed through the same parser HTTP query values use.
#[derive(Args, Debug)]
pub struct PageArgs {
    /// Records to skip
    #[arg(long)]
    pub skip: Option<String>,

    /// Maximum records to return (default 20)
    #[arg(long)]
    pub top: Option<String>,
}

#[derive(Args, Debug)]
pub struct ItemFields {
    #[arg(short, long)]
    pub description: Option<String>,

    /// todo, inprogress or done
    #[arg(short, long)]
    pub state: Option<TodoItemState>,

    /// RFC 3339 timestamp, e.g. 2030-01-31T09:00:00Z
    #[arg(long)]
    pub due: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};
    use todo_store::TodoItemState;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bulk_state_command() {
        let cli = Cli::try_parse_from(["todo", "items-state", "l1", "done", "a", "b"]).unwrap();
        match cli.command {
            Command::ItemsState {
                list_id,
                state,
                item_ids,
            } => {
                assert_eq!(list_id, "l1");
                assert_eq!(state, TodoItemState::Done);
                assert_eq!(item_ids, ["a", "b"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_state() {
        assert!(Cli::try_parse_from(["todo", "items", "l1", "--state", "blocked"]).is_err());
    }
}
