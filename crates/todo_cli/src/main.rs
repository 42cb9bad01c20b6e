//! `todo` command-line entry point.
//!
//! # Responsibility
//! - Load configuration from the environment and start logging.
//! - Configure one store gateway and run a single command against it.
//! - Print results as pretty JSON on stdout.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Command, ItemFields, PageArgs};
use log::info;
use serde::Serialize;
use todo_store::{
    init_logging, init_stderr_logging, AppConfig, ChainedCredential, Page, StoreGateway,
    TodoItemPatch, TodoItemService, TodoListPatch, TodoListService,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;
    start_logging(&config)?;

    let gateway = StoreGateway::new();
    gateway
        .configure(&config.database, &ChainedCredential::developer_default())
        .await
        .context("failed to connect to the todo store")?;
    info!(
        "event=cli_start module=cli status=ok role={} backend={}",
        config.observability.role_name, config.database.backend
    );

    let lists = TodoListService::from_gateway(&gateway)?;
    let items = TodoItemService::from_gateway(&gateway)?;
    run(cli.command, &lists, &items).await
}

fn start_logging(config: &AppConfig) -> Result<()> {
    let level = config.observability.level.as_str();
    match &config.observability.log_dir {
        Some(dir) => {
            let dir = dir
                .to_str()
                .context("TODO_LOG_DIR is not valid UTF-8")?;
            init_logging(level, dir)?;
        }
        None => init_stderr_logging(level)?,
    }
    Ok(())
}

async fn run(command: Command, lists: &TodoListService, items: &TodoItemService) -> Result<()> {
    match command {
        Command::Lists { page } => print_json(&lists.list_lists(parse_page(&page)?).await?),
        Command::ListCreate { name, description } => {
            let patch = TodoListPatch {
                name: Some(name),
                description,
            };
            print_json(&lists.create_list(patch).await?)
        }
        Command::ListShow { list_id } => match lists.get_list(&list_id).await? {
            Some(list) => print_json(&list),
            None => bail!("list {list_id} not found"),
        },
        Command::ListUpdate {
            list_id,
            name,
            description,
        } => {
            let patch = TodoListPatch { name, description };
            match lists.update_list(&list_id, patch).await? {
                Some(list) => print_json(&list),
                None => bail!("list {list_id} not found"),
            }
        }
        Command::ListDelete { list_id } => {
            let deletion = lists.delete_list(&list_id).await?;
            if !deletion.list_deleted {
                bail!(
                    "list {list_id} not found ({} orphaned items removed)",
                    deletion.items_deleted
                );
            }
            print_json(&serde_json::json!({
                "listId": list_id,
                "itemsDeleted": deletion.items_deleted,
            }))
        }
        Command::Items {
            list_id,
            state,
            page,
        } => {
            let page = parse_page(&page)?;
            let found = match state {
                Some(state) => items.list_items_by_state(&list_id, state, page).await?,
                None => items.list_items(&list_id, page).await?,
            };
            print_json(&found)
        }
        Command::ItemAdd {
            list_id,
            name,
            fields,
        } => {
            let patch = item_patch(Some(name), fields);
            print_json(&items.create_item(&list_id, patch).await?)
        }
        Command::ItemShow { list_id, item_id } => {
            match items.get_item(&list_id, &item_id).await? {
                Some(item) => print_json(&item),
                None => bail!("item {item_id} not found in list {list_id}"),
            }
        }
        Command::ItemUpdate {
            list_id,
            item_id,
            name,
            fields,
        } => match items
            .update_item(&list_id, &item_id, item_patch(name, fields))
            .await?
        {
            Some(item) => print_json(&item),
            None => bail!("item {item_id} not found in list {list_id}"),
        },
        Command::ItemDelete { list_id, item_id } => {
            if !items.delete_item(&list_id, &item_id).await? {
                bail!("item {item_id} not found in list {list_id}");
            }
            print_json(&serde_json::json!({ "id": item_id, "deleted": true }))
        }
        Command::ItemsState {
            list_id,
            state,
            item_ids,
        } => {
            let updated = items.transition_state(&list_id, state, &item_ids).await?;
            print_json(&serde_json::json!({
                "listId": list_id,
                "state": state,
                "updated": updated,
            }))
        }
    }
}

fn parse_page(args: &PageArgs) -> Result<Page> {
    Ok(Page::parse(args.skip.as_deref(), args.top.as_deref())?)
}

fn item_patch(name: Option<String>, fields: ItemFields) -> TodoItemPatch {
    TodoItemPatch {
        name,
        state: fields.state,
        description: fields.description,
        due_date: fields.due,
        ..TodoItemPatch::default()
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
