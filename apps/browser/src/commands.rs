//! Line-oriented commands for the terminal browser.

use selection_core::{parse_item_id, VisibleRange};
use shared::domain::{CollectionKind, ItemId};

pub const HELP: &str = "\
commands:
  list [left|right]            show loaded rows
  more <left|right>            load the next page
  scroll <left|right> <a> <b>  report rows a..=b as visible
  filter <left|right> [text]   change a panel filter (debounced)
  select <id>                  move an item to the selection
  unselect <id>                move an item back to the universe
  move <id> <over-id>          drop a selected item onto another
  create <id>                  create a new item
  stats                        panel counters
  reload                       refetch both panels
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(Option<CollectionKind>),
    More(CollectionKind),
    Scroll(CollectionKind, VisibleRange),
    Filter(CollectionKind, String),
    Select(ItemId),
    Unselect(ItemId),
    Move { active: ItemId, over: ItemId },
    Create(String),
    Stats,
    Reload,
    Help,
    Quit,
}

fn panel(word: &str) -> Result<CollectionKind, String> {
    match word {
        "left" | "l" | "items" => Ok(CollectionKind::Universe),
        "right" | "r" | "selected" => Ok(CollectionKind::Selection),
        other => Err(format!("unknown panel '{other}', expected left or right")),
    }
}

fn id(word: Option<&str>) -> Result<ItemId, String> {
    let word = word.ok_or_else(|| "missing item id".to_string())?;
    parse_item_id(word).map_err(|err| err.user_message())
}

fn index(word: Option<&str>) -> Result<usize, String> {
    word.ok_or_else(|| "missing row index".to_string())?
        .parse()
        .map_err(|_| "row index must be a non-negative number".to_string())
}

pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let Some((verb, rest)) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .or_else(|| (!line.is_empty()).then_some((line, "")))
    else {
        return Ok(None);
    };
    let mut args = rest.split_whitespace();

    let command = match verb {
        "list" | "ls" => Command::List(args.next().map(panel).transpose()?),
        "more" => Command::More(panel(args.next().unwrap_or("left"))?),
        "scroll" => {
            let kind = panel(args.next().unwrap_or("left"))?;
            let start = index(args.next())?;
            let stop = index(args.next())?;
            Command::Scroll(kind, VisibleRange::new(start, stop))
        }
        "filter" | "f" => {
            let (kind, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Command::Filter(panel(kind)?, text.trim().to_string())
        }
        "select" | "add" => Command::Select(id(args.next())?),
        "unselect" | "rm" => Command::Unselect(id(args.next())?),
        "move" | "mv" => Command::Move {
            active: id(args.next())?,
            over: id(args.next())?,
        },
        "create" | "new" => Command::Create(rest.to_string()),
        "stats" => Command::Stats,
        "reload" => Command::Reload,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}'; try help")),
    };
    Ok(Some(command))
}
