//! Line commands typed at the shop prompt, and their dispatch to the
//! controller.

use std::sync::Arc;

use client_core::{CheckoutOutcome, ShopController, SortDirection, SortKey};
use shared::domain::LessonId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopCommand {
    List,
    Sort {
        key: SortKey,
        direction: SortDirection,
    },
    Search(String),
    Add(LessonId),
    Remove(usize),
    Cart,
    Name(String),
    Phone(String),
    Card(String),
    Expiry(String),
    Cvc(String),
    Checkout,
    Help,
    Quit,
}

impl ShopCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Sort { .. } => "sort",
            Self::Search(_) => "search",
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Cart => "cart",
            Self::Name(_) => "name",
            Self::Phone(_) => "phone",
            Self::Card(_) => "card",
            Self::Expiry(_) => "expiry",
            Self::Cvc(_) => "cvc",
            Self::Checkout => "checkout",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

pub const HELP: &str = "\
commands:
  list                                   show lessons
  sort <topic|location|price|space> [asc|desc]
  search <text>                          filter lessons (empty text shows all)
  add <lesson-id>                        put one seat in the cart
  remove <index>                         take a cart entry out
  cart                                   show or hide the cart
  name <text> | phone <digits>           customer details
  card <number> | expiry <MM/YY> | cvc <digits>
  checkout                               place the order
  help | quit";

/// Parses one input line. Field values keep their inner whitespace so that
/// validation sees exactly what was typed.
pub fn parse_command(line: &str) -> Result<ShopCommand, String> {
    let line = line.trim_start();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_end()),
        None => (line.trim_end(), ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => ShopCommand::List,
        "sort" => {
            let mut parts = rest.split_whitespace();
            let key = parts
                .next()
                .ok_or_else(|| "usage: sort <topic|location|price|space> [asc|desc]".to_string())?
                .parse()?;
            let direction = match parts.next() {
                Some(direction) => direction.parse()?,
                None => SortDirection::Ascending,
            };
            ShopCommand::Sort { key, direction }
        }
        "search" => ShopCommand::Search(rest.to_string()),
        "add" => {
            let id = rest.trim();
            if id.is_empty() {
                return Err("usage: add <lesson-id>".into());
            }
            ShopCommand::Add(LessonId::new(id))
        }
        "remove" | "rm" => ShopCommand::Remove(
            rest.trim()
                .parse()
                .map_err(|_| format!("usage: remove <index>, got '{rest}'"))?,
        ),
        "cart" => ShopCommand::Cart,
        "name" => ShopCommand::Name(rest.to_string()),
        "phone" => ShopCommand::Phone(rest.to_string()),
        "card" => ShopCommand::Card(rest.to_string()),
        "expiry" => ShopCommand::Expiry(rest.to_string()),
        "cvc" => ShopCommand::Cvc(rest.to_string()),
        "checkout" => ShopCommand::Checkout,
        "help" | "?" => ShopCommand::Help,
        "quit" | "exit" | "q" => ShopCommand::Quit,
        "" => return Err(String::new()),
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(command)
}

pub enum Dispatch {
    Continue(Option<String>),
    Quit,
}

/// Applies a command and returns what the prompt should print afterwards.
pub async fn dispatch_command(shop: &Arc<ShopController>, command: ShopCommand) -> Dispatch {
    tracing::debug!(command = command.name(), "dispatching shop command");

    let message = match command {
        ShopCommand::List => None,
        ShopCommand::Sort { key, direction } => {
            shop.set_sort(key, direction).await;
            None
        }
        ShopCommand::Search(text) => {
            shop.on_search_input(&text);
            Some("searching...".to_string())
        }
        ShopCommand::Add(id) => {
            if shop.add_to_cart(&id).await {
                None
            } else {
                Some(format!("lesson {id} cannot be added"))
            }
        }
        ShopCommand::Remove(index) => match shop.remove_from_cart(index).await {
            Ok(true) => None,
            Ok(false) => Some("the cart is locked while an order is being placed".to_string()),
            Err(err) => Some(err.to_string()),
        },
        ShopCommand::Cart => {
            if shop.toggle_cart().await {
                None
            } else {
                Some("showing lessons".to_string())
            }
        }
        ShopCommand::Name(name) => {
            shop.set_customer_name(&name).await;
            None
        }
        ShopCommand::Phone(phone) => {
            shop.set_customer_phone(&phone).await;
            None
        }
        ShopCommand::Card(number) => {
            shop.set_card_number(&number).await;
            None
        }
        ShopCommand::Expiry(expiry) => {
            shop.set_card_expiry(&expiry).await;
            None
        }
        ShopCommand::Cvc(cvc) => {
            shop.set_card_cvc(&cvc).await;
            None
        }
        ShopCommand::Checkout => match shop.checkout().await {
            CheckoutOutcome::Blocked => {
                Some("fill in the cart and a valid name and phone first".to_string())
            }
            CheckoutOutcome::AlreadySubmitting => {
                Some("an order is already being placed".to_string())
            }
            CheckoutOutcome::Placed => Some(shop.snapshot().await.confirmation),
            CheckoutOutcome::Failed(message) => Some(message),
        },
        ShopCommand::Help => Some(HELP.to_string()),
        ShopCommand::Quit => return Dispatch::Quit,
    };
    Dispatch::Continue(message)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
