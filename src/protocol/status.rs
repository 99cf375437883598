//! Intermediate server status produced by plugins.
//!
//! # Responsibilities
//! - Hold the three sections every protocol can report (server, extras, players)
//! - Shape them into a `QueryResult` for the requested action
//!
//! Without an action the result is flat: extra variables, then the server
//! summary on top, then a `players` list. With an action each requested
//! letter becomes its own section (`s`, `e`, `p`).

use super::value::{QueryResult, QueryValue};
use crate::query::Action;

/// Raw status of one game server, before shaping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerStatus {
    /// Summary fields (host name, map, player counts).
    pub server: QueryResult,
    /// Every other variable or rule the server reported.
    pub extras: QueryResult,
    /// One map per connected player.
    pub players: Vec<QueryResult>,
}

impl ServerStatus {
    /// Shape the status into the result returned to the caller.
    pub fn into_result(self, action: Option<&Action>) -> QueryResult {
        match action {
            None => self.flatten(),
            Some(action) => self.sections(action),
        }
    }

    fn flatten(self) -> QueryResult {
        let mut result = self.extras;
        result.extend(self.server);
        let players = self.players.into_iter().map(QueryValue::Map).collect::<Vec<_>>();
        result.insert("players".to_string(), QueryValue::List(players));
        result
    }

    fn sections(self, action: &Action) -> QueryResult {
        let ServerStatus { server, extras, players } = self;
        let mut server = Some(server);
        let mut extras = Some(extras);
        let mut players = Some(players);
        let mut result = QueryResult::new();

        for letter in action.letters() {
            let section = match letter {
                's' => server.take().map(QueryValue::Map),
                'e' => extras.take().map(QueryValue::Map),
                'p' => players
                    .take()
                    .map(|list| QueryValue::List(list.into_iter().map(QueryValue::Map).collect())),
                _ => None,
            };
            if let Some(section) = section {
                result.insert(letter.to_string(), section);
            }
        }
        result
    }
}
