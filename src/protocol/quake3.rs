//! Quake III `getstatus` protocol.
//!
//! ```text
//! request:  FF FF FF FF "getstatus\n"
//! response: FF FF FF FF "statusResponse\n"
//!           "\key\value\key\value..." "\n"
//!           one line per player: <score> <ping> "<name>" "\n"
//! ```

use async_trait::async_trait;

use super::status::ServerStatus;
use super::value::{QueryResult, QueryValue};
use super::{ProtocolError, ProtocolPlugin, QueryTarget};
use crate::dispatch::Link;

const REQUEST: &[u8] = b"\xFF\xFF\xFF\xFFgetstatus\n";
const RESPONSE_HEADER: &[u8] = b"\xFF\xFF\xFF\xFFstatusResponse";

/// Quake III engine family (ioquake3, OpenArena, Urban Terror, ET).
#[derive(Debug, Default)]
pub struct Quake3;

#[async_trait]
impl ProtocolPlugin for Quake3 {
    fn family(&self) -> &'static str {
        "quake3"
    }

    async fn query(
        &self,
        link: &mut Link,
        target: &QueryTarget,
    ) -> Result<ServerStatus, ProtocolError> {
        link.send(REQUEST).await?;
        let packet = link.recv().await?;
        let mut status = parse_status(&packet)?;
        if !target.wants('p') {
            status.players.clear();
        }
        Ok(status)
    }
}

/// Decode a `statusResponse` packet.
pub fn parse_status(packet: &[u8]) -> Result<ServerStatus, ProtocolError> {
    let body = packet
        .strip_prefix(RESPONSE_HEADER)
        .ok_or_else(|| ProtocolError::Malformed("missing statusResponse header".into()))?;
    let text = String::from_utf8_lossy(body);
    let mut lines = text.split('\n');

    // Remainder of the header line; some servers omit the newline.
    if !lines.next().map_or(true, |rest| rest.trim().is_empty()) {
        return Err(ProtocolError::Malformed("trailing bytes after header".into()));
    }

    let vars_line = lines
        .next()
        .ok_or_else(|| ProtocolError::Malformed("missing variable list".into()))?;
    let extras = parse_vars(vars_line)?;

    let players = lines
        .filter(|line| !line.trim().is_empty())
        .map(parse_player)
        .collect::<Result<Vec<_>, _>>()?;

    let server = summarize(&extras, players.len());
    Ok(ServerStatus { server, extras, players })
}

fn parse_vars(line: &str) -> Result<QueryResult, ProtocolError> {
    let line = line.strip_prefix('\\').unwrap_or(line);
    let mut vars = QueryResult::new();
    if line.is_empty() {
        return Ok(vars);
    }

    let mut parts = line.split('\\');
    while let Some(key) = parts.next() {
        let value = parts
            .next()
            .ok_or_else(|| ProtocolError::Malformed(format!("variable '{key}' has no value")))?;
        vars.insert(key.to_string(), QueryValue::from(value));
    }
    Ok(vars)
}

fn parse_player(line: &str) -> Result<QueryResult, ProtocolError> {
    let mut fields = line.trim().splitn(3, ' ');
    let (Some(score), Some(ping), Some(name)) = (fields.next(), fields.next(), fields.next()) else {
        return Err(ProtocolError::Malformed(format!("bad player line '{line}'")));
    };

    let mut player = QueryResult::new();
    player.insert("score".into(), score.into());
    player.insert("ping".into(), ping.into());
    player.insert("name".into(), name.trim().trim_matches('"').into());
    Ok(player)
}

fn summarize(vars: &QueryResult, player_count: usize) -> QueryResult {
    const SUMMARY: &[(&str, &str)] = &[
        ("sv_hostname", "hostname"),
        ("mapname", "mapname"),
        ("sv_maxclients", "maxplayers"),
        ("g_needpass", "password"),
        ("g_gametype", "gametype"),
        ("gamename", "game"),
        ("version", "version"),
    ];

    let mut server = QueryResult::new();
    for (source, target) in SUMMARY {
        if let Some(value) = vars.get(*source) {
            server.insert((*target).to_string(), value.clone());
        }
    }
    server.insert("numplayers".into(), QueryValue::Int(player_count as i64));
    server
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"\xFF\xFF\xFF\xFFstatusResponse\n\
        \\sv_hostname\\Test Arena\\mapname\\q3dm17\\sv_maxclients\\16\
        \\g_needpass\\0\\gamename\\baseq3\n\
        12 48 \"Sarge\"\n\
        -1 999 \"Anarki the Bot\"\n";

    #[test]
    fn test_parse_status() {
        let status = parse_status(SAMPLE).unwrap();
        assert_eq!(status.server["hostname"], QueryValue::from("Test Arena"));
        assert_eq!(status.server["numplayers"], QueryValue::Int(2));
        assert_eq!(status.server["maxplayers"], QueryValue::from("16"));
        assert_eq!(status.extras.len(), 5);
        assert_eq!(status.players[1]["name"], QueryValue::from("Anarki the Bot"));
        assert_eq!(status.players[1]["score"], QueryValue::from("-1"));
    }

    #[test]
    fn test_empty_server() {
        let packet = b"\xFF\xFF\xFF\xFFstatusResponse\n\\sv_hostname\\Empty\n";
        let status = parse_status(packet).unwrap();
        assert!(status.players.is_empty());
        assert_eq!(status.server["numplayers"], QueryValue::Int(0));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_status(b"HTTP/1.1 200 OK\r\n").is_err());
        assert!(parse_status(b"\xFF\xFF\xFF\xFFstatusResponse\n\\odd").is_err());
        assert!(parse_status(b"\xFF\xFF\xFF\xFFstatusResponse\n\\a\\b\nnot-a-player\n").is_err());
    }
}
