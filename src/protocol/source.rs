//! Valve A2S protocol (Source engine servers).
//!
//! # Exchanges
//! ```text
//! A2S_INFO:   FF FF FF FF 'T' "Source Engine Query\0" [challenge]  →  'I' ...
//! A2S_PLAYER: FF FF FF FF 'U' <challenge>                           →  'D' ...
//! A2S_RULES:  FF FF FF FF 'V' <challenge>                           →  'E' ...
//! Any of them may first answer 'A' <challenge>; the request is then
//! repeated once with that challenge appended.
//! ```
//!
//! Replies larger than one datagram arrive as split packets
//! (`FE FF FF FF`), which are reassembled before decoding. Compressed
//! split replies are rejected.

use async_trait::async_trait;

use super::status::ServerStatus;
use super::value::{QueryResult, QueryValue};
use super::{ProtocolError, ProtocolPlugin, QueryTarget};
use crate::dispatch::Link;

const SINGLE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
const SPLIT: [u8; 4] = [0xFE, 0xFF, 0xFF, 0xFF];
const NO_CHALLENGE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

const INFO_REQUEST: u8 = b'T';
const INFO_REPLY: u8 = b'I';
const PLAYER_REQUEST: u8 = b'U';
const PLAYER_REPLY: u8 = b'D';
const RULES_REQUEST: u8 = b'V';
const RULES_REPLY: u8 = b'E';
const CHALLENGE_REPLY: u8 = b'A';

/// Source engine family.
#[derive(Debug, Default)]
pub struct SourceEngine;

#[async_trait]
impl ProtocolPlugin for SourceEngine {
    fn family(&self) -> &'static str {
        "source"
    }

    async fn query(
        &self,
        link: &mut Link,
        target: &QueryTarget,
    ) -> Result<ServerStatus, ProtocolError> {
        let info = exchange(link, INFO_REPLY, |challenge| {
            let mut request = SINGLE.to_vec();
            request.push(INFO_REQUEST);
            request.extend_from_slice(b"Source Engine Query\0");
            if let Some(challenge) = challenge {
                request.extend_from_slice(&challenge);
            }
            request
        })
        .await?;
        let (server, mut extras) = parse_info(&info)?;

        let players = if target.wants('p') {
            let reply = exchange(link, PLAYER_REPLY, challenged_request(PLAYER_REQUEST)).await?;
            parse_players(&reply)?
        } else {
            Vec::new()
        };

        if target.wants('e') {
            let reply = exchange(link, RULES_REPLY, challenged_request(RULES_REQUEST)).await?;
            extras.extend(parse_rules(&reply)?);
        }

        Ok(ServerStatus { server, extras, players })
    }
}

fn challenged_request(kind: u8) -> impl Fn(Option<[u8; 4]>) -> Vec<u8> {
    move |challenge| {
        let mut request = SINGLE.to_vec();
        request.push(kind);
        request.extend_from_slice(&challenge.unwrap_or(NO_CHALLENGE));
        request
    }
}

/// Send a request, answering at most one challenge, and return the reply
/// payload after its type byte.
async fn exchange(
    link: &mut Link,
    expected: u8,
    build: impl Fn(Option<[u8; 4]>) -> Vec<u8>,
) -> Result<Vec<u8>, ProtocolError> {
    let mut challenge = None;
    loop {
        link.send(&build(challenge)).await?;
        let message = read_message(link).await?;
        let (&kind, payload) = message
            .split_first()
            .ok_or_else(|| ProtocolError::Malformed("empty reply".into()))?;

        match kind {
            CHALLENGE_REPLY if challenge.is_none() => {
                let mut reader = PacketReader::new(payload);
                challenge = Some(reader.array::<4>()?);
            }
            kind if kind == expected => return Ok(payload.to_vec()),
            kind => return Err(ProtocolError::UnexpectedType(kind)),
        }
    }
}

/// Read one logical message, reassembling split packets.
async fn read_message(link: &mut Link) -> Result<Vec<u8>, ProtocolError> {
    let first = link.recv().await?;
    if let Some(message) = first.strip_prefix(&SINGLE) {
        return Ok(message.to_vec());
    }
    if !first.starts_with(&SPLIT) {
        return Err(ProtocolError::Malformed("unknown packet header".into()));
    }

    let mut fragments = SplitAssembler::default();
    let mut packet = first;
    loop {
        if let Some(message) = fragments.push(&packet)? {
            return message
                .strip_prefix(&SINGLE)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| ProtocolError::Malformed("reassembled reply lacks header".into()));
        }
        packet = link.recv().await?;
    }
}

/// Collects the fragments of one split reply.
#[derive(Debug, Default)]
struct SplitAssembler {
    id: Option<u32>,
    fragments: Vec<Option<Vec<u8>>>,
}

impl SplitAssembler {
    fn push(&mut self, packet: &[u8]) -> Result<Option<Vec<u8>>, ProtocolError> {
        let mut reader = PacketReader::new(packet);
        if reader.array::<4>()? != SPLIT {
            return Err(ProtocolError::Malformed("expected split packet".into()));
        }
        let id = reader.u32()?;
        if id & 0x8000_0000 != 0 {
            return Err(ProtocolError::Malformed(
                "compressed split replies are not supported".into(),
            ));
        }
        let total = usize::from(reader.u8()?);
        let number = usize::from(reader.u8()?);
        let _size = reader.u16()?;

        if total == 0 || number >= total {
            return Err(ProtocolError::Malformed(format!("fragment {number} of {total}")));
        }
        match self.id {
            None => {
                self.id = Some(id);
                self.fragments = vec![None; total];
            }
            Some(current) if current != id || self.fragments.len() != total => {
                return Err(ProtocolError::Malformed("interleaved split replies".into()));
            }
            Some(_) => {}
        }

        self.fragments[number] = Some(reader.rest().to_vec());
        if self.fragments.iter().any(Option::is_none) {
            return Ok(None);
        }
        Ok(Some(self.fragments.iter().flatten().flatten().copied().collect()))
    }
}

fn parse_info(payload: &[u8]) -> Result<(QueryResult, QueryResult), ProtocolError> {
    let mut r = PacketReader::new(payload);
    let mut server = QueryResult::new();
    let mut extras = QueryResult::new();

    extras.insert("protocol".into(), r.u8()?.into());
    server.insert("hostname".into(), r.string()?.into());
    server.insert("mapname".into(), r.string()?.into());
    extras.insert("folder".into(), r.string()?.into());
    server.insert("game".into(), r.string()?.into());
    extras.insert("appid".into(), QueryValue::Int(i64::from(r.u16()?)));
    let players = r.u8()?;
    let max_players = r.u8()?;
    let bots = r.u8()?;
    server.insert("numplayers".into(), players.into());
    server.insert("maxplayers".into(), max_players.into());
    extras.insert("bots".into(), bots.into());
    extras.insert("dedicated".into(), char::from(r.u8()?).to_string().into());
    extras.insert("os".into(), char::from(r.u8()?).to_string().into());
    server.insert("password".into(), QueryValue::Bool(r.u8()? != 0));
    extras.insert("secure".into(), QueryValue::Bool(r.u8()? != 0));
    server.insert("version".into(), r.string()?.into());

    if r.is_empty() {
        return Ok((server, extras));
    }
    let edf = r.u8()?;
    if edf & 0x80 != 0 {
        extras.insert("port".into(), QueryValue::Int(i64::from(r.u16()?)));
    }
    if edf & 0x10 != 0 {
        extras.insert("steamid".into(), r.u64()?.to_string().into());
    }
    if edf & 0x40 != 0 {
        extras.insert("tv_port".into(), QueryValue::Int(i64::from(r.u16()?)));
        extras.insert("tv_name".into(), r.string()?.into());
    }
    if edf & 0x20 != 0 {
        extras.insert("keywords".into(), r.string()?.into());
    }
    if edf & 0x01 != 0 {
        extras.insert("gameid".into(), r.u64()?.to_string().into());
    }
    Ok((server, extras))
}

fn parse_players(payload: &[u8]) -> Result<Vec<QueryResult>, ProtocolError> {
    let mut r = PacketReader::new(payload);
    let count = r.u8()?;
    let mut players = Vec::with_capacity(usize::from(count));

    for _ in 0..count {
        let _index = r.u8()?;
        let mut player = QueryResult::new();
        player.insert("name".into(), r.string()?.into());
        player.insert("score".into(), QueryValue::Int(i64::from(r.i32()?)));
        player.insert("time".into(), QueryValue::Float(f64::from(r.f32()?)));
        players.push(player);
    }
    Ok(players)
}

fn parse_rules(payload: &[u8]) -> Result<QueryResult, ProtocolError> {
    let mut r = PacketReader::new(payload);
    let count = r.u16()?;
    let mut rules = QueryResult::new();
    for _ in 0..count {
        let name = r.string()?;
        let value = r.string()?;
        rules.insert(name, value.into());
    }
    Ok(rules)
}

/// Little-endian cursor over a reply payload.
struct PacketReader<'a> {
    buf: &'a [u8],
}

impl<'a> PacketReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn rest(&self) -> &'a [u8] {
        self.buf
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.buf.len() < n {
            return Err(ProtocolError::Malformed("truncated reply".into()));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, ProtocolError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, ProtocolError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn f32(&mut self) -> Result<f32, ProtocolError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    /// NUL-terminated string, decoded lossily.
    fn string(&mut self) -> Result<String, ProtocolError> {
        let end = self
            .buf
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| ProtocolError::Malformed("unterminated string".into()))?;
        let text = String::from_utf8_lossy(&self.buf[..end]).into_owned();
        self.buf = &self.buf[end + 1..];
        Ok(text)
    }
}
