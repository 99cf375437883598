//! Canonical field tables.
//!
//! Each rule lists the keys it is filled from, in priority order. The
//! canonical key itself always comes first, so a result that was already
//! normalized keeps its values.

/// One canonical field and the raw keys it may be taken from.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub canonical: &'static str,
    pub synonyms: &'static [&'static str],
}

/// Server-level fields.
pub const SERVER_FIELDS: &[FieldRule] = &[
    FieldRule {
        canonical: "gq_hostname",
        synonyms: &["gq_hostname", "hostname", "sv_hostname", "servername", "host_name", "name"],
    },
    FieldRule {
        canonical: "gq_mapname",
        synonyms: &["gq_mapname", "mapname", "map", "map_name"],
    },
    FieldRule {
        canonical: "gq_numplayers",
        synonyms: &["gq_numplayers", "numplayers", "num_players", "clients", "playercount"],
    },
    FieldRule {
        canonical: "gq_maxplayers",
        synonyms: &[
            "gq_maxplayers",
            "maxplayers",
            "max_players",
            "sv_maxclients",
            "maxclients",
            "playersmax",
        ],
    },
    FieldRule {
        canonical: "gq_password",
        synonyms: &["gq_password", "password", "g_needpass", "passworded", "needpass", "pswrd"],
    },
    FieldRule {
        canonical: "gq_gametype",
        synonyms: &["gq_gametype", "gametype", "g_gametype", "game_type"],
    },
    FieldRule {
        canonical: "gq_mod",
        synonyms: &["gq_mod", "game", "gamename", "mod", "game_dir", "folder"],
    },
];

/// Per-player fields.
pub const PLAYER_FIELDS: &[FieldRule] = &[
    FieldRule {
        canonical: "gq_name",
        synonyms: &["gq_name", "name", "player", "playername"],
    },
    FieldRule {
        canonical: "gq_score",
        synonyms: &["gq_score", "score", "frags", "points"],
    },
    FieldRule {
        canonical: "gq_ping",
        synonyms: &["gq_ping", "ping"],
    },
];
