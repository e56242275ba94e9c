//! # Choir Songbook
//!
//! Song-code resolution and lookup for a choir's hymn, lyric and convention
//! books.
//!
//! Songs are addressed by short codes such as `H-27` (hymn 27), `L-5`
//! (lyric 5) or `C-12` (convention song 12). The crate loads the song sheets,
//! the service records of which songs were sung when, and the hymn tune
//! sheet from a [`source::SongSource`], and answers questions like "what is
//! H-27", "when did we last sing it" and "is it in our current repertoire".
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │ SongSource  │──▶│   Ingest    │──▶│    Generation     │
//! │ JSON/Memory │   │ parse+clean │   │ store+vocabulary │
//! └─────────────┘   └─────────────┘   └────────┬─────────┘
//!                                              │ publish (swap)
//!                                              ▼
//!                                        ┌──────────┐
//!                                        │ Catalog  │
//!                                        └────┬─────┘
//!                                             │ snapshot
//!                                ┌────────────┤
//!                                ▼            ▼
//!                          ┌──────────┐  ┌──────────┐
//!                          │ SongQuery│─▶│  reply   │
//!                          └──────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! songbook sources                  # check the export files are present
//! songbook stats                    # load and summarize the catalog
//! songbook check H-27               # catalog and vocabulary status
//! songbook resolve "can we sing h 27?"
//! songbook last L-5                 # sung history
//! songbook search amazing grace     # title and first-line search
//! songbook unused --period 6months  # repertoire gone quiet
//! songbook vocabulary
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`code`] | Song-code parsing and formatting |
//! | [`models`] | Core data types |
//! | [`store`] | In-memory song lists, sung dates and tunes |
//! | [`vocabulary`] | Repertoire derived from recent sung history |
//! | [`source`] | Source trait and in-memory source |
//! | [`connector_fs`] | JSON export directory source |
//! | [`ingest`] | Row cleaning and store building |
//! | [`catalog`] | Published generations and reload |
//! | [`query`] | Lookup façade for handlers |
//! | [`reply`] | Plain-text rendering of results |
//! | [`config`] | TOML configuration parsing |
//! | [`stats`] | Catalog summary command |
//! | [`sources`] | Source file listing command |

pub mod catalog;
pub mod code;
pub mod config;
pub mod connector_fs;
pub mod ingest;
pub mod models;
pub mod query;
pub mod reply;
pub mod source;
pub mod sources;
pub mod stats;
pub mod store;
pub mod vocabulary;
