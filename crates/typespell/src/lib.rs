//! # Typespell
//!
//! Server for a multiplayer typing race with spells: players race
//! through three rounds of typing, see a scoreboard between rounds,
//! and pick spells during the intermission that buff themselves or
//! sabotage the player ranked just ahead.
//!
//! The server is authoritative for room membership, round progression,
//! rankings, and spell resolution. Clients connect over WebSocket and
//! speak JSON: tagged commands in, tagged events out.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use typespell::TypespellServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), typespell::ServerError> {
//!     let server = TypespellServer::builder()
//!         .bind("0.0.0.0:3000")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use server::{TypespellServer, TypespellServerBuilder};

pub mod prelude {
    //! One-stop imports for server embedders.
    pub use crate::{ServerError, TypespellServer, TypespellServerBuilder};
    pub use typespell_protocol::{
        ClientCommand, PlayerId, RoomId, RoomStatus, ServerEvent, SpellId,
    };
    pub use typespell_timer::TimerConfig;
}
