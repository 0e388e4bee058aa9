pub mod chesscom;
pub mod discord;
pub mod logging;
pub mod memory;

pub use chesscom::ChessComSource;
pub use discord::DiscordMemberDirectory;
pub use logging::LoggingMemberDirectory;
pub use memory::InMemoryMemberDirectory;
