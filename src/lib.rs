pub mod aggregate;
pub mod cli;
pub mod counts;
pub mod demo_feed;
pub mod events;
pub mod export;
pub mod feed;
pub mod filter;
pub mod resolve;
pub mod sequences;
pub mod session;
pub mod settings;
pub mod state;
