pub mod handler;
pub mod listener;
pub mod error;
pub mod manager;

pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;
pub use handler::RequestRouter;
pub use listener::ServerListener;
pub use manager::ServerManager;
