pub mod config;
pub mod constants;
pub mod container;
pub mod errors;
pub mod notify;
pub mod rcon;
pub mod restart;
pub mod scheduler;
pub mod testing;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use container::{ContainerHandle, DockerContainer};
pub use errors::{RconError, RestarterError};
pub use notify::{DiscordNotifier, NotificationSink, Severity};
pub use rcon::{RconClient, RetryPolicy, TcpRconConnector};
pub use restart::{RestartManager, RestartSettings};
pub use scheduler::{ManagerCell, RestartScheduler};
