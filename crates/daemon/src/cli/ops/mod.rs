pub mod daemon;
pub mod health;
pub mod init;
pub mod open;
pub mod password;
pub mod share;
pub mod version;

pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use open::Open;
pub use password::Password;
pub use share::Share;
pub use version::Version;
