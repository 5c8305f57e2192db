pub mod auth;
pub mod bucket;
pub mod file;
pub mod health;
pub mod init;
pub mod provider;
pub mod version;

pub use auth::Auth;
pub use bucket::Bucket;
pub use file::File;
pub use health::Health;
pub use init::Init;
pub use provider::Provider;
pub use version::Version;
