/**
 * Logging setup shared by every command.
 */
pub mod logging;
/**
 * On-disk state: the config directory, `config.toml`
 *  and the persisted session.
 */
pub mod state;
