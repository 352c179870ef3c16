pub mod socket_mode;
pub mod types;
pub mod web_client;

use crate::error::Result;
use async_trait::async_trait;

pub use socket_mode::SocketModeListener;
pub use web_client::SlackWebClient;

pub const WORKING_REACTION: &str = "hourglass_flowing_sand";
pub const SUCCESS_REACTION: &str = "frame_with_picture";
pub const FAILURE_REACTION: &str = "x";

/// Outbound chat operations. Each call may fail on its own; callers decide
/// whether a failure matters.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn add_reaction(&self, channel: &str, timestamp: &str, name: &str) -> Result<()>;

    async fn remove_reaction(&self, channel: &str, timestamp: &str, name: &str) -> Result<()>;

    async fn post_message(&self, channel: &str, thread_ts: &str, text: &str) -> Result<()>;

    async fn upload_file(
        &self,
        channel: &str,
        thread_ts: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<()>;
}
