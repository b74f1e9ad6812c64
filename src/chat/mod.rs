mod conversation;
mod pipeline;

pub use conversation::{Conversation, Speaker, Turn};
pub use pipeline::{ChatPipeline, ChatReply, ReplyKind};
