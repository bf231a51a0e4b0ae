//! 国际象棋命令行前端
//!
//! 包含:
//! - 命令解析
//! - 对局会话（棋盘显示、走棋、FEN、棋谱）
//! - 交互式升变选择
//! - 设置加载

pub mod command;
pub mod prompt;
pub mod session;
pub mod settings;

pub use command::{Command, CommandError};
pub use prompt::PromptPromotion;
pub use session::{Reply, Session};
pub use settings::{CliSettings, LogLevel};
