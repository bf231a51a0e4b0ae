//! 国际象棋规则库
//!
//! 包含:
//! - 格子、棋子、棋盘等核心数据结构
//! - 走法生成和王的安全过滤（将军、将死、逼和）
//! - 走法提交状态机（易位、吃过路兵、两阶段升变）
//! - 代数记谱和 FEN 局面格式
//! - JSON 棋谱

mod board;
mod constants;
mod error;
mod fen;
mod game;
mod moves;
mod notation;
mod piece;
mod record;
mod square;

pub use board::{Board, BoardState};
pub use constants::*;
pub use error::{ChessError, PositionError, RecordError, Result};
pub use fen::{Fen, INITIAL_FEN};
pub use game::{FixedPromotion, GamePhase, GameResult, MoveOutcome, PromotionProvider};
pub use moves::{Move, MoveGenerator};
pub use notation::{MoveDescription, MoveSuffix, Notation};
pub use piece::{Piece, PieceKind, Team};
pub use record::{GameMetadata, GameRecord, MoveRecord, RECORD_VERSION};
pub use square::Square;
