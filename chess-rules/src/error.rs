//! 错误类型定义

use thiserror::Error;

use crate::piece::Team;
use crate::square::Square;

/// 国际象棋规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChessError {
    /// 起始格没有棋子
    #[error("No piece at {square}")]
    InvalidSource { square: Square },

    /// 不是该方的回合
    #[error("Not your turn: {team} is not to move")]
    NotYourTurn { team: Team },

    /// 目标格不在合法走法中
    #[error("Illegal move: {from} to {to}")]
    IllegalMove { from: Square, to: Square },

    /// 局面字符串无效
    #[error("Malformed position: {0}")]
    MalformedPosition(#[from] PositionError),

    /// 升变缺少或给出了无效的棋子类型
    #[error("Ambiguous promotion: {reason}")]
    AmbiguousPromotion { reason: String },

    /// 正在等待升变选择，不能开始新的走法
    #[error("A promotion choice is still pending")]
    PromotionPending,

    /// 没有等待中的升变
    #[error("No promotion is pending")]
    NoPendingPromotion,

    /// 游戏已结束
    #[error("Game is already over")]
    GameOver,
}

/// FEN 局面解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PositionError {
    /// 字段数量不是 6
    #[error("expected 6 space-separated fields, got {found}")]
    FieldCount { found: usize },

    /// 横线数量不是 8
    #[error("expected 8 ranks, got {found}")]
    RankCount { found: usize },

    /// 某一横线的格子数不是 8
    #[error("rank {rank} describes {width} squares, expected 8")]
    RankWidth { rank: usize, width: usize },

    /// 未知棋子字母
    #[error("unknown piece letter '{0}'")]
    UnknownPiece(char),

    /// 空格数字不在 1-8 范围内
    #[error("empty-square run '{0}' is out of range")]
    EmptyRun(char),

    /// 走子方字段无效
    #[error("invalid active team '{0}'")]
    ActiveTeam(String),

    /// 易位权字段无效
    #[error("invalid castling field '{0}'")]
    Castling(String),

    /// 过路兵格子无效
    #[error("invalid en passant square '{0}'")]
    EnPassantSquare(String),

    /// 过路兵格子旁没有对应的兵
    #[error("no pawn found for en passant square {0}")]
    MissingEnPassantPawn(String),

    /// 步数字段无效
    #[error("invalid move counter '{0}'")]
    MoveCounter(String),

    /// 王的数量不是 1
    #[error("{team} has {count} kings, expected exactly 1")]
    KingCount { team: Team, count: usize },
}

/// 棋谱记录错误
#[derive(Error, Debug)]
pub enum RecordError {
    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 棋谱中的格子名无效
    #[error("invalid square '{0}' in record")]
    Square(String),

    /// 重放走法失败
    #[error("move {index} ({notation}) could not be replayed: {source}")]
    Replay {
        index: usize,
        notation: String,
        #[source]
        source: ChessError,
    },

    /// 象棋规则错误
    #[error("Chess error: {0}")]
    Chess(#[from] ChessError),
}

/// 规则操作结果类型
pub type Result<T> = std::result::Result<T, ChessError>;
