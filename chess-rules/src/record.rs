//! 棋谱记录格式
//!
//! JSON 格式的线性棋谱：初始局面加上按顺序提交的走法。
//! 保存到哪里由调用方决定。

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::BoardState;
use crate::error::{ChessError, RecordError};
use crate::fen::{Fen, INITIAL_FEN};
use crate::game::{GameResult, MoveOutcome};
use crate::piece::{PieceKind, Team};
use crate::square::Square;

/// 棋谱版本
pub const RECORD_VERSION: &str = "1.0";

/// 对局元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    /// 白方玩家名
    pub white_player: String,
    /// 黑方玩家名
    pub black_player: String,
    /// 对局日期
    pub date: String,
    /// 对局结果
    pub result: Option<GameResult>,
}

/// 走法记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 起始格，如 `e2`
    pub from: String,
    /// 目标格，如 `e4`
    pub to: String,
    /// 升变棋子
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
    /// 代数记谱
    pub notation: String,
}

impl MoveRecord {
    pub fn new(
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
        notation: impl Into<String>,
    ) -> Self {
        Self {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            promotion,
            notation: notation.into(),
        }
    }

    /// 获取起始格
    pub fn from_square(&self) -> Option<Square> {
        Square::from_algebraic(&self.from)
    }

    /// 获取目标格
    pub fn to_square(&self) -> Option<Square> {
        Square::from_algebraic(&self.to)
    }
}

/// 完整的棋谱记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// 版本号
    pub version: String,
    /// 元数据
    pub metadata: GameMetadata,
    /// 初始局面 FEN
    pub initial_fen: String,
    /// 走法列表
    pub moves: Vec<MoveRecord>,
}

impl GameRecord {
    /// 从标准初始局面开始的棋谱
    pub fn new(white_player: impl Into<String>, black_player: impl Into<String>) -> Self {
        Self::from_fen(white_player, black_player, INITIAL_FEN)
    }

    /// 从自定义局面开始的棋谱
    pub fn from_fen(
        white_player: impl Into<String>,
        black_player: impl Into<String>,
        fen: impl Into<String>,
    ) -> Self {
        Self {
            version: RECORD_VERSION.to_string(),
            metadata: GameMetadata {
                white_player: white_player.into(),
                black_player: black_player.into(),
                date: Utc::now().format("%Y-%m-%d").to_string(),
                result: None,
            },
            initial_fen: fen.into(),
            moves: Vec::new(),
        }
    }

    /// 添加走法
    pub fn add_move(&mut self, mv: MoveRecord) {
        self.moves.push(mv);
    }

    /// 设置对局结果
    pub fn set_result(&mut self, result: GameResult) {
        self.metadata.result = Some(result);
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从初始局面依次重新提交每一步，重建对局状态
    pub fn replay(&self) -> Result<BoardState, RecordError> {
        let mut state = Fen::parse(&self.initial_fen)?;

        for (index, mv) in self.moves.iter().enumerate() {
            let from = mv
                .from_square()
                .ok_or_else(|| RecordError::Square(mv.from.clone()))?;
            let to = mv
                .to_square()
                .ok_or_else(|| RecordError::Square(mv.to.clone()))?;

            let replay_error = |source: ChessError| RecordError::Replay {
                index,
                notation: mv.notation.clone(),
                source,
            };

            let outcome = state
                .commit_move(from, to, mv.promotion)
                .map_err(replay_error)?;
            if outcome == MoveOutcome::PendingPromotion {
                return Err(replay_error(ChessError::AmbiguousPromotion {
                    reason: "record does not name the promoted piece".to_string(),
                }));
            }

            if state.move_history().last() != Some(&mv.notation) {
                warn!(
                    "move {} recorded as {} but replays as {:?}",
                    index,
                    mv.notation,
                    state.move_history().last()
                );
            }
        }

        debug!("replayed {} moves", self.moves.len());
        Ok(state)
    }

    /// 编号的走法列表，如 `1. e4 e5 2. Nf3`
    pub fn to_move_list(&self) -> String {
        let (mut number, mut team) = Fen::parse(&self.initial_fen)
            .map(|s| (s.fullmove_number(), s.to_move))
            .unwrap_or((1, Team::White));

        let mut parts = Vec::with_capacity(self.moves.len() + 1);
        for (i, mv) in self.moves.iter().enumerate() {
            match team {
                Team::White => parts.push(format!("{}. {}", number, mv.notation)),
                Team::Black => {
                    if i == 0 {
                        parts.push(format!("{}... {}", number, mv.notation));
                    } else {
                        parts.push(mv.notation.clone());
                    }
                    number += 1;
                }
            }
            team = team.opponent();
        }

        if let Some(result) = self.metadata.result {
            parts.push(
                match result {
                    GameResult::Checkmate { winner: Team::White } => "1-0",
                    GameResult::Checkmate { winner: Team::Black } => "0-1",
                    GameResult::Stalemate => "1/2-1/2",
                }
                .to_string(),
            );
        }

        parts.join(" ")
    }
}
