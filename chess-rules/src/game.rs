//! 对局控制
//!
//! 一步棋的提交分两阶段：需要升变时 `commit_move` 返回
//! [`MoveOutcome::PendingPromotion`] 且不改动棋盘，调用方提供棋子类型后
//! 再由 `resume_with_promotion` 真正执行。

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::BoardState;
use crate::error::{ChessError, Result};
use crate::fen::Fen;
use crate::moves::{Move, MoveGenerator};
use crate::notation::{MoveDescription, MoveSuffix, Notation};
use crate::piece::{PieceKind, Team};
use crate::square::Square;

/// 回合阶段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// 等待选择棋子
    AwaitingSelection,
    /// 已选中棋子
    PieceSelected { square: Square },
    /// 等待外部提供升变棋子
    AwaitingPromotion { from: Square, to: Square },
    /// 对局结束
    GameOver,
}

/// 游戏结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// 将死
    Checkmate { winner: Team },
    /// 逼和
    Stalemate,
}

/// 提交走法的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// 对局继续
    Continue,
    /// 对方被将军
    Check,
    /// 将死，附带获胜方
    Checkmate(Team),
    /// 逼和
    Stalemate,
    /// 等待升变选择，棋盘未改动
    PendingPromotion,
}

/// 升变选择提供方（界面弹窗、命令行提示等）
pub trait PromotionProvider {
    /// 为 `team` 走到 `square` 的兵选择升变棋子
    fn choose_promotion(&mut self, team: Team, square: Square) -> PieceKind;
}

impl<F> PromotionProvider for F
where
    F: FnMut(Team, Square) -> PieceKind,
{
    fn choose_promotion(&mut self, team: Team, square: Square) -> PieceKind {
        self(team, square)
    }
}

/// 总是选择同一种棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPromotion(pub PieceKind);

impl PromotionProvider for FixedPromotion {
    fn choose_promotion(&mut self, _team: Team, _square: Square) -> PieceKind {
        self.0
    }
}

impl BoardState {
    /// 从 FEN 字符串加载局面
    pub fn load_position(fen: &str) -> Result<BoardState> {
        Fen::parse(fen)
    }

    /// 导出 FEN 字符串
    pub fn export_position(&self) -> String {
        Fen::to_string(self)
    }

    /// 指定格子棋子的合法目标格
    pub fn legal_moves(&self, sq: Square) -> Vec<Square> {
        MoveGenerator::legal_moves(&self.board, sq)
    }

    /// 当前走子方的全部合法走法
    pub fn all_legal_moves(&self) -> Vec<Move> {
        if self.is_over() {
            return Vec::new();
        }
        MoveGenerator::generate_legal(self)
    }

    /// 选中当前走子方的棋子，返回其合法目标格
    pub fn select(&mut self, sq: Square) -> Result<Vec<Square>> {
        self.ensure_ready()?;
        let piece = self
            .board
            .get(sq)
            .ok_or(ChessError::InvalidSource { square: sq })?;
        if piece.team != self.to_move {
            return Err(ChessError::NotYourTurn { team: piece.team });
        }

        self.phase = GamePhase::PieceSelected { square: sq };
        Ok(self.legal_moves(sq))
    }

    /// 取消选中
    pub fn deselect(&mut self) {
        if matches!(self.phase, GamePhase::PieceSelected { .. }) {
            self.phase = GamePhase::AwaitingSelection;
        }
    }

    /// 当前选中的格子
    pub fn selected(&self) -> Option<Square> {
        match self.phase {
            GamePhase::PieceSelected { square } => Some(square),
            _ => None,
        }
    }

    /// 提交走法
    ///
    /// 兵走到底线且未提供 `promotion` 时返回 [`MoveOutcome::PendingPromotion`]，
    /// 此时棋盘与走子方都不变。
    pub fn commit_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<MoveOutcome> {
        self.ensure_ready()?;

        let piece = self
            .board
            .get(from)
            .ok_or(ChessError::InvalidSource { square: from })?;
        if piece.team != self.to_move {
            warn!("rejected {}{}: {} is not to move", from, to, piece.team);
            return Err(ChessError::NotYourTurn { team: piece.team });
        }
        if !self.legal_moves(from).contains(&to) {
            warn!("rejected illegal move {}{}", from, to);
            return Err(ChessError::IllegalMove { from, to });
        }

        if MoveGenerator::is_promotion(&self.board, from, to) {
            match promotion {
                None => {
                    debug!("{}{} awaits a promotion choice", from, to);
                    self.phase = GamePhase::AwaitingPromotion { from, to };
                    return Ok(MoveOutcome::PendingPromotion);
                }
                Some(kind) => Self::check_promotion_kind(kind)?,
            }
        } else if let Some(kind) = promotion {
            return Err(ChessError::AmbiguousPromotion {
                reason: format!("{}{} is not a promotion, got {:?}", from, to, kind),
            });
        }

        Ok(self.execute(from, to, promotion))
    }

    /// 提供升变棋子，完成挂起的走法
    pub fn resume_with_promotion(&mut self, kind: PieceKind) -> Result<MoveOutcome> {
        let GamePhase::AwaitingPromotion { from, to } = self.phase else {
            return Err(ChessError::NoPendingPromotion);
        };
        Self::check_promotion_kind(kind)?;
        Ok(self.execute(from, to, Some(kind)))
    }

    /// 放弃挂起的升变（棋盘本来就没有改动）
    pub fn cancel_promotion(&mut self) -> Result<()> {
        if !matches!(self.phase, GamePhase::AwaitingPromotion { .. }) {
            return Err(ChessError::NoPendingPromotion);
        }
        self.phase = GamePhase::AwaitingSelection;
        Ok(())
    }

    /// 提交走法，需要升变时立即向 `provider` 询问
    pub fn commit_move_with<P>(
        &mut self,
        from: Square,
        to: Square,
        provider: &mut P,
    ) -> Result<MoveOutcome>
    where
        P: PromotionProvider + ?Sized,
    {
        match self.commit_move(from, to, None)? {
            MoveOutcome::PendingPromotion => {
                let kind = provider.choose_promotion(self.to_move, to);
                match self.resume_with_promotion(kind) {
                    Ok(outcome) => Ok(outcome),
                    Err(e) => {
                        // 提供方给出无效棋子时不保留挂起状态
                        self.phase = GamePhase::AwaitingSelection;
                        Err(e)
                    }
                }
            }
            outcome => Ok(outcome),
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.result.is_some() {
            return Err(ChessError::GameOver);
        }
        if matches!(self.phase, GamePhase::AwaitingPromotion { .. }) {
            return Err(ChessError::PromotionPending);
        }
        Ok(())
    }

    fn check_promotion_kind(kind: PieceKind) -> Result<()> {
        if kind.is_promotion_choice() {
            Ok(())
        } else {
            Err(ChessError::AmbiguousPromotion {
                reason: format!("cannot promote to {:?}", kind),
            })
        }
    }

    /// 执行已验证的走法：改动棋盘、记谱、切换走子方、判定胜负
    fn execute(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) -> MoveOutcome {
        let Some(piece) = self.board.get(from) else {
            unreachable!("execute called without a piece on {}", from);
        };
        let team = piece.team;

        let en_passant = MoveGenerator::en_passant_victim(&self.board, from, to);
        let capture = !self.board.is_empty(to) || en_passant.is_some();
        let castling = MoveGenerator::is_castling(&self.board, from, to);

        // 记谱要素必须在棋盘变更前收集
        let description = if castling {
            MoveDescription::Castling {
                kingside: to.col > from.col,
            }
        } else if let Some(kind) = promotion {
            MoveDescription::Promotion { to, kind }
        } else {
            MoveDescription::Standard {
                kind: piece.kind,
                from,
                to,
                capture,
                disambiguation: Notation::disambiguation(&self.board, from, to),
            }
        };

        if let Some(victim) = en_passant {
            self.board.take(victim);
        }

        if castling {
            let kingside = to.col > from.col;
            let (rook_offset, rook_target) = if kingside { (3, 1) } else { (-4, -1) };
            if let (Some(rook_from), Some(rook_to)) =
                (from.offset(0, rook_offset), from.offset(0, rook_target))
            {
                if let Some(mut rook) = self.board.take(rook_from) {
                    rook.has_moved = true;
                    self.board.set(rook_to, Some(rook));
                }
            }
        }

        let mut moved = piece;
        if let Some(kind) = promotion {
            moved.kind = kind;
        }
        moved.has_moved = true;
        moved.just_double_moved =
            piece.kind == PieceKind::Pawn && (to.row as i8 - from.row as i8).abs() == 2;

        // 过路兵资格只保留一手
        self.board.clear_double_moves();
        self.board.take(from);
        self.board.set(to, Some(moved));

        self.switch_turn();
        let opponent = self.to_move;
        let checked = MoveGenerator::is_checked(&self.board, opponent);
        let can_move = MoveGenerator::has_legal_move(&self.board, opponent);

        let (suffix, outcome) = match (checked, can_move) {
            (true, false) => (MoveSuffix::Checkmate, MoveOutcome::Checkmate(team)),
            (false, false) => (MoveSuffix::Stalemate, MoveOutcome::Stalemate),
            (true, true) => (MoveSuffix::Check, MoveOutcome::Check),
            (false, true) => (MoveSuffix::None, MoveOutcome::Continue),
        };

        let notation = Notation::render(&description, suffix);
        debug!("{} played {} ({}{})", team, notation, from, to);
        self.history.push(notation);

        match outcome {
            MoveOutcome::Checkmate(winner) => {
                info!("checkmate, {} wins", winner);
                self.result = Some(GameResult::Checkmate { winner });
                self.phase = GamePhase::GameOver;
            }
            MoveOutcome::Stalemate => {
                info!("stalemate, {} has no legal moves", opponent);
                self.result = Some(GameResult::Stalemate);
                self.phase = GamePhase::GameOver;
            }
            _ => self.phase = GamePhase::AwaitingSelection,
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Piece;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    /// 依次提交坐标走法，返回最后一步的结果
    fn play(state: &mut BoardState, moves: &[&str]) -> MoveOutcome {
        let mut last = MoveOutcome::Continue;
        for text in moves {
            let from = sq(&text[0..2]);
            let to = sq(&text[2..4]);
            last = state
                .commit_move(from, to, None)
                .unwrap_or_else(|e| panic!("{} failed: {}", text, e));
        }
        last
    }

    #[test]
    fn test_scholars_mate() {
        let mut state = BoardState::new_game();
        let outcome = play(
            &mut state,
            &["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"],
        );

        assert_eq!(outcome, MoveOutcome::Checkmate(Team::White));
        assert_eq!(state.result(), Some(GameResult::Checkmate { winner: Team::White }));
        assert_eq!(state.phase(), &GamePhase::GameOver);
        assert_eq!(
            state.move_history(),
            ["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"]
        );

        // 对局结束后不能再走
        assert_eq!(
            state.commit_move(sq("e8"), sq("e7"), None),
            Err(ChessError::GameOver)
        );
    }

    #[test]
    fn test_queen_raid_without_support_is_only_check() {
        let mut state = BoardState::new_game();
        let outcome = play(&mut state, &["e2e4", "e7e5", "d1h5", "b8c6", "h5f7"]);

        assert_eq!(outcome, MoveOutcome::Check);
        assert_eq!(state.move_history().last().map(String::as_str), Some("Qxf7+"));
        // 黑王可以吃掉没有保护的后
        assert!(state.legal_moves(sq("e8")).contains(&sq("f7")));
        assert_eq!(play(&mut state, &["e8f7"]), MoveOutcome::Continue);
        assert_eq!(state.move_history().last().map(String::as_str), Some("Kxf7"));
    }

    #[test]
    fn test_en_passant_capture() {
        let mut state = BoardState::new_game();
        play(&mut state, &["e2e4", "g8f6", "e4e5", "d7d5"]);

        let moves = state.legal_moves(sq("e5"));
        assert!(moves.contains(&sq("d6")));

        let outcome = state.commit_move(sq("e5"), sq("d6"), None).unwrap();
        assert_eq!(outcome, MoveOutcome::Continue);
        assert!(state.board.is_empty(sq("d5")));
        assert_eq!(
            state.board.get(sq("d6")).map(|p| (p.kind, p.team)),
            Some((PieceKind::Pawn, Team::White))
        );
        assert_eq!(state.move_history().last().map(String::as_str), Some("exd6"));
    }

    #[test]
    fn test_en_passant_expires_after_one_ply() {
        let mut state = BoardState::new_game();
        play(&mut state, &["e2e4", "g8f6", "e4e5", "d7d5", "b1c3", "b8c6"]);

        assert!(!state.legal_moves(sq("e5")).contains(&sq("d6")));
    }

    #[test]
    fn test_double_move_flag_is_one_shot() {
        let mut state = BoardState::new_game();
        play(&mut state, &["e2e4"]);
        assert!(state.board.get(sq("e4")).unwrap().just_double_moved);

        play(&mut state, &["d7d5"]);
        assert!(!state.board.get(sq("e4")).unwrap().just_double_moved);
        assert!(state.board.get(sq("d5")).unwrap().just_double_moved);

        let flagged = state
            .board
            .all_pieces()
            .iter()
            .filter(|(_, p)| p.just_double_moved)
            .count();
        assert_eq!(flagged, 1);

        play(&mut state, &["e4e5"]);
        assert!(state.board.all_pieces().iter().all(|(_, p)| !p.just_double_moved));
    }

    #[test]
    fn test_castling_denied_after_king_returns() {
        let mut state = BoardState::new_game();
        play(&mut state, &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5"]);
        assert!(state.legal_moves(sq("e1")).contains(&sq("g1")));

        play(&mut state, &["e1e2", "e8e7", "e2e1", "e7e8"]);
        assert_eq!(state.board.get(sq("e1")).map(|p| p.kind), Some(PieceKind::King));
        assert!(!state.legal_moves(sq("e1")).contains(&sq("g1")));
        assert!(state.export_position().contains(" w - - "));
    }

    #[test]
    fn test_castling_moves_rook() {
        let mut state = BoardState::load_position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        play(&mut state, &["e1g1"]);
        assert_eq!(state.board.get(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
        assert!(state.board.get(sq("f1")).unwrap().has_moved);
        assert!(state.board.is_empty(sq("h1")));

        play(&mut state, &["e8c8"]);
        assert_eq!(state.board.get(sq("d8")).map(|p| p.kind), Some(PieceKind::Rook));
        assert!(state.board.is_empty(sq("a8")));
        assert_eq!(state.move_history(), ["O-O", "O-O-O"]);
    }

    #[test]
    fn test_castling_with_check_suffix() {
        // 易位后车在 f1 将军 f8 上的王
        let mut state = BoardState::load_position("5k2/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let outcome = play(&mut state, &["e1g1"]);
        assert_eq!(outcome, MoveOutcome::Check);
        assert_eq!(state.move_history(), ["O-O+"]);
    }

    #[test]
    fn test_disambiguated_history() {
        let mut state = BoardState::load_position("4k3/8/8/8/8/8/8/R5RK w - - 0 1").unwrap();
        play(&mut state, &["a1d1"]);
        assert_eq!(state.move_history(), ["Rad1"]);

        let mut state = BoardState::load_position("4k3/8/8/R7/8/8/8/R6K w - - 0 1").unwrap();
        play(&mut state, &["a5a3"]);
        assert_eq!(state.move_history(), ["R5a3"]);
    }

    #[test]
    fn test_promotion_two_phase() {
        let mut state = BoardState::load_position("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let before = state.board.clone();

        let outcome = state.commit_move(sq("a7"), sq("a8"), None).unwrap();
        assert_eq!(outcome, MoveOutcome::PendingPromotion);
        assert_eq!(state.board, before);
        assert_eq!(state.to_move, Team::White);
        assert!(state.move_history().is_empty());

        // 挂起期间不能开始其他走法
        assert_eq!(
            state.commit_move(sq("a1"), sq("b1"), None),
            Err(ChessError::PromotionPending)
        );

        // 无效的升变棋子不会结束挂起
        assert!(matches!(
            state.resume_with_promotion(PieceKind::King),
            Err(ChessError::AmbiguousPromotion { .. })
        ));
        assert_eq!(
            state.phase(),
            &GamePhase::AwaitingPromotion {
                from: sq("a7"),
                to: sq("a8")
            }
        );

        let outcome = state.resume_with_promotion(PieceKind::Queen).unwrap();
        assert_eq!(outcome, MoveOutcome::Check);
        assert_eq!(state.move_history(), ["a8=Q+"]);
        assert_eq!(
            state.board.get(sq("a8")).map(|p| (p.kind, p.team)),
            Some((PieceKind::Queen, Team::White))
        );
        assert_eq!(state.to_move, Team::Black);
    }

    #[test]
    fn test_promotion_supplied_up_front() {
        let mut state = BoardState::load_position("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let outcome = state
            .commit_move(sq("a7"), sq("a8"), Some(PieceKind::Knight))
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Continue);
        assert_eq!(state.move_history(), ["a8=N"]);
    }

    #[test]
    fn test_cancel_promotion() {
        let mut state = BoardState::load_position("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        state.commit_move(sq("a7"), sq("a8"), None).unwrap();

        state.cancel_promotion().unwrap();
        assert_eq!(state.phase(), &GamePhase::AwaitingSelection);
        assert_eq!(state.cancel_promotion(), Err(ChessError::NoPendingPromotion));
        assert_eq!(
            state.resume_with_promotion(PieceKind::Queen),
            Err(ChessError::NoPendingPromotion)
        );

        assert!(state.commit_move(sq("a1"), sq("b1"), None).is_ok());
    }

    #[test]
    fn test_commit_move_with_provider() {
        let mut state = BoardState::load_position("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mut asked = Vec::new();
        let mut provider = |team: Team, square: Square| {
            asked.push((team, square));
            PieceKind::Rook
        };

        let outcome = state.commit_move_with(sq("a7"), sq("a8"), &mut provider).unwrap();
        assert_eq!(outcome, MoveOutcome::Check);
        assert_eq!(asked, vec![(Team::White, sq("a8"))]);
        assert_eq!(state.move_history(), ["a8=R+"]);

        // 非升变走法不会询问
        let outcome = state
            .commit_move_with(sq("h8"), sq("h7"), &mut FixedPromotion(PieceKind::Queen))
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Continue);
    }

    #[test]
    fn test_stalemate_outcome() {
        let mut state = BoardState::load_position("7k/4Q3/6K1/8/8/8/8/8 w - - 0 1").unwrap();
        let outcome = play(&mut state, &["e7f7"]);

        assert_eq!(outcome, MoveOutcome::Stalemate);
        assert_eq!(state.result(), Some(GameResult::Stalemate));
        assert_eq!(state.move_history(), ["Qf7$"]);
        assert!(state.is_over());
    }

    #[test]
    fn test_commit_errors() {
        let mut state = BoardState::new_game();

        assert_eq!(
            state.commit_move(sq("e4"), sq("e5"), None),
            Err(ChessError::InvalidSource { square: sq("e4") })
        );
        assert_eq!(
            state.commit_move(sq("e7"), sq("e5"), None),
            Err(ChessError::NotYourTurn { team: Team::Black })
        );
        assert_eq!(
            state.commit_move(sq("e2"), sq("e5"), None),
            Err(ChessError::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        assert!(matches!(
            state.commit_move(sq("e2"), sq("e4"), Some(PieceKind::Queen)),
            Err(ChessError::AmbiguousPromotion { .. })
        ));

        // 失败的提交不改变局面
        assert_eq!(state, BoardState::new_game());
    }

    #[test]
    fn test_turn_alternates_and_history_parity() {
        let mut state = BoardState::new_game();
        play(&mut state, &["e2e4", "e7e5", "g1f3"]);

        assert_eq!(state.to_move, Team::Black);
        assert_eq!(state.move_history().len() % 2, 1);
        assert_eq!(state.fullmove_number(), 2);
    }

    #[test]
    fn test_select_and_deselect() {
        let mut state = BoardState::new_game();

        let targets = state.select(sq("g1")).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(state.selected(), Some(sq("g1")));

        state.deselect();
        assert_eq!(state.selected(), None);
        assert_eq!(state.phase(), &GamePhase::AwaitingSelection);

        assert_eq!(
            state.select(sq("g8")),
            Err(ChessError::NotYourTurn { team: Team::Black })
        );
        assert_eq!(
            state.select(sq("d4")),
            Err(ChessError::InvalidSource { square: sq("d4") })
        );
    }

    #[test]
    fn test_promoted_piece_is_marked_moved() {
        let mut state = BoardState::load_position("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        state.commit_move(sq("a7"), sq("a8"), Some(PieceKind::Rook)).unwrap();
        assert_eq!(
            state.board.get(sq("a8")),
            Some(Piece::moved(PieceKind::Rook, Team::White))
        );
    }

    #[test]
    fn test_all_legal_moves() {
        let state = BoardState::new_game();
        assert_eq!(state.all_legal_moves().len(), 20);

        // 升变按四种棋子展开
        let state = BoardState::load_position("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let promotions = state
            .all_legal_moves()
            .into_iter()
            .filter(|m| m.promotion.is_some())
            .count();
        assert_eq!(promotions, 4);

        let mut state = BoardState::load_position("7k/4Q3/6K1/8/8/8/8/8 w - - 0 1").unwrap();
        play(&mut state, &["e7f7"]);
        assert!(state.all_legal_moves().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut state = BoardState::new_game();
        play(&mut state, &["e2e4"]);
        state.reset();
        assert_eq!(state, BoardState::new_game());
    }
}
