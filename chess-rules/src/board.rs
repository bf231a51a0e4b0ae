//! 棋盘状态

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_SIZE, SQUARE_COUNT, UNKNOWN_MOVE};
use crate::game::{GamePhase, GameResult};
use crate::piece::{Piece, PieceKind, Team};
use crate::square::Square;

/// 底线棋子排列（a 线到 h 线）
const BACK_RANK: [PieceKind; BOARD_SIZE] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// 8x8 棋盘，索引为 row * 8 + col，使用 Vec 以支持 serde
    squares: Vec<Option<Piece>>,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: vec![None; SQUARE_COUNT],
        }
    }

    /// 创建初始棋盘
    pub fn initial() -> Self {
        let mut board = Self::empty();

        for team in [Team::White, Team::Black] {
            for (col, kind) in BACK_RANK.iter().enumerate() {
                board.set(
                    Square::new_unchecked(team.home_row(), col as u8),
                    Some(Piece::new(*kind, team)),
                );
                board.set(
                    Square::new_unchecked(team.pawn_row(), col as u8),
                    Some(Piece::new(PieceKind::Pawn, team)),
                );
            }
        }

        board
    }

    /// 获取指定格子的棋子
    pub fn get(&self, sq: Square) -> Option<Piece> {
        if sq.is_valid() {
            self.squares[sq.to_index()]
        } else {
            None
        }
    }

    /// 获取指定格子棋子的可变引用
    pub fn get_mut(&mut self, sq: Square) -> Option<&mut Piece> {
        if sq.is_valid() {
            self.squares[sq.to_index()].as_mut()
        } else {
            None
        }
    }

    /// 设置指定格子的棋子
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        if sq.is_valid() {
            self.squares[sq.to_index()] = piece;
        }
    }

    /// 取走指定格子的棋子
    pub fn take(&mut self, sq: Square) -> Option<Piece> {
        if sq.is_valid() {
            self.squares[sq.to_index()].take()
        } else {
            None
        }
    }

    /// 格子是否为空
    pub fn is_empty(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    /// 格子上是否是指定阵营的棋子
    pub fn is_team(&self, sq: Square, team: Team) -> bool {
        self.get(sq).is_some_and(|p| p.team == team)
    }

    /// 移动棋子（不检查规则），返回被吃的棋子
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let piece = self.take(from);
        let captured = self.take(to);
        self.set(to, piece);
        captured
    }

    /// 在棋盘上临时执行一步走法并求值，结束后恢复原状
    ///
    /// `lifted` 是额外临时移除的格子（吃过路兵时被吃的兵）。
    /// 闭包可以继续嵌套模拟，但必须在返回前恢复自己的改动。
    pub fn simulate<R>(
        &mut self,
        from: Square,
        to: Square,
        lifted: Option<Square>,
        f: impl FnOnce(&mut Board) -> R,
    ) -> R {
        let lifted_piece = lifted.and_then(|sq| self.take(sq));
        let moving = self.take(from);
        let displaced = self.take(to);
        self.set(to, moving);

        let result = f(self);

        self.set(to, displaced);
        self.set(from, moving);
        if let Some(sq) = lifted {
            self.set(sq, lifted_piece);
        }
        result
    }

    /// 查找指定阵营的王
    pub fn find_king(&self, team: Team) -> Option<Square> {
        Square::all().find(|&sq| self.get(sq).is_some_and(|p| p.is(PieceKind::King, team)))
    }

    /// 获取指定阵营王的位置
    ///
    /// # Panics
    ///
    /// 棋盘上没有该方的王时 panic，这只会在绕过构造流程时发生。
    pub fn king_square(&self, team: Team) -> Square {
        self.find_king(team)
            .unwrap_or_else(|| panic!("board invariant violated: no {} king on the board", team))
    }

    /// 统计指定阵营王的数量
    pub fn count_kings(&self, team: Team) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|p| p.is(PieceKind::King, team))
            .count()
    }

    /// 获取指定阵营的所有棋子位置
    pub fn pieces(&self, team: Team) -> Vec<(Square, Piece)> {
        Square::all()
            .filter_map(|sq| self.get(sq).map(|p| (sq, p)))
            .filter(|(_, p)| p.team == team)
            .collect()
    }

    /// 获取所有棋子
    pub fn all_pieces(&self) -> Vec<(Square, Piece)> {
        Square::all()
            .filter_map(|sq| self.get(sq).map(|p| (sq, p)))
            .collect()
    }

    /// 清除所有棋子的双步标记
    pub fn clear_double_moves(&mut self) {
        for piece in self.squares.iter_mut().flatten() {
            piece.just_double_moved = false;
        }
    }

    /// 渲染为文本棋盘（第 8 横线在上）
    pub fn to_ascii(&self, unicode: bool) -> String {
        let mut out = String::new();
        for row in 0..BOARD_SIZE as u8 {
            let rank = Square::new_unchecked(row, 0).rank_char();
            out.push(rank);
            out.push(' ');
            for col in 0..BOARD_SIZE as u8 {
                let c = match self.get(Square::new_unchecked(row, col)) {
                    Some(piece) if unicode => piece.display_char(),
                    Some(piece) => piece.to_fen_char(),
                    None => '.',
                };
                out.push(' ');
                out.push(c);
            }
            out.push('\n');
        }
        out.push_str("  ");
        for col in 0..BOARD_SIZE as u8 {
            out.push(' ');
            out.push(Square::new_unchecked(0, col).file_char());
        }
        out.push('\n');
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

/// 完整的棋局状态（棋盘、走子方、走法记录、回合阶段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    /// 棋盘
    pub board: Board,
    /// 当前走子方
    pub to_move: Team,
    /// 走法记谱（按时间顺序，每步一条）
    pub history: Vec<String>,
    /// 回合阶段
    pub(crate) phase: GamePhase,
    /// 游戏结果（未结束时为 None）
    pub(crate) result: Option<GameResult>,
}

impl BoardState {
    /// 创建标准初始局面
    pub fn new_game() -> Self {
        Self::from_board(Board::initial(), Team::White)
    }

    /// 从棋盘创建状态
    pub fn from_board(board: Board, to_move: Team) -> Self {
        Self {
            board,
            to_move,
            history: Vec::new(),
            phase: GamePhase::AwaitingSelection,
            result: None,
        }
    }

    /// 重置为初始局面
    pub fn reset(&mut self) {
        *self = Self::new_game();
    }

    /// 走法记录
    pub fn move_history(&self) -> &[String] {
        &self.history
    }

    /// 当前回合阶段
    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    /// 游戏结果
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// 游戏是否已结束
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// 完整回合数（从 1 开始，黑方走完后 +1）
    pub fn fullmove_number(&self) -> u32 {
        (self.history.len() / 2 + 1) as u32
    }

    /// 用占位符填充无法还原的历史，使长度与回合数、走子方一致
    pub(crate) fn fill_unknown_history(&mut self, fullmove: u32) {
        let mut len = (fullmove.saturating_sub(1) as usize) * 2;
        if self.to_move == Team::Black {
            len += 1;
        }
        self.history = vec![UNKNOWN_MOVE.to_string(); len];
    }

    /// 切换走子方
    pub(crate) fn switch_turn(&mut self) {
        self.to_move = self.to_move.opponent();
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new_game()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn test_initial_board() {
        let board = Board::initial();

        assert_eq!(board.get(sq("e1")), Some(Piece::new(PieceKind::King, Team::White)));
        assert_eq!(board.get(sq("e8")), Some(Piece::new(PieceKind::King, Team::Black)));
        assert_eq!(board.get(sq("d1")), Some(Piece::new(PieceKind::Queen, Team::White)));
        assert_eq!(board.get(sq("g8")), Some(Piece::new(PieceKind::Knight, Team::Black)));
        assert_eq!(board.get(sq("a2")), Some(Piece::new(PieceKind::Pawn, Team::White)));
        assert_eq!(board.get(sq("h7")), Some(Piece::new(PieceKind::Pawn, Team::Black)));
        assert!(board.is_empty(sq("e4")));

        assert_eq!(board.all_pieces().len(), 32);
        assert_eq!(board.pieces(Team::White).len(), 16);
    }

    #[test]
    fn test_move_piece() {
        let mut board = Board::initial();

        let captured = board.move_piece(sq("g1"), sq("f3"));
        assert!(captured.is_none());
        assert!(board.is_empty(sq("g1")));
        assert_eq!(board.get(sq("f3")).map(|p| p.kind), Some(PieceKind::Knight));

        let captured = board.move_piece(sq("f3"), sq("e5"));
        assert!(captured.is_none());
        let captured = board.move_piece(sq("e5"), sq("f7"));
        assert_eq!(captured, Some(Piece::new(PieceKind::Pawn, Team::Black)));
    }

    #[test]
    fn test_find_king() {
        let board = Board::initial();
        assert_eq!(board.find_king(Team::White), Some(sq("e1")));
        assert_eq!(board.king_square(Team::Black), sq("e8"));
        assert_eq!(board.count_kings(Team::White), 1);

        assert!(Board::empty().find_king(Team::White).is_none());
    }

    #[test]
    #[should_panic(expected = "no White king")]
    fn test_missing_king_panics() {
        Board::empty().king_square(Team::White);
    }

    #[test]
    fn test_simulate_restores() {
        let mut board = Board::initial();
        let before = board.clone();

        let seen = board.simulate(sq("e2"), sq("e7"), Some(sq("d7")), |b| {
            (b.get(sq("e7")).map(|p| p.team), b.is_empty(sq("e2")), b.is_empty(sq("d7")))
        });

        assert_eq!(seen, (Some(Team::White), true, true));
        assert_eq!(board, before);
    }

    #[test]
    fn test_clear_double_moves() {
        let mut board = Board::initial();
        if let Some(p) = board.get_mut(sq("e2")) {
            p.just_double_moved = true;
        }
        board.clear_double_moves();
        assert!(board.all_pieces().iter().all(|(_, p)| !p.just_double_moved));
    }

    #[test]
    fn test_to_ascii() {
        let text = Board::initial().to_ascii(false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "8  r n b q k b n r");
        assert_eq!(lines[4], "4  . . . . . . . .");
        assert_eq!(lines[7], "1  R N B Q K B N R");
        assert_eq!(lines[8], "   a b c d e f g h");
    }

    #[test]
    fn test_fill_unknown_history() {
        let mut state = BoardState::from_board(Board::initial(), Team::Black);
        state.fill_unknown_history(3);
        assert_eq!(state.history.len(), 5);
        assert!(state.history.iter().all(|m| m == "--"));
        assert_eq!(state.fullmove_number(), 3);
    }
}
