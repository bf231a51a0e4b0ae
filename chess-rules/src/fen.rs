//! FEN 格式解析和生成
//!
//! 六个字段：
//! `<棋盘> <走子方> <易位权> <过路兵格> <半回合计数> <回合数>`
//!
//! 示例：
//! `rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1`
//!
//! 半回合计数不参与规则，导出时总是 `0`。局面无法还原之前的走法，
//! 解析后的历史用 `--` 占位，长度与回合数和走子方一致。

use tracing::warn;

use crate::board::{Board, BoardState};
use crate::constants::{
    BOARD_SIZE, KINGSIDE_ROOK_COL, KING_START_COL, MAX_FULLMOVE, QUEENSIDE_ROOK_COL,
};
use crate::error::{PositionError, Result};
use crate::moves::MoveGenerator;
use crate::piece::{Piece, PieceKind, Team};
use crate::square::Square;

/// 初始局面 FEN
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// 一方的易位权
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CastlingRights {
    kingside: bool,
    queenside: bool,
}

impl CastlingRights {
    fn any(&self) -> bool {
        self.kingside || self.queenside
    }
}

/// FEN 格式处理
pub struct Fen;

impl Fen {
    /// 解析 FEN 字符串为棋盘状态
    pub fn parse(fen: &str) -> Result<BoardState> {
        Self::parse_position(fen).map_err(|e| {
            warn!("rejected position '{}': {}", fen, e);
            e.into()
        })
    }

    fn parse_position(fen: &str) -> std::result::Result<BoardState, PositionError> {
        // 字段之间只允许单个空格
        let fields: Vec<&str> = fen.split(' ').collect();
        if fields.len() != 6 {
            return Err(PositionError::FieldCount {
                found: fields.len(),
            });
        }

        let mut board = Self::parse_board(fields[0])?;

        let to_move = Team::from_fen_str(fields[1])
            .ok_or_else(|| PositionError::ActiveTeam(fields[1].to_string()))?;

        for team in [Team::White, Team::Black] {
            let count = board.count_kings(team);
            if count != 1 {
                return Err(PositionError::KingCount { team, count });
            }
        }

        let (white, black) = Self::parse_castling(fields[2])?;
        Self::apply_castling(&mut board, Team::White, white);
        Self::apply_castling(&mut board, Team::Black, black);

        Self::apply_en_passant(&mut board, fields[3], to_move)?;

        // 半回合计数只校验格式
        fields[4]
            .parse::<u32>()
            .map_err(|_| PositionError::MoveCounter(fields[4].to_string()))?;
        let fullmove = fields[5]
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=MAX_FULLMOVE).contains(n))
            .ok_or_else(|| PositionError::MoveCounter(fields[5].to_string()))?;

        let mut state = BoardState::from_board(board, to_move);
        state.fill_unknown_history(fullmove);
        Ok(state)
    }

    /// 解析棋盘部分（第 8 横线在前）
    fn parse_board(placement: &str) -> std::result::Result<Board, PositionError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != BOARD_SIZE {
            return Err(PositionError::RankCount { found: ranks.len() });
        }

        let mut board = Board::empty();
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;
            for c in rank.chars() {
                if let Some(run) = c.to_digit(10) {
                    if !(1..=BOARD_SIZE as u32).contains(&run) {
                        return Err(PositionError::EmptyRun(c));
                    }
                    col += run as usize;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or(PositionError::UnknownPiece(c))?;
                    if col < BOARD_SIZE {
                        board.set(Square::new_unchecked(row as u8, col as u8), Some(piece));
                    }
                    col += 1;
                }
            }
            if col != BOARD_SIZE {
                return Err(PositionError::RankWidth {
                    rank: BOARD_SIZE - row,
                    width: col,
                });
            }
        }

        // 不在起始横线的兵已经走过
        for (sq, piece) in board.all_pieces() {
            if piece.kind == PieceKind::Pawn && sq.row != piece.team.pawn_row() {
                if let Some(p) = board.get_mut(sq) {
                    p.has_moved = true;
                }
            }
        }

        Ok(board)
    }

    fn parse_castling(
        field: &str,
    ) -> std::result::Result<(CastlingRights, CastlingRights), PositionError> {
        let mut white = CastlingRights::default();
        let mut black = CastlingRights::default();
        if field == "-" {
            return Ok((white, black));
        }
        if field.is_empty() {
            return Err(PositionError::Castling(field.to_string()));
        }

        for c in field.chars() {
            let flag = match c {
                'K' => &mut white.kingside,
                'Q' => &mut white.queenside,
                'k' => &mut black.kingside,
                'q' => &mut black.queenside,
                _ => return Err(PositionError::Castling(field.to_string())),
            };
            if *flag {
                return Err(PositionError::Castling(field.to_string()));
            }
            *flag = true;
        }
        Ok((white, black))
    }

    /// 根据易位权还原王和车的 `has_moved`
    ///
    /// 一方完全没有易位权时，王和所有车都视为走过。这是有损的还原：
    /// 真实原因无法从局面中得知。
    fn apply_castling(board: &mut Board, team: Team, rights: CastlingRights) {
        let home = team.home_row();
        let king_home = Square::new_unchecked(home, KING_START_COL);
        let kingside_corner = Square::new_unchecked(home, KINGSIDE_ROOK_COL);
        let queenside_corner = Square::new_unchecked(home, QUEENSIDE_ROOK_COL);

        for (sq, piece) in board.pieces(team) {
            let moved = match piece.kind {
                PieceKind::King => !rights.any() || sq != king_home,
                PieceKind::Rook if !rights.any() => true,
                PieceKind::Rook if sq == kingside_corner => !rights.kingside,
                PieceKind::Rook if sq == queenside_corner => !rights.queenside,
                PieceKind::Rook => true,
                _ => continue,
            };
            if let Some(p) = board.get_mut(sq) {
                p.has_moved = moved;
            }
        }
    }

    /// 根据过路兵格找到刚走过两步的兵
    fn apply_en_passant(
        board: &mut Board,
        field: &str,
        to_move: Team,
    ) -> std::result::Result<(), PositionError> {
        if field == "-" {
            return Ok(());
        }

        let target = Square::from_algebraic(field)
            .ok_or_else(|| PositionError::EnPassantSquare(field.to_string()))?;
        let mover = to_move.opponent();
        // 过路兵格在兵的身后
        let pawn_sq = target
            .offset(mover.forward(), 0)
            .ok_or_else(|| PositionError::EnPassantSquare(field.to_string()))?;

        match board.get_mut(pawn_sq) {
            Some(p) if p.is(PieceKind::Pawn, mover) => {
                p.has_moved = true;
                p.just_double_moved = true;
                Ok(())
            }
            _ => Err(PositionError::MissingEnPassantPawn(field.to_string())),
        }
    }

    /// 将棋盘状态转换为 FEN 字符串
    pub fn to_string(state: &BoardState) -> String {
        format!(
            "{} {} {} {} 0 {}",
            Self::board_to_string(&state.board),
            state.to_move.to_fen_char(),
            Self::castling_to_string(&state.board),
            Self::en_passant_to_string(&state.board, state.to_move),
            state.fullmove_number()
        )
    }

    /// 将棋盘转换为 FEN 棋盘部分
    pub fn board_to_string(board: &Board) -> String {
        let mut ranks = Vec::with_capacity(BOARD_SIZE);

        for row in 0..BOARD_SIZE as u8 {
            let mut rank = String::new();
            let mut empty = 0;

            for col in 0..BOARD_SIZE as u8 {
                if let Some(piece) = board.get(Square::new_unchecked(row, col)) {
                    if empty > 0 {
                        rank.push_str(&empty.to_string());
                        empty = 0;
                    }
                    rank.push(piece.to_fen_char());
                } else {
                    empty += 1;
                }
            }

            if empty > 0 {
                rank.push_str(&empty.to_string());
            }
            ranks.push(rank);
        }

        ranks.join("/")
    }

    fn castling_to_string(board: &Board) -> String {
        let mut field = String::new();

        for team in [Team::White, Team::Black] {
            let home = team.home_row();
            let unmoved = |col: u8, kind: PieceKind| {
                board
                    .get(Square::new_unchecked(home, col))
                    .is_some_and(|p| p.is(kind, team) && !p.has_moved)
            };
            if !unmoved(KING_START_COL, PieceKind::King) {
                continue;
            }

            let (kingside, queenside) = match team {
                Team::White => ('K', 'Q'),
                Team::Black => ('k', 'q'),
            };
            if unmoved(KINGSIDE_ROOK_COL, PieceKind::Rook) {
                field.push(kingside);
            }
            if unmoved(QUEENSIDE_ROOK_COL, PieceKind::Rook) {
                field.push(queenside);
            }
        }

        if field.is_empty() {
            field.push('-');
        }
        field
    }

    /// 只有走子方确实能吃过路兵时才写出目标格
    fn en_passant_to_string(board: &Board, to_move: Team) -> String {
        let mover = to_move.opponent();
        let Some((pawn_sq, _)) = board
            .pieces(mover)
            .into_iter()
            .find(|(_, p)| p.kind == PieceKind::Pawn && p.just_double_moved)
        else {
            return "-".to_string();
        };
        let Some(target) = pawn_sq.offset(-mover.forward(), 0) else {
            return "-".to_string();
        };

        let capturable = [-1, 1]
            .into_iter()
            .filter_map(|d_col| pawn_sq.offset(0, d_col))
            .filter(|&sq| {
                board
                    .get(sq)
                    .is_some_and(|p| p.is(PieceKind::Pawn, to_move))
            })
            .any(|sq| MoveGenerator::legal_moves(board, sq).contains(&target));

        if capturable {
            target.to_algebraic()
        } else {
            "-".to_string()
        }
    }

    /// 解析初始局面
    pub fn initial() -> BoardState {
        BoardState::new_game()
    }
}
