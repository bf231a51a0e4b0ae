//! 走法生成和验证
//!
//! 伪合法走法按棋子类型分派生成；合法走法在临时棋盘上逐一模拟，
//! 过滤掉会让己方王被攻击的目标格。王的走法在生成时已经做过安全检查。

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::board::{Board, BoardState};
use crate::constants::{BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS, ROOK_DIRECTIONS};
use crate::piece::{Piece, PieceKind, Team};
use crate::square::Square;

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 起始格
    pub from: Square,
    /// 目标格
    pub to: Square,
    /// 升变棋子（仅兵走到底线时存在）
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// 创建新走法
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// 创建带升变的走法
    pub fn with_promotion(from: Square, to: Square, kind: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(kind),
        }
    }

    /// 解析坐标形式的走法，如 `e2e4`、`e7e8q`
    pub fn parse(text: &str) -> Option<Move> {
        let text = text.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return None;
        }
        let from = Square::from_algebraic(&text[0..2])?;
        let to = Square::from_algebraic(&text[2..4])?;
        let promotion = match text[4..].chars().next() {
            Some(c) => Some(PieceKind::from_promotion_char(c)?),
            None => None,
        };
        Some(Move { from, to, promotion })
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            let letter = kind.letter().unwrap_or('Q').to_ascii_lowercase();
            write!(f, "{}", letter)?;
        }
        Ok(())
    }
}

/// 易位方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    /// 车相对王的列偏移
    fn rook_offset(self) -> i8 {
        match self {
            CastleSide::King => 3,
            CastleSide::Queen => -4,
        }
    }

    /// 王移动的列方向
    fn step(self) -> i8 {
        match self {
            CastleSide::King => 1,
            CastleSide::Queen => -1,
        }
    }
}

/// 走法生成器
pub struct MoveGenerator;

impl MoveGenerator {
    /// 生成指定格子棋子的伪合法目标格（不考虑己方王是否被将军）
    pub fn pseudo_moves(board: &Board, sq: Square) -> Vec<Square> {
        let mut scratch = board.clone();
        Self::pseudo_moves_in(&mut scratch, sq, None)
    }

    /// 生成指定格子棋子的合法目标格
    pub fn legal_moves(board: &Board, sq: Square) -> Vec<Square> {
        let Some(piece) = board.get(sq) else {
            return Vec::new();
        };

        let mut scratch = board.clone();
        let candidates = Self::pseudo_moves_in(&mut scratch, sq, None);

        // 王的候选走法在生成时已经检查过安全性
        if piece.kind == PieceKind::King {
            return candidates;
        }

        let king = scratch.king_square(piece.team);
        let legal: Vec<Square> = candidates
            .into_iter()
            .filter(|&to| {
                let lifted = Self::en_passant_victim(&scratch, sq, to);
                scratch.simulate(sq, to, lifted, |b| {
                    !Self::is_attacked_in(b, piece.team, king, None)
                })
            })
            .collect();

        trace!("legal moves for {:?} at {}: {}", piece.kind, sq, legal.len());
        legal
    }

    /// 生成当前走子方的所有合法走法（升变按可选棋子展开）
    pub fn generate_legal(state: &BoardState) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);

        for (from, _) in state.board.pieces(state.to_move) {
            for to in Self::legal_moves(&state.board, from) {
                if Self::is_promotion(&state.board, from, to) {
                    for kind in PieceKind::PROMOTION_CHOICES {
                        moves.push(Move::with_promotion(from, to, kind));
                    }
                } else {
                    moves.push(Move::new(from, to));
                }
            }
        }

        moves
    }

    /// 指定阵营是否还有任何合法走法
    pub fn has_legal_move(board: &Board, team: Team) -> bool {
        board
            .pieces(team)
            .into_iter()
            .any(|(sq, _)| !Self::legal_moves(board, sq).is_empty())
    }

    /// 检查指定阵营是否被将军
    pub fn is_checked(board: &Board, team: Team) -> bool {
        let king = board.king_square(team);
        let mut scratch = board.clone();
        Self::is_attacked_in(&mut scratch, team, king, None)
    }

    /// 检查是否被将死
    pub fn is_checkmated(board: &Board, team: Team) -> bool {
        Self::is_checked(board, team) && !Self::has_legal_move(board, team)
    }

    /// 检查是否无子可动（逼和）
    pub fn is_stalemated(board: &Board, team: Team) -> bool {
        !Self::is_checked(board, team) && !Self::has_legal_move(board, team)
    }

    /// 兵走到对方底线
    pub fn is_promotion(board: &Board, from: Square, to: Square) -> bool {
        board
            .get(from)
            .is_some_and(|p| p.kind == PieceKind::Pawn && to.row == p.team.promotion_row())
    }

    /// 王横向走两格即为易位
    pub fn is_castling(board: &Board, from: Square, to: Square) -> bool {
        board.get(from).is_some_and(|p| p.kind == PieceKind::King)
            && from.row == to.row
            && (from.col as i8 - to.col as i8).abs() == 2
    }

    /// 吃过路兵时被吃的兵所在格
    ///
    /// 兵斜进一步到空格，且同一横线相邻格是对方的兵。
    pub fn en_passant_victim(board: &Board, from: Square, to: Square) -> Option<Square> {
        let piece = board.get(from)?;
        if piece.kind != PieceKind::Pawn || from.col == to.col || !board.is_empty(to) {
            return None;
        }
        if to.row as i8 - from.row as i8 != piece.team.forward()
            || (to.col as i8 - from.col as i8).abs() != 1
        {
            return None;
        }
        let victim = Square::new_unchecked(from.row, to.col);
        board
            .get(victim)
            .filter(|p| p.is(PieceKind::Pawn, piece.team.opponent()))
            .map(|_| victim)
    }

    /// 在可变的临时棋盘上生成伪合法走法
    ///
    /// `ignore` 由攻击扫描传入：被攻击的王所在格。对方王生成走法时
    /// 跳过这个棋子，避免两个王互相检查时无限递归。
    fn pseudo_moves_in(board: &mut Board, sq: Square, ignore: Option<Square>) -> Vec<Square> {
        let Some(piece) = board.get(sq) else {
            return Vec::new();
        };

        let mut moves = Vec::with_capacity(28);
        match piece.kind {
            PieceKind::Pawn => Self::generate_pawn_moves(board, sq, piece, &mut moves),
            PieceKind::Knight => {
                Self::generate_step_moves(board, sq, piece.team, &KNIGHT_OFFSETS, &mut moves)
            }
            PieceKind::Bishop => {
                Self::generate_slider_moves(board, sq, piece.team, &BISHOP_DIRECTIONS, &mut moves)
            }
            PieceKind::Rook => {
                Self::generate_slider_moves(board, sq, piece.team, &ROOK_DIRECTIONS, &mut moves)
            }
            PieceKind::Queen => {
                Self::generate_slider_moves(board, sq, piece.team, &ROOK_DIRECTIONS, &mut moves);
                Self::generate_slider_moves(board, sq, piece.team, &BISHOP_DIRECTIONS, &mut moves);
            }
            PieceKind::King => Self::generate_king_moves(board, sq, piece, ignore, &mut moves),
        }
        moves
    }

    /// 生成滑行棋子（车、象、后）的走法
    fn generate_slider_moves(
        board: &Board,
        from: Square,
        team: Team,
        directions: &[(i8, i8)],
        moves: &mut Vec<Square>,
    ) {
        for &(d_row, d_col) in directions {
            let mut current = from;
            while let Some(to) = current.offset(d_row, d_col) {
                if let Some(target) = board.get(to) {
                    // 遇到棋子
                    if target.team != team {
                        moves.push(to);
                    }
                    break;
                }
                moves.push(to);
                current = to;
            }
        }
    }

    /// 生成固定偏移棋子（马）的走法
    fn generate_step_moves(
        board: &Board,
        from: Square,
        team: Team,
        offsets: &[(i8, i8)],
        moves: &mut Vec<Square>,
    ) {
        for &(d_row, d_col) in offsets {
            if let Some(to) = from.offset(d_row, d_col) {
                if !board.is_team(to, team) {
                    moves.push(to);
                }
            }
        }
    }

    /// 生成兵的走法
    fn generate_pawn_moves(board: &Board, from: Square, piece: Piece, moves: &mut Vec<Square>) {
        let forward = piece.team.forward();
        let enemy = piece.team.opponent();

        // 已在底线，没有走法
        let Some(one) = from.offset(forward, 0) else {
            return;
        };

        // 前进
        if board.is_empty(one) {
            moves.push(one);
            if !piece.has_moved && from.row == piece.team.pawn_row() {
                if let Some(two) = from.offset(2 * forward, 0) {
                    if board.is_empty(two) {
                        moves.push(two);
                    }
                }
            }
        }

        for d_col in [-1i8, 1i8] {
            let Some(diagonal) = from.offset(forward, d_col) else {
                continue;
            };

            if board.is_team(diagonal, enemy) {
                moves.push(diagonal);
                continue;
            }

            // 吃过路兵：旁边刚走过双步的对方兵
            if board.is_empty(diagonal) {
                let passed = from.offset(0, d_col).and_then(|sq| board.get(sq));
                if passed.is_some_and(|p| p.is(PieceKind::Pawn, enemy) && p.just_double_moved) {
                    moves.push(diagonal);
                }
            }
        }
    }

    /// 生成王的走法（含安全检查与易位）
    fn generate_king_moves(
        board: &mut Board,
        from: Square,
        piece: Piece,
        ignore: Option<Square>,
        moves: &mut Vec<Square>,
    ) {
        let team = piece.team;

        for (d_row, d_col) in KING_OFFSETS {
            let Some(to) = from.offset(d_row, d_col) else {
                continue;
            };
            if board.is_team(to, team) {
                continue;
            }
            if Self::king_safe_at(board, from, to, team, ignore) {
                moves.push(to);
            }
        }

        // 攻击扫描中不需要易位（易位不能吃子）
        if ignore.is_some() || piece.has_moved {
            return;
        }
        if Self::is_attacked_in(board, team, from, None) {
            return;
        }
        for side in [CastleSide::King, CastleSide::Queen] {
            if let Some(to) = Self::castling_target(board, from, team, side) {
                moves.push(to);
            }
        }
    }

    /// 王翼/后翼易位的目标格（不满足条件时为 None）
    fn castling_target(
        board: &mut Board,
        from: Square,
        team: Team,
        side: CastleSide,
    ) -> Option<Square> {
        let rook_sq = from.offset(0, side.rook_offset())?;
        let rook = board.get(rook_sq)?;
        if !rook.is(PieceKind::Rook, team) || rook.has_moved {
            return None;
        }

        // 王与车之间必须全空
        let step = side.step();
        let mut col = from.col as i8 + step;
        while col != rook_sq.col as i8 {
            if !board.is_empty(Square::new_unchecked(from.row, col as u8)) {
                return None;
            }
            col += step;
        }

        // 王经过和到达的格子不能被攻击，也不能与对方王相邻
        for distance in 1..=2 {
            let passed = from.offset(0, step * distance)?;
            if !Self::king_safe_at(board, from, passed, team, None) {
                return None;
            }
        }

        from.offset(0, step * 2)
    }

    /// 王从 `from` 走到 `to` 后是否安全
    fn king_safe_at(
        board: &mut Board,
        from: Square,
        to: Square,
        team: Team,
        ignore: Option<Square>,
    ) -> bool {
        board.simulate(from, to, None, |b| {
            !Self::is_attacked_in(b, team, to, ignore) && !Self::touches_enemy_king(b, to, team)
        })
    }

    /// 格子是否与对方王相邻
    fn touches_enemy_king(board: &Board, sq: Square, team: Team) -> bool {
        board
            .find_king(team.opponent())
            .is_some_and(|king| king.is_adjacent(sq))
    }

    /// 检查 `target` 是否被 `defender` 的对方任一棋子的伪合法走法覆盖
    ///
    /// `ignore` 所在格的攻击方棋子不参与扫描。
    fn is_attacked_in(
        board: &mut Board,
        defender: Team,
        target: Square,
        ignore: Option<Square>,
    ) -> bool {
        let attackers: Vec<Square> = board
            .pieces(defender.opponent())
            .into_iter()
            .map(|(sq, _)| sq)
            .filter(|&sq| Some(sq) != ignore)
            .collect();

        attackers
            .into_iter()
            .any(|sq| Self::pseudo_moves_in(board, sq, Some(target)).contains(&target))
    }
}
