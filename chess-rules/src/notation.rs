//! 代数记谱法
//!
//! 格式：`<棋子字母><消歧义><x?><目标格><后缀>`
//! - 兵没有字母，吃子时用起始纵线代替
//! - 消歧义依次尝试纵线、横线、两者，只在其他同类棋子也能合法到达目标格时添加
//! - 后缀：`+` 将军、`#` 将死、`$` 逼和
//! - 易位记为 `O-O` / `O-O-O`，升变记为 `<目标格>=<字母>`，两者都保留后缀

use crate::board::Board;
use crate::moves::MoveGenerator;
use crate::piece::PieceKind;
use crate::square::Square;

/// 走完后对方的局面状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSuffix {
    None,
    Check,
    Checkmate,
    Stalemate,
}

impl MoveSuffix {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveSuffix::None => "",
            MoveSuffix::Check => "+",
            MoveSuffix::Checkmate => "#",
            MoveSuffix::Stalemate => "$",
        }
    }
}

/// 走法的记谱要素（在棋盘变更前收集）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveDescription {
    /// 普通走法
    Standard {
        kind: PieceKind,
        from: Square,
        to: Square,
        capture: bool,
        disambiguation: String,
    },
    /// 易位
    Castling { kingside: bool },
    /// 升变
    Promotion { to: Square, kind: PieceKind },
}

/// 代数记谱
pub struct Notation;

impl Notation {
    /// 计算消歧义前缀
    ///
    /// 只考虑同阵营、同类型且能合法走到 `to` 的其他棋子；兵不需要消歧义。
    pub fn disambiguation(board: &Board, from: Square, to: Square) -> String {
        let Some(piece) = board.get(from) else {
            return String::new();
        };
        if piece.kind == PieceKind::Pawn {
            return String::new();
        }

        let rivals: Vec<Square> = board
            .pieces(piece.team)
            .into_iter()
            .filter(|(sq, p)| *sq != from && p.kind == piece.kind)
            .map(|(sq, _)| sq)
            .filter(|&sq| MoveGenerator::legal_moves(board, sq).contains(&to))
            .collect();

        if rivals.is_empty() {
            return String::new();
        }

        let shares_file = rivals.iter().any(|sq| sq.col == from.col);
        let shares_rank = rivals.iter().any(|sq| sq.row == from.row);

        if !shares_file {
            from.file_char().to_string()
        } else if !shares_rank {
            from.rank_char().to_string()
        } else {
            from.to_algebraic()
        }
    }

    /// 生成完整记谱
    pub fn render(description: &MoveDescription, suffix: MoveSuffix) -> String {
        let body = match description {
            MoveDescription::Standard {
                kind,
                from,
                to,
                capture,
                disambiguation,
            } => {
                let mut text = String::new();
                match kind.letter() {
                    Some(letter) => text.push(letter),
                    // 兵吃子时用起始纵线
                    None if *capture => text.push(from.file_char()),
                    None => {}
                }
                text.push_str(disambiguation);
                if *capture {
                    text.push('x');
                }
                text.push_str(&to.to_algebraic());
                text
            }
            MoveDescription::Castling { kingside: true } => "O-O".to_string(),
            MoveDescription::Castling { kingside: false } => "O-O-O".to_string(),
            MoveDescription::Promotion { to, kind } => {
                format!("{}={}", to, kind.letter().unwrap_or('Q'))
            }
        };
        format!("{}{}", body, suffix.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Piece, Team};

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn place(board: &mut Board, name: &str, kind: PieceKind, team: Team) {
        board.set(sq(name), Some(Piece::new(kind, team)));
    }

    fn board_with_kings() -> Board {
        let mut board = Board::empty();
        place(&mut board, "h1", PieceKind::King, Team::White);
        place(&mut board, "g8", PieceKind::King, Team::Black);
        board
    }

    #[test]
    fn test_no_disambiguation_needed() {
        let board = Board::initial();
        assert_eq!(Notation::disambiguation(&board, sq("g1"), sq("f3")), "");
        // 兵不消歧义
        assert_eq!(Notation::disambiguation(&board, sq("e2"), sq("e4")), "");
    }

    #[test]
    fn test_disambiguation_by_file() {
        let mut board = board_with_kings();
        place(&mut board, "a2", PieceKind::Rook, Team::White);
        place(&mut board, "g2", PieceKind::Rook, Team::White);

        assert_eq!(Notation::disambiguation(&board, sq("a2"), sq("d2")), "a");
        assert_eq!(Notation::disambiguation(&board, sq("g2"), sq("d2")), "g");
    }

    #[test]
    fn test_disambiguation_by_rank() {
        let mut board = board_with_kings();
        place(&mut board, "a1", PieceKind::Rook, Team::White);
        place(&mut board, "a5", PieceKind::Rook, Team::White);

        assert_eq!(Notation::disambiguation(&board, sq("a1"), sq("a3")), "1");
        assert_eq!(Notation::disambiguation(&board, sq("a5"), sq("a3")), "5");
    }

    #[test]
    fn test_disambiguation_by_both() {
        let mut board = board_with_kings();
        place(&mut board, "a1", PieceKind::Queen, Team::White);
        place(&mut board, "a3", PieceKind::Queen, Team::White);
        place(&mut board, "c1", PieceKind::Queen, Team::White);

        assert_eq!(Notation::disambiguation(&board, sq("a1"), sq("b2")), "a1");
    }

    #[test]
    fn test_disambiguation_ignores_pinned_rival() {
        // 被牵制的马不能合法到达，不参与消歧义
        let mut board = Board::empty();
        place(&mut board, "e1", PieceKind::King, Team::White);
        place(&mut board, "e2", PieceKind::Knight, Team::White);
        place(&mut board, "c3", PieceKind::Knight, Team::White);
        place(&mut board, "e8", PieceKind::Rook, Team::Black);
        place(&mut board, "h8", PieceKind::King, Team::Black);

        assert_eq!(Notation::disambiguation(&board, sq("c3"), sq("d4")), "");
    }

    #[test]
    fn test_render_standard() {
        let desc = MoveDescription::Standard {
            kind: PieceKind::Knight,
            from: sq("g1"),
            to: sq("f3"),
            capture: false,
            disambiguation: String::new(),
        };
        assert_eq!(Notation::render(&desc, MoveSuffix::None), "Nf3");

        let desc = MoveDescription::Standard {
            kind: PieceKind::Rook,
            from: sq("a1"),
            to: sq("d1"),
            capture: true,
            disambiguation: "a".to_string(),
        };
        assert_eq!(Notation::render(&desc, MoveSuffix::Check), "Raxd1+");
    }

    #[test]
    fn test_render_pawn() {
        let push = MoveDescription::Standard {
            kind: PieceKind::Pawn,
            from: sq("e2"),
            to: sq("e4"),
            capture: false,
            disambiguation: String::new(),
        };
        assert_eq!(Notation::render(&push, MoveSuffix::None), "e4");

        let capture = MoveDescription::Standard {
            kind: PieceKind::Pawn,
            from: sq("e4"),
            to: sq("d5"),
            capture: true,
            disambiguation: String::new(),
        };
        assert_eq!(Notation::render(&capture, MoveSuffix::Checkmate), "exd5#");
    }

    #[test]
    fn test_render_special() {
        let castle = MoveDescription::Castling { kingside: true };
        assert_eq!(Notation::render(&castle, MoveSuffix::None), "O-O");
        let castle = MoveDescription::Castling { kingside: false };
        assert_eq!(Notation::render(&castle, MoveSuffix::Check), "O-O-O+");

        let promo = MoveDescription::Promotion {
            to: sq("e8"),
            kind: PieceKind::Queen,
        };
        assert_eq!(Notation::render(&promo, MoveSuffix::Stalemate), "e8=Q$");
    }
}
