//! 棋子定义

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// 兵
    Pawn,
    /// 马
    Knight,
    /// 象
    Bishop,
    /// 车
    Rook,
    /// 后
    Queen,
    /// 王
    King,
}

impl PieceKind {
    /// 升变可选的棋子类型
    pub const PROMOTION_CHOICES: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// 走法记谱中使用的字母（兵没有字母）
    pub fn letter(&self) -> Option<char> {
        match self {
            PieceKind::Pawn => None,
            PieceKind::Knight => Some('N'),
            PieceKind::Bishop => Some('B'),
            PieceKind::Rook => Some('R'),
            PieceKind::Queen => Some('Q'),
            PieceKind::King => Some('K'),
        }
    }

    /// 是否是合法的升变目标
    pub fn is_promotion_choice(&self) -> bool {
        Self::PROMOTION_CHOICES.contains(self)
    }

    /// 获取 FEN 字符（白方大写，黑方小写）
    pub fn to_fen_char(&self, team: Team) -> char {
        let c = match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match team {
            Team::White => c.to_ascii_uppercase(),
            Team::Black => c,
        }
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<(PieceKind, Team)> {
        let team = if c.is_ascii_uppercase() {
            Team::White
        } else {
            Team::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some((kind, team))
    }

    /// 从升变字母解析（大小写均可，只接受后/车/象/马）
    pub fn from_promotion_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            _ => None,
        }
    }
}

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// 白方（先手，在下方）
    White,
    /// 黑方（后手，在上方）
    Black,
}

impl Team {
    /// 获取对方阵营
    pub fn opponent(&self) -> Team {
        match self {
            Team::White => Team::Black,
            Team::Black => Team::White,
        }
    }

    /// 兵前进的行方向：白方向上（-1），黑方向下（+1）
    pub fn forward(&self) -> i8 {
        match self {
            Team::White => -1,
            Team::Black => 1,
        }
    }

    /// 底线所在行
    pub fn home_row(&self) -> u8 {
        match self {
            Team::White => BOARD_SIZE as u8 - 1,
            Team::Black => 0,
        }
    }

    /// 兵的起始行
    pub fn pawn_row(&self) -> u8 {
        match self {
            Team::White => BOARD_SIZE as u8 - 2,
            Team::Black => 1,
        }
    }

    /// 兵升变所在行（对方底线）
    pub fn promotion_row(&self) -> u8 {
        self.opponent().home_row()
    }

    /// 获取 FEN 字符
    pub fn to_fen_char(&self) -> char {
        match self {
            Team::White => 'w',
            Team::Black => 'b',
        }
    }

    /// 从 FEN 字段解析
    pub fn from_fen_str(s: &str) -> Option<Team> {
        match s {
            "w" => Some(Team::White),
            "b" => Some(Team::Black),
            _ => None,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::White => write!(f, "White"),
            Team::Black => write!(f, "Black"),
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub team: Team,
    /// 是否移动过（决定王车易位与兵的双步资格）
    pub has_moved: bool,
    /// 上一手刚走过双步（仅对下一手的吃过路兵有效）
    pub just_double_moved: bool,
}

impl Piece {
    /// 创建新棋子
    pub fn new(kind: PieceKind, team: Team) -> Self {
        Self {
            kind,
            team,
            has_moved: false,
            just_double_moved: false,
        }
    }

    /// 创建已移动过的棋子
    pub fn moved(kind: PieceKind, team: Team) -> Self {
        Self {
            has_moved: true,
            ..Self::new(kind, team)
        }
    }

    pub fn is(&self, kind: PieceKind, team: Team) -> bool {
        self.kind == kind && self.team == team
    }

    /// 获取棋子的 Unicode 符号
    pub fn display_char(&self) -> char {
        match (self.kind, self.team) {
            (PieceKind::King, Team::White) => '♔',
            (PieceKind::Queen, Team::White) => '♕',
            (PieceKind::Rook, Team::White) => '♖',
            (PieceKind::Bishop, Team::White) => '♗',
            (PieceKind::Knight, Team::White) => '♘',
            (PieceKind::Pawn, Team::White) => '♙',
            (PieceKind::King, Team::Black) => '♚',
            (PieceKind::Queen, Team::Black) => '♛',
            (PieceKind::Rook, Team::Black) => '♜',
            (PieceKind::Bishop, Team::Black) => '♝',
            (PieceKind::Knight, Team::Black) => '♞',
            (PieceKind::Pawn, Team::Black) => '♟',
        }
    }

    /// 获取 FEN 字符
    pub fn to_fen_char(&self) -> char {
        self.kind.to_fen_char(self.team)
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<Piece> {
        PieceKind::from_fen_char(c).map(|(kind, team)| Piece::new(kind, team))
    }
}
