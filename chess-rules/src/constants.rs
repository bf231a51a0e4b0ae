//! 规则常量定义

/// 棋盘边长（行数 = 列数）
pub const BOARD_SIZE: usize = 8;

/// 棋盘格子总数
pub const SQUARE_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// 车的四个直线方向 (行, 列)
pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// 象的四个斜线方向 (行, 列)
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// 马的八个跳跃偏移 (行, 列)
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, 1),
    (-1, 2),
    (1, 2),
    (2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

/// 王的八个相邻偏移 (行, 列)
pub const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// 王的初始列（e 线）
pub const KING_START_COL: u8 = 4;

/// 王翼车的初始列（h 线）
pub const KINGSIDE_ROOK_COL: u8 = 7;

/// 后翼车的初始列（a 线）
pub const QUEENSIDE_ROOK_COL: u8 = 0;

/// 历史记录中无法还原的走法占位符
pub const UNKNOWN_MOVE: &str = "--";

/// FEN 回合数上限（解析时会为之前的回合生成占位历史）
pub const MAX_FULLMOVE: u32 = 10_000;
