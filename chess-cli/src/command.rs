//! 命令解析

use chess_rules::{Move, PieceKind, Square};
use thiserror::Error;

/// 命令解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid square '{0}'")]
    Square(String),

    #[error("invalid promotion piece '{0}', use q, r, b or n")]
    Piece(String),
}

/// 交互命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 显示棋盘
    Board,
    /// 列出某格棋子的合法走法，不带格子时列出全部
    Moves(Option<Square>),
    /// 走棋
    Move(Move),
    /// 导出 FEN
    Fen,
    /// 加载 FEN
    Load(String),
    /// 显示走法记录
    History,
    /// 输出 JSON 棋谱
    Record,
    /// 新对局
    New,
    Help,
    Quit,
}

/// 帮助文本
pub const HELP: &str = "\
commands:
  board                     show the board
  moves [square]            legal moves for a square, or for the side to move
  move <from> <to> [piece]  play a move, e.g. 'move e7 e8 q'
  <from><to>[piece]         shorthand, e.g. 'e2e4' or 'e7e8q'
  fen                       print the position as FEN
  load <fen>                start from a FEN position
  history                   numbered move history
  record                    print the game record as JSON
  new                       start a new game
  help                      show this help
  quit                      leave";

impl Command {
    /// 解析一行输入
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&head) = tokens.first() else {
            return Err(CommandError::Empty);
        };
        let args = &tokens[1..];

        let name = head.to_ascii_lowercase();
        match name.as_str() {
            "board" | "b" => Ok(Command::Board),
            "moves" => match args.first() {
                Some(target) => Ok(Command::Moves(Some(parse_square(target)?))),
                None => Ok(Command::Moves(None)),
            },
            "move" | "m" => {
                let (Some(from), Some(to)) = (args.first(), args.get(1)) else {
                    return Err(CommandError::MissingArgument {
                        command: "move",
                        argument: "a source and a destination square",
                    });
                };
                let promotion = args.get(2).map(|text| parse_piece(text)).transpose()?;
                Ok(Command::Move(Move {
                    from: parse_square(from)?,
                    to: parse_square(to)?,
                    promotion,
                }))
            }
            "fen" => Ok(Command::Fen),
            "load" => {
                if args.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "load",
                        argument: "a FEN string",
                    });
                }
                Ok(Command::Load(args.join(" ")))
            }
            "history" => Ok(Command::History),
            "record" => Ok(Command::Record),
            "new" => Ok(Command::New),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ if args.is_empty() => Move::parse(&name)
                .map(Command::Move)
                .ok_or_else(|| CommandError::Unknown(head.to_string())),
            _ => Err(CommandError::Unknown(head.to_string())),
        }
    }
}

fn parse_square(text: &str) -> Result<Square, CommandError> {
    Square::from_algebraic(&text.to_ascii_lowercase())
        .ok_or_else(|| CommandError::Square(text.to_string()))
}

fn parse_piece(text: &str) -> Result<PieceKind, CommandError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            PieceKind::from_promotion_char(c).ok_or_else(|| CommandError::Piece(text.to_string()))
        }
        _ => Err(CommandError::Piece(text.to_string())),
    }
}
