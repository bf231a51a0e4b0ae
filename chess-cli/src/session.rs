//! 交互会话：一局棋的状态、棋谱和命令执行

use anyhow::{Context, Result};
use chess_rules::{
    BoardState, Fen, FixedPromotion, GameRecord, GameResult, Move, MoveGenerator, MoveOutcome,
    MoveRecord, PieceKind, PromotionProvider, Square, INITIAL_FEN,
};
use tracing::{debug, info};

use crate::command::{Command, HELP};
use crate::settings::CliSettings;

const WHITE_PLAYER: &str = "White";
const BLACK_PLAYER: &str = "Black";

/// 命令执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 需要显示的文本
    Text(String),
    /// 退出
    Quit,
}

/// 一局棋的会话
pub struct Session {
    state: BoardState,
    record: GameRecord,
    settings: CliSettings,
}

impl Session {
    /// 按设置创建会话（可能从自定义局面开始）
    pub fn new(settings: CliSettings) -> Result<Self> {
        let fen = settings
            .start_fen
            .clone()
            .unwrap_or_else(|| INITIAL_FEN.to_string());
        let state = Fen::parse(&fen).with_context(|| format!("设置中的开局局面无效: {}", fen))?;

        Ok(Self {
            state,
            record: GameRecord::from_fen(WHITE_PLAYER, BLACK_PLAYER, fen),
            settings,
        })
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    /// 执行一条命令，需要升变时向 `prompt` 询问（设置了自动升变时不询问）
    pub fn execute(&mut self, command: Command, prompt: &mut dyn PromotionProvider) -> Result<Reply> {
        debug!("executing {:?}", command);
        let text = match command {
            Command::Board => self.render(),
            Command::Moves(Some(sq)) => self.describe_moves(sq)?,
            Command::Moves(None) => self.describe_all_moves(),
            Command::Move(mv) => self.play(mv, prompt)?,
            Command::Fen => self.state.export_position(),
            Command::Load(fen) => self.load(&fen)?,
            Command::History => self.history(),
            Command::Record => {
                let json = self.record.to_json().context("序列化棋谱失败")?;
                format!("{}\n{}", json, self.record.to_move_list())
            }
            Command::New => {
                *self = Self::new(self.settings.clone())?;
                info!("started a new game");
                self.render()
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Text(text))
    }

    /// 渲染棋盘和走子方
    pub fn render(&self) -> String {
        let ascii = self.state.board.to_ascii(self.settings.unicode_pieces);
        let mut out = if self.settings.show_coordinates {
            ascii
        } else {
            // 去掉横线标签列和纵线标签行
            ascii
                .lines()
                .filter(|line| !line.starts_with(' '))
                .map(|line| format!("{}\n", &line[3..]))
                .collect()
        };

        match self.state.result() {
            Some(GameResult::Checkmate { winner }) => {
                out.push_str(&format!("checkmate, {} wins", winner))
            }
            Some(GameResult::Stalemate) => out.push_str("stalemate, draw"),
            None => {
                out.push_str(&format!("{} to move", self.state.to_move));
                if MoveGenerator::is_checked(&self.state.board, self.state.to_move) {
                    out.push_str(" (in check)");
                }
            }
        }
        out
    }

    fn describe_moves(&mut self, sq: Square) -> Result<String> {
        let mut targets = self.state.select(sq)?;
        targets.sort();
        if targets.is_empty() {
            self.state.deselect();
            return Ok(format!("{} has no legal moves", sq));
        }
        let names: Vec<String> = targets.iter().map(Square::to_algebraic).collect();
        Ok(format!("{}: {}", sq, names.join(" ")))
    }

    fn describe_all_moves(&self) -> String {
        let moves: Vec<String> = self
            .state
            .all_legal_moves()
            .iter()
            .map(Move::to_string)
            .collect();
        if moves.is_empty() {
            "no legal moves".to_string()
        } else {
            format!("{} legal moves: {}", moves.len(), moves.join(" "))
        }
    }

    fn play(&mut self, mv: Move, prompt: &mut dyn PromotionProvider) -> Result<String> {
        let promoting = MoveGenerator::is_promotion(&self.state.board, mv.from, mv.to);

        let outcome = match mv.promotion {
            Some(kind) => self.state.commit_move(mv.from, mv.to, Some(kind))?,
            None if self.settings.auto_queen => self.state.commit_move_with(
                mv.from,
                mv.to,
                &mut FixedPromotion(PieceKind::Queen),
            )?,
            None => self.state.commit_move_with(mv.from, mv.to, prompt)?,
        };

        let notation = self
            .state
            .move_history()
            .last()
            .cloned()
            .unwrap_or_default();
        let promoted = if promoting {
            self.state.board.get(mv.to).map(|p| p.kind)
        } else {
            None
        };
        self.record
            .add_move(MoveRecord::new(mv.from, mv.to, promoted, notation.clone()));
        if let Some(result) = self.state.result() {
            self.record.set_result(result);
        }

        let status = match outcome {
            MoveOutcome::Check => "check".to_string(),
            MoveOutcome::Checkmate(winner) => format!("checkmate, {} wins", winner),
            MoveOutcome::Stalemate => "stalemate".to_string(),
            MoveOutcome::Continue | MoveOutcome::PendingPromotion => String::new(),
        };
        let mut text = notation;
        if !status.is_empty() {
            text.push_str(&format!(" ({})", status));
        }
        Ok(format!("{}\n{}", text, self.render()))
    }

    fn load(&mut self, fen: &str) -> Result<String> {
        self.state = BoardState::load_position(fen)?;
        self.record = GameRecord::from_fen(WHITE_PLAYER, BLACK_PLAYER, fen);
        info!("loaded position {}", fen);
        Ok(self.render())
    }

    fn history(&self) -> String {
        let history = self.state.move_history();
        if history.is_empty() {
            return "no moves yet".to_string();
        }
        history
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
