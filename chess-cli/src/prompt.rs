//! 交互式升变选择

use std::fmt;
use std::io::{BufRead, Write};

use chess_rules::{PieceKind, PromotionProvider, Square, Team};
use tracing::warn;

/// 从输入流读取升变棋子，输入结束时选择后
pub struct PromptPromotion<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptPromotion<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// 输出提示，写入失败只记录日志
    fn show(&mut self, text: fmt::Arguments<'_>) {
        if let Err(e) = self.output.write_fmt(text).and_then(|()| self.output.flush()) {
            warn!("failed to write promotion prompt: {}", e);
        }
    }
}

impl<R: BufRead, W: Write> PromotionProvider for PromptPromotion<R, W> {
    fn choose_promotion(&mut self, team: Team, square: Square) -> PieceKind {
        loop {
            self.show(format_args!(
                "{} pawn promotes on {}, choose [q/r/b/n]: ",
                team, square
            ));

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    warn!("input closed during promotion, choosing a queen");
                    return PieceKind::Queen;
                }
                Err(e) => {
                    warn!("failed to read promotion choice: {}, choosing a queen", e);
                    return PieceKind::Queen;
                }
                Ok(_) => {}
            }

            let mut chars = line.trim().chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if let Some(kind) = PieceKind::from_promotion_char(c) {
                    return kind;
                }
            }
            self.show(format_args!("'{}' is not a promotion piece\n", line.trim()));
        }
    }
}
