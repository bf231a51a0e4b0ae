use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chess_cli::{CliSettings, Command, PromptPromotion, Reply, Session};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let settings = match config_arg()? {
        Some(path) => CliSettings::load_from(&path),
        None => CliSettings::load(),
    };

    // 初始化日志（RUST_LOG 优先于设置）
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.log_level.directive()))
        .context("无效的日志过滤指令")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    info!("国际象棋命令行启动");

    let mut session = Session::new(settings)?;
    let mut input = io::stdin().lock();
    let mut stdout = io::stdout();

    writeln!(stdout, "{}\ntype 'help' for commands", session.render())?;

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).context("读取输入失败")? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(stdout, "error: {}", e)?;
                continue;
            }
        };

        // 升变提示与命令共用同一个输入流
        let mut prompt = PromptPromotion::new(&mut input, io::stdout());
        match session.execute(command, &mut prompt) {
            Ok(Reply::Text(text)) => writeln!(stdout, "{}", text)?,
            Ok(Reply::Quit) => break,
            Err(e) => writeln!(stdout, "error: {:#}", e)?,
        }
    }

    info!("国际象棋命令行退出");
    Ok(())
}

/// 解析 `--config <路径>` 参数
fn config_arg() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Ok(None),
        Some("--config") => {
            let path = args.next().context("--config 需要一个路径")?;
            Ok(Some(PathBuf::from(path)))
        }
        Some(other) => anyhow::bail!("未知参数: {}，用法: chess-cli [--config <路径>]", other),
    }
}
